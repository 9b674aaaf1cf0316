use crate::meta::{DocType, TypeModel, LOOKUP_INDEX, LOOKUP_PATH};

/// Parameters shared by every pass of one compilation.
#[derive(Debug, Clone, Copy)]
pub struct QueryContext<'a> {
    pub index: &'a str,
    pub type_model: &'static TypeModel,
    /// Index holding stored entity sets
    pub lookup_index: &'a str,
    /// Document field listing the ids of an entity set
    pub lookup_path: &'a str,
}

impl<'a> QueryContext<'a> {
    pub fn new(index: &'a str, doc_type: DocType) -> Self {
        let type_model = doc_type.type_model();
        QueryContext {
            index,
            type_model,
            lookup_index: type_model.internal_field(LOOKUP_INDEX).unwrap_or("terms-lookup"),
            lookup_path: type_model.internal_field(LOOKUP_PATH).unwrap_or("values"),
        }
    }

    pub fn with_lookup(mut self, index: &'a str, path: &'a str) -> Self {
        self.lookup_index = index;
        self.lookup_path = path;
        self
    }

    pub fn doc_type(&self) -> DocType {
        self.type_model.doc_type()
    }
}

/// A nesting path under consideration and the model it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct VisitContext<'a> {
    pub path: &'a str,
    pub type_model: &'a TypeModel,
}

impl<'a> VisitContext<'a> {
    pub fn new(path: &'a str, type_model: &'a TypeModel) -> Self {
        VisitContext { path, type_model }
    }

    /// Same model, different path.
    pub fn at(&self, path: &'a str) -> Self {
        VisitContext::new(path, self.type_model)
    }
}
