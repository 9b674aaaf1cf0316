//! Declarative field trees.
//!
//! A type model is described as a tree of [`FieldModel`]s that mirrors the
//! document mapping. Leaves and containers carry the public aliases PQL
//! queries use:
//!
//! ```text
//! nested_array_of_objects("gene", element(vec![
//!     identifiable_string("_gene_id").alias("gene.id"),
//!     string("symbol").alias("gene.symbol"),
//! ]))
//! ```

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    String,
    Long,
    Double,
    Boolean,
    Object,
    Array,
}

#[derive(Debug, Clone)]
pub struct FieldModel {
    /// Empty for the element object of an array.
    name: String,
    field_type: FieldType,
    aliases: Vec<String>,
    nested: bool,
    identifiable: bool,
    children: Vec<FieldModel>,
}

/// One entry of a flattened field tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatField {
    pub path: String,
    pub field_type: FieldType,
    pub nested: bool,
    pub identifiable: bool,
    pub aliases: Vec<String>,
}

impl FieldModel {
    fn leaf(name: &str, field_type: FieldType) -> Self {
        FieldModel {
            name: name.to_string(),
            field_type,
            aliases: Vec::new(),
            nested: false,
            identifiable: false,
            children: Vec::new(),
        }
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases.extend(aliases.iter().map(|a| a.to_string()));
        self
    }

    /// Mark the field as stored in its own nested documents.
    pub fn nested(mut self) -> Self {
        self.nested = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn is_nested(&self) -> bool {
        self.nested
    }

    pub fn is_identifiable(&self) -> bool {
        self.identifiable
    }

    /// Flatten the subtree into fully qualified paths, parents before
    /// children.
    pub fn flatten(&self, parent: &str, out: &mut Vec<FlatField>) {
        let path = match (parent.is_empty(), self.name.is_empty()) {
            (_, true) => parent.to_string(),
            (true, false) => self.name.clone(),
            (false, false) => format!("{parent}.{}", self.name),
        };

        if !self.name.is_empty() {
            out.push(FlatField {
                path: path.clone(),
                field_type: self.field_type,
                nested: self.nested,
                identifiable: self.identifiable,
                aliases: self.aliases.clone(),
            });
        }

        for child in &self.children {
            child.flatten(&path, out);
        }
    }
}

pub fn string(name: &str) -> FieldModel {
    FieldModel::leaf(name, FieldType::String)
}

/// A string field holding an entity id that entity sets can refer to.
pub fn identifiable_string(name: &str) -> FieldModel {
    FieldModel {
        identifiable: true,
        ..FieldModel::leaf(name, FieldType::String)
    }
}

pub fn long(name: &str) -> FieldModel {
    FieldModel::leaf(name, FieldType::Long)
}

pub fn double(name: &str) -> FieldModel {
    FieldModel::leaf(name, FieldType::Double)
}

pub fn boolean(name: &str) -> FieldModel {
    FieldModel::leaf(name, FieldType::Boolean)
}

pub fn array_of_strings(name: &str) -> FieldModel {
    FieldModel::leaf(name, FieldType::Array)
}

pub fn object(name: &str, fields: Vec<FieldModel>) -> FieldModel {
    FieldModel {
        children: fields,
        ..FieldModel::leaf(name, FieldType::Object)
    }
}

pub fn nested_object(name: &str, fields: Vec<FieldModel>) -> FieldModel {
    object(name, fields).nested()
}

/// Unnamed object describing the elements of an array.
pub fn element(fields: Vec<FieldModel>) -> FieldModel {
    object("", fields)
}

pub fn array_of_objects(name: &str, element: FieldModel) -> FieldModel {
    FieldModel {
        children: vec![element],
        ..FieldModel::leaf(name, FieldType::Array)
    }
}

pub fn nested_array_of_objects(name: &str, element: FieldModel) -> FieldModel {
    array_of_objects(name, element).nested()
}
