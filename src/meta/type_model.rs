use super::field::{FieldModel, FieldType, FlatField};
use super::{DocType, GENE_COMPOUND_ID, GENE_CURATED_SET_ID, GENE_GO_TERM_ID, GENE_PATHWAY_ID};
use crate::error::{CompileError, Result};
use std::collections::HashMap;
use std::fmt;

/// Shorthand aliases that stand for the gene-set membership fields.
const HAS_FIELDS: [(&str, &str); 4] = [
    ("hasPathway", GENE_PATHWAY_ID),
    ("hasCuratedSet", GENE_CURATED_SET_ID),
    ("hasGoTerm", GENE_GO_TERM_ID),
    ("hasCompound", GENE_COMPOUND_ID),
];

/// The membership alias a `has*` shorthand stands for (`hasPathway` is
/// `gene.pathwayId`).
pub fn has_field_alias(name: &str) -> Option<&'static str> {
    HAS_FIELDS.iter().find(|(has, _)| *has == name).map(|(_, alias)| *alias)
}

/// Everything needed to build a [`TypeModel`].
pub struct Definition {
    pub doc_type: DocType,
    pub fields: Vec<FieldModel>,
    /// Aliases that never appear in PQL but are used by the resolvers
    pub internal_aliases: Vec<(&'static str, String)>,
    /// Aliases returned by `select(*)`
    pub public_fields: Vec<&'static str>,
    /// Aliases returned by `facets(*)`
    pub facets: Vec<&'static str>,
    /// Object fields served from `_source` rather than stored fields
    pub include_fields: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub field_type: FieldType,
    pub nested: bool,
    pub identifiable: bool,
}

/// Field and nesting metadata of one document type.
///
/// Lookups take either a fully qualified document path (`gene.ssm.mutation_type`)
/// or, where noted, a public alias (`mutation.type`).
pub struct TypeModel {
    doc_type: DocType,
    fields_by_path: HashMap<String, FieldInfo>,
    fields_by_alias: HashMap<String, String>,
    internal_aliases: HashMap<String, String>,
    public_fields: Vec<String>,
    aliases: Vec<String>,
    facets: Vec<String>,
    include_fields: Vec<String>,
}

impl TypeModel {
    pub fn new(definition: Definition) -> Self {
        let mut flat: Vec<FlatField> = Vec::new();
        for field in &definition.fields {
            field.flatten("", &mut flat);
        }

        let mut fields_by_path = HashMap::with_capacity(flat.len());
        let mut fields_by_alias = HashMap::new();
        for field in flat {
            for alias in &field.aliases {
                fields_by_alias.insert(alias.clone(), field.path.clone());
            }
            fields_by_path.insert(
                field.path,
                FieldInfo {
                    field_type: field.field_type,
                    nested: field.nested,
                    identifiable: field.identifiable,
                },
            );
        }

        let lookup_type = definition.doc_type.lookup_type().map(|t| ("lookup.type", t));
        let mut internal_aliases: HashMap<String, String> = [("lookup.index", "terms-lookup"), ("lookup.path", "values")]
            .into_iter()
            .chain(lookup_type)
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        for (alias, path) in definition.internal_aliases {
            internal_aliases.insert(alias.to_string(), path);
        }

        let public_fields = definition
            .public_fields
            .iter()
            .filter_map(|alias| fields_by_alias.get(*alias).cloned())
            .collect();

        TypeModel {
            doc_type: definition.doc_type,
            fields_by_path,
            fields_by_alias,
            internal_aliases,
            public_fields,
            aliases: definition.public_fields.iter().map(|a| a.to_string()).collect(),
            facets: definition.facets.iter().map(|a| a.to_string()).collect(),
            include_fields: definition.include_fields.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn doc_type(&self) -> DocType {
        self.doc_type
    }

    /// Field prefix of the type's own entity (`donor` in `donor.id`).
    pub fn prefix(&self) -> &'static str {
        self.doc_type.prefix()
    }

    /// Aliases available to `facets(*)`.
    pub fn facets(&self) -> &[String] {
        &self.facets
    }

    /// Document paths returned by `select(*)`.
    pub fn fields(&self) -> &[String] {
        &self.public_fields
    }

    /// Public aliases of `select(*)`.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn include_fields(&self) -> &[String] {
        &self.include_fields
    }

    pub fn is_alias_defined(&self, alias: &str) -> bool {
        self.fields_by_alias.contains_key(alias)
    }

    /// Resolve a public alias to its document path.
    ///
    /// The view's own entity may be qualified with its prefix: `mutation.id`
    /// is `id` in the mutation-centric view.
    pub fn field(&self, alias: &str) -> Result<&str> {
        if let Some(target) = has_field_alias(alias) {
            return self.field(target);
        }

        let own = alias
            .strip_prefix(self.prefix())
            .and_then(|rest| rest.strip_prefix('.'));
        self.fields_by_alias
            .get(alias)
            .or_else(|| own.and_then(|rest| self.fields_by_alias.get(rest)))
            .map(String::as_str)
            .ok_or_else(|| CompileError::bad_query(format!("Field {alias} is not defined in the type model")))
    }

    /// Resolve an alias only the compiler uses (`go_term.cellular_component`,
    /// `lookup.type`).
    pub fn internal_field(&self, alias: &str) -> Result<&str> {
        self.internal_aliases
            .get(alias)
            .map(String::as_str)
            .ok_or_else(|| CompileError::bad_query(format!("Field {alias} is not defined in the type model")))
    }

    /// Every alias that resolves to `field`, sorted.
    pub fn aliases_of(&self, field: &str) -> Vec<&str> {
        let mut aliases: Vec<&str> = self
            .fields_by_alias
            .iter()
            .filter(|(_, path)| path.as_str() == field)
            .map(|(alias, _)| alias.as_str())
            .collect();
        aliases.sort_unstable();
        aliases
    }

    pub fn field_info(&self, field: &str) -> Option<&FieldInfo> {
        self.fields_by_path.get(self.full_name(field))
    }

    fn full_name<'a>(&'a self, field: &'a str) -> &'a str {
        self.fields_by_alias.get(field).map(String::as_str).unwrap_or(field)
    }

    /// Innermost nested path `field` lives under, if any.
    ///
    /// `field` may be a document path or an alias. Intermediate path segments
    /// that are not fields of their own (`_summary._state` style names) are
    /// skipped; an unknown field is a bad query.
    pub fn nested_path(&self, field: &str) -> Result<Option<&str>> {
        let full_name = self.full_name(field);
        if !self.fields_by_path.contains_key(full_name) {
            return Err(CompileError::bad_query(format!(
                "Search field {full_name} is not available under {}",
                self.prefix()
            )));
        }

        for path in prefixes(full_name) {
            if let Some((key, info)) = self.fields_by_path.get_key_value(path) {
                if info.nested {
                    return Ok(Some(key.as_str()));
                }
            }
        }
        Ok(None)
    }

    pub fn is_nested(&self, field: &str) -> Result<bool> {
        Ok(self.nested_path(field)?.is_some())
    }

    /// True when `field` is nested and its nesting path lies at or below
    /// `path`.
    pub fn is_nested_under(&self, field: &str, path: &str) -> Result<bool> {
        Ok(self
            .nested_path(field)?
            .is_some_and(|nested| is_path_under(nested, path)))
    }

    /// Closest nested ancestor of `path`, or `path` itself when it has none.
    pub fn parent_nested_path<'a>(&'a self, path: &'a str) -> &'a str {
        prefixes(path)
            .skip(1)
            .find(|p| self.fields_by_path.get(*p).is_some_and(|info| info.nested))
            .unwrap_or(path)
    }

    /// The chain of nested paths from the outermost ancestor down to `path`.
    pub fn nested_paths(&self, path: &str) -> Vec<String> {
        let mut chain: Vec<String> = prefixes(path)
            .filter(|p| self.fields_by_path.get(*p).is_some_and(|info| info.nested))
            .map(str::to_string)
            .collect();
        chain.reverse();
        chain
    }

    pub fn is_identifiable(&self, field: &str) -> Result<bool> {
        self.fields_by_path
            .get(field)
            .map(|info| info.identifiable)
            .ok_or_else(|| CompileError::internal(format!("Failed to resolve field model from '{field}'")))
    }

    /// Terms-lookup type of entity sets of this type.
    pub fn lookup_type(&self) -> Option<&'static str> {
        self.doc_type.lookup_type()
    }
}

/// True when `path` is `parent` or one of its descendants. `ssm_occurrence`
/// is not under `ssm`.
pub fn is_path_under(path: &str, parent: &str) -> bool {
    path.strip_prefix(parent)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
}

/// `a.b.c` yields `a.b.c`, `a.b`, `a`.
pub(crate) fn prefixes(path: &str) -> impl Iterator<Item = &str> {
    std::iter::once(path).chain(path.rmatch_indices('.').map(move |(i, _)| &path[..i]))
}

impl fmt::Debug for TypeModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeModel")
            .field("doc_type", &self.doc_type)
            .field("fields", &self.fields_by_path.len())
            .field("aliases", &self.fields_by_alias.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes_longest_first() {
        let all: Vec<&str> = prefixes("gene.ssm.observation").collect();
        assert_eq!(all, vec!["gene.ssm.observation", "gene.ssm", "gene"]);
    }

    #[test]
    fn test_path_under_respects_segments() {
        assert!(is_path_under("ssm_occurrence.observation", "ssm_occurrence"));
        assert!(is_path_under("gene", "gene"));
        assert!(!is_path_under("ssm_occurrence", "ssm"));
        assert!(!is_path_under("gene", "gene.ssm"));
    }

    #[test]
    fn test_nested_under_respects_segments() {
        let model = crate::meta::DocType::MutationCentric.type_model();
        let field = "ssm_occurrence.observation.verification_status";
        assert!(model.is_nested_under(field, "ssm_occurrence").unwrap());
        assert!(!model.is_nested_under(field, "ssm").unwrap());
    }
}
