use super::{map_query, unexpected};
use crate::ast::Value;
use crate::context::QueryContext;
use crate::error::{CompileError, Result};
use crate::meta::{DocType, TypeModel, LOOKUP_TYPE};
use crate::tree::{ExpressionNode, NodeKind, TermsLookup};
use tracing::debug;
use uuid::Uuid;

/// Marks a value as the id of a stored entity set rather than a literal.
pub const ENTITY_SET_PREFIX: &str = "ES:";

/// Views that store entity sets.
const LOOKUP_TYPES: [DocType; 4] = [
    DocType::DonorCentric,
    DocType::GeneCentric,
    DocType::MutationCentric,
    DocType::File,
];

/// Replace `ES:<uuid>` values with terms lookups into the entity set index.
pub(super) fn resolve(root: ExpressionNode, context: &QueryContext<'_>) -> Result<ExpressionNode> {
    map_query(root, |query| rewrite(query, context))
}

fn rewrite(node: ExpressionNode, context: &QueryContext<'_>) -> Result<ExpressionNode> {
    let ExpressionNode { kind, children } = node;
    match kind {
        NodeKind::Query
        | NodeKind::Filter
        | NodeKind::Bool
        | NodeKind::MustBool
        | NodeKind::ShouldBool
        | NodeKind::Not
        | NodeKind::Nested { .. } => {
            ExpressionNode::new(kind, children).map_children(|child| rewrite(child, context).map(Some))
        }
        NodeKind::Terms { field } => resolve_terms(field, children, context),
        NodeKind::Term { field, value, lookup } => resolve_term(field, value, lookup, context),
        NodeKind::Range { .. } | NodeKind::Exists { .. } | NodeKind::Missing { .. } => {
            Ok(ExpressionNode::new(kind, children))
        }
        other @ (NodeKind::Root
        | NodeKind::GreaterThan(_)
        | NodeKind::GreaterEqual(_)
        | NodeKind::LessThan(_)
        | NodeKind::LessEqual(_)
        | NodeKind::Terminal(_)
        | NodeKind::Fields(_)
        | NodeKind::Source(_)
        | NodeKind::Sort(_)
        | NodeKind::Limit { .. }
        | NodeKind::Count
        | NodeKind::Aggregations
        | NodeKind::TermsAggregation { .. }
        | NodeKind::MissingAggregation { .. }
        | NodeKind::FilterAggregation { .. }
        | NodeKind::NestedAggregation { .. }
        | NodeKind::ReverseNestedAggregation { .. }
        | NodeKind::GlobalAggregation { .. }) => Err(unexpected(&other, "entity sets")),
    }
}

fn resolve_terms(
    field: String,
    children: Vec<ExpressionNode>,
    context: &QueryContext<'_>,
) -> Result<ExpressionNode> {
    let terms = ExpressionNode::new(NodeKind::Terms { field: field.clone() }, children);
    let (sets, plain): (Vec<Value>, Vec<Value>) = terms
        .terminal_values()
        .into_iter()
        .cloned()
        .partition(|value| entity_set_id(value).is_some());
    if sets.is_empty() {
        return Ok(terms);
    }

    let mut should = Vec::with_capacity(sets.len() + 1);
    if !plain.is_empty() {
        should.push(ExpressionNode::terms(field.clone(), plain));
    }
    for value in sets {
        should.push(resolve_term(field.clone(), value, None, context)?);
    }
    Ok(ExpressionNode::should(should))
}

fn resolve_term(
    field: String,
    value: Value,
    lookup: Option<TermsLookup>,
    context: &QueryContext<'_>,
) -> Result<ExpressionNode> {
    let Some(set) = entity_set_id(&value) else {
        return Ok(ExpressionNode::leaf(NodeKind::Term { field, value, lookup }));
    };

    let model = context.type_model;
    if !model.is_identifiable(&field)? {
        return Err(CompileError::internal(format!(
            "Only identifiable fields can start with '{ENTITY_SET_PREFIX}' prefix. Field: '{field}'. Value: '{value}'"
        )));
    }
    if !is_uuid(set) {
        return Err(CompileError::bad_query(format!("'{set}' is not a valid entity set id")));
    }

    let owner = lookup_owner(&field, model)?;
    debug!(field = %field, entity_set = set, owner = %owner.doc_type(), "resolved entity set");
    let lookup = TermsLookup {
        index: context.lookup_index.to_string(),
        doc_type: owner.internal_field(LOOKUP_TYPE)?.to_string(),
        id: set.to_string(),
        path: context.lookup_path.to_string(),
    };
    Ok(ExpressionNode::leaf(NodeKind::Term {
        field,
        value: Value::string(set),
        lookup: Some(lookup),
    }))
}

/// The set id of an `ES:` value, surrounding whitespace removed.
fn entity_set_id(value: &Value) -> Option<&str> {
    value
        .as_str()?
        .strip_prefix(ENTITY_SET_PREFIX)
        .map(str::trim)
}

fn is_uuid(id: &str) -> bool {
    Uuid::parse_str(id).is_ok()
}

/// The view whose entity `field` identifies. A field known only as `id` is
/// the active view's own id; otherwise the entity is named by the alias
/// prefix (`donor.id` is a donor).
fn lookup_owner(field: &str, model: &'static TypeModel) -> Result<&'static TypeModel> {
    let aliases = model.aliases_of(field);
    let name = match aliases.as_slice() {
        [alias] => *alias,
        _ => {
            let prefixes: Vec<&str> = aliases
                .iter()
                .filter_map(|alias| alias.split_once('.'))
                .filter(|(_, rest)| !rest.contains('.'))
                .map(|(prefix, _)| prefix)
                .collect();
            match prefixes.as_slice() {
                [prefix] => *prefix,
                _ => {
                    return Err(CompileError::internal(format!(
                        "Failed to resolve type model prefix from aliases {aliases:?}"
                    )));
                }
            }
        }
    };
    if name == "id" {
        return Ok(model);
    }

    let owners: Vec<DocType> = LOOKUP_TYPES
        .into_iter()
        .filter(|doc_type| name.starts_with(doc_type.prefix()))
        .collect();
    match owners.as_slice() {
        [owner] => Ok(owner.type_model()),
        _ => Err(CompileError::internal(format!(
            "Failed to resolve type model by field '{name}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SET: &str = "6d66b2bd-daed-431e-9a8d-b1d99be0bc18";

    #[test]
    fn test_entity_set_id_trims() {
        let value = Value::string(format!("ES: {SET}"));
        assert_eq!(entity_set_id(&value), Some(SET));
        assert_eq!(entity_set_id(&Value::string("DO1")), None);
        assert_eq!(entity_set_id(&Value::Integer(1)), None);
    }

    #[test]
    fn test_is_uuid() {
        assert!(is_uuid(SET));
        assert!(!is_uuid("ID1"));
        assert!(!is_uuid("6d66b2bd_daed-431e-9a8d-b1d99be0bc18"));
        assert!(!is_uuid("6d66b2bd-daed-431e-9a8d-b1d99be0bc1g"));
        assert!(is_uuid("6D66B2BD-DAED-431E-9A8D-B1D99BE0BC18"));
    }

    #[test]
    fn test_lookup_owner() {
        let donor = DocType::DonorCentric.type_model();
        assert_eq!(lookup_owner("_donor_id", donor).unwrap().doc_type(), DocType::DonorCentric);
        assert_eq!(lookup_owner("gene._gene_id", donor).unwrap().doc_type(), DocType::GeneCentric);
        assert_eq!(
            lookup_owner("gene.ssm._mutation_id", donor).unwrap().doc_type(),
            DocType::MutationCentric
        );

        let file = DocType::File.type_model();
        assert_eq!(lookup_owner("id", file).unwrap().doc_type(), DocType::File);
        assert_eq!(lookup_owner("donors.donor_id", file).unwrap().doc_type(), DocType::DonorCentric);
    }
}
