//! Queries and rewrites over a facet's filter tree.
//!
//! All functions take the `Filter` node of a query, already wrapped by the
//! nested-field resolver, so every condition on a nested field sits inside a
//! `Nested` node of its path.

use crate::context::VisitContext;
use crate::error::Result;
use crate::meta::is_path_under;
use crate::resolve::unexpected;
use crate::tree::{ExpressionNode, NodeKind};

/// Drop every condition on `field`. Containers emptied by the removal are
/// left for the empty-node cleaner.
pub(super) fn exclude_field(node: ExpressionNode, field: &str) -> Result<Option<ExpressionNode>> {
    match &node.kind {
        NodeKind::Filter
        | NodeKind::Bool
        | NodeKind::MustBool
        | NodeKind::ShouldBool
        | NodeKind::Not
        | NodeKind::Nested { .. } => node.map_children(|child| exclude_field(child, field)).map(Some),
        NodeKind::Term { field: own, .. }
        | NodeKind::Terms { field: own }
        | NodeKind::Range { field: own }
        | NodeKind::Exists { field: own }
        | NodeKind::Missing { field: own } => Ok((own != field).then_some(node)),
        other => Err(unexpected(other, "facet filters")),
    }
}

/// True when some condition is nested exactly at `path`, reached only
/// through `Nested` nodes of its ancestor paths.
pub(super) fn has_filters_at_level(node: &ExpressionNode, path: &str) -> Result<bool> {
    match &node.kind {
        NodeKind::Filter | NodeKind::Bool | NodeKind::MustBool | NodeKind::ShouldBool | NodeKind::Not => {
            any_child(node, |child| has_filters_at_level(child, path))
        }
        NodeKind::Nested { path: own } if own == path => Ok(true),
        NodeKind::Nested { path: own } if is_path_under(path, own) => {
            any_child(node, |child| has_filters_at_level(child, path))
        }
        NodeKind::Nested { .. }
        | NodeKind::Term { .. }
        | NodeKind::Terms { .. }
        | NodeKind::Range { .. }
        | NodeKind::Exists { .. }
        | NodeKind::Missing { .. } => Ok(false),
        other => Err(unexpected(other, "facet filters")),
    }
}

/// Keep only the conditions that apply inside the nested documents at
/// `context.path`, unwrapping the `Nested` node of that path. Conditions at
/// deeper paths keep their `Nested` wrapper; conditions elsewhere go.
pub(super) fn resolve_nested_filter(
    node: ExpressionNode,
    context: VisitContext<'_>,
) -> Result<Option<ExpressionNode>> {
    match &node.kind {
        NodeKind::Filter | NodeKind::Bool | NodeKind::MustBool | NodeKind::ShouldBool | NodeKind::Not => {
            let node = node.map_children(|child| resolve_nested_filter(child, context))?;
            Ok((!node.children.is_empty()).then_some(node))
        }
        NodeKind::Nested { path } if path == context.path => Ok(node.children.into_iter().next()),
        NodeKind::Nested { path } if is_path_under(path, context.path) => Ok(Some(node)),
        NodeKind::Nested { .. } => Ok(None),
        NodeKind::Term { field, .. }
        | NodeKind::Terms { field }
        | NodeKind::Range { field }
        | NodeKind::Exists { field }
        | NodeKind::Missing { field } => {
            let keep = context.type_model.is_nested_under(field, context.path)?;
            Ok(keep.then_some(node))
        }
        other => Err(unexpected(other, "facet filters")),
    }
}

/// True when some condition is on a field outside the nested documents at
/// `context.path`.
pub(super) fn has_non_nested_fields(node: &ExpressionNode, context: VisitContext<'_>) -> Result<bool> {
    match &node.kind {
        NodeKind::Filter
        | NodeKind::Bool
        | NodeKind::MustBool
        | NodeKind::ShouldBool
        | NodeKind::Not
        | NodeKind::Nested { .. } => any_child(node, |child| has_non_nested_fields(child, context)),
        NodeKind::Term { field, .. }
        | NodeKind::Terms { field }
        | NodeKind::Range { field }
        | NodeKind::Exists { field }
        | NodeKind::Missing { field } => Ok(!context.type_model.is_nested_under(field, context.path)?),
        other => Err(unexpected(other, "facet filters")),
    }
}

fn any_child(node: &ExpressionNode, mut test: impl FnMut(&ExpressionNode) -> Result<bool>) -> Result<bool> {
    for child in &node.children {
        if test(child)? {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::DocType;

    fn filters() -> ExpressionNode {
        // ssm_occurrence project filter plus an observation filter below it
        ExpressionNode::filter(ExpressionNode::must(vec![
            ExpressionNode::term("_mutation_id", "MU1"),
            ExpressionNode::nested(
                "ssm_occurrence",
                ExpressionNode::term("ssm_occurrence.project._project_id", "ALL-US"),
            ),
            ExpressionNode::nested(
                "ssm_occurrence.observation",
                ExpressionNode::term("ssm_occurrence.observation.verification_status", "tested"),
            ),
        ]))
    }

    #[test]
    fn test_exclude_field() {
        let filter = exclude_field(filters(), "_mutation_id").unwrap().unwrap();
        let must = &filter.children[0].children[0];
        assert_eq!(must.children.len(), 2);
        assert!(must.children.iter().all(|c| c.tag() == "Nested"));
    }

    #[test]
    fn test_has_filters_at_level() {
        let filter = filters();
        assert!(has_filters_at_level(&filter, "ssm_occurrence").unwrap());
        assert!(has_filters_at_level(&filter, "ssm_occurrence.observation").unwrap());
        assert!(!has_filters_at_level(&filter, "transcript").unwrap());
    }

    #[test]
    fn test_resolve_nested_filter_unwraps_own_level() {
        let model = DocType::MutationCentric.type_model();
        let resolved = resolve_nested_filter(filters(), VisitContext::new("ssm_occurrence", model))
            .unwrap()
            .unwrap();
        let must = &resolved.children[0].children[0];
        assert_eq!(must.children[0], ExpressionNode::term("ssm_occurrence.project._project_id", "ALL-US"));
        assert_eq!(must.children[1].kind, NodeKind::Nested {
            path: "ssm_occurrence.observation".to_string()
        });
        assert_eq!(must.children.len(), 2);
    }

    #[test]
    fn test_levels_compare_whole_segments() {
        let model = DocType::MutationCentric.type_model();
        let filter = filters();
        assert!(!has_filters_at_level(&filter, "ssm").unwrap());
        let resolved = resolve_nested_filter(filter, VisitContext::new("ssm", model)).unwrap();
        assert!(resolved.is_none());
    }

    #[test]
    fn test_has_non_nested_fields() {
        let model = DocType::MutationCentric.type_model();
        let context = VisitContext::new("ssm_occurrence", model);
        assert!(has_non_nested_fields(&filters(), context).unwrap());
        let nested_only = exclude_field(filters(), "_mutation_id").unwrap().unwrap();
        assert!(!has_non_nested_fields(&nested_only, context).unwrap());
    }
}
