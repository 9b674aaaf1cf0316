//! Tree tidying passes run after resolution.
//!
//! Resolvers and aggregation building remove conditions freely and leave
//! hollow containers behind (`Bool(MustBool())`, `Not()` and so on). These
//! passes remove the husks and collapse single-condition boolean wrappers so
//! the request builder sees the smallest equivalent tree.

use crate::tree::{ExpressionNode, NodeKind};

/// Remove containers left without children, bottom up. `Root` and
/// aggregations that carry their own meaning are kept even when empty. The
/// embedded filter of a `FilterAggregation` is cleaned but its `Filter`
/// node is kept, possibly empty, for the aggregation simplifier to find.
pub fn remove_empty(node: ExpressionNode) -> Option<ExpressionNode> {
    let ExpressionNode { kind, children } = node;
    let children: Vec<ExpressionNode> = children.into_iter().filter_map(remove_empty).collect();

    match kind {
        NodeKind::Query
        | NodeKind::Filter
        | NodeKind::Bool
        | NodeKind::MustBool
        | NodeKind::ShouldBool
        | NodeKind::Not
        | NodeKind::Nested { .. }
        | NodeKind::Range { .. }
        | NodeKind::Aggregations
        | NodeKind::NestedAggregation { .. } => {
            (!children.is_empty()).then(|| ExpressionNode::new(kind, children))
        }
        NodeKind::Fields(fields) => (!fields.is_empty()).then(|| ExpressionNode::leaf(NodeKind::Fields(fields))),
        NodeKind::Source(fields) => (!fields.is_empty()).then(|| ExpressionNode::leaf(NodeKind::Source(fields))),
        NodeKind::FilterAggregation { name, filter } => {
            let filter = clean_filter(*filter);
            Some(ExpressionNode::new(
                NodeKind::FilterAggregation {
                    name,
                    filter: Box::new(filter),
                },
                children,
            ))
        }
        NodeKind::Root
        | NodeKind::Term { .. }
        | NodeKind::Terms { .. }
        | NodeKind::GreaterThan(_)
        | NodeKind::GreaterEqual(_)
        | NodeKind::LessThan(_)
        | NodeKind::LessEqual(_)
        | NodeKind::Exists { .. }
        | NodeKind::Missing { .. }
        | NodeKind::Terminal(_)
        | NodeKind::Sort(_)
        | NodeKind::Limit { .. }
        | NodeKind::Count
        | NodeKind::TermsAggregation { .. }
        | NodeKind::MissingAggregation { .. }
        | NodeKind::ReverseNestedAggregation { .. }
        | NodeKind::GlobalAggregation { .. } => Some(ExpressionNode::new(kind, children)),
    }
}

/// Clean the children of a `Filter` node, keeping the node itself.
pub fn clean_filter(filter: ExpressionNode) -> ExpressionNode {
    let ExpressionNode { kind, children } = filter;
    ExpressionNode::new(kind, children.into_iter().filter_map(remove_empty).collect())
}

/// Replace every `Bool` holding a single `MustBool`/`ShouldBool` with a
/// single condition by that condition. Applied bottom up, so chains of
/// such wrappers collapse in one pass.
pub fn simplify_bool(node: ExpressionNode) -> ExpressionNode {
    let ExpressionNode { kind, children } = node;
    let children: Vec<ExpressionNode> = children.into_iter().map(simplify_bool).collect();

    match kind {
        NodeKind::Bool => {
            let mut bool_node = ExpressionNode::new(NodeKind::Bool, children);
            let collapsible = matches!(bool_node.children.as_slice(), [clause] if clause.children.len() == 1
                && matches!(clause.kind, NodeKind::MustBool | NodeKind::ShouldBool));
            if collapsible {
                if let Some(condition) = bool_node.children.pop().and_then(|mut clause| clause.children.pop()) {
                    return condition;
                }
            }
            bool_node
        }
        NodeKind::FilterAggregation { name, filter } => ExpressionNode::new(
            NodeKind::FilterAggregation {
                name,
                filter: Box::new(simplify_bool(*filter)),
            },
            children,
        ),
        NodeKind::Root
        | NodeKind::Query
        | NodeKind::Filter
        | NodeKind::MustBool
        | NodeKind::ShouldBool
        | NodeKind::Not
        | NodeKind::Nested { .. }
        | NodeKind::Term { .. }
        | NodeKind::Terms { .. }
        | NodeKind::Range { .. }
        | NodeKind::GreaterThan(_)
        | NodeKind::GreaterEqual(_)
        | NodeKind::LessThan(_)
        | NodeKind::LessEqual(_)
        | NodeKind::Exists { .. }
        | NodeKind::Missing { .. }
        | NodeKind::Terminal(_)
        | NodeKind::Fields(_)
        | NodeKind::Source(_)
        | NodeKind::Sort(_)
        | NodeKind::Limit { .. }
        | NodeKind::Count
        | NodeKind::Aggregations
        | NodeKind::TermsAggregation { .. }
        | NodeKind::MissingAggregation { .. }
        | NodeKind::NestedAggregation { .. }
        | NodeKind::ReverseNestedAggregation { .. }
        | NodeKind::GlobalAggregation { .. } => ExpressionNode::new(kind, children),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_hollow_containers() {
        let root = ExpressionNode::root(vec![ExpressionNode::query(ExpressionNode::filter(
            ExpressionNode::must(vec![ExpressionNode::not(ExpressionNode::must(Vec::new()))]),
        ))]);
        assert_eq!(remove_empty(root), Some(ExpressionNode::root(Vec::new())));
    }

    #[test]
    fn test_keeps_filter_shell_of_filter_aggregation() {
        let agg = ExpressionNode::filter_aggregation(
            "gender",
            ExpressionNode::must(Vec::new()),
            ExpressionNode::terms_aggregation("gender", "donor_sex"),
        );
        let cleaned = remove_empty(agg).unwrap();
        match cleaned.kind {
            NodeKind::FilterAggregation { filter, .. } => {
                assert_eq!(*filter, ExpressionNode::leaf(NodeKind::Filter));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_collapses_single_condition_bool() {
        let node = ExpressionNode::filter(ExpressionNode::must(vec![ExpressionNode::should(vec![
            ExpressionNode::term("a", "x"),
        ])]));
        assert_eq!(simplify_bool(node), ExpressionNode::filter(ExpressionNode::term("a", "x")));
    }

    #[test]
    fn test_keeps_multi_condition_bool() {
        let node = ExpressionNode::must(vec![ExpressionNode::term("a", "x"), ExpressionNode::exists("b")]);
        assert_eq!(simplify_bool(node.clone()), node);
    }
}
