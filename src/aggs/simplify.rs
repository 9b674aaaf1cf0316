use crate::tree::{ExpressionNode, NodeKind};

/// Splice out every `FilterAggregation` whose filter was emptied, replacing
/// it with its sub-aggregation. Running it twice changes nothing.
pub fn simplify(node: ExpressionNode) -> ExpressionNode {
    let ExpressionNode { kind, children } = node;
    let mut children: Vec<ExpressionNode> = children.into_iter().map(simplify).collect();

    match kind {
        NodeKind::FilterAggregation { filter, .. } if filter.children.is_empty() && children.len() == 1 => {
            children.remove(0)
        }
        NodeKind::Root
        | NodeKind::Query
        | NodeKind::Filter
        | NodeKind::Bool
        | NodeKind::MustBool
        | NodeKind::ShouldBool
        | NodeKind::Not
        | NodeKind::Term { .. }
        | NodeKind::Terms { .. }
        | NodeKind::Range { .. }
        | NodeKind::GreaterThan(_)
        | NodeKind::GreaterEqual(_)
        | NodeKind::LessThan(_)
        | NodeKind::LessEqual(_)
        | NodeKind::Exists { .. }
        | NodeKind::Missing { .. }
        | NodeKind::Nested { .. }
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
        | NodeKind::GlobalAggregation { .. } => ExpressionNode::new(kind, children),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_filter_aggregation(child: ExpressionNode) -> ExpressionNode {
        ExpressionNode::new(
            NodeKind::FilterAggregation {
                name: "gender".to_string(),
                filter: Box::new(ExpressionNode::leaf(NodeKind::Filter)),
            },
            vec![child],
        )
    }

    #[test]
    fn test_splices_empty_filter() {
        let terms = ExpressionNode::terms_aggregation("gender", "donor_sex");
        let node = ExpressionNode::aggregations(vec![empty_filter_aggregation(terms.clone())]);
        assert_eq!(simplify(node), ExpressionNode::aggregations(vec![terms]));
    }

    #[test]
    fn test_keeps_real_filter() {
        let node = ExpressionNode::filter_aggregation(
            "gender",
            ExpressionNode::exists("donor_sex"),
            ExpressionNode::terms_aggregation("gender", "donor_sex"),
        );
        assert_eq!(simplify(node.clone()), node);
    }
}
