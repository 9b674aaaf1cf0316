use super::{map_query, unexpected};
use crate::error::Result;
use crate::meta::TypeModel;
use crate::tree::{ExpressionNode, NodeKind};

/// Wrap leaf filters on nested fields in `Nested` nodes of their path.
/// Filters already inside a `Nested` node are left as written.
pub(super) fn resolve(root: ExpressionNode, model: &TypeModel) -> Result<ExpressionNode> {
    map_query(root, |query| rewrite(query, model))
}

fn rewrite(node: ExpressionNode, model: &TypeModel) -> Result<ExpressionNode> {
    match &node.kind {
        NodeKind::Nested { .. } => Ok(node),
        NodeKind::Query
        | NodeKind::Filter
        | NodeKind::Bool
        | NodeKind::MustBool
        | NodeKind::ShouldBool
        | NodeKind::Not => node.map_children(|child| rewrite(child, model).map(Some)),
        NodeKind::Term { field, .. }
        | NodeKind::Terms { field }
        | NodeKind::Range { field }
        | NodeKind::Exists { field }
        | NodeKind::Missing { field } => match model.nested_path(field)? {
            Some(path) => Ok(ExpressionNode::nested(path, node)),
            None => Ok(node),
        },
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
        | NodeKind::GlobalAggregation { .. }) => Err(unexpected(other, "nested fields")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::DocType;

    fn query(condition: ExpressionNode) -> ExpressionNode {
        ExpressionNode::root(vec![ExpressionNode::query(ExpressionNode::filter(condition))])
    }

    fn condition(root: &ExpressionNode) -> &ExpressionNode {
        root.query_filter().unwrap().first_child().unwrap()
    }

    #[test]
    fn test_wraps_nested_leaf() {
        let model = DocType::DonorCentric.type_model();
        let root = resolve(query(ExpressionNode::term("gene._gene_id", "G1")), model).unwrap();
        assert_eq!(
            condition(&root),
            &ExpressionNode::nested("gene", ExpressionNode::term("gene._gene_id", "G1"))
        );
    }

    #[test]
    fn test_leaves_flat_leaf() {
        let model = DocType::DonorCentric.type_model();
        let root = resolve(query(ExpressionNode::term("donor_sex", "male")), model).unwrap();
        assert_eq!(condition(&root), &ExpressionNode::term("donor_sex", "male"));
    }

    #[test]
    fn test_existing_nested_untouched() {
        let model = DocType::DonorCentric.type_model();
        let nested = ExpressionNode::nested("gene", ExpressionNode::term("gene.ssm._mutation_id", "M1"));
        let root = resolve(query(nested.clone()), model).unwrap();
        assert_eq!(condition(&root), &nested);
    }
}
