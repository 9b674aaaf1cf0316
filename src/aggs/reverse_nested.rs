use crate::error::Result;
use crate::meta::DocType;
use crate::resolve::unexpected;
use crate::tree::{ExpressionNode, NodeKind};

/// Nested facet fields whose buckets count parent documents rather than
/// nested ones.
const REVERSE_NESTED_FIELDS: [&str; 10] = [
    "transcript.consequence.consequence_type",
    "ssm_occurrence.observation.platform",
    "ssm_occurrence.observation.verification_status",
    "transcript.functional_impact_prediction_summary",
    "ssm_occurrence.observation.sequencing_strategy",
    "file_copies.file_format",
    "donors.project_code",
    "donors.primary_site",
    "donors.specimen_type",
    "donors.study",
];

/// Attach a `ReverseNestedAggregation` under facets on the listed fields,
/// for the views that count parent documents.
pub(super) fn resolve(root: ExpressionNode, doc_type: DocType) -> Result<ExpressionNode> {
    match doc_type {
        DocType::MutationCentric | DocType::File => {}
        DocType::DonorCentric | DocType::GeneCentric | DocType::ObservationCentric | DocType::Project => {
            return Ok(root);
        }
    }

    root.map_children(|child| match child.kind {
        NodeKind::Aggregations => child.map_children(|facet| rewrite(facet).map(Some)).map(Some),
        _ => Ok(Some(child)),
    })
}

fn rewrite(node: ExpressionNode) -> Result<ExpressionNode> {
    match &node.kind {
        NodeKind::TermsAggregation { name, field } | NodeKind::MissingAggregation { name, field } => {
            if REVERSE_NESTED_FIELDS.contains(&field.as_str()) {
                let reverse = ExpressionNode::leaf(NodeKind::ReverseNestedAggregation { name: name.clone() });
                Ok(node.with_child(reverse))
            } else {
                Ok(node)
            }
        }
        NodeKind::GlobalAggregation { .. }
        | NodeKind::FilterAggregation { .. }
        | NodeKind::NestedAggregation { .. } => node.map_children(|child| rewrite(child).map(Some)),
        NodeKind::ReverseNestedAggregation { .. } => Ok(node),
        other @ (NodeKind::Root
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
        | NodeKind::Aggregations) => Err(unexpected(other, "reverse nested aggregations")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregations(facet: ExpressionNode) -> ExpressionNode {
        ExpressionNode::root(vec![ExpressionNode::aggregations(vec![facet])])
    }

    #[test]
    fn test_listed_field_gets_reverse_nested() {
        let facet = ExpressionNode::nested_aggregation("platform", "ssm_occurrence.observation").with_child(
            ExpressionNode::terms_aggregation("platform", "ssm_occurrence.observation.platform"),
        );
        let root = resolve(aggregations(facet), DocType::MutationCentric).unwrap();
        let terms = &root.first_child().unwrap().children[0].children[0];
        assert_eq!(
            terms.children,
            vec![ExpressionNode::leaf(NodeKind::ReverseNestedAggregation {
                name: "platform".to_string()
            })]
        );
    }

    #[test]
    fn test_other_views_untouched() {
        let facet = ExpressionNode::terms_aggregation("projectCode", "donors.project_code");
        let root = aggregations(facet);
        assert_eq!(resolve(root.clone(), DocType::DonorCentric).unwrap(), root);
    }

    #[test]
    fn test_unlisted_field_untouched() {
        let root = aggregations(ExpressionNode::terms_aggregation("type", "mutation_type"));
        assert_eq!(resolve(root.clone(), DocType::MutationCentric).unwrap(), root);
    }
}
