use crate::error::{CompileError, Result};
use crate::resolve::unexpected;
use crate::tree::{ExpressionNode, NodeKind};

pub const MISSING_SUFFIX: &str = "_missing";

/// Append to `Aggregations` a twin of every facet that counts the
/// documents without a value for the facet field, under the same scope.
pub(super) fn resolve(root: ExpressionNode) -> Result<ExpressionNode> {
    root.map_children(|child| match child.kind {
        NodeKind::Aggregations => {
            let twins = child.children.iter().map(twin).collect::<Result<Vec<_>>>()?;
            let mut children = child.children;
            children.extend(twins);
            Ok(Some(ExpressionNode::aggregations(children)))
        }
        _ => Ok(Some(child)),
    })
}

fn missing_name(name: &str) -> String {
    format!("{name}{MISSING_SUFFIX}")
}

fn twin(node: &ExpressionNode) -> Result<ExpressionNode> {
    let kind = match &node.kind {
        NodeKind::TermsAggregation { name, field } => {
            return Ok(ExpressionNode::missing_aggregation(missing_name(name), field.clone()));
        }
        NodeKind::GlobalAggregation { name } => NodeKind::GlobalAggregation {
            name: missing_name(name),
        },
        NodeKind::FilterAggregation { name, filter } => NodeKind::FilterAggregation {
            name: missing_name(name),
            filter: filter.clone(),
        },
        NodeKind::NestedAggregation { name, path } => NodeKind::NestedAggregation {
            name: missing_name(name),
            path: path.clone(),
        },
        other => return Err(unexpected(other, "missing aggregations")),
    };

    let child = node.first_child().ok_or_else(|| {
        CompileError::internal(format!("{} aggregation has no sub-aggregation", node.tag()))
    })?;
    Ok(ExpressionNode::new(kind, vec![twin(child)?]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twin_mirrors_scope() {
        let facet = ExpressionNode::new(
            NodeKind::GlobalAggregation {
                name: "platform".to_string(),
            },
            vec![ExpressionNode::nested_aggregation("platform", "ssm_occurrence.observation")
                .with_child(ExpressionNode::terms_aggregation(
                    "platform",
                    "ssm_occurrence.observation.platform",
                ))],
        );
        let expected = ExpressionNode::new(
            NodeKind::GlobalAggregation {
                name: "platform_missing".to_string(),
            },
            vec![ExpressionNode::nested_aggregation("platform_missing", "ssm_occurrence.observation")
                .with_child(ExpressionNode::missing_aggregation(
                    "platform_missing",
                    "ssm_occurrence.observation.platform",
                ))],
        );
        assert_eq!(twin(&facet).unwrap(), expected);
    }

    #[test]
    fn test_twins_are_appended() {
        let root = ExpressionNode::root(vec![ExpressionNode::aggregations(vec![
            ExpressionNode::terms_aggregation("gender", "donor_sex"),
        ])]);
        let root = resolve(root).unwrap();
        assert_eq!(
            root.first_child().unwrap().children,
            vec![
                ExpressionNode::terms_aggregation("gender", "donor_sex"),
                ExpressionNode::missing_aggregation("gender_missing", "donor_sex"),
            ]
        );
    }
}
