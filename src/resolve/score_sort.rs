use crate::ast::Order;
use crate::meta::SCORE;
use crate::tree::{ExpressionNode, NodeKind};

/// Make relevance the lowest-priority sort key unless the query already
/// sorts on it.
pub(super) fn resolve(root: ExpressionNode) -> ExpressionNode {
    let has_sort = root.has_child(|k| matches!(k, NodeKind::Sort(_)));
    if !has_sort {
        return root.with_child(ExpressionNode::leaf(NodeKind::Sort(vec![(
            SCORE.to_string(),
            Order::Desc,
        )])));
    }

    let ExpressionNode { kind, children } = root;
    let children = children
        .into_iter()
        .map(|child| match child.kind {
            NodeKind::Sort(mut keys) => {
                if !keys.iter().any(|(field, _)| field == SCORE) {
                    keys.push((SCORE.to_string(), Order::Desc));
                }
                ExpressionNode::leaf(NodeKind::Sort(keys))
            }
            kind => ExpressionNode::new(kind, child.children),
        })
        .collect();
    ExpressionNode::new(kind, children)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sort_keys(root: &ExpressionNode) -> Vec<(String, Order)> {
        match &root.find_child(|k| matches!(k, NodeKind::Sort(_))).unwrap().kind {
            NodeKind::Sort(keys) => keys.clone(),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_adds_score_when_unsorted() {
        let root = resolve(ExpressionNode::root(Vec::new()));
        assert_eq!(sort_keys(&root), vec![("_score".to_string(), Order::Desc)]);
    }

    #[test]
    fn test_appends_score_as_last_key() {
        let root = ExpressionNode::root(vec![ExpressionNode::leaf(NodeKind::Sort(vec![(
            "donor_sex".to_string(),
            Order::Asc,
        )]))]);
        assert_eq!(
            sort_keys(&resolve(root)),
            vec![("donor_sex".to_string(), Order::Asc), ("_score".to_string(), Order::Desc)]
        );
    }

    #[test]
    fn test_keeps_explicit_score_order() {
        let root = ExpressionNode::root(vec![ExpressionNode::leaf(NodeKind::Sort(vec![(
            "_score".to_string(),
            Order::Asc,
        )]))]);
        assert_eq!(sort_keys(&resolve(root)), vec![("_score".to_string(), Order::Asc)]);
    }
}
