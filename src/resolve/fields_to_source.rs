use crate::meta::TypeModel;
use crate::tree::{ExpressionNode, NodeKind};

/// Move selected object fields (`transcript`, `ssm_occurrence`) from stored
/// fields to `_source` includes. Object fields cannot be served as stored
/// fields.
pub(super) fn resolve(root: ExpressionNode, model: &TypeModel) -> ExpressionNode {
    let ExpressionNode { kind, children } = root;

    let mut out = Vec::with_capacity(children.len() + 1);
    let mut source = Vec::new();
    for child in children {
        match child.kind {
            NodeKind::Fields(fields) => {
                let (includes, stored): (Vec<String>, Vec<String>) = fields
                    .into_iter()
                    .partition(|field| model.include_fields().contains(field));
                source.extend(includes);
                if !stored.is_empty() {
                    out.push(ExpressionNode::leaf(NodeKind::Fields(stored)));
                }
            }
            kind => out.push(ExpressionNode::new(kind, child.children)),
        }
    }

    if !source.is_empty() {
        out.push(ExpressionNode::leaf(NodeKind::Source(source)));
    }
    ExpressionNode::new(kind, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lower::lower;
    use crate::meta::{type_model, DocType};
    use crate::parser::parse;

    fn run(pql: &str, doc_type: DocType) -> ExpressionNode {
        let model = type_model(doc_type);
        resolve(lower(&parse(pql).unwrap(), model).unwrap(), model)
    }

    #[test]
    fn test_select_all_has_no_includes() {
        let root = run("select(*)", DocType::MutationCentric);
        assert!(!root.has_child(|k| matches!(k, NodeKind::Source(_))));
        assert!(root.has_child(|k| matches!(k, NodeKind::Fields(_))));
    }

    #[test]
    fn test_object_field_moves_to_source() {
        let root = run("select(transcripts)", DocType::MutationCentric);
        let source = root.find_child(|k| matches!(k, NodeKind::Source(_))).unwrap();
        assert_eq!(source.kind, NodeKind::Source(vec!["transcript".to_string()]));
        assert!(!root.has_child(|k| matches!(k, NodeKind::Fields(_))));
    }

    #[test]
    fn test_gene_transcripts() {
        let root = run("select(transcripts,id)", DocType::GeneCentric);
        assert_eq!(
            root.find_child(|k| matches!(k, NodeKind::Source(_))).unwrap().kind,
            NodeKind::Source(vec!["transcripts".to_string()])
        );
        assert_eq!(
            root.find_child(|k| matches!(k, NodeKind::Fields(_))).unwrap().kind,
            NodeKind::Fields(vec!["_gene_id".to_string()])
        );
    }
}
