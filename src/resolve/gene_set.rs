use super::{map_query, unexpected};
use crate::ast::Value;
use crate::error::Result;
use crate::meta::{
    TypeModel, BIOLOGICAL_PROCESS, CELLULAR_COMPONENT, GENE_CURATED_SET_ID, GENE_GO_TERM_ID, GENE_PATHWAY_ID,
    GENE_SET_ID, MOLECULAR_FUNCTION, is_path_under,
};
use crate::tree::{ExpressionNode, NodeKind};

/// Expand `gene.goTermId` and `gene.geneSetId` into the ontology, pathway
/// and curated set fields they stand for.
pub(super) fn resolve(root: ExpressionNode, model: &TypeModel) -> Result<ExpressionNode> {
    map_query(root, |query| rewrite(query, model, None))
}

fn is_gene_set_field(field: &str) -> bool {
    field == GENE_GO_TERM_ID || field == GENE_SET_ID
}

/// `enclosing` is the path of the closest `Nested` ancestor.
fn rewrite(node: ExpressionNode, model: &TypeModel, enclosing: Option<&str>) -> Result<ExpressionNode> {
    let ExpressionNode { kind, children } = node;
    match kind {
        NodeKind::Nested { path } => {
            let children = children
                .into_iter()
                .map(|child| rewrite(child, model, Some(path.as_str())))
                .collect::<Result<Vec<_>>>()?;
            Ok(ExpressionNode::new(NodeKind::Nested { path }, children))
        }
        NodeKind::Query
        | NodeKind::Filter
        | NodeKind::Bool
        | NodeKind::MustBool
        | NodeKind::ShouldBool
        | NodeKind::Not => ExpressionNode::new(kind, children)
            .map_children(|child| rewrite(child, model, enclosing).map(Some)),
        NodeKind::Terms { field } if is_gene_set_field(&field) => {
            let values = children
                .into_iter()
                .filter_map(|child| match child.kind {
                    NodeKind::Terminal(value) => Some(value),
                    _ => None,
                })
                .collect();
            expand(&field, values, model, enclosing)
        }
        NodeKind::Term { field, value, .. } if is_gene_set_field(&field) => {
            expand(&field, vec![value], model, enclosing)
        }
        NodeKind::Term { .. }
        | NodeKind::Terms { .. }
        | NodeKind::Range { .. }
        | NodeKind::Exists { .. }
        | NodeKind::Missing { .. } => Ok(ExpressionNode::new(kind, children)),
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
        | NodeKind::GlobalAggregation { .. }) => Err(unexpected(&other, "gene sets")),
    }
}

fn expand(field: &str, values: Vec<Value>, model: &TypeModel, enclosing: Option<&str>) -> Result<ExpressionNode> {
    let mut should = Vec::with_capacity(5);
    for ontology in [CELLULAR_COMPONENT, BIOLOGICAL_PROCESS, MOLECULAR_FUNCTION] {
        should.push(ExpressionNode::terms(model.internal_field(ontology)?, values.iter().cloned()));
    }
    if field == GENE_SET_ID {
        should.push(ExpressionNode::terms(model.field(GENE_PATHWAY_ID)?, values.iter().cloned()));
        should.push(ExpressionNode::terms(model.field(GENE_CURATED_SET_ID)?, values));
    }
    let result = ExpressionNode::should(should);

    let nested_path = model.nested_path(model.internal_field(CELLULAR_COMPONENT)?)?;
    match nested_path {
        Some(path) if !enclosing.is_some_and(|outer| is_path_under(outer, path)) => {
            Ok(ExpressionNode::nested(path, result))
        }
        _ => Ok(result),
    }
}
