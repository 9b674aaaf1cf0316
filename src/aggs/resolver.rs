use super::filters::{exclude_field, has_filters_at_level, has_non_nested_fields, resolve_nested_filter};
use crate::cleanup::remove_empty;
use crate::context::VisitContext;
use crate::error::Result;
use crate::meta::TypeModel;
use crate::resolve::unexpected;
use crate::tree::{ExpressionNode, NodeKind};
use tracing::trace;

/// Turn every plain `TermsAggregation` under `Aggregations` into a global,
/// filtered and nested aggregation tree that counts the facet over the
/// documents matched by every active filter except the facet's own.
///
/// For a nested facet, filters on the nesting levels between the document
/// root and the facet field are applied once more inside the matching
/// `NestedAggregation`: a parent document that matches a nested condition
/// still carries nested children that do not, and those must not be
/// counted.
pub(super) fn resolve(root: ExpressionNode, model: &TypeModel) -> Result<ExpressionNode> {
    let filters = root.query_filter().cloned();
    root.map_children(|child| match child.kind {
        NodeKind::Aggregations => resolve_facets(child, filters.as_ref(), model).map(Some),
        _ => Ok(Some(child)),
    })
}

fn resolve_facets(
    aggregations: ExpressionNode,
    filters: Option<&ExpressionNode>,
    model: &TypeModel,
) -> Result<ExpressionNode> {
    aggregations.map_children(|facet| {
        let (name, field) = match &facet.kind {
            NodeKind::TermsAggregation { name, field } => (name.clone(), field.clone()),
            other => return Err(unexpected(other, "facets")),
        };
        resolve_facet(&name, &field, facet, filters, model).map(Some)
    })
}

fn resolve_facet(
    name: &str,
    field: &str,
    terms: ExpressionNode,
    filters: Option<&ExpressionNode>,
    model: &TypeModel,
) -> Result<ExpressionNode> {
    let resolved = match filters {
        Some(filters) => exclude_field(filters.clone(), field)?.and_then(remove_empty),
        None => None,
    };

    let chain = match model.nested_path(field)? {
        Some(nested_path) => Some(nested_chain(name, nested_path, terms.clone(), resolved.as_ref(), model)?),
        None => None,
    };

    let body = match (resolved, chain) {
        (Some(filters), None) => ExpressionNode::filter_aggregation(name, filters, terms),
        (Some(filters), Some((chain, outer_path))) => {
            if has_non_nested_fields(&filters, VisitContext::new(&outer_path, model))? {
                ExpressionNode::filter_aggregation(name, filters, chain)
            } else {
                chain
            }
        }
        (None, Some((chain, _))) => chain,
        (None, None) => terms,
    };

    let facet = ExpressionNode::new(
        NodeKind::GlobalAggregation {
            name: name.to_string(),
        },
        vec![body],
    );
    trace!(facet = name, "\n{facet}");
    Ok(facet)
}

/// `NestedAggregation` nodes from the outermost level down to
/// `nested_path`, each level with filters scoped by a `FilterAggregation`,
/// `terms` at the bottom. Levels with no filters of their own are skipped,
/// except `nested_path` itself, which also carries every filter nested
/// below it. Returns the chain and its outermost path.
fn nested_chain(
    name: &str,
    nested_path: &str,
    terms: ExpressionNode,
    filters: Option<&ExpressionNode>,
    model: &TypeModel,
) -> Result<(ExpressionNode, String)> {
    let mut levels: Vec<(String, Option<ExpressionNode>)> = Vec::new();
    for path in model.nested_paths(nested_path) {
        let own_level = path == nested_path;
        let scoped = match filters {
            Some(filters) if own_level || has_filters_at_level(filters, &path)? => {
                resolve_nested_filter(filters.clone(), VisitContext::new(&path, model))?
            }
            _ => None,
        };
        if scoped.is_some() || own_level {
            levels.push((path, scoped));
        }
    }

    let outer_path = levels
        .first()
        .map(|(path, _)| path.clone())
        .unwrap_or_else(|| nested_path.to_string());
    let chain = levels.into_iter().rev().fold(terms, |inner, (path, scoped)| {
        let body = match scoped {
            Some(filter) => ExpressionNode::filter_aggregation(name, filter, inner),
            None => inner,
        };
        ExpressionNode::nested_aggregation(name, path).with_child(body)
    });
    Ok((chain, outer_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::DocType;

    fn facet_body(root: &ExpressionNode) -> &ExpressionNode {
        let aggs = root.find_child(|k| matches!(k, NodeKind::Aggregations)).unwrap();
        aggs.first_child().unwrap().first_child().unwrap()
    }

    #[test]
    fn test_unfiltered_flat_facet() {
        let root = ExpressionNode::root(vec![ExpressionNode::aggregations(vec![
            ExpressionNode::terms_aggregation("gender", "donor_sex"),
        ])]);
        let root = resolve(root, DocType::DonorCentric.type_model()).unwrap();
        assert_eq!(facet_body(&root), &ExpressionNode::terms_aggregation("gender", "donor_sex"));
    }

    #[test]
    fn test_deeper_filter_scopes_the_facet_level() {
        let filter = ExpressionNode::filter(ExpressionNode::nested(
            "gene.ssm",
            ExpressionNode::term("gene.ssm.mutation_type", "single"),
        ));
        let root = ExpressionNode::root(vec![
            ExpressionNode::query(filter),
            ExpressionNode::aggregations(vec![ExpressionNode::terms_aggregation("gene.type", "gene.biotype")]),
        ]);
        let root = resolve(root, DocType::DonorCentric.type_model()).unwrap();

        let gene = facet_body(&root);
        assert_eq!(gene.kind, NodeKind::NestedAggregation {
            name: "gene.type".to_string(),
            path: "gene".to_string()
        });
        let scoped = gene.first_child().unwrap();
        match &scoped.kind {
            NodeKind::FilterAggregation { filter, .. } => assert_eq!(
                filter.first_child().unwrap(),
                &ExpressionNode::nested("gene.ssm", ExpressionNode::term("gene.ssm.mutation_type", "single"))
            ),
            other => panic!("expected a filter aggregation, got {}", other.tag()),
        }
    }

    #[test]
    fn test_nested_facet_without_filters() {
        let root = ExpressionNode::root(vec![ExpressionNode::aggregations(vec![
            ExpressionNode::terms_aggregation("transcriptId", "transcript.id"),
        ])]);
        let root = resolve(root, DocType::MutationCentric.type_model()).unwrap();
        assert_eq!(
            facet_body(&root),
            &ExpressionNode::nested_aggregation("transcriptId", "transcript")
                .with_child(ExpressionNode::terms_aggregation("transcriptId", "transcript.id"))
        );
    }
}
