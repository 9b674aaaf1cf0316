// tests/pql_compliance.rs
//
// End-to-end behaviour of the compiler across every document type.

use pql_compiler::aggs::MISSING_SUFFIX;
use pql_compiler::parser::parse;
use pql_compiler::tree::{ExpressionNode, NodeKind};
use pql_compiler::{DocType, QueryEngine, filters_to_pql};

fn tree(pql: &str, doc_type: DocType) -> ExpressionNode {
    QueryEngine::default().compile_tree(&parse(pql).unwrap(), doc_type).unwrap()
}

fn facets(root: &ExpressionNode) -> Vec<&ExpressionNode> {
    root.find_child(|k| matches!(k, NodeKind::Aggregations))
        .map(|aggs| aggs.children.iter().collect())
        .unwrap_or_default()
}

/// The field counted by a facet, terms or missing.
fn counted_field(facet: &ExpressionNode) -> Option<&str> {
    facet.descendants().into_iter().find_map(|n| match &n.kind {
        NodeKind::TermsAggregation { field, .. } | NodeKind::MissingAggregation { field, .. } => Some(field.as_str()),
        _ => None,
    })
}

fn scope(facet: &ExpressionNode) -> Vec<String> {
    facet
        .descendants()
        .into_iter()
        .filter_map(|n| match &n.kind {
            NodeKind::FilterAggregation { filter, .. } => Some(filter.to_string()),
            NodeKind::NestedAggregation { path, .. } => Some(path.clone()),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Round trips and rejections
// ============================================================================

#[test]
fn test_projection_round_trip() {
    for pql in ["select(*)", "select(*),select(a),facets(*),facets(b)"] {
        assert_eq!(parse(pql).unwrap().to_pql(), pql);
    }
}

#[test]
fn test_canonical_form_compiles_identically() {
    let pql = "sort(-id),in(gene.location,'chr12:123-456'),facets(gender),eq(gender,'male'),select(id)";
    let canonical = parse(pql).unwrap().to_pql();
    assert_eq!(tree(pql, DocType::DonorCentric), tree(&canonical, DocType::DonorCentric));
}

#[test]
fn test_empty_select_is_bad_query() {
    assert!(parse("select()").is_err());
    let err = QueryEngine::default().compile("select()", DocType::DonorCentric).unwrap_err();
    assert!(err.is_bad_query());
}

#[test]
fn test_count_with_select_is_bad_query() {
    let err = QueryEngine::default()
        .compile("count(),select(id)", DocType::DonorCentric)
        .unwrap_err();
    assert!(err.is_bad_query());
}

// ============================================================================
// Facets of every view
// ============================================================================

#[test]
fn test_every_facet_has_one_missing_twin() {
    for doc_type in DocType::ALL {
        let root = tree("facets(*)", doc_type);
        let facets = facets(&root);
        for facet in &facets {
            let Some(name) = facet.kind.aggregation_name() else {
                continue;
            };
            if name.ends_with(MISSING_SUFFIX) {
                continue;
            }
            let twin_name = format!("{name}{MISSING_SUFFIX}");
            let twins: Vec<_> = facets
                .iter()
                .filter(|f| f.kind.aggregation_name() == Some(twin_name.as_str()))
                .collect();
            assert_eq!(twins.len(), 1, "{doc_type}: {name}");
            assert_eq!(counted_field(twins[0]), counted_field(facet), "{doc_type}: {name}");
            assert_eq!(scope(twins[0]), scope(facet), "{doc_type}: {name}");
        }
    }
}

#[test]
fn test_facets_exclude_their_own_filters() {
    let pql = "facets(*),eq(gender,'male'),in(vitalStatus,'alive'),eq(gene.id,'G1'),eq(mutation.type,'single')";
    let root = tree(pql, DocType::DonorCentric);
    for facet in facets(&root) {
        let Some(field) = counted_field(facet) else {
            continue;
        };
        let scoped: Vec<&str> = facet
            .descendants()
            .into_iter()
            .filter_map(|n| match &n.kind {
                NodeKind::FilterAggregation { filter, .. } => Some(&**filter),
                _ => None,
            })
            .flat_map(|filter| filter.descendants())
            .filter_map(|n| n.field())
            .collect();
        assert!(!scoped.contains(&field), "{field} scopes its own facet");
    }
}

#[test]
fn test_every_view_compiles_to_json() {
    for doc_type in DocType::ALL {
        let request = QueryEngine::default().compile("select(*),facets(*)", doc_type).unwrap();
        assert!(request.to_json().is_object());
        assert!(request.endpoint().contains(doc_type.id()));
    }
}

// ============================================================================
// Converter to compiler
// ============================================================================

#[test]
fn test_converted_mutation_filters_compile() {
    let pql = filters_to_pql(
        r#"{"gene":{"hasPathway":true,"goTermId":{"is":["123"]}},"mutation":{"platform":{"is":["Illumina"]}}}"#,
        DocType::MutationCentric,
    )
    .unwrap();
    let request = QueryEngine::default().compile(&pql, DocType::MutationCentric);
    assert!(request.is_ok(), "{pql}: {request:?}");
}

#[test]
fn test_engine_shared_between_threads() {
    let engine = QueryEngine::default();
    std::thread::scope(|scope| {
        for doc_type in DocType::ALL {
            let engine = &engine;
            scope.spawn(move || {
                assert!(engine.compile("select(*)", doc_type).is_ok());
            });
        }
    });
}
