// tests/request_tests.rs

use pql_compiler::{DocType, EngineConfig, QueryEngine, SearchRequest};
use serde_json::{Value as Json, json};

const SET: &str = "6d66b2bd-daed-431e-9a8d-b1d99be0bc18";

fn compile(pql: &str, doc_type: DocType) -> SearchRequest {
    QueryEngine::default().compile(pql, doc_type).unwrap()
}

fn body(pql: &str, doc_type: DocType) -> Json {
    compile(pql, doc_type).to_json()
}

/// The filter of a `filtered` query.
fn filter(body: &Json) -> &Json {
    &body["query"]["filtered"]["filter"]
}

// ============================================================================
// Endpoint
// ============================================================================

#[test]
fn test_search_endpoint() {
    assert_eq!(
        compile("eq(gender,'male')", DocType::DonorCentric).endpoint(),
        "/icgc-release/donor-centric/_search"
    );
}

#[test]
fn test_count_endpoint() {
    let request = compile("count(),eq(type,'single')", DocType::MutationCentric);
    assert_eq!(request.endpoint(), "/icgc-release/mutation-centric/_search?search_type=count");
    assert!(request.to_json().get("sort").is_none());
}

#[test]
fn test_index_from_config() {
    let config = EngineConfig {
        index: "icgc-27".to_string(),
        ..EngineConfig::default()
    };
    let request = QueryEngine::new(config).compile("select(id)", DocType::GeneCentric).unwrap();
    assert_eq!(request.endpoint(), "/icgc-27/gene-centric/_search");
}

// ============================================================================
// Queries
// ============================================================================

#[test]
fn test_filtered_term() {
    let body = body("eq(gender,'male')", DocType::DonorCentric);
    assert_eq!(body["query"]["filtered"]["query"], json!({"match_all": {}}));
    assert_eq!(filter(&body), &json!({"term": {"donor_sex": "male"}}));
}

#[test]
fn test_terms_and_range() {
    let body = body("in(gender,'male','female'),ge(ageAtDiagnosis,30)", DocType::DonorCentric);
    assert_eq!(
        filter(&body),
        &json!({"bool": {"must": [
            {"terms": {"donor_sex": ["male", "female"]}},
            {"range": {"donor_age_at_diagnosis": {"gte": 30}}}
        ]}})
    );
}

#[test]
fn test_or_is_should() {
    let body = body("or(eq(gender,'male'),missing(vitalStatus))", DocType::DonorCentric);
    assert_eq!(
        filter(&body),
        &json!({"bool": {"should": [
            {"term": {"donor_sex": "male"}},
            {"bool": {"must_not": [{"exists": {"field": "donor_vital_status"}}]}}
        ]}})
    );
}

#[test]
fn test_nested_query() {
    let body = body("eq(mutation.platform,'Illumina')", DocType::DonorCentric);
    assert_eq!(
        filter(&body),
        &json!({"nested": {
            "path": "gene.ssm.observation",
            "score_mode": "avg",
            "query": {"term": {"gene.ssm.observation.platform": "Illumina"}}
        }})
    );
}

#[test]
fn test_terms_lookup() {
    let body = body(&format!("eq(donor.id,'ES:{SET}')"), DocType::DonorCentric);
    assert_eq!(
        filter(&body),
        &json!({"terms": {"_donor_id": {
            "index": "terms-lookup",
            "type": "donor-ids",
            "id": SET,
            "path": "values"
        }}})
    );
}

// ============================================================================
// Projection, paging and sort
// ============================================================================

#[test]
fn test_fields_and_limit() {
    let body = body("select(id,gender),limit(5,20)", DocType::DonorCentric);
    assert_eq!(body["fields"], json!(["_donor_id", "donor_sex"]));
    assert_eq!(body["from"], 5);
    assert_eq!(body["size"], 20);
    assert!(body.get("query").is_none());
}

#[test]
fn test_object_fields_go_to_source() {
    let body = body("select(id,transcripts)", DocType::MutationCentric);
    assert_eq!(body["fields"], json!(["_mutation_id"]));
    assert_eq!(body["_source"], json!({"includes": ["transcript"]}));
}

#[test]
fn test_sort_with_score() {
    let body = body("sort(-ageAtDiagnosis)", DocType::DonorCentric);
    assert_eq!(
        body["sort"],
        json!([
            {"donor_age_at_diagnosis": {"order": "desc"}},
            {"_score": {"order": "desc"}}
        ])
    );
}

// ============================================================================
// Aggregations
// ============================================================================

#[test]
fn test_flat_facet() {
    let body = body("facets(gender)", DocType::DonorCentric);
    assert_eq!(
        body["aggs"],
        json!({
            "gender": {"global": {}, "aggs": {
                "gender": {"terms": {"field": "donor_sex", "size": 1000}}
            }},
            "gender_missing": {"global": {}, "aggs": {
                "gender_missing": {"missing": {"field": "donor_sex"}}
            }}
        })
    );
}

#[test]
fn test_filtered_nested_facet() {
    let body = body("facets(verificationStatus),in(type,'single')", DocType::MutationCentric);
    assert_eq!(
        body["aggs"]["verificationStatus"],
        json!({"global": {}, "aggs": {"verificationStatus": {
            "filter": {"terms": {"mutation_type": ["single"]}},
            "aggs": {"verificationStatus": {
                "nested": {"path": "ssm_occurrence.observation"},
                "aggs": {"verificationStatus": {
                    "terms": {"field": "ssm_occurrence.observation.verification_status", "size": 1000},
                    "aggs": {"verificationStatus": {"reverse_nested": {}}}
                }}
            }}
        }}})
    );
}

#[test]
fn test_project_facet() {
    let request = compile("facets(primarySite),eq(state,'live')", DocType::Project);
    assert_eq!(request.endpoint(), "/icgc-release/project/_search");
    let body = request.to_json();
    assert_eq!(
        body["aggs"]["primarySite"],
        json!({"global": {}, "aggs": {"primarySite": {
            "filter": {"term": {"_summary._state": "live"}},
            "aggs": {"primarySite": {"terms": {"field": "primary_site", "size": 1000}}}
        }}})
    );
}

#[test]
fn test_terms_size_from_config() {
    let config = EngineConfig {
        terms_size: 50,
        ..EngineConfig::default()
    };
    let body = QueryEngine::new(config)
        .compile("facets(gender)", DocType::DonorCentric)
        .unwrap()
        .to_json();
    assert_eq!(body["aggs"]["gender"]["aggs"]["gender"]["terms"]["size"], 50);
}
