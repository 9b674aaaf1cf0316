//! In-memory execution of compiled requests.
//!
//! [`LocalIndex`] holds a handful of JSON documents and answers a
//! [`SearchRequest`] the way the search engine would: nested queries and
//! aggregations step into arrays of objects at their path, `reverse_nested`
//! steps back to the root document, `global` ignores the query. Scores are
//! not computed, so `_score` sorts keep document order.

use crate::ast::{Order, Value};
use crate::request::{Aggregation, AggregationKind, Query, RangeBounds, SearchRequest, Sort};
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Map, json};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Hits returned when the request sets no size.
const DEFAULT_SIZE: usize = 10;

/// The documents visible to a clause: a root document, or one element of a
/// nested array inside it.
#[derive(Debug, Clone, Copy)]
struct Scope<'d, 'q> {
    root: usize,
    path: &'q str,
    object: &'d serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Terms,
    Missing,
    Filter,
    Nested,
    ReverseNested,
    Global,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub key: String,
    pub doc_count: usize,
    pub aggregations: BTreeMap<String, AggregationResult>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregationResult {
    pub kind: ResultKind,
    pub doc_count: usize,
    /// Terms aggregations only
    pub buckets: Vec<Bucket>,
    pub aggregations: BTreeMap<String, AggregationResult>,
}

impl AggregationResult {
    pub fn bucket(&self, key: &str) -> Option<&Bucket> {
        self.buckets.iter().find(|b| b.key == key)
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut body = Map::new();
        body.insert("doc_count".to_string(), json!(self.doc_count));
        if self.kind == ResultKind::Terms {
            let buckets: Vec<serde_json::Value> = self
                .buckets
                .iter()
                .map(|bucket| {
                    let mut entry = aggregations_json(&bucket.aggregations);
                    entry.insert("key".to_string(), json!(bucket.key));
                    entry.insert("doc_count".to_string(), json!(bucket.doc_count));
                    serde_json::Value::Object(entry)
                })
                .collect();
            body.insert("buckets".to_string(), json!(buckets));
        }
        body.extend(aggregations_json(&self.aggregations));
        serde_json::Value::Object(body)
    }
}

fn aggregations_json(aggregations: &BTreeMap<String, AggregationResult>) -> Map<String, serde_json::Value> {
    aggregations
        .iter()
        .map(|(name, result)| (name.clone(), result.to_json()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchResponse {
    /// Documents matching the query and the post filter
    pub total: usize,
    pub hits: Vec<serde_json::Value>,
    pub aggregations: BTreeMap<String, AggregationResult>,
}

impl SearchResponse {
    /// Terms result of the facet `name`, found through the wrappers the
    /// facet was resolved into.
    pub fn facet(&self, name: &str) -> Option<&AggregationResult> {
        find_kind(&self.aggregations, name, ResultKind::Terms)
    }

    /// Missing twin of the facet `name`.
    pub fn facet_missing(&self, name: &str) -> Option<&AggregationResult> {
        let name = format!("{name}{}", crate::aggs::MISSING_SUFFIX);
        find_kind(&self.aggregations, &name, ResultKind::Missing)
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut body = Map::new();
        body.insert("hits".to_string(), json!({"total": self.total, "hits": self.hits}));
        if !self.aggregations.is_empty() {
            body.insert(
                "aggregations".to_string(),
                serde_json::Value::Object(aggregations_json(&self.aggregations)),
            );
        }
        serde_json::Value::Object(body)
    }
}

fn find_kind<'r>(
    aggregations: &'r BTreeMap<String, AggregationResult>,
    name: &str,
    kind: ResultKind,
) -> Option<&'r AggregationResult> {
    let mut current = aggregations.get(name)?;
    while current.kind != kind {
        current = current.aggregations.get(name)?;
    }
    Some(current)
}

/// A set of JSON documents searched without a cluster.
#[derive(Debug, Clone, Default)]
pub struct LocalIndex {
    documents: Vec<serde_json::Value>,
    /// (lookup type, id) -> ids stored in the lookup document
    lookups: HashMap<(String, String), Vec<Value>>,
}

impl LocalIndex {
    pub fn new(documents: Vec<serde_json::Value>) -> Self {
        LocalIndex {
            documents,
            lookups: HashMap::new(),
        }
    }

    /// Store an entity set for terms lookups.
    pub fn with_lookup(mut self, lookup_type: impl Into<String>, id: impl Into<String>, values: Vec<Value>) -> Self {
        self.lookups.insert((lookup_type.into(), id.into()), values);
        self
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn search(&self, request: &SearchRequest) -> SearchResponse {
        let roots = self.roots();
        let matched: Vec<Scope<'_, '_>> = roots
            .iter()
            .copied()
            .filter(|scope| request.query.as_ref().is_none_or(|q| self.matches(q, scope)))
            .collect();

        let aggregations = request
            .aggregations
            .iter()
            .map(|agg| (agg.name.clone(), self.aggregate(agg, &matched)))
            .collect();

        let mut hits: Vec<Scope<'_, '_>> = matched
            .into_iter()
            .filter(|scope| request.post_filter.as_ref().is_none_or(|q| self.matches(q, scope)))
            .collect();
        let total = hits.len();
        debug!(documents = self.documents.len(), total, "searched local index");

        if request.count_only {
            return SearchResponse {
                total,
                hits: Vec::new(),
                aggregations,
            };
        }

        sort_hits(&mut hits, &request.sort, request.doc_type.id());
        let from = request.from.map_or(0, |from| from as usize);
        let size = request.size.map_or(DEFAULT_SIZE, |size| size as usize);
        let hits = hits
            .into_iter()
            .skip(from)
            .take(size)
            .map(|scope| project(scope.object, request))
            .collect();

        SearchResponse {
            total,
            hits,
            aggregations,
        }
    }

    fn roots(&self) -> Vec<Scope<'_, 'static>> {
        self.documents
            .iter()
            .enumerate()
            .map(|(root, object)| Scope { root, path: "", object })
            .collect()
    }

    fn matches(&self, query: &Query, scope: &Scope<'_, '_>) -> bool {
        match query {
            Query::MatchAll => true,
            Query::Filtered(filter) => self.matches(filter, scope),
            Query::Bool { must, should, must_not } => {
                must.iter().all(|q| self.matches(q, scope))
                    && (should.is_empty() || should.iter().any(|q| self.matches(q, scope)))
                    && !must_not.iter().any(|q| self.matches(q, scope))
            }
            Query::Term { field, value } => field_values(scope, field).iter().any(|v| json_eq(v, value)),
            Query::Terms { field, values } => field_values(scope, field)
                .iter()
                .any(|v| values.iter().any(|value| json_eq(v, value))),
            Query::TermsLookup { field, lookup } => {
                let Some(ids) = self.lookups.get(&(lookup.doc_type.clone(), lookup.id.clone())) else {
                    return false;
                };
                field_values(scope, field)
                    .iter()
                    .any(|v| ids.iter().any(|id| json_eq(v, id)))
            }
            Query::Range { field, bounds } => field_values(scope, field).iter().any(|v| in_range(v, bounds)),
            Query::Exists { field } => !field_values(scope, field).is_empty(),
            Query::Nested { path, query } => nested_scopes(scope, path)
                .iter()
                .any(|nested| self.matches(query, nested)),
        }
    }

    fn aggregate<'d, 'q>(&'d self, aggregation: &'q Aggregation, scopes: &[Scope<'d, 'q>]) -> AggregationResult {
        let sub = |scopes: &[Scope<'d, 'q>]| -> BTreeMap<String, AggregationResult> {
            aggregation
                .aggregations
                .iter()
                .map(|agg| (agg.name.clone(), self.aggregate(agg, scopes)))
                .collect()
        };
        let result = |kind, scopes: &[Scope<'d, 'q>]| AggregationResult {
            kind,
            doc_count: scopes.len(),
            buckets: Vec::new(),
            aggregations: sub(scopes),
        };

        match &aggregation.kind {
            AggregationKind::Global => result(ResultKind::Global, &self.roots()),
            AggregationKind::Filter(query) => {
                let matched: Vec<_> = scopes.iter().copied().filter(|s| self.matches(query, s)).collect();
                result(ResultKind::Filter, &matched)
            }
            AggregationKind::Nested { path } => {
                let nested: Vec<_> = scopes.iter().flat_map(|s| nested_scopes(s, path)).collect();
                result(ResultKind::Nested, &nested)
            }
            AggregationKind::ReverseNested => {
                let roots: BTreeSet<usize> = scopes.iter().map(|s| s.root).collect();
                let roots: Vec<_> = roots
                    .into_iter()
                    .map(|root| Scope {
                        root,
                        path: "",
                        object: &self.documents[root],
                    })
                    .collect();
                result(ResultKind::ReverseNested, &roots)
            }
            AggregationKind::Missing { field } => {
                let missing: Vec<_> = scopes
                    .iter()
                    .copied()
                    .filter(|s| field_values(s, field).is_empty())
                    .collect();
                result(ResultKind::Missing, &missing)
            }
            AggregationKind::Terms { field, size } => {
                let mut keyed: BTreeMap<String, Vec<Scope<'d, 'q>>> = BTreeMap::new();
                for scope in scopes {
                    let keys: BTreeSet<String> = field_values(scope, field).into_iter().map(bucket_key).collect();
                    for key in keys {
                        keyed.entry(key).or_default().push(*scope);
                    }
                }

                let mut keyed: Vec<(String, Vec<Scope<'d, 'q>>)> = keyed.into_iter().collect();
                // Count descending, then key ascending. The sort is stable.
                keyed.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
                let buckets = keyed
                    .into_iter()
                    .take(*size as usize)
                    .map(|(key, scopes)| Bucket {
                        key,
                        doc_count: scopes.len(),
                        aggregations: sub(&scopes),
                    })
                    .collect();

                AggregationResult {
                    kind: ResultKind::Terms,
                    doc_count: scopes.len(),
                    buckets,
                    aggregations: BTreeMap::new(),
                }
            }
        }
    }
}

/// Elements of the nested array at `path`, seen from `scope`.
fn nested_scopes<'d, 'q>(scope: &Scope<'d, '_>, path: &'q str) -> Vec<Scope<'d, 'q>> {
    let Some(relative) = relative_path(scope.path, path) else {
        return Vec::new();
    };
    let mut objects = Vec::new();
    collect(scope.object, &relative.split('.').collect::<Vec<_>>(), &mut objects);
    objects
        .into_iter()
        .filter(|object| object.is_object())
        .map(|object| Scope {
            root: scope.root,
            path,
            object,
        })
        .collect()
}

/// Leaf values of `field` visible from `scope`. Arrays of values and
/// arrays of objects are flattened.
fn field_values<'d>(scope: &Scope<'d, '_>, field: &str) -> Vec<&'d serde_json::Value> {
    let Some(relative) = relative_path(scope.path, field) else {
        return Vec::new();
    };
    let mut values = Vec::new();
    collect(scope.object, &relative.split('.').collect::<Vec<_>>(), &mut values);
    values.retain(|v| !v.is_object());
    values
}

/// `field` relative to the nested `path` of a scope. Fields outside the
/// scope are not visible.
fn relative_path<'f>(path: &str, field: &'f str) -> Option<&'f str> {
    if path.is_empty() {
        return Some(field);
    }
    field.strip_prefix(path)?.strip_prefix('.')
}

fn collect<'d>(value: &'d serde_json::Value, segments: &[&str], out: &mut Vec<&'d serde_json::Value>) {
    match value {
        serde_json::Value::Null => {}
        serde_json::Value::Array(items) => {
            for item in items {
                collect(item, segments, out);
            }
        }
        serde_json::Value::Object(map) => match segments.split_first() {
            Some((first, rest)) => {
                if let Some(child) = map.get(*first) {
                    collect(child, rest, out);
                }
            }
            None => out.push(value),
        },
        _ if segments.is_empty() => out.push(value),
        _ => {}
    }
}

fn compare(json: &serde_json::Value, value: &Value) -> Option<Ordering> {
    match (json, value) {
        (serde_json::Value::String(s), Value::String(v)) => Some(s.as_str().cmp(v.as_str())),
        (serde_json::Value::String(s), Value::Integer(_) | Value::Decimal(_)) => {
            let number: f64 = s.parse().ok()?;
            number.partial_cmp(&value_f64(value)?)
        }
        (serde_json::Value::Number(n), Value::Integer(_) | Value::Decimal(_)) => n.as_f64()?.partial_cmp(&value_f64(value)?),
        (serde_json::Value::Number(n), Value::String(v)) => n.as_f64()?.partial_cmp(&v.parse::<f64>().ok()?),
        (serde_json::Value::Bool(b), Value::Boolean(v)) => Some(b.cmp(v)),
        _ => None,
    }
}

fn value_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(n) => Some(*n as f64),
        Value::Decimal(d) => d.to_f64(),
        Value::String(_) | Value::Boolean(_) => None,
    }
}

fn json_eq(json: &serde_json::Value, value: &Value) -> bool {
    compare(json, value) == Some(Ordering::Equal)
}

fn in_range(json: &serde_json::Value, bounds: &RangeBounds) -> bool {
    let check = |bound: &Option<Value>, accept: fn(Ordering) -> bool| {
        bound
            .as_ref()
            .is_none_or(|value| compare(json, value).is_some_and(accept))
    };
    check(&bounds.gt, Ordering::is_gt)
        && check(&bounds.gte, Ordering::is_ge)
        && check(&bounds.lt, Ordering::is_lt)
        && check(&bounds.lte, Ordering::is_le)
}

fn bucket_key(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Order hits by the request's sort keys. `_score` keys and fields absent
/// from a document leave the order unchanged.
fn sort_hits(hits: &mut [Scope<'_, '_>], sort: &[Sort], doc_type_id: &str) {
    if sort.is_empty() {
        return;
    }
    hits.sort_by(|a, b| {
        sort.iter()
            .map(|key| {
                let field = key
                    .field
                    .strip_prefix(doc_type_id)
                    .and_then(|f| f.strip_prefix('.'))
                    .unwrap_or(key.field.as_str());
                let ordering = match (first_value(a, field), first_value(b, field)) {
                    (Some(x), Some(y)) => compare_json(x, y),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                match key.order {
                    Order::Asc => ordering,
                    Order::Desc => ordering.reverse(),
                }
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    });
}

fn first_value<'d>(scope: &Scope<'d, '_>, field: &str) -> Option<&'d serde_json::Value> {
    field_values(scope, field).into_iter().next()
}

fn compare_json(a: &serde_json::Value, b: &serde_json::Value) -> Ordering {
    match (a, b) {
        (serde_json::Value::Number(x), serde_json::Value::Number(y)) => {
            x.as_f64().partial_cmp(&y.as_f64()).unwrap_or(Ordering::Equal)
        }
        (serde_json::Value::String(x), serde_json::Value::String(y)) => x.cmp(y),
        (serde_json::Value::Bool(x), serde_json::Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

/// The parts of `document` named by the request's fields and source
/// includes; the whole document when it names none.
fn project(document: &serde_json::Value, request: &SearchRequest) -> serde_json::Value {
    let paths: Vec<&str> = request
        .fields
        .iter()
        .chain(request.source.iter().flatten())
        .map(String::as_str)
        .collect();
    if paths.is_empty() {
        return document.clone();
    }

    let mut projected = Map::new();
    for path in paths {
        copy_path(document, &mut projected, &path.split('.').collect::<Vec<_>>());
    }
    serde_json::Value::Object(projected)
}

/// Copy the value at `segments` into `target`. An array on the way is
/// copied whole.
fn copy_path(source: &serde_json::Value, target: &mut Map<String, serde_json::Value>, segments: &[&str]) {
    let (Some((first, rest)), serde_json::Value::Object(map)) = (segments.split_first(), source) else {
        return;
    };
    let Some(child) = map.get(*first) else {
        return;
    };
    if rest.is_empty() || !child.is_object() {
        target.insert(first.to_string(), child.clone());
        return;
    }
    let entry = target
        .entry(first.to_string())
        .or_insert_with(|| serde_json::Value::Object(Map::new()));
    if let serde_json::Value::Object(inner) = entry {
        copy_path(child, inner, rest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::DocType;

    fn index() -> LocalIndex {
        LocalIndex::new(vec![
            json!({"_donor_id": "DO1", "donor_sex": "male", "gene": [{"_gene_id": "G1"}, {"_gene_id": "G2"}]}),
            json!({"_donor_id": "DO2", "donor_sex": "female", "gene": [{"_gene_id": "G2"}]}),
            json!({"_donor_id": "DO3", "gene": []}),
        ])
    }

    fn request(query: Query) -> SearchRequest {
        let mut request = SearchRequest::new("icgc", DocType::DonorCentric);
        request.query = Some(Query::Filtered(Box::new(query)));
        request
    }

    #[test]
    fn test_term_query() {
        let response = index().search(&request(Query::Term {
            field: "donor_sex".to_string(),
            value: Value::string("male"),
        }));
        assert_eq!(response.total, 1);
        assert_eq!(response.hits[0]["_donor_id"], "DO1");
    }

    #[test]
    fn test_nested_query() {
        let response = index().search(&request(Query::Nested {
            path: "gene".to_string(),
            query: Box::new(Query::Term {
                field: "gene._gene_id".to_string(),
                value: Value::string("G2"),
            }),
        }));
        assert_eq!(response.total, 2);
    }

    #[test]
    fn test_missing_is_must_not_exists() {
        let response = index().search(&request(Query::must_not(vec![Query::Exists {
            field: "donor_sex".to_string(),
        }])));
        assert_eq!(response.total, 1);
        assert_eq!(response.hits[0]["_donor_id"], "DO3");
    }

    #[test]
    fn test_terms_lookup() {
        let index = index().with_lookup("donor-ids", "set-1", vec![Value::string("DO2"), Value::string("DO3")]);
        let response = index.search(&request(Query::TermsLookup {
            field: "_donor_id".to_string(),
            lookup: crate::tree::TermsLookup {
                index: "terms-lookup".to_string(),
                doc_type: "donor-ids".to_string(),
                id: "set-1".to_string(),
                path: "values".to_string(),
            },
        }));
        assert_eq!(response.total, 2);
    }

    #[test]
    fn test_paging_and_count() {
        let mut request = SearchRequest::new("icgc", DocType::DonorCentric);
        request.from = Some(1);
        request.size = Some(1);
        let response = index().search(&request);
        assert_eq!(response.total, 3);
        assert_eq!(response.hits.len(), 1);
        assert_eq!(response.hits[0]["_donor_id"], "DO2");

        request.count_only = true;
        let response = index().search(&request);
        assert_eq!(response.total, 3);
        assert!(response.hits.is_empty());
    }

    #[test]
    fn test_nested_terms_with_reverse_nested() {
        let mut request = SearchRequest::new("icgc", DocType::DonorCentric);
        request.aggregations = vec![Aggregation {
            name: "id".to_string(),
            kind: AggregationKind::Nested { path: "gene".to_string() },
            aggregations: vec![Aggregation {
                name: "id".to_string(),
                kind: AggregationKind::Terms {
                    field: "gene._gene_id".to_string(),
                    size: 10,
                },
                aggregations: vec![Aggregation {
                    name: "id".to_string(),
                    kind: AggregationKind::ReverseNested,
                    aggregations: Vec::new(),
                }],
            }],
        }];

        let response = index().search(&request);
        let terms = response.facet("id").unwrap();
        let g2 = terms.bucket("G2").unwrap();
        assert_eq!(g2.doc_count, 2);
        assert_eq!(g2.aggregations["id"].doc_count, 2);
        assert_eq!(terms.buckets[0].key, "G2");
    }

    #[test]
    fn test_projection() {
        let mut request = SearchRequest::new("icgc", DocType::DonorCentric);
        request.fields = vec!["_donor_id".to_string()];
        let response = index().search(&request);
        assert_eq!(response.hits[0], json!({"_donor_id": "DO1"}));
    }
}
