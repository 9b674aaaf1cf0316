//! Native search requests.
//!
//! The last stage of compilation projects the simplified expression tree
//! onto the request objects of the search engine, one case per node tag.
//! No decisions are made here: nesting, scoping and filter exclusion were
//! settled by the earlier passes, and any node this stage does not expect
//! at a position is an internal error.
//!
//! [`SearchRequest::to_json`] renders the request body in the engine's JSON
//! query DSL:
//!
//! ```text
//! {
//!   "query": {"filtered": {"query": {"match_all": {}}, "filter": {...}}},
//!   "fields": ["_donor_id"],
//!   "sort": [{"_score": {"order": "desc"}}],
//!   "aggs": {"gender": {"global": {}, "aggs": {...}}}
//! }
//! ```

use crate::ast::{Order, Value};
use crate::context::QueryContext;
use crate::error::{CompileError, Result};
use crate::meta::DocType;
use crate::resolve::unexpected;
use crate::tree::{ExpressionNode, NodeKind, TermsLookup};
use serde_json::{Map, json};
use tracing::debug;

/// Field marking the stand-in donor of genes that have no donors.
const PLACEHOLDER_FIELD: &str = "placeholder";

/// A query or filter clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    MatchAll,
    /// Constant-score `match_all` restricted by a filter
    Filtered(Box<Query>),
    Bool {
        must: Vec<Query>,
        should: Vec<Query>,
        must_not: Vec<Query>,
    },
    Term {
        field: String,
        value: Value,
    },
    Terms {
        field: String,
        values: Vec<Value>,
    },
    /// `field` must hold one of the ids stored in a lookup document
    TermsLookup {
        field: String,
        lookup: TermsLookup,
    },
    Range {
        field: String,
        bounds: RangeBounds,
    },
    Exists {
        field: String,
    },
    Nested {
        path: String,
        query: Box<Query>,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeBounds {
    pub gt: Option<Value>,
    pub gte: Option<Value>,
    pub lt: Option<Value>,
    pub lte: Option<Value>,
}

impl Query {
    pub fn must(clauses: Vec<Query>) -> Self {
        Query::Bool {
            must: clauses,
            should: Vec::new(),
            must_not: Vec::new(),
        }
    }

    pub fn must_not(clauses: Vec<Query>) -> Self {
        Query::Bool {
            must: Vec::new(),
            should: Vec::new(),
            must_not: clauses,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Query::MatchAll => json!({"match_all": {}}),
            Query::Filtered(filter) => json!({
                "filtered": {"query": {"match_all": {}}, "filter": filter.to_json()}
            }),
            Query::Bool { must, should, must_not } => {
                let mut clauses = Map::new();
                for (occur, queries) in [("must", must), ("should", should), ("must_not", must_not)] {
                    if !queries.is_empty() {
                        clauses.insert(occur.to_string(), queries.iter().map(Query::to_json).collect());
                    }
                }
                json!({"bool": clauses})
            }
            Query::Term { field, value } => json!({"term": {field.as_str(): value.to_json()}}),
            Query::Terms { field, values } => {
                let values: Vec<serde_json::Value> = values.iter().map(Value::to_json).collect();
                json!({"terms": {field.as_str(): values}})
            }
            Query::TermsLookup { field, lookup } => json!({
                "terms": {
                    field.as_str(): {
                        "index": lookup.index,
                        "type": lookup.doc_type,
                        "id": lookup.id,
                        "path": lookup.path,
                    }
                }
            }),
            Query::Range { field, bounds } => {
                let mut range = Map::new();
                for (op, bound) in [
                    ("gt", &bounds.gt),
                    ("gte", &bounds.gte),
                    ("lt", &bounds.lt),
                    ("lte", &bounds.lte),
                ] {
                    if let Some(value) = bound {
                        range.insert(op.to_string(), value.to_json());
                    }
                }
                json!({"range": {field.as_str(): range}})
            }
            Query::Exists { field } => json!({"exists": {"field": field}}),
            Query::Nested { path, query } => json!({
                "nested": {"path": path, "score_mode": "avg", "query": query.to_json()}
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AggregationKind {
    Terms { field: String, size: u32 },
    Missing { field: String },
    Filter(Query),
    Nested { path: String },
    ReverseNested,
    Global,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub name: String,
    pub kind: AggregationKind,
    pub aggregations: Vec<Aggregation>,
}

impl Aggregation {
    pub fn to_json(&self) -> serde_json::Value {
        let body = match &self.kind {
            AggregationKind::Terms { field, size } => json!({"terms": {"field": field, "size": size}}),
            AggregationKind::Missing { field } => json!({"missing": {"field": field}}),
            AggregationKind::Filter(filter) => json!({"filter": filter.to_json()}),
            AggregationKind::Nested { path } => json!({"nested": {"path": path}}),
            AggregationKind::ReverseNested => json!({"reverse_nested": {}}),
            AggregationKind::Global => json!({"global": {}}),
        };
        let mut body = match body {
            serde_json::Value::Object(map) => map,
            _ => Map::new(),
        };
        if !self.aggregations.is_empty() {
            body.insert("aggs".to_string(), aggregations_json(&self.aggregations));
        }
        serde_json::Value::Object(body)
    }
}

fn aggregations_json(aggregations: &[Aggregation]) -> serde_json::Value {
    let aggs: Map<String, serde_json::Value> = aggregations
        .iter()
        .map(|agg| (agg.name.clone(), agg.to_json()))
        .collect();
    serde_json::Value::Object(aggs)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub order: Order,
}

/// A compiled search, ready to be sent to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub index: String,
    pub doc_type: DocType,
    pub query: Option<Query>,
    pub post_filter: Option<Query>,
    pub from: Option<u32>,
    pub size: Option<u32>,
    pub sort: Vec<Sort>,
    /// Stored fields to return
    pub fields: Vec<String>,
    /// `_source` includes; `None` leaves `_source` off
    pub source: Option<Vec<String>>,
    pub aggregations: Vec<Aggregation>,
    /// Only the hit count is wanted
    pub count_only: bool,
}

impl SearchRequest {
    pub fn new(index: impl Into<String>, doc_type: DocType) -> Self {
        SearchRequest {
            index: index.into(),
            doc_type,
            query: None,
            post_filter: None,
            from: None,
            size: None,
            sort: Vec::new(),
            fields: Vec::new(),
            source: None,
            aggregations: Vec::new(),
            count_only: false,
        }
    }

    /// URL path of the search endpoint.
    pub fn endpoint(&self) -> String {
        let path = format!("/{}/{}/_search", self.index, self.doc_type.id());
        if self.count_only {
            format!("{path}?search_type=count")
        } else {
            path
        }
    }

    /// Request body in the engine's query DSL.
    pub fn to_json(&self) -> serde_json::Value {
        let mut body = Map::new();
        if let Some(from) = self.from {
            body.insert("from".to_string(), json!(from));
        }
        if let Some(size) = self.size {
            body.insert("size".to_string(), json!(size));
        }
        if let Some(query) = &self.query {
            body.insert("query".to_string(), query.to_json());
        }
        if let Some(filter) = &self.post_filter {
            body.insert("post_filter".to_string(), filter.to_json());
        }
        if !self.fields.is_empty() {
            body.insert("fields".to_string(), json!(self.fields));
        }
        if let Some(includes) = &self.source {
            body.insert("_source".to_string(), json!({"includes": includes}));
        }
        if !self.sort.is_empty() {
            let sort: Vec<serde_json::Value> = self
                .sort
                .iter()
                .map(|s| json!({s.field.as_str(): {"order": s.order.as_str()}}))
                .collect();
            body.insert("sort".to_string(), json!(sort));
        }
        if !self.aggregations.is_empty() {
            body.insert("aggs".to_string(), aggregations_json(&self.aggregations));
        }
        serde_json::Value::Object(body)
    }
}

/// Projects a simplified tree onto a [`SearchRequest`].
pub struct RequestBuilder<'a> {
    context: &'a QueryContext<'a>,
    terms_size: u32,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(context: &'a QueryContext<'a>, terms_size: u32) -> Self {
        RequestBuilder { context, terms_size }
    }

    pub fn build(&self, root: &ExpressionNode) -> Result<SearchRequest> {
        if !matches!(root.kind, NodeKind::Root) {
            return Err(unexpected(&root.kind, "the request root"));
        }

        let mut request = SearchRequest::new(self.context.index, self.context.doc_type());
        for child in &root.children {
            match &child.kind {
                NodeKind::Query => request.query = Some(self.query(child)?),
                NodeKind::Filter => request.post_filter = Some(self.filter(child)?),
                NodeKind::Aggregations => {
                    debug!("Adding aggregations\n{child}");
                    request.aggregations = child
                        .children
                        .iter()
                        .map(|agg| self.aggregation(agg))
                        .collect::<Result<_>>()?;
                }
                NodeKind::Fields(fields) => request.fields = fields.clone(),
                NodeKind::Source(fields) => request.source = Some(fields.clone()),
                NodeKind::Limit { from, size } => {
                    request.from = Some(*from);
                    request.size = Some(*size);
                }
                NodeKind::Sort(keys) => request.sort = self.sorts(keys),
                NodeKind::Count => {
                    debug!("Setting search type to count");
                    request.count_only = true;
                }
                other => return Err(unexpected(other, "the request root")),
            }
        }
        Ok(request)
    }

    fn query(&self, node: &ExpressionNode) -> Result<Query> {
        let child = single_child(node)?;
        match &child.kind {
            NodeKind::Filter => Ok(Query::Filtered(Box::new(self.filter(child)?))),
            _ => self.filter(child),
        }
    }

    fn filter(&self, node: &ExpressionNode) -> Result<Query> {
        match &node.kind {
            NodeKind::Filter => self.filter(single_child(node)?),
            NodeKind::Bool => {
                let (mut must, mut should) = (Vec::new(), Vec::new());
                for clause in &node.children {
                    let target = match clause.kind {
                        NodeKind::MustBool => &mut must,
                        NodeKind::ShouldBool => &mut should,
                        _ => {
                            return Err(CompileError::internal(format!(
                                "Operation type {} is not supported",
                                clause.tag()
                            )));
                        }
                    };
                    for condition in &clause.children {
                        target.push(self.filter(condition)?);
                    }
                }
                Ok(Query::Bool {
                    must,
                    should,
                    must_not: Vec::new(),
                })
            }
            NodeKind::Not => Ok(Query::must_not(vec![self.filter(single_child(node)?)?])),
            NodeKind::Term { field, value, lookup } => Ok(match lookup {
                Some(lookup) => Query::TermsLookup {
                    field: field.clone(),
                    lookup: lookup.clone(),
                },
                None => Query::Term {
                    field: field.clone(),
                    value: value.clone(),
                },
            }),
            NodeKind::Terms { field } => {
                let values = node
                    .children
                    .iter()
                    .map(|child| match &child.kind {
                        NodeKind::Terminal(value) => Ok(value.clone()),
                        other => Err(unexpected(other, "terms values")),
                    })
                    .collect::<Result<_>>()?;
                Ok(Query::Terms {
                    field: field.clone(),
                    values,
                })
            }
            NodeKind::Range { field } => {
                if node.children.is_empty() {
                    return Err(CompileError::internal("Range node has no bounds"));
                }
                let mut bounds = RangeBounds::default();
                for bound in &node.children {
                    match &bound.kind {
                        NodeKind::GreaterThan(v) => bounds.gt = Some(v.clone()),
                        NodeKind::GreaterEqual(v) => bounds.gte = Some(v.clone()),
                        NodeKind::LessThan(v) => bounds.lt = Some(v.clone()),
                        NodeKind::LessEqual(v) => bounds.lte = Some(v.clone()),
                        other => return Err(unexpected(other, "range bounds")),
                    }
                }
                Ok(Query::Range {
                    field: field.clone(),
                    bounds,
                })
            }
            NodeKind::Exists { field } => Ok(Query::Exists { field: field.clone() }),
            NodeKind::Missing { field } => Ok(self.missing(field)),
            NodeKind::Nested { path } => Ok(Query::Nested {
                path: path.clone(),
                query: Box::new(self.filter(single_child(node)?)?),
            }),
            other @ (NodeKind::Root
            | NodeKind::Query
            | NodeKind::MustBool
            | NodeKind::ShouldBool
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
            | NodeKind::GlobalAggregation { .. }) => Err(unexpected(other, "filters")),
        }
    }

    fn missing(&self, field: &str) -> Query {
        let mut excluded = vec![Query::Exists {
            field: field.to_string(),
        }];
        // genes without donors carry a placeholder donor that must not match
        if self.context.doc_type() == DocType::GeneCentric && field.starts_with("donor.") {
            excluded.push(Query::Term {
                field: PLACEHOLDER_FIELD.to_string(),
                value: Value::Boolean(true),
            });
        }
        Query::must_not(excluded)
    }

    fn aggregation(&self, node: &ExpressionNode) -> Result<Aggregation> {
        let (name, kind) = match &node.kind {
            NodeKind::TermsAggregation { name, field } => (
                name,
                AggregationKind::Terms {
                    field: field.clone(),
                    size: self.terms_size,
                },
            ),
            NodeKind::MissingAggregation { name, field } => (name, AggregationKind::Missing { field: field.clone() }),
            NodeKind::FilterAggregation { name, filter } => {
                if filter.children.is_empty() {
                    return Err(CompileError::internal(format!("Filter aggregation {name} has an empty filter")));
                }
                (name, AggregationKind::Filter(self.filter(filter)?))
            }
            NodeKind::NestedAggregation { name, path } => (name, AggregationKind::Nested { path: path.clone() }),
            NodeKind::ReverseNestedAggregation { name } => (name, AggregationKind::ReverseNested),
            NodeKind::GlobalAggregation { name } => (name, AggregationKind::Global),
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
            | NodeKind::Aggregations) => return Err(unexpected(other, "aggregations")),
        };

        let aggregations = node
            .children
            .iter()
            .map(|child| self.aggregation(child))
            .collect::<Result<_>>()?;
        Ok(Aggregation {
            name: name.clone(),
            kind,
            aggregations,
        })
    }

    /// Donor-centric documents embed the project, so project sort keys are
    /// qualified with the type name to reach the donor's own copy.
    fn sorts(&self, keys: &[(String, Order)]) -> Vec<Sort> {
        let doc_type = self.context.doc_type();
        keys.iter()
            .map(|(field, order)| {
                let field = if doc_type == DocType::DonorCentric && field.starts_with("project.") {
                    format!("{}.{field}", doc_type.id())
                } else {
                    field.clone()
                };
                Sort { field, order: *order }
            })
            .collect()
    }
}

fn single_child(node: &ExpressionNode) -> Result<&ExpressionNode> {
    match node.children.as_slice() {
        [child] => Ok(child),
        children => Err(CompileError::internal(format!(
            "{} node must have exactly one child, found {}",
            node.tag(),
            children.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(root: ExpressionNode, doc_type: DocType) -> Result<SearchRequest> {
        let context = QueryContext::new("icgc-release", doc_type);
        RequestBuilder::new(&context, 1000).build(&root)
    }

    #[test]
    fn test_filtered_query() {
        let root = ExpressionNode::root(vec![ExpressionNode::query(ExpressionNode::filter(
            ExpressionNode::term("donor_sex", "female"),
        ))]);
        let request = build(root, DocType::DonorCentric).unwrap();
        assert_eq!(
            request.to_json(),
            json!({"query": {"filtered": {
                "query": {"match_all": {}},
                "filter": {"term": {"donor_sex": "female"}}
            }}})
        );
    }

    #[test]
    fn test_gene_centric_missing_donor_excludes_placeholder() {
        let root = ExpressionNode::root(vec![ExpressionNode::query(ExpressionNode::filter(
            ExpressionNode::missing("donor.donor_sex"),
        ))]);
        let request = build(root, DocType::GeneCentric).unwrap();
        let Some(Query::Filtered(filter)) = request.query else {
            panic!("expected a filtered query");
        };
        assert_eq!(
            filter.to_json(),
            json!({"bool": {"must_not": [
                {"exists": {"field": "donor.donor_sex"}},
                {"term": {"placeholder": true}}
            ]}})
        );
    }

    #[test]
    fn test_bool_with_foreign_clause_is_internal() {
        let bad = ExpressionNode::new(NodeKind::Bool, vec![ExpressionNode::term("a", "x")]);
        let root = ExpressionNode::root(vec![ExpressionNode::query(ExpressionNode::filter(bad))]);
        let err = build(root, DocType::DonorCentric).unwrap_err();
        assert!(!err.is_bad_query());
    }

    #[test]
    fn test_donor_centric_project_sort_is_qualified() {
        let root = ExpressionNode::root(vec![ExpressionNode::leaf(NodeKind::Sort(vec![
            ("project.primary_site".to_string(), Order::Asc),
            ("_score".to_string(), Order::Desc),
        ]))]);
        let request = build(root, DocType::DonorCentric).unwrap();
        assert_eq!(request.sort[0].field, "donor-centric.project.primary_site");
        assert_eq!(request.sort[1].field, "_score");
    }

    #[test]
    fn test_count_endpoint() {
        let root = ExpressionNode::root(vec![ExpressionNode::leaf(NodeKind::Count)]);
        let request = build(root, DocType::MutationCentric).unwrap();
        assert!(request.count_only);
        assert_eq!(request.endpoint(), "/icgc-release/mutation-centric/_search?search_type=count");
    }
}
