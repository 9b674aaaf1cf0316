//! The expression tree every compilation pass rewrites.
//!
//! A tree is born from a lowered PQL statement:
//!
//! ```text
//! Root
//!   Fields [_donor_id, donor_sex]
//!   Query
//!     Filter
//!       Bool
//!         MustBool
//!           Term donor_sex = 'female'
//!           Nested gene
//!             Terms gene._gene_id ['G1', 'G2']
//!   Aggregations
//!     TermsAggregation gender (donor_sex)
//! ```
//!
//! Nodes own their children. Passes consume a tree and return a new one; a
//! pass that drops a node returns `None` for it. Subtrees used in more than
//! one place are cloned.

use crate::ast::{Order, Value};
use std::fmt;

/// Reference to a stored id list, resolved by the search engine at query
/// time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermsLookup {
    pub index: String,
    pub doc_type: String,
    pub id: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Root,
    Query,
    /// Filter context; exactly one child
    Filter,
    /// Exactly one `MustBool` or `ShouldBool` child
    Bool,
    MustBool,
    ShouldBool,
    /// Exactly one child
    Not,
    Term {
        field: String,
        value: Value,
        lookup: Option<TermsLookup>,
    },
    /// Values are `Terminal` children
    Terms {
        field: String,
    },
    /// Bounds are the children
    Range {
        field: String,
    },
    GreaterThan(Value),
    GreaterEqual(Value),
    LessThan(Value),
    LessEqual(Value),
    Exists {
        field: String,
    },
    Missing {
        field: String,
    },
    /// Exactly one child evaluated inside the nested documents at `path`
    Nested {
        path: String,
    },
    Terminal(Value),
    Fields(Vec<String>),
    Source(Vec<String>),
    Sort(Vec<(String, Order)>),
    Limit {
        from: u32,
        size: u32,
    },
    Count,
    Aggregations,
    TermsAggregation {
        name: String,
        field: String,
    },
    MissingAggregation {
        name: String,
        field: String,
    },
    /// `filter` is a `Filter` node; its condition scopes the children
    FilterAggregation {
        name: String,
        filter: Box<ExpressionNode>,
    },
    NestedAggregation {
        name: String,
        path: String,
    },
    ReverseNestedAggregation {
        name: String,
    },
    GlobalAggregation {
        name: String,
    },
}

impl NodeKind {
    /// Tag name, for logging and error messages.
    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::Root => "Root",
            NodeKind::Query => "Query",
            NodeKind::Filter => "Filter",
            NodeKind::Bool => "Bool",
            NodeKind::MustBool => "MustBool",
            NodeKind::ShouldBool => "ShouldBool",
            NodeKind::Not => "Not",
            NodeKind::Term { .. } => "Term",
            NodeKind::Terms { .. } => "Terms",
            NodeKind::Range { .. } => "Range",
            NodeKind::GreaterThan(_) => "GreaterThan",
            NodeKind::GreaterEqual(_) => "GreaterEqual",
            NodeKind::LessThan(_) => "LessThan",
            NodeKind::LessEqual(_) => "LessEqual",
            NodeKind::Exists { .. } => "Exists",
            NodeKind::Missing { .. } => "Missing",
            NodeKind::Nested { .. } => "Nested",
            NodeKind::Terminal(_) => "Terminal",
            NodeKind::Fields(_) => "Fields",
            NodeKind::Source(_) => "Source",
            NodeKind::Sort(_) => "Sort",
            NodeKind::Limit { .. } => "Limit",
            NodeKind::Count => "Count",
            NodeKind::Aggregations => "Aggregations",
            NodeKind::TermsAggregation { .. } => "TermsAggregation",
            NodeKind::MissingAggregation { .. } => "MissingAggregation",
            NodeKind::FilterAggregation { .. } => "FilterAggregation",
            NodeKind::NestedAggregation { .. } => "NestedAggregation",
            NodeKind::ReverseNestedAggregation { .. } => "ReverseNestedAggregation",
            NodeKind::GlobalAggregation { .. } => "GlobalAggregation",
        }
    }

    /// Name of an aggregation node.
    pub fn aggregation_name(&self) -> Option<&str> {
        match self {
            NodeKind::TermsAggregation { name, .. }
            | NodeKind::MissingAggregation { name, .. }
            | NodeKind::FilterAggregation { name, .. }
            | NodeKind::NestedAggregation { name, .. }
            | NodeKind::ReverseNestedAggregation { name }
            | NodeKind::GlobalAggregation { name } => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionNode {
    pub kind: NodeKind,
    pub children: Vec<ExpressionNode>,
}

impl ExpressionNode {
    pub fn new(kind: NodeKind, children: Vec<ExpressionNode>) -> Self {
        ExpressionNode { kind, children }
    }

    pub fn leaf(kind: NodeKind) -> Self {
        ExpressionNode::new(kind, Vec::new())
    }

    pub fn root(children: Vec<ExpressionNode>) -> Self {
        ExpressionNode::new(NodeKind::Root, children)
    }

    pub fn query(child: ExpressionNode) -> Self {
        ExpressionNode::new(NodeKind::Query, vec![child])
    }

    pub fn filter(child: ExpressionNode) -> Self {
        ExpressionNode::new(NodeKind::Filter, vec![child])
    }

    /// `Bool(MustBool(children))`
    pub fn must(children: Vec<ExpressionNode>) -> Self {
        ExpressionNode::new(
            NodeKind::Bool,
            vec![ExpressionNode::new(NodeKind::MustBool, children)],
        )
    }

    /// `Bool(ShouldBool(children))`
    pub fn should(children: Vec<ExpressionNode>) -> Self {
        ExpressionNode::new(
            NodeKind::Bool,
            vec![ExpressionNode::new(NodeKind::ShouldBool, children)],
        )
    }

    pub fn not(child: ExpressionNode) -> Self {
        ExpressionNode::new(NodeKind::Not, vec![child])
    }

    pub fn term(field: impl Into<String>, value: impl Into<Value>) -> Self {
        ExpressionNode::leaf(NodeKind::Term {
            field: field.into(),
            value: value.into(),
            lookup: None,
        })
    }

    pub fn terms(field: impl Into<String>, values: impl IntoIterator<Item = Value>) -> Self {
        ExpressionNode::new(
            NodeKind::Terms { field: field.into() },
            values
                .into_iter()
                .map(|v| ExpressionNode::leaf(NodeKind::Terminal(v)))
                .collect(),
        )
    }

    pub fn range(field: impl Into<String>, bound: NodeKind) -> Self {
        ExpressionNode::new(
            NodeKind::Range { field: field.into() },
            vec![ExpressionNode::leaf(bound)],
        )
    }

    pub fn exists(field: impl Into<String>) -> Self {
        ExpressionNode::leaf(NodeKind::Exists { field: field.into() })
    }

    pub fn missing(field: impl Into<String>) -> Self {
        ExpressionNode::leaf(NodeKind::Missing { field: field.into() })
    }

    pub fn nested(path: impl Into<String>, child: ExpressionNode) -> Self {
        ExpressionNode::new(NodeKind::Nested { path: path.into() }, vec![child])
    }

    pub fn aggregations(children: Vec<ExpressionNode>) -> Self {
        ExpressionNode::new(NodeKind::Aggregations, children)
    }

    pub fn terms_aggregation(name: impl Into<String>, field: impl Into<String>) -> Self {
        ExpressionNode::leaf(NodeKind::TermsAggregation {
            name: name.into(),
            field: field.into(),
        })
    }

    pub fn missing_aggregation(name: impl Into<String>, field: impl Into<String>) -> Self {
        ExpressionNode::leaf(NodeKind::MissingAggregation {
            name: name.into(),
            field: field.into(),
        })
    }

    /// `filter` is wrapped in a `Filter` node unless it already is one.
    pub fn filter_aggregation(name: impl Into<String>, filter: ExpressionNode, child: ExpressionNode) -> Self {
        let filter = match filter.kind {
            NodeKind::Filter => filter,
            _ => ExpressionNode::filter(filter),
        };
        ExpressionNode::new(
            NodeKind::FilterAggregation {
                name: name.into(),
                filter: Box::new(filter),
            },
            vec![child],
        )
    }

    pub fn nested_aggregation(name: impl Into<String>, path: impl Into<String>) -> Self {
        ExpressionNode::leaf(NodeKind::NestedAggregation {
            name: name.into(),
            path: path.into(),
        })
    }

    pub fn with_child(mut self, child: ExpressionNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn tag(&self) -> &'static str {
        self.kind.tag()
    }

    /// Field of a leaf filter (`Term`, `Terms`, `Range`, `Exists`, `Missing`).
    pub fn field(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Term { field, .. }
            | NodeKind::Terms { field }
            | NodeKind::Range { field }
            | NodeKind::Exists { field }
            | NodeKind::Missing { field } => Some(field),
            _ => None,
        }
    }

    pub fn is_leaf_filter(&self) -> bool {
        self.field().is_some()
    }

    pub fn first_child(&self) -> Option<&ExpressionNode> {
        self.children.first()
    }

    pub fn find_child(&self, matches: impl Fn(&NodeKind) -> bool) -> Option<&ExpressionNode> {
        self.children.iter().find(|child| matches(&child.kind))
    }

    pub fn has_child(&self, matches: impl Fn(&NodeKind) -> bool) -> bool {
        self.find_child(matches).is_some()
    }

    /// `Root -> Query -> Filter`, if the tree has a filter.
    pub fn query_filter(&self) -> Option<&ExpressionNode> {
        self.find_child(|k| matches!(k, NodeKind::Query))?
            .find_child(|k| matches!(k, NodeKind::Filter))
    }

    /// Values of a `Terms` node's `Terminal` children.
    pub fn terminal_values(&self) -> Vec<&Value> {
        self.children
            .iter()
            .filter_map(|child| match &child.kind {
                NodeKind::Terminal(value) => Some(value),
                _ => None,
            })
            .collect()
    }

    /// Rebuild the node, sending every child through `rewrite`. Children
    /// the closure maps to `None` are dropped.
    pub fn map_children<E>(
        self,
        mut rewrite: impl FnMut(ExpressionNode) -> Result<Option<ExpressionNode>, E>,
    ) -> Result<ExpressionNode, E> {
        let mut children = Vec::with_capacity(self.children.len());
        for child in self.children {
            if let Some(child) = rewrite(child)? {
                children.push(child);
            }
        }
        Ok(ExpressionNode::new(self.kind, children))
    }

    /// The node and all its descendants, breadth first. Embedded
    /// `FilterAggregation` filters are not visited.
    pub fn descendants(&self) -> Vec<&ExpressionNode> {
        let mut out = vec![self];
        let mut i = 0;
        while i < out.len() {
            let node = out[i];
            out.extend(node.children.iter());
            i += 1;
        }
        out
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(f, "{:indent$}", "", indent = depth * 2)?;
        match &self.kind {
            NodeKind::Term { field, value, lookup } => {
                write!(f, "Term {field} = {value}")?;
                if let Some(lookup) = lookup {
                    write!(
                        f,
                        " (lookup {}/{}/{}.{})",
                        lookup.index, lookup.doc_type, lookup.id, lookup.path
                    )?;
                }
            }
            NodeKind::Terms { field } => {
                let values: Vec<String> = self.terminal_values().iter().map(|v| v.to_string()).collect();
                write!(f, "Terms {field} [{}]", values.join(", "))?;
                return writeln!(f);
            }
            NodeKind::Range { field } => write!(f, "Range {field}")?,
            NodeKind::GreaterThan(v) => write!(f, "GreaterThan {v}")?,
            NodeKind::GreaterEqual(v) => write!(f, "GreaterEqual {v}")?,
            NodeKind::LessThan(v) => write!(f, "LessThan {v}")?,
            NodeKind::LessEqual(v) => write!(f, "LessEqual {v}")?,
            NodeKind::Exists { field } => write!(f, "Exists {field}")?,
            NodeKind::Missing { field } => write!(f, "Missing {field}")?,
            NodeKind::Nested { path } => write!(f, "Nested {path}")?,
            NodeKind::Terminal(v) => write!(f, "Terminal {v}")?,
            NodeKind::Fields(fields) => write!(f, "Fields [{}]", fields.join(", "))?,
            NodeKind::Source(fields) => write!(f, "Source [{}]", fields.join(", "))?,
            NodeKind::Sort(keys) => {
                let keys: Vec<String> = keys.iter().map(|(k, o)| format!("{k} {}", o.as_str())).collect();
                write!(f, "Sort [{}]", keys.join(", "))?
            }
            NodeKind::Limit { from, size } => write!(f, "Limit {from}, {size}")?,
            NodeKind::TermsAggregation { name, field } => write!(f, "TermsAggregation {name} ({field})")?,
            NodeKind::MissingAggregation { name, field } => write!(f, "MissingAggregation {name} ({field})")?,
            NodeKind::FilterAggregation { name, filter } => {
                writeln!(f, "FilterAggregation {name}")?;
                filter.write_indented(f, depth + 2)?;
                for child in &self.children {
                    child.write_indented(f, depth + 1)?;
                }
                return Ok(());
            }
            NodeKind::NestedAggregation { name, path } => write!(f, "NestedAggregation {name} ({path})")?,
            NodeKind::ReverseNestedAggregation { name } => write!(f, "ReverseNestedAggregation {name}")?,
            NodeKind::GlobalAggregation { name } => write!(f, "GlobalAggregation {name}")?,
            NodeKind::Root
            | NodeKind::Query
            | NodeKind::Filter
            | NodeKind::Bool
            | NodeKind::MustBool
            | NodeKind::ShouldBool
            | NodeKind::Not
            | NodeKind::Count
            | NodeKind::Aggregations => f.write_str(self.tag())?,
        }
        writeln!(f)?;
        for child in &self.children {
            child.write_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for ExpressionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_filter() {
        let root = ExpressionNode::root(vec![ExpressionNode::query(ExpressionNode::filter(
            ExpressionNode::exists("a"),
        ))]);
        let filter = root.query_filter().unwrap();
        assert_eq!(filter.first_child().and_then(|c| c.field()), Some("a"));
    }

    #[test]
    fn test_display_indents_children() {
        let node = ExpressionNode::must(vec![ExpressionNode::term("a", "x")]);
        assert_eq!(node.to_string(), "Bool\n  MustBool\n    Term a = 'x'\n");
    }

    #[test]
    fn test_filter_aggregation_wraps_filter() {
        let agg = ExpressionNode::filter_aggregation(
            "gender",
            ExpressionNode::exists("a"),
            ExpressionNode::terms_aggregation("gender", "donor_sex"),
        );
        match agg.kind {
            NodeKind::FilterAggregation { filter, .. } => assert_eq!(filter.tag(), "Filter"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
