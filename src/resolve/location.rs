use super::{map_query, unexpected};
use crate::ast::Value;
use crate::error::{CompileError, Result};
use crate::meta::{DocType, GENE_LOCATION, MUTATION_LOCATION, TypeModel, is_path_under};
use crate::tree::{ExpressionNode, NodeKind};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::debug;

static LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:chr)?(1[0-9]|2[0-2]|[1-9]|X|Y|MT)(?::(\d+)(?:-(\d+))?)?$")
        .expect("location pattern is valid")
});

/// A chromosome, optionally narrowed to a position or a closed range:
/// `chr12`, `chr12:1000`, `chr12:1000-2000`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChromosomeLocation {
    pub chromosome: String,
    pub start: Option<u64>,
    pub end: Option<u64>,
}

impl ChromosomeLocation {
    pub fn parse(location: &str) -> Result<Self> {
        let invalid = || CompileError::bad_query(format!("'{location}' is not a valid chromosome location"));

        let captures = LOCATION.captures(location.trim()).ok_or_else(invalid)?;
        let position = |i: usize| -> Result<Option<u64>> {
            captures
                .get(i)
                .map(|m| m.as_str().parse::<u64>().map_err(|_| invalid()))
                .transpose()
        };

        let chromosome = captures[1].to_ascii_uppercase();
        let start = position(2)?;
        let end = position(3)?;
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(CompileError::bad_query(format!(
                    "Start position {start} of '{location}' is after its end {end}"
                )));
            }
        }
        Ok(ChromosomeLocation { chromosome, start, end })
    }
}

impl FromStr for ChromosomeLocation {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self> {
        ChromosomeLocation::parse(s)
    }
}

impl fmt::Display for ChromosomeLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chr{}", self.chromosome)?;
        match (self.start, self.end) {
            (Some(start), Some(end)) => write!(f, ":{start}-{end}"),
            (Some(start), None) => write!(f, ":{start}"),
            _ => Ok(()),
        }
    }
}

/// Chromosome, start and end aliases of a location field.
struct LocationFields {
    chromosome: &'static str,
    start: &'static str,
    end: &'static str,
}

fn location_fields(field: &str) -> LocationFields {
    if field.starts_with("gene") {
        LocationFields {
            chromosome: "gene.chromosome",
            start: "gene.start",
            end: "gene.end",
        }
    } else {
        LocationFields {
            chromosome: "mutation.chromosome",
            start: "mutation.start",
            end: "mutation.end",
        }
    }
}

fn is_location_field(field: &str) -> bool {
    field == GENE_LOCATION || field == MUTATION_LOCATION
}

/// Rewrite `gene.location` and `mutation.location` filters into chromosome
/// and coordinate range filters.
pub(super) fn resolve(root: ExpressionNode, model: &TypeModel) -> Result<ExpressionNode> {
    map_query(root, |query| rewrite(query, model, None))
}

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
        NodeKind::Term { field, value, .. } if is_location_field(&field) => {
            let result = expand(&field, &value, model)?;
            nest(&field, result, model, enclosing)
        }
        NodeKind::Terms { field } if is_location_field(&field) => {
            let should = children
                .iter()
                .map(|child| match &child.kind {
                    NodeKind::Terminal(value) => expand(&field, value, model),
                    other => Err(unexpected(other, "locations")),
                })
                .collect::<Result<Vec<_>>>()?;
            nest(&field, ExpressionNode::should(should), model, enclosing)
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
        | NodeKind::GlobalAggregation { .. }) => Err(unexpected(&other, "locations")),
    }
}

/// One location value as primitive filters, not yet nested.
fn expand(field: &str, value: &Value, model: &TypeModel) -> Result<ExpressionNode> {
    let text = value
        .as_str()
        .ok_or_else(|| CompileError::bad_query(format!("{field} expects a string, got {value}")))?;
    let location = ChromosomeLocation::parse(text)?;
    debug!(field, location = %location, "resolved location");

    let fields = location_fields(field);
    let chromosome = ExpressionNode::term(model.field(fields.chromosome)?, location.chromosome.as_str());
    let bounds = match (location.start, location.end) {
        (Some(start), Some(end)) => Some((model.field(fields.start)?, start, end)),
        // A single position must fall inside the feature, measured on its end
        (Some(position), None) => Some((model.field(fields.end)?, position, position)),
        _ => None,
    };
    let Some((lower_field, lower, upper)) = bounds else {
        return Ok(chromosome);
    };

    Ok(ExpressionNode::must(vec![
        chromosome,
        ExpressionNode::range(lower_field, NodeKind::GreaterEqual(coordinate(lower))),
        ExpressionNode::range(model.field(fields.end)?, NodeKind::LessEqual(coordinate(upper))),
    ]))
}

fn coordinate(position: u64) -> Value {
    Value::Integer(i64::try_from(position).unwrap_or(i64::MAX))
}

/// Wrap a resolved location in the nested path its fields live under,
/// unless an enclosing `Nested` already provides it.
fn nest(field: &str, result: ExpressionNode, model: &TypeModel, enclosing: Option<&str>) -> Result<ExpressionNode> {
    let own_view = match model.doc_type() {
        DocType::GeneCentric => field == GENE_LOCATION,
        DocType::MutationCentric => field == MUTATION_LOCATION,
        DocType::DonorCentric | DocType::ObservationCentric | DocType::Project | DocType::File => false,
    };
    if own_view {
        return Ok(result);
    }

    let Some(path) = model.nested_path(location_fields(field).chromosome)? else {
        return Ok(result);
    };
    match enclosing {
        Some(outer) if outer == path => Ok(result),
        Some(outer) if !is_path_under(path, outer) => Err(CompileError::internal(format!(
            "Location nodes must be nested deeper than the parent nested node. \
             Location nodes nesting level: '{path}'. Parent's nesting level: '{outer}'"
        ))),
        _ => Ok(ExpressionNode::nested(path, result)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range() {
        let location = ChromosomeLocation::parse("chr12:123-456").unwrap();
        assert_eq!(location.chromosome, "12");
        assert_eq!(location.start, Some(123));
        assert_eq!(location.end, Some(456));
        assert_eq!(location.to_string(), "chr12:123-456");
    }

    #[test]
    fn test_parse_chromosome_only() {
        let location: ChromosomeLocation = "chrx".parse().unwrap();
        assert_eq!(location.chromosome, "X");
        assert_eq!(location.start, None);
        assert_eq!(location.end, None);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(ChromosomeLocation::parse("chr23").unwrap_err().is_bad_query());
        assert!(ChromosomeLocation::parse("chr1:abc").unwrap_err().is_bad_query());
        assert!(ChromosomeLocation::parse("chr1:10-5").unwrap_err().is_bad_query());
    }

    #[test]
    fn test_point_uses_end_field() {
        let model = DocType::GeneCentric.type_model();
        let result = expand(GENE_LOCATION, &Value::from("chr1:500"), model).unwrap();
        let must = &result.children[0].children;
        assert_eq!(must[1].field(), Some("end"));
        assert_eq!(must[2].field(), Some("end"));
    }

    #[test]
    fn test_unrelated_enclosing_nested_is_an_error() {
        let model = DocType::DonorCentric.type_model();
        let result = ExpressionNode::term("gene.chromosome", "1");
        let err = nest(GENE_LOCATION, result, model, Some("project")).unwrap_err();
        assert!(!err.is_bad_query());
    }
}
