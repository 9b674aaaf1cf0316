use super::Value;
use std::fmt;

/// Comparison predicates taking a field and a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "eq" => Some(CompareOp::Eq),
            "ne" => Some(CompareOp::Ne),
            "gt" => Some(CompareOp::Gt),
            "ge" => Some(CompareOp::Ge),
            "lt" => Some(CompareOp::Lt),
            "le" => Some(CompareOp::Le),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CompareOp::Eq => "eq",
            CompareOp::Ne => "ne",
            CompareOp::Gt => "gt",
            CompareOp::Ge => "ge",
            CompareOp::Lt => "lt",
            CompareOp::Le => "le",
        }
    }
}

/// A PQL filter predicate.
///
/// # Examples
/// ```text
/// eq(donor.gender,'female')
/// in(mutation.type,'single base substitution','insertion of <=200bp')
/// nested(gene,exists(gene.pathwayId))
/// and(ge(donor.ageAtDiagnosis,40),not(missing(donor.vitalStatus)))
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Compare {
        op: CompareOp,
        field: String,
        value: Value,
    },
    In {
        field: String,
        values: Vec<Value>,
    },
    Exists(String),
    Missing(String),
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    /// `nested(path, f...)`; the children are implicitly AND-ed
    Nested {
        path: String,
        filters: Vec<Filter>,
    },
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Compare {
            op: CompareOp::Eq,
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_in<V: Into<Value>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Filter::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn not(filter: Filter) -> Self {
        Filter::Not(Box::new(filter))
    }

    /// AND a list of filters, avoiding a wrapper around a single one.
    pub fn all(mut filters: Vec<Filter>) -> Option<Self> {
        match filters.len() {
            0 => None,
            1 => filters.pop(),
            _ => Some(Filter::And(filters)),
        }
    }

    /// Every field referenced by the predicate, depth first.
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Filter::Compare { field, .. } | Filter::In { field, .. } => out.push(field),
            Filter::Exists(field) | Filter::Missing(field) => out.push(field),
            Filter::And(children) | Filter::Or(children) => {
                children.iter().for_each(|c| c.collect_fields(out))
            }
            Filter::Not(inner) => inner.collect_fields(out),
            Filter::Nested { filters, .. } => filters.iter().for_each(|c| c.collect_fields(out)),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, filters: &[Filter]) -> fmt::Result {
    for (i, filter) in filters.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{filter}")?;
    }
    Ok(())
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Compare { op, field, value } => write!(f, "{}({},{})", op.name(), field, value),
            Filter::In { field, values } => {
                write!(f, "in({field}")?;
                for value in values {
                    write!(f, ",{value}")?;
                }
                f.write_str(")")
            }
            Filter::Exists(field) => write!(f, "exists({field})"),
            Filter::Missing(field) => write!(f, "missing({field})"),
            Filter::And(children) => {
                f.write_str("and(")?;
                write_list(f, children)?;
                f.write_str(")")
            }
            Filter::Or(children) => {
                f.write_str("or(")?;
                write_list(f, children)?;
                f.write_str(")")
            }
            Filter::Not(inner) => write!(f, "not({inner})"),
            Filter::Nested { path, filters } => {
                write!(f, "nested({path},")?;
                write_list(f, filters)?;
                f.write_str(")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_nested() {
        let filter = Filter::Nested {
            path: "gene".into(),
            filters: vec![Filter::Exists("gene.pathwayId".into()), Filter::eq("gene.id", "G1")],
        };
        assert_eq!(filter.to_string(), "nested(gene,exists(gene.pathwayId),eq(gene.id,'G1'))");
    }

    #[test]
    fn test_fields_depth_first() {
        let filter = Filter::And(vec![
            Filter::not(Filter::Missing("a".into())),
            Filter::is_in("b", ["x", "y"]),
        ]);
        assert_eq!(filter.fields(), vec!["a", "b"]);
    }
}
