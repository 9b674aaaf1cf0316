use super::Filter;
use std::fmt;

/// Argument of `select(...)` or `facets(...)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// `*`
    All,
    /// Explicit, non-empty list of aliases
    Fields(Vec<String>),
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Projection::All => f.write_str("*"),
            Projection::Fields(fields) => f.write_str(&fields.join(",")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    pub fn as_str(self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub order: Order,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        SortKey {
            field: field.into(),
            order: Order::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        SortKey {
            field: field.into(),
            order: Order::Desc,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.order {
            Order::Asc => write!(f, "{}", self.field),
            Order::Desc => write!(f, "-{}", self.field),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    pub from: u32,
    pub size: u32,
}

/// A parsed PQL statement.
///
/// Items are stored by kind, so rendering always produces the canonical
/// order: select, facets, count, filters, sort, limit.
///
/// # Examples
/// ```text
/// select(*),facets(gender),eq(donor.primarySite,'Brain'),sort(-donor.id),limit(0,10)
/// count(),in(mutation.type,'insertion of <=200bp')
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    pub select: Vec<Projection>,
    pub facets: Vec<Projection>,
    pub count: bool,
    pub filter: Option<Filter>,
    pub sort: Vec<SortKey>,
    pub limit: Option<Limit>,
}

impl Statement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// AND another predicate into the statement's filter.
    pub fn add_filter(&mut self, filter: Filter) {
        self.filter = match self.filter.take() {
            None => Some(filter),
            Some(Filter::And(mut children)) => {
                children.push(filter);
                Some(Filter::And(children))
            }
            Some(existing) => Some(Filter::And(vec![existing, filter])),
        };
    }

    pub fn is_count(&self) -> bool {
        self.count
    }

    pub fn has_facets(&self) -> bool {
        !self.facets.is_empty()
    }

    /// Canonical PQL text.
    pub fn to_pql(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut items: Vec<String> = Vec::new();
        items.extend(self.select.iter().map(|p| format!("select({p})")));
        items.extend(self.facets.iter().map(|p| format!("facets({p})")));
        if self.count {
            items.push("count()".to_string());
        }
        if let Some(filter) = &self.filter {
            items.push(filter.to_string());
        }
        if !self.sort.is_empty() {
            let keys: Vec<String> = self.sort.iter().map(ToString::to_string).collect();
            items.push(format!("sort({})", keys.join(",")));
        }
        if let Some(limit) = self.limit {
            items.push(format!("limit({},{})", limit.from, limit.size));
        }
        f.write_str(&items.join(","))
    }
}
