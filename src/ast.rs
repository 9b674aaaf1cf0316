//! # PQL - Abstract Syntax Tree
//!
//! PQL is the query language of the portal: a comma separated list of
//! function-style items that together describe one search.
//!
//! ## Module Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[value]** - Literal values (strings, integers, exact decimals, booleans)
//! - **[filters]** - Filter predicates (`eq`, `in`, `nested`, `and`, ...)
//! - **[statement]** - The complete statement: projections, facets, count,
//!   filters, sort and limit
//!
//! ## Quick Start
//!
//! ```text
//! select(*),facets(gender),eq(donor.primarySite,'Brain'),limit(10)
//! ```
//!
//! Returns the first ten brain donors with all default fields and the gender
//! facet.
//!
//! ## Items
//!
//! - **select** `select(*)` or `select(a,b)` - fields to return
//! - **facets** `facets(*)` or `facets(a,b)` - term aggregations to compute
//! - **count** `count()` - only the number of hits
//! - **sort** `sort(a,-b)` - `-` descending, bare or `+` ascending
//! - **limit** `limit(size)` or `limit(from,size)`
//! - any filter predicate; several top-level predicates are AND-ed
//!
//! ## Filters
//!
//! ```text
//! eq(f,v) ne(f,v) gt(f,v) ge(f,v) lt(f,v) le(f,v)
//! in(f,v1,v2,...) exists(f) missing(f)
//! and(p,...) or(p,...) not(p) nested(path,p,...)
//! ```
//!
//! Field names are aliases of the active type model (`donor.gender`,
//! `gene.pathwayId`, `mutation.location`); the compiler resolves them to
//! document paths.
pub mod filters;
pub mod statement;
pub mod tokens;
pub mod value;

pub use filters::{CompareOp, Filter};
pub use statement::{Limit, Order, Projection, SortKey, Statement};
pub use tokens::Token;
pub use value::Value;
