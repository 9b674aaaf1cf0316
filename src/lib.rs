pub mod aggs;
pub mod ast;
pub mod cleanup;
pub mod config;
pub mod context;
pub mod convert;
pub mod engine;
pub mod error;
pub mod lexer;
pub mod lower;
pub mod meta;
pub mod parser;
pub mod request;
pub mod resolve;
pub mod search;
pub mod tree;

#[cfg(feature = "cli")]
pub mod cli;

pub use ast::{Filter, Statement, Token, Value};
pub use config::{ConfigError, EngineConfig};
pub use convert::{PortalFilters, convert_filters, filters_to_pql};
pub use engine::QueryEngine;
pub use error::{CompileError, Result};
pub use lexer::{LexError, Lexer};
pub use meta::{DocType, TypeModel};
pub use parser::{ParseError, Parser, parse};
pub use request::{Aggregation, AggregationKind, Query, SearchRequest};
pub use search::{LocalIndex, SearchResponse};
pub use tree::{ExpressionNode, NodeKind};
