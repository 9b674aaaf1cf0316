use crate::parser::ParseError;
use thiserror::Error;

/// Result type for every compilation stage.
pub type Result<T> = std::result::Result<T, CompileError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    /// The PQL text could not be parsed
    #[error("Invalid PQL: {0}")]
    Parse(#[from] ParseError),

    /// The query is well formed but cannot be compiled for the requested
    /// type (unknown field, malformed location, bad filter JSON, ...)
    #[error("Bad query: {0}")]
    BadQuery(String),

    /// A pass met a tree it should never have been handed
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CompileError {
    pub fn bad_query(message: impl Into<String>) -> Self {
        CompileError::BadQuery(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CompileError::Internal(message.into())
    }

    /// True for errors caused by the caller's input.
    pub fn is_bad_query(&self) -> bool {
        matches!(self, CompileError::Parse(_) | CompileError::BadQuery(_))
    }
}
