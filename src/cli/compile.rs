//! Compile PQL into a search request

use super::{CliError, to_json_string};
use crate::engine::QueryEngine;
use crate::meta::DocType;
use crate::parser::parse;
use serde_json::json;

/// Options for the compile command
#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub pql: String,
    pub doc_type: DocType,
    /// Pretty-print the output
    pub pretty: bool,
    /// Print the resolved expression tree instead of the request
    pub tree: bool,
}

/// Compile `options.pql` and render the request as
/// `{"endpoint": ..., "body": ...}`, or the expression tree when asked.
pub fn execute_compile(engine: &QueryEngine, options: &CompileOptions) -> Result<String, CliError> {
    if options.tree {
        let statement = parse(&options.pql).map_err(crate::CompileError::from)?;
        let tree = engine.compile_tree(&statement, options.doc_type)?;
        return Ok(tree.to_string());
    }

    let request = engine.compile(&options.pql, options.doc_type)?;
    let output = json!({
        "endpoint": request.endpoint(),
        "body": request.to_json(),
    });
    to_json_string(&output, options.pretty)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(pql: &str) -> CompileOptions {
        CompileOptions {
            pql: pql.to_string(),
            doc_type: DocType::DonorCentric,
            pretty: false,
            tree: false,
        }
    }

    #[test]
    fn test_compile_renders_endpoint_and_body() {
        let output = execute_compile(&QueryEngine::default(), &options("count(),eq(gender,'male')")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["endpoint"], "/icgc-release/donor-centric/_search?search_type=count");
        assert!(json["body"]["query"]["filtered"].is_object());
    }

    #[test]
    fn test_compile_tree() {
        let mut options = options("eq(gender,'male')");
        options.tree = true;
        let output = execute_compile(&QueryEngine::default(), &options).unwrap();
        assert!(output.contains("Root"));
    }

    #[test]
    fn test_compile_bad_query() {
        let err = execute_compile(&QueryEngine::default(), &options("eq(")).unwrap_err();
        assert!(matches!(err, CliError::Compile(e) if e.is_bad_query()));
    }
}
