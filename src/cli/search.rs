//! Run PQL against documents on disk

use super::{CliError, to_json_string};
use crate::engine::QueryEngine;
use crate::meta::DocType;
use crate::search::LocalIndex;
use tracing::debug;

/// Options for the search command
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub pql: String,
    pub doc_type: DocType,
    /// JSON array of documents of `doc_type`
    pub documents: String,
    pub pretty: bool,
}

pub fn execute_search(engine: &QueryEngine, options: &SearchOptions) -> Result<String, CliError> {
    let documents = match serde_json::from_str(&options.documents)? {
        serde_json::Value::Array(documents) if documents.iter().all(serde_json::Value::is_object) => documents,
        _ => return Err(CliError::Documents),
    };
    debug!(documents = documents.len(), "loaded documents");

    let request = engine.compile(&options.pql, options.doc_type)?;
    let response = LocalIndex::new(documents).search(&request);
    to_json_string(&response.to_json(), options.pretty)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(documents: &str) -> SearchOptions {
        SearchOptions {
            pql: "count()".to_string(),
            doc_type: DocType::DonorCentric,
            documents: documents.to_string(),
            pretty: false,
        }
    }

    #[test]
    fn test_search_counts_documents() {
        let output = execute_search(&QueryEngine::default(), &options(r#"[{"_donor_id":"DO1"},{"_donor_id":"DO2"}]"#))
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["hits"]["total"], 2);
    }

    #[test]
    fn test_search_rejects_non_array() {
        let err = execute_search(&QueryEngine::default(), &options(r#"{"_donor_id":"DO1"}"#)).unwrap_err();
        assert!(matches!(err, CliError::Documents));
    }
}
