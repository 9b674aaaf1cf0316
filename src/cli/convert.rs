//! Portal JSON filters to PQL

use super::CliError;
use crate::convert::filters_to_pql;
use crate::meta::DocType;

pub fn execute_convert(filters: &str, doc_type: DocType) -> Result<String, CliError> {
    Ok(filters_to_pql(filters, doc_type)?)
}
