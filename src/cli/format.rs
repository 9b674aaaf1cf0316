//! Canonical PQL formatting

use super::CliError;
use crate::error::CompileError;
use crate::parser::parse;

/// Parse `pql` and print it back in canonical form.
pub fn format_pql(pql: &str) -> Result<String, CliError> {
    let statement = parse(pql).map_err(CompileError::from)?;
    Ok(statement.to_pql())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_is_stable() {
        let formatted = format_pql("select(*),select(a),facets(*),facets(b)").unwrap();
        assert_eq!(format_pql(&formatted).unwrap(), formatted);
    }
}
