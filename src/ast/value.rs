use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::fmt;

/// A literal written in a PQL predicate.
///
/// Decimals keep the exact text the user wrote (`1.50` stays `1.50`), so a
/// statement renders back to the same PQL it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// Quoted literal, quotes stripped
    ///
    /// # Examples
    /// ```text
    /// 'TCGA-BRCA'
    /// "chr12:123-456"
    /// ```
    String(String),

    /// Whole number
    Integer(i64),

    /// Number with a fractional part
    ///
    /// # Examples
    /// ```text
    /// 0.25
    /// -1.5
    /// ```
    Decimal(Decimal),

    /// `true` / `false`
    Boolean(bool),
}

impl Value {
    pub fn string(value: impl Into<String>) -> Self {
        Value::String(value.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::Decimal(d) if d.fract().is_zero() => d.to_i64(),
            _ => None,
        }
    }

    /// JSON representation used in the native request DSL.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Integer(n) => serde_json::Value::from(*n),
            Value::Decimal(d) => d
                .to_f64()
                .and_then(serde_json::Number::from_f64)
                .map(serde_json::Value::Number)
                .unwrap_or_else(|| serde_json::Value::String(d.to_string())),
            Value::Boolean(b) => serde_json::Value::Bool(*b),
        }
    }

    /// Build a literal from a JSON scalar. Objects, arrays and null have no
    /// PQL counterpart.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Some(Value::String(s.clone())),
            serde_json::Value::Bool(b) => Some(Value::Boolean(*b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Value::Integer(i)),
                None => n
                    .as_f64()
                    .and_then(Decimal::from_f64_retain)
                    .map(|d| Value::Decimal(d.normalize())),
            },
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl fmt::Display for Value {
    /// PQL literal form: strings single-quoted with `'` and `\` escaped.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => {
                f.write_str("'")?;
                for ch in s.chars() {
                    match ch {
                        '\'' => f.write_str("\\'")?,
                        '\\' => f.write_str("\\\\")?,
                        c => write!(f, "{c}")?,
                    }
                }
                f.write_str("'")
            }
            Value::Integer(n) => write!(f, "{n}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::Boolean(b) => write!(f, "{b}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_string_display_escapes_quotes() {
        assert_eq!(Value::string("it's").to_string(), r"'it\'s'");
    }

    #[test]
    fn test_decimal_keeps_scale() {
        let value = Value::Decimal(Decimal::from_str("1.50").unwrap());
        assert_eq!(value.to_string(), "1.50");
    }

    #[test]
    fn test_json_scalars() {
        assert_eq!(
            Value::from_json(&serde_json::json!(3)),
            Some(Value::Integer(3))
        );
        assert_eq!(Value::from_json(&serde_json::json!(null)), None);
        assert_eq!(Value::Integer(7).to_json(), serde_json::json!(7));
    }
}
