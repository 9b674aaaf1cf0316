use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Integer
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 0
    /// ```
    Integer(i64),

    /// Number with a fractional part, kept exact
    ///
    /// # Examples
    /// ```text
    /// 3.14
    /// 0.5
    /// ```
    Decimal(Decimal),

    /// String literal enclosed in single or double quotes
    ///
    /// # Examples
    /// ```text
    /// 'TCGA-BRCA'
    /// "chr12:123-456"
    /// ```
    String(String),

    /// Boolean values
    ///
    /// # Examples
    /// ```text
    /// true
    /// false
    /// ```
    Boolean(bool),

    // Identifiers
    /// Function name or field alias
    ///
    /// Starts with a letter or underscore, followed by letters, digits,
    /// underscores or dots. Function names (`select`, `eq`, `nested`, ...)
    /// are plain identifiers; the parser decides by position.
    ///
    /// # Examples
    /// ```text
    /// eq
    /// donor.primarySite
    /// _score
    /// ```
    Identifier(String),

    // Punctuation
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,
    /// `*` in `select(*)` and `facets(*)`
    Star,
    /// `+` ascending sort marker
    Plus,
    /// `-` descending sort marker or numeric sign
    Minus,

    /// End of input
    Eof,
}

impl Token {
    /// Short human readable name used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Integer(n) => format!("integer {n}"),
            Token::Decimal(d) => format!("number {d}"),
            Token::String(s) => format!("string '{s}'"),
            Token::Boolean(b) => format!("boolean {b}"),
            Token::Identifier(name) => format!("identifier '{name}'"),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::Comma => "','".to_string(),
            Token::Star => "'*'".to_string(),
            Token::Plus => "'+'".to_string(),
            Token::Minus => "'-'".to_string(),
            Token::Eof => "end of input".to_string(),
        }
    }
}
