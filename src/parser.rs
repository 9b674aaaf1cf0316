use crate::{
    ast::{CompareOp, Filter, Limit, Projection, SortKey, Statement, Token, Value},
    lexer::{LexError, Lexer},
};
use std::mem;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("{message} at position {position}")]
    Syntax { message: String, position: usize },

    /// Well formed text that does not make a valid statement
    #[error("{0}")]
    Semantic(String),
}

pub struct Parser {
    lexer: Lexer,
    current_token: Token,
    token_position: usize,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, ParseError> {
        let token_position = lexer.position();
        let current_token = lexer.next_token()?;
        Ok(Parser {
            lexer,
            current_token,
            token_position,
        })
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.token_position = self.lexer.position();
        self.current_token = self.lexer.next_token()?;
        Ok(())
    }

    fn syntax_error<T>(&self, message: impl Into<String>) -> Result<T, ParseError> {
        Err(ParseError::Syntax {
            message: message.into(),
            position: self.token_position,
        })
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        if mem::discriminant(&self.current_token) != mem::discriminant(&expected) {
            return self.syntax_error(format!(
                "Expected {}, got {}",
                expected.describe(),
                self.current_token.describe()
            ));
        }
        self.advance()
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(&self.current_token) == mem::discriminant(token)
    }

    /// Consume a comma if present.
    fn eat_comma(&mut self) -> Result<bool, ParseError> {
        if self.check(&Token::Comma) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn parse_identifier(&mut self) -> Result<String, ParseError> {
        match mem::replace(&mut self.current_token, Token::Eof) {
            Token::Identifier(name) => {
                self.advance()?;
                Ok(name)
            }
            other => {
                let message = format!("Expected field name, got {}", other.describe());
                self.current_token = other;
                self.syntax_error(message)
            }
        }
    }

    fn parse_value(&mut self) -> Result<Value, ParseError> {
        match mem::replace(&mut self.current_token, Token::Eof) {
            Token::String(s) => {
                self.advance()?;
                Ok(Value::String(s))
            }
            Token::Integer(n) => {
                self.advance()?;
                Ok(Value::Integer(n))
            }
            Token::Decimal(d) => {
                self.advance()?;
                Ok(Value::Decimal(d))
            }
            Token::Boolean(b) => {
                self.advance()?;
                Ok(Value::Boolean(b))
            }
            // Negative numbers
            Token::Minus => {
                self.advance()?;
                match self.parse_value()? {
                    Value::Integer(n) => Ok(Value::Integer(-n)),
                    Value::Decimal(d) => Ok(Value::Decimal(-d)),
                    other => self.syntax_error(format!("Cannot negate {other}")),
                }
            }
            other => {
                let message = format!("Expected value, got {}", other.describe());
                self.current_token = other;
                self.syntax_error(message)
            }
        }
    }

    fn parse_unsigned(&mut self) -> Result<u32, ParseError> {
        match self.current_token {
            Token::Integer(n) => {
                let Ok(n) = u32::try_from(n) else {
                    return self.syntax_error(format!("Limit argument {n} out of range"));
                };
                self.advance()?;
                Ok(n)
            }
            _ => self.syntax_error(format!(
                "Expected integer, got {}",
                self.current_token.describe()
            )),
        }
    }

    /// `*` or a comma separated alias list, up to (not including) `)`.
    fn parse_projection(&mut self, function: &str) -> Result<Projection, ParseError> {
        if self.check(&Token::Star) {
            self.advance()?;
            return Ok(Projection::All);
        }
        if self.check(&Token::RParen) {
            return Err(ParseError::Semantic(format!(
                "{function}() requires at least one field"
            )));
        }
        let mut fields = vec![self.parse_identifier()?];
        while self.eat_comma()? {
            fields.push(self.parse_identifier()?);
        }
        Ok(Projection::Fields(fields))
    }

    fn parse_sort(&mut self) -> Result<Vec<SortKey>, ParseError> {
        let mut keys = Vec::new();
        loop {
            let descending = match self.current_token {
                Token::Minus => {
                    self.advance()?;
                    true
                }
                Token::Plus => {
                    self.advance()?;
                    false
                }
                _ => false,
            };
            let field = self.parse_identifier()?;
            keys.push(if descending { SortKey::desc(field) } else { SortKey::asc(field) });
            if !self.eat_comma()? {
                return Ok(keys);
            }
        }
    }

    fn parse_filter_list(&mut self) -> Result<Vec<Filter>, ParseError> {
        let mut filters = vec![self.parse_filter()?];
        while self.eat_comma()? {
            filters.push(self.parse_filter()?);
        }
        Ok(filters)
    }

    /// A filter predicate, starting at its function name.
    fn parse_filter(&mut self) -> Result<Filter, ParseError> {
        let name = self.parse_identifier()?;
        self.expect(Token::LParen)?;
        let filter = self.parse_filter_body(&name)?;
        self.expect(Token::RParen)?;
        Ok(filter)
    }

    fn parse_filter_body(&mut self, name: &str) -> Result<Filter, ParseError> {
        if let Some(op) = CompareOp::from_name(name) {
            let field = self.parse_identifier()?;
            self.expect(Token::Comma)?;
            let value = self.parse_value()?;
            return Ok(Filter::Compare { op, field, value });
        }

        match name {
            "in" => {
                let field = self.parse_identifier()?;
                self.expect(Token::Comma)?;
                let mut values = vec![self.parse_value()?];
                while self.eat_comma()? {
                    values.push(self.parse_value()?);
                }
                Ok(Filter::In { field, values })
            }
            "exists" => Ok(Filter::Exists(self.parse_identifier()?)),
            "missing" => Ok(Filter::Missing(self.parse_identifier()?)),
            "and" => Ok(Filter::And(self.parse_filter_list()?)),
            "or" => Ok(Filter::Or(self.parse_filter_list()?)),
            "not" => Ok(Filter::not(self.parse_filter()?)),
            "nested" => {
                let path = self.parse_identifier()?;
                self.expect(Token::Comma)?;
                let filters = self.parse_filter_list()?;
                Ok(Filter::Nested { path, filters })
            }
            _ => self.syntax_error(format!("Unknown function '{name}'")),
        }
    }

    pub fn parse(&mut self) -> Result<Statement, ParseError> {
        let mut statement = Statement::new();
        let mut filters = Vec::new();

        loop {
            let name = self.parse_identifier()?;
            self.expect(Token::LParen)?;
            match name.as_str() {
                "select" => {
                    let projection = self.parse_projection("select")?;
                    statement.select.push(projection);
                }
                "facets" => {
                    let projection = self.parse_projection("facets")?;
                    statement.facets.push(projection);
                }
                "count" => {
                    if statement.count {
                        return Err(ParseError::Semantic("count() may appear only once".into()));
                    }
                    statement.count = true;
                }
                "sort" => {
                    if !statement.sort.is_empty() {
                        return Err(ParseError::Semantic("sort() may appear only once".into()));
                    }
                    statement.sort = self.parse_sort()?;
                }
                "limit" => {
                    if statement.limit.is_some() {
                        return Err(ParseError::Semantic("limit() may appear only once".into()));
                    }
                    let first = self.parse_unsigned()?;
                    statement.limit = Some(if self.eat_comma()? {
                        Limit {
                            from: first,
                            size: self.parse_unsigned()?,
                        }
                    } else {
                        Limit { from: 0, size: first }
                    });
                }
                _ => filters.push(self.parse_filter_body(&name)?),
            }
            self.expect(Token::RParen)?;

            if !self.eat_comma()? {
                break;
            }
        }

        if !self.check(&Token::Eof) {
            return self.syntax_error(format!(
                "Unexpected {} after statement",
                self.current_token.describe()
            ));
        }
        if statement.count && !statement.select.is_empty() {
            return Err(ParseError::Semantic(
                "count() cannot be combined with select()".into(),
            ));
        }

        statement.filter = Filter::all(filters);
        Ok(statement)
    }
}

/// Parse PQL text into a statement.
pub fn parse(input: &str) -> Result<Statement, ParseError> {
    Parser::new(Lexer::new(input))?.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_level_filters_are_anded() {
        let statement = parse("eq(a,1),eq(b,2)").unwrap();
        assert_eq!(statement.to_pql(), "and(eq(a,1),eq(b,2))");
    }

    #[test]
    fn test_single_limit_argument_is_size() {
        let statement = parse("limit(5)").unwrap();
        assert_eq!(statement.limit, Some(Limit { from: 0, size: 5 }));
    }

    #[test]
    fn test_empty_select_rejected() {
        assert!(matches!(parse("select()"), Err(ParseError::Semantic(_))));
    }
}
