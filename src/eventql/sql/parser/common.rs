/*!
# Token Parser - Core Infrastructure

`TokenParser` holds the token stream and the navigation primitives shared by the
statement, stream and expression parsers:

- **Navigation**: `current_token()`, `peek_token(offset)`, `advance()`
- **Expectation**: `expect(TokenType)`, `expect_identifier()`, `expect_end()`
- **Utilities**: `consume_if(TokenType)`, `at_contextual(word, next)`, `create_parse_error(msg)`
- **Nesting**: `enter_subquery()` / `leave_subquery()` bound how deeply sub-selects
  may be nested; `descend()` / `ascend(levels)` bound expression nesting so that
  the recursive descent never runs out of stack
*/

use super::{Token, TokenType};
use crate::eventql::sql::error::{QueryError, QueryResult};

/// Recursive descent state over a token stream.
pub struct TokenParser<'a> {
    tokens: Vec<Token>,
    current: usize,
    text: &'a str,
    depth: usize,
    max_depth: usize,
    nesting: usize,
    max_nesting: usize,
}

impl<'a> TokenParser<'a> {
    pub fn new(tokens: Vec<Token>, text: &'a str, max_depth: usize, max_nesting: usize) -> Self {
        Self {
            tokens,
            current: 0,
            text,
            depth: 0,
            max_depth,
            nesting: 0,
            max_nesting,
        }
    }

    /// Parse error positioned at the current token.
    pub fn create_parse_error(&self, message: impl Into<String>) -> QueryError {
        let position = if self.current < self.tokens.len() {
            Some(self.tokens[self.current].position)
        } else {
            self.tokens.last().map(|t| t.position)
        };
        QueryError::parse_error(message, position)
    }

    /// Current token, or a static EOF token past the end of the stream.
    pub fn current_token(&self) -> &Token {
        if self.current < self.tokens.len() {
            &self.tokens[self.current]
        } else {
            static EOF_TOKEN: Token = Token {
                token_type: TokenType::Eof,
                value: String::new(),
                position: 0,
            };
            &EOF_TOKEN
        }
    }

    /// Look `offset` tokens ahead without consuming.
    pub fn peek_token(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.current + offset)
    }

    /// Whether the current token has the given type.
    pub fn at(&self, token_type: TokenType) -> bool {
        self.current_token().token_type == token_type
    }

    /// Advance to the next token. Never moves past the final EOF token.
    pub fn advance(&mut self) {
        if self.current + 1 < self.tokens.len() {
            self.current += 1;
        }
    }

    pub fn expect(&mut self, expected: TokenType) -> QueryResult<Token> {
        let token = self.current_token().clone();
        if token.token_type == expected {
            self.advance();
            Ok(token)
        } else {
            Err(self.create_parse_error(format!(
                "Expected {:?}, found {:?}",
                expected, token.token_type
            )))
        }
    }

    /// Consume an identifier and return its text.
    pub fn expect_identifier(&mut self) -> QueryResult<String> {
        let token = self.current_token();
        if token.token_type == TokenType::Identifier {
            let value = token.value.clone();
            self.advance();
            Ok(value)
        } else {
            Err(QueryError::parse_error(
                format!("Expected identifier, found {:?}", token.token_type),
                Some(token.position),
            ))
        }
    }

    /// Consume a token of the given type if present.
    pub fn consume_if(&mut self, token_type: TokenType) -> bool {
        if self.at(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Whether the current token is the contextual keyword `word` followed by a
    /// token of type `next`.
    pub fn at_contextual(&self, word: &str, next: TokenType) -> bool {
        let token = self.current_token();
        token.token_type == TokenType::Identifier
            && token.value.eq_ignore_ascii_case(word)
            && self.peek_token(1).map(|t| &t.token_type) == Some(&next)
    }

    /// Note entry into a nested sub-select.
    pub fn enter_subquery(&mut self) -> QueryResult<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            log::debug!(
                "Subquery nesting {} exceeds limit {} in: {}",
                self.depth,
                self.max_depth,
                self.text
            );
            return Err(QueryError::client_error(format!(
                "subquery nesting exceeds the maximum depth of {}",
                self.max_depth
            )));
        }
        Ok(())
    }

    pub fn leave_subquery(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Note one more level of expression nesting.
    pub fn descend(&mut self) -> QueryResult<()> {
        self.nesting += 1;
        if self.nesting > self.max_nesting {
            log::debug!(
                "Expression nesting exceeds limit {} at position {}",
                self.max_nesting,
                self.current_token().position
            );
            return Err(QueryError::client_error(format!(
                "expression nesting exceeds the maximum depth of {}",
                self.max_nesting
            )));
        }
        Ok(())
    }

    pub fn ascend(&mut self, levels: usize) {
        self.nesting = self.nesting.saturating_sub(levels);
    }

    /// Ensure nothing but an optional semicolon is left.
    pub fn expect_end(&mut self) -> QueryResult<()> {
        self.consume_if(TokenType::Semicolon);
        if self.at(TokenType::Eof) {
            Ok(())
        } else {
            Err(self.create_parse_error(format!(
                "Unexpected token '{}' after end of statement",
                self.current_token().value
            )))
        }
    }
}
