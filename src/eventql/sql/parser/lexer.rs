/*!
Tokenization for event queries.

Converts query text into tokens: keywords, identifiers (which may contain `$` for
container segments such as `$0`), literals, operators and punctuation. Comments are
skipped.
*/

use crate::eventql::sql::error::QueryError;
use std::collections::HashMap;

/// Token types recognized by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
    // Keywords
    Select,
    Distinct,
    From,
    Where,
    Group,
    By,
    Having,
    Order,
    Asc,
    Desc,
    As,
    And,
    Or,
    Not,
    In,
    Is,
    Null,
    Between,
    Like,
    Exists,
    Case,
    When,
    Then,
    Else,
    End,
    True,
    False,

    // Literals and Identifiers
    Identifier,
    String,
    Number,

    // Punctuation
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Comma,
    Dot,
    Colon,
    Asterisk,

    // Operators
    Plus,
    Minus,
    Divide,
    Modulo,
    Concat,
    Arrow, // -> (pattern followed-by)
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    LessThanOrEqual,
    GreaterThanOrEqual,

    // Special
    Eof,
    Semicolon,
}

/// A token with its type, original text and character position.
#[derive(Debug, Clone)]
pub struct Token {
    pub token_type: TokenType,
    pub value: String,
    pub position: usize,
}

/// Build the keyword lookup table for token classification.
///
/// `PATTERN`, `EVERY` and `METHOD` are deliberately absent: they are contextual and
/// remain usable as field names.
pub(super) fn build_keywords() -> HashMap<String, TokenType> {
    let mut keywords = HashMap::new();
    keywords.insert("SELECT".to_string(), TokenType::Select);
    keywords.insert("DISTINCT".to_string(), TokenType::Distinct);
    keywords.insert("FROM".to_string(), TokenType::From);
    keywords.insert("WHERE".to_string(), TokenType::Where);
    keywords.insert("GROUP".to_string(), TokenType::Group);
    keywords.insert("BY".to_string(), TokenType::By);
    keywords.insert("HAVING".to_string(), TokenType::Having);
    keywords.insert("ORDER".to_string(), TokenType::Order);
    keywords.insert("ASC".to_string(), TokenType::Asc);
    keywords.insert("DESC".to_string(), TokenType::Desc);
    keywords.insert("AS".to_string(), TokenType::As);
    keywords.insert("AND".to_string(), TokenType::And);
    keywords.insert("OR".to_string(), TokenType::Or);
    keywords.insert("NOT".to_string(), TokenType::Not);
    keywords.insert("IN".to_string(), TokenType::In);
    keywords.insert("IS".to_string(), TokenType::Is);
    keywords.insert("NULL".to_string(), TokenType::Null);
    keywords.insert("BETWEEN".to_string(), TokenType::Between);
    keywords.insert("LIKE".to_string(), TokenType::Like);
    keywords.insert("EXISTS".to_string(), TokenType::Exists);
    keywords.insert("CASE".to_string(), TokenType::Case);
    keywords.insert("WHEN".to_string(), TokenType::When);
    keywords.insert("THEN".to_string(), TokenType::Then);
    keywords.insert("ELSE".to_string(), TokenType::Else);
    keywords.insert("END".to_string(), TokenType::End);
    keywords.insert("TRUE".to_string(), TokenType::True);
    keywords.insert("FALSE".to_string(), TokenType::False);
    keywords
}

fn single(token_type: TokenType, value: &str, position: usize) -> Token {
    Token {
        token_type,
        value: value.to_string(),
        position,
    }
}

/// Tokenize query text into a vector of tokens terminated by `Eof`.
pub(super) fn tokenize(
    text: &str,
    keywords: &HashMap<String, TokenType>,
) -> Result<Vec<Token>, QueryError> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    let mut position = 0;

    while let Some(&ch) = chars.peek() {
        match ch {
            ' ' | '\t' | '\n' | '\r' => {
                chars.next();
                position += 1;
            }
            '(' | ')' | '[' | ']' | ',' | ':' | '*' | '+' | '%' | '=' | ';' => {
                let token_type = match ch {
                    '(' => TokenType::LeftParen,
                    ')' => TokenType::RightParen,
                    '[' => TokenType::LeftBracket,
                    ']' => TokenType::RightBracket,
                    ',' => TokenType::Comma,
                    ':' => TokenType::Colon,
                    '*' => TokenType::Asterisk,
                    '+' => TokenType::Plus,
                    '%' => TokenType::Modulo,
                    '=' => TokenType::Equal,
                    _ => TokenType::Semicolon,
                };
                tokens.push(single(token_type, &ch.to_string(), position));
                chars.next();
                position += 1;
            }
            '.' => {
                tokens.push(single(TokenType::Dot, ".", position));
                chars.next();
                position += 1;
            }
            '-' => {
                let start = position;
                chars.next();
                position += 1;
                match chars.peek() {
                    Some(&'-') => {
                        // Single-line comment
                        while let Some(&c) = chars.peek() {
                            if c == '\n' {
                                break;
                            }
                            chars.next();
                            position += 1;
                        }
                    }
                    Some(&'>') => {
                        chars.next();
                        position += 1;
                        tokens.push(single(TokenType::Arrow, "->", start));
                    }
                    _ => tokens.push(single(TokenType::Minus, "-", start)),
                }
            }
            '/' => {
                let start = position;
                chars.next();
                position += 1;
                if let Some(&'*') = chars.peek() {
                    chars.next();
                    position += 1;
                    let mut found_end = false;
                    while let Some(c) = chars.next() {
                        position += 1;
                        if c == '*' && chars.peek() == Some(&'/') {
                            chars.next();
                            position += 1;
                            found_end = true;
                            break;
                        }
                    }
                    if !found_end {
                        return Err(QueryError::parse_error(
                            "Unterminated multi-line comment",
                            Some(start),
                        ));
                    }
                } else {
                    tokens.push(single(TokenType::Divide, "/", start));
                }
            }
            '<' => {
                let start = position;
                chars.next();
                position += 1;
                match chars.peek() {
                    Some(&'=') => {
                        chars.next();
                        position += 1;
                        tokens.push(single(TokenType::LessThanOrEqual, "<=", start));
                    }
                    Some(&'>') => {
                        chars.next();
                        position += 1;
                        tokens.push(single(TokenType::NotEqual, "<>", start));
                    }
                    _ => tokens.push(single(TokenType::LessThan, "<", start)),
                }
            }
            '>' => {
                let start = position;
                chars.next();
                position += 1;
                if let Some(&'=') = chars.peek() {
                    chars.next();
                    position += 1;
                    tokens.push(single(TokenType::GreaterThanOrEqual, ">=", start));
                } else {
                    tokens.push(single(TokenType::GreaterThan, ">", start));
                }
            }
            '!' => {
                let start = position;
                chars.next();
                position += 1;
                if let Some(&'=') = chars.peek() {
                    chars.next();
                    position += 1;
                    tokens.push(single(TokenType::NotEqual, "!=", start));
                } else {
                    return Err(QueryError::parse_error(
                        "Unexpected character '!' - did you mean '!='?",
                        Some(start),
                    ));
                }
            }
            '|' => {
                let start = position;
                chars.next();
                position += 1;
                if let Some(&'|') = chars.peek() {
                    chars.next();
                    position += 1;
                    tokens.push(single(TokenType::Concat, "||", start));
                } else {
                    return Err(QueryError::parse_error(
                        "Unexpected character '|' - did you mean '||' for concatenation?",
                        Some(start),
                    ));
                }
            }
            '\'' | '"' => {
                let quote = ch;
                let start = position;
                chars.next();
                position += 1;
                let mut value = String::new();
                let mut terminated = false;

                while let Some(next_ch) = chars.next() {
                    position += 1;
                    if next_ch == quote {
                        terminated = true;
                        break;
                    }
                    value.push(next_ch);
                }

                if !terminated {
                    return Err(QueryError::parse_error(
                        "Unterminated string literal",
                        Some(start),
                    ));
                }
                tokens.push(Token {
                    token_type: TokenType::String,
                    value,
                    position: start,
                });
            }
            '0'..='9' => {
                let start = position;
                let mut value = String::new();
                let mut has_decimal = false;

                while let Some(&next_ch) = chars.peek() {
                    if next_ch.is_ascii_digit() {
                        value.push(next_ch);
                    } else if next_ch == '.' && !has_decimal {
                        // A dot only continues the number when a digit follows
                        let mut lookahead = chars.clone();
                        lookahead.next();
                        if !matches!(lookahead.peek(), Some(c) if c.is_ascii_digit()) {
                            break;
                        }
                        has_decimal = true;
                        value.push(next_ch);
                    } else {
                        break;
                    }
                    chars.next();
                    position += 1;
                }

                tokens.push(Token {
                    token_type: TokenType::Number,
                    value,
                    position: start,
                });
            }
            _ if ch.is_alphabetic() || ch == '_' || ch == '$' => {
                let start = position;
                let mut value = String::new();
                while let Some(&next_ch) = chars.peek() {
                    if next_ch.is_alphanumeric() || next_ch == '_' || next_ch == '$' {
                        value.push(next_ch);
                        chars.next();
                        position += 1;
                    } else {
                        break;
                    }
                }

                let token_type = keywords
                    .get(&value.to_uppercase())
                    .cloned()
                    .unwrap_or(TokenType::Identifier);

                tokens.push(Token {
                    token_type,
                    value,
                    position: start,
                });
            }
            _ => {
                return Err(QueryError::parse_error(
                    format!("Unexpected character '{}' at position {}", ch, position),
                    Some(position),
                ));
            }
        }
    }

    tokens.push(Token {
        token_type: TokenType::Eof,
        value: String::new(),
        position,
    });

    Ok(tokens)
}
