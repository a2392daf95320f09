/*!
# Expression Parsing

Recursive descent over the expression grammar, lowest precedence first:

```text
Level 1 (Lowest):  Logical OR                  (parse_logical_or)
Level 2:           Logical AND                 (parse_logical_and)
Level 3:           Logical NOT                 (parse_logical_not)
Level 4:           Comparisons/IS/IN/BETWEEN   (parse_comparison)
Level 5:           String Concatenation (||)   (parse_concatenative)
Level 6:           Addition/Subtraction        (parse_additive)
Level 7:           Multiplication/Division     (parse_multiplicative)
Level 8:           Unary minus                 (parse_unary)
Level 9 (Highest): Primary Expressions         (parse_primary)
```

Every recursive step and every operator in a chain counts against the parser's
expression depth limit, so deeply nested or very long inputs fail with a client
error instead of exhausting the stack.

## Field paths and method chains

A primary starting with an identifier is read as a dotted path. Container segments
(`$0`, or a bare index `0`) are part of the path:

```sql
field.key1.$0              -- Property("field.key1.$0")
count(*)                   -- Function
opts.num.$0.length()       -- Chain [opts.num.$0, length()]
T.path.substr(0, 2).trim() -- Chain [T.path, substr(0, 2), trim()]
```
*/

use super::common::TokenParser;
use super::TokenType;
use crate::eventql::sql::ast::{BinaryOperator, ChainLink, Expr, Literal, UnaryOperator};
use crate::eventql::sql::error::QueryResult;

const TIME_UNITS: &[&str] = &[
    "msec",
    "millisecond",
    "milliseconds",
    "sec",
    "second",
    "seconds",
    "min",
    "minute",
    "minutes",
    "hour",
    "hours",
    "day",
    "days",
];

impl<'a> TokenParser<'a> {
    pub(super) fn parse_expression(&mut self) -> QueryResult<Expr> {
        self.descend()?;
        let expr = self.parse_logical_or()?;
        self.ascend(1);
        Ok(expr)
    }

    fn parse_logical_or(&mut self) -> QueryResult<Expr> {
        let mut left = self.parse_logical_and()?;
        let mut levels = 0;
        while self.consume_if(TokenType::Or) {
            self.descend()?;
            levels += 1;
            let right = self.parse_logical_and()?;
            left = Expr::BinaryOp {
                left: Box::new(left),
                op: BinaryOperator::Or,
                right: Box::new(right),
            };
        }
        self.ascend(levels);
        Ok(left)
    }

    fn parse_logical_and(&mut self) -> QueryResult<Expr> {
        let mut left = self.parse_logical_not()?;
        let mut levels = 0;
        while self.consume_if(TokenType::And) {
            self.descend()?;
            levels += 1;
            let right = self.parse_logical_not()?;
            left = Expr::BinaryOp {
                left: Box::new(left),
                op: BinaryOperator::And,
                right: Box::new(right),
            };
        }
        self.ascend(levels);
        Ok(left)
    }

    fn parse_logical_not(&mut self) -> QueryResult<Expr> {
        if self.consume_if(TokenType::Not) {
            self.descend()?;
            let expr = self.parse_logical_not()?;
            self.ascend(1);
            return Ok(Expr::UnaryOp {
                op: UnaryOperator::Not,
                expr: Box::new(expr),
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> QueryResult<Expr> {
        let left = self.parse_concatenative()?;

        let op = match self.current_token().token_type {
            TokenType::Equal => Some(BinaryOperator::Equal),
            TokenType::NotEqual => Some(BinaryOperator::NotEqual),
            TokenType::LessThan => Some(BinaryOperator::LessThan),
            TokenType::LessThanOrEqual => Some(BinaryOperator::LessThanOrEqual),
            TokenType::GreaterThan => Some(BinaryOperator::GreaterThan),
            TokenType::GreaterThanOrEqual => Some(BinaryOperator::GreaterThanOrEqual),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let right = self.parse_concatenative()?;
            return Ok(Expr::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            });
        }

        if self.consume_if(TokenType::Is) {
            let negated = self.consume_if(TokenType::Not);
            self.expect(TokenType::Null)?;
            return Ok(Expr::IsNull {
                expr: Box::new(left),
                negated,
            });
        }

        // NOT only binds here as part of NOT IN / NOT BETWEEN / NOT LIKE
        let negated = self.at(TokenType::Not)
            && matches!(
                self.peek_token(1).map(|t| &t.token_type),
                Some(TokenType::In) | Some(TokenType::Between) | Some(TokenType::Like)
            );
        if negated {
            self.advance();
        }

        match self.current_token().token_type {
            TokenType::In => {
                self.advance();
                self.parse_in_operand(left, negated)
            }
            TokenType::Between => {
                self.advance();
                let low = self.parse_concatenative()?;
                self.expect(TokenType::And)?;
                let high = self.parse_concatenative()?;
                Ok(Expr::Between {
                    expr: Box::new(left),
                    low: Box::new(low),
                    high: Box::new(high),
                    negated,
                })
            }
            TokenType::Like => {
                self.advance();
                let pattern = self.parse_concatenative()?;
                Ok(Expr::Like {
                    expr: Box::new(left),
                    pattern: Box::new(pattern),
                    negated,
                })
            }
            _ => Ok(left),
        }
    }

    fn parse_in_operand(&mut self, left: Expr, negated: bool) -> QueryResult<Expr> {
        self.expect(TokenType::LeftParen)?;
        if self.at(TokenType::Select) {
            let subquery = self.parse_nested_select()?;
            self.expect(TokenType::RightParen)?;
            return Ok(Expr::InSubquery {
                expr: Box::new(left),
                subquery: Box::new(subquery),
                negated,
            });
        }
        let list = self.parse_expression_list(TokenType::RightParen)?;
        self.expect(TokenType::RightParen)?;
        Ok(Expr::InList {
            expr: Box::new(left),
            list,
            negated,
        })
    }

    fn parse_concatenative(&mut self) -> QueryResult<Expr> {
        let mut left = self.parse_additive()?;
        let mut levels = 0;
        while self.consume_if(TokenType::Concat) {
            self.descend()?;
            levels += 1;
            let right = self.parse_additive()?;
            left = Expr::BinaryOp {
                left: Box::new(left),
                op: BinaryOperator::Concat,
                right: Box::new(right),
            };
        }
        self.ascend(levels);
        Ok(left)
    }

    fn parse_additive(&mut self) -> QueryResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        let mut levels = 0;
        loop {
            let op = match self.current_token().token_type {
                TokenType::Plus => BinaryOperator::Add,
                TokenType::Minus => BinaryOperator::Subtract,
                _ => break,
            };
            self.advance();
            self.descend()?;
            levels += 1;
            let right = self.parse_multiplicative()?;
            left = Expr::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        self.ascend(levels);
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> QueryResult<Expr> {
        let mut left = self.parse_unary()?;
        let mut levels = 0;
        loop {
            let op = match self.current_token().token_type {
                TokenType::Asterisk => BinaryOperator::Multiply,
                TokenType::Divide => BinaryOperator::Divide,
                TokenType::Modulo => BinaryOperator::Modulo,
                _ => break,
            };
            self.advance();
            self.descend()?;
            levels += 1;
            let right = self.parse_unary()?;
            left = Expr::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        self.ascend(levels);
        Ok(left)
    }

    fn parse_unary(&mut self) -> QueryResult<Expr> {
        if self.consume_if(TokenType::Minus) {
            self.descend()?;
            let expr = self.parse_unary()?;
            self.ascend(1);
            return Ok(Expr::UnaryOp {
                op: UnaryOperator::Minus,
                expr: Box::new(expr),
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> QueryResult<Expr> {
        let token = self.current_token().clone();
        match token.token_type {
            TokenType::Number => {
                self.advance();
                let unit = self.current_token();
                let is_unit = unit.token_type == TokenType::Identifier
                    && TIME_UNITS.contains(&unit.value.to_lowercase().as_str())
                    && self.peek_token(1).map(|t| &t.token_type) != Some(&TokenType::LeftParen);
                if is_unit {
                    let unit = unit.value.clone();
                    self.advance();
                    return Ok(Expr::TimePeriod {
                        value: token.value,
                        unit,
                    });
                }
                Ok(Expr::Literal(Literal::Number(token.value)))
            }
            TokenType::String => {
                self.advance();
                Ok(Expr::Literal(Literal::String(token.value)))
            }
            TokenType::True | TokenType::False => {
                self.advance();
                Ok(Expr::Literal(Literal::Boolean(
                    token.token_type == TokenType::True,
                )))
            }
            TokenType::Null => {
                self.advance();
                Ok(Expr::Literal(Literal::Null))
            }
            TokenType::Asterisk => {
                self.advance();
                Ok(Expr::Wildcard)
            }
            TokenType::Exists => {
                self.advance();
                self.expect(TokenType::LeftParen)?;
                let subquery = self.parse_nested_select()?;
                self.expect(TokenType::RightParen)?;
                Ok(Expr::Exists(Box::new(subquery)))
            }
            TokenType::Case => self.parse_case_expression(),
            TokenType::LeftParen => {
                self.advance();
                if self.at(TokenType::Select) {
                    let subquery = self.parse_nested_select()?;
                    self.expect(TokenType::RightParen)?;
                    return Ok(Expr::Subquery(Box::new(subquery)));
                }
                let expr = self.parse_expression()?;
                self.expect(TokenType::RightParen)?;
                Ok(Expr::Nested(Box::new(expr)))
            }
            TokenType::Identifier => self.parse_path_expression(),
            _ => Err(self.create_parse_error(format!(
                "Unexpected token in expression: '{}'",
                token.value
            ))),
        }
    }

    /// Dotted path, function call or method chain.
    fn parse_path_expression(&mut self) -> QueryResult<Expr> {
        let mut segments = vec![self.expect_identifier()?];
        while self.at(TokenType::Dot) {
            self.advance();
            segments.extend(self.expect_path_segment()?);
        }

        if !self.at(TokenType::LeftParen) {
            return Ok(Expr::Property(segments.join(".")));
        }

        let mut links = Vec::new();
        if segments.len() == 1 {
            let (distinct, args) = self.parse_call_arguments()?;
            let name = segments.remove(0);
            if distinct || !self.at(TokenType::Dot) {
                return Ok(Expr::Function {
                    name,
                    distinct,
                    args,
                });
            }
            links.push(ChainLink {
                name,
                parameters: Some(args),
            });
        } else {
            let method = segments.pop().unwrap_or_default();
            links.push(ChainLink {
                name: segments.join("."),
                parameters: None,
            });
            links.push(ChainLink {
                name: method,
                parameters: Some(self.parse_plain_arguments()?),
            });
        }

        while self.at(TokenType::Dot) {
            self.advance();
            let name = self.expect_identifier()?;
            let parameters = if self.at(TokenType::LeftParen) {
                Some(self.parse_plain_arguments()?)
            } else {
                None
            };
            links.push(ChainLink { name, parameters });
        }
        Ok(Expr::Chain(links))
    }

    /// One segment after a dot. A number token such as `0.1` spans two segments.
    fn expect_path_segment(&mut self) -> QueryResult<Vec<String>> {
        let token = self.current_token().clone();
        match token.token_type {
            TokenType::Identifier => {
                self.advance();
                Ok(vec![token.value])
            }
            TokenType::Number => {
                self.advance();
                Ok(token.value.split('.').map(str::to_string).collect())
            }
            _ if token.value.chars().next().is_some_and(char::is_alphabetic) => {
                // keywords are plain names after a dot
                self.advance();
                Ok(vec![token.value])
            }
            _ => Err(self.create_parse_error(format!(
                "Expected field name after '.', found '{}'",
                token.value
            ))),
        }
    }

    /// `'(' [DISTINCT] [expr (',' expr)*] ')'`
    pub(super) fn parse_call_arguments(&mut self) -> QueryResult<(bool, Vec<Expr>)> {
        self.expect(TokenType::LeftParen)?;
        let distinct = self.consume_if(TokenType::Distinct);
        let args = self.parse_expression_list(TokenType::RightParen)?;
        self.expect(TokenType::RightParen)?;
        Ok((distinct, args))
    }

    /// `'(' [expr (',' expr)*] ')'`
    pub(super) fn parse_plain_arguments(&mut self) -> QueryResult<Vec<Expr>> {
        self.expect(TokenType::LeftParen)?;
        let args = self.parse_expression_list(TokenType::RightParen)?;
        self.expect(TokenType::RightParen)?;
        Ok(args)
    }

    /// Comma separated expressions up to (not including) `terminator`.
    pub(super) fn parse_expression_list(&mut self, terminator: TokenType) -> QueryResult<Vec<Expr>> {
        let mut items = Vec::new();
        if self.at(terminator) {
            return Ok(items);
        }
        loop {
            items.push(self.parse_expression()?);
            if !self.consume_if(TokenType::Comma) {
                break;
            }
        }
        Ok(items)
    }

    fn parse_case_expression(&mut self) -> QueryResult<Expr> {
        self.expect(TokenType::Case)?;
        let operand = if self.at(TokenType::When) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };

        let mut when_then = Vec::new();
        while self.consume_if(TokenType::When) {
            let when = self.parse_expression()?;
            self.expect(TokenType::Then)?;
            let then = self.parse_expression()?;
            when_then.push((when, then));
        }
        if when_then.is_empty() {
            return Err(self.create_parse_error("CASE expression requires at least one WHEN"));
        }

        let else_result = if self.consume_if(TokenType::Else) {
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };
        self.expect(TokenType::End)?;

        Ok(Expr::Case {
            operand,
            when_then,
            else_result,
        })
    }
}
