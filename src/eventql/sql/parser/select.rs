/*!
# SELECT Statement Parsing

Parses a complete `SELECT` statement, at the top level or nested inside parentheses:

```sql
SELECT [DISTINCT] select_list
FROM stream [, stream ...]
[WHERE expr]
[GROUP BY expr [, expr ...]]
[HAVING expr]
[ORDER BY expr [ASC|DESC] [, ...]]
```

Streams (event filters, patterns, method invocations, derived sub-selects) and their
views are handled in `clauses.rs`.
*/

use super::common::TokenParser;
use super::TokenType;
use crate::eventql::sql::ast::{SelectItem, SelectStatement};
use crate::eventql::sql::error::QueryResult;

impl<'a> TokenParser<'a> {
    pub(super) fn parse_select_statement(&mut self) -> QueryResult<SelectStatement> {
        self.expect(TokenType::Select)?;
        let distinct = self.consume_if(TokenType::Distinct);
        let select = self.parse_select_list()?;

        self.expect(TokenType::From)?;
        let mut from = vec![self.parse_stream()?];
        while self.consume_if(TokenType::Comma) {
            from.push(self.parse_stream()?);
        }

        let where_clause = if self.consume_if(TokenType::Where) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        let group_by = if self.at(TokenType::Group) {
            self.parse_group_by_list()?
        } else {
            Vec::new()
        };

        let having = if self.consume_if(TokenType::Having) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        let order_by = if self.at(TokenType::Order) {
            self.parse_order_by_list()?
        } else {
            Vec::new()
        };

        Ok(SelectStatement {
            distinct,
            select,
            from,
            where_clause,
            group_by,
            having,
            order_by,
        })
    }

    /// A `SELECT` nested in an expression or a FROM clause, bounded by the configured depth.
    pub(super) fn parse_nested_select(&mut self) -> QueryResult<SelectStatement> {
        self.enter_subquery()?;
        let statement = self.parse_select_statement();
        self.leave_subquery();
        statement
    }

    fn parse_select_list(&mut self) -> QueryResult<Vec<SelectItem>> {
        let mut items = Vec::new();
        loop {
            if self.consume_if(TokenType::Asterisk) {
                items.push(SelectItem::Wildcard);
            } else {
                let expr = self.parse_expression()?;
                let alias = if self.consume_if(TokenType::As) {
                    Some(self.expect_identifier()?)
                } else if self.at(TokenType::Identifier) {
                    Some(self.expect_identifier()?)
                } else {
                    None
                };
                items.push(SelectItem::Expression { expr, alias });
            }

            if !self.consume_if(TokenType::Comma) {
                break;
            }
        }
        Ok(items)
    }
}
