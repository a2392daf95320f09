/*!
# FROM-clause and trailing clause parsing

Streams come in four shapes, each optionally followed by views and an alias:

```sql
AccessLog(status >= 500).win:time(10 min) AS err       -- event filter with a view
PATTERN [EVERY a=Login -> b=Purchase(amount > 100)]    -- pattern
METHOD:com.example.Lookup.fetch(user) AS lookup        -- method invocation
(SELECT user FROM AccessLog) AS recent                 -- derived stream
```

Pattern operator precedence, lowest first: `->`, `OR`, `AND`, then the unary `EVERY`
and `NOT`.
*/

use super::common::TokenParser;
use super::TokenType;
use crate::eventql::sql::ast::{
    EventFilter, Expr, OrderByItem, PatternExpr, Stream, StreamSource, View,
};
use crate::eventql::sql::error::QueryResult;

impl<'a> TokenParser<'a> {
    pub(super) fn parse_stream(&mut self) -> QueryResult<Stream> {
        let source = if self.at(TokenType::LeftParen) {
            self.advance();
            let statement = self.parse_nested_select()?;
            self.expect(TokenType::RightParen)?;
            StreamSource::Subquery(Box::new(statement))
        } else if self.at_contextual("PATTERN", TokenType::LeftBracket) {
            self.advance();
            self.expect(TokenType::LeftBracket)?;
            let pattern = self.parse_pattern()?;
            self.expect(TokenType::RightBracket)?;
            StreamSource::Pattern(pattern)
        } else if self.at_contextual("METHOD", TokenType::Colon) {
            self.parse_method_source()?
        } else {
            StreamSource::Filter(self.parse_event_filter()?)
        };

        let mut views = Vec::new();
        while self.at(TokenType::Dot) {
            self.advance();
            views.push(self.parse_view()?);
        }

        let alias = if self.consume_if(TokenType::As) {
            Some(self.expect_identifier()?)
        } else if self.at(TokenType::Identifier) {
            Some(self.expect_identifier()?)
        } else {
            None
        };

        Ok(Stream {
            source,
            views,
            alias,
        })
    }

    /// `Target[(filter)]`
    fn parse_event_filter(&mut self) -> QueryResult<EventFilter> {
        let event_type_name = self.expect_identifier()?;
        let filter = if self.consume_if(TokenType::LeftParen) {
            let filter = if self.at(TokenType::RightParen) {
                None
            } else {
                Some(self.parse_expression()?)
            };
            self.expect(TokenType::RightParen)?;
            filter
        } else {
            None
        };
        Ok(EventFilter {
            event_type_name,
            filter,
        })
    }

    /// `METHOD:Class.path.method(params)`
    fn parse_method_source(&mut self) -> QueryResult<StreamSource> {
        self.advance();
        self.expect(TokenType::Colon)?;
        let mut segments = vec![self.expect_identifier()?];
        while self.consume_if(TokenType::Dot) {
            segments.push(self.expect_identifier()?);
        }
        if segments.len() < 2 {
            return Err(self.create_parse_error(
                "Method invocation requires a class name and a method name",
            ));
        }
        let method_name = segments.pop().unwrap_or_default();
        let parameters = self.parse_plain_arguments()?;
        Ok(StreamSource::Method {
            class_name: segments.join("."),
            method_name,
            parameters,
        })
    }

    /// `namespace:name(params)`
    fn parse_view(&mut self) -> QueryResult<View> {
        let namespace = self.expect_identifier()?;
        self.expect(TokenType::Colon)?;
        let name = self.expect_identifier()?;
        let parameters = self.parse_plain_arguments()?;
        Ok(View {
            namespace,
            name,
            parameters,
        })
    }

    fn parse_pattern(&mut self) -> QueryResult<PatternExpr> {
        let mut items = vec![self.parse_pattern_or()?];
        while self.consume_if(TokenType::Arrow) {
            items.push(self.parse_pattern_or()?);
        }
        Ok(collapse(items, PatternExpr::FollowedBy))
    }

    fn parse_pattern_or(&mut self) -> QueryResult<PatternExpr> {
        let mut items = vec![self.parse_pattern_and()?];
        while self.consume_if(TokenType::Or) {
            items.push(self.parse_pattern_and()?);
        }
        Ok(collapse(items, PatternExpr::Or))
    }

    fn parse_pattern_and(&mut self) -> QueryResult<PatternExpr> {
        let mut items = vec![self.parse_pattern_unary()?];
        while self.consume_if(TokenType::And) {
            items.push(self.parse_pattern_unary()?);
        }
        Ok(collapse(items, PatternExpr::And))
    }

    fn parse_pattern_unary(&mut self) -> QueryResult<PatternExpr> {
        let token = self.current_token();
        let is_every = token.token_type == TokenType::Identifier
            && token.value.eq_ignore_ascii_case("EVERY")
            && self.peek_token(1).map(|t| &t.token_type) != Some(&TokenType::Equal);
        if is_every {
            self.advance();
            self.descend()?;
            let inner = self.parse_pattern_unary()?;
            self.ascend(1);
            return Ok(PatternExpr::Every(Box::new(inner)));
        }
        if self.consume_if(TokenType::Not) {
            self.descend()?;
            let inner = self.parse_pattern_unary()?;
            self.ascend(1);
            return Ok(PatternExpr::Not(Box::new(inner)));
        }
        if self.consume_if(TokenType::LeftParen) {
            self.descend()?;
            let inner = self.parse_pattern()?;
            self.ascend(1);
            self.expect(TokenType::RightParen)?;
            return Ok(inner);
        }

        let tag = if self.at(TokenType::Identifier)
            && self.peek_token(1).map(|t| &t.token_type) == Some(&TokenType::Equal)
        {
            let tag = self.expect_identifier()?;
            self.expect(TokenType::Equal)?;
            Some(tag)
        } else {
            None
        };
        let filter = self.parse_event_filter()?;
        Ok(PatternExpr::Filter { tag, filter })
    }

    pub(super) fn parse_group_by_list(&mut self) -> QueryResult<Vec<Expr>> {
        self.expect(TokenType::Group)?;
        self.expect(TokenType::By)?;
        let mut exprs = vec![self.parse_expression()?];
        while self.consume_if(TokenType::Comma) {
            exprs.push(self.parse_expression()?);
        }
        Ok(exprs)
    }

    pub(super) fn parse_order_by_list(&mut self) -> QueryResult<Vec<OrderByItem>> {
        self.expect(TokenType::Order)?;
        self.expect(TokenType::By)?;
        let mut items = Vec::new();
        loop {
            let expr = self.parse_expression()?;
            let descending = if self.consume_if(TokenType::Desc) {
                true
            } else {
                self.consume_if(TokenType::Asc);
                false
            };
            items.push(OrderByItem { expr, descending });
            if !self.consume_if(TokenType::Comma) {
                break;
            }
        }
        Ok(items)
    }
}

fn collapse(mut items: Vec<PatternExpr>, wrap: fn(Vec<PatternExpr>) -> PatternExpr) -> PatternExpr {
    if items.len() == 1 {
        items.remove(0)
    } else {
        wrap(items)
    }
}
