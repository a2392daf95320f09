/*!
Event Query Parser

Turns query text into a [`SelectStatement`] tree (for analysis) or a
[`StatementModel`] (for rewriting and execution). The parser is a syntax front end
only; it never evaluates anything.

```
use eventql::eventql::sql::parser::EventQueryParser;

let parser = EventQueryParser::new();
let statement = parser
    .parse("SELECT count(*) AS cnt FROM access_log.win:time_batch(10 sec) WHERE path = '/'")
    .unwrap();
assert_eq!(statement.from.len(), 1);
```
*/

mod clauses;
mod common;
mod expressions;
mod lexer;
mod select;

pub use lexer::{Token, TokenType};

use crate::eventql::config::AnalysisConfig;
use crate::eventql::sql::ast::{SelectStatement, StatementModel};
use crate::eventql::sql::error::QueryResult;
use common::TokenParser;
use std::collections::HashMap;

/// Parser for the event query language.
pub struct EventQueryParser {
    keywords: HashMap<String, TokenType>,
    max_depth: usize,
    max_nesting: usize,
}

impl EventQueryParser {
    pub fn new() -> Self {
        Self::with_config(&AnalysisConfig::default())
    }

    pub fn with_config(config: &AnalysisConfig) -> Self {
        Self {
            keywords: lexer::build_keywords(),
            max_depth: config.max_subquery_depth,
            max_nesting: config.max_expression_depth,
        }
    }

    /// Parse a single statement. A trailing semicolon is allowed.
    pub fn parse(&self, text: &str) -> QueryResult<SelectStatement> {
        let tokens = lexer::tokenize(text, &self.keywords)?;
        let mut parser = TokenParser::new(tokens, text, self.max_depth, self.max_nesting);
        let statement = parser.parse_select_statement()?;
        parser.expect_end()?;
        log::trace!("Parsed statement: {}", statement);
        Ok(statement)
    }

    /// Parse into the compiled model consumed by the rewriter and the runtime.
    pub fn compile(&self, text: &str) -> QueryResult<StatementModel> {
        self.parse(text).map(StatementModel::new)
    }
}

impl Default for EventQueryParser {
    fn default() -> Self {
        Self::new()
    }
}
