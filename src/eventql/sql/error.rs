/*!
# Query Error Handling

Errors raised while constructing, parsing, analysing and rewriting event queries.

## Error Categories

- **Argument Errors**: a query was constructed with a blank name or expression,
  or with a payload that cannot be decoded
- **Client Errors**: the query is structurally invalid relative to the targets and
  aliases it declares (alias shadowing a target, unknown qualifier, nesting too deep)
- **Parse Errors**: the expression text is not valid query syntax
- **Query Errors**: a field's target cannot be determined while rewriting
- **Internal Errors**: the registration pipeline handed the rewriter a mapping that
  lacks a referenced target; this is a defect upstream, never the submitter's fault

## Examples

```rust
use eventql::eventql::sql::error::QueryError;

let error = QueryError::parse_error("Expected FROM clause", Some(42));
assert_eq!(error.to_string(), "Query parse error at position 42: Expected FROM clause");

let error = QueryError::client_error("unknown target alias name for: x.f");
assert!(error.is_client_facing());
```
*/

use thiserror::Error;

/// Error types for query construction, analysis and rewriting.
///
/// Every variant except [`QueryError::Internal`] is surfaced to the submitter of the
/// query; the query is rejected and nothing is registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Construction-time validation failure (blank name, blank expression, bad hook).
    #[error("Argument error: {message}")]
    Argument { message: String },

    /// The query contradicts its own target/alias declarations.
    #[error("{message}")]
    Client { message: String },

    /// The expression failed to parse.
    #[error("Query parse error{}: {message}", position_suffix(.position))]
    Parse {
        /// Message produced by the parser, surfaced verbatim
        message: String,
        /// Character offset in the expression text, when known
        position: Option<usize>,
    },

    /// Field-path qualification failed while rewriting a compiled statement.
    #[error("{message}")]
    Query { message: String },

    /// Upstream contract violation detected by the rewriter.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

fn position_suffix(position: &Option<usize>) -> String {
    match position {
        Some(pos) => format!(" at position {}", pos),
        None => String::new(),
    }
}

impl QueryError {
    /// Create an argument error
    pub fn argument_error(message: impl Into<String>) -> Self {
        QueryError::Argument {
            message: message.into(),
        }
    }

    /// Create a client error
    pub fn client_error(message: impl Into<String>) -> Self {
        QueryError::Client {
            message: message.into(),
        }
    }

    /// Create a parse error with position
    pub fn parse_error(message: impl Into<String>, position: Option<usize>) -> Self {
        QueryError::Parse {
            message: message.into(),
            position,
        }
    }

    /// Create a query error
    pub fn query_error(message: impl Into<String>) -> Self {
        QueryError::Query {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        QueryError::Internal {
            message: message.into(),
        }
    }

    /// The bare message, without the category prefix used by `Display`.
    pub fn message(&self) -> &str {
        match self {
            QueryError::Argument { message }
            | QueryError::Client { message }
            | QueryError::Parse { message, .. }
            | QueryError::Query { message }
            | QueryError::Internal { message } => message,
        }
    }

    /// Whether this error should be reported back to the query's submitter.
    pub fn is_client_facing(&self) -> bool {
        !matches!(self, QueryError::Internal { .. })
    }
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;
