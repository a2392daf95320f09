// Query analysis for eventql
// Resolves targets, aliases and fields of continuous queries and rewrites identifiers

pub mod ast;
pub mod error;
pub mod field;
pub mod parser;
pub mod query;
pub mod rewrite;

// Re-export main API
pub use ast::StatementModel;
pub use error::{QueryError, QueryResult};
pub use parser::EventQueryParser;
pub use query::{FieldMap, FieldScope, Query, QueryDump, QueryInfo, SubQuery};
pub use rewrite::{rewrite_query, QueryRewriter};

// Version and feature info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const FEATURES: &[&str] = &[
    "event_filters",
    "patterns",
    "method_streams",
    "subqueries",   // scalar, IN, EXISTS and derived streams
    "field_escape", // nested and container fields as single identifiers
    "identifier_rewrite",
];
