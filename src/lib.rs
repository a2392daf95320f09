//! # eventql
//!
//! Target, alias and field resolution for continuous event queries, plus the
//! identifier rewriting that runs before a query is handed to the execution runtime.
//!
//! ## Features
//!
//! - **Exploration**: which targets a query reads, which aliases it declares and which
//!   fields every target must provide, through arbitrarily nested subqueries
//! - **Rewriting**: logical target names and dotted field paths become the physical
//!   names the runtime manages
//! - **Parsing**: a compact front end for the event query language, rendering back to
//!   canonical text
//!
//! ## Quick Start
//!
//! ```rust
//! use eventql::{FieldScope, Query};
//!
//! let query = Query::builder("errors", "SELECT path, status FROM access_log WHERE status >= 500")
//!     .group("monitoring")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(query.targets().unwrap(), ["access_log"]);
//! assert_eq!(
//!     query.fields(FieldScope::Target("access_log")).unwrap(),
//!     ["path", "status"]
//! );
//! ```

#![allow(clippy::large_enum_variant)]

pub mod eventql;

// Re-export main API at crate root for easy access
pub use eventql::config::{AnalysisConfig, ConfigError};
pub use eventql::sql::{
    rewrite_query, EventQueryParser, FieldMap, FieldScope, Query, QueryDump, QueryError,
    QueryInfo, QueryResult, QueryRewriter, StatementModel, SubQuery,
};
