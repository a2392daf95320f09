/*!
# Queries

A [`Query`] is a named continuous query registered by a client. It wraps the raw
expression text and lazily derives, at most once each:

- the parsed statement
- the sorted unique **targets** (event streams) it reads, at any nesting depth
- the sorted unique **aliases** it declares
- the **field map**: which fields each target must provide

```
use eventql::eventql::sql::query::{FieldScope, Query};

let query = Query::builder("q1", "select field1, other.field2 from TargetA as other")
    .build()
    .unwrap();

assert_eq!(query.targets().unwrap(), ["TargetA"]);
assert_eq!(query.aliases().unwrap(), ["other"]);
assert_eq!(
    query.fields(FieldScope::Target("TargetA")).unwrap(),
    ["field1", "field2"]
);
```

[`SubQuery`] handles expose the same exploration contract over nested statements
without owning any text.
*/

mod explorer;
mod field_map;

pub use field_map::{FieldMap, FieldScope};

use crate::eventql::config::AnalysisConfig;
use crate::eventql::sql::ast::node::{AstNode, NodeKind};
use crate::eventql::sql::ast::{SelectStatement, StatementModel};
use crate::eventql::sql::error::{QueryError, QueryResult};
use crate::eventql::sql::parser::EventQueryParser;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

/// Wire form of a registered query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryInfo {
    pub name: String,
    pub group: Option<String>,
    pub expression: String,
    pub targets: Vec<String>,
}

/// Persistence form of a query, restorable with [`Query::from_dump`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDump {
    pub name: String,
    pub group: Option<String>,
    pub expression: String,
}

/// Builder for [`Query`]
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    name: String,
    expression: String,
    group: Option<String>,
    hook: Option<String>,
    config: AnalysisConfig,
}

impl QueryBuilder {
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Standard base64 encoded hook payload, decoded at build time.
    pub fn hook(mut self, encoded: impl Into<String>) -> Self {
        self.hook = Some(encoded.into());
        self
    }

    pub fn config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> QueryResult<Query> {
        if self.name.trim().is_empty() {
            return Err(QueryError::argument_error("Query name MUST NOT be blank"));
        }
        if self.expression.trim().is_empty() {
            return Err(QueryError::argument_error(
                "Query expression MUST NOT be blank",
            ));
        }
        if self.expression.len() > self.config.max_expression_length {
            return Err(QueryError::argument_error(format!(
                "Query expression is {} bytes, longer than the limit of {}",
                self.expression.len(),
                self.config.max_expression_length
            )));
        }
        let hook = match self.hook {
            Some(encoded) => Some(STANDARD.decode(encoded.trim()).map_err(|e| {
                QueryError::argument_error(format!("Query hook is not valid base64: {}", e))
            })?),
            None => None,
        };

        Ok(Query {
            name: self.name,
            group: self.group,
            expression: self.expression,
            statement_name: None,
            hook,
            config: self.config,
            ast: OnceLock::new(),
            targets: OnceLock::new(),
            aliases: OnceLock::new(),
            fields: OnceLock::new(),
        })
    }
}

/// A named continuous query
#[derive(Debug)]
pub struct Query {
    name: String,
    group: Option<String>,
    expression: String,
    statement_name: Option<String>,
    hook: Option<Vec<u8>>,
    config: AnalysisConfig,
    ast: OnceLock<SelectStatement>,
    targets: OnceLock<Vec<String>>,
    aliases: OnceLock<Vec<String>>,
    fields: OnceLock<FieldMap>,
}

impl Query {
    pub fn builder(name: impl Into<String>, expression: impl Into<String>) -> QueryBuilder {
        QueryBuilder {
            name: name.into(),
            expression: expression.into(),
            group: None,
            hook: None,
            config: AnalysisConfig::default(),
        }
    }

    pub fn new(
        name: impl Into<String>,
        group: Option<String>,
        expression: impl Into<String>,
    ) -> QueryResult<Self> {
        let mut builder = Self::builder(name, expression);
        builder.group = group;
        builder.build()
    }

    /// Restore a query from its persisted form.
    pub fn from_dump(dump: QueryDump) -> QueryResult<Self> {
        Self::new(dump.name, dump.group, dump.expression)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn hook(&self) -> Option<&[u8]> {
        self.hook.as_deref()
    }

    /// Name of the running statement, once the runtime has registered it.
    pub fn statement_name(&self) -> Option<&str> {
        self.statement_name.as_deref()
    }

    pub fn set_statement_name(&mut self, statement_name: impl Into<String>) {
        self.statement_name = Some(statement_name.into());
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// The parsed statement. A parse failure is not cached.
    pub fn ast(&self) -> QueryResult<&SelectStatement> {
        if let Some(ast) = self.ast.get() {
            return Ok(ast);
        }
        let parsed = EventQueryParser::with_config(&self.config).parse(&self.expression)?;
        Ok(self.ast.get_or_init(|| parsed))
    }

    /// Parse the expression into a fresh, independently mutable statement model.
    pub fn compile(&self) -> QueryResult<StatementModel> {
        EventQueryParser::with_config(&self.config).compile(&self.expression)
    }

    /// Sorted unique target names referenced anywhere in the query.
    pub fn targets(&self) -> QueryResult<&[String]> {
        if let Some(targets) = self.targets.get() {
            return Ok(targets);
        }
        let targets = collect_targets(AstNode::Statement(self.ast()?));
        Ok(self.targets.get_or_init(|| targets))
    }

    /// Sorted unique alias names declared anywhere in the query.
    pub fn aliases(&self) -> QueryResult<&[String]> {
        if let Some(aliases) = self.aliases.get() {
            return Ok(aliases);
        }
        let aliases = collect_aliases(AstNode::Statement(self.ast()?));
        Ok(self.aliases.get_or_init(|| aliases))
    }

    /// Every nested subquery, at any depth.
    pub fn subqueries(&self) -> QueryResult<Vec<SubQuery<'_>>> {
        Ok(AstNode::Statement(self.ast()?)
            .collect(NodeKind::Subquery)
            .into_iter()
            .filter_map(|node| node.statement().map(SubQuery::new))
            .collect())
    }

    /// Attribute every field reference to a target.
    ///
    /// `outer_targets` become additional known targets; `alias_overrides` seeds the
    /// alias map and is shadowed by aliases the query declares itself.
    pub fn explore(
        &self,
        outer_targets: &[String],
        alias_overrides: &HashMap<String, String>,
    ) -> QueryResult<FieldMap> {
        let outer: BTreeSet<String> = outer_targets.iter().cloned().collect();
        explorer::explore_scope(
            AstNode::Statement(self.ast()?),
            &outer,
            alias_overrides,
            &BTreeSet::new(),
        )
    }

    /// The field map of the query, explored once and cached.
    pub fn field_map(&self) -> QueryResult<&FieldMap> {
        if let Some(fields) = self.fields.get() {
            return Ok(fields);
        }
        let fields = self.explore(&[], &HashMap::new())?;
        Ok(self.fields.get_or_init(|| fields))
    }

    /// Fields of one bucket of the field map. A target the query does not read has
    /// no fields.
    pub fn fields(&self, scope: FieldScope<'_>) -> QueryResult<&[String]> {
        Ok(self.field_map()?.get(scope).unwrap_or(&[]))
    }

    pub fn to_info(&self) -> QueryResult<QueryInfo> {
        Ok(QueryInfo {
            name: self.name.clone(),
            group: self.group.clone(),
            expression: self.expression.clone(),
            targets: self.targets()?.to_vec(),
        })
    }

    pub fn dump(&self) -> QueryDump {
        QueryDump {
            name: self.name.clone(),
            group: self.group.clone(),
            expression: self.expression.clone(),
        }
    }
}

/// A copy carries the definition only: no statement name, nothing cached.
impl Clone for Query {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            group: self.group.clone(),
            expression: self.expression.clone(),
            statement_name: None,
            hook: self.hook.clone(),
            config: self.config.clone(),
            ast: OnceLock::new(),
            targets: OnceLock::new(),
            aliases: OnceLock::new(),
            fields: OnceLock::new(),
        }
    }
}

impl PartialEq for Query {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Query {}

impl PartialOrd for Query {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Group first (a query without a group sorts before any grouped query), then name.
impl Ord for Query {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.group.as_ref(), &self.name).cmp(&(other.group.as_ref(), &other.name))
    }
}

/// A nested `SELECT` inside a query.
///
/// Borrows its node from the owning query's tree; it has no name and no text of its
/// own and is never registered.
#[derive(Debug, Clone, Copy)]
pub struct SubQuery<'a> {
    node: &'a SelectStatement,
}

impl<'a> SubQuery<'a> {
    pub fn new(node: &'a SelectStatement) -> Self {
        Self { node }
    }

    pub fn name(&self) -> &'static str {
        ""
    }

    pub fn expression(&self) -> &'static str {
        ""
    }

    pub fn ast(&self) -> &'a SelectStatement {
        self.node
    }

    pub fn targets(&self) -> Vec<String> {
        collect_targets(AstNode::Subquery(self.node))
    }

    pub fn aliases(&self) -> Vec<String> {
        collect_aliases(AstNode::Subquery(self.node))
    }

    /// Subqueries nested below this one, at any depth.
    pub fn subqueries(&self) -> Vec<SubQuery<'a>> {
        AstNode::Subquery(self.node)
            .collect(NodeKind::Subquery)
            .into_iter()
            .filter_map(|node| node.statement().map(SubQuery::new))
            .collect()
    }

    pub fn explore(
        &self,
        outer_targets: &[String],
        alias_overrides: &HashMap<String, String>,
    ) -> QueryResult<FieldMap> {
        let outer: BTreeSet<String> = outer_targets.iter().cloned().collect();
        explorer::explore_scope(
            AstNode::Subquery(self.node),
            &outer,
            alias_overrides,
            &BTreeSet::new(),
        )
    }
}

fn collect_targets(root: AstNode<'_>) -> Vec<String> {
    let targets: BTreeSet<String> = root
        .collect(NodeKind::Stream)
        .into_iter()
        .filter_map(|node| match node {
            AstNode::Stream(stream) => Some(stream.targets()),
            _ => None,
        })
        .flatten()
        .map(str::to_string)
        .collect();
    targets.into_iter().collect()
}

fn collect_aliases(root: AstNode<'_>) -> Vec<String> {
    let aliases: BTreeSet<String> = root
        .collect(NodeKind::Stream)
        .into_iter()
        .filter_map(|node| match node {
            AstNode::Stream(stream) => Some(stream.aliases()),
            _ => None,
        })
        .flatten()
        .map(|(alias, _)| alias.to_string())
        .collect();
    aliases.into_iter().collect()
}
