/*!
# Identifier Rewriting

Before a query runs, the logical names a client wrote are replaced with the
physical names the runtime manages:

1. **Event type names**: every stream and pattern filter target is looked up in
   the name mapping (logical target name to physical event type name)
2. **Qualified field names**: dotted property paths are split into an optional
   target qualifier and a field body; the qualifier is mapped, the body is escaped
   into a single identifier and trailing method invocations are kept as written

```
use eventql::eventql::sql::parser::EventQueryParser;
use eventql::eventql::sql::rewrite::rewrite_query;
use std::collections::HashMap;

let mut model = EventQueryParser::new()
    .compile("SELECT count(*) AS cnt FROM TestTable.win:time_batch(10 sec) WHERE path = '/' AND size > 100 AND param.length() > 0")
    .unwrap();
let mapping = HashMap::from([("TestTable".to_string(), "T1".to_string())]);
rewrite_query(&mut model, &mapping).unwrap();

assert_eq!(
    model.to_epl(),
    "SELECT count(*) AS cnt FROM T1.win:time_batch(10 sec) WHERE path = '/' AND size > 100 AND param.length() > 0"
);
```

Both passes re-enter every nested subquery with the same mapping.
*/

pub mod traversal;

use crate::eventql::config::AnalysisConfig;
use crate::eventql::sql::ast::node::{AstNode, NodeKind};
use crate::eventql::sql::ast::{SelectStatement, StatementModel};
use crate::eventql::sql::error::{QueryError, QueryResult};
use crate::eventql::sql::field::{escape_name, split_method_chain, split_segments};
use crate::eventql::sql::query::Query;
use std::collections::{BTreeSet, HashMap};
use traversal::{traverse_fields, NodeMut};

/// Rewrite `model` in place with the default analysis limits.
pub fn rewrite_query(
    model: &mut StatementModel,
    mapping: &HashMap<String, String>,
) -> QueryResult<()> {
    QueryRewriter::new(mapping).rewrite(model)
}

/// Rewrites logical identifiers in a compiled statement to physical ones.
pub struct QueryRewriter<'m> {
    mapping: &'m HashMap<String, String>,
    config: AnalysisConfig,
}

impl<'m> QueryRewriter<'m> {
    pub fn new(mapping: &'m HashMap<String, String>) -> Self {
        Self::with_config(mapping, AnalysisConfig::default())
    }

    pub fn with_config(mapping: &'m HashMap<String, String>, config: AnalysisConfig) -> Self {
        Self { mapping, config }
    }

    /// Rewrite event type names, then qualified field names.
    pub fn rewrite(&self, model: &mut StatementModel) -> QueryResult<()> {
        self.rewrite_event_type_names(model)?;
        self.rewrite_field_names(model)?;
        log::debug!("Rewritten statement: {}", model.to_epl());
        Ok(())
    }

    pub fn rewrite_event_type_names(&self, model: &mut StatementModel) -> QueryResult<()> {
        self.rewrite_types_in(model.statement_mut(), 0)
    }

    pub fn rewrite_field_names(&self, model: &mut StatementModel) -> QueryResult<()> {
        self.rewrite_fields_in(model.statement_mut(), &BTreeSet::new(), 0)
    }

    fn check_depth(&self, depth: usize) -> QueryResult<()> {
        if depth > self.config.max_subquery_depth {
            return Err(QueryError::client_error(format!(
                "subquery nesting exceeds the maximum depth of {}",
                self.config.max_subquery_depth
            )));
        }
        Ok(())
    }

    fn rewrite_types_in(&self, statement: &mut SelectStatement, depth: usize) -> QueryResult<()> {
        self.check_depth(depth)?;
        let mapping = self.mapping;
        traverse_fields(
            statement,
            &mut |mut node: NodeMut<'_>| {
                if let Some(name) = node.event_type_name_mut() {
                    let Some(physical) = mapping.get(name.as_str()) else {
                        log::error!("target missing in mapping, maybe BUG: {}", name);
                        return Err(QueryError::internal_error(format!(
                            "target missing in mapping, maybe BUG: {}",
                            name
                        )));
                    };
                    *name = physical.clone();
                }
                Ok(())
            },
            &mut |subquery: &mut SelectStatement| self.rewrite_types_in(subquery, depth + 1),
        )
    }

    /// `enclosing` carries the qualifiers visible from enclosing scopes, so that
    /// correlated references inside a subquery keep their qualifier.
    /// The default target for unqualified fields is the single target of the
    /// current scope, not of the whole statement.
    fn rewrite_fields_in(
        &self,
        statement: &mut SelectStatement,
        enclosing: &BTreeSet<String>,
        depth: usize,
    ) -> QueryResult<()> {
        self.check_depth(depth)?;

        let query = Query::builder("field name rewrite", statement.to_string())
            .config(self.config.clone())
            .build()?;
        let mut prefixes = enclosing.clone();
        prefixes.extend(query.targets()?.iter().cloned());
        prefixes.extend(query.aliases()?.iter().cloned());

        let scope_targets: BTreeSet<&str> = AstNode::Statement(query.ast()?)
            .collect_in_scope(NodeKind::Stream)
            .into_iter()
            .filter_map(|node| match node {
                AstNode::Stream(stream) => Some(stream.targets()),
                _ => None,
            })
            .flatten()
            .collect();
        let default_target = if scope_targets.len() == 1 {
            scope_targets.into_iter().next()
        } else {
            None
        };

        let mapping = self.mapping;
        traverse_fields(
            statement,
            &mut |mut node: NodeMut<'_>| {
                if let Some(name) = node.property_name_mut() {
                    if let Some(rewritten) =
                        rewrite_field_path(name, &prefixes, mapping, default_target)?
                    {
                        *name = rewritten;
                    }
                }
                Ok(())
            },
            &mut |subquery: &mut SelectStatement| {
                self.rewrite_fields_in(subquery, &prefixes, depth + 1)
            },
        )
    }
}

/// Rewrite one dotted property name; `None` when it stays unchanged.
fn rewrite_field_path(
    name: &str,
    prefixes: &BTreeSet<String>,
    mapping: &HashMap<String, String>,
    default_target: Option<&str>,
) -> QueryResult<Option<String>> {
    if !name.contains('.') {
        return Ok(None);
    }

    let segments = split_segments(name);
    let first = segments[0];
    let (prefix, body) = if prefixes.contains(first) || mapping.contains_key(first) {
        let prefix = mapping
            .get(first)
            .cloned()
            .unwrap_or_else(|| first.to_string());
        (Some(prefix), segments[1..].join("."))
    } else if default_target.is_some() {
        (None, name.to_string())
    } else {
        return Err(QueryError::query_error(format!(
            "target cannot be determined for field '{}'",
            name
        )));
    };

    let (body, methods) = split_method_chain(&body);
    let mut parts = Vec::new();
    parts.extend(prefix);
    if !body.is_empty() {
        parts.push(escape_name(&body));
    }
    parts.extend(methods);
    Ok(Some(parts.join(".")))
}
