/*!
# Field/Target Explorer

Walks one query scope (a top-level statement or a subquery) and attributes every
field reference to the target it reads from.

A reference `x.f` is *qualified* when `x` is a target, an alias or a derived stream
name visible from the scope; otherwise the whole dotted path is the field name.
Unqualified fields inside an event filter belong to the filtered event type; other
unqualified fields go to the scope's only target when there is exactly one, and to
the unknown bucket otherwise. Subqueries are explored with the enclosing scope's
targets and aliases visible, and their results are merged into the enclosing map.

Fields qualified by a derived stream (a sub-select, method invocation or
multi-target pattern used under an alias) do not read any raw target and are not
recorded.
*/

use super::field_map::FieldMap;
use crate::eventql::sql::ast::node::{AstNode, NodeKind};
use crate::eventql::sql::ast::{Expr, SelectItem, SelectStatement, StreamSource};
use crate::eventql::sql::error::{QueryError, QueryResult};
use crate::eventql::sql::field::{split_method_chain, split_segments};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Split a field path into its qualifier (when `is_prefix` accepts the leading
/// segment) and the field name. Trailing method invocations are dropped.
fn qualify_reference(
    path: &str,
    is_prefix: impl Fn(&str) -> bool,
) -> (Option<String>, String) {
    let (body, _) = split_method_chain(path);
    let segments = split_segments(&body);
    if segments.len() > 1 && is_prefix(segments[0]) {
        (Some(segments[0].to_string()), segments[1..].join("."))
    } else {
        (None, body)
    }
}

/// Explore the scope rooted at `node`, which must be a statement or subquery node.
///
/// `alias_overrides` and `derived_overrides` carry the alias map and derived stream
/// names of the enclosing scopes; declarations in this scope shadow them.
pub(crate) fn explore_scope(
    node: AstNode<'_>,
    outer_targets: &BTreeSet<String>,
    alias_overrides: &HashMap<String, String>,
    derived_overrides: &BTreeSet<String>,
) -> QueryResult<FieldMap> {
    let statement = node.statement().ok_or_else(|| {
        QueryError::internal_error(format!("cannot explore a {:?} node", node.kind()))
    })?;

    let mut alias_map = alias_overrides.clone();
    let mut derived = derived_overrides.clone();
    let mut fields: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for stream_node in node.collect_in_scope(NodeKind::Stream) {
        let AstNode::Stream(stream) = stream_node else {
            continue;
        };
        for (alias, target) in stream.aliases() {
            match target {
                Some(target) => {
                    derived.remove(alias);
                    alias_map.insert(alias.to_string(), target.to_string());
                }
                None => {
                    alias_map.remove(alias);
                    derived.insert(alias.to_string());
                }
            }
        }
        for target in stream.targets() {
            fields.entry(target.to_string()).or_default();
        }
    }

    let collisions: BTreeSet<&str> = alias_map
        .keys()
        .chain(derived.iter())
        .map(String::as_str)
        .filter(|name| fields.contains_key(*name))
        .collect();
    if !collisions.is_empty() {
        let names: Vec<&str> = collisions.into_iter().collect();
        return Err(QueryError::client_error(format!(
            "Invalid alias '{}', same with target name",
            names.join(",")
        )));
    }

    let default_target = if fields.len() == 1 {
        fields.keys().next().cloned()
    } else {
        None
    };

    for target in outer_targets {
        fields.entry(target.clone()).or_default();
    }

    let scope_targets: BTreeSet<String> = fields.keys().cloned().collect();
    let mut bags = Vec::new();
    for subquery in node.collect_in_scope(NodeKind::Subquery) {
        bags.push(explore_scope(subquery, &scope_targets, &alias_map, &derived)?);
    }

    let output_aliases: HashSet<&str> = statement.select.iter().filter_map(SelectItem::alias).collect();

    let mut all = Vec::new();
    let mut unknown = Vec::new();
    for (path, filter_target) in scope_field_paths(statement) {
        let (qualifier, field) = qualify_reference(path, |prefix| {
            fields.contains_key(prefix) || alias_map.contains_key(prefix) || derived.contains(prefix)
        });
        if output_aliases.contains(field.as_str()) {
            continue;
        }

        match qualifier {
            Some(qualifier) if derived.contains(&qualifier) => {
                log::trace!("Skipping field {}.{} of a derived stream", qualifier, field);
            }
            Some(qualifier) => {
                let target = alias_map
                    .get(&qualifier)
                    .cloned()
                    .unwrap_or_else(|| qualifier.clone());
                let Some(list) = fields.get_mut(&target) else {
                    return Err(QueryError::client_error(format!(
                        "unknown target alias name for: {}.{}",
                        qualifier, field
                    )));
                };
                list.push(field.clone());
                all.push(field);
            }
            None => {
                all.push(field.clone());
                let target = filter_target.or(default_target.as_deref());
                match target.and_then(|t| fields.get_mut(t)) {
                    Some(list) => list.push(field),
                    None => unknown.push(field),
                }
            }
        }
    }

    for bag in bags {
        all.extend(bag.all().iter().cloned());
        unknown.extend(bag.unknown().iter().cloned());
        for (target, list) in bag.targets() {
            fields
                .entry(target.clone())
                .or_default()
                .extend(list.iter().cloned());
        }
    }

    let map = FieldMap::new(fields, all, unknown);
    log::debug!("Explored scope: {:?}", map);
    Ok(map)
}

/// Field paths referenced in the scope of `statement`, each paired with the event
/// type of the filter it appears in.
fn scope_field_paths(statement: &SelectStatement) -> Vec<(&str, Option<&str>)> {
    let mut roots: Vec<(&Expr, Option<&str>)> = Vec::new();
    for item in &statement.select {
        if let SelectItem::Expression { expr, .. } = item {
            roots.push((expr, None));
        }
    }
    for stream in &statement.from {
        match &stream.source {
            StreamSource::Filter(filter) => {
                let target = Some(filter.event_type_name.as_str());
                roots.extend(filter.filter.iter().map(|expr| (expr, target)));
            }
            StreamSource::Pattern(pattern) => {
                for (_, filter) in pattern.filters() {
                    let target = Some(filter.event_type_name.as_str());
                    roots.extend(filter.filter.iter().map(|expr| (expr, target)));
                }
            }
            StreamSource::Method { parameters, .. } => {
                roots.extend(parameters.iter().map(|expr| (expr, None)));
            }
            StreamSource::Subquery(_) => {}
        }
        for view in &stream.views {
            roots.extend(view.parameters.iter().map(|expr| (expr, None)));
        }
    }
    roots.extend(statement.where_clause.iter().map(|expr| (expr, None)));
    roots.extend(statement.group_by.iter().map(|expr| (expr, None)));
    roots.extend(statement.having.iter().map(|expr| (expr, None)));
    roots.extend(statement.order_by.iter().map(|item| (&item.expr, None)));

    let mut paths = Vec::new();
    for (root, target) in roots {
        let node = AstNode::Expression(root);
        for expression in std::iter::once(node).chain(node.collect_in_scope(NodeKind::Expression)) {
            if let Some(path) = expression_field_path(expression) {
                paths.push((path, target));
            }
        }
    }
    paths
}

fn expression_field_path<'a>(node: AstNode<'a>) -> Option<&'a str> {
    match node {
        AstNode::Expression(expr) => expr.field_path(),
        _ => None,
    }
}
