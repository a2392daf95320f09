//! Depth-first mutable traversal of a statement.
//!
//! Order: for each FROM stream its pattern, filter, method parameters and view
//! parameters; then the selection list, WHERE, GROUP BY, ORDER BY and HAVING. For
//! every expression the visitor runs first, then the re-entry callback when the
//! expression embeds a subquery, then child expressions, then chain links and their
//! parameters. Subquery bodies are never walked here; the re-entry callback owns
//! them.

use crate::eventql::sql::ast::{
    ChainLink, EventFilter, Expr, PatternExpr, SelectItem, SelectStatement, StreamSource,
};
use crate::eventql::sql::error::QueryResult;

/// A node handed to the traversal visitor.
#[derive(Debug)]
pub enum NodeMut<'a> {
    /// Event filter of a stream or a pattern
    Filter(&'a mut EventFilter),
    /// A pattern expression node
    Pattern(&'a mut PatternExpr),
    Expression(&'a mut Expr),
    /// One link of a method chain
    ChainLink(&'a mut ChainLink),
}

impl<'a> NodeMut<'a> {
    /// The event type name, for nodes that declare one.
    pub fn event_type_name_mut(&mut self) -> Option<&mut String> {
        match self {
            NodeMut::Filter(filter) => Some(&mut filter.event_type_name),
            _ => None,
        }
    }

    /// The dotted property name, for property expressions and chain links.
    pub fn property_name_mut(&mut self) -> Option<&mut String> {
        match self {
            NodeMut::Expression(Expr::Property(name)) => Some(name),
            NodeMut::ChainLink(link) => Some(&mut link.name),
            _ => None,
        }
    }
}

/// Walk `statement`, calling `visitor` on every reachable node and `recaller` on
/// every nested subquery.
pub fn traverse_fields<V, R>(
    statement: &mut SelectStatement,
    visitor: &mut V,
    recaller: &mut R,
) -> QueryResult<()>
where
    V: FnMut(NodeMut<'_>) -> QueryResult<()>,
    R: FnMut(&mut SelectStatement) -> QueryResult<()>,
{
    for stream in statement.from.iter_mut() {
        match &mut stream.source {
            StreamSource::Pattern(pattern) => traverse_pattern(pattern, visitor, recaller)?,
            StreamSource::Filter(filter) => traverse_filter(filter, visitor, recaller)?,
            StreamSource::Method { parameters, .. } => {
                for parameter in parameters.iter_mut() {
                    traverse_expr(parameter, visitor, recaller)?;
                }
            }
            StreamSource::Subquery(subquery) => recaller(subquery.as_mut())?,
        }
        for view in stream.views.iter_mut() {
            for parameter in view.parameters.iter_mut() {
                traverse_expr(parameter, visitor, recaller)?;
            }
        }
    }

    for item in statement.select.iter_mut() {
        if let SelectItem::Expression { expr, .. } = item {
            traverse_expr(expr, visitor, recaller)?;
        }
    }
    if let Some(where_clause) = statement.where_clause.as_mut() {
        traverse_expr(where_clause, visitor, recaller)?;
    }
    for expr in statement.group_by.iter_mut() {
        traverse_expr(expr, visitor, recaller)?;
    }
    for item in statement.order_by.iter_mut() {
        traverse_expr(&mut item.expr, visitor, recaller)?;
    }
    if let Some(having) = statement.having.as_mut() {
        traverse_expr(having, visitor, recaller)?;
    }
    Ok(())
}

fn traverse_filter<V, R>(filter: &mut EventFilter, visitor: &mut V, recaller: &mut R) -> QueryResult<()>
where
    V: FnMut(NodeMut<'_>) -> QueryResult<()>,
    R: FnMut(&mut SelectStatement) -> QueryResult<()>,
{
    visitor(NodeMut::Filter(&mut *filter))?;
    if let Some(expr) = filter.filter.as_mut() {
        traverse_expr(expr, visitor, recaller)?;
    }
    Ok(())
}

fn traverse_pattern<V, R>(pattern: &mut PatternExpr, visitor: &mut V, recaller: &mut R) -> QueryResult<()>
where
    V: FnMut(NodeMut<'_>) -> QueryResult<()>,
    R: FnMut(&mut SelectStatement) -> QueryResult<()>,
{
    visitor(NodeMut::Pattern(&mut *pattern))?;
    match pattern {
        PatternExpr::Filter { filter, .. } => traverse_filter(filter, visitor, recaller),
        PatternExpr::Every(inner) | PatternExpr::Not(inner) => {
            traverse_pattern(inner, visitor, recaller)
        }
        PatternExpr::FollowedBy(items) | PatternExpr::And(items) | PatternExpr::Or(items) => {
            for item in items.iter_mut() {
                traverse_pattern(item, visitor, recaller)?;
            }
            Ok(())
        }
    }
}

fn traverse_expr<V, R>(expr: &mut Expr, visitor: &mut V, recaller: &mut R) -> QueryResult<()>
where
    V: FnMut(NodeMut<'_>) -> QueryResult<()>,
    R: FnMut(&mut SelectStatement) -> QueryResult<()>,
{
    visitor(NodeMut::Expression(&mut *expr))?;

    match expr {
        Expr::Subquery(subquery) | Expr::Exists(subquery) => recaller(subquery.as_mut())?,
        Expr::InSubquery { subquery, .. } => recaller(subquery.as_mut())?,
        _ => {}
    }

    for child in expr.children_mut() {
        traverse_expr(child, visitor, recaller)?;
    }

    if let Expr::Chain(links) = expr {
        for link in links.iter_mut() {
            visitor(NodeMut::ChainLink(&mut *link))?;
            if let Some(parameters) = link.parameters.as_mut() {
                for parameter in parameters.iter_mut() {
                    traverse_expr(parameter, visitor, recaller)?;
                }
            }
        }
    }
    Ok(())
}
