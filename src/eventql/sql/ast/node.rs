//! Read-only node handles over a parsed statement.
//!
//! [`AstNode`] gives every part of the tree a uniform face so that analysis can ask
//! semantic questions ("every stream below here", "every subquery below here")
//! without caring about the concrete node shape.

use super::{Expr, PatternExpr, SelectItem, SelectStatement, Stream, StreamSource, View};

/// Semantic node categories recognised by [`AstNode::collect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Root statement of a query
    Statement,
    /// A FROM-clause stream
    Stream,
    /// A nested statement (scalar, `IN`, `EXISTS` or derived-stream sub-select)
    Subquery,
    /// An entry of a selection list
    Selection,
    /// Any expression
    Expression,
    /// A pattern expression inside `PATTERN [ ... ]`
    Pattern,
    /// A view attached to a stream
    View,
}

/// Borrowed handle over one node of a parsed statement.
#[derive(Debug, Clone, Copy)]
pub enum AstNode<'a> {
    Statement(&'a SelectStatement),
    Stream(&'a Stream),
    Subquery(&'a SelectStatement),
    Selection(&'a SelectItem),
    Expression(&'a Expr),
    Pattern(&'a PatternExpr),
    View(&'a View),
}

impl<'a> AstNode<'a> {
    pub fn kind(&self) -> NodeKind {
        match self {
            AstNode::Statement(_) => NodeKind::Statement,
            AstNode::Stream(_) => NodeKind::Stream,
            AstNode::Subquery(_) => NodeKind::Subquery,
            AstNode::Selection(_) => NodeKind::Selection,
            AstNode::Expression(_) => NodeKind::Expression,
            AstNode::Pattern(_) => NodeKind::Pattern,
            AstNode::View(_) => NodeKind::View,
        }
    }

    /// Immediate children of this node.
    pub fn children(&self) -> Vec<AstNode<'a>> {
        match *self {
            AstNode::Statement(statement) | AstNode::Subquery(statement) => {
                statement_children(statement)
            }
            AstNode::Stream(stream) => {
                let mut children = Vec::new();
                match &stream.source {
                    StreamSource::Filter(filter) => {
                        children.extend(filter.filter.iter().map(AstNode::Expression));
                    }
                    StreamSource::Pattern(pattern) => children.push(AstNode::Pattern(pattern)),
                    StreamSource::Method { parameters, .. } => {
                        children.extend(parameters.iter().map(AstNode::Expression));
                    }
                    StreamSource::Subquery(statement) => {
                        children.push(AstNode::Subquery(statement))
                    }
                }
                children.extend(stream.views.iter().map(AstNode::View));
                children
            }
            AstNode::Selection(item) => match item {
                SelectItem::Wildcard => Vec::new(),
                SelectItem::Expression { expr, .. } => vec![AstNode::Expression(expr)],
            },
            AstNode::Expression(expr) => {
                let mut children: Vec<AstNode<'a>> =
                    expr.children().into_iter().map(AstNode::Expression).collect();
                if let Expr::Chain(links) = expr {
                    for link in links {
                        if let Some(parameters) = &link.parameters {
                            children.extend(parameters.iter().map(AstNode::Expression));
                        }
                    }
                }
                if let Some(statement) = expr.subquery() {
                    children.push(AstNode::Subquery(statement));
                }
                children
            }
            AstNode::Pattern(pattern) => match pattern {
                PatternExpr::Filter { filter, .. } => {
                    filter.filter.iter().map(AstNode::Expression).collect()
                }
                _ => pattern.children().into_iter().map(AstNode::Pattern).collect(),
            },
            AstNode::View(view) => view.parameters.iter().map(AstNode::Expression).collect(),
        }
    }

    /// Every descendant of the given kind, at any depth, including nodes inside
    /// nested subqueries. The node itself is not included.
    pub fn collect(&self, kind: NodeKind) -> Vec<AstNode<'a>> {
        let mut found = Vec::new();
        for child in self.children() {
            child.gather(kind, true, &mut found);
        }
        found
    }

    /// Descendants of the given kind that belong to this node's own scope.
    ///
    /// Subquery nodes directly below the scope are reported (when `kind` is
    /// [`NodeKind::Subquery`]) but never descended into.
    pub fn collect_in_scope(&self, kind: NodeKind) -> Vec<AstNode<'a>> {
        let mut found = Vec::new();
        for child in self.children() {
            child.gather(kind, false, &mut found);
        }
        found
    }

    fn gather(&self, kind: NodeKind, cross_subqueries: bool, found: &mut Vec<AstNode<'a>>) {
        if self.kind() == kind {
            found.push(*self);
        }
        if !cross_subqueries && self.kind() == NodeKind::Subquery {
            return;
        }
        for child in self.children() {
            child.gather(kind, cross_subqueries, found);
        }
    }

    /// The statement this node scopes, for statement and subquery nodes.
    pub fn statement(&self) -> Option<&'a SelectStatement> {
        match *self {
            AstNode::Statement(statement) | AstNode::Subquery(statement) => Some(statement),
            _ => None,
        }
    }
}

fn statement_children(statement: &SelectStatement) -> Vec<AstNode<'_>> {
    let mut children: Vec<AstNode<'_>> = statement.select.iter().map(AstNode::Selection).collect();
    children.extend(statement.from.iter().map(AstNode::Stream));
    children.extend(statement.where_clause.iter().map(AstNode::Expression));
    children.extend(statement.group_by.iter().map(AstNode::Expression));
    children.extend(statement.having.iter().map(AstNode::Expression));
    children.extend(statement.order_by.iter().map(|item| AstNode::Expression(&item.expr)));
    children
}
