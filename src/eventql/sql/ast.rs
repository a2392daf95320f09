/*!
# Event Query Abstract Syntax Tree (AST)

This module defines the syntax tree produced by the event query parser. The same owned
tree serves two roles:

- **Analysis**: wrapped by read-only [`node::AstNode`] handles, it is explored to find the
  targets, aliases and fields a query references
- **Execution model**: wrapped by [`StatementModel`], it is mutated in place by the
  identifier rewriter and rendered back to text with [`StatementModel::to_epl`]

## Example Queries

```sql
-- Single target with a view and an output alias
SELECT count(*) AS cnt FROM access_log.win:time_batch(10 sec) WHERE path = '/' AND size > 100

-- Aliased target and a correlated subquery
SELECT * FROM RfidEvent AS RFID
WHERE 'Dock 1' = (SELECT name FROM Zones.std:unique(zoneName) WHERE zoneId = RFID.zoneId)

-- Pattern stream with tagged event filters
SELECT a.user, b.amount FROM PATTERN [EVERY a=Login -> b=Purchase(amount > 100)]
```

## Architecture

Every node shape is a plain enum or struct variant; which structural capabilities a node
has (an event type name, a filter, child expressions, call parameters, a chain of links)
is decided by exhaustive matching, never by runtime probing.
*/

pub mod node;
mod render;

/// A parsed `SELECT` statement, at the top level or nested as a subquery.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    /// Whether `SELECT DISTINCT` was requested
    pub distinct: bool,
    /// Selection list
    pub select: Vec<SelectItem>,
    /// Streams in the FROM clause, in declaration order
    pub from: Vec<Stream>,
    /// Optional WHERE clause
    pub where_clause: Option<Expr>,
    /// GROUP BY expressions (empty when absent)
    pub group_by: Vec<Expr>,
    /// Optional HAVING clause
    pub having: Option<Expr>,
    /// ORDER BY items (empty when absent)
    pub order_by: Vec<OrderByItem>,
}

/// One entry of the selection list
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    /// `*`
    Wildcard,
    /// `expr [AS alias]`
    Expression { expr: Expr, alias: Option<String> },
}

impl SelectItem {
    /// Output column name declared with `AS`, if any.
    pub fn alias(&self) -> Option<&str> {
        match self {
            SelectItem::Wildcard => None,
            SelectItem::Expression { alias, .. } => alias.as_deref(),
        }
    }
}

/// A stream declared in the FROM clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    /// Where events of this stream come from
    pub source: StreamSource,
    /// Views attached to the stream (`.win:time(10 sec)`)
    pub views: Vec<View>,
    /// Stream alias (`AS name` or a bare trailing identifier)
    pub alias: Option<String>,
}

/// Source of a FROM-clause stream
#[derive(Debug, Clone, PartialEq)]
pub enum StreamSource {
    /// Named target with an optional filter: `Target(expr)`
    Filter(EventFilter),
    /// `PATTERN [ ... ]`
    Pattern(PatternExpr),
    /// `METHOD:Class.method(params)`
    Method {
        class_name: String,
        method_name: String,
        parameters: Vec<Expr>,
    },
    /// A sub-select used as a derived stream: `(SELECT ...) AS name`
    Subquery(Box<SelectStatement>),
}

/// Reference to an event type, optionally filtered.
#[derive(Debug, Clone, PartialEq)]
pub struct EventFilter {
    /// Target (event type) name; rewritten to the physical type name before execution
    pub event_type_name: String,
    /// Optional filter expression applied to every event of the type
    pub filter: Option<Expr>,
}

/// A view attached to a stream: `namespace:name(parameters)`
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub namespace: String,
    pub name: String,
    pub parameters: Vec<Expr>,
}

/// Pattern expression inside `PATTERN [ ... ]`
#[derive(Debug, Clone, PartialEq)]
pub enum PatternExpr {
    /// `[tag=]Target[(filter)]`
    Filter {
        tag: Option<String>,
        filter: EventFilter,
    },
    /// `EVERY p`
    Every(Box<PatternExpr>),
    /// `NOT p`
    Not(Box<PatternExpr>),
    /// `p -> q -> ...`
    FollowedBy(Vec<PatternExpr>),
    /// `p AND q AND ...`
    And(Vec<PatternExpr>),
    /// `p OR q OR ...`
    Or(Vec<PatternExpr>),
}

impl PatternExpr {
    /// Immediate sub-patterns.
    pub fn children(&self) -> Vec<&PatternExpr> {
        match self {
            PatternExpr::Filter { .. } => Vec::new(),
            PatternExpr::Every(inner) | PatternExpr::Not(inner) => vec![inner.as_ref()],
            PatternExpr::FollowedBy(items) | PatternExpr::And(items) | PatternExpr::Or(items) => {
                items.iter().collect()
            }
        }
    }

    /// Every event filter in this pattern, depth first, with its tag.
    pub fn filters(&self) -> Vec<(Option<&str>, &EventFilter)> {
        match self {
            PatternExpr::Filter { tag, filter } => vec![(tag.as_deref(), filter)],
            _ => self
                .children()
                .into_iter()
                .flat_map(PatternExpr::filters)
                .collect(),
        }
    }
}

/// ORDER BY item
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByItem {
    pub expr: Expr,
    pub descending: bool,
}

/// One link of a method chain: `name` or `name(params)`.
///
/// The first link of a chain may be a dotted property path (`opts.num.$0` in
/// `opts.num.$0.length()`); later links are method invocations.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainLink {
    pub name: String,
    /// `None` for a property access, `Some` (possibly empty) for an invocation
    pub parameters: Option<Vec<Expr>>,
}

/// Expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Dotted property path: `field`, `T.field`, `field.key1.$0`
    Property(String),
    /// Method chain: `path.method(args).other()`
    Chain(Vec<ChainLink>),
    /// Function call: `count(*)`, `max(DISTINCT x)`
    Function {
        name: String,
        distinct: bool,
        args: Vec<Expr>,
    },
    /// Literal value
    Literal(Literal),
    /// Time period literal: `10 sec`
    TimePeriod { value: String, unit: String },
    /// `*` as a function argument
    Wildcard,
    /// Binary operation
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },
    /// Unary operation
    UnaryOp { op: UnaryOperator, expr: Box<Expr> },
    /// `expr IS [NOT] NULL`
    IsNull { expr: Box<Expr>, negated: bool },
    /// `expr [NOT] IN (a, b, ...)`
    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },
    /// `expr [NOT] IN (SELECT ...)`
    InSubquery {
        expr: Box<Expr>,
        subquery: Box<SelectStatement>,
        negated: bool,
    },
    /// `expr [NOT] BETWEEN low AND high`
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        negated: bool,
    },
    /// `expr [NOT] LIKE pattern`
    Like {
        expr: Box<Expr>,
        pattern: Box<Expr>,
        negated: bool,
    },
    /// `CASE [operand] WHEN .. THEN .. [ELSE ..] END`
    Case {
        operand: Option<Box<Expr>>,
        when_then: Vec<(Expr, Expr)>,
        else_result: Option<Box<Expr>>,
    },
    /// Scalar subquery: `(SELECT ...)`
    Subquery(Box<SelectStatement>),
    /// `EXISTS (SELECT ...)`
    Exists(Box<SelectStatement>),
    /// Parenthesized expression
    Nested(Box<Expr>),
}

impl Expr {
    /// Immediate child expressions, excluding chain link parameters and subquery bodies.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Property(_)
            | Expr::Chain(_)
            | Expr::Literal(_)
            | Expr::TimePeriod { .. }
            | Expr::Wildcard
            | Expr::Subquery(_)
            | Expr::Exists(_) => Vec::new(),
            Expr::Function { args, .. } => args.iter().collect(),
            Expr::BinaryOp { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            Expr::UnaryOp { expr, .. }
            | Expr::IsNull { expr, .. }
            | Expr::InSubquery { expr, .. }
            | Expr::Nested(expr) => vec![expr.as_ref()],
            Expr::InList { expr, list, .. } => {
                let mut children = vec![expr.as_ref()];
                children.extend(list.iter());
                children
            }
            Expr::Between {
                expr, low, high, ..
            } => vec![expr.as_ref(), low.as_ref(), high.as_ref()],
            Expr::Like { expr, pattern, .. } => vec![expr.as_ref(), pattern.as_ref()],
            Expr::Case {
                operand,
                when_then,
                else_result,
            } => {
                let mut children = Vec::new();
                if let Some(operand) = operand {
                    children.push(operand.as_ref());
                }
                for (when, then) in when_then {
                    children.push(when);
                    children.push(then);
                }
                if let Some(else_result) = else_result {
                    children.push(else_result.as_ref());
                }
                children
            }
        }
    }

    /// Mutable counterpart of [`Expr::children`], in the same order.
    pub fn children_mut(&mut self) -> Vec<&mut Expr> {
        match self {
            Expr::Property(_)
            | Expr::Chain(_)
            | Expr::Literal(_)
            | Expr::TimePeriod { .. }
            | Expr::Wildcard
            | Expr::Subquery(_)
            | Expr::Exists(_) => Vec::new(),
            Expr::Function { args, .. } => args.iter_mut().collect(),
            Expr::BinaryOp { left, right, .. } => vec![left.as_mut(), right.as_mut()],
            Expr::UnaryOp { expr, .. }
            | Expr::IsNull { expr, .. }
            | Expr::InSubquery { expr, .. }
            | Expr::Nested(expr) => vec![expr.as_mut()],
            Expr::InList { expr, list, .. } => {
                let mut children = vec![expr.as_mut()];
                children.extend(list.iter_mut());
                children
            }
            Expr::Between {
                expr, low, high, ..
            } => vec![expr.as_mut(), low.as_mut(), high.as_mut()],
            Expr::Like { expr, pattern, .. } => vec![expr.as_mut(), pattern.as_mut()],
            Expr::Case {
                operand,
                when_then,
                else_result,
            } => {
                let mut children = Vec::new();
                if let Some(operand) = operand {
                    children.push(operand.as_mut());
                }
                for (when, then) in when_then.iter_mut() {
                    children.push(when);
                    children.push(then);
                }
                if let Some(else_result) = else_result {
                    children.push(else_result.as_mut());
                }
                children
            }
        }
    }

    /// Subquery embedded directly in this expression, if any.
    pub fn subquery(&self) -> Option<&SelectStatement> {
        match self {
            Expr::Subquery(statement)
            | Expr::Exists(statement)
            | Expr::InSubquery {
                subquery: statement,
                ..
            } => Some(statement.as_ref()),
            _ => None,
        }
    }

    /// The dotted path this expression reads as a field, if it is a field reference.
    ///
    /// Plain properties read their whole path; a method chain reads the property path
    /// of its first link when that link is not itself an invocation.
    pub fn field_path(&self) -> Option<&str> {
        match self {
            Expr::Property(name) => Some(name),
            Expr::Chain(links) => links
                .first()
                .filter(|link| link.parameters.is_none())
                .map(|link| link.name.as_str()),
            _ => None,
        }
    }
}

/// Literal values
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Numeric literal, kept as written
    Number(String),
    String(String),
    Boolean(bool),
    Null,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Concat,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    And,
    Or,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
    Minus,
}

impl Stream {
    /// Target names this stream declares.
    ///
    /// Method-invocation and derived (sub-select) streams declare none: the targets of a
    /// derived stream belong to the subquery's own scope.
    pub fn targets(&self) -> Vec<&str> {
        match &self.source {
            StreamSource::Filter(filter) => vec![filter.event_type_name.as_str()],
            StreamSource::Pattern(pattern) => pattern
                .filters()
                .into_iter()
                .map(|(_, filter)| filter.event_type_name.as_str())
                .collect(),
            StreamSource::Method { .. } | StreamSource::Subquery(_) => Vec::new(),
        }
    }

    /// Alias declarations of this stream as `(alias, target)` pairs.
    ///
    /// The target is `None` when the alias names a derived stream (sub-select, method
    /// invocation, or a multi-target pattern) rather than a single raw target.
    pub fn aliases(&self) -> Vec<(&str, Option<&str>)> {
        let mut aliases = Vec::new();
        if let StreamSource::Pattern(pattern) = &self.source {
            for (tag, filter) in pattern.filters() {
                if let Some(tag) = tag {
                    aliases.push((tag, Some(filter.event_type_name.as_str())));
                }
            }
        }
        if let Some(alias) = &self.alias {
            let targets = self.targets();
            let target = match (&self.source, targets.as_slice()) {
                (StreamSource::Filter(_), [target]) | (StreamSource::Pattern(_), [target]) => {
                    Some(*target)
                }
                _ => None,
            };
            aliases.push((alias.as_str(), target));
        }
        aliases
    }
}

/// The compiled form of a statement: the representation the identifier rewriter
/// mutates and the execution runtime consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementModel {
    statement: SelectStatement,
}

impl StatementModel {
    pub fn new(statement: SelectStatement) -> Self {
        Self { statement }
    }

    pub fn statement(&self) -> &SelectStatement {
        &self.statement
    }

    pub fn statement_mut(&mut self) -> &mut SelectStatement {
        &mut self.statement
    }

    pub fn into_statement(self) -> SelectStatement {
        self.statement
    }

    /// Render the statement back to query text.
    pub fn to_epl(&self) -> String {
        self.statement.to_string()
    }
}

impl From<SelectStatement> for StatementModel {
    fn from(statement: SelectStatement) -> Self {
        Self::new(statement)
    }
}
