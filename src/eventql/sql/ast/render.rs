//! Rendering of the syntax tree back to query text.
//!
//! Output is canonical (upper-case keywords, single spaces) and parses back to an
//! equal tree. Composite patterns nested inside other patterns are parenthesized.

use super::*;
use std::fmt;

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for SelectStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT ")?;
        if self.distinct {
            write!(f, "DISTINCT ")?;
        }
        write_list(f, &self.select)?;
        write!(f, " FROM ")?;
        write_list(f, &self.from)?;
        if let Some(where_clause) = &self.where_clause {
            write!(f, " WHERE {}", where_clause)?;
        }
        if !self.group_by.is_empty() {
            write!(f, " GROUP BY ")?;
            write_list(f, &self.group_by)?;
        }
        if let Some(having) = &self.having {
            write!(f, " HAVING {}", having)?;
        }
        if !self.order_by.is_empty() {
            write!(f, " ORDER BY ")?;
            write_list(f, &self.order_by)?;
        }
        Ok(())
    }
}

impl fmt::Display for SelectItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectItem::Wildcard => write!(f, "*"),
            SelectItem::Expression { expr, alias } => {
                write!(f, "{}", expr)?;
                if let Some(alias) = alias {
                    write!(f, " AS {}", alias)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)?;
        for view in &self.views {
            write!(f, ".{}", view)?;
        }
        if let Some(alias) = &self.alias {
            write!(f, " AS {}", alias)?;
        }
        Ok(())
    }
}

impl fmt::Display for StreamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamSource::Filter(filter) => write!(f, "{}", filter),
            StreamSource::Pattern(pattern) => write!(f, "PATTERN [{}]", pattern),
            StreamSource::Method {
                class_name,
                method_name,
                parameters,
            } => {
                write!(f, "METHOD:{}.{}(", class_name, method_name)?;
                write_list(f, parameters)?;
                write!(f, ")")
            }
            StreamSource::Subquery(statement) => write!(f, "({})", statement),
        }
    }
}

impl fmt::Display for EventFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.event_type_name)?;
        if let Some(filter) = &self.filter {
            write!(f, "({})", filter)?;
        }
        Ok(())
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}(", self.namespace, self.name)?;
        write_list(f, &self.parameters)?;
        write!(f, ")")
    }
}

impl PatternExpr {
    fn is_composite(&self) -> bool {
        matches!(
            self,
            PatternExpr::FollowedBy(_) | PatternExpr::And(_) | PatternExpr::Or(_)
        )
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_composite() {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }

    fn fmt_joined(
        f: &mut fmt::Formatter<'_>,
        items: &[PatternExpr],
        separator: &str,
    ) -> fmt::Result {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", separator)?;
            }
            item.fmt_operand(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for PatternExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternExpr::Filter { tag, filter } => {
                if let Some(tag) = tag {
                    write!(f, "{}=", tag)?;
                }
                write!(f, "{}", filter)
            }
            PatternExpr::Every(inner) => {
                write!(f, "EVERY ")?;
                inner.fmt_operand(f)
            }
            PatternExpr::Not(inner) => {
                write!(f, "NOT ")?;
                inner.fmt_operand(f)
            }
            PatternExpr::FollowedBy(items) => PatternExpr::fmt_joined(f, items, " -> "),
            PatternExpr::And(items) => PatternExpr::fmt_joined(f, items, " AND "),
            PatternExpr::Or(items) => PatternExpr::fmt_joined(f, items, " OR "),
        }
    }
}

impl fmt::Display for OrderByItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)?;
        if self.descending {
            write!(f, " DESC")?;
        }
        Ok(())
    }
}

impl fmt::Display for ChainLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(parameters) = &self.parameters {
            write!(f, "(")?;
            write_list(f, parameters)?;
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{}", n),
            Literal::String(s) if s.contains('\'') => write!(f, "\"{}\"", s),
            Literal::String(s) => write!(f, "'{}'", s),
            Literal::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Literal::Null => write!(f, "NULL"),
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Concat => "||",
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::And => "AND",
            BinaryOperator::Or => "OR",
        };
        write!(f, "{}", symbol)
    }
}

fn not_prefix(negated: bool) -> &'static str {
    if negated {
        "NOT "
    } else {
        ""
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Property(name) => write!(f, "{}", name),
            Expr::Chain(links) => {
                for (i, link) in links.iter().enumerate() {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    write!(f, "{}", link)?;
                }
                Ok(())
            }
            Expr::Function {
                name,
                distinct,
                args,
            } => {
                write!(f, "{}(", name)?;
                if *distinct {
                    write!(f, "DISTINCT ")?;
                }
                write_list(f, args)?;
                write!(f, ")")
            }
            Expr::Literal(literal) => write!(f, "{}", literal),
            Expr::TimePeriod { value, unit } => write!(f, "{} {}", value, unit),
            Expr::Wildcard => write!(f, "*"),
            Expr::BinaryOp { left, op, right } => write!(f, "{} {} {}", left, op, right),
            Expr::UnaryOp {
                op: UnaryOperator::Not,
                expr,
            } => write!(f, "NOT {}", expr),
            Expr::UnaryOp {
                op: UnaryOperator::Minus,
                expr,
            } => match expr.as_ref() {
                // "--" would start a comment
                Expr::UnaryOp {
                    op: UnaryOperator::Minus,
                    ..
                } => write!(f, "- {}", expr),
                _ => write!(f, "-{}", expr),
            },
            Expr::IsNull { expr, negated } => {
                write!(f, "{} IS {}NULL", expr, not_prefix(*negated))
            }
            Expr::InList {
                expr,
                list,
                negated,
            } => {
                write!(f, "{} {}IN (", expr, not_prefix(*negated))?;
                write_list(f, list)?;
                write!(f, ")")
            }
            Expr::InSubquery {
                expr,
                subquery,
                negated,
            } => write!(f, "{} {}IN ({})", expr, not_prefix(*negated), subquery),
            Expr::Between {
                expr,
                low,
                high,
                negated,
            } => write!(
                f,
                "{} {}BETWEEN {} AND {}",
                expr,
                not_prefix(*negated),
                low,
                high
            ),
            Expr::Like {
                expr,
                pattern,
                negated,
            } => write!(f, "{} {}LIKE {}", expr, not_prefix(*negated), pattern),
            Expr::Case {
                operand,
                when_then,
                else_result,
            } => {
                write!(f, "CASE")?;
                if let Some(operand) = operand {
                    write!(f, " {}", operand)?;
                }
                for (when, then) in when_then {
                    write!(f, " WHEN {} THEN {}", when, then)?;
                }
                if let Some(else_result) = else_result {
                    write!(f, " ELSE {}", else_result)?;
                }
                write!(f, " END")
            }
            Expr::Subquery(statement) => write!(f, "({})", statement),
            Expr::Exists(statement) => write!(f, "EXISTS ({})", statement),
            Expr::Nested(expr) => write!(f, "({})", expr),
        }
    }
}
