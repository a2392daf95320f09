// Tests for the event query parser: stream shapes, expressions and error reporting
use crate::unit::common::*;
use eventql::eventql::sql::ast::{
    BinaryOperator, ChainLink, EventFilter, Expr, Literal, PatternExpr, SelectItem, StreamSource,
};

fn parse(text: &str) -> SelectStatement {
    EventQueryParser::new()
        .parse(text)
        .unwrap_or_else(|e| panic!("failed to parse '{}': {}", text, e))
}

fn selection(statement: &SelectStatement, index: usize) -> &Expr {
    match &statement.select[index] {
        SelectItem::Expression { expr, .. } => expr,
        SelectItem::Wildcard => panic!("selection {} is a wildcard", index),
    }
}

#[test]
fn test_event_filter_with_view_and_alias() {
    let statement = parse(
        "SELECT count(*) AS cnt FROM access_log.win:time_batch(10 sec) WHERE path = '/' AND size > 100",
    );

    assert_eq!(statement.select[0].alias(), Some("cnt"));
    assert_eq!(
        selection(&statement, 0),
        &Expr::Function {
            name: "count".to_string(),
            distinct: false,
            args: vec![Expr::Wildcard],
        }
    );

    let stream = &statement.from[0];
    assert_eq!(
        stream.source,
        StreamSource::Filter(EventFilter {
            event_type_name: "access_log".to_string(),
            filter: None,
        })
    );
    assert_eq!(stream.views.len(), 1);
    assert_eq!(stream.views[0].namespace, "win");
    assert_eq!(stream.views[0].name, "time_batch");
    assert_eq!(
        stream.views[0].parameters,
        vec![Expr::TimePeriod {
            value: "10".to_string(),
            unit: "sec".to_string(),
        }]
    );
    assert!(matches!(
        statement.where_clause,
        Some(Expr::BinaryOp {
            op: BinaryOperator::And,
            ..
        })
    ));
}

#[test]
fn test_stream_alias_without_as() {
    let statement = parse("select o.amount from Orders(amount > 10) o");
    let stream = &statement.from[0];
    assert_eq!(stream.alias.as_deref(), Some("o"));
    assert_eq!(stream.targets(), vec!["Orders"]);
    assert_eq!(stream.aliases(), vec![("o", Some("Orders"))]);
}

#[test]
fn test_pattern_stream() {
    let statement = parse("SELECT a.user FROM PATTERN [EVERY a=Login -> b=Purchase(amount > 100)]");
    let StreamSource::Pattern(pattern) = &statement.from[0].source else {
        panic!("expected a pattern stream");
    };

    let PatternExpr::FollowedBy(items) = pattern else {
        panic!("expected a followed-by pattern, got {:?}", pattern);
    };
    assert_eq!(items.len(), 2);
    assert!(matches!(&items[0], PatternExpr::Every(inner)
        if matches!(inner.as_ref(), PatternExpr::Filter { tag: Some(tag), .. } if tag == "a")));

    assert_eq!(statement.from[0].targets(), vec!["Login", "Purchase"]);
    assert_eq!(
        statement.from[0].aliases(),
        vec![("a", Some("Login")), ("b", Some("Purchase"))]
    );
}

#[test]
fn test_method_invocation_stream() {
    let statement = parse("select * from METHOD:com.example.Lookup.fetch(user, 3) as lookup");
    let stream = &statement.from[0];
    assert_eq!(
        stream.source,
        StreamSource::Method {
            class_name: "com.example.Lookup".to_string(),
            method_name: "fetch".to_string(),
            parameters: vec![
                Expr::Property("user".to_string()),
                Expr::Literal(Literal::Number("3".to_string())),
            ],
        }
    );
    assert!(stream.targets().is_empty());
    assert_eq!(stream.aliases(), vec![("lookup", None)]);
}

#[test]
fn test_derived_stream() {
    let statement = parse("select r.user from (select user from A) as r");
    let stream = &statement.from[0];
    assert!(matches!(stream.source, StreamSource::Subquery(_)));
    assert!(stream.targets().is_empty());
    assert_eq!(stream.aliases(), vec![("r", None)]);
}

#[test]
fn test_subquery_expressions() {
    let statement = parse(
        "select a, (select max(b) from B) as top from A \
         where a in (select c from C) and not exists (select d from D)",
    );
    let root = AstNode::Statement(&statement);
    assert_eq!(root.collect(NodeKind::Subquery).len(), 3);
    assert_eq!(root.collect(NodeKind::Stream).len(), 4);
    assert!(matches!(selection(&statement, 1), Expr::Subquery(_)));
}

#[test]
fn test_container_fields_and_method_chains() {
    let statement = parse("select field.key1.$0, opts.num.$0.length(), path.substr(0, 2).trim() from T");

    assert_eq!(
        selection(&statement, 0),
        &Expr::Property("field.key1.$0".to_string())
    );
    assert_eq!(
        selection(&statement, 1),
        &Expr::Chain(vec![
            ChainLink {
                name: "opts.num.$0".to_string(),
                parameters: None,
            },
            ChainLink {
                name: "length".to_string(),
                parameters: Some(vec![]),
            },
        ])
    );
    assert_eq!(selection(&statement, 2).field_path(), Some("path"));
}

#[test]
fn test_numeric_segments_are_path_segments() {
    let statement = parse("select data.0, data.1.name from T");
    assert_eq!(selection(&statement, 0), &Expr::Property("data.0".to_string()));
    assert_eq!(
        selection(&statement, 1),
        &Expr::Property("data.1.name".to_string())
    );
}

#[test]
fn test_predicates() {
    let statement = parse(
        "SELECT CASE WHEN a > 1 THEN 'x' ELSE 'y' END FROM T \
         WHERE b BETWEEN 1 AND 5 AND c NOT LIKE 'x%' AND d IS NOT NULL AND e NOT IN (1, 2)",
    );
    assert!(matches!(selection(&statement, 0), Expr::Case { .. }));

    let mut kinds = Vec::new();
    let mut current = statement.where_clause.as_ref().unwrap();
    while let Expr::BinaryOp {
        left,
        op: BinaryOperator::And,
        right,
    } = current
    {
        kinds.push(right.as_ref().clone());
        current = left.as_ref();
    }
    kinds.push(current.clone());
    kinds.reverse();

    assert!(matches!(kinds[0], Expr::Between { negated: false, .. }));
    assert!(matches!(kinds[1], Expr::Like { negated: true, .. }));
    assert!(matches!(kinds[2], Expr::IsNull { negated: true, .. }));
    assert!(matches!(kinds[3], Expr::InList { negated: true, .. }));
}

#[test]
fn test_keywords_are_case_insensitive() {
    let upper = parse("SELECT DISTINCT a FROM T WHERE b = TRUE GROUP BY a HAVING count(*) > 1 ORDER BY a DESC");
    let lower = parse("select distinct a from T where b = true group by a having count(*) > 1 order by a desc");
    assert_eq!(upper, lower);
    assert!(upper.distinct);
    assert!(upper.order_by[0].descending);
}

#[test]
fn test_comments_are_ignored() {
    let statement = parse("select a -- trailing comment\nfrom /* inline */ T");
    assert_eq!(statement.from[0].targets(), vec!["T"]);
}

#[test]
fn test_syntax_errors_are_parse_errors() {
    for text in [
        "SELECT FROM T",
        "SELECT a FROM",
        "SELECT a FROM T WHERE name = 'open",
        "SELECT a FROM PATTERN [a=A ->]",
        "SELECT a FROM METHOD:fetch(x)",
        "UPDATE T SET a = 1",
    ] {
        let err = EventQueryParser::new().parse(text).unwrap_err();
        assert!(
            matches!(err, QueryError::Parse { .. }),
            "expected a parse error for '{}', got {:?}",
            text,
            err
        );
    }
}

#[test]
fn test_parse_error_carries_position() {
    let err = EventQueryParser::new()
        .parse("SELECT a FROM T WHERE a = = 1")
        .unwrap_err();
    match err {
        QueryError::Parse { position, .. } => assert_eq!(position, Some(26)),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_deeply_nested_input_is_rejected() {
    let parens = format!(
        "select a from A where {}x = 1{}",
        "(".repeat(2_000),
        ")".repeat(2_000)
    );
    let negations = format!("select a from A where {}x", "not ".repeat(5_000));
    let minuses = format!("select {}a from A", "- ".repeat(5_000));
    let chain = format!("select a from A where x = 0{}", " or x = 1".repeat(5_000));
    let pattern = format!("select * from pattern [{}A]", "every ".repeat(5_000));

    for expression in [parens, negations, minuses, chain, pattern] {
        let err = Query::builder("deep", expression.as_str())
            .build()
            .unwrap()
            .targets()
            .unwrap_err();
        assert!(
            matches!(err, QueryError::Client { .. }),
            "expected a client error, got {:?}",
            err
        );
        assert!(err.message().contains("maximum depth"));
    }
}

#[test]
fn test_moderate_nesting_still_parses() {
    let expression = format!(
        "select a from A where {}x = 1{}",
        "(".repeat(40),
        ")".repeat(40)
    );
    let statement = EventQueryParser::new().parse(&expression).unwrap();
    assert!(statement.where_clause.is_some());
}
