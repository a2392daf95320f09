// Tests for rewriting logical target and field names into physical ones
use crate::unit::common::*;

#[test]
fn test_target_and_view_rewrite() {
    assert_eq!(
        rewritten(
            "SELECT count(*) AS cnt FROM TestTable.win:time_batch(10 sec) WHERE path = '/' AND size > 100 AND param.length() > 0",
            &[("TestTable", "T1")],
        )
        .unwrap(),
        "SELECT count(*) AS cnt FROM T1.win:time_batch(10 sec) WHERE path = '/' AND size > 100 AND param.length() > 0"
    );
}

#[test]
fn test_qualified_field_is_mapped_and_escaped() {
    assert_eq!(
        rewritten("select T.a.b from T", &[("T", "X")]).unwrap(),
        "SELECT X.a$b FROM X"
    );
}

#[test]
fn test_method_suffix_is_kept_verbatim() {
    assert_eq!(
        rewritten("select a.b.length() from T", &[("T", "X")]).unwrap(),
        "SELECT a$b.length() FROM X"
    );
    assert_eq!(
        rewritten(
            "select opts.num.$0.length(), T.text.substr(0, 2).trim() from T",
            &[("T", "X")]
        )
        .unwrap(),
        "SELECT opts$num$$0.length(), X.text.substr(0, 2).trim() FROM X"
    );
}

#[test]
fn test_container_fields_in_filters() {
    assert_eq!(
        rewritten(
            "select count(*) from Events(user.age > 20 and tags.$0 = 'x')",
            &[("Events", "E_0001")]
        )
        .unwrap(),
        "SELECT count(*) FROM E_0001(user$age > 20 AND tags$$0 = 'x')"
    );
}

#[test]
fn test_alias_qualifier_is_kept() {
    assert_eq!(
        rewritten(
            "select o.user.name, Orders.amount from Orders as o",
            &[("Orders", "O1")]
        )
        .unwrap(),
        "SELECT o.user$name, O1.amount FROM O1 AS o"
    );
}

#[test]
fn test_pattern_targets() {
    assert_eq!(
        rewritten(
            "select a.user, b.amount from pattern [every a=Login -> b=Purchase(amount > 100)]",
            &[("Login", "L1"), ("Purchase", "P1")]
        )
        .unwrap(),
        "SELECT a.user, b.amount FROM PATTERN [EVERY a=L1 -> b=P1(amount > 100)]"
    );
}

#[test]
fn test_correlated_subquery() {
    let expression = "SELECT * FROM RfidEvent AS RFID \
        WHERE 'Dock 1' = (SELECT name FROM Zones.std:unique(zoneName) WHERE zoneId = RFID.zone.id)";
    assert_eq!(
        rewritten(expression, &[("RfidEvent", "R1"), ("Zones", "Z1")]).unwrap(),
        "SELECT * FROM R1 AS RFID \
         WHERE 'Dock 1' = (SELECT name FROM Z1.std:unique(zoneName) WHERE zoneId = RFID.zone$id)"
    );
}

#[test]
fn test_subquery_inside_subquery() {
    let expression = "select a from A where exists \
        (select b from B where c.d in (select A.e from C as c))";
    let names = mapping(&[("A", "X"), ("B", "Y"), ("C", "Z")]);
    let mut model = EventQueryParser::new().compile(expression).unwrap();

    QueryRewriter::new(&names)
        .rewrite_event_type_names(&mut model)
        .unwrap();
    assert_eq!(
        model.to_epl(),
        "SELECT a FROM X WHERE EXISTS (SELECT b FROM Y WHERE c.d IN (SELECT A.e FROM Z AS c))"
    );

    QueryRewriter::new(&names)
        .rewrite_field_names(&mut model)
        .unwrap();
    assert_eq!(
        model.to_epl(),
        "SELECT a FROM X WHERE EXISTS (SELECT b FROM Y WHERE c.d IN (SELECT X.e FROM Z AS c))"
    );
}

#[test]
fn test_derived_stream() {
    assert_eq!(
        rewritten(
            "select r.v from (select max(v.n) as v from A) as r",
            &[("A", "X")]
        )
        .unwrap(),
        "SELECT r.v FROM (SELECT max(v$n) AS v FROM X) AS r"
    );
}

#[test]
fn test_undetermined_target_is_a_query_error() {
    let err = rewritten("select a.b from A, B", &[("A", "X"), ("B", "Y")]).unwrap_err();
    assert_eq!(
        err,
        QueryError::query_error("target cannot be determined for field 'a.b'")
    );
    assert!(err.is_client_facing());
}

#[test]
fn test_missing_mapping_is_an_internal_fault() {
    let err = rewritten("select a from A, B", &[("A", "X")]).unwrap_err();
    assert!(matches!(err, QueryError::Internal { .. }));
    assert!(!err.is_client_facing());
    assert_eq!(err.message(), "target missing in mapping, maybe BUG: B");

    let err = rewritten(
        "select a from A where a in (select b from B)",
        &[("A", "X")],
    )
    .unwrap_err();
    assert!(matches!(err, QueryError::Internal { .. }));
}

#[test]
fn test_type_pass_alone() {
    init_logging();
    let mut model = EventQueryParser::new()
        .compile("select T.a.b from T")
        .unwrap();
    let names = mapping(&[("T", "X")]);

    QueryRewriter::new(&names)
        .rewrite_event_type_names(&mut model)
        .unwrap();
    assert_eq!(model.to_epl(), "SELECT T.a.b FROM X");

    QueryRewriter::new(&names)
        .rewrite_field_names(&mut model)
        .unwrap();
    assert_eq!(model.to_epl(), "SELECT X.a$b FROM X");
}

#[test]
fn test_rewritten_statement_parses_again() {
    let text = rewritten(
        "select user.name, count(*) from Events(kind = 'x').win:time(1 min) group by user.name",
        &[("Events", "E1")],
    )
    .unwrap();
    assert_eq!(
        text,
        "SELECT user$name, count(*) FROM E1(kind = 'x').win:time(1 min) GROUP BY user$name"
    );
    assert!(EventQueryParser::new().parse(&text).is_ok());
}
