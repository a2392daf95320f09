// Tests for rendering statements back to canonical query text
use crate::unit::common::*;

fn render(text: &str) -> String {
    EventQueryParser::new()
        .compile(text)
        .unwrap_or_else(|e| panic!("failed to compile '{}': {}", text, e))
        .to_epl()
}

/// Render, parse the rendering again and require an equal tree.
fn assert_stable(text: &str) {
    let parser = EventQueryParser::new();
    let first = parser.parse(text).unwrap();
    let rendered = first.to_string();
    let second = parser
        .parse(&rendered)
        .unwrap_or_else(|e| panic!("rendering '{}' does not parse: {}", rendered, e));
    assert_eq!(first, second, "rendering changed the tree: {}", rendered);
}

#[test]
fn test_canonical_keywords_and_spacing() {
    assert_eq!(
        render("select   count(*)  as cnt from access_log.win:time_batch(10 sec)  where path='/' and size>100"),
        "SELECT count(*) AS cnt FROM access_log.win:time_batch(10 sec) WHERE path = '/' AND size > 100"
    );
}

#[test]
fn test_stream_aliases_render_with_as() {
    assert_eq!(
        render("select o.amount from Orders(amount > 10) o"),
        "SELECT o.amount FROM Orders(amount > 10) AS o"
    );
}

#[test]
fn test_pattern_rendering() {
    assert_eq!(
        render("select a.user from pattern [every a=Login -> b=Purchase(amount > 100)]"),
        "SELECT a.user FROM PATTERN [EVERY a=Login -> b=Purchase(amount > 100)]"
    );
    assert_eq!(
        render("select * from pattern [every (a=A -> b=B)]"),
        "SELECT * FROM PATTERN [EVERY (a=A -> b=B)]"
    );
}

#[test]
fn test_operators_render_canonically() {
    assert_eq!(
        render("select * from T where a <> 1 and b != 2"),
        "SELECT * FROM T WHERE a != 1 AND b != 2"
    );
    assert_eq!(render("select - -x from T"), "SELECT - -x FROM T");
}

#[test]
fn test_string_quoting() {
    assert_eq!(
        render("select * from T where name = \"it's\" and kind = 'plain'"),
        "SELECT * FROM T WHERE name = \"it's\" AND kind = 'plain'"
    );
}

#[test]
fn test_rendering_is_stable() {
    for text in [
        "SELECT DISTINCT a, b AS bee FROM T WHERE (a + 1) * 2 > b GROUP BY a HAVING count(*) > 1 ORDER BY a DESC, b",
        "SELECT * FROM RfidEvent AS RFID WHERE 'Dock 1' = (SELECT name FROM Zones.std:unique(zoneName) WHERE zoneId = RFID.zoneId)",
        "SELECT * FROM PATTERN [(a=A OR b=B) -> NOT c=C AND d=D]",
        "SELECT x.y FROM METHOD:com.example.Lookup.fetch(user, 'k') AS x",
        "SELECT r.v FROM (SELECT max(v) AS v FROM A) AS r",
        "SELECT CASE kind WHEN 1 THEN 'one' ELSE 'many' END FROM T WHERE a NOT BETWEEN 1 AND 2",
        "SELECT opts.num.$0.length(), path.substr(0, 2).trim() FROM T WHERE x IS NOT NULL",
        "SELECT a FROM T WHERE NOT EXISTS (SELECT b FROM B) AND a NOT IN (SELECT c FROM C)",
        "SELECT a || b FROM T WHERE c LIKE 'x%' AND d IN (1, 2.5, -3)",
    ] {
        assert_stable(text);
    }
}
