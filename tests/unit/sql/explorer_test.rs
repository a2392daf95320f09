// Tests for attributing field references to targets
use crate::unit::common::*;

#[test]
fn test_single_target_takes_unqualified_fields() {
    let query = query("select field2, field1 from TargetA where field1 > 10");

    assert_eq!(
        fields_of(&query, FieldScope::Target("TargetA")),
        strings(&["field1", "field2"])
    );
    assert_eq!(fields_of(&query, FieldScope::All), strings(&["field1", "field2"]));
    assert!(fields_of(&query, FieldScope::Unknown).is_empty());
}

#[test]
fn test_alias_resolves_to_its_target() {
    let query = query("select o.amount, o.user from Orders as o where o.amount > 100");

    assert_eq!(
        fields_of(&query, FieldScope::Target("Orders")),
        strings(&["amount", "user"])
    );
    assert!(query.field_map().unwrap().target("o").is_none());
}

#[test]
fn test_target_name_as_qualifier() {
    let query = query("select Orders.amount from Orders");
    assert_eq!(
        fields_of(&query, FieldScope::Target("Orders")),
        strings(&["amount"])
    );
}

#[test]
fn test_alias_colliding_with_target_is_client_error() {
    for expression in [
        "select x from TargetA as TargetA",
        "select a.x from A as B, B",
        "select x from A as B, B as C",
    ] {
        let query = query(expression);
        let err = query.field_map().unwrap_err();
        assert!(
            matches!(err, QueryError::Client { .. }),
            "expected a client error for '{}', got {:?}",
            expression,
            err
        );
        assert!(err.message().starts_with("Invalid alias"));
    }
}

#[test]
fn test_collision_message_names_the_alias() {
    let err = query("select x from A as B, B").field_map().unwrap_err();
    assert_eq!(err.message(), "Invalid alias 'B', same with target name");
}

#[test]
fn test_two_targets_defer_unqualified_fields() {
    let query = query("select a.x, y from A as a, B");

    assert_eq!(fields_of(&query, FieldScope::Target("A")), strings(&["x"]));
    assert!(fields_of(&query, FieldScope::Target("B")).is_empty());
    assert_eq!(fields_of(&query, FieldScope::All), strings(&["x", "y"]));
    assert_eq!(fields_of(&query, FieldScope::Unknown), strings(&["y"]));
}

#[test]
fn test_filter_fields_belong_to_the_filtered_target() {
    let query = query("select a.x from A(p > 1) as a, B(q = 2)");

    assert_eq!(fields_of(&query, FieldScope::Target("A")), strings(&["p", "x"]));
    assert_eq!(fields_of(&query, FieldScope::Target("B")), strings(&["q"]));
    assert!(fields_of(&query, FieldScope::Unknown).is_empty());
}

#[test]
fn test_output_aliases_are_not_fields() {
    let query = query("select count(*) as cnt, sum(size) as total from access_log group by path order by cnt desc");

    assert_eq!(
        fields_of(&query, FieldScope::Target("access_log")),
        strings(&["path", "size"])
    );
}

#[test]
fn test_nested_and_container_fields() {
    let query = query("select user.name.first, tags.$0, data.1 from Events");

    assert_eq!(
        fields_of(&query, FieldScope::Target("Events")),
        strings(&["data.1", "tags.$0", "user.name.first"])
    );
}

#[test]
fn test_method_invocations_are_not_part_of_fields() {
    let query = query("select path.substr(0, 2), name.length() from A where e.msg.toLowerCase() = 'x'");

    assert_eq!(
        fields_of(&query, FieldScope::Target("A")),
        strings(&["e.msg", "name", "path"])
    );
}

#[test]
fn test_function_arguments_and_view_parameters() {
    let query = query(
        "select max(price), avg(qty * 2) from Trades.win:length(size) where sym = 'x' having count(*) > lim",
    );

    assert_eq!(
        fields_of(&query, FieldScope::Target("Trades")),
        strings(&["lim", "price", "qty", "size", "sym"])
    );
}

#[test]
fn test_pattern_tags_are_aliases() {
    let query = query(
        "select a.user, b.amount from pattern [every a=Login -> b=Purchase(amount > 100)]",
    );

    assert_eq!(query.targets().unwrap(), ["Login", "Purchase"]);
    assert_eq!(query.aliases().unwrap(), ["a", "b"]);
    assert_eq!(fields_of(&query, FieldScope::Target("Login")), strings(&["user"]));
    assert_eq!(
        fields_of(&query, FieldScope::Target("Purchase")),
        strings(&["amount"])
    );
    assert_eq!(fields_of(&query, FieldScope::All), strings(&["amount", "user"]));
    assert!(fields_of(&query, FieldScope::Unknown).is_empty());
}

#[test]
fn test_derived_stream_fields_are_not_recorded() {
    let query = query("select a.x from (select y from B) as a");

    assert_eq!(query.targets().unwrap(), ["B"]);
    assert_eq!(query.aliases().unwrap(), ["a"]);
    assert_eq!(fields_of(&query, FieldScope::Target("B")), strings(&["y"]));
    assert_eq!(fields_of(&query, FieldScope::All), strings(&["y"]));
    assert!(fields_of(&query, FieldScope::Unknown).is_empty());
}

#[test]
fn test_method_stream_alias_is_derived() {
    let query = query("select l.score, e.user from Events as e, METHOD:com.example.Lookup.fetch(e.user) as l");

    assert_eq!(fields_of(&query, FieldScope::Target("Events")), strings(&["user"]));
    assert_eq!(fields_of(&query, FieldScope::All), strings(&["user"]));
}

#[test]
fn test_explore_with_outer_targets() {
    let query = query("select x, Outer.y from A");
    let map = query.explore(&strings(&["Outer"]), &HashMap::new()).unwrap();

    assert_eq!(map.target("A").unwrap(), ["x"]);
    assert_eq!(map.target("Outer").unwrap(), ["y"]);
    assert_eq!(map.target_names().collect::<Vec<_>>(), vec!["A", "Outer"]);
}

#[test]
fn test_alias_override_to_unknown_target_is_client_error() {
    let query = query("select x.f from A");
    let overrides = mapping(&[("x", "Missing")]);

    let err = query.explore(&[], &overrides).unwrap_err();
    assert_eq!(
        err,
        QueryError::client_error("unknown target alias name for: x.f")
    );
}

#[test]
fn test_local_alias_shadows_override() {
    let query = query("select x.f from A as x");
    let overrides = mapping(&[("x", "Missing")]);

    let map = query.explore(&[], &overrides).unwrap();
    assert_eq!(map.target("A").unwrap(), ["f"]);
}

#[test]
fn test_unknown_prefix_is_part_of_the_field_name() {
    let query = query("select nested.key1 from A");
    assert_eq!(
        fields_of(&query, FieldScope::Target("A")),
        strings(&["nested.key1"])
    );
}

#[test]
fn test_field_map_serialization() {
    let query = query("select a.x, y from A as a, B");
    let json = serde_json::to_value(query.field_map().unwrap()).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "targets": {"A": ["x"], "B": []},
            "ALL": ["x", "y"],
            "UNKNOWN": ["y"]
        })
    );
}

#[test]
fn test_target_named_like_a_bucket() {
    let query = query("select UNKNOWN.a, b from UNKNOWN");
    let map = query.field_map().unwrap();
    assert_eq!(map.target("UNKNOWN").unwrap(), ["a", "b"]);
    assert!(map.unknown().is_empty());

    let text = serde_json::to_string(map).unwrap();
    assert_eq!(
        text,
        r#"{"targets":{"UNKNOWN":["a","b"]},"ALL":["a","b"],"UNKNOWN":[]}"#
    );
}
