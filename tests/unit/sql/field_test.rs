// Tests for field path escaping and method chain handling
use eventql::eventql::sql::field::{
    escape_name, is_method_call, split_method_chain, split_segments, unescape_name,
};

#[test]
fn test_escape_nested_and_container_fields() {
    assert_eq!(escape_name("user.address.city"), "user$address$city");
    assert_eq!(escape_name("tags.$0"), "tags$$0");
    assert_eq!(escape_name("tags.0"), "tags$$0");
    assert_eq!(escape_name("matrix.1.2"), "matrix$$1$$2");
    assert_eq!(escape_name("plain"), "plain");
}

#[test]
fn test_escape_replaces_unsafe_characters() {
    assert_eq!(escape_name("user-agent"), "user_agent");
    assert_eq!(escape_name("header.content type"), "header$content_type");
}

#[test]
fn test_unescape_restores_paths() {
    for path in ["user.address.city", "tags.$0", "a.$1.b"] {
        assert_eq!(unescape_name(&escape_name(path)), path);
    }
}

#[test]
fn test_method_call_shape() {
    assert!(is_method_call("length()"));
    assert!(is_method_call("substr(0, 2)"));
    assert!(is_method_call("toUpperCase()"));
    assert!(!is_method_call("Length()"));
    assert!(!is_method_call("length"));
    assert!(!is_method_call("$0"));
}

#[test]
fn test_split_method_chain_keeps_only_trailing_calls() {
    assert_eq!(
        split_method_chain("a.b.length()"),
        ("a.b".to_string(), vec!["length()".to_string()])
    );
    assert_eq!(
        split_method_chain("text.substr(0, 2).trim()"),
        (
            "text".to_string(),
            vec!["substr(0, 2)".to_string(), "trim()".to_string()]
        )
    );
    assert_eq!(
        split_method_chain("a.b"),
        ("a.b".to_string(), Vec::<String>::new())
    );
}

#[test]
fn test_split_segments_ignores_dots_in_arguments() {
    assert_eq!(
        split_segments("name.replace('.', '_').trim()"),
        vec!["name", "replace('.', '_')", "trim()"]
    );
}
