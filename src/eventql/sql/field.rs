/*!
# Field Name Handling

Helpers for dotted field paths:

- **Escaping**: nested field paths such as `user.address.$0` are flattened into a single
  identifier that is safe in the execution engine's query language (`user$address$$0`)
- **Method chains**: trailing invocation segments such as `.length()` are not part of the
  field path and must survive rewriting untouched
*/

use regex::Regex;
use std::sync::OnceLock;

fn method_call_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z][a-zA-Z]*\(.*\)$").expect("method call pattern is a valid regex")
    })
}

/// Escape a dotted field path into a single engine-safe identifier.
///
/// ```
/// use eventql::eventql::sql::field::escape_name;
///
/// assert_eq!(escape_name("hoge.pos"), "hoge$pos");
/// assert_eq!(escape_name("hoge.0"), "hoge$$0");
/// assert_eq!(escape_name("hoge.$0"), "hoge$$0");
/// assert_eq!(escape_name("user-agent"), "user_agent");
/// ```
pub fn escape_name(name: &str) -> String {
    name.split('.')
        .map(|segment| {
            if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
                format!("${}", segment)
            } else {
                segment.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("$")
        .chars()
        .map(|c| {
            if c == '$' || c == '_' || c.is_ascii_alphanumeric() {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Reverse of [`escape_name`] for names that only used `[$_a-zA-Z0-9]`.
///
/// Container indexes come back in their canonical `$n` form.
pub fn unescape_name(escaped: &str) -> String {
    escaped.replace("$$", ".\u{0}").replace('$', ".").replace('\u{0}', "$")
}

/// Split a path on `.` separators that are outside parentheses and quotes.
pub fn split_segments(path: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in path.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, '.') if depth == 0 => {
                segments.push(&path[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&path[start..]);
    segments
}

/// Whether a path segment is a method invocation: lowercase-initial name followed by a
/// parenthesized (possibly empty) argument list.
pub fn is_method_call(segment: &str) -> bool {
    method_call_pattern().is_match(segment)
}

/// Separate the trailing run of method-invocation segments from a field path.
///
/// Returns the field body (segments joined with `.`) and the invocation segments in
/// their original order.
///
/// ```
/// use eventql::eventql::sql::field::split_method_chain;
///
/// let (body, methods) = split_method_chain("opts.num.$0.length()");
/// assert_eq!(body, "opts.num.$0");
/// assert_eq!(methods, vec!["length()"]);
/// ```
pub fn split_method_chain(path: &str) -> (String, Vec<String>) {
    let mut segments = split_segments(path);
    let mut methods = Vec::new();
    while let Some(last) = segments.last() {
        if !is_method_call(last) {
            break;
        }
        methods.insert(0, last.to_string());
        segments.pop();
    }
    (segments.join("."), methods)
}
