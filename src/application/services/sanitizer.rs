//! Input Sanitizer
//!
//! Strips `<` and `>` from untrusted input and trims surrounding whitespace.
//! Only string content changes: object key sets, array lengths and
//! non-string leaves are preserved exactly.

use serde_json::{Map, Value};
use url::form_urlencoded;

/// Sanitize a JSON value recursively, returning a new value.
pub fn sanitize(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(sanitize_str(s)),
        Value::Array(items) => Value::Array(items.iter().map(sanitize).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), sanitize(v)))
                .collect::<Map<String, Value>>(),
        ),
        other => other.clone(),
    }
}

/// Remove angle brackets, then trim. Stripping first keeps the result stable
/// under repeated application (`"  < a"` would otherwise keep a leading space).
pub fn sanitize_str(s: &str) -> String {
    let stripped: String = s.chars().filter(|c| !matches!(c, '<' | '>')).collect();
    stripped.trim().to_string()
}

/// Sanitize every value of an `application/x-www-form-urlencoded` query
/// string. Keys and pair order are kept.
pub fn sanitize_query(query: &str) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        serializer.append_pair(&key, &sanitize_str(&value));
    }
    serializer.finish()
}

/// Sanitize each segment of a raw (still percent-encoded) URI path.
pub fn sanitize_path(path: &str) -> String {
    path.split('/')
        .map(sanitize_path_segment)
        .collect::<Vec<_>>()
        .join("/")
}

const ENCODED_BRACKETS: [&str; 2] = ["%3c", "%3e"];
const ENCODED_WHITESPACE: [&str; 4] = ["%20", "%09", "%0a", "%0d"];

fn sanitize_path_segment(segment: &str) -> String {
    let mut current = segment.to_string();
    // Removing "%3C" out of "%3%3CC" exposes a new escape; repeat until stable.
    loop {
        let next = trim_encoded(&strip_encoded_brackets(&current)).to_string();
        if next == current {
            return next;
        }
        current = next;
    }
}

fn strip_encoded_brackets(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut rest = segment;

    while let Some(c) = rest.chars().next() {
        if c == '<' || c == '>' {
            rest = &rest[1..];
            continue;
        }
        if c == '%' && starts_with_any(rest, &ENCODED_BRACKETS) {
            rest = &rest[3..];
            continue;
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    out
}

fn trim_encoded(segment: &str) -> &str {
    let mut s = segment;
    loop {
        let before = s.len();
        s = s.trim();
        if starts_with_any(s, &ENCODED_WHITESPACE) {
            s = &s[3..];
        }
        if ends_with_any(s, &ENCODED_WHITESPACE) {
            s = &s[..s.len() - 3];
        }
        if s.len() == before {
            return s;
        }
    }
}

fn starts_with_any(s: &str, escapes: &[&str]) -> bool {
    s.get(..3)
        .map(|head| escapes.iter().any(|e| head.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

fn ends_with_any(s: &str, escapes: &[&str]) -> bool {
    s.len() >= 3
        && s.get(s.len() - 3..)
            .map(|tail| escapes.iter().any(|e| tail.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
}
