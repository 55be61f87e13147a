#![forbid(unsafe_code)]

//! Entity escaping for C14N output.
//!
//! Escaping rules of C14N 1.0:
//! - Text nodes: `&` → `&amp;`, `<` → `&lt;`, `>` → `&gt;`, `\r` → `&#xD;`
//! - Attribute values: `&`, `<`, `"`, `\t`, `\n`, `\r` escaped
//! - PI data: `\r` → `&#xD;`
//!
//! Strings with nothing to escape are returned borrowed.

use std::borrow::Cow;

fn escape_with(s: &str, table: fn(char) -> Option<&'static str>) -> Cow<'_, str> {
    let Some(first) = s.char_indices().find(|(_, c)| table(*c).is_some()) else {
        return Cow::Borrowed(s);
    };
    let mut out = String::with_capacity(s.len() + 8);
    out.push_str(&s[..first.0]);
    for ch in s[first.0..].chars() {
        match table(ch) {
            Some(rep) => out.push_str(rep),
            None => out.push(ch),
        }
    }
    Cow::Owned(out)
}

fn text_entity(ch: char) -> Option<&'static str> {
    match ch {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '\r' => Some("&#xD;"),
        _ => None,
    }
}

fn attr_entity(ch: char) -> Option<&'static str> {
    match ch {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '"' => Some("&quot;"),
        '\t' => Some("&#x9;"),
        '\n' => Some("&#xA;"),
        '\r' => Some("&#xD;"),
        _ => None,
    }
}

fn pi_entity(ch: char) -> Option<&'static str> {
    (ch == '\r').then_some("&#xD;")
}

/// Escape text node content per C14N rules.
pub fn escape_text(s: &str) -> Cow<'_, str> {
    escape_with(s, text_entity)
}

/// Escape attribute value per C14N rules.
pub fn escape_attr(s: &str) -> Cow<'_, str> {
    escape_with(s, attr_entity)
}

/// Escape processing instruction data.
pub fn escape_pi(s: &str) -> Cow<'_, str> {
    escape_with(s, pi_entity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_text() {
        assert!(matches!(escape_text("hello"), Cow::Borrowed("hello")));
        assert_eq!(escape_text("a&b<c>d"), "a&amp;b&lt;c&gt;d");
        assert_eq!(escape_text("line\rend"), "line&#xD;end");
        assert_eq!(escape_text("keep \"quotes\"\n"), "keep \"quotes\"\n");
    }

    #[test]
    fn test_escape_attr() {
        assert_eq!(escape_attr("hello"), "hello");
        assert_eq!(escape_attr("a&b\"c>"), "a&amp;b&quot;c>");
        assert_eq!(escape_attr("a\tb\nc\rd"), "a&#x9;b&#xA;c&#xD;d");
    }

    #[test]
    fn test_escape_pi() {
        assert_eq!(escape_pi("x\r\ny<"), "x&#xD;\ny<");
    }
}
