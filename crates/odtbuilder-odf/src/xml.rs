//! XML text helpers

use quick_xml::escape::{escape, partial_escape};

/// Whether `c` may appear in an XML 1.0 document
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r')
        || ('\u{20}'..='\u{D7FF}').contains(&c)
        || ('\u{E000}'..='\u{FFFD}').contains(&c)
        || c >= '\u{10000}'
}

/// Drop characters that cannot be represented in XML at all
fn strip_invalid(text: &str) -> std::borrow::Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        std::borrow::Cow::Borrowed(text)
    } else {
        std::borrow::Cow::Owned(text.chars().filter(|c| is_xml_char(*c)).collect())
    }
}

/// Escape character data
pub fn escape_text(text: &str) -> String {
    partial_escape(strip_invalid(text).as_ref()).into_owned()
}

/// Escape an attribute value
pub fn escape_attr(text: &str) -> String {
    escape(strip_invalid(text).as_ref()).into_owned()
}

/// Format a length with at most three decimals (e.g. `8.5`, `0.212`)
pub fn fmt_num(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    let mut s = format!("{:.3}", rounded);
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a & b < c"), "a &amp; b &lt; c");
        assert_eq!(escape_text("\"quoted\""), "\"quoted\"");
    }

    #[test]
    fn test_escape_attr() {
        assert_eq!(escape_attr("\"x\" & 'y'"), "&quot;x&quot; &amp; &apos;y&apos;");
    }

    #[test]
    fn test_control_characters_are_dropped() {
        assert_eq!(escape_text("a\u{1}b\u{0}c"), "abc");
        assert_eq!(escape_text("tab\there"), "tab\there");
    }

    #[test]
    fn test_fmt_num() {
        assert_eq!(fmt_num(8.5), "8.5");
        assert_eq!(fmt_num(17.0), "17");
        assert_eq!(fmt_num(0.21166), "0.212");
        assert_eq!(fmt_num(-0.0001), "0");
    }
}
