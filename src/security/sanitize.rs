//! Text sanitization and format checks.
//!
//! # Design Decisions
//! - Pure functions over `&str`; patterns compiled once per process
//! - Removal uses the gateway's SQL and XSS pattern sources
//! - Dangerous characters go first, so markup is defanged rather than
//!   removed: `<script>x</script>` becomes `scriptx/script`
//! - Truncation counts characters, never splits a code point

use std::sync::LazyLock;

use regex::Regex;

use crate::gateway::patterns::{SQL_INJECTION_SOURCE, XSS_SOURCE};

static DANGEROUS_CHARS: LazyLock<Regex> = LazyLock::new(|| compile(r#"[<>"']"#));

static SQL_FRAGMENTS: LazyLock<Regex> = LazyLock::new(|| compile(SQL_INJECTION_SOURCE));

static MARKUP_BLOCKS: LazyLock<Regex> = LazyLock::new(|| compile(XSS_SOURCE));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| compile(r"\s+"));

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$"));

static HTTP_URL: LazyLock<Regex> = LazyLock::new(|| {
    compile(concat!(
        r"(?i)^https?://",
        r"(?:(?:[A-Z0-9](?:[A-Z0-9-]{0,61}[A-Z0-9])?\.)+[A-Z]{2,6}\.?|",
        r"localhost|",
        r"\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})",
        r"(?::\d+)?",
        r"(?:/?|[/?]\S*)$",
    ))
});

// Literal patterns; a failure here is a programming error caught by the tests.
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid sanitizer pattern: {e}"))
}

fn strip_threats(text: &str) -> String {
    let text = DANGEROUS_CHARS.replace_all(text, "");
    let text = SQL_FRAGMENTS.replace_all(&text, "");
    let text = MARKUP_BLOCKS.replace_all(&text, "");
    WHITESPACE.replace_all(&text, " ").into_owned()
}

fn truncate_chars(mut text: String, max_len: Option<usize>) -> String {
    if let Some(max) = max_len.filter(|&m| m > 0) {
        if let Some((idx, _)) = text.char_indices().nth(max) {
            text.truncate(idx);
        }
    }
    text
}

/// Strip dangerous characters and injection fragments, collapse whitespace,
/// trim, then truncate to `max_len` characters.
///
/// # Example
/// ```
/// use agenda_gateway::security::sanitize_text;
///
/// assert_eq!(sanitize_text("  Los   <b>Piojos</b> ", None), "Los bPiojos/b");
/// ```
pub fn sanitize_text(text: &str, max_len: Option<usize>) -> String {
    let cleaned = strip_threats(text).trim().to_string();
    truncate_chars(cleaned, max_len)
}

/// Like [`sanitize_text`] but keeps leading and trailing spaces, so partial
/// search input such as `"rock "` survives.
pub fn sanitize_search_text(text: &str, max_len: Option<usize>) -> String {
    truncate_chars(strip_threats(text), max_len)
}

/// Strip dangerous characters and all whitespace, lowercased.
pub fn sanitize_email(text: &str) -> String {
    let text = DANGEROUS_CHARS.replace_all(text, "");
    WHITESPACE.replace_all(&text, "").to_lowercase()
}

/// Strip dangerous characters and all whitespace.
pub fn sanitize_url(text: &str) -> String {
    let text = DANGEROUS_CHARS.replace_all(text, "");
    WHITESPACE.replace_all(&text, "").into_owned()
}

pub fn is_valid_email(text: &str) -> bool {
    EMAIL.is_match(text)
}

/// True when `text` has at most `max` characters.
pub fn is_within_length(text: &str, max: usize) -> bool {
    text.len() <= max || text.chars().count() <= max
}

/// `http`/`https` with a domain, `localhost`, or dotted IPv4 host, an
/// optional port, and an optional path or query.
pub fn is_valid_url(text: &str) -> bool {
    HTTP_URL.is_match(text)
}

/// Escape `& < > " '` for safe inclusion in HTML.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns_compile() {
        LazyLock::force(&DANGEROUS_CHARS);
        LazyLock::force(&SQL_FRAGMENTS);
        LazyLock::force(&MARKUP_BLOCKS);
        LazyLock::force(&WHITESPACE);
        LazyLock::force(&EMAIL);
        LazyLock::force(&HTTP_URL);
    }

    #[test]
    fn test_sanitize_text_strips_and_trims() {
        assert_eq!(sanitize_text("  Soda   Stereo\n\t", None), "Soda Stereo");
        assert_eq!(sanitize_text("it's \"live\"", None), "its live");
        assert_eq!(sanitize_text("x union select y", None), "x y");
    }

    #[test]
    fn test_sanitize_text_defangs_markup() {
        assert_eq!(
            sanitize_text("hola <script>alert(1)</script> chau", None),
            "hola scriptalert(1)/script chau"
        );
    }

    #[test]
    fn test_shares_gateway_pattern_sources() {
        assert_eq!(SQL_FRAGMENTS.as_str(), SQL_INJECTION_SOURCE);
        assert_eq!(MARKUP_BLOCKS.as_str(), XSS_SOURCE);
    }

    #[test]
    fn test_sanitize_text_removes_sql_fragments() {
        assert_eq!(sanitize_text("DROP TABLE events", None), "events");
        assert_eq!(sanitize_text("please delete   from list", None), "please list");
    }

    #[test]
    fn test_sanitize_text_truncates_by_chars() {
        assert_eq!(sanitize_text("Café Tacvba", Some(4)), "Café");
        assert_eq!(sanitize_text("short", Some(100)), "short");
        assert_eq!(sanitize_text("ñandú", Some(0)), "ñandú");
    }

    #[test]
    fn test_search_text_keeps_edges() {
        assert_eq!(sanitize_search_text(" rock  nacional ", None), " rock nacional ");
        assert_eq!(sanitize_search_text("<rock>", Some(2)), "ro");
    }

    #[test]
    fn test_sanitize_email() {
        assert_eq!(sanitize_email(" Fan@Example.COM "), "fan@example.com");
        assert_eq!(sanitize_email("a <b>@c.com"), "ab@c.com");
    }

    #[test]
    fn test_sanitize_url() {
        assert_eq!(
            sanitize_url(" https://tickets.example/show?id=1 \"x\""),
            "https://tickets.example/show?id=1x"
        );
    }

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("fan@example.com"));
        assert!(is_valid_email("first.last+promo@mail.example.ar"));
        assert!(!is_valid_email("fan@example"));
        assert!(!is_valid_email("not an email"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_is_valid_url() {
        assert!(is_valid_url("https://tickets.example.com"));
        assert!(is_valid_url("http://localhost:8000/events?id=3"));
        assert!(is_valid_url("http://192.168.0.10/poster.png"));
        assert!(is_valid_url("https://bucket.s3.amazonaws.com/img/a.jpg"));
        assert!(!is_valid_url("ftp://example.com"));
        assert!(!is_valid_url("javascript:alert(1)"));
        assert!(!is_valid_url("https://"));
    }

    #[test]
    fn test_is_within_length_counts_chars() {
        assert!(is_within_length("ñandú", 5));
        assert!(!is_within_length("ñandú", 4));
        assert!(is_within_length("", 0));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#x27;s&lt;/a&gt;"
        );
        assert_eq!(escape_html(""), "");
    }
}
