//! Threat patterns and path exclusion rules.
//!
//! # Responsibilities
//! - Compile the SQL-injection and XSS detection patterns once
//! - Hold the dangerous-header denylist
//! - Decide which paths bypass validation entirely
//!
//! # Design Decisions
//! - Built once at startup and shared read-only via `Arc`
//! - Pure query functions; no interior mutability
//! - Heuristic filter, not a parser: a match means "looks like", nothing more

use std::collections::HashSet;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::GatewayConfig;

pub(crate) const SQL_INJECTION_SOURCE: &str = r"(?i)\b(union\s+select|select\s+union|insert\s+into|update\s+set|delete\s+from|drop\s+table|create\s+table|alter\s+table|exec\s+sp_|execute\s+sp_|javascript:|vbscript:|onload\s*=|onerror\s*=|onclick\s*=)\b";

pub(crate) const XSS_SOURCE: &str = r"(?i)<script[^>]*>.*?</script>|<iframe[^>]*>.*?</iframe>|<object[^>]*>.*?</object>|<embed[^>]*>.*?</embed>";

/// Category of attack a pattern detects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatCategory {
    SqlInjection,
    Xss,
}

impl ThreatCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatCategory::SqlInjection => "sql_injection",
            ThreatCategory::Xss => "xss",
        }
    }
}

impl fmt::Display for ThreatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A precompiled, case-insensitive detection pattern.
#[derive(Debug, Clone)]
pub struct ThreatPattern {
    category: ThreatCategory,
    regex: Regex,
}

impl ThreatPattern {
    /// Compile a pattern. Fails only on a malformed pattern source.
    pub fn new(category: ThreatCategory, source: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            category,
            regex: Regex::new(source)?,
        })
    }

    pub fn category(&self) -> ThreatCategory {
        self.category
    }

    /// Returns true if the pattern occurs anywhere in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Path predicate that disables validation for matching requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionRule {
    /// Path must equal the value exactly.
    Exact(String),
    /// Path must start with the value.
    Prefix(String),
}

impl ExclusionRule {
    pub fn matches(&self, path: &str) -> bool {
        match self {
            ExclusionRule::Exact(p) => path == p,
            ExclusionRule::Prefix(p) => path.starts_with(p.as_str()),
        }
    }

    /// Parse the env-style notation: a trailing `*` makes a prefix rule.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.strip_suffix('*') {
            Some(prefix) => ExclusionRule::Prefix(prefix.to_string()),
            None => ExclusionRule::Exact(raw.to_string()),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            ExclusionRule::Exact(p) | ExclusionRule::Prefix(p) => p,
        }
    }

    /// Login, upload and public event-request submission carry free-form
    /// text or binary payloads and are not scanned.
    pub fn defaults() -> Vec<ExclusionRule> {
        vec![
            ExclusionRule::Exact("/auth/token".to_string()),
            ExclusionRule::Exact("/auth/login".to_string()),
            ExclusionRule::Prefix("/upload/".to_string()),
            ExclusionRule::Prefix("/event-requests/".to_string()),
        ]
    }
}

/// Immutable set of detection patterns, exclusion rules and header denylist.
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    sql_injection: ThreatPattern,
    xss: ThreatPattern,
    exclusions: Vec<ExclusionRule>,
    dangerous_headers: HashSet<String>,
}

impl PatternRegistry {
    /// Compile the built-in patterns with the given rules.
    pub fn new<I, S>(exclusions: Vec<ExclusionRule>, dangerous_headers: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            sql_injection: ThreatPattern::new(ThreatCategory::SqlInjection, SQL_INJECTION_SOURCE)?,
            xss: ThreatPattern::new(ThreatCategory::Xss, XSS_SOURCE)?,
            exclusions,
            dangerous_headers: dangerous_headers
                .into_iter()
                .map(|h| h.as_ref().trim().to_ascii_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
        })
    }

    pub fn from_config(config: &GatewayConfig) -> Result<Self, regex::Error> {
        Self::new(config.exclusions.clone(), &config.dangerous_headers)
    }

    pub fn matches_sql_injection(&self, text: &str) -> bool {
        self.sql_injection.is_match(text)
    }

    pub fn matches_xss(&self, text: &str) -> bool {
        self.xss.is_match(text)
    }

    /// First matching category, SQL before XSS.
    pub fn detect(&self, text: &str) -> Option<ThreatCategory> {
        [&self.sql_injection, &self.xss]
            .into_iter()
            .find(|p| p.is_match(text))
            .map(ThreatPattern::category)
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.exclusions.iter().any(|rule| rule.matches(path))
    }

    pub fn is_dangerous_header(&self, name: &str) -> bool {
        !self.dangerous_headers.is_empty()
            && self.dangerous_headers.contains(&name.to_ascii_lowercase())
    }

    pub fn exclusions(&self) -> &[ExclusionRule] {
        &self.exclusions
    }
}

impl Default for PatternRegistry {
    fn default() -> Self {
        Self::new(ExclusionRule::defaults(), std::iter::empty::<&str>())
            .expect("built-in threat patterns must compile")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_keywords_detected() {
        let registry = PatternRegistry::default();
        assert!(registry.matches_sql_injection("DROP TABLE events"));
        assert!(registry.matches_sql_injection("1 union   select password"));
        assert!(registry.matches_sql_injection("Delete From users"));
        assert!(registry.matches_sql_injection("exec sp_ who"));
        assert!(registry.matches_sql_injection("<a href=\"javascript:alert(1)\">"));
        assert!(registry.matches_sql_injection("<img onerror =alert(1)>"));
    }

    #[test]
    fn test_sql_requires_whole_words() {
        let registry = PatternRegistry::default();
        assert!(!registry.matches_sql_injection("Beatles"));
        assert!(!registry.matches_sql_injection("backdrop tables"));
        assert!(!registry.matches_sql_injection("I will update the settings"));
        assert!(!registry.matches_sql_injection("' OR 1=1"));
    }

    #[test]
    fn test_xss_tag_pairs() {
        let registry = PatternRegistry::default();
        assert!(registry.matches_xss("<script>alert(1)</script>"));
        assert!(registry.matches_xss("hi <SCRIPT type=\"x\">x</ScRiPt> there"));
        assert!(registry.matches_xss("<iframe src=evil></iframe>"));
        assert!(registry.matches_xss("<object data=x></object>"));
        assert!(registry.matches_xss("<embed src=x></embed>"));
        // An unterminated tag is not a complete block.
        assert!(!registry.matches_xss("<script>alert(1)"));
        assert!(!registry.matches_xss("a < b > c"));
    }

    #[test]
    fn test_detect_prefers_sql() {
        let registry = PatternRegistry::default();
        assert_eq!(
            registry.detect("<script>drop table x</script>"),
            Some(ThreatCategory::SqlInjection)
        );
        assert_eq!(registry.detect("<script>x</script>"), Some(ThreatCategory::Xss));
        assert_eq!(registry.detect("Los Beatles en vivo"), None);
    }

    #[test]
    fn test_default_exclusions() {
        let registry = PatternRegistry::default();
        assert!(registry.is_excluded("/auth/token"));
        assert!(registry.is_excluded("/auth/login"));
        assert!(registry.is_excluded("/upload/image"));
        assert!(registry.is_excluded("/event-requests/"));
        assert!(registry.is_excluded("/event-requests/7/status"));

        assert!(!registry.is_excluded("/auth/login/extra"));
        assert!(!registry.is_excluded("/upload"));
        assert!(!registry.is_excluded("/events"));
    }

    #[test]
    fn test_exclusion_rule_parse() {
        assert_eq!(
            ExclusionRule::parse(" /upload/* "),
            ExclusionRule::Prefix("/upload/".to_string())
        );
        assert_eq!(
            ExclusionRule::parse("/auth/login"),
            ExclusionRule::Exact("/auth/login".to_string())
        );
    }

    #[test]
    fn test_dangerous_headers_case_insensitive() {
        let registry = PatternRegistry::new(vec![], ["X-Debug-Override", " "]).unwrap();
        assert!(registry.is_dangerous_header("x-debug-override"));
        assert!(registry.is_dangerous_header("X-DEBUG-OVERRIDE"));
        assert!(!registry.is_dangerous_header("x-forwarded-for"));

        let empty = PatternRegistry::default();
        assert!(!empty.is_dangerous_header("x-debug-override"));
    }
}
