//! Free-text partial-match patterns
//!
//! A raw filter value becomes a case-insensitive "contains" pattern: every run of
//! whitespace turns into an unconstrained gap (`.*`) and the whole value is wrapped
//! in `.*` on both sides. The value is otherwise used as regex source verbatim, so
//! metacharacters typed by the caller keep their regex meaning. Input that does not
//! form a valid regex falls back to a literal match of its whitespace-separated
//! pieces, so compilation never fails.

use regex::{Regex, RegexBuilder};
use std::fmt;

/// Marker inserted for each whitespace run
const GAP: &str = ".*";

/// Compiled partial-match pattern for one text field
#[derive(Clone)]
pub struct MatchPattern {
    source: String,
    matcher: Matcher,
}

#[derive(Clone)]
enum Matcher {
    /// Blank input: matches every value
    Any,
    Regex(Regex),
    /// Lowercased pieces found in order; used when no regex can be built
    Pieces(Vec<String>),
}

impl MatchPattern {
    /// Pattern that matches every value
    pub fn any() -> Self {
        Self {
            source: String::new(),
            matcher: Matcher::Any,
        }
    }

    /// Compile a raw filter value
    pub fn compile(raw: &str) -> Self {
        if raw.trim().is_empty() {
            // `.*` + gaps + `.*` reduces to match-all; skip the regex entirely
            return Self {
                source: raw.to_string(),
                matcher: Matcher::Any,
            };
        }

        let pieces: Vec<&str> = raw.split_whitespace().collect();
        let gapped = wrap_contains(&pieces.join(GAP));

        let regex = build(&gapped).or_else(|err| {
            tracing::warn!(
                pattern = %raw,
                error = %err,
                "Filter value is not a valid pattern, matching it literally"
            );
            let escaped: Vec<String> = pieces.iter().map(|p| regex::escape(p)).collect();
            build(&wrap_contains(&escaped.join(GAP)))
        });

        match regex {
            Ok(regex) => Self {
                source: raw.to_string(),
                matcher: Matcher::Regex(regex),
            },
            Err(err) => {
                // Escaped literals always compile; only a size limit can land here
                tracing::warn!(
                    pattern_len = raw.len(),
                    error = %err,
                    "Pattern too large for a regex, matching pieces in order"
                );
                Self {
                    source: raw.to_string(),
                    matcher: Matcher::Pieces(pieces.iter().map(|p| p.to_lowercase()).collect()),
                }
            }
        }
    }

    /// Whether `value` satisfies this pattern
    pub fn is_match(&self, value: &str) -> bool {
        match &self.matcher {
            Matcher::Any => true,
            Matcher::Regex(regex) => regex.is_match(value),
            Matcher::Pieces(pieces) => contains_in_order(&value.to_lowercase(), pieces),
        }
    }

    /// True when the pattern cannot exclude anything
    pub fn matches_all(&self) -> bool {
        matches!(self.matcher, Matcher::Any)
    }

    /// The raw filter value this pattern was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The effective regex, if any
    pub fn as_regex(&self) -> Option<&str> {
        match &self.matcher {
            Matcher::Regex(regex) => Some(regex.as_str()),
            Matcher::Any | Matcher::Pieces(_) => None,
        }
    }
}

/// Shorthand for [`MatchPattern::compile`]
pub fn compile(raw: &str) -> MatchPattern {
    MatchPattern::compile(raw)
}

impl Default for MatchPattern {
    fn default() -> Self {
        Self::any()
    }
}

impl fmt::Debug for MatchPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchPattern")
            .field("source", &self.source)
            .field("regex", &self.as_regex())
            .finish()
    }
}

fn contains_in_order(haystack: &str, pieces: &[String]) -> bool {
    let mut rest = haystack;
    for piece in pieces {
        match rest.find(piece.as_str()) {
            Some(at) => rest = &rest[at + piece.len()..],
            None => return false,
        }
    }
    true
}

fn wrap_contains(body: &str) -> String {
    format!("{GAP}{body}{GAP}")
}

fn build(source: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(source)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_matches_everything() {
        let pattern = compile("");
        assert!(pattern.matches_all());
        assert!(pattern.is_match(""));
        assert!(pattern.is_match("anything at all"));

        assert!(compile("   ").matches_all());
    }

    #[test]
    fn test_contains_is_case_insensitive() {
        let pattern = compile("timeout");
        assert!(pattern.is_match("Fix DB TIMEOUT in loader"));
        assert!(!pattern.is_match("Fix DB time out"));
    }

    #[test]
    fn test_whitespace_becomes_gap() {
        let pattern = compile("ECP 1");
        assert!(pattern.is_match("ECP-100"));
        assert!(pattern.is_match("ecp_991"));
        assert!(!pattern.is_match("ECP-200"));

        let multi = compile("db   pool");
        assert_eq!(multi.as_regex(), Some(".*db.*pool.*"));
        assert!(multi.is_match("DB connection pool"));
    }

    #[test]
    fn test_gap_spans_newlines() {
        assert!(compile("first last").is_match("first line\nlast line"));
    }

    #[test]
    fn test_metacharacters_keep_regex_meaning() {
        let pattern = compile("ECP-1.0");
        assert!(pattern.is_match("ECP-1x0"));

        let alternation = compile("core|ui");
        assert!(alternation.is_match("UI"));
    }

    #[test]
    fn test_oversized_input_still_constrains() {
        let raw = "zz ".repeat(15_000);
        let pattern = compile(&raw);

        assert!(!pattern.matches_all());
        assert!(!pattern.is_match("ECP-100"));
        assert!(pattern.is_match(&"ZZ-".repeat(15_000)));
        assert!(!pattern.is_match(&"zz".repeat(100)));
    }

    #[test]
    fn test_invalid_regex_falls_back_to_literal() {
        let pattern = compile("fix (loader");
        assert!(!pattern.matches_all());
        assert!(pattern.is_match("hotfix (loader) patch"));
        assert!(!pattern.is_match("hotfix loader"));
    }
}
