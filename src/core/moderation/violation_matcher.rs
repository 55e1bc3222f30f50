// Violation matcher - finds prohibited terms in message text.
//
// Matching rules:
// - case-insensitive
// - whole words only: the characters on either side of an occurrence must be
//   non-word characters (or the start/end of the text), so "ban" never fires
//   inside "banana"
// - terms are literal text; regex metacharacters in a term are escaped
//
// NO Discord dependencies here - just text in, terms out.

use regex::{Regex, RegexBuilder};
use std::collections::HashSet;
use std::ops::Range;

/// One configured term and its compiled, case-insensitive pattern.
#[derive(Debug, Clone)]
struct TermPattern {
    term: String,
    regex: Regex,
}

/// Compiled form of the prohibited-term list.
///
/// Built once at startup and shared read-only between message handlers.
#[derive(Debug, Clone, Default)]
pub struct ViolationMatcher {
    patterns: Vec<TermPattern>,
}

impl ViolationMatcher {
    /// Compile the configured terms, keeping their order.
    ///
    /// Blank entries are ignored and case-insensitive duplicates keep only the
    /// first occurrence. A term that fails to compile is logged and skipped;
    /// it will simply never match.
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut patterns = Vec::new();

        for raw in terms {
            let term = raw.as_ref().trim();
            if term.is_empty() || !seen.insert(term.to_lowercase()) {
                continue;
            }

            match RegexBuilder::new(&regex::escape(term))
                .case_insensitive(true)
                .build()
            {
                Ok(regex) => patterns.push(TermPattern {
                    term: term.to_string(),
                    regex,
                }),
                Err(e) => {
                    tracing::error!(term, error = %e, "Skipping prohibited term that failed to compile");
                }
            }
        }

        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Configured terms, in order.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|p| p.term.as_str())
    }

    /// Return every configured term that appears in `text` as a whole word.
    ///
    /// The result follows configured order and lists each term once, no
    /// matter how often it occurs.
    pub fn detect(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        self.patterns
            .iter()
            .filter(|p| !whole_word_occurrences(&p.regex, text).is_empty())
            .map(|p| p.term.clone())
            .collect()
    }

    /// Wrap each whole-word occurrence of the given terms in `**bold**`.
    ///
    /// The original casing of the text is preserved. Occurrences that overlap
    /// an earlier one are left as they are.
    pub fn highlight(&self, text: &str, terms: &[String]) -> String {
        let mut ranges: Vec<Range<usize>> = self
            .patterns
            .iter()
            .filter(|p| terms.contains(&p.term))
            .flat_map(|p| whole_word_occurrences(&p.regex, text))
            .collect();
        ranges.sort_by_key(|r| (r.start, std::cmp::Reverse(r.end)));

        let mut out = String::with_capacity(text.len() + ranges.len() * 4);
        let mut cursor = 0;
        for range in ranges {
            if range.start < cursor {
                continue;
            }
            out.push_str(&text[cursor..range.start]);
            out.push_str("**");
            out.push_str(&text[range.clone()]);
            out.push_str("**");
            cursor = range.end;
        }
        out.push_str(&text[cursor..]);
        out
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Byte ranges of every occurrence of `regex` that stands alone as a word.
fn whole_word_occurrences(regex: &Regex, text: &str) -> Vec<Range<usize>> {
    let mut found = Vec::new();
    let mut start = 0;

    while start <= text.len() {
        let Some(m) = regex.find_at(text, start) else {
            break;
        };
        if m.start() == m.end() {
            break;
        }

        let clear_before = text[..m.start()]
            .chars()
            .next_back()
            .map_or(true, |c| !is_word_char(c));
        let clear_after = text[m.end()..]
            .chars()
            .next()
            .map_or(true, |c| !is_word_char(c));

        if clear_before && clear_after {
            found.push(m.range());
            start = m.end();
        } else {
            // Retry one character further so an overlapping standalone
            // occurrence is not skipped.
            let step = text[m.start()..].chars().next().map_or(1, char::len_utf8);
            start = m.start() + step;
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(terms: &[&str]) -> ViolationMatcher {
        ViolationMatcher::new(terms.iter().copied())
    }

    #[test]
    fn test_no_terms_never_matches() {
        let m = matcher(&[]);
        assert!(m.is_empty());
        assert!(m.detect("anything at all").is_empty());
    }

    #[test]
    fn test_clean_text() {
        let m = matcher(&["ban", "spam"]);
        assert!(m.detect("Hello world!").is_empty());
        assert!(m.detect("").is_empty());
    }

    #[test]
    fn test_whole_word_only() {
        let m = matcher(&["ban"]);
        assert!(m.detect("I love banana bread").is_empty());
        assert!(m.detect("urban legends").is_empty());
        assert!(m.detect("ban_hammer").is_empty());
        assert_eq!(m.detect("ban"), vec!["ban"]);
        assert_eq!(m.detect("you should ban, now"), vec!["ban"]);
        assert_eq!(m.detect("(ban)"), vec!["ban"]);
    }

    #[test]
    fn test_case_insensitive_and_configured_order() {
        let m = matcher(&["spam", "Ban", "scam"]);
        let found = m.detect("BAN this SCAM, then ban the Spam spam");
        assert_eq!(found, vec!["spam", "Ban", "scam"]);
    }

    #[test]
    fn test_each_term_reported_once() {
        let m = matcher(&["spam"]);
        assert_eq!(m.detect("spam spam spam"), vec!["spam"]);
    }

    #[test]
    fn test_duplicate_and_blank_terms_are_dropped() {
        let m = matcher(&["spam", "  ", "SPAM", " scam "]);
        assert_eq!(m.terms().collect::<Vec<_>>(), vec!["spam", "scam"]);
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn test_metacharacters_are_literal() {
        let m = matcher(&["c++", "a.b", "(x)"]);
        assert_eq!(m.detect("I write c++ daily"), vec!["c++"]);
        assert!(m.detect("axb").is_empty());
        assert_eq!(m.detect("see a.b here"), vec!["a.b"]);
        assert_eq!(m.detect("fn (x) ok"), vec!["(x)"]);
    }

    #[test]
    fn test_match_found_after_embedded_occurrence() {
        let m = matcher(&["ban"]);
        assert_eq!(m.detect("banana ban"), vec!["ban"]);
    }

    #[test]
    fn test_unicode_word_boundaries() {
        let m = matcher(&["böse"]);
        assert_eq!(m.detect("das ist BÖSE!"), vec!["böse"]);
        assert!(m.detect("unböse").is_empty());
    }

    #[test]
    fn test_highlight_preserves_case() {
        let m = matcher(&["spam", "ban"]);
        let terms = vec!["spam".to_string(), "ban".to_string()];
        assert_eq!(
            m.highlight("Spam and BAN but not banana, spam", &terms),
            "**Spam** and **BAN** but not banana, **spam**"
        );
    }

    #[test]
    fn test_highlight_only_given_terms() {
        let m = matcher(&["spam", "ban"]);
        assert_eq!(
            m.highlight("spam ban", &["ban".to_string()]),
            "spam **ban**"
        );
    }

    #[test]
    fn test_highlight_overlapping_terms() {
        let m = matcher(&["bad word", "word"]);
        let terms = m.detect("a bad word here");
        assert_eq!(terms, vec!["bad word", "word"]);
        assert_eq!(m.highlight("a bad word here", &terms), "a **bad word** here");
    }
}
