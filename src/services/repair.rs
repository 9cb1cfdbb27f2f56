//! Heuristic rule auto-repair.
//!
//! When a rule's XPaths extract nothing, an ordered list of common page
//! patterns is probed against the same document to synthesize replacement
//! XPaths. Probing never fails; a pattern that does not pan out simply
//! yields no proposal for that field.

use scraper::Html;
use tracing::debug;

use super::extract::element_text;
use crate::xpath::Xpath;

/// Title heuristics, in preference order.
pub const TITLE_CANDIDATES: [&str; 6] = [
    "//h1",
    "//h2",
    "//header//h1",
    "//header//h2",
    "//div[contains(@class, \"title\")]",
    "//div[contains(@class, \"headline\")]",
];

/// Content heuristics, in preference order.
pub const CONTENT_CANDIDATES: [&str; 6] = [
    "//article",
    "//div[contains(@class, \"content\")]",
    "//div[contains(@class, \"article\")]",
    "//div[contains(@id, \"content\")]",
    "//section[contains(@class, \"main\")]",
    "//div[contains(@class, \"post\")]",
];

/// Minimum visible-text length for a content candidate. Rejects incidental
/// short matches like captions that would otherwise pass a non-empty test.
const MIN_CONTENT_CHARS: usize = 100;

/// Replacement XPaths proposed by auto-repair. `None` per field when no
/// heuristic matched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleProposal {
    pub title_xpath: Option<String>,
    pub content_xpath: Option<String>,
}

impl RuleProposal {
    /// True when neither field could be proposed.
    pub fn is_empty(&self) -> bool {
        self.title_xpath.is_none() && self.content_xpath.is_none()
    }
}

/// Probe the heuristic candidate lists against a document.
pub fn propose_rule(doc: &Html) -> RuleProposal {
    let title_xpath = first_candidate(doc, &TITLE_CANDIDATES, |text| !text.is_empty());
    let content_xpath = first_candidate(doc, &CONTENT_CANDIDATES, |text| {
        text.chars().count() > MIN_CONTENT_CHARS
    });

    debug!(?title_xpath, ?content_xpath, "auto-repair probe finished");
    RuleProposal {
        title_xpath,
        content_xpath,
    }
}

/// First candidate whose first matched node's visible text passes `accept`.
fn first_candidate(
    doc: &Html,
    candidates: &[&str],
    accept: impl Fn(&str) -> bool,
) -> Option<String> {
    for candidate in candidates {
        let xp = match Xpath::compile(candidate) {
            Ok(xp) => xp,
            Err(_) => continue,
        };
        if let Some(first) = xp.select(doc).first() {
            if accept(&element_text(first)) {
                return Some((*candidate).to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_text(len: usize) -> String {
        "x".repeat(len)
    }

    #[test]
    fn test_content_length_threshold_boundary() {
        for (len, expected) in [(99, false), (100, false), (101, true)] {
            let html = format!("<html><body><article>{}</article></body></html>", long_text(len));
            let proposal = propose_rule(&Html::parse_document(&html));
            assert_eq!(
                proposal.content_xpath.is_some(),
                expected,
                "length {} should be accepted={}",
                len,
                expected
            );
        }
    }

    #[test]
    fn test_earlier_candidate_wins() {
        // Both //article and //div[contains(@class,"content")] match with
        // enough text; the earlier candidate must be preferred.
        let html = format!(
            "<html><body><div class=\"content\">{}</div><article>{}</article></body></html>",
            long_text(150),
            long_text(150)
        );
        let proposal = propose_rule(&Html::parse_document(&html));
        assert_eq!(proposal.content_xpath.as_deref(), Some("//article"));
    }

    #[test]
    fn test_title_prefers_h1() {
        let html = "<html><body><h2>sub</h2><h1>main</h1></body></html>";
        let proposal = propose_rule(&Html::parse_document(html));
        assert_eq!(proposal.title_xpath.as_deref(), Some("//h1"));
    }

    #[test]
    fn test_empty_h1_falls_through() {
        let html = "<html><body><h1>  </h1><h2>real title</h2></body></html>";
        let proposal = propose_rule(&Html::parse_document(html));
        assert_eq!(proposal.title_xpath.as_deref(), Some("//h2"));
    }

    #[test]
    fn test_no_match_proposes_nothing() {
        let html = "<html><body><p>just a paragraph</p></body></html>";
        let proposal = propose_rule(&Html::parse_document(html));
        assert!(proposal.is_empty());
    }

    #[test]
    fn test_partial_proposal() {
        let html = "<html><body><h1>Title only</h1><p>short</p></body></html>";
        let proposal = propose_rule(&Html::parse_document(html));
        assert_eq!(proposal.title_xpath.as_deref(), Some("//h1"));
        assert!(proposal.content_xpath.is_none());
        assert!(!proposal.is_empty());
    }
}
