//! Rule-driven title/content extraction.

use scraper::{ElementRef, Html};

use crate::xpath::{Xpath, XpathError};

/// Extraction output. Empty fields mean the XPath matched nothing, which
/// is a legitimate outcome, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    pub title: String,
    pub content: String,
}

impl Extracted {
    /// True when either field carries text.
    pub fn has_any(&self) -> bool {
        !self.title.is_empty() || !self.content.is_empty()
    }
}

/// Full descendant text of an element, trimmed.
pub fn element_text(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Apply a rule's XPath pair to raw HTML.
///
/// An empty XPath leaves its field empty; a syntactically invalid one is
/// the only error case, reported distinctly so callers can decide between
/// failing the item and attempting repair.
pub fn extract(html: &str, title_xpath: &str, content_xpath: &str) -> Result<Extracted, XpathError> {
    let doc = Html::parse_document(html);
    extract_document(&doc, title_xpath, content_xpath)
}

/// Same as [`extract`] for an already-parsed document.
pub fn extract_document(
    doc: &Html,
    title_xpath: &str,
    content_xpath: &str,
) -> Result<Extracted, XpathError> {
    // Title: full visible text of the first matched node.
    let mut title = String::new();
    if !title_xpath.trim().is_empty() {
        let xp = Xpath::compile(title_xpath)?;
        if let Some(first) = xp.select(doc).first() {
            title = element_text(first);
        }
    }

    // Content: per-node full visible text of every matched node, each
    // independently trimmed, space-joined.
    let mut content = String::new();
    if !content_xpath.trim().is_empty() {
        let xp = Xpath::compile(content_xpath)?;
        content = xp
            .select(doc)
            .iter()
            .map(element_text)
            .collect::<Vec<_>>()
            .join(" ");
    }

    Ok(Extracted { title, content })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_extraction() {
        let html = "<html><body><h1>T</h1><div class=\"content\">Body text</div></body></html>";
        let out = extract(html, "//h1", "//div[@class='content']").unwrap();
        assert_eq!(out.title, "T");
        assert_eq!(out.content, "Body text");
        assert!(out.has_any());
    }

    #[test]
    fn test_no_matches_is_empty_not_error() {
        let html = "<html><body><p>nothing here</p></body></html>";
        let out = extract(html, "//h1", "//div[@class='content']").unwrap();
        assert_eq!(out, Extracted::default());
        assert!(!out.has_any());
    }

    #[test]
    fn test_title_includes_nested_text() {
        let html = "<html><body><h1>Breaking: <em>news</em> today</h1></body></html>";
        let out = extract(html, "//h1", "").unwrap();
        assert_eq!(out.title, "Breaking: news today");
    }

    #[test]
    fn test_title_takes_first_match_only() {
        let html = "<html><body><h1>first</h1><h1>second</h1></body></html>";
        let out = extract(html, "//h1", "").unwrap();
        assert_eq!(out.title, "first");
    }

    #[test]
    fn test_content_joins_all_matches() {
        let html = "<html><body><p class=\"x\"> a </p><p class=\"x\">b</p></body></html>";
        let out = extract(html, "", "//p[@class='x']").unwrap();
        assert_eq!(out.content, "a b");
    }

    #[test]
    fn test_empty_xpaths_leave_fields_empty() {
        let html = "<html><body><h1>T</h1></body></html>";
        let out = extract(html, "", "").unwrap();
        assert_eq!(out, Extracted::default());
    }

    #[test]
    fn test_invalid_xpath_is_reported() {
        let html = "<html><body><h1>T</h1></body></html>";
        assert!(extract(html, "//h1[2]", "").is_err());
        assert!(extract(html, "", "//div[position()=1]").is_err());
    }

    #[test]
    fn test_malformed_markup_tolerated() {
        let html = "<h1>unclosed <div class=content>still works";
        let out = extract(html, "//h1", "//div[@class='content']").unwrap();
        assert!(out.has_any());
    }
}
