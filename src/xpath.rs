//! XPath subset compiler for extraction rules.
//!
//! Per-site rules are authored as XPath because that is what curators paste
//! out of browser devtools. The evaluator here compiles the workable subset
//! of XPath onto CSS selectors and runs them through `scraper`:
//!
//! - axes: `//` (descendant) and `/` (child), plus a leading `.//`
//! - node tests: element names and `*`
//! - predicates: `[@attr]`, `[@attr='v']`, `[contains(@attr, 'v')]`
//! - a trailing `/text()` (ignored; extraction always takes full text)
//!
//! Everything else (positional predicates, sibling axes, functions) is
//! rejected with a distinct error so callers can tell "rule is broken"
//! apart from "rule matched nothing".

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

/// Error compiling an XPath expression.
#[derive(Debug, Error)]
pub enum XpathError {
    #[error("empty xpath expression")]
    Empty,
    #[error("unsupported xpath `{expr}`: {reason}")]
    Unsupported { expr: String, reason: String },
    #[error("xpath `{expr}` maps to invalid selector `{css}`: {detail}")]
    Selector {
        expr: String,
        css: String,
        detail: String,
    },
}

/// A compiled XPath expression.
#[derive(Debug, Clone)]
pub struct Xpath {
    expr: String,
    css: String,
    selector: Selector,
}

impl Xpath {
    /// Compile an XPath expression into a CSS-backed matcher.
    pub fn compile(expr: &str) -> Result<Self, XpathError> {
        let trimmed = expr.trim();
        if trimmed.is_empty() {
            return Err(XpathError::Empty);
        }

        // A trailing /text() selects the same elements; text extraction is
        // the caller's job either way.
        let path = trimmed.strip_suffix("/text()").unwrap_or(trimmed);
        let path = path.strip_prefix('.').unwrap_or(path);

        let css = translate(trimmed, path)?;
        let selector = Selector::parse(&css).map_err(|e| XpathError::Selector {
            expr: trimmed.to_string(),
            css: css.clone(),
            detail: e.to_string(),
        })?;

        Ok(Self {
            expr: trimmed.to_string(),
            css,
            selector,
        })
    }

    /// All matching elements, in document order.
    pub fn select<'a>(&self, doc: &'a Html) -> Vec<ElementRef<'a>> {
        doc.select(&self.selector).collect()
    }

    /// The original XPath expression.
    pub fn as_str(&self) -> &str {
        &self.expr
    }

    /// The CSS selector this expression compiled to.
    pub fn css(&self) -> &str {
        &self.css
    }
}

fn unsupported(expr: &str, reason: impl Into<String>) -> XpathError {
    XpathError::Unsupported {
        expr: expr.to_string(),
        reason: reason.into(),
    }
}

/// Translate an XPath location path into a CSS selector string.
fn translate(expr: &str, path: &str) -> Result<String, XpathError> {
    let mut rest = path;
    let mut css = String::new();
    let mut first = true;

    while !rest.is_empty() {
        let descendant = if let Some(r) = rest.strip_prefix("//") {
            rest = r;
            true
        } else if let Some(r) = rest.strip_prefix('/') {
            rest = r;
            false
        } else {
            return Err(unsupported(expr, "steps must be separated by / or //"));
        };

        let (step, remainder) = take_step(expr, rest)?;
        rest = remainder;

        if first {
            // A leading single slash means "child of the document root".
            if !descendant && step.name != "html" && step.name != "*" {
                css.push_str(":root > ");
            }
            first = false;
        } else if descendant {
            css.push(' ');
        } else {
            css.push_str(" > ");
        }
        css.push_str(&step.css);
    }

    if css.is_empty() {
        return Err(unsupported(expr, "no location steps"));
    }
    Ok(css)
}

struct Step {
    name: String,
    css: String,
}

/// Consume one location step (name test plus predicates) from `rest`.
fn take_step<'a>(expr: &str, rest: &'a str) -> Result<(Step, &'a str), XpathError> {
    let name_len = if rest.starts_with('*') {
        1
    } else {
        rest.chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .map(|c| c.len_utf8())
            .sum()
    };
    if name_len == 0 {
        return Err(unsupported(expr, "missing element name in step"));
    }
    let name = &rest[..name_len];
    if name == "text()" {
        return Err(unsupported(expr, "text() is only supported as a suffix"));
    }

    let mut css = name.to_string();
    let mut rest = &rest[name_len..];

    while rest.starts_with('[') {
        let end = matching_bracket(rest)
            .ok_or_else(|| unsupported(expr, "unterminated predicate"))?;
        let predicate = &rest[1..end];
        css.push_str(&translate_predicate(expr, predicate)?);
        rest = &rest[end + 1..];
    }

    Ok((
        Step {
            name: name.to_string(),
            css,
        },
        rest,
    ))
}

/// Find the index of the `]` closing the `[` at position 0, skipping over
/// quoted strings.
fn matching_bracket(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices().skip(1) {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => quote = Some(c),
                ']' => return Some(i),
                _ => {}
            },
        }
    }
    None
}

/// Translate a single predicate into a CSS attribute selector suffix.
fn translate_predicate(expr: &str, predicate: &str) -> Result<String, XpathError> {
    let p = predicate.trim();

    if p.chars().all(|c| c.is_ascii_digit()) {
        return Err(unsupported(expr, "positional predicates"));
    }

    if let Some(inner) = p.strip_prefix("contains(").and_then(|r| r.strip_suffix(')')) {
        let (left, right) = inner
            .split_once(',')
            .ok_or_else(|| unsupported(expr, "contains() needs two arguments"))?;
        let attr = attribute_name(expr, left.trim())?;
        let value = quoted_value(expr, right.trim())?;
        return Ok(format!("[{}*={}]", attr, css_string(value)));
    }

    if p.starts_with('@') {
        match p.split_once('=') {
            Some((left, right)) => {
                let attr = attribute_name(expr, left.trim())?;
                let value = quoted_value(expr, right.trim())?;
                return Ok(format!("[{}={}]", attr, css_string(value)));
            }
            None => {
                let attr = attribute_name(expr, p)?;
                return Ok(format!("[{}]", attr));
            }
        }
    }

    Err(unsupported(
        expr,
        format!("predicate `{}` is not an attribute test", p),
    ))
}

fn attribute_name<'a>(expr: &str, s: &'a str) -> Result<&'a str, XpathError> {
    let name = s
        .strip_prefix('@')
        .ok_or_else(|| unsupported(expr, "predicate must test an @attribute"))?;
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(unsupported(expr, format!("invalid attribute name `{}`", name)));
    }
    Ok(name)
}

fn quoted_value<'a>(expr: &str, s: &'a str) -> Result<&'a str, XpathError> {
    for q in ['\'', '"'] {
        if let Some(inner) = s
            .strip_prefix(q)
            .and_then(|r| r.strip_suffix(q))
        {
            return Ok(inner);
        }
    }
    Err(unsupported(expr, "attribute value must be a quoted string"))
}

fn css_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_descendant() {
        assert_eq!(Xpath::compile("//h1").unwrap().css(), "h1");
        assert_eq!(Xpath::compile("//header//h1").unwrap().css(), "header h1");
    }

    #[test]
    fn test_child_axis() {
        assert_eq!(
            Xpath::compile("//div/span").unwrap().css(),
            "div > span"
        );
        assert_eq!(
            Xpath::compile("/html/body/div").unwrap().css(),
            "html > body > div"
        );
    }

    #[test]
    fn test_attribute_equality() {
        assert_eq!(
            Xpath::compile("//div[@class='content']").unwrap().css(),
            "div[class=\"content\"]"
        );
        assert_eq!(
            Xpath::compile("//*[@id=\"detailContent\"]").unwrap().css(),
            "*[id=\"detailContent\"]"
        );
    }

    #[test]
    fn test_contains_predicate() {
        assert_eq!(
            Xpath::compile("//div[contains(@class, \"title\")]")
                .unwrap()
                .css(),
            "div[class*=\"title\"]"
        );
        assert_eq!(
            Xpath::compile("//div[contains(@id, 'content')]").unwrap().css(),
            "div[id*=\"content\"]"
        );
    }

    #[test]
    fn test_multi_step_with_predicates() {
        assert_eq!(
            Xpath::compile("//div[@id=\"detail\"]//span[@id=\"detailContent\"]")
                .unwrap()
                .css(),
            "div[id=\"detail\"] span[id=\"detailContent\"]"
        );
    }

    #[test]
    fn test_text_suffix_ignored() {
        assert_eq!(Xpath::compile("//h1/text()").unwrap().css(), "h1");
    }

    #[test]
    fn test_leading_dot_slash() {
        assert_eq!(Xpath::compile(".//h1").unwrap().css(), "h1");
    }

    #[test]
    fn test_empty_is_an_error() {
        assert!(matches!(Xpath::compile(""), Err(XpathError::Empty)));
        assert!(matches!(Xpath::compile("   "), Err(XpathError::Empty)));
    }

    #[test]
    fn test_unsupported_constructs() {
        assert!(matches!(
            Xpath::compile("//div[1]"),
            Err(XpathError::Unsupported { .. })
        ));
        assert!(matches!(
            Xpath::compile("//div[contains(text(), 'x')]"),
            Err(XpathError::Unsupported { .. })
        ));
        assert!(matches!(
            Xpath::compile("div"),
            Err(XpathError::Unsupported { .. })
        ));
        assert!(matches!(
            Xpath::compile("//div/following-sibling::p"),
            Err(XpathError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_select_document_order() {
        let doc = Html::parse_document(
            "<html><body><article>one</article><div class=\"post body\">two</div></body></html>",
        );
        let xp = Xpath::compile("//div[contains(@class, \"post\")]").unwrap();
        let matches = xp.select(&doc);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].text().collect::<String>(), "two");
    }

    #[test]
    fn test_select_non_matching_is_empty() {
        let doc = Html::parse_document("<html><body><p>x</p></body></html>");
        let xp = Xpath::compile("//h1").unwrap();
        assert!(xp.select(&doc).is_empty());
    }
}
