//! Static-HTML implementation of the page probe
//!
//! Runs expressions against a parsed document instead of a live browser.
//! Used by tests, demos and offline dry-runs of the selector bank. A parsed
//! document is fully attached by definition, so probe timeouts are
//! irrelevant here and ignored.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

use super::page::{ElementHandle, PageProbe, ProbeError};

/// A page probe over a static HTML document
pub struct StaticHtmlPage {
    html: String,
    url: String,
}

impl StaticHtmlPage {
    /// Wrap an HTML document with no particular URL
    pub fn new(html: &str) -> Self {
        Self::with_url(html, "about:blank")
    }

    /// Wrap an HTML document served from the given URL
    pub fn with_url(html: &str, url: &str) -> Self {
        Self {
            html: html.to_string(),
            url: url.to_string(),
        }
    }

    // The document is re-parsed per query; scraper's parsed tree is not
    // Sync, and probe volume here is test-sized.
    fn find_all(&self, expression: &str) -> Result<Vec<ElementHandle>, ProbeError> {
        let doc = Html::parse_document(&self.html);

        if let Some(target) = parse_text_expression(expression) {
            return Ok(find_by_text(&doc, &target, expression));
        }

        let selector = Selector::parse(expression)
            .map_err(|e| ProbeError::InvalidExpression(e.to_string()))?;

        Ok(doc
            .select(&selector)
            .map(|el| handle_from_element(&el, expression))
            .collect())
    }
}

#[async_trait]
impl PageProbe for StaticHtmlPage {
    fn url(&self) -> String {
        self.url.clone()
    }

    async fn query(
        &self,
        expression: &str,
        _timeout: Duration,
    ) -> Result<Option<ElementHandle>, ProbeError> {
        Ok(self.find_all(expression)?.into_iter().next())
    }

    async fn query_all(&self, expression: &str) -> Result<Vec<ElementHandle>, ProbeError> {
        self.find_all(expression)
    }
}

/// Extract the target of a `text="..."` expression, unescaping quotes
fn parse_text_expression(expression: &str) -> Option<String> {
    let inner = expression
        .strip_prefix("text=\"")
        .and_then(|rest| rest.strip_suffix('"'))?;
    Some(inner.replace("\\\"", "\""))
}

/// Exact-match text search, innermost elements only
///
/// An element whose collapsed text equals the target matches; ancestors
/// wrapping nothing but that text would match too, so matches containing
/// another match are dropped.
fn find_by_text(doc: &Html, target: &str, expression: &str) -> Vec<ElementHandle> {
    let everything = match Selector::parse("*") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    let matches: Vec<ElementRef> = doc
        .select(&everything)
        .filter(|el| collapse_whitespace(&el.text().collect::<String>()) == target)
        .collect();

    matches
        .iter()
        .filter(|el| {
            !matches
                .iter()
                .any(|other| other.id() != el.id() && el.descendants().any(|d| d.id() == other.id()))
        })
        .map(|el| handle_from_element(el, expression))
        .collect()
}

fn handle_from_element(el: &ElementRef, expression: &str) -> ElementHandle {
    ElementHandle {
        tag_name: el.value().name().to_string(),
        text: collapse_whitespace(&el.text().collect::<String>()),
        attributes: el
            .value()
            .attrs()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
        expression: expression.to_string(),
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
            <section id="daily">
                <h2>Daily set</h2>
                <div class="card daily" aria-label="Quiz of the day">
                    <span>Play the quiz</span>
                </div>
                <div class="card daily">
                    <span>Spin to win</span>
                </div>
            </section>
            <button id="more-activities" aria-label="More activities">More</button>
        </body></html>
    "#;

    #[tokio::test]
    async fn test_css_query_returns_first_match() {
        let page = StaticHtmlPage::new(PAGE);
        let el = page
            .query(".card.daily", Duration::from_secs(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(el.tag_name, "div");
        assert_eq!(el.text, "Play the quiz");
    }

    #[tokio::test]
    async fn test_query_all_returns_every_match() {
        let page = StaticHtmlPage::new(PAGE);
        let all = page.query_all(".card").await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_id_and_aria_expressions() {
        let page = StaticHtmlPage::new(PAGE);
        assert!(page
            .query("#more-activities", Duration::from_secs(1))
            .await
            .unwrap()
            .is_some());
        let el = page
            .query("[aria-label=\"Quiz of the day\"]", Duration::from_secs(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            el.attributes.get("aria-label").map(String::as_str),
            Some("Quiz of the day")
        );
    }

    #[tokio::test]
    async fn test_text_query_matches_innermost_element() {
        let page = StaticHtmlPage::new(PAGE);
        let el = page
            .query("text=\"Spin to win\"", Duration::from_secs(1))
            .await
            .unwrap()
            .unwrap();
        // the span, not the wrapping div
        assert_eq!(el.tag_name, "span");
    }

    #[tokio::test]
    async fn test_no_match_is_none_not_error() {
        let page = StaticHtmlPage::new(PAGE);
        assert!(page
            .query(".does-not-exist", Duration::from_secs(1))
            .await
            .unwrap()
            .is_none());
        assert!(page
            .query("text=\"Nope\"", Duration::from_secs(1))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_invalid_expression_is_an_error() {
        let page = StaticHtmlPage::new(PAGE);
        let err = page.query("..[", Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, ProbeError::InvalidExpression(_)));
    }
}
