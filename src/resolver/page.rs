//! Page-querying seam
//!
//! The only browser-dependent operation in resolution. The surrounding
//! automation layer implements [`PageProbe`] over its live page object;
//! [`crate::resolver::StaticHtmlPage`] implements it over a parsed document
//! for tests and dry-runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// A located element, detached from any particular backend
#[derive(Debug, Clone, Default)]
pub struct ElementHandle {
    /// Tag name, lowercased
    pub tag_name: String,
    /// Visible text content, whitespace-collapsed
    pub text: String,
    /// Element attributes
    pub attributes: HashMap<String, String>,
    /// The expression that matched this element
    pub expression: String,
}

/// Errors a page probe can produce
///
/// The feedback loop treats every variant the same way (the candidate
/// degrades); the split exists so implementations and logs can tell a
/// slow page from a broken expression.
#[derive(Debug, Clone, Error)]
pub enum ProbeError {
    /// The element did not attach within the allotted time
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),
    /// Backend failure (page crashed, connection lost, ...)
    #[error("backend error: {0}")]
    Backend(String),
    /// The expression could not be evaluated
    #[error("invalid expression: {0}")]
    InvalidExpression(String),
}

/// Locate elements on a page by expression
///
/// Expressions are CSS selectors, plus the `text="..."` form for exact
/// visible-text matches. An element only needs to be attached to the
/// document to count as located; visibility is not required.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageProbe: Send + Sync {
    /// Current page URL
    fn url(&self) -> String;

    /// First element matching `expression`, waiting up to `timeout` for it
    /// to attach. `Ok(None)` when nothing matched within the deadline.
    async fn query(
        &self,
        expression: &str,
        timeout: Duration,
    ) -> Result<Option<ElementHandle>, ProbeError>;

    /// All elements currently matching `expression`; no waiting.
    async fn query_all(&self, expression: &str) -> Result<Vec<ElementHandle>, ProbeError>;
}
