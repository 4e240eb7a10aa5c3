//! Selector resolution
//!
//! Turns a ranked candidate list into a located element on a page, with
//! feedback. Candidates are probed strictly one at a time in rank order —
//! probing in parallel could fire side effects (a stray double-click) from
//! multiple true-positive matches on a live page.

pub mod normalize;
pub mod page;
pub mod static_page;

use anyhow::Result;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::bank::SelectorBank;
use crate::types::UiContext;

pub use normalize::normalize;
pub use page::{ElementHandle, PageProbe, ProbeError};
pub use static_page::StaticHtmlPage;

/// Resolves logical element types against a page via the selector bank
#[derive(Clone)]
pub struct SelectorResolver {
    bank: SelectorBank,
    default_timeout: Duration,
}

impl SelectorResolver {
    /// Create a resolver over a loaded bank
    pub fn new(bank: SelectorBank) -> Self {
        Self {
            bank,
            default_timeout: Duration::from_secs(5),
        }
    }

    /// Override the default per-candidate probe timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// The bank this resolver reports feedback to
    pub fn bank(&self) -> &SelectorBank {
        &self.bank
    }

    /// Resolve a single element for a logical element type
    ///
    /// Probes ranked candidates sequentially with the given per-candidate
    /// timeout; the first match wins and is promoted with the elapsed time
    /// since the loop started. Every candidate that fails along the way is
    /// degraded before the next one is tried. `None` means either no
    /// coverage for this type/context or total resolution failure — the
    /// caller decides whether that is fatal for its task. No candidate is
    /// created on total failure; generation is gated behind the
    /// auto-mutation flag and not implemented.
    pub async fn resolve_element(
        &self,
        page: &dyn PageProbe,
        element_type: &str,
        ctx: &UiContext,
        timeout: Duration,
    ) -> Result<Option<ElementHandle>> {
        let candidates = self.bank.candidates(element_type, ctx).await;
        if candidates.is_empty() {
            debug!(
                "No selector candidates for '{}' (mobile={}) — coverage gap",
                element_type, ctx.mobile
            );
            return Ok(None);
        }

        let started = Instant::now();
        let total = candidates.len();
        for candidate in candidates {
            let expression = normalize(candidate.strategy, &candidate.value);
            match page.query(&expression, timeout).await {
                Ok(Some(element)) => {
                    let elapsed = started.elapsed().as_millis() as f64;
                    self.bank.promote_selector(&candidate.id, elapsed).await?;
                    debug!(
                        "Resolved '{}' via {} '{}' in {:.0}ms",
                        element_type, candidate.strategy, expression, elapsed
                    );
                    return Ok(Some(element));
                }
                Ok(None) => {
                    self.bank.degrade_selector(&candidate.id, None).await?;
                }
                Err(err) => {
                    debug!(
                        "Probe error for '{}' candidate '{}': {}",
                        element_type, expression, err
                    );
                    self.bank
                        .degrade_selector(&candidate.id, Some(&err.to_string()))
                        .await?;
                }
            }
        }

        debug!(
            "All {} candidates failed for '{}' on {}",
            total,
            element_type,
            page.url()
        );
        Ok(None)
    }

    /// Resolve a single element with the resolver's default timeout
    pub async fn resolve(
        &self,
        page: &dyn PageProbe,
        element_type: &str,
        ctx: &UiContext,
    ) -> Result<Option<ElementHandle>> {
        self.resolve_element(page, element_type, ctx, self.default_timeout)
            .await
    }

    /// Resolve every element matching a logical element type
    ///
    /// Same ranked iteration, but the first candidate yielding one or more
    /// matches wins. Batch queries are not latency-scored, so the winner is
    /// promoted with a response time of zero.
    pub async fn resolve_elements(
        &self,
        page: &dyn PageProbe,
        element_type: &str,
        ctx: &UiContext,
    ) -> Result<Vec<ElementHandle>> {
        let candidates = self.bank.candidates(element_type, ctx).await;
        if candidates.is_empty() {
            debug!(
                "No selector candidates for '{}' (mobile={}) — coverage gap",
                element_type, ctx.mobile
            );
            return Ok(Vec::new());
        }

        for candidate in candidates {
            let expression = normalize(candidate.strategy, &candidate.value);
            match page.query_all(&expression).await {
                Ok(elements) if !elements.is_empty() => {
                    self.bank.promote_selector(&candidate.id, 0.0).await?;
                    debug!(
                        "Resolved {} '{}' elements via {} '{}'",
                        elements.len(),
                        element_type,
                        candidate.strategy,
                        expression
                    );
                    return Ok(elements);
                }
                Ok(_) => {
                    self.bank.degrade_selector(&candidate.id, None).await?;
                }
                Err(err) => {
                    self.bank
                        .degrade_selector(&candidate.id, Some(&err.to_string()))
                        .await?;
                }
            }
        }

        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::page::MockPageProbe;
    use super::*;
    use crate::config::SelectorConfig;
    use crate::store::SelectorStore;
    use crate::types::Strategy;
    use std::sync::Arc;

    async fn resolver_with_candidates(seeds: &[(Strategy, &str, f64)]) -> SelectorResolver {
        let store = Arc::new(SelectorStore::in_memory().await.unwrap());
        let bank = SelectorBank::new(store, SelectorConfig::default());
        let ctx = UiContext::desktop("https://dashboard.example.com");
        for (strategy, value, confidence) in seeds {
            bank.add_candidate("activity_card", *strategy, value, &ctx, Some(*confidence))
                .await
                .unwrap();
        }
        SelectorResolver::new(bank)
    }

    #[tokio::test]
    async fn test_probe_error_degrades_and_continues() {
        let resolver =
            resolver_with_candidates(&[(Strategy::Css, ".broken", 90.0), (Strategy::Id, "ok", 50.0)])
                .await;
        let ctx = UiContext::desktop("https://dashboard.example.com");

        let mut page = MockPageProbe::new();
        page.expect_query()
            .withf(|expr, _| expr == ".broken")
            .returning(|_, timeout| Err(ProbeError::Timeout(timeout)));
        page.expect_query()
            .withf(|expr, _| expr == "#ok")
            .returning(|expr, _| {
                Ok(Some(ElementHandle {
                    tag_name: "div".to_string(),
                    expression: expr.to_string(),
                    ..Default::default()
                }))
            });

        let found = resolver
            .resolve_element(&page, "activity_card", &ctx, Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(found.unwrap().expression, "#ok");

        let ranked = resolver.bank().candidates("activity_card", &ctx).await;
        // the timed-out 90 dropped to 80, the match rose to 55
        assert_eq!(ranked[0].confidence, 80.0);
        assert_eq!(ranked[0].failure_count, 1);
        assert_eq!(ranked[1].confidence, 55.0);
        assert_eq!(ranked[1].success_count, 1);
    }

    #[tokio::test]
    async fn test_first_match_stops_iteration() {
        let resolver = resolver_with_candidates(&[
            (Strategy::Id, "winner", 90.0),
            (Strategy::Css, ".never-probed", 50.0),
        ])
        .await;
        let ctx = UiContext::desktop("https://dashboard.example.com");

        let mut page = MockPageProbe::new();
        page.expect_query()
            .withf(|expr, _| expr == "#winner")
            .times(1)
            .returning(|expr, _| {
                Ok(Some(ElementHandle {
                    tag_name: "button".to_string(),
                    expression: expr.to_string(),
                    ..Default::default()
                }))
            });
        // no expectation for ".never-probed": probing it would panic

        let found = resolver
            .resolve_element(&page, "activity_card", &ctx, Duration::from_millis(100))
            .await
            .unwrap();
        assert!(found.is_some());

        let ranked = resolver.bank().candidates("activity_card", &ctx).await;
        let untouched = ranked.iter().find(|c| c.value == ".never-probed").unwrap();
        assert_eq!(untouched.failure_count, 0);
    }

    #[tokio::test]
    async fn test_coverage_gap_returns_none_without_probing() {
        let resolver = resolver_with_candidates(&[]).await;
        let ctx = UiContext::desktop("https://dashboard.example.com");
        let page = MockPageProbe::new();

        let found = resolver
            .resolve_element(&page, "unknown_type", &ctx, Duration::from_millis(100))
            .await
            .unwrap();
        assert!(found.is_none());
    }
}
