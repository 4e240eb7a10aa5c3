//! dom-pilot - Self-Healing Selector Resolution Library
//!
//! Keeps finding the right DOM element for a logical UI role when the
//! underlying markup drifts, without hand-maintained selectors:
//! - Persisted bank of ranked selector candidates per element type
//! - Sequential resolver probing a page in confidence order
//! - Feedback loop promoting winners and retiring decayed selectors
//! - One-shot JSON seeding for bootstrap
//!
//! # Example
//!
//! ```ignore
//! use dom_pilot::{SelectorBank, SelectorResolver, SelectorStore, StaticHtmlPage, UiContext};
//! use dom_pilot::config::Config;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let store = Arc::new(SelectorStore::new(&config.storage.database_path).await?);
//!     let bank = SelectorBank::new(store, config.selectors.clone());
//!     bank.load().await?;
//!
//!     let resolver = SelectorResolver::new(bank);
//!     let page = StaticHtmlPage::new("<div class=\"card\">Play</div>");
//!     let ctx = UiContext::desktop("https://dashboard.example.com");
//!     if let Some(card) = resolver.resolve(&page, "activity_card", &ctx).await? {
//!         println!("found <{}>", card.tag_name);
//!     }
//!     Ok(())
//! }
//! ```

// Core modules (order matters for cross-module dependencies)
pub mod types;
pub mod store; // Must come before bank since bank depends on its records
pub mod bank;
pub mod resolver;
pub mod seed;
pub mod config;
pub mod cli;

// Re-export commonly used types for convenience
pub use bank::SelectorBank;

pub use store::{
    InteractionRecord,
    SelectorCandidate,
    SelectorStore,
    StoreStats,
};

pub use resolver::{
    ElementHandle,
    PageProbe,
    ProbeError,
    SelectorResolver,
    StaticHtmlPage,
};

pub use types::{InteractionAction, Strategy, UiContext};

pub use config::Config;

pub use seed::{SeedEntry, SeedReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
