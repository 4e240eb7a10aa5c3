//! dom-pilot - Self-healing selector bank CLI
//!
//! Seeds and inspects the persistent selector store used by the
//! dashboard automation workers.

// Use the library crate for all modules
use dom_pilot::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging (WARN level by default, use RUST_LOG=info for more)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    // Run CLI
    cli::run().await
}
