//! chargemon — charging-power monitor for Linux batteries.
//!
//! Estimates instantaneous charging wattage, a speed tier, and time-to-full
//! from periodic battery-level readings alone.
//!
//! Run with:  `RUST_LOG=info chargemon`

use anyhow::Result;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Structured logging — RUST_LOG controls verbosity (default: info).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("chargemon v{} starting", env!("CARGO_PKG_VERSION"));

    charge_daemon::run().await.map_err(Into::into)
}
