use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::testing::prelude::*;

/// Include this in a test to turn on logging globally, so `tracing::info!`/`error!` output from
/// the driver and observer is visible under `cargo test -- --nocapture`.
#[fixture]
#[once]
pub fn logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::TRACE.into())
                .from_env_lossy(),
        )
        .with_test_writer()
        .try_init();
}
