//! Shared helpers for passpool's integration tests: tracing setup, a
//! timeout guard for pool drains, config builders and recording actions.

pub mod builders;
pub mod recording;

use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Route `tracing` output from the pool and its passes into the test harness.
///
/// Logs land in the per-test capture buffer, so they only show up for a
/// failing test. Set `RUST_LOG=passpool=debug` to see every claimed pass.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init()
            .ok();
    });
}

/// Fail the test if `f` has not finished within 5 seconds.
///
/// A pool that never drains (no workers, a lost plan) would otherwise hang
/// the whole test binary.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("timed out after 5s waiting on the pool")
}
