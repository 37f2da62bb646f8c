//! Shared helpers for cairn integration tests.

#![allow(dead_code)]

use std::sync::Once;

use cairn::prelude::*;
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Install a test subscriber once per binary. Honors `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
            .with_test_writer()
            .try_init();
    });
}

/// Retry settings for contended tests: plenty of attempts, short backoff.
pub fn contended_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 1_000,
        initial_backoff_ms: 1,
        max_backoff_ms: 10,
    }
}
