//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`store`] - [`FaultyStore`](store::FaultyStore), a memory store with
//!   switchable failures that records every batch it receives.
//! - [`members`] - [`RecordingMembers`](members::RecordingMembers), a member
//!   directory that records `clear_faction` calls.
//! - [`domain`] - Builders for factions and stored record bodies.
//! - [`config`] - Canonical test configurations.

pub mod config;
pub mod domain;
pub mod members;
pub mod store;

use std::future::Future;
use std::time::Duration;

/// Poll `check` every few milliseconds until it holds or `timeout` elapses.
///
/// Returns whether the condition was met.
pub async fn wait_until<F>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Run `future` with a timeout, panicking if it does not finish.
pub async fn within<T>(timeout: Duration, future: impl Future<Output = T>) -> T {
    match tokio::time::timeout(timeout, future).await {
        Ok(value) => value,
        Err(_) => panic!("operation did not finish within {timeout:?}"),
    }
}
