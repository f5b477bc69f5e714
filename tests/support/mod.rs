//! Shared fixtures for the integration tests.

#![allow(dead_code, unused_imports)]

mod dto;
mod failing;
mod racing;

pub use dto::{dtos, Dto};
pub use failing::{FailingCollection, Operation};
pub use racing::RacingCollection;

/// Route `tracing` output to the test harness; filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
