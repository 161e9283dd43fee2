#![forbid(unsafe_code)]

//! Test harness for Bindery.
//!
//! Provides [`HeadlessHost`], a deterministic stand-in for a UI framework,
//! and [`init_test_tracing`] for readable logs in tests.

pub mod host;

pub use host::{FrameRecord, HeadlessHost, TaskError};

/// Route `tracing` output to the test writer. Safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
