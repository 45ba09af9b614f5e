//! Foundational low-level utilities shared across triage crates.
//!
//! Provides time helpers used for request duration accounting and
//! record timestamping.

pub mod time_utils;

pub use time_utils::{current_unix_timestamp, current_unix_timestamp_ms};
