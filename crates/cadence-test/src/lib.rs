//! Cadence Test Harness - Scheduler simulation and end-to-end validation
//!
//! This crate provides:
//! - Seeded producers feeding input streams at independent paces
//! - A scheduler simulator driving a handler from the registry
//! - Reports checking exactly-once delivery and sync set granularity
//! - Test logging setup

pub mod logging;
pub mod scenarios;
pub mod simulator;

pub use logging::*;
pub use simulator::*;
