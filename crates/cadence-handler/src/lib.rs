//! Cadence Handlers - Deciding when a node runs and with which packets
//!
//! This crate implements the input stream handler protocol:
//! - Readiness verdicts and input sets handed to the scheduler
//! - The shared handler core (callbacks, invocation scheduling)
//! - The sync set handler: independently synchronized stream groups
//! - Sync set configuration
//! - A name-keyed registry of handler factories

pub mod config;
pub mod handler;
pub mod readiness;
pub mod registry;
pub mod shard;
pub mod sync_set;

pub use config::*;
pub use handler::*;
pub use readiness::*;
pub use registry::*;
pub use shard::*;
pub use sync_set::*;
