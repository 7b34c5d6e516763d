//! Cadence Core - Fundamental types shared by streams and handlers
//!
//! This crate defines:
//! - Timestamps with explicit pre-stream, post-stream and done cases
//! - Stream identifiers and tag/index references
//! - Tag maps assigning identifiers to a node's input streams
//! - Packets and the shared error type

pub mod error;
pub mod id;
pub mod packet;
pub mod tag;
pub mod time;

pub use error::*;
pub use id::*;
pub use packet::*;
pub use tag::*;
pub use time::*;
