//! Cadence Streams - Input stream interface and in-memory queues
//!
//! A handler only ever sees a stream through [`InputStream`]: the timestamp
//! of its next packet (or its bound when empty) and a pop at an exact
//! timestamp. [`InputStreamQueue`] is the in-memory implementation used by
//! the scheduler simulation and tests.

pub mod collection;
pub mod queue;
pub mod stream;

pub use collection::*;
pub use queue::*;
pub use stream::*;
