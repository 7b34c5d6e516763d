//! Input stream interface consumed by handlers

use cadence_core::{Packet, Timestamp};

/// Summary of a stream's head: the next packet timestamp, or the bound
/// when nothing is buffered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamFront {
    pub timestamp: Timestamp,
    /// True when `timestamp` is a bound rather than a buffered packet
    pub empty: bool,
}

impl StreamFront {
    pub fn packet(timestamp: Timestamp) -> Self {
        StreamFront {
            timestamp,
            empty: false,
        }
    }

    pub fn bound(timestamp: Timestamp) -> Self {
        StreamFront {
            timestamp,
            empty: true,
        }
    }
}

/// Outcome of popping a stream at an exact timestamp
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PopResult {
    /// Packet at exactly the requested timestamp, if there was one
    pub packet: Option<Packet>,
    /// Packets discarded because they were earlier than the request
    pub dropped: usize,
    /// The stream is drained and will never produce again
    pub stream_done: bool,
}

/// An ordered, bounded sequence of timestamped packets.
///
/// Implementations manage their own synchronization; handlers call these
/// methods concurrently with producers.
pub trait InputStream: Send + Sync {
    fn name(&self) -> &str;

    /// Next packet timestamp, or the current bound when empty
    fn min_timestamp_or_bound(&self) -> StreamFront;

    /// Remove the packet at `timestamp`, discarding anything earlier
    fn pop_packet_at_timestamp(&self, timestamp: Timestamp) -> PopResult;
}
