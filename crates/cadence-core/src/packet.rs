//! Timestamped packets carried by input streams

use bytes::Bytes;

use crate::Timestamp;

/// An immutable payload stamped with the time it belongs to.
///
/// Cloning is cheap; the payload is reference counted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packet {
    timestamp: Timestamp,
    payload: Bytes,
}

impl Packet {
    pub fn new(timestamp: Timestamp, payload: impl Into<Bytes>) -> Self {
        Packet {
            timestamp,
            payload: payload.into(),
        }
    }

    /// Packet without payload, used as a pure timing marker
    pub fn marker(timestamp: Timestamp) -> Self {
        Packet {
            timestamp,
            payload: Bytes::new(),
        }
    }

    #[inline]
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    #[inline]
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }
}
