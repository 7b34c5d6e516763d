//! In-memory input stream queue

use std::collections::VecDeque;

use cadence_core::{CadenceError, CadenceResult, Packet, Timestamp};
use parking_lot::Mutex;
use tracing::trace;

use crate::{InputStream, PopResult, StreamFront};

#[derive(Debug)]
struct QueueState {
    packets: VecDeque<Packet>,
    /// No packet earlier than this will ever be added
    bound: Timestamp,
}

/// Thread-safe packet queue with a timestamp bound.
///
/// INVARIANT: every buffered packet is strictly earlier than `bound`, and
/// packets are in strictly increasing timestamp order.
#[derive(Debug)]
pub struct InputStreamQueue {
    name: String,
    state: Mutex<QueueState>,
}

impl InputStreamQueue {
    pub fn new(name: impl Into<String>) -> Self {
        InputStreamQueue {
            name: name.into(),
            state: Mutex::new(QueueState {
                packets: VecDeque::new(),
                bound: Timestamp::PreStream,
            }),
        }
    }

    /// Append a packet. Its timestamp must be allowed in a stream and not
    /// below the current bound.
    pub fn add_packet(&self, packet: Packet) -> CadenceResult<()> {
        let timestamp = packet.timestamp();
        if !timestamp.is_allowed_in_stream() {
            return Err(CadenceError::TimestampNotAllowed {
                stream: self.name.clone(),
                timestamp,
            });
        }

        let mut state = self.state.lock();
        if timestamp < state.bound {
            return Err(CadenceError::TimestampBelowBound {
                stream: self.name.clone(),
                timestamp,
                bound: state.bound,
            });
        }
        state.bound = timestamp.next_allowed_in_stream();
        state.packets.push_back(packet);
        Ok(())
    }

    /// Promise that nothing earlier than `bound` will arrive. Lower bounds
    /// are ignored.
    pub fn set_next_timestamp_bound(&self, bound: Timestamp) {
        let mut state = self.state.lock();
        if bound > state.bound {
            state.bound = bound;
        }
    }

    /// No further packets will be added.
    pub fn close(&self) {
        self.state.lock().bound = Timestamp::Done;
    }

    pub fn bound(&self) -> Timestamp {
        self.state.lock().bound
    }

    pub fn queue_size(&self) -> usize {
        self.state.lock().packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().packets.is_empty()
    }
}

impl InputStream for InputStreamQueue {
    fn name(&self) -> &str {
        &self.name
    }

    fn min_timestamp_or_bound(&self) -> StreamFront {
        let state = self.state.lock();
        match state.packets.front() {
            Some(packet) => StreamFront::packet(packet.timestamp()),
            None => StreamFront::bound(state.bound),
        }
    }

    fn pop_packet_at_timestamp(&self, timestamp: Timestamp) -> PopResult {
        let mut state = self.state.lock();

        let mut dropped = 0;
        while state
            .packets
            .front()
            .is_some_and(|p| p.timestamp() < timestamp)
        {
            state.packets.pop_front();
            dropped += 1;
        }

        let packet = if state
            .packets
            .front()
            .is_some_and(|p| p.timestamp() == timestamp)
        {
            state.packets.pop_front()
        } else {
            None
        };

        // Popping at a timestamp settles everything up to and including it.
        if state.bound <= timestamp {
            state.bound = timestamp.next_allowed_in_stream();
        }

        let stream_done = state.packets.is_empty() && state.bound == Timestamp::Done;
        trace!(
            stream = %self.name,
            %timestamp,
            has_packet = packet.is_some(),
            dropped,
            stream_done,
            "popped"
        );

        PopResult {
            packet,
            dropped,
            stream_done,
        }
    }
}
