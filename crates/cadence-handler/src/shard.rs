//! Input sets handed to a node for one invocation

use cadence_core::{Packet, StreamId, Timestamp};

/// What one stream contributes to an invocation
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InputShard {
    /// Packet at the input timestamp; `None` if the stream had nothing there
    pub packet: Option<Packet>,
    /// The stream is drained and will never produce again
    pub stream_done: bool,
}

/// Per-invocation bundle: one optional shard slot per stream id.
///
/// Slots of streams outside the ready sync set stay empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputSet {
    timestamp: Timestamp,
    slots: Vec<Option<InputShard>>,
}

impl InputSet {
    pub fn new(timestamp: Timestamp, num_streams: usize) -> Self {
        InputSet {
            timestamp,
            slots: vec![None; num_streams],
        }
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Fill the slot for `id`. Ids past the end are ignored in release
    /// builds.
    pub fn set(&mut self, id: StreamId, packet: Option<Packet>, stream_done: bool) {
        debug_assert!(
            id.index() < self.slots.len(),
            "{:?} outside an input set of {} streams",
            id,
            self.slots.len()
        );
        if let Some(slot) = self.slots.get_mut(id.index()) {
            *slot = Some(InputShard {
                packet,
                stream_done,
            });
        }
    }

    pub fn get(&self, id: StreamId) -> Option<&InputShard> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub fn packet(&self, id: StreamId) -> Option<&Packet> {
        self.get(id).and_then(|shard| shard.packet.as_ref())
    }

    /// Move a packet out of its slot, leaving the slot's done flag.
    pub fn take_packet(&mut self, id: StreamId) -> Option<Packet> {
        self.slots
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .and_then(|shard| shard.packet.take())
    }

    /// Ids whose slot was filled, ascending
    pub fn filled_ids(&self) -> impl Iterator<Item = StreamId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(index, _)| StreamId::new(index))
    }

    /// Number of slots, one per stream of the node
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_set_slots_are_filled() {
        let mut set = InputSet::new(Timestamp::new(3), 4);
        set.set(StreamId::new(1), Some(Packet::marker(Timestamp::new(3))), false);
        set.set(StreamId::new(3), None, true);

        assert_eq!(
            set.filled_ids().collect::<Vec<_>>(),
            vec![StreamId::new(1), StreamId::new(3)]
        );
        assert!(set.get(StreamId::new(0)).is_none());
        assert!(set.packet(StreamId::new(3)).is_none());
        assert!(set.get(StreamId::new(3)).unwrap().stream_done);
    }

    #[test]
    fn test_take_packet_moves_ownership() {
        let mut set = InputSet::new(Timestamp::new(3), 1);
        set.set(StreamId::new(0), Some(Packet::marker(Timestamp::new(3))), false);

        assert!(set.take_packet(StreamId::new(0)).is_some());
        assert!(set.take_packet(StreamId::new(0)).is_none());
        assert!(set.get(StreamId::new(0)).is_some());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "outside an input set")]
    fn test_set_out_of_range_id_panics_in_debug() {
        let mut set = InputSet::new(Timestamp::new(0), 2);
        set.set(StreamId::new(2), None, false);
    }
}
