//! Sync set input stream handler
//!
//! Partitions a node's inputs into sync sets that are synchronized
//! independently of each other. The node is ready as soon as any one set
//! has a complete packet set, and every invocation carries the packets of
//! exactly one set. Timestamps are increasing within a set but may jump
//! around between sets.

use std::collections::HashSet;
use std::sync::Arc;

use cadence_core::{CadenceError, CadenceResult, StreamId, TagIndex, Timestamp};
use cadence_stream::InputStreamCollection;
use parking_lot::Mutex;
use tracing::{debug, error, trace};

use crate::{
    HandlerCallbacks, HandlerCore, InputSet, InputStreamHandler, NodeReadiness, SyncSetConfig,
};

/// The sync set found ready by the last evaluation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadySyncSet {
    /// Position in the current sync set collection
    pub index: usize,
    pub timestamp: Timestamp,
}

#[derive(Debug, Default)]
struct SyncSetState {
    sync_sets: Vec<Vec<StreamId>>,
    /// INVARIANT: when armed, `sync_sets[index]` exists and is ready at
    /// exactly `timestamp`.
    ready: Option<ReadySyncSet>,
    /// Set once an extraction violated the stream contract. A set may be
    /// partly drained at that point, so nothing is delivered afterwards.
    failed: Option<CadenceError>,
}

/// Resolve configured sync sets against a node's streams.
///
/// Every stream not named by the configuration lands in one trailing set,
/// added only if non-empty. The result partitions the collection's ids.
pub fn build_sync_sets(
    streams: &InputStreamCollection,
    config: &SyncSetConfig,
) -> CadenceResult<Vec<Vec<StreamId>>> {
    let mut used = HashSet::new();
    let mut sync_sets = Vec::with_capacity(config.sync_sets.len() + 1);

    for (set_index, spec) in config.sync_sets.iter().enumerate() {
        if spec.tag_index.is_empty() {
            return Err(CadenceError::EmptySyncSet(set_index));
        }
        let mut ids = Vec::with_capacity(spec.tag_index.len());
        for reference in &spec.tag_index {
            let tag_index = TagIndex::parse(reference)?;
            let id = streams
                .resolve_tag_index(&tag_index)
                .ok_or_else(|| CadenceError::UnknownStream(reference.clone()))?;
            if !used.insert(id) {
                return Err(CadenceError::StreamInMultipleSyncSets(reference.clone()));
            }
            ids.push(id);
        }
        sync_sets.push(ids);
    }

    let remaining: Vec<StreamId> = streams.ids().filter(|id| !used.contains(id)).collect();
    if !remaining.is_empty() {
        sync_sets.push(remaining);
    }
    Ok(sync_sets)
}

/// Input stream handler that synchronizes each sync set on its own.
pub struct SyncSetInputStreamHandler {
    core: HandlerCore,
    options: SyncSetConfig,
    state: Mutex<SyncSetState>,
}

impl SyncSetInputStreamHandler {
    pub const NAME: &'static str = "SyncSetInputStreamHandler";

    pub fn new(streams: Arc<InputStreamCollection>, options: SyncSetConfig) -> Self {
        SyncSetInputStreamHandler {
            core: HandlerCore::new(streams),
            options,
            state: Mutex::new(SyncSetState::default()),
        }
    }

    /// Rebuild the sync sets from `config`, disarm, and install the
    /// scheduler callbacks.
    ///
    /// A configuration error leaves the previous sync sets in place and
    /// must abort the session.
    pub fn prepare(&self, config: &SyncSetConfig, callbacks: HandlerCallbacks) -> CadenceResult<()> {
        let sync_sets = build_sync_sets(self.core.streams(), config).map_err(|err| {
            error!(%err, "invalid sync set configuration");
            err
        })?;
        debug!(
            sync_sets = sync_sets.len(),
            explicit = config.sync_sets.len(),
            "sync sets built"
        );

        {
            let mut state = self.state.lock();
            state.sync_sets = sync_sets;
            state.ready = None;
            state.failed = None;
        }

        self.core.prepare_for_run(callbacks);
        Ok(())
    }

    /// Snapshot of the remaining sync sets, in evaluation order
    pub fn sync_sets(&self) -> Vec<Vec<StreamId>> {
        self.state.lock().sync_sets.clone()
    }

    pub fn ready_sync_set(&self) -> Option<ReadySyncSet> {
        self.state.lock().ready
    }

    /// Minimum head timestamp across the set, and minimum bound across its
    /// empty streams. Both start at `Done`.
    fn scan(&self, sync_set: &[StreamId]) -> (Timestamp, Timestamp) {
        let mut min_value = Timestamp::Done;
        let mut min_bound = Timestamp::Done;
        let streams = self.core.streams();
        for &id in sync_set {
            let front = streams[id].min_timestamp_or_bound();
            if front.empty {
                min_bound = min_bound.min(front.timestamp);
            }
            min_value = min_value.min(front.timestamp);
        }
        (min_value, min_bound)
    }
}

impl InputStreamHandler for SyncSetInputStreamHandler {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn core(&self) -> &HandlerCore {
        &self.core
    }

    fn prepare_for_run(&self, callbacks: HandlerCallbacks) -> CadenceResult<()> {
        self.prepare(&self.options, callbacks)
    }

    fn node_readiness(&self) -> NodeReadiness {
        let mut guard = self.state.lock();
        if guard.failed.is_some() {
            return NodeReadiness::NotReady;
        }
        if let Some(ready) = guard.ready {
            return NodeReadiness::ReadyForProcess(ready.timestamp);
        }

        let SyncSetState { sync_sets, ready, .. } = &mut *guard;
        let mut index = 0;
        while index < sync_sets.len() {
            let (min_value, min_bound) = self.scan(&sync_sets[index]);

            if min_value.is_done() {
                // Removal shifts only the sets after `index`; anything armed
                // in this scan sits before it.
                debug!(sync_set = index, streams = ?sync_sets[index], "sync set exhausted");
                sync_sets.remove(index);
                continue;
            }

            if min_bound > min_value {
                let earlier = match *ready {
                    Some(current) => min_value < current.timestamp,
                    None => true,
                };
                if earlier {
                    trace!(sync_set = index, timestamp = %min_value, "sync set ready");
                    *ready = Some(ReadySyncSet {
                        index,
                        timestamp: min_value,
                    });
                }
            } else {
                // An empty stream's bound ties the minimum: a packet may still
                // arrive there.
                debug_assert_eq!(min_bound, min_value);
            }
            index += 1;
        }

        match *ready {
            Some(ready) => NodeReadiness::ReadyForProcess(ready.timestamp),
            None if sync_sets.is_empty() => NodeReadiness::ReadyForClose,
            None => NodeReadiness::NotReady,
        }
    }

    fn fill_input_set(&self, timestamp: Timestamp) -> CadenceResult<InputSet> {
        let result = self.fill_ready_sync_set(timestamp);
        if let Err(err) = &result {
            error!(%err, %timestamp, "sync set contract violated");
        }
        result
    }
}

impl SyncSetInputStreamHandler {
    fn fill_ready_sync_set(&self, timestamp: Timestamp) -> CadenceResult<InputSet> {
        if !timestamp.is_allowed_in_stream() {
            return Err(CadenceError::InputTimestampNotAllowed(timestamp));
        }

        let mut state = self.state.lock();
        if let Some(err) = &state.failed {
            return Err(err.clone());
        }
        let ready = state.ready.ok_or(CadenceError::NothingReady)?;
        if ready.timestamp != timestamp {
            return Err(CadenceError::TimestampMismatch {
                expected: ready.timestamp,
                actual: timestamp,
            });
        }

        let streams = self.core.streams();
        let mut input_set = InputSet::new(timestamp, streams.len());
        let mut violation = None;
        for &id in &state.sync_sets[ready.index] {
            let stream = &streams[id];
            let popped = stream.pop_packet_at_timestamp(timestamp);
            if popped.dropped > 0 {
                violation = Some(CadenceError::PacketsDropped {
                    stream: stream.name().to_string(),
                    count: popped.dropped,
                });
                break;
            }
            input_set.set(id, popped.packet, popped.stream_done);
        }

        state.ready = None;
        match violation {
            Some(err) => {
                state.failed = Some(err.clone());
                Err(err)
            }
            None => Ok(input_set),
        }
    }
}

impl std::fmt::Debug for SyncSetInputStreamHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSetInputStreamHandler")
            .field("options", &self.options)
            .field("state", &*self.state.lock())
            .finish()
    }
}
