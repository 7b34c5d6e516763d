//! A node's input streams, addressable by id or tag/index

use std::ops::Index;
use std::sync::Arc;

use cadence_core::{CadenceError, CadenceResult, StreamId, TagIndex, TagMap};

use crate::{InputStream, InputStreamQueue};

/// The full, ordered set of a node's input streams
pub struct InputStreamCollection {
    tag_map: TagMap,
    /// Indexed by `StreamId`
    streams: Vec<Arc<dyn InputStream>>,
}

impl InputStreamCollection {
    /// Pair a tag map with one stream per declared id, in id order.
    pub fn new(tag_map: TagMap, streams: Vec<Arc<dyn InputStream>>) -> CadenceResult<Self> {
        if tag_map.num_entries() != streams.len() {
            return Err(CadenceError::StreamCountMismatch {
                expected: tag_map.num_entries(),
                actual: streams.len(),
            });
        }
        Ok(InputStreamCollection { tag_map, streams })
    }

    /// Build a collection of in-memory queues from stream declarations.
    ///
    /// Returns the queues in id order alongside the collection so callers
    /// can feed them.
    pub fn with_queues<S: AsRef<str>>(
        declarations: &[S],
    ) -> CadenceResult<(Self, Vec<Arc<InputStreamQueue>>)> {
        let tag_map = TagMap::new(declarations)?;
        let queues: Vec<Arc<InputStreamQueue>> = tag_map
            .ids()
            .map(|id| Arc::new(InputStreamQueue::new(tag_map.name(id).unwrap_or_default())))
            .collect();
        let streams = queues
            .iter()
            .map(|q| Arc::clone(q) as Arc<dyn InputStream>)
            .collect();
        Ok((InputStreamCollection::new(tag_map, streams)?, queues))
    }

    /// Resolve a tag and index to a stream id.
    pub fn resolve(&self, tag: &str, index: usize) -> Option<StreamId> {
        self.tag_map.get_id(tag, index)
    }

    pub fn resolve_tag_index(&self, tag_index: &TagIndex) -> Option<StreamId> {
        self.tag_map.resolve(tag_index)
    }

    pub fn get(&self, id: StreamId) -> Option<&Arc<dyn InputStream>> {
        self.streams.get(id.index())
    }

    pub fn tag_map(&self) -> &TagMap {
        &self.tag_map
    }

    pub fn ids(&self) -> impl Iterator<Item = StreamId> + '_ {
        self.tag_map.ids()
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

/// Ids handed out by this collection's tag map are always in range.
///
/// # Panics
///
/// Panics if `id` belongs to another collection.
impl Index<StreamId> for InputStreamCollection {
    type Output = Arc<dyn InputStream>;

    fn index(&self, id: StreamId) -> &Self::Output {
        &self.streams[id.index()]
    }
}

impl std::fmt::Debug for InputStreamCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputStreamCollection")
            .field("tag_map", &self.tag_map)
            .field("streams", &self.streams.len())
            .finish()
    }
}
