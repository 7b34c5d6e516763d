//! Sync set configuration

use serde::{Deserialize, Serialize};

/// One explicitly declared sync set: tag/index references such as
/// `"VIDEO"`, `"AUDIO:1"` or `":2"`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSetSpec {
    pub tag_index: Vec<String>,
}

impl SyncSetSpec {
    pub fn new<I, S>(tag_index: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SyncSetSpec {
            tag_index: tag_index.into_iter().map(Into::into).collect(),
        }
    }
}

/// Grouping of a node's inputs into independently synchronized sets.
///
/// Streams not named by any set form one implicit trailing set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSetConfig {
    #[serde(default)]
    pub sync_sets: Vec<SyncSetSpec>,
}

impl SyncSetConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sync_set<I, S>(mut self, tag_index: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sync_sets.push(SyncSetSpec::new(tag_index));
        self
    }
}

/// Options passed to every handler factory
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerOptions {
    #[serde(default)]
    pub sync_set: SyncSetConfig,
}

impl HandlerOptions {
    pub fn with_sync_sets(sync_set: SyncSetConfig) -> Self {
        HandlerOptions { sync_set }
    }
}
