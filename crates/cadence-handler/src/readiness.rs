//! Readiness verdicts reported to the scheduler

use cadence_core::Timestamp;

/// Whether a node can run, and at which timestamp.
///
/// `NotReady` deliberately carries no timestamp: there is nothing a caller
/// could meaningfully read in that case.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeReadiness {
    /// No sync set has a complete packet set yet
    NotReady,
    /// A sync set is complete at the given timestamp
    ReadyForProcess(Timestamp),
    /// Every stream is exhausted; the node should be closed
    ReadyForClose,
}

impl NodeReadiness {
    /// Timestamp to process or close at. `None` when not ready.
    pub fn timestamp(self) -> Option<Timestamp> {
        match self {
            NodeReadiness::NotReady => None,
            NodeReadiness::ReadyForProcess(ts) => Some(ts),
            NodeReadiness::ReadyForClose => Some(Timestamp::Done),
        }
    }

    pub fn is_ready(self) -> bool {
        !matches!(self, NodeReadiness::NotReady)
    }
}
