//! Error types for Cadence

use thiserror::Error;

use crate::Timestamp;

/// Core Cadence errors
///
/// Every variant is a defect rather than a transient condition: callers
/// abort the session instead of retrying.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CadenceError {
    // Configuration errors
    #[error("Invalid tag/index reference: \"{0}\"")]
    InvalidTagIndex(String),

    #[error("Invalid stream declaration: \"{0}\"")]
    InvalidStreamDeclaration(String),

    #[error("Stream name \"{0}\" is declared more than once")]
    DuplicateStreamName(String),

    #[error("Tag \"{tag}\" has non-contiguous indexes: expected {expected}, got {actual}")]
    NonContiguousIndex {
        tag: String,
        expected: usize,
        actual: usize,
    },

    #[error("Tag map declares {expected} stream(s) but {actual} were supplied")]
    StreamCountMismatch { expected: usize, actual: usize },

    #[error("stream \"{0}\" is not found")]
    UnknownStream(String),

    #[error("stream \"{0}\" is in more than one sync set")]
    StreamInMultipleSyncSets(String),

    #[error("sync set {0} has no streams")]
    EmptySyncSet(usize),

    #[error("Unknown input stream handler: {0}")]
    UnknownHandler(String),

    // Stream errors
    #[error("Timestamp {timestamp} is not allowed on stream \"{stream}\"")]
    TimestampNotAllowed { stream: String, timestamp: Timestamp },

    #[error("Packet timestamp {timestamp} on stream \"{stream}\" is below the bound {bound}")]
    TimestampBelowBound {
        stream: String,
        timestamp: Timestamp,
        bound: Timestamp,
    },

    // Contract violations
    #[error("Input timestamp {0} is not allowed in a stream")]
    InputTimestampNotAllowed(Timestamp),

    #[error("No sync set is ready")]
    NothingReady,

    #[error("Input timestamp {actual} does not match the ready timestamp {expected}")]
    TimestampMismatch {
        expected: Timestamp,
        actual: Timestamp,
    },

    #[error("Dropped {count} packet(s) on input stream \"{stream}\".")]
    PacketsDropped { stream: String, count: usize },
}

impl CadenceError {
    /// Malformed graph definition, detected while building sync sets
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            CadenceError::InvalidTagIndex(_)
                | CadenceError::InvalidStreamDeclaration(_)
                | CadenceError::DuplicateStreamName(_)
                | CadenceError::NonContiguousIndex { .. }
                | CadenceError::StreamCountMismatch { .. }
                | CadenceError::UnknownStream(_)
                | CadenceError::StreamInMultipleSyncSets(_)
                | CadenceError::EmptySyncSet(_)
                | CadenceError::UnknownHandler(_)
        )
    }

    /// Runtime invariant break by this component or its caller
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            CadenceError::TimestampNotAllowed { .. }
                | CadenceError::InputTimestampNotAllowed(_)
                | CadenceError::NothingReady
                | CadenceError::TimestampMismatch { .. }
                | CadenceError::PacketsDropped { .. }
        )
    }
}

/// Result type for Cadence operations
pub type CadenceResult<T> = Result<T, CadenceError>;
