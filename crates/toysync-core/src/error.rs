//! Error types for toysync

use thiserror::Error;

use crate::{ClientId, RegionId, ToyId};

/// Errors surfaced by the synchronization core
#[derive(Error, Debug)]
pub enum SyncError {
    // Contract violations - fail fast, never retried
    #[error("Snapshot schema mismatch: expected {expected}, got {got}")]
    SchemaMismatch {
        expected: &'static str,
        got: &'static str,
    },

    #[error("Field bit {bit} allocated twice in layout for {kind}")]
    FieldBitCollision { kind: &'static str, bit: u32 },

    // Wire errors
    #[error("Buffer too short: expected {expected}, got {actual}")]
    BufferTooShort { expected: usize, actual: usize },

    #[error("Mask bit {0} not valid for this layout")]
    UnknownFieldBit(u32),

    // Missing collaborator state - logged, operation skipped
    #[error("No connection for client {0}")]
    MissingConnection(ClientId),

    #[error("Toy {0} is not attached to a controller")]
    Unattached(ToyId),

    #[error("No controller for region {0}")]
    UnknownRegion(RegionId),

    // Per-recipient dispatch failures - isolated, loop continues
    #[error("Send to client {client} failed: {reason}")]
    SendFailed { client: ClientId, reason: String },
}

/// Result type for toysync operations
pub type SyncResult<T> = Result<T, SyncError>;
