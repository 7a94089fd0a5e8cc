//! Toysync State - Snapshots, delta encoding, and per-object synchronizers
//!
//! This crate implements the per-subscriber delta-state protocol:
//! - Versioned snapshots of a toy's synchronizable fields
//! - The pure delta encoder (canonical × cached → mask + payload)
//! - The synchronizer state machine (drift detection, per-subscriber sync,
//!   visibility gating, the light-off shortcut)
//! - The `Gateway` collaborator trait (transport + visibility toggles)

pub mod delta;
pub mod gateway;
pub mod snapshot;
pub mod synchronizer;

pub use delta::*;
pub use gateway::*;
pub use snapshot::*;
pub use synchronizer::*;
