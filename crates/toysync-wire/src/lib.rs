//! Toysync Wire - Patch encoding for delta-state synchronization
//!
//! One patch message per (toy, subscriber) update:
//! `[toy id: u64 LE][field mask: layout width, LE][changed fields, ascending bit order]`
//!
//! Field bits form a single flat enumeration per concrete toy kind; a kind
//! never reuses a bit of its base layout. An empty mask is a valid message
//! with zero field bytes.

pub mod codec;
pub mod layout;
pub mod mask;
pub mod patch;

pub use codec::*;
pub use layout::*;
pub use mask::*;
pub use patch::*;
