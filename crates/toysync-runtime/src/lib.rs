//! Toysync Runtime - The sync server and its tick loop
//!
//! This crate ties the layers together for one round:
//! - `RuntimeConfig`: cadence, debounce, and outdoor-band settings
//! - `SyncServer`: owns the controller registry and interest manager,
//!   drives the fixed-cadence reconcile/dispatch pass and the debounced
//!   vantage-event queue
//! - Spawn plumbing: toy construction, per-spawn sync toggles, despawn

pub mod config;
pub mod server;
pub mod spawn;

pub use config::*;
pub use server::*;
pub use spawn::*;
