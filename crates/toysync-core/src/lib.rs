//! Toysync Core - Fundamental types and primitives
//!
//! This crate defines the core types used throughout toysync:
//! - Identifiers (ToyId, ClientId, RegionId)
//! - Math primitives (Vec3, Quat, CompressedQuat, Color)
//! - The toy data model (Toy, Transform, ToyDetail)
//! - Error types

pub mod error;
pub mod id;
pub mod math;
pub mod toy;

pub use error::*;
pub use id::*;
pub use math::*;
pub use toy::*;
