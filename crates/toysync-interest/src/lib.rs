//! Toysync Interest - Who receives which toys' updates
//!
//! This crate implements the spatial interest-management layer:
//! - Region controllers: (subscribers × synchronizers) per region, plus
//!   the global fallback controller
//! - The controller registry with round-start init and teardown
//! - The `RegionMap` collaborator trait over the opaque region graph
//! - The interest manager reconciling each client's controller set as its
//!   position moves across regions

pub mod controller;
pub mod manager;
pub mod region;
pub mod registry;

pub use controller::*;
pub use manager::*;
pub use region::*;
pub use registry::*;
