//! Storage schema knowledge
//!
//! `definitions` declares the logical entities once; `mapping` decides the
//! physical encoding of each column per backend. Any schema change belongs
//! here, never in the backend modules.

pub mod definitions;
pub mod mapping;

pub use definitions::*;
pub use mapping::{PhysicalEncoding, SchemaMapping};
