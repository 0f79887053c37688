//! Data Transfer Objects - For API boundaries
//!
//! DTOs live in the application layer so callers of the dispatch façade can
//! serialize/deserialize without depending on the stored document shape.

pub mod world;

pub use world::*;
