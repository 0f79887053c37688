//! Domain layer - Core records with no storage dependencies
//!
//! This layer contains:
//! - Entities: World and the contract every stored record satisfies
//! - Value Objects: document keys, audit metadata, sub-document paths and values

pub mod entities;
pub mod value_objects;
