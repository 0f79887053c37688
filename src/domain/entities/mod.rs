//! Domain entities - Core business objects with identity

mod document_entity;
mod world;

pub use document_entity::DocumentEntity;
pub use world::World;
