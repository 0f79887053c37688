//! World repository

use crate::domain::entities::World;

use super::DocumentRepository;

/// Repository for World documents, keyed `World-{id}`
pub type WorldRepository = DocumentRepository<World>;
