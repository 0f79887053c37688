use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::entities::{DocumentEntity, World};

/// Longest accepted world name, in characters
pub const MAX_WORLD_NAME_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorldValidationError {
    #[error("World name cannot be empty")]
    BlankName,
    #[error("World name is {len} characters; at most {max} are allowed")]
    NameTooLong { len: usize, max: usize },
}

/// Request to create a world
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorldDto {
    pub name: String,
    #[serde(default)]
    pub has_life: bool,
}

impl CreateWorldDto {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            has_life: false,
        }
    }

    pub fn with_life(mut self, has_life: bool) -> Self {
        self.has_life = has_life;
        self
    }

    pub fn validate(&self) -> Result<(), WorldValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(WorldValidationError::BlankName);
        }
        let len = name.chars().count();
        if len > MAX_WORLD_NAME_LEN {
            return Err(WorldValidationError::NameTooLong {
                len,
                max: MAX_WORLD_NAME_LEN,
            });
        }
        Ok(())
    }

    /// Build the entity to insert; the repository assigns id and timestamps
    pub fn into_world(self) -> World {
        World::new(self.name.trim()).with_life(self.has_life)
    }
}

/// World as returned by the dispatch façade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldResponseDto {
    pub id: String,
    pub name: String,
    pub has_life: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    pub updated_at: String,
}

impl From<World> for WorldResponseDto {
    fn from(world: World) -> Self {
        Self {
            id: world.id().to_string(),
            created_at: world.meta.created_at.map(|t| t.to_rfc3339()),
            updated_at: world.meta.updated_at.to_rfc3339(),
            name: world.name,
            has_life: world.has_life,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation() {
        assert_eq!(CreateWorldDto::new("Mars").validate(), Ok(()));
        assert_eq!(
            CreateWorldDto::new("   ").validate(),
            Err(WorldValidationError::BlankName)
        );
        assert_eq!(
            CreateWorldDto::new("x".repeat(256)).validate(),
            Err(WorldValidationError::NameTooLong { len: 256, max: 255 })
        );
        assert_eq!(CreateWorldDto::new("é".repeat(255)).validate(), Ok(()));
    }

    #[test]
    fn test_deserializes_camel_case_with_default_life() {
        let dto: CreateWorldDto = serde_json::from_str(r#"{"name":"Mars"}"#).unwrap();
        assert!(!dto.has_life);

        let dto: CreateWorldDto =
            serde_json::from_str(r#"{"name":"Earth","hasLife":true}"#).unwrap();
        assert_eq!(dto, CreateWorldDto::new("Earth").with_life(true));
    }

    #[test]
    fn test_into_world_trims_name() {
        let world = CreateWorldDto::new("  Mars ").with_life(true).into_world();
        assert_eq!(world.name, "Mars");
        assert!(world.has_life);
        assert!(world.meta.has_blank_id());
    }
}
