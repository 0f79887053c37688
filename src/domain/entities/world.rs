//! World entity - A planet or setting record

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::DocumentEntity;
use crate::domain::value_objects::DocumentMeta;

/// A world record
///
/// Fields the type does not name (for example sub-documents such as `moons`
/// written at a path) are kept in `sub_documents`, so reading and re-writing a
/// world never drops them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct World {
    #[serde(flatten)]
    pub meta: DocumentMeta,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub has_life: bool,
    #[serde(flatten)]
    pub sub_documents: Map<String, Value>,
}

impl World {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.meta.id = id.into();
        self
    }

    pub fn with_life(mut self, has_life: bool) -> Self {
        self.has_life = has_life;
        self
    }

    pub fn sub_document(&self, name: &str) -> Option<&Value> {
        self.sub_documents.get(name)
    }
}

impl DocumentEntity for World {
    const ENTITY_TAG: &'static str = "World";

    fn meta(&self) -> &DocumentMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut DocumentMeta {
        &mut self.meta
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}
