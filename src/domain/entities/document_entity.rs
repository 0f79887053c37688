//! Contract shared by every record stored through the document repository

use serde::{de::DeserializeOwned, Serialize};

use crate::domain::value_objects::DocumentMeta;

/// A record type persisted as a tagged JSON document
///
/// `ENTITY_TAG` names the type's partition in the bucket and prefixes every
/// document key. It must be non-blank and contain only ASCII letters, digits
/// and `_`; repositories reject any other tag before touching the store.
pub trait DocumentEntity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const ENTITY_TAG: &'static str;

    fn meta(&self) -> &DocumentMeta;

    fn meta_mut(&mut self) -> &mut DocumentMeta;

    fn id(&self) -> &str {
        &self.meta().id
    }
}
