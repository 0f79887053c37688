//! Value objects - Immutable objects defined by their attributes

mod document_key;
mod document_meta;
mod document_path;
mod sub_document;

pub use document_key::{validate_entity_tag, DocumentKey, KeyError};
pub use document_meta::{next_update_timestamp, DocumentMeta};
pub use document_path::{DocumentPath, MutationMode, PathError};
pub use sub_document::SubDocumentValue;
