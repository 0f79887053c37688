//! Document keys - Deterministic storage keys for tagged entities
//!
//! Every stored document lives at `"{entity_tag}-{id}"`. Entity tags are
//! restricted to `[A-Za-z0-9_]`, so the first `-` always separates tag from id
//! and two distinct (tag, id) pairs can never produce the same key.

use std::fmt;

use thiserror::Error;

const SEPARATOR: char = '-';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("Entity tag cannot be blank")]
    BlankTag,
    #[error("Entity tag '{0}' may only contain ASCII letters, digits and '_'")]
    InvalidTag(String),
    #[error("Document id cannot be blank")]
    BlankId,
}

/// Storage key for a single document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentKey {
    key: String,
    tag_len: usize,
}

impl DocumentKey {
    pub fn new(entity_tag: &str, id: &str) -> Result<Self, KeyError> {
        validate_entity_tag(entity_tag)?;
        if id.trim().is_empty() {
            return Err(KeyError::BlankId);
        }

        Ok(Self {
            key: format!("{entity_tag}{SEPARATOR}{id}"),
            tag_len: entity_tag.len(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }

    pub fn entity_tag(&self) -> &str {
        &self.key[..self.tag_len]
    }

    pub fn id(&self) -> &str {
        &self.key[self.tag_len + SEPARATOR.len_utf8()..]
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

impl AsRef<str> for DocumentKey {
    fn as_ref(&self) -> &str {
        &self.key
    }
}

/// Check that a tag is usable as the prefix of a document key
pub fn validate_entity_tag(entity_tag: &str) -> Result<(), KeyError> {
    if entity_tag.trim().is_empty() {
        return Err(KeyError::BlankTag);
    }
    if !entity_tag
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(KeyError::InvalidTag(entity_tag.to_string()));
    }
    Ok(())
}
