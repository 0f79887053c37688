//! Sub-document paths - Dotted addresses inside a stored JSON document

use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

/// How a sub-document mutation treats an existing value at the target path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationMode {
    /// Fail if the path already holds a value
    Insert,
    /// Write unconditionally
    Upsert,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("Sub-document path cannot be empty")]
    Empty,
    #[error("Sub-document path '{0}' contains an empty segment")]
    EmptySegment(String),
    #[error("Path '{path}' crosses a non-object value at '{segment}'")]
    Mismatch { path: String, segment: String },
    #[error("Path '{0}' already exists")]
    Exists(String),
    #[error("Path '{path}' targets the reserved field '{field}'")]
    Reserved { path: String, field: String },
}

impl PathError {
    /// The offending path, empty when none was given
    pub fn path(&self) -> &str {
        match self {
            Self::Empty => "",
            Self::EmptySegment(path) | Self::Exists(path) => path,
            Self::Mismatch { path, .. } | Self::Reserved { path, .. } => path,
        }
    }
}

/// A dotted path such as `moons` or `climate.zones`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPath {
    raw: String,
    segments: Vec<String>,
}

impl DocumentPath {
    pub fn parse(path: &str) -> Result<Self, PathError> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err(PathError::Empty);
        }

        let segments: Vec<String> = trimmed.split('.').map(str::to_string).collect();
        if segments.iter().any(|s| s.trim().is_empty()) {
            return Err(PathError::EmptySegment(trimmed.to_string()));
        }

        Ok(Self {
            raw: trimmed.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Fail if the path starts at one of `reserved` top-level fields
    pub fn ensure_not_reserved(&self, reserved: &[&str]) -> Result<(), PathError> {
        match self.segments.first() {
            Some(first) if reserved.contains(&first.as_str()) => Err(PathError::Reserved {
                path: self.raw.clone(),
                field: first.clone(),
            }),
            _ => Ok(()),
        }
    }

    /// Write `value` at this path inside `document`.
    ///
    /// Missing intermediate objects are created. The document itself must be
    /// a JSON object.
    pub fn apply(
        &self,
        document: &mut Value,
        value: Value,
        mode: MutationMode,
    ) -> Result<(), PathError> {
        let (leaf, parents) = match self.segments.split_last() {
            Some(split) => split,
            None => return Err(PathError::Empty),
        };

        let mut current = document;
        for segment in parents {
            let object = current.as_object_mut().ok_or_else(|| self.mismatch(segment))?;
            current = object
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
        }

        let object = current.as_object_mut().ok_or_else(|| self.mismatch(leaf))?;
        if mode == MutationMode::Insert && object.contains_key(leaf) {
            return Err(PathError::Exists(self.raw.clone()));
        }
        object.insert(leaf.clone(), value);
        Ok(())
    }

    /// Read the value stored at this path, if any
    pub fn lookup<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(document, |current, segment| current.get(segment))
    }

    fn mismatch(&self, segment: &str) -> PathError {
        PathError::Mismatch {
            path: self.raw.clone(),
            segment: segment.to_string(),
        }
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse() {
        let path = DocumentPath::parse("climate.zones").unwrap();
        assert_eq!(path.segments(), &["climate".to_string(), "zones".to_string()]);
        assert_eq!(DocumentPath::parse(""), Err(PathError::Empty));
        assert_eq!(
            DocumentPath::parse("a..b"),
            Err(PathError::EmptySegment("a..b".to_string()))
        );
    }

    #[test]
    fn test_insert_creates_intermediate_objects() {
        let mut doc = json!({"name": "Mars"});
        let path = DocumentPath::parse("climate.zones").unwrap();
        path.apply(&mut doc, json!(["polar"]), MutationMode::Insert)
            .unwrap();

        assert_eq!(doc, json!({"name": "Mars", "climate": {"zones": ["polar"]}}));
        assert_eq!(path.lookup(&doc), Some(&json!(["polar"])));
    }

    #[test]
    fn test_insert_fails_when_path_exists() {
        let mut doc = json!({"moons": ["Phobos"]});
        let path = DocumentPath::parse("moons").unwrap();
        let result = path.apply(&mut doc, json!([]), MutationMode::Insert);

        assert_eq!(result, Err(PathError::Exists("moons".to_string())));
        assert_eq!(doc, json!({"moons": ["Phobos"]}));
    }

    #[test]
    fn test_upsert_overwrites() {
        let mut doc = json!({"moons": ["Phobos"]});
        let path = DocumentPath::parse("moons").unwrap();
        path.apply(&mut doc, json!(["Phobos", "Deimos"]), MutationMode::Upsert)
            .unwrap();

        assert_eq!(doc, json!({"moons": ["Phobos", "Deimos"]}));
    }

    #[test]
    fn test_reserved_first_segment() {
        let reserved = ["id", "createdAt"];
        assert_eq!(
            DocumentPath::parse("createdAt.year")
                .unwrap()
                .ensure_not_reserved(&reserved),
            Err(PathError::Reserved {
                path: "createdAt.year".to_string(),
                field: "createdAt".to_string(),
            })
        );
        assert!(DocumentPath::parse("moons.id")
            .unwrap()
            .ensure_not_reserved(&reserved)
            .is_ok());
    }

    #[test]
    fn test_mismatch_on_scalar_intermediate() {
        let mut doc = json!({"name": "Mars"});
        let path = DocumentPath::parse("name.first").unwrap();
        let result = path.apply(&mut doc, json!(1), MutationMode::Upsert);

        assert_eq!(
            result,
            Err(PathError::Mismatch {
                path: "name.first".to_string(),
                segment: "first".to_string(),
            })
        );
    }
}
