//! Identity and audit fields shared by every stored document

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Base fields flattened into every persisted entity
///
/// `entity` is owned by the repository: it is overwritten with the entity type's
/// tag on every write. `created_at` is set once on insert and carried through
/// upserts untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMeta {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub entity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

impl DocumentMeta {
    /// Persisted names of the fields above; only the repository writes them
    pub const FIELDS: [&'static str; 4] = ["id", "entity", "createdAt", "updatedAt"];

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// True when no usable identifier has been assigned yet
    pub fn has_blank_id(&self) -> bool {
        self.id.trim().is_empty()
    }

    /// Advance `updated_at` for a write happening at `now`
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = next_update_timestamp(self.updated_at, now);
    }
}

/// Timestamp for a write that follows one stamped `previous`.
///
/// Clocks can stall or step backwards between writes; the result is always
/// strictly later than `previous`.
pub fn next_update_timestamp(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > previous {
        now
    } else {
        previous + Duration::milliseconds(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_touch_uses_clock_when_it_moves_forward() {
        let earlier = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 5).unwrap();

        let mut meta = DocumentMeta {
            updated_at: earlier,
            ..DocumentMeta::default()
        };
        meta.touch(later);
        assert_eq!(meta.updated_at, later);
    }

    #[test]
    fn test_touch_is_monotonic_when_clock_stalls() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut meta = DocumentMeta {
            updated_at: now,
            ..DocumentMeta::default()
        };
        meta.touch(now);
        assert_eq!(meta.updated_at, now + Duration::milliseconds(1));
    }

    #[test]
    fn test_default_fields_are_omitted() {
        let meta = DocumentMeta::with_id("abc");
        let json = serde_json::to_value(&meta).unwrap();
        let object = json.as_object().unwrap();

        assert_eq!(object.get("id"), Some(&serde_json::json!("abc")));
        assert!(!object.contains_key("entity"));
        assert!(!object.contains_key("createdAt"));
        assert!(object.contains_key("updatedAt"));
    }

    #[test]
    fn test_field_names_match_persisted_keys() {
        let meta = DocumentMeta {
            id: "abc".to_string(),
            entity: "World".to_string(),
            created_at: Some(Utc::now()),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&meta).unwrap();
        let mut keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        let mut expected = DocumentMeta::FIELDS.to_vec();
        keys.sort_unstable();
        expected.sort_unstable();
        assert_eq!(keys, expected);
    }

    #[test]
    fn test_blank_id_detection() {
        assert!(DocumentMeta::default().has_blank_id());
        assert!(DocumentMeta::with_id("   ").has_blank_id());
        assert!(!DocumentMeta::with_id("x").has_blank_id());
    }
}
