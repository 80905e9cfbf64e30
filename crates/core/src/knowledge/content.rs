#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

//! Helpers over the free-form `content` document. Content is an opaque JSON
//! value everywhere else; only this module looks at its top-level shape.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// A single top-level change between two content documents
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentChange {
    Added {
        key: String,
        value: JsonValue,
    },
    Removed {
        key: String,
    },
    Modified {
        key: String,
        old: JsonValue,
        new: JsonValue,
    },
}

/// Top-level differences between two content documents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentChanges {
    pub changes: Vec<ContentChange>,
}

impl ContentChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    #[must_use]
    pub fn added_count(&self) -> usize {
        self.count(|c| matches!(c, ContentChange::Added { .. }))
    }

    #[must_use]
    pub fn removed_count(&self) -> usize {
        self.count(|c| matches!(c, ContentChange::Removed { .. }))
    }

    #[must_use]
    pub fn modified_count(&self) -> usize {
        self.count(|c| matches!(c, ContentChange::Modified { .. }))
    }

    fn count(&self, predicate: impl Fn(&ContentChange) -> bool) -> usize {
        self.changes.iter().filter(|c| predicate(c)).count()
    }
}

fn as_object(value: &JsonValue) -> Map<String, JsonValue> {
    value.as_object().cloned().unwrap_or_default()
}

/// Compare two content documents by their top-level keys.
#[must_use]
pub fn diff_top_level(old: &JsonValue, new: &JsonValue) -> ContentChanges {
    let old_map = as_object(old);
    let new_map = as_object(new);

    let mut changes = Vec::new();

    for (key, value) in &new_map {
        if !old_map.contains_key(key) {
            changes.push(ContentChange::Added {
                key: key.clone(),
                value: value.clone(),
            });
        }
    }

    for key in old_map.keys() {
        if !new_map.contains_key(key) {
            changes.push(ContentChange::Removed { key: key.clone() });
        }
    }

    for (key, old_value) in &old_map {
        if let Some(new_value) = new_map.get(key) {
            if old_value != new_value {
                changes.push(ContentChange::Modified {
                    key: key.clone(),
                    old: old_value.clone(),
                    new: new_value.clone(),
                });
            }
        }
    }

    ContentChanges { changes }
}

/// Shallow-merge two documents; `remote` wins for overlapping top-level keys.
#[must_use]
pub fn shallow_merge(local: &JsonValue, remote: &JsonValue) -> JsonValue {
    let mut merged = as_object(local);
    for (key, value) in as_object(remote) {
        merged.insert(key, value);
    }
    JsonValue::Object(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_diff_top_level() {
        let old = json!({"mission": "a", "scale": "$20B+", "stage": "growth"});
        let new = json!({"mission": "a", "scale": "$25B+", "employees": 100});

        let diff = diff_top_level(&old, &new);
        assert_eq!(diff.added_count(), 1);
        assert_eq!(diff.removed_count(), 1);
        assert_eq!(diff.modified_count(), 1);
        assert!(diff.changes.contains(&ContentChange::Added {
            key: "employees".to_string(),
            value: json!(100),
        }));
        assert!(diff.changes.contains(&ContentChange::Removed {
            key: "stage".to_string(),
        }));
    }

    #[test]
    fn test_diff_identical_is_empty() {
        let content = json!({"mission": "a", "nested": {"x": 1}});
        assert!(diff_top_level(&content, &content.clone()).is_empty());
    }

    #[test]
    fn test_diff_non_object_content() {
        // Non-object documents diff as empty maps rather than panicking
        let diff = diff_top_level(&json!("text"), &json!({"a": 1}));
        assert_eq!(diff.added_count(), 1);
        assert_eq!(diff.removed_count(), 0);
    }

    #[test]
    fn test_shallow_merge_remote_precedence() {
        let local = json!({"summary": "local", "ceo_notes": "keep"});
        let remote = json!({"summary": "remote", "key_insights": "new"});

        let merged = shallow_merge(&local, &remote);
        assert_eq!(merged["summary"], json!("remote"));
        assert_eq!(merged["ceo_notes"], json!("keep"));
        assert_eq!(merged["key_insights"], json!("new"));
    }
}
