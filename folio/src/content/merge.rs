//! Overlay of a persisted document onto the seed defaults.
//!
//! Persisted documents come from two places that may be stale or hand-edited: the `portfolio_data`
//! row and the local cache file. Neither is trusted to match the current [`Snapshot`] shape, so
//! the document is merged section by section:
//!
//! - object sections (`profile`, `contact`, `cv`) are overlaid key by key; a key whose value has
//!   the wrong type keeps its default
//! - `skills` and `projects` must be non-empty, well-formed lists
//! - `stats`, `highlights` and `journey` are taken whole when well-formed
//!
//! A malformed field never discards the rest of the document.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use super::{Snapshot, defaults};

/// Result of merging a persisted document.
#[derive(Debug, Clone)]
pub struct Merged {
    pub snapshot: Snapshot,
    /// Paths that fell back to their default, e.g. `profile.skills` or `projects`
    pub fallbacks: Vec<String>,
}

pub fn merge_over_defaults(document: &Value) -> Merged {
    let mut fallbacks = Vec::new();

    let Some(doc) = document.as_object() else {
        return Merged {
            snapshot: defaults::seed(),
            fallbacks: vec!["$".to_string()],
        };
    };

    let snapshot = Snapshot {
        profile: overlay_object("profile", defaults::profile(), doc.get("profile"), &mut fallbacks),
        skills: whole_list("skills", defaults::skills(), doc.get("skills"), true, &mut fallbacks),
        projects: whole_list("projects", defaults::projects(), doc.get("projects"), true, &mut fallbacks),
        contact: overlay_object("contact", defaults::contact(), doc.get("contact"), &mut fallbacks),
        cv: overlay_object("cv", defaults::cv(), doc.get("cv"), &mut fallbacks),
        stats: whole_list("stats", defaults::stats(), doc.get("stats"), false, &mut fallbacks),
        highlights: whole_list("highlights", defaults::highlights(), doc.get("highlights"), false, &mut fallbacks),
        journey: whole_list("journey", defaults::journey(), doc.get("journey"), false, &mut fallbacks),
    };

    Merged { snapshot, fallbacks }
}

/// Overlay each key of `incoming` onto `default`, keeping only keys that still deserialise.
fn overlay_object<T>(section: &str, default: T, incoming: Option<&Value>, fallbacks: &mut Vec<String>) -> T
where
    T: Serialize + DeserializeOwned,
{
    let incoming = match incoming {
        Some(Value::Object(map)) => map,
        _ => {
            fallbacks.push(section.to_string());
            return default;
        }
    };

    let mut merged: Map<String, Value> = match serde_json::to_value(&default) {
        Ok(Value::Object(map)) => map,
        _ => return default,
    };

    let known_keys: Vec<String> = merged.keys().cloned().collect();
    for key in known_keys {
        let Some(value) = incoming.get(&key) else {
            fallbacks.push(format!("{section}.{key}"));
            continue;
        };

        let mut candidate = merged.clone();
        candidate.insert(key.clone(), value.clone());
        if serde_json::from_value::<T>(Value::Object(candidate.clone())).is_ok() {
            merged = candidate;
        } else {
            fallbacks.push(format!("{section}.{key}"));
        }
    }

    serde_json::from_value(Value::Object(merged)).unwrap_or(default)
}

fn whole_list<T>(section: &str, default: Vec<T>, incoming: Option<&Value>, require_items: bool, fallbacks: &mut Vec<String>) -> Vec<T>
where
    T: DeserializeOwned,
{
    let parsed = incoming
        .filter(|value| value.is_array())
        .and_then(|value| serde_json::from_value::<Vec<T>>(value.clone()).ok());

    match parsed {
        Some(items) if !(require_items && items.is_empty()) => items,
        _ => {
            fallbacks.push(section.to_string());
            default
        }
    }
}
