use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::FromRow;

/// The stored content snapshot, one row per owner.
///
/// Every section column is nullable JSONB; sections are merged over the defaults on load, so
/// a missing or stale column degrades to default content rather than failing the read.
#[derive(Debug, Clone, FromRow)]
pub struct PortfolioRow {
    pub owner_key: String,
    pub profile: Option<Value>,
    pub skills: Option<Value>,
    pub projects: Option<Value>,
    pub contact: Option<Value>,
    pub cv: Option<Value>,
    pub stats: Option<Value>,
    pub highlights: Option<Value>,
    pub journey: Option<Value>,
    pub revision: i64,
    pub updated_at: DateTime<Utc>,
}

impl PortfolioRow {
    /// Reassemble the section columns into one snapshot document.
    pub fn into_document(self) -> Value {
        let sections = [
            ("profile", self.profile),
            ("skills", self.skills),
            ("projects", self.projects),
            ("contact", self.contact),
            ("cv", self.cv),
            ("stats", self.stats),
            ("highlights", self.highlights),
            ("journey", self.journey),
        ];

        let document: Map<String, Value> = sections
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key.to_string(), v)))
            .collect();
        Value::Object(document)
    }
}
