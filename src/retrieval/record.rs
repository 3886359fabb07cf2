//! Job payloads and scored retrieval items

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Payload key holding the logical job identifier shared by all chunks of a posting
pub const JOB_ID_FIELD: &str = "chunk_id";

/// Job posting payload as indexed by the ingestion pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Stored under the `Level` payload key
    #[serde(rename = "Level", default, skip_serializing_if = "Option::is_none")]
    pub job_level: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<String>,

    /// Chunk text
    #[serde(default)]
    pub text: String,

    /// Payload attributes this crate does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JobRecord {
    /// Build a record from a raw engine payload
    ///
    /// Scalar values are stringified so a numeric date or level does not sink the
    /// whole record. Returns the logical job id alongside the record when the
    /// payload carries one.
    pub fn from_payload(mut payload: Map<String, Value>) -> (Option<String>, Self) {
        let job_id = payload.remove(JOB_ID_FIELD).and_then(scalar_to_string);
        let mut take = |key: &str| payload.remove(key).and_then(scalar_to_string);

        let record = Self {
            job_title: take("job_title"),
            company: take("company"),
            category: take("category"),
            location: take("location"),
            job_level: take("Level"),
            publication_date: take("publication_date"),
            text: take("text").unwrap_or_default(),
            extra: payload,
        };

        (job_id, record)
    }

    /// Look up a payload field by its index key
    pub fn field(&self, key: &str) -> Option<&str> {
        match key {
            "job_title" => self.job_title.as_deref(),
            "company" => self.company.as_deref(),
            "category" => self.category.as_deref(),
            "location" => self.location.as_deref(),
            "Level" | "job_level" => self.job_level.as_deref(),
            "publication_date" => self.publication_date.as_deref(),
            "text" => Some(self.text.as_str()),
            other => self.extra.get(other).and_then(Value::as_str),
        }
    }
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// One retrieved chunk with its relevance score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedItem {
    /// Engine point id; unique per chunk
    pub point_id: String,

    /// Logical job id; shared by every chunk of the same posting
    pub identifier: String,

    /// Relevance score, higher is better
    pub score: f32,

    pub payload: JobRecord,
}

impl RetrievedItem {
    pub fn new(
        point_id: impl Into<String>,
        identifier: impl Into<String>,
        score: f32,
        payload: JobRecord,
    ) -> Self {
        Self {
            point_id: point_id.into(),
            identifier: identifier.into(),
            score,
            payload,
        }
    }

    /// Build from an engine point. The job id falls back to the point id.
    pub fn from_point(point_id: String, score: f32, payload: Map<String, Value>) -> Self {
        let (job_id, record) = JobRecord::from_payload(payload);
        Self {
            identifier: job_id.unwrap_or_else(|| point_id.clone()),
            point_id,
            score,
            payload: record,
        }
    }

    /// Get a short preview of the text (first N characters)
    pub fn preview(&self, max_chars: usize) -> String {
        let text = &self.payload.text;
        match text.char_indices().nth(max_chars) {
            Some((idx, _)) => format!("{}...", &text[..idx]),
            None => text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_payload() {
        let payload = json!({
            "chunk_id": 42,
            "job_title": "Data Engineer",
            "Level": "Mid Level",
            "publication_date": "2024-11-02T10:00:00Z",
            "text": "Build pipelines",
            "source": "lever",
            "tags": ["etl"]
        });
        let Value::Object(map) = payload else {
            unreachable!()
        };

        let item = RetrievedItem::from_point("p-1".to_string(), 0.5, map);
        assert_eq!(item.identifier, "42");
        assert_eq!(item.payload.job_level.as_deref(), Some("Mid Level"));
        assert_eq!(item.payload.field("Level"), Some("Mid Level"));
        assert_eq!(item.payload.field("source"), Some("lever"));
        assert_eq!(item.payload.field("tags"), None);
        assert_eq!(item.payload.extra.len(), 2);
    }

    #[test]
    fn test_identifier_falls_back_to_point_id() {
        let item = RetrievedItem::from_point("p-7".to_string(), 0.1, Map::new());
        assert_eq!(item.identifier, "p-7");
        assert_eq!(item.payload.text, "");
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        let record = JobRecord {
            text: "Café résumé review".to_string(),
            ..JobRecord::default()
        };
        let item = RetrievedItem::new("p", "j", 1.0, record);
        assert_eq!(item.preview(4), "Café...");
        assert_eq!(item.preview(100), "Café résumé review");
    }
}
