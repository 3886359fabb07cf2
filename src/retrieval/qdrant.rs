//! Qdrant HTTP client for hybrid channel queries
//!
//! Uses server-side document inference, so the query text is sent as-is and the
//! collection's `sparse` and `dense` named vectors are queried with their own models.

use crate::config::EngineConfig;
use crate::filter::{CompiledPredicate, Condition};
use crate::retrieval::{Channel, ChannelQuery, RetrievalEngine, RetrievalError, RetrievedItem};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;

/// Qdrant-backed retrieval engine
pub struct QdrantEngine {
    client: Client,
    base_url: String,
    collection: String,
    api_key: Option<String>,
    sparse_model: String,
    dense_model: String,
}

#[derive(Deserialize)]
struct QueryResponse {
    result: Option<QueryResult>,
}

#[derive(Deserialize)]
struct QueryResult {
    points: Option<Vec<ScoredPoint>>,
}

#[derive(Deserialize)]
struct ScoredPoint {
    id: Value,
    score: f32,
    #[serde(default)]
    payload: Option<Map<String, Value>>,
}

impl QdrantEngine {
    /// Create a client for the configured collection
    ///
    /// # Errors
    /// - Invalid timeout in configuration
    /// - HTTP client build errors
    pub fn new(config: &EngineConfig, timeout: Duration) -> Result<Self, RetrievalError> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(32)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| RetrievalError::Unreachable(format!("HTTP client build failed: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
            api_key: config.api_key(),
            sparse_model: config.sparse_model.clone(),
            dense_model: config.dense_model.clone(),
        })
    }

    fn model_for(&self, channel: Channel) -> &str {
        match channel {
            Channel::Sparse => &self.sparse_model,
            Channel::Dense => &self.dense_model,
        }
    }

    fn request_body(&self, query: &ChannelQuery<'_>) -> Value {
        let mut body = json!({
            "query": {
                "text": query.text,
                "model": self.model_for(query.channel),
            },
            "using": query.channel.vector_name(),
            "limit": query.limit,
            "with_payload": true,
        });
        if let Some(filter) = filter_json(query.predicate) {
            body["filter"] = filter;
        }
        body
    }
}

/// Render a predicate as a Qdrant filter; `None` when unconstrained
pub fn filter_json(predicate: &CompiledPredicate) -> Option<Value> {
    if predicate.is_unconstrained() {
        return None;
    }

    let must: Vec<Value> = predicate
        .conditions()
        .iter()
        .map(|condition| match condition {
            Condition::Phrase { key, phrase } => json!({
                "key": key,
                "match": { "phrase": phrase },
            }),
            Condition::DateRange { key, range } => json!({
                "key": key,
                "range": range.to_json(),
            }),
        })
        .collect();

    Some(json!({ "must": must }))
}

fn point_id_to_string(id: Value) -> String {
    match id {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Map a `points/query` response to ranked items
///
/// Non-2xx statuses and bodies without `result.points` are failures; an empty
/// point list is a genuine empty result.
fn points_from_response(status: u16, body: &str) -> Result<Vec<RetrievedItem>, RetrievalError> {
    if !(200..300).contains(&status) {
        return Err(RetrievalError::Status {
            status,
            body: body.to_string(),
        });
    }

    let parsed: QueryResponse = serde_json::from_str(body)
        .map_err(|e| RetrievalError::Malformed(format!("Qdrant JSON parse error: {}", e)))?;

    let points = parsed
        .result
        .and_then(|result| result.points)
        .ok_or(RetrievalError::MissingResults)?;

    Ok(points
        .into_iter()
        .map(|point| {
            RetrievedItem::from_point(
                point_id_to_string(point.id),
                point.score,
                point.payload.unwrap_or_default(),
            )
        })
        .collect())
}

#[async_trait]
impl RetrievalEngine for QdrantEngine {
    async fn query_channel(
        &self,
        query: ChannelQuery<'_>,
    ) -> Result<Vec<RetrievedItem>, RetrievalError> {
        let url = format!(
            "{}/collections/{}/points/query",
            self.base_url, self.collection
        );
        let body = self.request_body(&query);
        tracing::debug!("Qdrant {} query: {}", query.channel, body);

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RetrievalError::Unreachable(format!("Qdrant HTTP error: {}", e)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| RetrievalError::Unreachable(format!("Qdrant response read error: {}", e)))?;

        points_from_response(status, &body)
    }

    fn name(&self) -> &str {
        "qdrant"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{DateRange, FilterCompiler, FilterField, FilterSet};
    use chrono::{TimeZone, Utc};

    fn engine() -> QdrantEngine {
        let config = crate::config::Config::default();
        QdrantEngine::new(&config.engine, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_filter_json() {
        let now = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        let filters = FilterSet::new()
            .with_field(FilterField::Level, "Senior Level")
            .with_date_range(DateRange::last_days(30, now).unwrap());
        let predicate = FilterCompiler::new().compile(&filters);

        let filter = filter_json(&predicate).unwrap();
        assert_eq!(
            filter,
            json!({
                "must": [
                    { "key": "Level", "match": { "phrase": "Senior Level" } },
                    {
                        "key": "publication_date",
                        "range": {
                            "gte": "2025-01-02T00:00:00Z",
                            "lte": "2025-02-01T00:00:00Z",
                            "gt": null,
                            "lt": null
                        }
                    }
                ]
            })
        );
    }

    #[test]
    fn test_unconstrained_sends_no_filter() {
        let predicate = CompiledPredicate::unconstrained();
        assert!(filter_json(&predicate).is_none());

        let body = engine().request_body(&ChannelQuery {
            channel: Channel::Sparse,
            text: "python developer",
            predicate: &predicate,
            limit: 20,
        });
        assert_eq!(body["using"], "sparse");
        assert_eq!(body["query"]["model"], "Qdrant/bm25");
        assert_eq!(body["limit"], 20);
        assert!(body.get("filter").is_none());
    }

    #[test]
    fn test_points_mapped_in_rank_order() {
        let body = r#"{"result":{"points":[
            {"id":7,"score":12.5,"payload":{"chunk_id":"J1","job_title":"Rust Engineer","text":"..."}},
            {"id":"b2c3","score":9.0}
        ]},"status":"ok","time":0.01}"#;

        let items = points_from_response(200, body).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].point_id, "7");
        assert_eq!(items[0].identifier, "J1");
        assert_eq!(items[0].payload.job_title.as_deref(), Some("Rust Engineer"));
        assert_eq!(items[1].point_id, "b2c3");
        assert_eq!(items[1].identifier, "b2c3");
    }

    #[test]
    fn test_empty_point_list_is_not_an_error() {
        let items = points_from_response(200, r#"{"result":{"points":[]}}"#).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_error_status() {
        let err = points_from_response(404, r#"{"status":{"error":"Collection not found"}}"#)
            .unwrap_err();
        match err {
            RetrievalError::Status { status, body } => {
                assert_eq!(status, 404);
                assert!(body.contains("Collection not found"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_points_is_missing_results() {
        for body in [r#"{"status":"ok","time":0.1}"#, r#"{"result":{}}"#, r#"{"result":null}"#] {
            assert!(matches!(
                points_from_response(200, body),
                Err(RetrievalError::MissingResults)
            ));
        }
    }

    #[test]
    fn test_malformed_body() {
        assert!(matches!(
            points_from_response(200, "<html>bad gateway</html>"),
            Err(RetrievalError::Malformed(_))
        ));
    }

    #[test]
    fn test_point_ids() {
        assert_eq!(point_id_to_string(json!(17)), "17");
        assert_eq!(point_id_to_string(json!("a1b2")), "a1b2");
    }
}
