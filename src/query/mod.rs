//! Query understanding: natural language -> semantic query + structured filters

mod parser;
mod prompts;

pub use parser::{extract_json_object, interpret_response};
pub use prompts::{build_parsing_prompt, JOB_CATEGORIES, JOB_LEVELS};

use crate::filter::FilterSet;
use crate::oracle::{generate_with_timeout, GenerationParams, Oracle, OracleError};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseFailure {
    #[error("Oracle unavailable: {0}")]
    OracleUnavailable(#[from] OracleError),

    #[error("Unparseable oracle response: {0}")]
    UnparseableResponse(String),
}

/// Semantic search text plus the filters to apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    /// Never empty
    pub semantic_query: String,
    pub filters: FilterSet,
}

impl ParsedQuery {
    /// The raw query as semantic text, unfiltered
    pub fn verbatim(raw_query: &str) -> Self {
        Self {
            semantic_query: raw_query.to_string(),
            filters: FilterSet::new(),
        }
    }
}

/// Parses raw queries with the help of a generative model
pub struct QueryParser {
    oracle: Arc<dyn Oracle>,
    params: GenerationParams,
    timeout: Duration,
}

impl QueryParser {
    pub fn new(oracle: Arc<dyn Oracle>, params: GenerationParams, timeout: Duration) -> Self {
        Self {
            oracle,
            params,
            timeout,
        }
    }

    /// Parse a raw query, resolving relative dates against the current time
    pub async fn parse(&self, raw_query: &str) -> Result<ParsedQuery, ParseFailure> {
        self.parse_at(raw_query, Utc::now()).await
    }

    /// Parse a raw query, resolving relative dates against `now`
    pub async fn parse_at(
        &self,
        raw_query: &str,
        now: DateTime<Utc>,
    ) -> Result<ParsedQuery, ParseFailure> {
        tracing::info!("Parsing query: {}", raw_query);
        let prompt = build_parsing_prompt(raw_query);

        let started = Instant::now();
        let response =
            generate_with_timeout(self.oracle.as_ref(), &prompt, self.params, self.timeout)
                .await?;
        tracing::debug!(
            "Oracle response received in {:.2}s",
            started.elapsed().as_secs_f64()
        );

        let parsed = interpret_response(raw_query, &response, now).map_err(|e| {
            tracing::debug!("Unparseable response text: {}", response);
            e
        })?;

        tracing::info!(
            "Query parsed: semantic_query={:?}, {} filters",
            parsed.semantic_query,
            parsed.filters.len()
        );
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterField;
    use crate::oracle::MockOracle;

    fn parser(oracle: MockOracle) -> QueryParser {
        QueryParser::new(
            Arc::new(oracle),
            GenerationParams::default(),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_parse_with_oracle() {
        let oracle = MockOracle::new().reply(
            r#"{"semantic_query": "data scientist", "filters": {"category": "Data and Analytics", "company": "Google"}}"#,
        );
        let parsed = parser(oracle)
            .parse("Looking for data scientist positions at Google")
            .await
            .unwrap();

        assert_eq!(parsed.semantic_query, "data scientist");
        assert_eq!(parsed.filters.get(FilterField::Company), Some("Google"));
        assert_eq!(
            parsed.filters.get(FilterField::Category),
            Some("Data and Analytics")
        );
    }

    #[tokio::test]
    async fn test_oracle_failure() {
        let oracle = MockOracle::new().fail(OracleError::Transport("connection reset".to_string()));
        let result = parser(oracle).parse("rust jobs").await;
        assert!(matches!(result, Err(ParseFailure::OracleUnavailable(_))));
    }

    #[tokio::test]
    async fn test_oracle_timeout() {
        let oracle = MockOracle::new()
            .reply(r#"{"semantic_query": "rust"}"#)
            .with_delay(Duration::from_millis(200));
        let parser = QueryParser::new(
            Arc::new(oracle),
            GenerationParams::default(),
            Duration::from_millis(20),
        );

        let result = parser.parse("rust jobs").await;
        assert!(matches!(
            result,
            Err(ParseFailure::OracleUnavailable(OracleError::Timeout(_)))
        ));
    }

    #[tokio::test]
    async fn test_prompt_embeds_query() {
        let oracle = Arc::new(MockOracle::new().reply(r#"{"semantic_query": "nurse"}"#));
        let parser = QueryParser::new(
            oracle.clone(),
            GenerationParams::default(),
            Duration::from_secs(5),
        );
        parser.parse("night shift nurse").await.unwrap();

        let prompts = oracle.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("\"night shift nurse\""));
    }
}
