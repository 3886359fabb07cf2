//! Search orchestration
//!
//! Runs one request through understand, compile, retrieve, consolidate and
//! synthesize. Oracle trouble degrades the answer; retrieval trouble fails the
//! request.

mod result;

pub use crate::synthesis::AnswerSource;
pub use result::JobResult;

use crate::config::{Config, ConfigValidator, SearchConfig};
use crate::error::{JobSearchError, Result};
use crate::filter::FilterCompiler;
use crate::oracle::{GenerationParams, Oracle};
use crate::query::{ParsedQuery, QueryParser};
use crate::retrieval::{
    consolidate, FusionConfig, HybridRetriever, RetrievalConfig, RetrievalEngine,
};
use crate::synthesis::ResponseSynthesizer;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Understand,
    Compile,
    Retrieve,
    Consolidate,
    Synthesize,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Understand => "understand",
            Stage::Compile => "compile",
            Stage::Retrieve => "retrieve",
            Stage::Consolidate => "consolidate",
            Stage::Synthesize => "synthesize",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one search request
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub request_id: Uuid,
    pub query: String,
    /// Query actually sent to retrieval
    pub parsed: ParsedQuery,
    pub results: Vec<JobResult>,
    pub answer: String,
    pub answer_source: AnswerSource,
}

impl SearchOutcome {
    /// JSON rendering for machine consumers
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "request_id": self.request_id.to_string(),
            "query": self.query,
            "semantic_query": self.parsed.semantic_query,
            "filters": self.parsed.filters.to_json(),
            "answer": self.answer,
            "answer_source": self.answer_source,
            "results": self.results,
        })
    }
}

/// Validated request parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub top: usize,
}

impl SearchRequest {
    /// Validate raw input against the configured limits
    ///
    /// The query is trimmed before its length is checked. `top` defaults to
    /// `search.default_top`.
    pub fn new(query: &str, top: Option<usize>, limits: &SearchConfig) -> Result<Self> {
        let query = query.trim();
        let chars = query.chars().count();

        if chars < limits.min_query_chars {
            return Err(JobSearchError::invalid_input(format!(
                "Query must be at least {} characters",
                limits.min_query_chars
            )));
        }
        if chars > limits.max_query_chars {
            return Err(JobSearchError::invalid_input(format!(
                "Query must be at most {} characters",
                limits.max_query_chars
            )));
        }

        let top = top.unwrap_or(limits.default_top);
        if top == 0 || top > limits.max_top {
            return Err(JobSearchError::invalid_input(format!(
                "top must be between 1 and {}",
                limits.max_top
            )));
        }

        Ok(Self {
            query: query.to_string(),
            top,
        })
    }
}

/// The search pipeline
pub struct SearchService {
    parser: QueryParser,
    compiler: FilterCompiler,
    retriever: HybridRetriever,
    synthesizer: ResponseSynthesizer,
    limits: SearchConfig,
}

impl SearchService {
    /// Wire the pipeline to its collaborators
    ///
    /// # Errors
    /// Any setting [`ConfigValidator`] rejects. A zero prefetch limit or default
    /// `top` would otherwise pass as an empty result or a client error.
    pub fn new(
        oracle: Arc<dyn Oracle>,
        engine: Arc<dyn RetrievalEngine>,
        config: &Config,
    ) -> Result<Self> {
        ConfigValidator::validate(config)?;

        let params = GenerationParams {
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
        };
        let llm_timeout = config.llm.timeout()?;

        let fusion =
            FusionConfig::new(config.engine.rrf_k).map_err(|e| JobSearchError::InvalidConfigValue {
                path: "engine.rrf_k".to_string(),
                message: e.to_string(),
            })?;
        let retrieval = RetrievalConfig {
            prefetch_limit: config.engine.prefetch_limit,
            fusion,
            timeout: config.engine.timeout()?,
        };

        Ok(Self {
            parser: QueryParser::new(oracle.clone(), params, llm_timeout),
            compiler: FilterCompiler::new(),
            retriever: HybridRetriever::new(engine, retrieval),
            synthesizer: ResponseSynthesizer::new(
                oracle,
                params,
                llm_timeout,
                config.search.missing_value.clone(),
            ),
            limits: config.search.clone(),
        })
    }

    /// Answer a natural-language query
    ///
    /// # Errors
    /// - [`JobSearchError::InvalidInput`] for a query or `top` outside the limits
    /// - [`JobSearchError::RetrievalUnavailable`] when the engine fails
    pub async fn search(&self, query: &str, top: Option<usize>) -> Result<SearchOutcome> {
        let request = SearchRequest::new(query, top, &self.limits)?;
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("search", request_id = %request_id);

        self.run(request, request_id).instrument(span).await
    }

    async fn run(&self, request: SearchRequest, request_id: Uuid) -> Result<SearchOutcome> {
        let started = Instant::now();
        tracing::info!("Search request: {:?} (top {})", request.query, request.top);

        let parsed = match self.parser.parse(&request.query).await {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(stage = %Stage::Understand, "Using raw query: {}", e);
                ParsedQuery::verbatim(&request.query)
            }
        };
        tracing::debug!(
            stage = %Stage::Understand,
            "semantic_query={:?} filters={}",
            parsed.semantic_query,
            parsed.filters.to_json()
        );

        let predicate = self.compiler.compile(&parsed.filters);
        tracing::debug!(stage = %Stage::Compile, "{} conditions", predicate.len());

        let limit = request.top.saturating_mul(self.limits.retrieval_multiplier);
        let candidates = self
            .retriever
            .retrieve(&parsed.semantic_query, &predicate, limit)
            .await
            .map_err(|e| {
                tracing::error!(stage = %Stage::Retrieve, "Search failed: {}", e);
                JobSearchError::RetrievalUnavailable(e)
            })?;

        let candidate_count = candidates.len();
        let consolidated = consolidate(candidates, request.top);
        tracing::info!(
            stage = %Stage::Consolidate,
            "{} candidates -> {} unique jobs",
            candidate_count,
            consolidated.len()
        );

        let (answer, answer_source) = self
            .synthesizer
            .synthesize_or_fallback(&consolidated, &request.query)
            .await;
        tracing::debug!(stage = %Stage::Synthesize, "Answer source: {:?}", answer_source);

        let results = consolidated
            .iter()
            .enumerate()
            .map(|(i, item)| JobResult::from_item(i + 1, item, &self.limits))
            .collect();

        tracing::info!(
            "Search completed in {:.2}s ({:?} answer)",
            started.elapsed().as_secs_f64(),
            answer_source
        );

        Ok(SearchOutcome {
            request_id,
            query: request.query,
            parsed,
            results,
            answer,
            answer_source,
        })
    }
}
