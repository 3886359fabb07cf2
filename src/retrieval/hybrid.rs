//! Hybrid search combining sparse and dense channels

use crate::filter::CompiledPredicate;
use crate::retrieval::{
    reciprocal_rank_fusion, Channel, ChannelQuery, FusionConfig, RetrievalEngine, RetrievalError,
    RetrievedItem,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Settings for a hybrid retriever
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Candidates fetched per channel before fusion
    pub prefetch_limit: usize,
    pub fusion: FusionConfig,
    /// Upper bound on each channel call
    pub timeout: Duration,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            prefetch_limit: 20,
            fusion: FusionConfig::default(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Hybrid retriever: two filtered channel queries joined by Reciprocal Rank Fusion
pub struct HybridRetriever {
    engine: Arc<dyn RetrievalEngine>,
    config: RetrievalConfig,
}

impl HybridRetriever {
    pub fn new(engine: Arc<dyn RetrievalEngine>, config: RetrievalConfig) -> Self {
        Self { engine, config }
    }

    /// Retrieve up to `limit` fused candidates for the semantic query
    ///
    /// Any channel failure fails the whole retrieval; an empty result is only
    /// ever returned when the engine genuinely found nothing.
    pub async fn retrieve(
        &self,
        semantic_query: &str,
        predicate: &CompiledPredicate,
        limit: usize,
    ) -> Result<Vec<RetrievedItem>, RetrievalError> {
        if semantic_query.trim().is_empty() {
            return Err(RetrievalError::InvalidQuery(
                "Query text cannot be empty".to_string(),
            ));
        }

        tracing::info!(
            "Searching {} for: {} (limit {}, {} filter conditions)",
            self.engine.name(),
            semantic_query,
            limit,
            predicate.len()
        );
        let started = Instant::now();

        // Step 1: Parallel sparse + dense search
        let (sparse_results, dense_results) = tokio::join!(
            self.channel_search(Channel::Sparse, semantic_query, predicate),
            self.channel_search(Channel::Dense, semantic_query, predicate)
        );

        let sparse_results = sparse_results?;
        let dense_results = dense_results?;

        tracing::debug!(
            "Channel candidates: sparse={}, dense={}",
            sparse_results.len(),
            dense_results.len()
        );

        // Step 2: Reciprocal Rank Fusion
        let mut fused =
            reciprocal_rank_fusion(vec![sparse_results, dense_results], &self.config.fusion);

        // Step 3: Truncate to limit
        fused.truncate(limit);

        tracing::info!(
            "Found {} results in {:.2}s",
            fused.len(),
            started.elapsed().as_secs_f64()
        );

        Ok(fused)
    }

    async fn channel_search(
        &self,
        channel: Channel,
        text: &str,
        predicate: &CompiledPredicate,
    ) -> Result<Vec<RetrievedItem>, RetrievalError> {
        let query = ChannelQuery {
            channel,
            text,
            predicate,
            limit: self.config.prefetch_limit,
        };

        let mut results = tokio::time::timeout(self.config.timeout, self.engine.query_channel(query))
            .await
            .map_err(|_| RetrievalError::Timeout {
                channel,
                timeout: self.config.timeout,
            })?
            .map_err(|e| {
                tracing::error!("{} channel query failed: {}", channel, e);
                e
            })?;

        // Engines are trusted to honor the cap, but fusion ranks must stay within it
        results.truncate(self.config.prefetch_limit);
        Ok(results)
    }
}
