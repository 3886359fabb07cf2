//! Retrieval engine contract

use crate::filter::CompiledPredicate;
use crate::retrieval::RetrievedItem;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Engine unreachable: {0}")]
    Unreachable(String),

    #[error("Engine returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Engine response is missing its result list")]
    MissingResults,

    #[error("Engine response malformed: {0}")]
    Malformed(String),

    #[error("{channel} channel timed out after {timeout:?}")]
    Timeout { channel: Channel, timeout: Duration },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

/// Similarity channel of the hybrid index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Lexical, BM25-like term scoring
    Sparse,
    /// Embedding vector similarity
    Dense,
}

impl Channel {
    /// Named vector in the collection
    pub fn vector_name(&self) -> &'static str {
        match self {
            Channel::Sparse => "sparse",
            Channel::Dense => "dense",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.vector_name())
    }
}

/// One channel's ranked query, hard-filtered by the predicate
#[derive(Debug, Clone, Copy)]
pub struct ChannelQuery<'a> {
    pub channel: Channel,
    pub text: &'a str,
    pub predicate: &'a CompiledPredicate,
    pub limit: usize,
}

/// Hybrid retrieval engine
///
/// Implementations must be safe to share across concurrent requests; connection
/// pooling is their concern.
#[async_trait]
pub trait RetrievalEngine: Send + Sync {
    /// Ranked candidates for one channel, best first. Scores are channel-native.
    async fn query_channel(
        &self,
        query: ChannelQuery<'_>,
    ) -> Result<Vec<RetrievedItem>, RetrievalError>;

    /// Short name for logs
    fn name(&self) -> &str;
}
