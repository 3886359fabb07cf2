//! Hybrid retrieval and result consolidation
//!
//! This module implements hybrid search combining a sparse (lexical) and a dense
//! (embedding) channel with Reciprocal Rank Fusion, plus per-job deduplication of
//! the chunk-level hits.

mod deduplication;
mod engine;
mod fusion;
mod hybrid;
mod memory;
mod qdrant;
mod record;

pub use deduplication::consolidate;
pub use engine::{Channel, ChannelQuery, RetrievalEngine, RetrievalError};
pub use fusion::{reciprocal_rank_fusion, FusionConfig, FusionError};
pub use hybrid::{HybridRetriever, RetrievalConfig};
pub use memory::InMemoryEngine;
pub use qdrant::{filter_json, QdrantEngine};
pub use record::{JobRecord, RetrievedItem, JOB_ID_FIELD};
