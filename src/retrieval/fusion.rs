//! Reciprocal Rank Fusion algorithm for combining channel results

use crate::retrieval::RetrievedItem;
use ahash::{HashMap, HashMapExt};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FusionError {
    #[error("Invalid RRF constant {0}: must be finite and non-negative")]
    InvalidConstant(f32),
}

/// Configuration for fusion algorithm
#[derive(Debug, Clone, Copy)]
pub struct FusionConfig {
    /// RRF K constant (typically 60)
    pub rrf_k: f32,
}

impl FusionConfig {
    pub fn new(rrf_k: f32) -> Result<Self, FusionError> {
        if !rrf_k.is_finite() || rrf_k < 0.0 {
            return Err(FusionError::InvalidConstant(rrf_k));
        }

        Ok(Self { rrf_k })
    }
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self { rrf_k: 60.0 }
    }
}

/// Apply Reciprocal Rank Fusion to combine ranked lists
///
/// RRF formula: score(id) = sum over all rankings containing id of: 1 / (k + rank),
/// with 1-based ranks. Candidates are keyed by point id, so each chunk is fused
/// independently. Channel-native scores are ignored.
///
/// # Returns
/// Fused items sorted by fused score descending; ties keep first-seen order
/// (earlier lists first).
pub fn reciprocal_rank_fusion(
    rankings: Vec<Vec<RetrievedItem>>,
    config: &FusionConfig,
) -> Vec<RetrievedItem> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut fused: Vec<RetrievedItem> = Vec::new();

    for ranking in rankings {
        for (rank, item) in ranking.into_iter().enumerate() {
            let rrf_score = 1.0 / (config.rrf_k + (rank as f32) + 1.0);
            match index.get(&item.point_id) {
                Some(&pos) => fused[pos].score += rrf_score,
                None => {
                    index.insert(item.point_id.clone(), fused.len());
                    fused.push(RetrievedItem {
                        score: rrf_score,
                        ..item
                    });
                }
            }
        }
    }

    // Stable sort keeps first-seen order among equal scores
    fused.sort_by(|a, b| b.score.total_cmp(&a.score));

    fused
}
