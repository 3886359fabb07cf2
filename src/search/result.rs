use crate::config::SearchConfig;
use crate::retrieval::RetrievedItem;
use serde::{Deserialize, Serialize};

/// Presentation view of one consolidated job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    /// 1-based position in the answer
    pub rank: usize,
    pub score: f32,
    pub job_title: String,
    pub company: String,
    pub category: String,
    pub location: String,
    pub job_level: String,
    pub job_id: String,
    pub publication_date: String,
    pub description_snippet: String,
}

impl JobResult {
    pub fn from_item(rank: usize, item: &RetrievedItem, view: &SearchConfig) -> Self {
        let job = &item.payload;
        let or_missing = |value: &Option<String>| {
            value
                .clone()
                .unwrap_or_else(|| view.missing_value.clone())
        };

        let description_snippet = if job.text.is_empty() {
            view.missing_value.clone()
        } else {
            item.preview(view.snippet_max_length)
        };

        Self {
            rank,
            score: item.score,
            job_title: or_missing(&job.job_title),
            company: or_missing(&job.company),
            category: or_missing(&job.category),
            location: or_missing(&job.location),
            job_level: or_missing(&job.job_level),
            job_id: item.identifier.clone(),
            publication_date: or_missing(&job.publication_date),
            description_snippet,
        }
    }
}
