//! Answer synthesis over consolidated results

use crate::oracle::{generate_with_timeout, GenerationParams, Oracle, OracleError};
use crate::retrieval::RetrievedItem;
use serde::Serialize;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const SEPARATOR_WIDTH: usize = 80;

#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("Synthesis unavailable: {0}")]
    Unavailable(#[from] OracleError),

    #[error("Nothing to synthesize: result list is empty")]
    NoResults,
}

/// Where the answer text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    Oracle,
    Fallback,
}

/// Deterministic answer used when the oracle cannot produce one
pub fn fallback_answer(count: usize, query: &str) -> String {
    match count {
        0 => format!("No jobs found matching '{}'.", query),
        1 => format!(
            "Found 1 job matching '{}'. Please review the results below.",
            query
        ),
        n => format!(
            "Found {} jobs matching '{}'. The results are sorted by relevance.",
            n, query
        ),
    }
}

/// Render results as the numbered listing embedded in the answer prompt
pub fn format_results(results: &[RetrievedItem], missing_value: &str) -> String {
    let or_missing = |value: &Option<String>| value.as_deref().unwrap_or(missing_value).to_string();
    let mut out = String::new();

    for (i, item) in results.iter().enumerate() {
        let job = &item.payload;
        let description = if job.text.is_empty() {
            missing_value
        } else {
            job.text.as_str()
        };

        let _ = writeln!(out, "Rank: {}", i + 1);
        let _ = writeln!(out, "Score: {:.4}", item.score);
        let _ = writeln!(out, "Job Title: {}", or_missing(&job.job_title));
        let _ = writeln!(out, "Company: {}", or_missing(&job.company));
        let _ = writeln!(out, "Location: {}", or_missing(&job.location));
        let _ = writeln!(out, "Job Level: {}", or_missing(&job.job_level));
        let _ = writeln!(out, "Category: {}", or_missing(&job.category));
        let _ = writeln!(out, "Publication Date: {}", or_missing(&job.publication_date));
        let _ = writeln!(out, "Job ID: {}", item.identifier);
        let _ = writeln!(out, "Description:\n {}", description);
        let _ = writeln!(out, "{}", "-".repeat(SEPARATOR_WIDTH));
    }

    out
}

/// Build the answer prompt for a query and its results
pub fn build_answer_prompt(query: &str, results: &[RetrievedItem], missing_value: &str) -> String {
    format!(
        r#"You are a job search assistant. Using the user's query and the search results below, write a helpful answer in natural language.

User Query: "{query}"

Search Results:
{listing}
Instructions:
1. Summarize the results in a clear, conversational way
2. Point out the strongest matches and their relevant details
3. Mention job titles, companies, locations and levels where useful
4. When there are several jobs, briefly describe the range on offer
5. Keep it to 2-4 sentences
6. Do not mention technical terms such as "score" or "rank"
7. Focus on what helps the job seeker most

Answer:"#,
        query = query,
        listing = format_results(results, missing_value),
    )
}

/// Produces the narrative answer for a result list
pub struct ResponseSynthesizer {
    oracle: Arc<dyn Oracle>,
    params: GenerationParams,
    timeout: Duration,
    missing_value: String,
}

impl ResponseSynthesizer {
    pub fn new(
        oracle: Arc<dyn Oracle>,
        params: GenerationParams,
        timeout: Duration,
        missing_value: impl Into<String>,
    ) -> Self {
        Self {
            oracle,
            params,
            timeout,
            missing_value: missing_value.into(),
        }
    }

    /// Ask the oracle for an answer; one call, no retries
    ///
    /// Blank output counts as unavailable.
    pub async fn synthesize(
        &self,
        results: &[RetrievedItem],
        query: &str,
    ) -> Result<String, SynthesisError> {
        if results.is_empty() {
            return Err(SynthesisError::NoResults);
        }

        let prompt = build_answer_prompt(query, results, &self.missing_value);
        tracing::debug!("Answer prompt is {} chars", prompt.len());

        let answer =
            generate_with_timeout(self.oracle.as_ref(), &prompt, self.params, self.timeout)
                .await?;
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(SynthesisError::Unavailable(OracleError::EmptyResponse));
        }

        tracing::info!(
            "Synthesized answer with {} ({} chars)",
            self.oracle.model_name(),
            answer.len()
        );
        Ok(answer.to_string())
    }

    /// Oracle answer, or the fallback template when synthesis fails
    ///
    /// An empty result list never reaches the oracle.
    pub async fn synthesize_or_fallback(
        &self,
        results: &[RetrievedItem],
        query: &str,
    ) -> (String, AnswerSource) {
        match self.synthesize(results, query).await {
            Ok(answer) => (answer, AnswerSource::Oracle),
            Err(SynthesisError::NoResults) => {
                tracing::info!("No results, answering with the zero-results message");
                (fallback_answer(0, query), AnswerSource::Fallback)
            }
            Err(e) => {
                tracing::warn!("Answer synthesis failed, using fallback: {}", e);
                (fallback_answer(results.len(), query), AnswerSource::Fallback)
            }
        }
    }
}
