//! Generative model ("oracle") abstraction
//!
//! Query understanding and answer synthesis both talk to a text-generation
//! service through the [`Oracle`] trait, so either can run against Gemini or a
//! scripted [`MockOracle`].

mod gemini;
mod mock;

pub use gemini::GeminiOracle;
pub use mock::MockOracle;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Oracle transport error: {0}")]
    Transport(String),

    #[error("Oracle timed out after {0:?}")]
    Timeout(Duration),

    #[error("Oracle returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Oracle returned no text")]
    EmptyResponse,

    #[error("Oracle response malformed: {0}")]
    Malformed(String),
}

/// Sampling parameters for one generation call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 10000,
        }
    }
}

/// Text generation service
///
/// Implementations must be safe to share across concurrent requests.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Generate text for the prompt
    async fn generate(&self, prompt: &str, params: GenerationParams)
        -> Result<String, OracleError>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Run a generation call bounded by `timeout`
pub(crate) async fn generate_with_timeout(
    oracle: &dyn Oracle,
    prompt: &str,
    params: GenerationParams,
    timeout: Duration,
) -> Result<String, OracleError> {
    tokio::time::timeout(timeout, oracle.generate(prompt, params))
        .await
        .map_err(|_| OracleError::Timeout(timeout))?
}
