//! Scripted oracle for tests and offline runs

use crate::oracle::{GenerationParams, Oracle, OracleError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Oracle that replays scripted replies in order
///
/// Once the script runs out every call fails with a transport error, which is
/// also how an unavailable model looks to callers.
#[derive(Debug, Default)]
pub struct MockOracle {
    script: Mutex<VecDeque<Result<String, OracleError>>>,
    prompts: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl MockOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply
    pub fn reply(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()));
        self
    }

    /// Queue a failure
    pub fn fail(self, error: OracleError) -> Self {
        self.push(Err(error));
        self
    }

    /// Delay every call, to exercise timeouts
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn push(&self, entry: Result<String, OracleError>) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(entry);
    }

    /// Prompts received so far, oldest first
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl Oracle for MockOracle {
    async fn generate(
        &self,
        prompt: &str,
        _params: GenerationParams,
    ) -> Result<String, OracleError> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(prompt.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| Err(OracleError::Transport("no scripted reply".to_string())))
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
