//! In-process retrieval engine with scripted channel rankings
//!
//! Each channel returns a fixed ranking, filtered by the predicate the same way
//! the real payload index would filter it. Used for tests and offline runs.

use crate::retrieval::{Channel, ChannelQuery, RetrievalEngine, RetrievalError, RetrievedItem};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone)]
enum ChannelScript {
    Ranking(Vec<RetrievedItem>),
    Unreachable(String),
}

/// Scripted in-memory engine
#[derive(Debug, Default)]
pub struct InMemoryEngine {
    channels: HashMap<Channel, ChannelScript>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl InMemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ranked candidates (best first) the channel returns before filtering
    pub fn with_ranking(mut self, channel: Channel, ranking: Vec<RetrievedItem>) -> Self {
        self.channels.insert(channel, ChannelScript::Ranking(ranking));
        self
    }

    /// Make the channel fail as if the engine were unreachable
    pub fn failing(mut self, channel: Channel, message: impl Into<String>) -> Self {
        self.channels
            .insert(channel, ChannelScript::Unreachable(message.into()));
        self
    }

    /// Delay every channel call, to exercise timeouts and cancellation
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of channel queries served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RetrievalEngine for InMemoryEngine {
    async fn query_channel(
        &self,
        query: ChannelQuery<'_>,
    ) -> Result<Vec<RetrievedItem>, RetrievalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.channels.get(&query.channel) {
            Some(ChannelScript::Unreachable(message)) => {
                Err(RetrievalError::Unreachable(message.clone()))
            }
            Some(ChannelScript::Ranking(ranking)) => Ok(ranking
                .iter()
                .filter(|item| query.predicate.matches(&item.payload))
                .take(query.limit)
                .cloned()
                .collect()),
            None => Ok(Vec::new()),
        }
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}
