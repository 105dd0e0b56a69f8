//! Batch embedding generation.
//!
//! Items are processed strictly sequentially: rate-limiter slot, provider
//! call, persist, fixed inter-call delay. One item failing never stops the
//! rest; only the daily rate ceiling aborts the batch.

use serde::Serialize;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};
use uuid::Uuid;

use embed_client::{EmbedAgent, RateLimiter};
use keyloom_common::{Keyword, KeyloomError};

use crate::store::KeywordStore;

/// One keyword to embed. The id is optional so ad-hoc text can be embedded
/// without a stored record; vectors are only persisted when an id is present.
#[derive(Debug, Clone)]
pub struct EmbedRequestItem {
    pub keyword_id: Option<Uuid>,
    pub text: String,
}

impl From<&Keyword> for EmbedRequestItem {
    fn from(kw: &Keyword) -> Self {
        Self {
            keyword_id: Some(kw.id),
            text: kw.text.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedOutcome {
    pub text: String,
    pub keyword_id: Option<Uuid>,
    /// Empty when the call failed.
    pub embedding: Vec<f32>,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedBatchReport {
    pub outcomes: Vec<EmbedOutcome>,
    pub succeeded: usize,
}

pub struct EmbeddingGenerator {
    /// Pause between successive provider calls. Skipped after the final item.
    delay: Duration,
}

impl EmbeddingGenerator {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
        }
    }

    /// Embed a batch of keywords, persisting each vector as it arrives.
    ///
    /// Returns one outcome per input item in input order. Errors only on an
    /// empty batch (validation) or a daily rate-limit exhaustion; everything
    /// else is captured per item.
    pub async fn run<S: KeywordStore>(
        &self,
        agent: &dyn EmbedAgent,
        store: &S,
        limiter: &mut RateLimiter,
        items: &[EmbedRequestItem],
    ) -> Result<EmbedBatchReport, KeyloomError> {
        if items.is_empty() {
            return Err(KeyloomError::Validation(
                "embedding batch is empty".to_string(),
            ));
        }

        info!(batch = items.len(), "embedding batch started");

        let mut outcomes = Vec::with_capacity(items.len());
        let mut succeeded = 0;

        for (i, item) in items.iter().enumerate() {
            limiter
                .acquire()
                .await
                .map_err(|e| match e {
                    embed_client::RateLimitError::DailyLimitExceeded { limit } => {
                        KeyloomError::DailyLimitExceeded { limit }
                    }
                })?;

            let outcome = match agent.embed(&item.text).await {
                Ok(embedding) => {
                    let mut error = None;
                    if let Some(id) = item.keyword_id {
                        if let Err(e) = store.save_embedding(id, &embedding).await {
                            warn!(keyword = %item.text, error = %e, "failed to persist embedding");
                            error = Some(format!("persist failed: {e}"));
                        }
                    }
                    let success = error.is_none();
                    EmbedOutcome {
                        text: item.text.clone(),
                        keyword_id: item.keyword_id,
                        embedding,
                        success,
                        error,
                    }
                }
                Err(e) => {
                    warn!(keyword = %item.text, error = %e, "embedding call failed");
                    EmbedOutcome {
                        text: item.text.clone(),
                        keyword_id: item.keyword_id,
                        embedding: Vec::new(),
                        success: false,
                        error: Some(e.to_string()),
                    }
                }
            };

            if outcome.success {
                succeeded += 1;
            }
            outcomes.push(outcome);

            if i + 1 < items.len() {
                sleep(self.delay).await;
            }
        }

        info!(
            batch = items.len(),
            succeeded,
            failed = items.len() - succeeded,
            "embedding batch finished"
        );

        Ok(EmbedBatchReport {
            outcomes,
            succeeded,
        })
    }
}
