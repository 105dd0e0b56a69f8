mod client;
pub(crate) mod types;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::traits::EmbedAgent;
use client::OpenAiClient;

// =============================================================================
// OpenAi Agent
// =============================================================================

/// OpenAI-compatible embedding agent. Works against api.openai.com by
/// default; point `with_base_url` at any compatible provider.
#[derive(Clone)]
pub struct OpenAi {
    api_key: String,
    embedding_model: String,
    base_url: Option<String>,
}

impl OpenAi {
    pub fn new(api_key: impl Into<String>, embedding_model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            embedding_model: embedding_model.into(),
            base_url: None,
        }
    }

    pub fn from_env(embedding_model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow!("OPENAI_API_KEY environment variable not set"))?;
        Ok(Self::new(api_key, embedding_model))
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Get the embedding model name.
    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    fn client(&self) -> OpenAiClient {
        let client = OpenAiClient::new(&self.api_key);
        match &self.base_url {
            Some(url) => client.with_base_url(url),
            None => client,
        }
    }
}

#[async_trait]
impl EmbedAgent for OpenAi {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.client().embed(&self.embedding_model, text).await
    }

    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        self.client()
            .embed_batch(&self.embedding_model, &texts)
            .await
    }
}
