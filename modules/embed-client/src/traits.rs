use anyhow::Result;
use async_trait::async_trait;

// =============================================================================
// EmbedAgent Trait
// =============================================================================

/// Anything that can turn text into an embedding vector.
///
/// Implemented by the production OpenAI-compatible client and by mock
/// embedders in tests.
#[async_trait]
pub trait EmbedAgent: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;
}
