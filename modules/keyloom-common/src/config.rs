use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Postgres
    pub database_url: String,

    // Embedding provider
    pub embeddings_api_key: String,
    pub embeddings_base_url: Option<String>,
    pub embedding_model: String,

    // Batch pacing
    pub embed_delay_ms: u64,

    // Rate ceilings
    pub embed_calls_per_minute: usize,
    pub embed_calls_per_day: usize,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            embeddings_api_key: required_env("EMBEDDINGS_API_KEY"),
            embeddings_base_url: env::var("EMBEDDINGS_BASE_URL").ok(),
            embedding_model: env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
            embed_delay_ms: env::var("EMBED_DELAY_MS")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .expect("EMBED_DELAY_MS must be a number"),
            embed_calls_per_minute: env::var("EMBED_CALLS_PER_MINUTE")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .expect("EMBED_CALLS_PER_MINUTE must be a number"),
            embed_calls_per_day: env::var("EMBED_CALLS_PER_DAY")
                .unwrap_or_else(|_| "10000".to_string())
                .parse()
                .expect("EMBED_CALLS_PER_DAY must be a number"),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
