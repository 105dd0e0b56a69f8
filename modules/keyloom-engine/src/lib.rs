//! Keyword clustering and semantic-relation pipeline.
//!
//! Turns a flat keyword corpus into embedding vectors, cluster centroids and
//! pairwise cluster relations, with fuzzy matching and topic scoping as
//! shared utilities. Invoked as a library from request-handling glue; the
//! store and the embedding provider sit behind traits.

pub mod cleaner;
pub mod embedder;
pub mod filter;
pub mod fuzzy;
pub mod merge;
pub mod pipeline;
pub mod relations;
pub mod store;
pub mod text;

pub use cleaner::{clean_keywords, CleanReport};
pub use embedder::{EmbedBatchReport, EmbedOutcome, EmbedRequestItem, EmbeddingGenerator};
pub use filter::{ScopeDecision, TopicFilter, Vocabulary};
pub use fuzzy::{fuzzy_match, levenshtein, FuzzyMatch};
pub use merge::{merge_proposals, MergeOutcome};
pub use pipeline::{DiscardProposal, Pipeline, PipelineStats};
pub use relations::{
    centroid, cosine_similarity, RelationEngine, RelationStats, RelationThresholds,
};
pub use store::{KeywordStore, MemoryStore, PgStore};
