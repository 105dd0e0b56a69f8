//! Orchestrates the full keyword pipeline:
//! 1. Clean the raw batch (trim, dedup)
//! 2. Scope-filter against the topic/service vocabularies
//! 3. Import in-scope keywords and record discard proposals
//! 4. Generate embeddings for pending keywords
//! 5. Rebuild centroids and cluster relations
//!
//! Discard proposals are returned for review, not committed; committing is
//! an explicit `mark_discarded` call by the admin layer.

use anyhow::Result;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use embed_client::{EmbedAgent, RateLimiter};
use keyloom_common::Keyword;

use crate::cleaner::clean_keywords;
use crate::embedder::{EmbedRequestItem, EmbeddingGenerator};
use crate::filter::{ScopeDecision, TopicFilter};
use crate::relations::{RelationEngine, RelationStats};
use crate::store::KeywordStore;

/// A keyword the filter wants to discard, pending review.
#[derive(Debug, Clone, Serialize)]
pub struct DiscardProposal {
    pub keyword_id: Uuid,
    pub text: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineStats {
    pub original_count: usize,
    pub cleaned_count: usize,
    pub duplicates_removed: usize,
    pub imported: usize,
    pub discard_proposals: Vec<DiscardProposal>,
    pub embedded: usize,
    pub embed_failures: usize,
    pub relations: RelationStats,
}

pub struct Pipeline<S> {
    store: S,
    filter: TopicFilter,
    generator: EmbeddingGenerator,
    relation_engine: RelationEngine,
}

impl<S: KeywordStore> Pipeline<S> {
    pub fn new(
        store: S,
        filter: TopicFilter,
        generator: EmbeddingGenerator,
        relation_engine: RelationEngine,
    ) -> Self {
        Self {
            store,
            filter,
            generator,
            relation_engine,
        }
    }

    /// Run the pipeline over a raw keyword batch.
    pub async fn run(
        &self,
        agent: &dyn EmbedAgent,
        limiter: &mut RateLimiter,
        raw: &[String],
    ) -> Result<PipelineStats> {
        let report = clean_keywords(raw);

        // Import everything; off-topic keywords become discard proposals
        // instead of being silently dropped.
        let mut keywords = Vec::with_capacity(report.cleaned.len());
        let mut discard_proposals = Vec::new();
        for text in &report.cleaned {
            let keyword = Keyword::new(text.clone());
            if let ScopeDecision::Discard { reason } = self.filter.classify(text) {
                discard_proposals.push(DiscardProposal {
                    keyword_id: keyword.id,
                    text: text.clone(),
                    reason,
                });
            }
            keywords.push(keyword);
        }
        self.store.insert_keywords(&keywords).await?;

        info!(
            imported = keywords.len(),
            discard_proposals = discard_proposals.len(),
            "keywords imported"
        );

        // Embed pending keywords the filter still accepts. Pending includes
        // keywords proposed for discard on an earlier run whose commit is
        // still awaiting review, so each one is re-classified here rather
        // than trusting this run's proposal list.
        let pending = self.store.pending_keywords().await?;
        let items: Vec<EmbedRequestItem> = pending
            .iter()
            .filter(|kw| {
                kw.embedding.is_none()
                    && matches!(self.filter.classify(&kw.text), ScopeDecision::InScope { .. })
            })
            .map(EmbedRequestItem::from)
            .collect();

        let (embedded, embed_failures) = if items.is_empty() {
            (0, 0)
        } else {
            let batch = self
                .generator
                .run(agent, &self.store, limiter, &items)
                .await?;
            (batch.succeeded, batch.outcomes.len() - batch.succeeded)
        };

        let relations = self.relation_engine.recompute(&self.store).await?;

        Ok(PipelineStats {
            original_count: report.original_count,
            cleaned_count: report.cleaned_count,
            duplicates_removed: report.duplicates_removed,
            imported: keywords.len(),
            discard_proposals,
            embedded,
            embed_failures,
            relations,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
