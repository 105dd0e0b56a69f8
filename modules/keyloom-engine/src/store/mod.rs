//! Store abstraction for keywords, clusters and relations.
//!
//! The core treats persistence as a key-addressable record store; joins and
//! grouping happen in application code. Implemented by `PgStore`
//! (production, Postgres via sqlx) and `MemoryStore` (tests, no database).

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use keyloom_common::{Cluster, ClusterRelation, Keyword};

#[async_trait]
pub trait KeywordStore: Send + Sync {
    // --- Keywords ---

    /// Insert imported keywords. Ids are caller-assigned.
    async fn insert_keywords(&self, keywords: &[Keyword]) -> Result<()>;

    /// Keywords awaiting processing (status `pending`).
    async fn pending_keywords(&self) -> Result<Vec<Keyword>>;

    /// Keywords holding both an embedding and an active cluster assignment.
    async fn embedded_keywords(&self) -> Result<Vec<Keyword>>;

    /// Persist a keyword's embedding vector.
    async fn save_embedding(&self, keyword_id: Uuid, embedding: &[f32]) -> Result<()>;

    /// Commit a discard proposal: status `discarded` plus reason and
    /// timestamp. Keywords are never physically deleted.
    async fn mark_discarded(&self, keyword_id: Uuid, reason: &str) -> Result<()>;

    /// Assign a keyword to a cluster, transitioning it to `clustered`.
    async fn assign_cluster(&self, keyword_id: Uuid, cluster_id: Uuid) -> Result<()>;

    // --- Clusters ---

    async fn insert_clusters(&self, clusters: &[Cluster]) -> Result<()>;

    async fn clusters(&self) -> Result<Vec<Cluster>>;

    /// Persist a recomputed centroid and its contributing-embedding count.
    /// `None` records that the cluster currently has no embedded members.
    async fn save_centroid(
        &self,
        cluster_id: Uuid,
        centroid: Option<&[f32]>,
        embedded_count: usize,
    ) -> Result<()>;

    // --- Relations (replace-all, sequenced by the relation engine) ---

    async fn clear_relations(&self) -> Result<()>;

    async fn insert_relations(&self, relations: &[ClusterRelation]) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Arc<S> blanket — lets tests share the store for assertions
// ---------------------------------------------------------------------------

#[async_trait]
impl<S: KeywordStore + ?Sized> KeywordStore for Arc<S> {
    async fn insert_keywords(&self, keywords: &[Keyword]) -> Result<()> {
        (**self).insert_keywords(keywords).await
    }

    async fn pending_keywords(&self) -> Result<Vec<Keyword>> {
        (**self).pending_keywords().await
    }

    async fn embedded_keywords(&self) -> Result<Vec<Keyword>> {
        (**self).embedded_keywords().await
    }

    async fn save_embedding(&self, keyword_id: Uuid, embedding: &[f32]) -> Result<()> {
        (**self).save_embedding(keyword_id, embedding).await
    }

    async fn mark_discarded(&self, keyword_id: Uuid, reason: &str) -> Result<()> {
        (**self).mark_discarded(keyword_id, reason).await
    }

    async fn assign_cluster(&self, keyword_id: Uuid, cluster_id: Uuid) -> Result<()> {
        (**self).assign_cluster(keyword_id, cluster_id).await
    }

    async fn insert_clusters(&self, clusters: &[Cluster]) -> Result<()> {
        (**self).insert_clusters(clusters).await
    }

    async fn clusters(&self) -> Result<Vec<Cluster>> {
        (**self).clusters().await
    }

    async fn save_centroid(
        &self,
        cluster_id: Uuid,
        centroid: Option<&[f32]>,
        embedded_count: usize,
    ) -> Result<()> {
        (**self)
            .save_centroid(cluster_id, centroid, embedded_count)
            .await
    }

    async fn clear_relations(&self) -> Result<()> {
        (**self).clear_relations().await
    }

    async fn insert_relations(&self, relations: &[ClusterRelation]) -> Result<()> {
        (**self).insert_relations(relations).await
    }
}
