//! In-memory store for testing. No database required.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use keyloom_common::{Cluster, ClusterRelation, Keyword, KeywordStatus};

use super::KeywordStore;

/// Mutex'd maps standing in for the Postgres tables. Exposes its contents
/// for test assertions.
#[derive(Default)]
pub struct MemoryStore {
    keywords: Mutex<HashMap<Uuid, Keyword>>,
    clusters: Mutex<Vec<Cluster>>,
    relations: Mutex<Vec<ClusterRelation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read one keyword by id (for test assertions).
    pub fn keyword(&self, id: Uuid) -> Option<Keyword> {
        self.keywords.lock().unwrap().get(&id).cloned()
    }

    /// All keywords, unordered (for test assertions).
    pub fn all_keywords(&self) -> Vec<Keyword> {
        self.keywords.lock().unwrap().values().cloned().collect()
    }

    /// All stored relations (for test assertions).
    pub fn relations(&self) -> Vec<ClusterRelation> {
        self.relations.lock().unwrap().clone()
    }

    /// All clusters (for test assertions).
    pub fn all_clusters(&self) -> Vec<Cluster> {
        self.clusters.lock().unwrap().clone()
    }
}

#[async_trait]
impl KeywordStore for MemoryStore {
    async fn insert_keywords(&self, keywords: &[Keyword]) -> Result<()> {
        let mut map = self.keywords.lock().unwrap();
        for kw in keywords {
            map.insert(kw.id, kw.clone());
        }
        Ok(())
    }

    async fn pending_keywords(&self) -> Result<Vec<Keyword>> {
        Ok(self
            .keywords
            .lock()
            .unwrap()
            .values()
            .filter(|k| k.status == KeywordStatus::Pending)
            .cloned()
            .collect())
    }

    async fn embedded_keywords(&self) -> Result<Vec<Keyword>> {
        Ok(self
            .keywords
            .lock()
            .unwrap()
            .values()
            .filter(|k| k.embedding.is_some() && k.cluster_id.is_some())
            .cloned()
            .collect())
    }

    async fn save_embedding(&self, keyword_id: Uuid, embedding: &[f32]) -> Result<()> {
        let mut map = self.keywords.lock().unwrap();
        let kw = map
            .get_mut(&keyword_id)
            .ok_or_else(|| anyhow!("unknown keyword {keyword_id}"))?;
        kw.embedding = Some(embedding.to_vec());
        Ok(())
    }

    async fn mark_discarded(&self, keyword_id: Uuid, reason: &str) -> Result<()> {
        let mut map = self.keywords.lock().unwrap();
        let kw = map
            .get_mut(&keyword_id)
            .ok_or_else(|| anyhow!("unknown keyword {keyword_id}"))?;
        kw.status = KeywordStatus::Discarded;
        kw.discard_reason = Some(reason.to_string());
        kw.discarded_at = Some(Utc::now());
        Ok(())
    }

    async fn assign_cluster(&self, keyword_id: Uuid, cluster_id: Uuid) -> Result<()> {
        let mut map = self.keywords.lock().unwrap();
        let kw = map
            .get_mut(&keyword_id)
            .ok_or_else(|| anyhow!("unknown keyword {keyword_id}"))?;
        kw.cluster_id = Some(cluster_id);
        kw.status = KeywordStatus::Clustered;
        Ok(())
    }

    async fn insert_clusters(&self, clusters: &[Cluster]) -> Result<()> {
        self.clusters.lock().unwrap().extend_from_slice(clusters);
        Ok(())
    }

    async fn clusters(&self) -> Result<Vec<Cluster>> {
        Ok(self.clusters.lock().unwrap().clone())
    }

    async fn save_centroid(
        &self,
        cluster_id: Uuid,
        centroid: Option<&[f32]>,
        embedded_count: usize,
    ) -> Result<()> {
        let mut clusters = self.clusters.lock().unwrap();
        let cluster = clusters
            .iter_mut()
            .find(|c| c.id == cluster_id)
            .ok_or_else(|| anyhow!("unknown cluster {cluster_id}"))?;
        cluster.centroid = centroid.map(|c| c.to_vec());
        cluster.embedded_count = embedded_count;
        Ok(())
    }

    async fn clear_relations(&self) -> Result<()> {
        self.relations.lock().unwrap().clear();
        Ok(())
    }

    async fn insert_relations(&self, relations: &[ClusterRelation]) -> Result<()> {
        self.relations.lock().unwrap().extend_from_slice(relations);
        Ok(())
    }
}
