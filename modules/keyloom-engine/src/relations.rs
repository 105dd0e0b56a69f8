//! Cluster centroids and pairwise relation classification.
//!
//! Recomputation is a stateless full rebuild: every centroid is recomputed
//! from the current embeddings and the relation set is replaced wholesale.
//! A partial failure between the delete and the insert is recovered by
//! simply re-running.

use std::collections::HashMap;

use anyhow::Result;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use keyloom_common::{ClusterRelation, RelationKind};

use crate::store::KeywordStore;

/// Similarity cutoffs for the relation tiers, highest first. Policy
/// constants by default, but callers can tune them.
#[derive(Debug, Clone, Copy)]
pub struct RelationThresholds {
    pub canibalization: f32,
    pub sibling: f32,
    pub internal_link: f32,
}

impl Default for RelationThresholds {
    fn default() -> Self {
        Self {
            canibalization: 0.85,
            sibling: 0.70,
            internal_link: 0.50,
        }
    }
}

impl RelationThresholds {
    pub fn classify(&self, similarity: f32) -> RelationKind {
        if similarity > self.canibalization {
            RelationKind::Canibalization
        } else if similarity > self.sibling {
            RelationKind::Sibling
        } else if similarity > self.internal_link {
            RelationKind::InternalLink
        } else {
            RelationKind::Related
        }
    }
}

/// Element-wise mean of the given embeddings. The dimension is taken from
/// the first vector; members with a different dimension are skipped. Returns
/// the centroid and the number of contributing vectors, or `None` for an
/// empty set.
pub fn centroid(embeddings: &[&[f32]]) -> Option<(Vec<f32>, usize)> {
    let first = embeddings.first()?;
    let dim = first.len();
    if dim == 0 {
        return None;
    }

    let mut sum = vec![0.0f32; dim];
    let mut contributing = 0usize;
    for emb in embeddings {
        if emb.len() != dim {
            continue;
        }
        for (slot, value) in sum.iter_mut().zip(emb.iter()) {
            *slot += value;
        }
        contributing += 1;
    }

    let n = contributing as f32;
    for value in &mut sum {
        *value /= n;
    }

    Some((sum, contributing))
}

/// Cosine similarity between two vectors. 0 when dimensions mismatch or
/// either norm is 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RelationStats {
    pub clusters: usize,
    pub with_centroid: usize,
    pub pairs_compared: usize,
    pub relations_persisted: usize,
}

pub struct RelationEngine {
    thresholds: RelationThresholds,
}

impl Default for RelationEngine {
    fn default() -> Self {
        Self::new(RelationThresholds::default())
    }
}

impl RelationEngine {
    pub fn new(thresholds: RelationThresholds) -> Self {
        Self { thresholds }
    }

    /// Recompute every cluster centroid and rebuild the relation set.
    ///
    /// Clusters with no embedded members get a null centroid and take no
    /// part in pairing. Pairs at or below the `related` tier are not
    /// persisted. O(n²) in cluster count, which stays in the low hundreds.
    pub async fn recompute<S: KeywordStore>(&self, store: &S) -> Result<RelationStats> {
        let clusters = store.clusters().await?;
        let embedded = store.embedded_keywords().await?;

        // Group member embeddings by assigned cluster.
        let mut by_cluster: HashMap<Uuid, Vec<Vec<f32>>> = HashMap::new();
        for kw in embedded {
            if let (Some(cluster_id), Some(embedding)) = (kw.cluster_id, kw.embedding) {
                by_cluster.entry(cluster_id).or_default().push(embedding);
            }
        }

        let mut stats = RelationStats {
            clusters: clusters.len(),
            ..Default::default()
        };

        let mut centroids: Vec<(Uuid, Vec<f32>)> = Vec::new();
        for cluster in &clusters {
            let members = by_cluster.get(&cluster.id);
            let computed = members.and_then(|m| {
                let views: Vec<&[f32]> = m.iter().map(Vec::as_slice).collect();
                centroid(&views)
            });

            match computed {
                Some((vector, contributing)) => {
                    store
                        .save_centroid(cluster.id, Some(&vector), contributing)
                        .await?;
                    centroids.push((cluster.id, vector));
                    stats.with_centroid += 1;
                }
                None => {
                    store.save_centroid(cluster.id, None, 0).await?;
                }
            }
        }

        // All unordered pairs, one direction each.
        let mut relations = Vec::new();
        for i in 0..centroids.len() {
            for j in (i + 1)..centroids.len() {
                stats.pairs_compared += 1;
                let similarity = cosine_similarity(&centroids[i].1, &centroids[j].1);
                let kind = self.thresholds.classify(similarity);
                if kind == RelationKind::Related {
                    continue;
                }
                relations.push(ClusterRelation {
                    cluster_a: centroids[i].0,
                    cluster_b: centroids[j].0,
                    similarity: round2(similarity),
                    kind,
                });
            }
        }

        store.clear_relations().await?;
        store.insert_relations(&relations).await?;
        stats.relations_persisted = relations.len();

        info!(
            clusters = stats.clusters,
            with_centroid = stats.with_centroid,
            relations = stats.relations_persisted,
            "centroids and relations rebuilt"
        );

        Ok(stats)
    }
}
