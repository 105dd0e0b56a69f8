use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordStatus {
    Pending,
    Clustered,
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Informational,
    Transactional,
    Navigational,
    Commercial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunnelStage {
    Awareness,
    Consideration,
    Decision,
}

/// Relation tiers between cluster centroids. `Related` is the floor tier and
/// is never persisted. The `canibalization` spelling is the stored value the
/// admin panel expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Canibalization,
    Sibling,
    InternalLink,
    Related,
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelationKind::Canibalization => write!(f, "canibalization"),
            RelationKind::Sibling => write!(f, "sibling"),
            RelationKind::InternalLink => write!(f, "internal_link"),
            RelationKind::Related => write!(f, "related"),
        }
    }
}

// --- Keywords ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Keyword {
    pub id: Uuid,
    pub text: String,
    pub search_volume: Option<i64>,
    pub intent: Option<Intent>,
    pub status: KeywordStatus,
    pub embedding: Option<Vec<f32>>,
    pub cluster_id: Option<Uuid>,
    pub discard_reason: Option<String>,
    pub discarded_at: Option<DateTime<Utc>>,
}

impl Keyword {
    /// A fresh keyword as created on import: pending, no vector, no cluster.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            search_volume: None,
            intent: None,
            status: KeywordStatus::Pending,
            embedding: None,
            cluster_id: None,
            discard_reason: None,
            discarded_at: None,
        }
    }
}

// --- Clusters ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    pub id: Uuid,
    pub name: String,
    pub entity: String,
    pub intent: Option<Intent>,
    pub stage: Option<FunnelStage>,
    pub pillar: bool,
    /// Member keyword texts, first-seen order.
    pub keywords: Vec<String>,
    pub centroid: Option<Vec<f32>>,
    /// How many member embeddings contributed to the centroid.
    pub embedded_count: usize,
}

/// Unordered centroid pair with its similarity tier. One row per pair;
/// (a, b) and (b, a) collapse before storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterRelation {
    pub cluster_a: Uuid,
    pub cluster_b: Uuid,
    pub similarity: f32,
    pub kind: RelationKind,
}

// --- Merger input ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposedKeyword {
    pub text: String,
    /// Generic keywords get reassigned to their entity's pillar cluster.
    #[serde(default)]
    pub generic: bool,
}

/// A cluster draft as proposed by the AI grouping step, before
/// anti-cannibalization merging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposedCluster {
    pub name: String,
    pub entity: String,
    pub intent: Option<Intent>,
    pub stage: Option<FunnelStage>,
    #[serde(default)]
    pub pillar: bool,
    pub keywords: Vec<ProposedKeyword>,
    #[serde(default)]
    pub out_of_scope: bool,
    pub description: Option<String>,
}
