//! Postgres-backed store over the `keywords`, `clusters` and
//! `cluster_relations` tables.
//!
//! Vectors travel as JSONB float arrays; enums as their snake_case text
//! values. Relation replacement is delete-then-insert with no transaction —
//! the relation engine is a stateless full rebuild, so a partial failure is
//! recovered by re-running it.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use keyloom_common::{Cluster, ClusterRelation, FunnelStage, Intent, Keyword, KeywordStatus};

use super::KeywordStore;

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::new(pool))
    }

    /// Create the tables if they do not exist.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS keywords (
                id UUID PRIMARY KEY,
                text TEXT NOT NULL,
                search_volume BIGINT,
                intent TEXT,
                status TEXT NOT NULL DEFAULT 'pending',
                embedding JSONB,
                cluster_id UUID,
                discard_reason TEXT,
                discarded_at TIMESTAMPTZ
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS clusters (
                id UUID PRIMARY KEY,
                name TEXT NOT NULL,
                entity TEXT NOT NULL,
                intent TEXT,
                stage TEXT,
                pillar BOOLEAN NOT NULL DEFAULT FALSE,
                keywords JSONB NOT NULL DEFAULT '[]',
                centroid JSONB,
                embedded_count BIGINT NOT NULL DEFAULT 0
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS cluster_relations (
                cluster_a UUID NOT NULL,
                cluster_b UUID NOT NULL,
                similarity REAL NOT NULL,
                kind TEXT NOT NULL,
                PRIMARY KEY (cluster_a, cluster_b)
            )",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl KeywordStore for PgStore {
    async fn insert_keywords(&self, keywords: &[Keyword]) -> Result<()> {
        for kw in keywords {
            sqlx::query(
                "INSERT INTO keywords
                    (id, text, search_volume, intent, status, embedding, cluster_id,
                     discard_reason, discarded_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                 ON CONFLICT (id) DO NOTHING",
            )
            .bind(kw.id)
            .bind(&kw.text)
            .bind(kw.search_volume)
            .bind(kw.intent.map(intent_str))
            .bind(status_str(kw.status))
            .bind(
                kw.embedding
                    .as_ref()
                    .map(|e| serde_json::to_value(e))
                    .transpose()?,
            )
            .bind(kw.cluster_id)
            .bind(&kw.discard_reason)
            .bind(kw.discarded_at)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    async fn pending_keywords(&self) -> Result<Vec<Keyword>> {
        let rows = sqlx::query(
            "SELECT id, text, search_volume, intent, status, embedding, cluster_id,
                    discard_reason, discarded_at
             FROM keywords WHERE status = 'pending' ORDER BY text",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(keyword_from_row).collect()
    }

    async fn embedded_keywords(&self) -> Result<Vec<Keyword>> {
        let rows = sqlx::query(
            "SELECT id, text, search_volume, intent, status, embedding, cluster_id,
                    discard_reason, discarded_at
             FROM keywords
             WHERE embedding IS NOT NULL AND cluster_id IS NOT NULL
             ORDER BY text",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(keyword_from_row).collect()
    }

    async fn save_embedding(&self, keyword_id: Uuid, embedding: &[f32]) -> Result<()> {
        sqlx::query("UPDATE keywords SET embedding = $2 WHERE id = $1")
            .bind(keyword_id)
            .bind(serde_json::to_value(embedding)?)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_discarded(&self, keyword_id: Uuid, reason: &str) -> Result<()> {
        sqlx::query(
            "UPDATE keywords
             SET status = 'discarded', discard_reason = $2, discarded_at = $3
             WHERE id = $1",
        )
        .bind(keyword_id)
        .bind(reason)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn assign_cluster(&self, keyword_id: Uuid, cluster_id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE keywords SET cluster_id = $2, status = 'clustered' WHERE id = $1",
        )
        .bind(keyword_id)
        .bind(cluster_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_clusters(&self, clusters: &[Cluster]) -> Result<()> {
        for cluster in clusters {
            sqlx::query(
                "INSERT INTO clusters
                    (id, name, entity, intent, stage, pillar, keywords, centroid,
                     embedded_count)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                 ON CONFLICT (id) DO NOTHING",
            )
            .bind(cluster.id)
            .bind(&cluster.name)
            .bind(&cluster.entity)
            .bind(cluster.intent.map(intent_str))
            .bind(cluster.stage.map(stage_str))
            .bind(cluster.pillar)
            .bind(serde_json::to_value(&cluster.keywords)?)
            .bind(
                cluster
                    .centroid
                    .as_ref()
                    .map(|c| serde_json::to_value(c))
                    .transpose()?,
            )
            .bind(cluster.embedded_count as i64)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    async fn clusters(&self) -> Result<Vec<Cluster>> {
        let rows = sqlx::query(
            "SELECT id, name, entity, intent, stage, pillar, keywords, centroid,
                    embedded_count
             FROM clusters ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(cluster_from_row).collect()
    }

    async fn save_centroid(
        &self,
        cluster_id: Uuid,
        centroid: Option<&[f32]>,
        embedded_count: usize,
    ) -> Result<()> {
        sqlx::query("UPDATE clusters SET centroid = $2, embedded_count = $3 WHERE id = $1")
            .bind(cluster_id)
            .bind(centroid.map(serde_json::to_value).transpose()?)
            .bind(embedded_count as i64)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn clear_relations(&self) -> Result<()> {
        sqlx::query("DELETE FROM cluster_relations")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_relations(&self, relations: &[ClusterRelation]) -> Result<()> {
        for rel in relations {
            sqlx::query(
                "INSERT INTO cluster_relations (cluster_a, cluster_b, similarity, kind)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(rel.cluster_a)
            .bind(rel.cluster_b)
            .bind(rel.similarity)
            .bind(rel.kind.to_string())
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn keyword_from_row(row: &sqlx::postgres::PgRow) -> Result<Keyword> {
    let intent: Option<String> = row.try_get("intent")?;
    let status: String = row.try_get("status")?;
    let embedding: Option<serde_json::Value> = row.try_get("embedding")?;

    Ok(Keyword {
        id: row.try_get("id")?,
        text: row.try_get("text")?,
        search_volume: row.try_get("search_volume")?,
        intent: intent.as_deref().map(parse_intent).transpose()?,
        status: parse_status(&status)?,
        embedding: embedding.map(serde_json::from_value).transpose()?,
        cluster_id: row.try_get("cluster_id")?,
        discard_reason: row.try_get("discard_reason")?,
        discarded_at: row.try_get("discarded_at")?,
    })
}

fn cluster_from_row(row: &sqlx::postgres::PgRow) -> Result<Cluster> {
    let intent: Option<String> = row.try_get("intent")?;
    let stage: Option<String> = row.try_get("stage")?;
    let keywords: serde_json::Value = row.try_get("keywords")?;
    let centroid: Option<serde_json::Value> = row.try_get("centroid")?;
    let embedded_count: i64 = row.try_get("embedded_count")?;

    Ok(Cluster {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        entity: row.try_get("entity")?,
        intent: intent.as_deref().map(parse_intent).transpose()?,
        stage: stage.as_deref().map(parse_stage).transpose()?,
        pillar: row.try_get("pillar")?,
        keywords: serde_json::from_value(keywords)?,
        centroid: centroid.map(serde_json::from_value).transpose()?,
        embedded_count: embedded_count as usize,
    })
}

// ---------------------------------------------------------------------------
// Enum <-> text
// ---------------------------------------------------------------------------

fn status_str(status: KeywordStatus) -> &'static str {
    match status {
        KeywordStatus::Pending => "pending",
        KeywordStatus::Clustered => "clustered",
        KeywordStatus::Discarded => "discarded",
    }
}

fn parse_status(s: &str) -> Result<KeywordStatus> {
    match s {
        "pending" => Ok(KeywordStatus::Pending),
        "clustered" => Ok(KeywordStatus::Clustered),
        "discarded" => Ok(KeywordStatus::Discarded),
        other => Err(anyhow!("unknown keyword status '{other}'")),
    }
}

fn intent_str(intent: Intent) -> &'static str {
    match intent {
        Intent::Informational => "informational",
        Intent::Transactional => "transactional",
        Intent::Navigational => "navigational",
        Intent::Commercial => "commercial",
    }
}

fn parse_intent(s: &str) -> Result<Intent> {
    match s {
        "informational" => Ok(Intent::Informational),
        "transactional" => Ok(Intent::Transactional),
        "navigational" => Ok(Intent::Navigational),
        "commercial" => Ok(Intent::Commercial),
        other => Err(anyhow!("unknown intent '{other}'")),
    }
}

fn stage_str(stage: FunnelStage) -> &'static str {
    match stage {
        FunnelStage::Awareness => "awareness",
        FunnelStage::Consideration => "consideration",
        FunnelStage::Decision => "decision",
    }
}

fn parse_stage(s: &str) -> Result<FunnelStage> {
    match s {
        "awareness" => Ok(FunnelStage::Awareness),
        "consideration" => Ok(FunnelStage::Consideration),
        "decision" => Ok(FunnelStage::Decision),
        other => Err(anyhow!("unknown funnel stage '{other}'")),
    }
}
