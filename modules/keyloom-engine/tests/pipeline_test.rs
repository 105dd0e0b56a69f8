//! Integration tests for the keyword pipeline. No network, no database:
//! MockEmbedder and MemoryStore stand in for the provider and Postgres.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use uuid::Uuid;

use embed_client::{EmbedAgent, RateLimiter, RateLimits};
use keyloom_common::{Cluster, Keyword, KeywordStatus, KeyloomError, RelationKind};
use keyloom_engine::{
    EmbedRequestItem, EmbeddingGenerator, KeywordStore, MemoryStore, Pipeline, RelationEngine,
    RelationThresholds, TopicFilter,
};

// ---------------------------------------------------------------------------
// Mock embedder
// ---------------------------------------------------------------------------

/// Deterministic embedder. Returns a scripted vector per keyword text and
/// can be told to fail on the nth call (zero-based).
struct MockEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    default: Vec<f32>,
    fail_on_call: Option<usize>,
    calls: AtomicUsize,
    seen_texts: Mutex<Vec<String>>,
}

impl MockEmbedder {
    fn new() -> Self {
        Self {
            vectors: HashMap::new(),
            default: vec![1.0, 0.0, 0.0],
            fail_on_call: None,
            calls: AtomicUsize::new(0),
            seen_texts: Mutex::new(Vec::new()),
        }
    }

    /// Every text sent to the provider, in call order.
    fn seen(&self) -> Vec<String> {
        self.seen_texts.lock().unwrap().clone()
    }

    fn failing_on(call: usize) -> Self {
        let mut mock = Self::new();
        mock.fail_on_call = Some(call);
        mock
    }

    fn with_vector(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }
}

#[async_trait]
impl EmbedAgent for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.seen_texts.lock().unwrap().push(text.to_string());
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on_call == Some(call) {
            return Err(anyhow!("provider error (503): service unavailable"));
        }
        Ok(self
            .vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.default.clone()))
    }

    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in &texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn limiter() -> RateLimiter {
    RateLimiter::new(RateLimits {
        per_minute: 1000,
        per_day: 100_000,
    })
}

fn cluster(name: &str) -> Cluster {
    Cluster {
        id: Uuid::new_v4(),
        name: name.to_string(),
        entity: name.to_string(),
        intent: None,
        stage: None,
        pillar: false,
        keywords: Vec::new(),
        centroid: None,
        embedded_count: 0,
    }
}

async fn seed_member(
    store: &MemoryStore,
    cluster_id: Uuid,
    text: &str,
    embedding: Vec<f32>,
) -> Uuid {
    let mut kw = Keyword::new(text);
    kw.embedding = Some(embedding);
    let id = kw.id;
    store.insert_keywords(&[kw]).await.unwrap();
    store.assign_cluster(id, cluster_id).await.unwrap();
    id
}

// ---------------------------------------------------------------------------
// Embedding batch semantics
// ---------------------------------------------------------------------------

#[tokio::test]
async fn one_failure_does_not_stop_the_batch() {
    let store = MemoryStore::new();
    let keywords: Vec<Keyword> = (0..5)
        .map(|i| Keyword::new(format!("keyword {i}")))
        .collect();
    store.insert_keywords(&keywords).await.unwrap();

    let items: Vec<EmbedRequestItem> = keywords.iter().map(EmbedRequestItem::from).collect();
    let agent = MockEmbedder::failing_on(2);
    let generator = EmbeddingGenerator::new(0);
    let mut limiter = limiter();

    let report = generator
        .run(&agent, &store, &mut limiter, &items)
        .await
        .unwrap();

    assert_eq!(report.outcomes.len(), 5);
    assert_eq!(report.succeeded, 4);

    let failures: Vec<_> = report.outcomes.iter().filter(|o| !o.success).collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].text, "keyword 2");
    assert!(failures[0].error.as_deref().unwrap().contains("503"));
    assert!(failures[0].embedding.is_empty());

    // The other four vectors were persisted.
    let persisted = store
        .all_keywords()
        .iter()
        .filter(|k| k.embedding.is_some())
        .count();
    assert_eq!(persisted, 4);
    assert!(store.keyword(keywords[2].id).unwrap().embedding.is_none());
}

#[tokio::test]
async fn failure_position_does_not_matter() {
    for fail_at in [0, 4] {
        let store = MemoryStore::new();
        let keywords: Vec<Keyword> = (0..5)
            .map(|i| Keyword::new(format!("keyword {i}")))
            .collect();
        store.insert_keywords(&keywords).await.unwrap();
        let items: Vec<EmbedRequestItem> = keywords.iter().map(EmbedRequestItem::from).collect();

        let agent = MockEmbedder::failing_on(fail_at);
        let report = EmbeddingGenerator::new(0)
            .run(&agent, &store, &mut limiter(), &items)
            .await
            .unwrap();

        assert_eq!(report.outcomes.len(), 5);
        assert_eq!(report.succeeded, 4);
        assert!(!report.outcomes[fail_at].success);
    }
}

#[tokio::test]
async fn empty_batch_is_rejected_before_io() {
    let store = MemoryStore::new();
    let agent = MockEmbedder::new();
    let result = EmbeddingGenerator::new(0)
        .run(&agent, &store, &mut limiter(), &[])
        .await;

    assert!(matches!(result, Err(KeyloomError::Validation(_))));
    assert_eq!(agent.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn daily_ceiling_aborts_the_batch() {
    let store = MemoryStore::new();
    let keywords: Vec<Keyword> = (0..3)
        .map(|i| Keyword::new(format!("keyword {i}")))
        .collect();
    store.insert_keywords(&keywords).await.unwrap();
    let items: Vec<EmbedRequestItem> = keywords.iter().map(EmbedRequestItem::from).collect();

    let mut limiter = RateLimiter::new(RateLimits {
        per_minute: 1000,
        per_day: 2,
    });
    let agent = MockEmbedder::new();
    let result = EmbeddingGenerator::new(0)
        .run(&agent, &store, &mut limiter, &items)
        .await;

    assert!(matches!(
        result,
        Err(KeyloomError::DailyLimitExceeded { limit: 2 })
    ));
}

// ---------------------------------------------------------------------------
// Centroids and relations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn centroids_and_relations_are_rebuilt() {
    init_tracing();
    let store = Arc::new(MemoryStore::new());

    let near_a = cluster("seo onpage");
    let near_b = cluster("seo on page");
    let far = cluster("diseno web");
    let empty = cluster("sin miembros");
    store
        .insert_clusters(&[near_a.clone(), near_b.clone(), far.clone(), empty.clone()])
        .await
        .unwrap();

    // near_a and near_b point the same way; far is orthogonal.
    seed_member(&store, near_a.id, "kw a1", vec![1.0, 0.0]).await;
    seed_member(&store, near_a.id, "kw a2", vec![1.0, 0.2]).await;
    seed_member(&store, near_b.id, "kw b1", vec![1.0, 0.1]).await;
    seed_member(&store, far.id, "kw c1", vec![0.0, 1.0]).await;

    let engine = RelationEngine::new(RelationThresholds::default());
    let stats = engine.recompute(&store).await.unwrap();

    assert_eq!(stats.clusters, 4);
    assert_eq!(stats.with_centroid, 3);
    // Empty cluster is excluded from pairing: C(3,2) pairs.
    assert_eq!(stats.pairs_compared, 3);

    let clusters = store.all_clusters();
    let a = clusters.iter().find(|c| c.id == near_a.id).unwrap();
    assert_eq!(a.centroid.as_deref(), Some(&[1.0, 0.1][..]));
    assert_eq!(a.embedded_count, 2);
    let e = clusters.iter().find(|c| c.id == empty.id).unwrap();
    assert!(e.centroid.is_none());
    assert_eq!(e.embedded_count, 0);

    let relations = store.relations();
    // near_a/near_b cannibalize; both low-similarity pairs fall under the
    // persistence floor.
    assert_eq!(relations.len(), 1);
    assert_eq!(relations[0].kind, RelationKind::Canibalization);
    assert!(relations[0].similarity > 0.98);

    // Similarity is stored rounded to two decimals.
    let stored = relations[0].similarity;
    assert_eq!((stored * 100.0).round() / 100.0, stored);
}

#[tokio::test]
async fn recompute_is_replace_all() {
    let store = Arc::new(MemoryStore::new());
    let a = cluster("a");
    let b = cluster("b");
    store.insert_clusters(&[a.clone(), b.clone()]).await.unwrap();
    seed_member(&store, a.id, "kw a", vec![1.0, 0.0]).await;
    seed_member(&store, b.id, "kw b", vec![1.0, 0.05]).await;

    let engine = RelationEngine::default();
    engine.recompute(&store).await.unwrap();
    engine.recompute(&store).await.unwrap();

    // Re-running rebuilds rather than accumulates.
    assert_eq!(store.relations().len(), 1);
}

// ---------------------------------------------------------------------------
// Full pipeline
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pipeline_cleans_filters_embeds() {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    let pipeline = Pipeline::new(
        Arc::clone(&store),
        TopicFilter::default(),
        EmbeddingGenerator::new(0),
        RelationEngine::default(),
    );

    let raw = vec![
        "Auditoria SEO".to_string(),
        " auditoria  seo ".to_string(), // duplicate under case/whitespace dedup
        "marketing digital".to_string(),
        "recetas de cocina".to_string(), // off-topic
        "".to_string(),
    ];

    let agent = MockEmbedder::new();
    let mut limiter = limiter();
    let stats = pipeline.run(&agent, &mut limiter, &raw).await.unwrap();

    assert_eq!(stats.original_count, 5);
    assert_eq!(stats.cleaned_count, 3);
    assert_eq!(stats.duplicates_removed, 1);
    assert_eq!(stats.imported, 3);

    assert_eq!(stats.discard_proposals.len(), 1);
    assert_eq!(stats.discard_proposals[0].text, "recetas de cocina");
    assert_eq!(stats.discard_proposals[0].reason, "no topical match");

    // Only the two in-scope keywords were embedded.
    assert_eq!(stats.embedded, 2);
    assert_eq!(stats.embed_failures, 0);

    // The proposal was not committed: the keyword is still pending.
    let flagged = store.keyword(stats.discard_proposals[0].keyword_id).unwrap();
    assert_eq!(flagged.status, KeywordStatus::Pending);
    assert!(flagged.embedding.is_none());
}

#[tokio::test]
async fn uncommitted_discards_stay_out_of_later_runs() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = Pipeline::new(
        Arc::clone(&store),
        TopicFilter::default(),
        EmbeddingGenerator::new(0),
        RelationEngine::default(),
    );
    let agent = MockEmbedder::new();
    let mut limiter = limiter();

    // First run proposes discarding the off-topic keyword; nothing to embed.
    let first = pipeline
        .run(&agent, &mut limiter, &["recetas de cocina".to_string()])
        .await
        .unwrap();
    assert_eq!(first.discard_proposals.len(), 1);
    assert_eq!(first.embedded, 0);

    // The proposal is still pending review when the next batch arrives. It
    // must not ride along to the provider with the new in-scope keyword.
    let second = pipeline
        .run(&agent, &mut limiter, &["auditoria seo".to_string()])
        .await
        .unwrap();
    assert_eq!(second.embedded, 1);
    assert_eq!(agent.seen(), vec!["auditoria seo"]);
}

#[tokio::test]
async fn discard_commit_is_a_separate_explicit_step() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = Pipeline::new(
        Arc::clone(&store),
        TopicFilter::default(),
        EmbeddingGenerator::new(0),
        RelationEngine::default(),
    );

    let raw = vec!["recetas de cocina".to_string()];
    let agent = MockEmbedder::new();
    let stats = pipeline.run(&agent, &mut limiter(), &raw).await.unwrap();
    let proposal = &stats.discard_proposals[0];

    store
        .mark_discarded(proposal.keyword_id, &proposal.reason)
        .await
        .unwrap();

    let kw = store.keyword(proposal.keyword_id).unwrap();
    assert_eq!(kw.status, KeywordStatus::Discarded);
    assert_eq!(kw.discard_reason.as_deref(), Some("no topical match"));
    assert!(kw.discarded_at.is_some());
}
