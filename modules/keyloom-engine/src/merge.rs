//! Anti-cannibalization merging of AI-proposed clusters.
//!
//! Proposals sharing the same (entity, intent, stage) key collapse into the
//! first one seen; generic keywords then migrate from non-pillar clusters
//! into their entity's pillar cluster.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::info;

use keyloom_common::{FunnelStage, Intent, KeyloomError, ProposedCluster};

#[derive(Debug, Clone, Serialize)]
pub struct MergeOutcome {
    /// Deduplicated clusters, one per (entity, intent, stage) key.
    pub clusters: Vec<ProposedCluster>,
    /// Keywords that were absorbed into an earlier cluster, for audit.
    pub absorbed: Vec<String>,
    /// Human-readable notes describing each merge and reassignment.
    pub notes: Vec<String>,
}

type MergeKey = (String, Option<Intent>, Option<FunnelStage>);

fn merge_key(cluster: &ProposedCluster) -> MergeKey {
    (cluster.entity.to_lowercase(), cluster.intent, cluster.stage)
}

/// Merge proposed clusters and reassign generic keywords to pillar clusters.
///
/// Walks proposals in input order so first-seen clusters hold their position
/// and metadata. A later pillar proposal promotes the holder to pillar and
/// renames it, but the holder keeps its description and other metadata.
/// Clusters emptied by the generic-keyword pass are dropped.
pub fn merge_proposals(proposals: Vec<ProposedCluster>) -> Result<MergeOutcome, KeyloomError> {
    if proposals.is_empty() {
        return Err(KeyloomError::Validation(
            "no proposed clusters to merge".to_string(),
        ));
    }
    if let Some(bad) = proposals.iter().find(|p| p.entity.trim().is_empty()) {
        return Err(KeyloomError::Validation(format!(
            "proposed cluster '{}' has no entity",
            bad.name
        )));
    }

    let proposal_count = proposals.len();
    let mut merged: Vec<ProposedCluster> = Vec::new();
    let mut index_by_key: HashMap<MergeKey, usize> = HashMap::new();
    let mut absorbed = Vec::new();
    let mut notes = Vec::new();

    for proposal in proposals {
        if proposal.out_of_scope {
            notes.push(format!("Skipped '{}': out of scope", proposal.name));
            continue;
        }

        let key = merge_key(&proposal);
        match index_by_key.get(&key).copied() {
            None => {
                index_by_key.insert(key, merged.len());
                merged.push(proposal);
            }
            Some(idx) => {
                let holder = &mut merged[idx];
                let mut added = 0;
                for kw in proposal.keywords {
                    if contains_keyword(&holder.keywords, &kw.text) {
                        continue;
                    }
                    absorbed.push(kw.text.clone());
                    holder.keywords.push(kw);
                    added += 1;
                }

                let mut note = format!(
                    "Merged '{}' into '{}' ({} keywords added, entity '{}')",
                    proposal.name, holder.name, added, holder.entity
                );
                if proposal.pillar && !holder.pillar {
                    holder.pillar = true;
                    note.push_str(&format!("; promoted to pillar as '{}'", proposal.name));
                    holder.name = proposal.name;
                }
                notes.push(note);
            }
        }
    }

    reassign_generic_keywords(&mut merged, &mut notes);

    info!(
        proposed = proposal_count,
        merged = merged.len(),
        absorbed = absorbed.len(),
        "cluster proposals merged"
    );

    Ok(MergeOutcome {
        clusters: merged,
        absorbed,
        notes,
    })
}

/// Move keywords flagged generic out of non-pillar clusters into the pillar
/// cluster of the same entity, when one exists. Clusters left empty are
/// dropped.
fn reassign_generic_keywords(clusters: &mut Vec<ProposedCluster>, notes: &mut Vec<String>) {
    let pillar_entities: HashSet<String> = clusters
        .iter()
        .filter(|c| c.pillar)
        .map(|c| c.entity.to_lowercase())
        .collect();

    let mut moved: Vec<(String, keyloom_common::ProposedKeyword)> = Vec::new();

    for cluster in clusters.iter_mut() {
        if cluster.pillar {
            continue;
        }
        let entity = cluster.entity.to_lowercase();
        if !pillar_entities.contains(&entity) {
            continue;
        }

        let (generic, kept): (Vec<_>, Vec<_>) =
            cluster.keywords.drain(..).partition(|kw| kw.generic);
        cluster.keywords = kept;

        for kw in generic {
            notes.push(format!(
                "Reassigned generic keyword '{}' from '{}' to the '{}' pillar",
                kw.text, cluster.name, cluster.entity
            ));
            moved.push((entity.clone(), kw));
        }
    }

    for (entity, kw) in moved {
        if let Some(pillar) = clusters
            .iter_mut()
            .find(|c| c.pillar && c.entity.to_lowercase() == entity)
        {
            if !contains_keyword(&pillar.keywords, &kw.text) {
                pillar.keywords.push(kw);
            }
        }
    }

    clusters.retain(|c| !c.keywords.is_empty());
}

fn contains_keyword(keywords: &[keyloom_common::ProposedKeyword], text: &str) -> bool {
    let needle = text.to_lowercase();
    keywords.iter().any(|kw| kw.text.to_lowercase() == needle)
}
