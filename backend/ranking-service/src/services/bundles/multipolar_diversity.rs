use super::RankingBundle;
use crate::models::{AuthorDirectory, Post, RankingResult, ViewerContext};
use crate::services::scoring;
use crate::services::viewpoints::AuthorViewpointProvider;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Multipolar Diversity: greedy re-ranking that spreads viewpoint clusters
/// across the feed.
///
/// Not a one-shot sort: while building the output list it tracks how many
/// posts of each cluster have already been selected and penalizes further
/// same-cluster picks, so an under-represented cluster can outrank a higher
/// base score. The accumulated counts are pass-local state only.
pub struct MultipolarDiversityBundle {
    provider: Arc<dyn AuthorViewpointProvider>,
    diversity_penalty: f32,
}

impl MultipolarDiversityBundle {
    pub fn new(provider: Arc<dyn AuthorViewpointProvider>) -> Self {
        Self {
            provider,
            diversity_penalty: 0.15,
        }
    }
}

struct Candidate {
    index: usize,
    post_id: String,
    cluster: String,
    base_score: f32,
    recency: f32,
    follow_edge: f32,
    reputation: f32,
}

impl RankingBundle for MultipolarDiversityBundle {
    fn id(&self) -> &str {
        "multipolar_diversity"
    }

    fn name(&self) -> &str {
        "Multipolar Diversity"
    }

    fn description(&self) -> &str {
        "Prioritizes viewpoint diversity across configured source clusters"
    }

    fn rank(
        &self,
        posts: &[Post],
        authors: &AuthorDirectory,
        context: &ViewerContext,
        now: DateTime<Utc>,
    ) -> RankingResult {
        let penalty = context
            .preferences
            .diversity_penalty
            .unwrap_or(self.diversity_penalty);

        let mut remaining: Vec<Candidate> = posts
            .iter()
            .enumerate()
            .map(|(index, post)| {
                let author = authors.get(&post.author_id);
                let recency = scoring::recency(post.created_at, now);
                let follow_edge = scoring::follow_edge(
                    context.user_id.as_deref(),
                    &context.followed_authors,
                    &post.author_id,
                );
                let reputation = author.reputation_score;

                Candidate {
                    index,
                    post_id: post.id.clone(),
                    cluster: self.provider.cluster(&author),
                    base_score: recency * 0.3 + follow_edge * 0.2 + reputation * 0.2,
                    recency,
                    follow_edge,
                    reputation,
                }
            })
            .collect();

        let mut cluster_counts: HashMap<String, usize> = HashMap::new();
        let mut ordered_ids = Vec::with_capacity(posts.len());
        // Records keyed by input index so they can be emitted in input order.
        let mut records: Vec<Option<transparency::TransparencyRecord>> =
            (0..posts.len()).map(|_| None).collect();

        while !remaining.is_empty() {
            let mut best = 0;
            let mut best_score = f32::MIN;
            for (i, candidate) in remaining.iter().enumerate() {
                let picked = *cluster_counts.get(&candidate.cluster).unwrap_or(&0);
                let adjusted = candidate.base_score - penalty * picked as f32;
                // Strictly greater: ties resolve to the earliest input index,
                // since `remaining` stays in input order.
                if adjusted > best_score {
                    best_score = adjusted;
                    best = i;
                }
            }

            let candidate = remaining.remove(best);
            let picked_before = *cluster_counts.get(&candidate.cluster).unwrap_or(&0);
            let applied_penalty = penalty * picked_before as f32;

            let mut explanation = Vec::new();
            if candidate.recency > 0.7 {
                explanation.push("Recent post".to_string());
            }
            if candidate.follow_edge > 0.7 {
                explanation.push("Followed author".to_string());
            }
            if candidate.reputation > 0.7 {
                explanation.push("High reputation author".to_string());
            }
            if picked_before == 0 {
                explanation.push("Boosted for viewpoint diversity".to_string());
            }

            records[candidate.index] = Some(
                transparency::TransparencyRecord::new(&candidate.post_id, self.id(), best_score)
                    .with_feature("recency", candidate.recency)
                    .with_feature("follow_edge", candidate.follow_edge)
                    .with_feature("author_reputation", candidate.reputation)
                    .with_feature("author_cluster", candidate.cluster.as_str())
                    .with_feature("base_score", candidate.base_score)
                    .with_feature("diversity_penalty", applied_penalty)
                    .with_explanation(explanation),
            );

            *cluster_counts.entry(candidate.cluster).or_insert(0) += 1;
            ordered_ids.push(candidate.post_id);
        }

        debug!(
            bundle_id = self.id(),
            post_count = posts.len(),
            cluster_count = cluster_counts.len(),
            "greedy diversity pass complete"
        );

        RankingResult {
            ordered_ids,
            records: records.into_iter().flatten().collect(),
            boost_records: Vec::new(),
        }
    }
}
