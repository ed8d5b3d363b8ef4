use super::{order_descending, RankingBundle};
use crate::models::{AuthorDirectory, Post, RankingResult, ViewerContext};
use crate::services::scoring;
use crate::services::viewpoints::AuthorViewpointProvider;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

/// Diversity & Dissent: surfaces alternative perspectives and contested
/// discussions ahead of the engagement mainstream.
pub struct DiversityDissentBundle {
    provider: Arc<dyn AuthorViewpointProvider>,
    dissent_weight: f32,
    diversity_weight: f32,
    controversy_threshold: f32,
}

/// Placeholder until an independence classifier exists; recorded as a feature
/// so the record shape stays stable when one lands.
const AUTHOR_INDEPENDENCE: f32 = 0.5;

impl DiversityDissentBundle {
    pub fn new(provider: Arc<dyn AuthorViewpointProvider>) -> Self {
        Self {
            provider,
            dissent_weight: 0.4,
            diversity_weight: 0.3,
            controversy_threshold: 0.6,
        }
    }
}

impl RankingBundle for DiversityDissentBundle {
    fn id(&self) -> &str {
        "diversity_dissent"
    }

    fn name(&self) -> &str {
        "Diversity & Dissent"
    }

    fn description(&self) -> &str {
        "Prioritizes diverse viewpoints and dissenting opinions"
    }

    fn rank(
        &self,
        posts: &[Post],
        authors: &AuthorDirectory,
        context: &ViewerContext,
        now: DateTime<Utc>,
    ) -> RankingResult {
        let prefs = &context.preferences;
        let dissent_weight = prefs.dissent_weight.unwrap_or(self.dissent_weight);
        let diversity_weight = prefs.diversity_weight.unwrap_or(self.diversity_weight);
        // Gates the "Controversial discussion" phrase only, never the score.
        let controversy_threshold = prefs
            .controversy_threshold
            .unwrap_or(self.controversy_threshold);

        let mut scored = Vec::with_capacity(posts.len());
        let mut records = Vec::with_capacity(posts.len());

        for post in posts {
            let author = authors.get(&post.author_id);
            let viewpoints = self.provider.viewpoints(&author);

            let recency = scoring::recency(post.created_at, now);
            let reputation = author.reputation_score;
            let dissent = scoring::dissent_score(&post.content, &viewpoints);
            let controversy = scoring::controversy_level(post.likes, post.dislikes, post.replies);
            let diversity = scoring::viewpoint_diversity(&viewpoints);
            let polarization = scoring::engagement_polarization(post.likes, post.dislikes);

            let base = recency * 0.2 + reputation * 0.2;
            let boost = dissent * dissent_weight
                + controversy * 0.2
                + diversity * diversity_weight;
            let score = base + boost;

            let mut explanation = Vec::new();
            if recency > 0.7 {
                explanation.push("Recent post".to_string());
            }
            if reputation > 0.7 {
                explanation.push("Credible author".to_string());
            }
            if dissent > 0.7 {
                explanation.push("Alternative perspective".to_string());
            } else if dissent > 0.5 {
                explanation.push("Diverse viewpoint".to_string());
            }
            if controversy > controversy_threshold {
                explanation.push("Controversial discussion".to_string());
            }
            if diversity > 0.6 {
                explanation.push("Multiple perspective coverage".to_string());
            }
            records.push(
                transparency::TransparencyRecord::new(&post.id, self.id(), score)
                    .with_feature("recency", recency)
                    .with_feature("author_reputation", reputation)
                    .with_feature("dissent_score", dissent)
                    .with_feature("controversy_level", controversy)
                    .with_feature("viewpoint_diversity", diversity)
                    .with_feature("author_independence", AUTHOR_INDEPENDENCE)
                    .with_feature("engagement_polarization", polarization)
                    .with_explanation(explanation),
            );

            scored.push((post.id.clone(), score));
        }

        order_descending(&mut scored);
        debug!(
            bundle_id = self.id(),
            post_count = posts.len(),
            "ranking pass scored"
        );

        RankingResult {
            ordered_ids: scored.into_iter().map(|(id, _)| id).collect(),
            records,
            boost_records: Vec::new(),
        }
    }
}
