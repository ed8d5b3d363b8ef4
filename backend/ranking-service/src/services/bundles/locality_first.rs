use super::{order_descending, RankingBundle};
use crate::models::{AuthorDirectory, Post, RankingResult, ViewerContext};
use crate::services::scoring;
use chrono::{DateTime, Utc};
use tracing::debug;

/// Locality First: content from authors in the viewer's preferred locales,
/// with recency and reputation as secondary terms.
pub struct LocalityFirstBundle {
    locality_weight: f32,
    partial_locale_score: f32,
}

impl LocalityFirstBundle {
    pub fn new() -> Self {
        Self {
            locality_weight: 0.6,
            partial_locale_score: 0.2,
        }
    }
}

impl Default for LocalityFirstBundle {
    fn default() -> Self {
        Self::new()
    }
}

impl RankingBundle for LocalityFirstBundle {
    fn id(&self) -> &str {
        "locality_first"
    }

    fn name(&self) -> &str {
        "Locality First"
    }

    fn description(&self) -> &str {
        "Prioritizes content from users in your selected locales"
    }

    fn rank(
        &self,
        posts: &[Post],
        authors: &AuthorDirectory,
        context: &ViewerContext,
        now: DateTime<Utc>,
    ) -> RankingResult {
        let prefs = &context.preferences;
        let locality_weight = prefs.locality_weight.unwrap_or(self.locality_weight);
        let partial_score = prefs
            .partial_locale_score
            .unwrap_or(self.partial_locale_score);
        // Preferred locales fall back to the viewer's own language.
        let preferred: Vec<String> = prefs
            .preferred_locales
            .clone()
            .or_else(|| context.language.clone().map(|l| vec![l]))
            .unwrap_or_default();

        let mut scored = Vec::with_capacity(posts.len());
        let mut records = Vec::with_capacity(posts.len());

        for post in posts {
            let author = authors.get(&post.author_id);

            let recency = scoring::recency(post.created_at, now);
            let follow_edge = scoring::follow_edge(
                context.user_id.as_deref(),
                &context.followed_authors,
                &post.author_id,
            );
            let reputation = author.reputation_score;
            let locality = scoring::locality_match(author.locale.as_deref(), &preferred, partial_score);

            let locality_component = locality * locality_weight;
            let score =
                recency * 0.2 + follow_edge * 0.2 + reputation * 0.2 + locality_component;

            let mut explanation = Vec::new();
            if recency > 0.7 {
                explanation.push("Recent post".to_string());
            }
            if follow_edge > 0.7 {
                explanation.push("Followed author".to_string());
            }
            if reputation > 0.7 {
                explanation.push("High reputation author".to_string());
            }
            if locality > 0.8 {
                if let Some(locale) = &author.locale {
                    explanation.push(format!("Locale match: {}", locale));
                }
            }
            if locality_component > 0.3 {
                explanation.push("Boosted for locality preference".to_string());
            }

            let mut record = transparency::TransparencyRecord::new(&post.id, self.id(), score)
                .with_feature("recency", recency)
                .with_feature("follow_edge", follow_edge)
                .with_feature("author_reputation", reputation)
                .with_feature("locality_match", locality)
                .with_explanation(explanation);
            if let Some(locale) = &author.locale {
                record = record.with_feature("author_locale", locale.as_str());
            }
            records.push(record);

            scored.push((post.id.clone(), score));
        }

        order_descending(&mut scored);
        debug!(
            bundle_id = self.id(),
            post_count = posts.len(),
            preferred_locales = preferred.len(),
            "ranking pass scored"
        );

        RankingResult {
            ordered_ids: scored.into_iter().map(|(id, _)| id).collect(),
            records,
            boost_records: Vec::new(),
        }
    }
}
