use super::BoostEngine;
use crate::models::{AuthorDirectory, Post, RankingResult, ViewerContext};
use crate::services::bundles::RankingBundle;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Wraps any ranking bundle and re-scores its output through the boost
/// engine.
///
/// Base scores are derived from rank position (`1 - position/total`) since
/// bundles expose an ordering, not raw scores. That makes this a lossy
/// one-shot post-process: chaining two adapters re-derives positions and is
/// not idempotent, so it is never nested.
///
/// With no matching campaigns the output is identical to the wrapped
/// bundle's.
pub struct BoostEnhancedBundle {
    inner: Arc<dyn RankingBundle>,
    engine: Arc<BoostEngine>,
    id: String,
    name: String,
    description: String,
}

impl BoostEnhancedBundle {
    pub fn new(inner: Arc<dyn RankingBundle>, engine: Arc<BoostEngine>) -> Self {
        let id = format!("{}_boosted", inner.id());
        let name = format!("{} (Boost Enhanced)", inner.name());
        let description = format!(
            "{} with paid distribution transparency",
            inner.description()
        );
        Self {
            inner,
            engine,
            id,
            name,
            description,
        }
    }
}

impl RankingBundle for BoostEnhancedBundle {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn rank(
        &self,
        posts: &[Post],
        authors: &AuthorDirectory,
        context: &ViewerContext,
        now: DateTime<Utc>,
    ) -> RankingResult {
        let base = self.inner.rank(posts, authors, context, now);
        let total = base.ordered_ids.len();
        if total == 0 {
            return base;
        }

        let mut boost_records = base.boost_records;
        let mut scored = Vec::with_capacity(total);

        // Iterate in base order so the stable re-sort ties break toward the
        // wrapped bundle's ordering.
        for (position, post_id) in base.ordered_ids.iter().enumerate() {
            let base_score = 1.0 - position as f32 / total as f32;
            let outcome =
                self.engine
                    .apply_boost(post_id, base_score, self.inner.id(), context, now);
            if let Some(record) = outcome.record {
                boost_records.push(record);
            }
            scored.push((post_id.clone(), outcome.final_score));
        }

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let boosted_ids: HashSet<&str> = boost_records
            .iter()
            .map(|r| r.content_id.as_str())
            .collect();
        let records = base
            .records
            .into_iter()
            .map(|mut record| {
                record.is_boosted = boosted_ids.contains(record.subject_id.as_str());
                record
            })
            .collect();

        debug!(
            bundle_id = %self.id,
            post_count = total,
            boosted_count = boosted_ids.len(),
            "boost-enhanced pass complete"
        );

        RankingResult {
            ordered_ids: scored.into_iter().map(|(id, _)| id).collect(),
            records,
            boost_records,
        }
    }
}
