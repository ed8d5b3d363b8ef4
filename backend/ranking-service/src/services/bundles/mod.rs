//! Ranking bundles: named strategies that order a post set for a viewer and
//! explain every score with a transparency record.
//!
//! Contract for every bundle:
//! - `ordered_ids` is a permutation of the input post ids;
//! - one transparency record per post, emitted in input order;
//! - sort is by descending score with a stable tie-break on input order
//!   (floating-point ties are expected, never broken randomly).

pub mod diversity_dissent;
pub mod locality_first;
pub mod multipolar_diversity;
pub mod recency_follow;

pub use diversity_dissent::DiversityDissentBundle;
pub use locality_first::LocalityFirstBundle;
pub use multipolar_diversity::MultipolarDiversityBundle;
pub use recency_follow::RecencyFollowBundle;

use crate::error::{RankingError, Result};
use crate::models::{AuthorDirectory, Post, RankingResult, ViewerContext};
use crate::services::viewpoints::AuthorViewpointProvider;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

/// A named ranking strategy.
///
/// `now` is an explicit argument so a pass is a pure function of its inputs;
/// two calls with identical posts, context, and clock produce identical
/// orderings and identical records.
pub trait RankingBundle: Send + Sync {
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn rank(
        &self,
        posts: &[Post],
        authors: &AuthorDirectory,
        context: &ViewerContext,
        now: DateTime<Utc>,
    ) -> RankingResult;
}

impl std::fmt::Debug for dyn RankingBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RankingBundle").field("id", &self.id()).finish()
    }
}

/// Sort scored ids best-first. `sort_by` is stable, so equal scores keep
/// their input order; NaN compares as equal rather than poisoning the sort.
pub(crate) fn order_descending(scored: &mut [(String, f32)]) {
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Maps bundle ids to implementations. Built explicitly at startup and passed
/// by reference so tests can construct isolated registries; adding a bundle is
/// a registration call, never a caller change.
pub struct BundleRegistry {
    bundles: HashMap<String, Arc<dyn RankingBundle>>,
}

impl BundleRegistry {
    pub fn new() -> Self {
        Self {
            bundles: HashMap::new(),
        }
    }

    /// Registry with the four built-in bundles.
    pub fn with_defaults(provider: Arc<dyn AuthorViewpointProvider>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(RecencyFollowBundle::new()));
        registry.register(Arc::new(LocalityFirstBundle::new()));
        registry.register(Arc::new(MultipolarDiversityBundle::new(provider.clone())));
        registry.register(Arc::new(DiversityDissentBundle::new(provider)));
        registry
    }

    pub fn register(&mut self, bundle: Arc<dyn RankingBundle>) {
        self.bundles.insert(bundle.id().to_string(), bundle);
    }

    pub fn resolve(&self, bundle_id: &str) -> Result<Arc<dyn RankingBundle>> {
        self.bundles
            .get(bundle_id)
            .cloned()
            .ok_or_else(|| RankingError::UnknownBundle(bundle_id.to_string()))
    }

    /// All registered bundles, sorted by id for stable discovery output.
    pub fn list_all(&self) -> Vec<Arc<dyn RankingBundle>> {
        let mut bundles: Vec<_> = self.bundles.values().cloned().collect();
        bundles.sort_by(|a, b| a.id().cmp(b.id()));
        bundles
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}

impl Default for BundleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::viewpoints::TagViewpointProvider;

    #[test]
    fn default_registry_has_four_bundles() {
        let registry = BundleRegistry::with_defaults(Arc::new(TagViewpointProvider));

        assert_eq!(registry.len(), 4);
        let ids: Vec<_> = registry.list_all().iter().map(|b| b.id().to_string()).collect();
        assert_eq!(
            ids,
            vec![
                "diversity_dissent",
                "locality_first",
                "multipolar_diversity",
                "recency_follow"
            ]
        );
    }

    #[test]
    fn resolve_unknown_bundle_fails() {
        let registry = BundleRegistry::with_defaults(Arc::new(TagViewpointProvider));

        let err = registry.resolve("chronological").unwrap_err();
        assert!(matches!(err, RankingError::UnknownBundle(id) if id == "chronological"));
    }

    #[test]
    fn order_descending_is_stable_on_ties() {
        let mut scored = vec![
            ("a".to_string(), 0.5),
            ("b".to_string(), 0.9),
            ("c".to_string(), 0.5),
        ];
        order_descending(&mut scored);

        let ids: Vec<_> = scored.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }
}
