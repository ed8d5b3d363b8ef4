use crate::error::Result;
use crate::models::{AuthorDirectory, Post, RankingResult, ViewerContext};
use crate::services::boost::{BoostEnhancedBundle, BoostEngine};
use crate::services::bundles::{BundleRegistry, RankingBundle};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info};
use transparency::{Signer, TransparencyRecord, TransparencySink};

/// Top-level ranking entry point: resolves a bundle, runs the pass, then
/// seals and persists the transparency trail.
///
/// The audit trail is auxiliary: a signing or sink failure is logged and the
/// ranking result is still returned. A pass never fails because its record
/// could not be persisted.
pub struct RankingEngine {
    registry: BundleRegistry,
    signer: Arc<dyn Signer>,
    sink: Arc<dyn TransparencySink>,
}

impl RankingEngine {
    pub fn new(
        registry: BundleRegistry,
        signer: Arc<dyn Signer>,
        sink: Arc<dyn TransparencySink>,
    ) -> Self {
        Self {
            registry,
            signer,
            sink,
        }
    }

    pub fn registry(&self) -> &BundleRegistry {
        &self.registry
    }

    /// Rank a post set with the named bundle.
    ///
    /// Fails only with `UnknownBundle`.
    pub async fn rank(
        &self,
        bundle_id: &str,
        posts: &[Post],
        authors: &AuthorDirectory,
        context: &ViewerContext,
    ) -> Result<RankingResult> {
        let bundle = self.registry.resolve(bundle_id)?;
        let mut result = bundle.rank(posts, authors, context, Utc::now());
        self.seal_all(&mut result.records).await;

        info!(
            bundle_id,
            post_count = posts.len(),
            "ranking pass complete"
        );
        Ok(result)
    }

    /// Rank with the named bundle, then re-score through the boost engine.
    pub async fn rank_boosted(
        &self,
        bundle_id: &str,
        posts: &[Post],
        authors: &AuthorDirectory,
        context: &ViewerContext,
        boost_engine: Arc<BoostEngine>,
    ) -> Result<RankingResult> {
        let inner = self.registry.resolve(bundle_id)?;
        let bundle = BoostEnhancedBundle::new(inner, boost_engine);
        let mut result = bundle.rank(posts, authors, context, Utc::now());
        self.seal_all(&mut result.records).await;

        info!(
            bundle_id,
            post_count = posts.len(),
            boost_count = result.boost_records.len(),
            "boosted ranking pass complete"
        );
        Ok(result)
    }

    async fn seal_all(&self, records: &mut [TransparencyRecord]) {
        for record in records.iter_mut() {
            if let Err(e) = transparency::seal(record, self.signer.as_ref()).await {
                error!(subject_id = %record.subject_id, "transparency signing failed: {}", e);
            }
            if let Err(e) = self.sink.append(record).await {
                error!(subject_id = %record.subject_id, "transparency sink append failed: {}", e);
            }
        }
    }
}
