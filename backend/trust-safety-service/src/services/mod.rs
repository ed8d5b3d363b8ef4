pub mod rule_engine;

pub use rule_engine::{baseline_rules, exception_patterns, RuleEngine, RuleSpec};

use crate::models::ModerationDecision;
use std::sync::Arc;
use tracing::{error, info};
use transparency::{seal, Signer, TransparencySink};

/// Async facade around the rule engine that seals and persists the audit
/// record for every decision. Signing or sink failures are logged and the
/// decision is still returned.
pub struct ModerationService {
    engine: RuleEngine,
    signer: Arc<dyn Signer>,
    sink: Arc<dyn TransparencySink>,
}

impl ModerationService {
    pub fn new(engine: RuleEngine, signer: Arc<dyn Signer>, sink: Arc<dyn TransparencySink>) -> Self {
        Self {
            engine,
            signer,
            sink,
        }
    }

    pub async fn moderate(
        &self,
        subject_id: &str,
        author_id: &str,
        text: &str,
    ) -> ModerationDecision {
        let (decision, mut record) = self.engine.evaluate(subject_id, author_id, text);

        if let Err(e) = seal(&mut record, self.signer.as_ref()).await {
            error!(subject_id, error = %e, "failed to sign moderation record");
        }
        if let Err(e) = self.sink.append(&record).await {
            error!(subject_id, error = %e, "failed to persist moderation record");
        }

        info!(
            subject_id,
            decision = decision.decision.as_str(),
            labels = decision.labels.len(),
            "moderation decision"
        );
        decision
    }
}
