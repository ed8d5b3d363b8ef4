use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// A single named feature value inside a transparency record.
///
/// Numeric features are normalized to [0,1] unless the feature name says
/// otherwise (e.g. `content_length`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f32),
    Flag(bool),
    Text(String),
    List(Vec<String>),
}

impl From<f32> for FeatureValue {
    fn from(value: f32) -> Self {
        FeatureValue::Number(value)
    }
}

impl From<bool> for FeatureValue {
    fn from(value: bool) -> Self {
        FeatureValue::Flag(value)
    }
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        FeatureValue::Text(value.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(value: String) -> Self {
        FeatureValue::Text(value)
    }
}

impl From<Vec<String>> for FeatureValue {
    fn from(value: Vec<String>) -> Self {
        FeatureValue::List(value)
    }
}

/// Signed, replayable explanation of a scoring or moderation decision.
///
/// One record is emitted per subject per pass. Everything except `signed_at`
/// and `signature` is a pure function of the pass inputs: the same posts,
/// viewer context, and campaign state reproduce the same features, score, and
/// explanation. Features use a `BTreeMap` so the canonical signing payload has
/// a stable key order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransparencyRecord {
    /// Post or content ID the record explains.
    pub subject_id: String,
    /// Bundle (or moderation rule set) that produced the decision.
    pub bundle_id: String,
    pub features: BTreeMap<String, FeatureValue>,
    pub score: f32,
    /// Ordered, threshold-gated phrases. Never free text.
    pub explanation: Vec<String>,
    /// Set by the boost-enhanced adapter when a paid campaign touched this
    /// subject in the same pass.
    #[serde(default)]
    pub is_boosted: bool,
    pub signed_at: DateTime<Utc>,
    /// Opaque signature from the external signing collaborator. Empty until
    /// sealed, or after a signing failure (logged by the caller).
    pub signature: String,
}

impl TransparencyRecord {
    pub fn new(subject_id: impl Into<String>, bundle_id: impl Into<String>, score: f32) -> Self {
        Self {
            subject_id: subject_id.into(),
            bundle_id: bundle_id.into(),
            features: BTreeMap::new(),
            score,
            explanation: Vec::new(),
            is_boosted: false,
            signed_at: Utc::now(),
            signature: String::new(),
        }
    }

    pub fn with_feature(mut self, name: &str, value: impl Into<FeatureValue>) -> Self {
        self.features.insert(name.to_string(), value.into());
        self
    }

    pub fn with_explanation(mut self, explanation: Vec<String>) -> Self {
        self.explanation = explanation;
        self
    }

    /// Canonical signing payload: everything that is a pure function of the
    /// pass inputs. `signed_at`/`signature` are excluded so re-signing an
    /// identical decision yields an identical payload.
    pub fn canonical_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "subject_id": self.subject_id,
            "bundle_id": self.bundle_id,
            "features": self.features,
            "score": self.score,
            "explanation": self.explanation,
            "is_boosted": self.is_boosted,
        })
    }

    pub fn canonical_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.canonical_payload())?)
    }
}

#[derive(Debug, Error)]
pub enum TransparencyError {
    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Transparency sink append failed: {0}")]
    Sink(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TransparencyError>;

/// External signing collaborator. The engine never implements cryptography
/// itself; it hands a canonical serialization to this pair of functions.
#[async_trait]
pub trait Signer: Send + Sync {
    async fn sign(&self, payload: &[u8]) -> Result<String>;

    async fn verify(&self, payload: &[u8], signature: &str) -> Result<bool>;
}

/// Placeholder signer for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct NoopSigner;

const NOOP_SIGNATURE: &str = "unsigned";

#[async_trait]
impl Signer for NoopSigner {
    async fn sign(&self, _payload: &[u8]) -> Result<String> {
        Ok(NOOP_SIGNATURE.to_string())
    }

    async fn verify(&self, _payload: &[u8], signature: &str) -> Result<bool> {
        Ok(signature == NOOP_SIGNATURE)
    }
}

/// Append-only transparency record sink (the audit write path).
#[async_trait]
pub trait TransparencySink: Send + Sync {
    async fn append(&self, record: &TransparencyRecord) -> Result<()>;
}

/// In-process sink backed by a Vec. Used in tests and as the default when no
/// external store is wired in.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: tokio::sync::Mutex<Vec<TransparencyRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<TransparencyRecord> {
        self.records.lock().await.clone()
    }

    pub async fn for_subject(&self, subject_id: &str) -> Vec<TransparencyRecord> {
        self.records
            .lock()
            .await
            .iter()
            .filter(|r| r.subject_id == subject_id)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl TransparencySink for MemorySink {
    async fn append(&self, record: &TransparencyRecord) -> Result<()> {
        self.records.lock().await.push(record.clone());
        Ok(())
    }
}

/// Sign a record's canonical payload and stamp `signed_at`/`signature`.
pub async fn seal(record: &mut TransparencyRecord, signer: &dyn Signer) -> Result<()> {
    let payload = record.canonical_bytes()?;
    let signature = signer.sign(&payload).await?;
    record.signed_at = Utc::now();
    record.signature = signature;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> TransparencyRecord {
        TransparencyRecord::new("post-1", "recency_follow", 0.73)
            .with_feature("recency", 0.9_f32)
            .with_feature("author_reputation", 0.5_f32)
            .with_explanation(vec!["Recent post".to_string()])
    }

    #[test]
    fn canonical_payload_is_deterministic() {
        let a = sample_record().canonical_bytes().unwrap();
        let b = sample_record().canonical_bytes().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn canonical_payload_ignores_signature() {
        let unsigned = sample_record();
        let mut signed = sample_record();
        signed.signature = "sig".to_string();
        assert_eq!(
            unsigned.canonical_bytes().unwrap(),
            signed.canonical_bytes().unwrap()
        );
    }

    #[tokio::test]
    async fn seal_signs_and_verifies() {
        let signer = NoopSigner;
        let mut record = sample_record();
        assert!(record.signature.is_empty());

        seal(&mut record, &signer).await.unwrap();

        assert!(!record.signature.is_empty());
        let payload = record.canonical_bytes().unwrap();
        assert!(signer.verify(&payload, &record.signature).await.unwrap());
    }

    #[tokio::test]
    async fn memory_sink_appends_and_filters() {
        let sink = MemorySink::new();
        sink.append(&sample_record()).await.unwrap();

        let mut other = sample_record();
        other.subject_id = "post-2".to_string();
        sink.append(&other).await.unwrap();

        assert_eq!(sink.len().await, 2);
        assert_eq!(sink.for_subject("post-1").await.len(), 1);
    }
}
