use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a matched rule. The ordering matters: escalation picks the
/// highest severity across all matched rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

/// What a single rule asks for when its pattern matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    Flag,
    Remove,
    Quarantine,
}

/// Final verdict for a piece of content after all rules and escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Flag,
    Remove,
    Quarantine,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::Flag => "flag",
            Decision::Remove => "remove",
            Decision::Quarantine => "quarantine",
        }
    }
}

/// One matched rule, with the evidence excerpt that triggered it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationLabel {
    pub category: String,
    pub confidence: f32,
    pub evidence: String,
    pub severity: Severity,
    pub rule_id: String,
}

/// The full outcome of one moderation pass over a subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationDecision {
    pub subject_id: String,
    pub author_id: String,
    pub decision: Decision,
    pub labels: Vec<ModerationLabel>,
    pub rationale: String,
    pub reviewer: String,
    pub decided_at: DateTime<Utc>,
}

impl ModerationDecision {
    pub fn allow(subject_id: impl Into<String>, author_id: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            author_id: author_id.into(),
            decision: Decision::Allow,
            labels: Vec::new(),
            rationale: "No rules matched".to_string(),
            reviewer: "system".to_string(),
            decided_at: Utc::now(),
        }
    }
}
