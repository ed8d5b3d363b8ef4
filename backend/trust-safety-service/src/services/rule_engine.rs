use crate::error::TrustSafetyError;
use crate::models::{Decision, ModerationDecision, ModerationLabel, RuleAction, Severity};
use regex::Regex;
use tracing::{debug, warn};
use transparency::TransparencyRecord;

/// Confidence attached to every pattern-based label. Regex rules are
/// deterministic, so a single fixed value is reported rather than a
/// per-rule estimate.
pub const RULE_CONFIDENCE: f32 = 0.85;

/// How many characters of surrounding context to keep around a match.
const DEFAULT_EXCERPT_CONTEXT: usize = 40;

/// Declarative source form of a moderation rule.
pub struct RuleSpec {
    pub id: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub action: RuleAction,
    pub pattern: &'static str,
    /// Patterns that suppress this rule only. Global exceptions are handled
    /// separately by the engine.
    pub exceptions: &'static [&'static str],
}

#[derive(Debug)]
struct CompiledRule {
    id: String,
    category: String,
    severity: Severity,
    action: RuleAction,
    pattern: Regex,
    exceptions: Vec<Regex>,
}

/// Baseline rule set covering doxxing, violent threats, targeted
/// harassment, inauthentic behavior and non-consensual content.
pub fn baseline_rules() -> Vec<RuleSpec> {
    vec![
        RuleSpec {
            id: "doxxing-1",
            category: "doxxing",
            severity: Severity::High,
            action: RuleAction::Remove,
            pattern: r"\b\d{3}-\d{2}-\d{4}\b|\b\d{9}\b",
            exceptions: &[],
        },
        RuleSpec {
            id: "doxxing-2",
            category: "doxxing",
            severity: Severity::Medium,
            action: RuleAction::Flag,
            pattern: r"\b\d{3}\.\d{3}\.\d{4}\b",
            exceptions: &[],
        },
        RuleSpec {
            id: "violence-1",
            category: "violence",
            severity: Severity::High,
            action: RuleAction::Remove,
            pattern: r"(?i)(kill|murder|harm|attack)\s+(\w+\s+){0,3}(yourself|them|us|you|me|everyone)",
            exceptions: &[],
        },
        RuleSpec {
            id: "violence-2",
            category: "violence",
            severity: Severity::High,
            action: RuleAction::Remove,
            pattern: r"(?i)(should be shot|deserves to die|needs to be hurt)",
            exceptions: &[r"(?i)news.*report"],
        },
        RuleSpec {
            id: "harassment-1",
            category: "harassment",
            severity: Severity::Medium,
            action: RuleAction::Flag,
            pattern: r"(?i)(ugly|stupid|worthless)\s+(\w+\s+){0,2}(woman|man|person|girl|boy)",
            exceptions: &[],
        },
        RuleSpec {
            id: "harassment-2",
            category: "harassment",
            severity: Severity::Medium,
            action: RuleAction::Flag,
            pattern: r"(?i)(nobody likes you|everyone hates you|you should leave)",
            exceptions: &[],
        },
        RuleSpec {
            id: "inauthentic-1",
            category: "inauthentic_behavior",
            severity: Severity::Medium,
            action: RuleAction::Quarantine,
            pattern: r"(?i)(bot|fake account|paid poster)",
            exceptions: &[],
        },
        RuleSpec {
            id: "nsfw-1",
            category: "non_consensual_content",
            severity: Severity::High,
            action: RuleAction::Remove,
            pattern: r"(?i)(nude|explicit|intimate).*(without consent|leaked)",
            exceptions: &[],
        },
    ]
}

/// Global exception patterns. A match on any of these allows the content
/// outright before rules run: warnings, reporting and education about
/// abusive content are not themselves abuse.
pub fn exception_patterns() -> Vec<&'static str> {
    vec![
        r"(?i)warning.*nsfw",
        r"(?i)discussing.*harassment",
        r"(?i)educational.*content",
        r"(?i)news.*report",
    ]
}

/// Pattern-based moderation engine. Rules are compiled once at
/// construction; malformed patterns are skipped rather than failing the
/// whole rule set.
#[derive(Debug)]
pub struct RuleEngine {
    rules: Vec<CompiledRule>,
    exceptions: Vec<Regex>,
    excerpt_context: usize,
}

impl RuleEngine {
    pub fn new(specs: Vec<RuleSpec>, exception_sources: Vec<&str>) -> Self {
        let mut rules = Vec::with_capacity(specs.len());
        for spec in specs {
            let pattern = match Regex::new(spec.pattern) {
                Ok(re) => re,
                Err(e) => {
                    warn!(rule_id = spec.id, error = %e, "skipping rule with invalid pattern");
                    continue;
                }
            };
            let exceptions = spec
                .exceptions
                .iter()
                .filter_map(|src| match Regex::new(src) {
                    Ok(re) => Some(re),
                    Err(e) => {
                        warn!(rule_id = spec.id, error = %e, "skipping invalid rule exception");
                        None
                    }
                })
                .collect();
            rules.push(CompiledRule {
                id: spec.id.to_string(),
                category: spec.category.to_string(),
                severity: spec.severity,
                action: spec.action,
                pattern,
                exceptions,
            });
        }

        let exceptions = exception_sources
            .into_iter()
            .filter_map(|src| match Regex::new(src) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!(pattern = src, error = %e, "skipping invalid exception pattern");
                    None
                }
            })
            .collect();

        Self {
            rules,
            exceptions,
            excerpt_context: DEFAULT_EXCERPT_CONTEXT,
        }
    }

    /// Strict variant for statically known rule sets: any invalid pattern is
    /// an error instead of a skip.
    pub fn try_new(
        specs: Vec<RuleSpec>,
        exception_sources: Vec<&str>,
    ) -> crate::error::Result<Self> {
        for spec in &specs {
            for pattern in std::iter::once(&spec.pattern).chain(spec.exceptions.iter()) {
                Regex::new(pattern).map_err(|source| TrustSafetyError::RulePattern {
                    rule_id: spec.id.to_string(),
                    source,
                })?;
            }
        }
        Ok(Self::new(specs, exception_sources))
    }

    pub fn with_baseline() -> Self {
        Self::new(baseline_rules(), exception_patterns())
    }

    pub fn with_excerpt_context(mut self, chars: usize) -> Self {
        self.excerpt_context = chars;
        self
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Evaluate one piece of content. Returns the decision together with
    /// the unsigned audit record describing it; callers seal and persist
    /// the record.
    pub fn evaluate(
        &self,
        subject_id: &str,
        author_id: &str,
        text: &str,
    ) -> (ModerationDecision, TransparencyRecord) {
        if let Some(exception) = self.exceptions.iter().find(|re| re.is_match(text)) {
            debug!(subject_id, pattern = exception.as_str(), "exception pattern matched");
            let mut decision = ModerationDecision::allow(subject_id, author_id);
            decision.rationale = "Exception pattern matched, content allowed".to_string();
            let record = self.build_record(&decision, true);
            return (decision, record);
        }

        let mut labels = Vec::new();
        let mut verdict = Decision::Allow;

        for rule in &self.rules {
            let m = match rule.pattern.find(text) {
                Some(m) => m,
                None => continue,
            };
            if rule.exceptions.iter().any(|re| re.is_match(text)) {
                debug!(subject_id, rule_id = %rule.id, "rule suppressed by its exception");
                continue;
            }

            labels.push(ModerationLabel {
                category: rule.category.clone(),
                confidence: RULE_CONFIDENCE,
                evidence: self.excerpt(text, m.start(), m.end()),
                severity: rule.severity,
                rule_id: rule.id.clone(),
            });
            verdict = escalate(verdict, rule.severity, rule.action);
        }

        let mut decision = ModerationDecision::allow(subject_id, author_id);
        decision.decision = verdict;
        decision.rationale = if labels.is_empty() {
            "No rules matched".to_string()
        } else {
            let rule_ids: Vec<&str> = labels.iter().map(|l| l.rule_id.as_str()).collect();
            format!("Matched rules: {}", rule_ids.join(", "))
        };
        decision.labels = labels;

        let record = self.build_record(&decision, false);
        (decision, record)
    }

    fn excerpt(&self, text: &str, start: usize, end: usize) -> String {
        let from = text[..start]
            .char_indices()
            .rev()
            .nth(self.excerpt_context.saturating_sub(1))
            .map(|(i, _)| i)
            .unwrap_or(0);
        let to = text[end..]
            .char_indices()
            .nth(self.excerpt_context)
            .map(|(i, _)| end + i)
            .unwrap_or(text.len());
        text[from..to].to_string()
    }

    fn build_record(
        &self,
        decision: &ModerationDecision,
        exception_applied: bool,
    ) -> TransparencyRecord {
        let highest = decision
            .labels
            .iter()
            .map(|l| l.severity)
            .max();
        let score = match highest {
            Some(Severity::High) => 1.0,
            Some(Severity::Medium) => 0.6,
            Some(Severity::Low) => 0.3,
            None => 0.0,
        };
        let rule_ids: Vec<String> = decision.labels.iter().map(|l| l.rule_id.clone()).collect();

        let mut record = TransparencyRecord::new(&decision.subject_id, "moderation", score)
            .with_feature("decision", decision.decision.as_str().to_string())
            .with_feature("author", decision.author_id.clone())
            .with_feature("labels_count", decision.labels.len() as f32)
            .with_feature("exception_applied", exception_applied)
            .with_feature("rule_ids", rule_ids)
            .with_explanation(vec![decision.rationale.clone()]);
        if let Some(severity) = highest {
            record = record.with_feature("highest_severity", severity.as_str().to_string());
        }
        record
    }
}

/// Combine the running verdict with a newly matched rule. High severity
/// always escalates unless the content is already removed; medium severity
/// only moves content out of Allow.
fn escalate(current: Decision, severity: Severity, action: RuleAction) -> Decision {
    let proposed = match action {
        RuleAction::Flag => Decision::Flag,
        RuleAction::Remove => Decision::Remove,
        RuleAction::Quarantine => Decision::Quarantine,
    };
    match severity {
        Severity::High => {
            if current == Decision::Remove {
                current
            } else {
                proposed
            }
        }
        Severity::Medium | Severity::Low => {
            if current == Decision::Allow {
                proposed
            } else {
                current
            }
        }
    }
}
