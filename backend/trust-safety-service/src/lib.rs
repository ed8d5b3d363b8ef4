pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{Result, TrustSafetyError};
pub use models::{Decision, ModerationDecision, ModerationLabel, RuleAction, Severity};
pub use services::{baseline_rules, exception_patterns, ModerationService, RuleEngine, RuleSpec};
