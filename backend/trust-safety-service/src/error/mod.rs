use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrustSafetyError {
    #[error("Invalid rule pattern '{rule_id}': {source}")]
    RulePattern {
        rule_id: String,
        #[source]
        source: regex::Error,
    },

    #[error("Transparency error: {0}")]
    Transparency(#[from] transparency::TransparencyError),
}

pub type Result<T> = std::result::Result<T, TrustSafetyError>;
