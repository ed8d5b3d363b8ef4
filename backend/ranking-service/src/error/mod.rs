use thiserror::Error;

#[derive(Debug, Error)]
pub enum RankingError {
    #[error("Unknown ranking bundle: {0}")]
    UnknownBundle(String),

    #[error("Campaign not found: {0}")]
    CampaignNotFound(String),

    #[error("Invalid campaign state transition: {from} -> {to}")]
    InvalidCampaignState { from: String, to: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Transparency(#[from] transparency::TransparencyError),
}

pub type Result<T> = std::result::Result<T, RankingError>;
