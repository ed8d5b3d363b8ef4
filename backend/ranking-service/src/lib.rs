pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{RankingError, Result};
pub use models::{Author, AuthorDirectory, Post, Preferences, RankingResult, ViewerContext};
pub use services::boost::{
    BoostCampaign, BoostEngine, BoostEnhancedBundle, BoostOutcome, BoostTargeting,
    BoostTransparencyRecord, CampaignStatus, PacingStatus,
};
pub use services::bundles::{
    BundleRegistry, DiversityDissentBundle, LocalityFirstBundle, MultipolarDiversityBundle,
    RankingBundle, RecencyFollowBundle,
};
pub use services::engine::RankingEngine;
pub use services::viewpoints::{AuthorViewpointProvider, TagViewpointProvider};
