pub mod boost;
pub mod bundles;
pub mod engine;
pub mod scoring;
pub mod viewpoints;

pub use boost::{BoostEngine, BoostEnhancedBundle};
pub use bundles::{BundleRegistry, RankingBundle};
pub use engine::RankingEngine;
pub use viewpoints::{AuthorViewpointProvider, TagViewpointProvider};
