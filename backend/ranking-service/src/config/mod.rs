use crate::models::Preferences;
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub weights: WeightsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub service_name: String,
}

/// Process-level default weights, applied when a viewer supplies no
/// preference overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    pub dissent_weight: f32,
    pub diversity_weight: f32,
    pub controversy_threshold: f32,
    pub diversity_penalty: f32,
    pub locality_weight: f32,
    pub partial_locale_score: f32,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Config {
            service: ServiceConfig {
                service_name: env::var("SERVICE_NAME")
                    .unwrap_or_else(|_| "ranking-service".to_string()),
            },
            weights: WeightsConfig {
                dissent_weight: env_f32("DISSENT_WEIGHT", 0.4),
                diversity_weight: env_f32("DIVERSITY_WEIGHT", 0.3),
                controversy_threshold: env_f32("CONTROVERSY_THRESHOLD", 0.6),
                diversity_penalty: env_f32("DIVERSITY_PENALTY", 0.15),
                locality_weight: env_f32("LOCALITY_WEIGHT", 0.6),
                partial_locale_score: env_f32("PARTIAL_LOCALE_SCORE", 0.2),
            },
        }
    }
}

impl WeightsConfig {
    /// Viewer preferences seeded from the process defaults.
    pub fn as_preferences(&self) -> Preferences {
        Preferences {
            dissent_weight: Some(self.dissent_weight),
            diversity_weight: Some(self.diversity_weight),
            controversy_threshold: Some(self.controversy_threshold),
            diversity_penalty: Some(self.diversity_penalty),
            locality_weight: Some(self.locality_weight),
            partial_locale_score: Some(self.partial_locale_score),
            ..Default::default()
        }
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
