use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub moderation: ModerationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModerationConfig {
    /// Characters of surrounding context kept around a match in evidence
    /// excerpts.
    pub excerpt_context: usize,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Config {
            service: ServiceConfig {
                service_name: env::var("SERVICE_NAME")
                    .unwrap_or_else(|_| "trust-safety-service".to_string()),
            },
            moderation: ModerationConfig {
                excerpt_context: env::var("EXCERPT_CONTEXT")
                    .ok()
                    .and_then(|value| value.parse().ok())
                    .unwrap_or(40),
            },
        }
    }
}
