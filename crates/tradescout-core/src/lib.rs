pub mod app_config;
pub mod config;
pub mod detail;
pub mod fallback;
pub mod normalized;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use detail::{LabeledValue, PriceTier, ProductDetail, Rating, Supplier, Variation};
pub use fallback::ListingFallback;
pub use normalized::NormalizedDetail;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
