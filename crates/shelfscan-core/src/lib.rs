pub mod app_config;
pub mod config;
pub mod product;

pub use app_config::AppConfig;
pub use config::{build_app_config, load_app_config, load_app_config_from_env};
pub use product::{Availability, Product, DEFAULT_CATEGORY, DEFAULT_CURRENCY};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
