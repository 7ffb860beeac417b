pub mod app_config;
pub mod config;
pub mod selectors;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, StepTimeouts};
pub use config::{load_app_config, load_app_config_from_env};
pub use selectors::{load_selectors, PageSelectors};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read selectors file {path}: {source}")]
    SelectorsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse selectors file: {0}")]
    SelectorsFileParse(#[source] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),
}
