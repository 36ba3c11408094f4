pub mod app_config;
pub mod config;
pub mod input;
pub mod records;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use input::{load_crawl_input, CrawlInput, InputError, OutputFormat, SortMode};
pub use records::{BusinessRecord, HoursEntry, RatingValue, Review};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read input file {path}")]
    InputFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse input file: {0}")]
    InputFileParse(#[from] serde_json::Error),
}
