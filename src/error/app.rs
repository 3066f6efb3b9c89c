use thiserror::Error;

use super::{ConfigError, ExperimentError, WireError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Wire error: {0}")]
    Wire(#[from] WireError),
    #[error("Experiment error: {0}")]
    Experiment(#[from] ExperimentError),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn config<E>(error: E) -> Self
    where
        E: Into<ConfigError>,
    {
        error.into().into()
    }

    pub fn wire<E>(error: E) -> Self
    where
        E: Into<WireError>,
    {
        error.into().into()
    }

    pub fn experiment<E>(error: E) -> Self
    where
        E: Into<ExperimentError>,
    {
        error.into().into()
    }
}
