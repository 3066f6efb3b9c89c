mod app;
mod config;
mod experiment;
mod wire;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use experiment::ExperimentError;
pub use wire::WireError;
