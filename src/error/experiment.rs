use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error("Agent connections did not open within {limit_secs} s.")]
    ConnectionsNotOpen { limit_secs: u64 },
    #[error("Launching agent on {host} failed: {source}")]
    Launch {
        host: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Measurement window of {duration_secs} s exceeds the {max_secs} s budget.")]
    MaxTimeReached { duration_secs: u64, max_secs: u64 },
    #[error("Gave up after {tries} qualification attempts.")]
    MaxRetries { tries: u32 },
}
