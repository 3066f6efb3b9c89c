use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to find private ssh key at '{path}'.")]
    MissingPrivateKey { path: String },
    #[error("Private ssh key path '{path}' is a directory.")]
    PrivateKeyIsDirectory { path: String },
    #[error("Unknown load pattern '{value}'.")]
    UnknownPattern { value: String },
    #[error("Load pattern is missing its {field} field.")]
    MissingPatternField { field: &'static str },
    #[error("Invalid {field} in load pattern: {source}")]
    InvalidPatternInt {
        field: &'static str,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Invalid {field} in load pattern: {source}")]
    InvalidPatternFloat {
        field: &'static str,
        #[source]
        source: std::num::ParseFloatError,
    },
    #[error("Step pattern requires a nonzero step.")]
    ZeroStep,
    #[error("There are no agents.")]
    NoAgents,
    #[error("No loading or latency agents to derive a measurement rate from.")]
    NoBaseRate,
    #[error("Qualified patterns need at least one latency-measuring agent.")]
    NoMeasuringAgents,
}
