//! Coordinator of a distributed load-generation and latency-measurement
//! harness. Drives remote agents over a binary TCP control protocol,
//! aggregates their reports, and qualifies the sample in the patterns that
//! ask for it.

pub mod agents;
pub mod args;
pub mod error;
pub mod experiment;
pub mod logger;
pub mod wire;
