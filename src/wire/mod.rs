//! Binary control protocol between the coordinator and its agents.
//!
//! Every frame is a little-endian header (`msg_type: u32`, `msg_length: u32`)
//! followed by `msg_length` payload bytes. The statistics records are packed
//! little-endian structs; their layout is the contract shared with the agent
//! and must not change without regenerating both sides.

mod codec;
mod types;

pub use codec::{
    decode_header, decode_reply, decode_request, encode_reply, encode_request, Header,
    HEADER_BYTES, LATENCY_STATS_BYTES, MAX_PAYLOAD_BYTES, THROUGHPUT_STATS_BYTES,
};
pub use types::{
    msg_type, LatencyStats, PercentileCi, Reply, ReportKind, Request, ThroughputStats,
    PERCENTILE_COUNT, PERCENTILE_LABELS, P99_INDEX,
};
