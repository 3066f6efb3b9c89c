/// Message type values shared with the agent.
pub mod msg_type {
    pub const CONN_OPEN: u32 = 0;
    pub const START_LOAD: u32 = 1;
    pub const START_MEASURE: u32 = 2;
    pub const REPORT_REQ: u32 = 3;
    pub const REPLY_ACK: u32 = 4;
    pub const REPLY_VALUE: u32 = 5;
    pub const REPLY_STATS_THROUGHPUT: u32 = 6;
    pub const REPLY_STATS_LATENCY: u32 = 7;
    pub const REPLY_CONVERGENCE: u32 = 8;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Throughput = 0,
    Latency = 1,
}

/// Coordinator-to-agent frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Request {
    ConnOpen,
    StartLoad { rps: u32 },
    StartMeasure { samples: u32, rate: f64 },
    ReportReq { kind: ReportKind },
}

/// Agent-to-coordinator frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reply {
    Ack(u32),
    Value(u32),
    Throughput(ThroughputStats),
    Latency(LatencyStats),
    Convergence(u32),
}

impl Reply {
    pub fn msg_type(&self) -> u32 {
        match self {
            Reply::Ack(_) => msg_type::REPLY_ACK,
            Reply::Value(_) => msg_type::REPLY_VALUE,
            Reply::Throughput(_) => msg_type::REPLY_STATS_THROUGHPUT,
            Reply::Latency(_) => msg_type::REPLY_STATS_LATENCY,
            Reply::Convergence(_) => msg_type::REPLY_CONVERGENCE,
        }
    }
}

/// One measurement window of request counters, duration in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThroughputStats {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub req_count: u64,
    pub duration: u64,
    pub correct_iad: u64,
}

/// Confidence-interval triple for one percentile, in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PercentileCi {
    pub low: u64,
    pub value: u64,
    pub high: u64,
}

pub const PERCENTILE_COUNT: usize = 8;
pub const PERCENTILE_LABELS: [&str; PERCENTILE_COUNT] = [
    "50th", "90th", "95th", "99th", "99.9th", "99.99th", "99.999th", "99.9999th",
];
/// Index of the 99th percentile in [`LatencyStats::percentiles`].
pub const P99_INDEX: usize = 3;

/// Latency report with the sender's own throughput embedded.
///
/// `is_iid` and `is_stationary` travel as single bytes but are widened here so
/// aggregates can sum them across agents without clipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LatencyStats {
    pub throughput: ThroughputStats,
    pub avg_lat: u64,
    pub percentiles: [PercentileCi; PERCENTILE_COUNT],
    pub to_reduce_sampling: u32,
    pub is_iid: u64,
    pub is_stationary: u64,
}
