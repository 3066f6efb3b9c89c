//! Tab-separated report tables for stdout.

use crate::wire::{LatencyStats, ThroughputStats, PERCENTILE_LABELS};

use super::stats::rps;

pub fn format_throughput(stats: &ThroughputStats) -> String {
    let duration = stats.duration as f64;
    format!(
        "#ReqCount\tQPS\tRxBw\tTxBw\n{}\t{}\t{}\t{}",
        stats.req_count,
        rps(stats),
        1e6 * stats.rx_bytes as f64 / duration,
        1e6 * stats.tx_bytes as f64 / duration
    )
}

/// Average and percentile columns in microseconds, each percentile as
/// `value(low, high)`.
pub fn format_latency(stats: &LatencyStats) -> String {
    let mut header = String::from("#Avg Lat");
    let mut row = format!("{}", stats.avg_lat as f64 / 1e3);
    for (label, percentile) in PERCENTILE_LABELS.iter().zip(stats.percentiles.iter()) {
        header.push('\t');
        header.push_str(label);
        row.push_str(&format!(
            "\t{}({}, {})",
            percentile.value as f64 / 1e3,
            percentile.low as f64 / 1e3,
            percentile.high as f64 / 1e3
        ));
    }
    format!("{}\n{}", header, row)
}

pub fn print_throughput(stats: &ThroughputStats) {
    println!("Next line includes both load and measurement");
    println!("{}", format_throughput(stats));
}

pub fn print_latency(stats: &LatencyStats) {
    println!("{}", format_latency(stats));
}
