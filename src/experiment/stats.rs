//! Field-wise aggregation of per-agent reports and the derived metrics.

use crate::wire::{LatencyStats, ThroughputStats, P99_INDEX};

/// Sentinel that any real per-agent reducer undercuts.
const REDUCE_SENTINEL: u32 = 1_000_000;

/// Sums the counters across agents. The duration is copied from the first
/// report (all agents measure for the same nominal window); with no reports it
/// stays zero and must not be consumed.
pub fn aggregate_throughput(replies: &[ThroughputStats]) -> ThroughputStats {
    let mut agg = ThroughputStats::default();
    for reply in replies {
        agg.rx_bytes = agg.rx_bytes.saturating_add(reply.rx_bytes);
        agg.tx_bytes = agg.tx_bytes.saturating_add(reply.tx_bytes);
        agg.req_count = agg.req_count.saturating_add(reply.req_count);
        agg.correct_iad = agg.correct_iad.saturating_add(reply.correct_iad);
    }
    if let Some(first) = replies.first() {
        agg.duration = first.duration;
    }
    agg
}

/// Truncating integer mean of every scalar field across agents; the quality
/// flags are summed, so `is_iid == 0` means at least one agent failed the IID
/// test. In that case the aggregate reducer is the minimum over agents.
///
/// Callers must not pass an empty list.
pub fn aggregate_latency(replies: &[LatencyStats]) -> LatencyStats {
    assert!(!replies.is_empty(), "latency aggregation needs input");
    let count = replies.len() as u64;
    let mut agg = LatencyStats::default();
    for reply in replies {
        agg.avg_lat = agg.avg_lat.saturating_add(reply.avg_lat);
        for (slot, percentile) in agg.percentiles.iter_mut().zip(reply.percentiles.iter()) {
            slot.low = slot.low.saturating_add(percentile.low);
            slot.value = slot.value.saturating_add(percentile.value);
            slot.high = slot.high.saturating_add(percentile.high);
        }
        agg.is_iid += reply.is_iid;
        agg.is_stationary += reply.is_stationary;
    }
    agg.avg_lat /= count;
    for slot in &mut agg.percentiles {
        slot.low /= count;
        slot.value /= count;
        slot.high /= count;
    }
    if agg.is_iid == 0 {
        agg.to_reduce_sampling = REDUCE_SENTINEL;
        for reply in replies {
            agg.to_reduce_sampling = agg.to_reduce_sampling.min(reply.to_reduce_sampling);
        }
    }
    agg
}

pub fn rps(stats: &ThroughputStats) -> f64 {
    1e6 * stats.req_count as f64 / stats.duration as f64
}

/// Width of the 99th-percentile confidence interval in nanoseconds.
pub fn p99_ci_width(stats: &LatencyStats) -> u64 {
    let p99 = &stats.percentiles[P99_INDEX];
    p99.high.saturating_sub(p99.low)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{PercentileCi, PERCENTILE_COUNT};

    fn throughput(req_count: u64, duration: u64, correct_iad: u64) -> ThroughputStats {
        ThroughputStats {
            rx_bytes: 10 * req_count,
            tx_bytes: 5 * req_count,
            req_count,
            duration,
            correct_iad,
        }
    }

    fn latency(avg: u64, is_iid: u64, to_reduce: u32) -> LatencyStats {
        let mut percentiles = [PercentileCi::default(); PERCENTILE_COUNT];
        for (i, slot) in percentiles.iter_mut().enumerate() {
            let base = avg + 1_000 * i as u64;
            *slot = PercentileCi {
                low: base - 100,
                value: base,
                high: base + 100,
            };
        }
        LatencyStats {
            throughput: throughput(100, 1_000_000, 1),
            avg_lat: avg,
            percentiles,
            to_reduce_sampling: to_reduce,
            is_iid,
            is_stationary: 1,
        }
    }

    #[test]
    fn throughput_aggregate_sums_and_keeps_first_duration() {
        let replies = [
            throughput(10_000, 1_000_000, 1),
            throughput(20_000, 999_999, 0),
        ];
        let agg = aggregate_throughput(&replies);
        assert_eq!(agg.req_count, 30_000);
        assert_eq!(agg.rx_bytes, 300_000);
        assert_eq!(agg.tx_bytes, 150_000);
        assert_eq!(agg.correct_iad, 1);
        assert_eq!(agg.duration, 1_000_000);
    }

    #[test]
    fn empty_throughput_aggregate_is_zero() {
        let agg = aggregate_throughput(&[]);
        assert_eq!(agg, ThroughputStats::default());
    }

    #[test]
    fn latency_aggregate_takes_truncating_means() {
        let replies = [latency(500_000, 1, 0), latency(500_001, 1, 0)];
        let agg = aggregate_latency(&replies);
        // (500_000 + 500_001) / 2 truncates.
        assert_eq!(agg.avg_lat, 500_000);
        assert_eq!(agg.is_iid, 2);
        assert_eq!(agg.is_stationary, 2);
        assert_eq!(agg.to_reduce_sampling, 0);
        assert_eq!(agg.percentiles[0].value, 500_000);
        assert_eq!(agg.percentiles[P99_INDEX].value, 500_000 + 3_000);
    }

    #[test]
    fn reducer_is_the_minimum_when_any_agent_is_not_iid() {
        let replies = [
            latency(500_000, 0, 8),
            latency(500_000, 0, 4),
            latency(500_000, 0, 16),
        ];
        let agg = aggregate_latency(&replies);
        assert_eq!(agg.is_iid, 0);
        assert_eq!(agg.to_reduce_sampling, 4);
    }

    #[test]
    fn one_iid_agent_keeps_the_aggregate_flagged_iid() {
        let replies = [latency(500_000, 1, 0), latency(500_000, 0, 4)];
        let agg = aggregate_latency(&replies);
        // Summed flags: any nonzero sum means "not all agents failed".
        assert_eq!(agg.is_iid, 1);
        assert_eq!(agg.to_reduce_sampling, 0);
    }

    #[test]
    fn rps_is_exact_float_division() {
        let stats = throughput(10_000, 1_000_000, 1);
        assert_eq!(rps(&stats), 10_000.0);
        let stats = throughput(10_000, 2_000_000, 1);
        assert_eq!(rps(&stats), 5_000.0);
    }

    #[test]
    fn ci_width_reads_the_99th_percentile_triple() {
        let stats = latency(500_000, 1, 0);
        assert_eq!(p99_ci_width(&stats), 200);
    }
}
