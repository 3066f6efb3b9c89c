//! Qualification state machine: load, probe, measure, and retry until the
//! sample is statistically acceptable or the budgets run out.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{AppError, AppResult, ConfigError, ExperimentError};

use super::commands::{report_latency, report_throughput, start_measure};
use super::report::{print_latency, print_throughput};
use super::stats::{aggregate_latency, aggregate_throughput, p99_ci_width, rps};
use super::{measure_duration, Experiment};

const MAX_TRIES: u32 = 10;
const MAX_DURATION_SECS: u64 = 900;
/// Extra samples requested when a strict-qualification check fails.
const SAMPLES_STEP: u32 = 10_000;
/// Below this sampling rate there is nothing left to reduce.
const MIN_SAMPLING_RATE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QualState {
    Load,
    Measure,
    Exit,
}

impl Experiment<'_> {
    fn effective_sampling_rate(&self) -> f64 {
        self.sampling_rate * self.agents.measuring_count() as f64
    }

    /// Drives `Load -> Measure -> Exit`, retrying on load error, non-IID
    /// samples, and (under `--strictQual`) non-stationary samples or a too
    /// wide confidence interval.
    pub(super) async fn qualified(&mut self, load_rate: u32, latency_rate: u32) -> AppResult<()> {
        if self.agents.total() == 0 {
            return Err(AppError::config(ConfigError::NoAgents));
        }
        if self.agents.measuring_count() == 0 {
            return Err(AppError::config(ConfigError::NoMeasuringAgents));
        }

        let expected_rps = f64::from(load_rate) + f64::from(latency_rate);
        let mut state = QualState::Load;
        let mut try_count = 0u32;
        let mut max_time_reached = false;

        while try_count < MAX_TRIES {
            match state {
                QualState::Load => {
                    self.load(load_rate, latency_rate).await?;
                    sleep(Duration::from_secs(1)).await;

                    // Short probe window to see whether the load landed.
                    let sampling_rate = self.effective_sampling_rate();
                    start_measure(&mut self.agents.all(), self.samples, sampling_rate).await?;
                    sleep(Duration::from_secs(1)).await;

                    let replies = report_throughput(&mut self.agents.all()).await?;
                    let agg = aggregate_throughput(&replies);
                    let achieved = rps(&agg);
                    if achieved > expected_rps * 1.1 || achieved < expected_rps * 0.9 {
                        try_count += 1;
                        warn!(
                            "throughput {:.0} rps outside [{:.0}, {:.0}]",
                            achieved,
                            expected_rps * 0.9,
                            expected_rps * 1.1
                        );
                        continue;
                    }
                    if agg.correct_iad == 0 {
                        try_count += 1;
                        warn!("inter-arrival distribution check failed");
                        continue;
                    }
                    state = QualState::Measure;
                }
                QualState::Measure => {
                    let sampling_rate = self.effective_sampling_rate();
                    start_measure(&mut self.agents.all(), self.samples, sampling_rate).await?;

                    let base_rate = if self.agents.lt.is_empty() {
                        f64::from(load_rate / self.agents.loading_count() as u32)
                    } else {
                        f64::from(latency_rate)
                    };
                    let duration = measure_duration(self.samples, base_rate, sampling_rate)?;
                    info!("will run for {} s", duration);
                    if duration > MAX_DURATION_SECS {
                        max_time_reached = true;
                    }
                    sleep(Duration::from_secs(duration)).await;

                    let latency = report_latency(&mut self.agents.latency_reporters()).await?;
                    let agg_lat = aggregate_latency(&latency);

                    if !max_time_reached {
                        if self.strict_qual && agg_lat.is_stationary == 0 {
                            self.samples = self.samples.saturating_add(SAMPLES_STEP);
                            try_count += 1;
                            info!("not stationary, growing sample target to {}", self.samples);
                            continue;
                        }
                        if agg_lat.is_iid == 0 {
                            if self.sampling_rate < MIN_SAMPLING_RATE {
                                info!("cannot reduce sampling further");
                            } else {
                                let reduce = agg_lat.to_reduce_sampling.max(1);
                                info!("not IID, dividing sampling rate by {}", reduce);
                                self.sampling_rate /= f64::from(reduce);
                                try_count += 1;
                                continue;
                            }
                        }
                        if self.strict_qual {
                            let width = p99_ci_width(&agg_lat);
                            let target = u64::from(self.ci_size) * 1000;
                            if width > target {
                                self.samples = self.samples.saturating_add(SAMPLES_STEP);
                                try_count += 1;
                                info!(
                                    "99th percentile CI width {} ns above {} ns, growing sample target to {}",
                                    width, target, self.samples
                                );
                                continue;
                            }
                        }
                    }

                    info!("final sampling rate: {}", self.sampling_rate);
                    info!("final sample target: {}", self.samples);

                    let mut throughput = if self.agents.th.is_empty() {
                        Vec::new()
                    } else {
                        report_throughput(&mut self.agents.th_only()).await?
                    };
                    for reply in &latency {
                        throughput.push(reply.throughput);
                    }
                    print_throughput(&aggregate_throughput(&throughput));
                    println!("Aggregate latency");
                    print_latency(&agg_lat);

                    if max_time_reached {
                        return Err(AppError::experiment(ExperimentError::MaxTimeReached {
                            duration_secs: duration,
                            max_secs: MAX_DURATION_SECS,
                        }));
                    }
                    state = QualState::Exit;
                }
                QualState::Exit => {
                    info!("qualification complete");
                    sleep(Duration::from_secs(1)).await;
                    return Ok(());
                }
            }
        }
        Err(AppError::experiment(ExperimentError::MaxRetries {
            tries: try_count,
        }))
    }
}
