//! The experiment driver: pattern dispatch, load/measure sequencing, and the
//! qualification loop.

mod commands;
mod qualify;
mod report;
mod stats;

pub use commands::{
    check_open, collect_convergence, report_latency, report_throughput, start_load, start_measure,
};
pub use report::{format_latency, format_throughput, print_latency, print_throughput};
pub use stats::{aggregate_latency, aggregate_throughput, p99_ci_width, rps};

use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, info};

use crate::agents::AgentSets;
use crate::args::{LoadPattern, PatternSpec};
use crate::error::{AppError, AppResult, ConfigError, ExperimentError};

/// Seconds spent polling for the agents' target connections to open.
const OPEN_POLL_TRIES: u64 = 60;
/// Settle time between starting load and starting a measurement.
const STABILIZE_WAIT: Duration = Duration::from_secs(2);
const REPEAT_ROUNDS: u32 = 100;

/// One experiment run: the pattern plus its mutable sampling parameters.
/// Created per run and discarded when it returns.
pub struct Experiment<'a> {
    agents: &'a mut AgentSets,
    pattern: LoadPattern,
    samples: u32,
    sampling_rate: f64,
    ci_size: u32,
    strict_qual: bool,
}

fn measure_duration(samples: u32, base_rate: f64, sampling_rate_percent: f64) -> AppResult<u64> {
    let effective = base_rate * (sampling_rate_percent / 100.0);
    if effective <= 0.0 {
        return Err(AppError::config(ConfigError::NoBaseRate));
    }
    Ok((f64::from(samples) / effective).ceil() as u64)
}

impl<'a> Experiment<'a> {
    pub fn new(
        agents: &'a mut AgentSets,
        spec: PatternSpec,
        ci_size: u32,
        strict_qual: bool,
    ) -> Experiment<'a> {
        Experiment {
            agents,
            pattern: spec.pattern,
            samples: spec.samples,
            sampling_rate: spec.sampling_rate,
            ci_size,
            strict_qual,
        }
    }

    /// Runs the configured pattern to completion. `latency_rate` is forced to
    /// zero when no latency agents are configured.
    pub async fn run(&mut self, latency_rate: u32) -> AppResult<()> {
        let latency_rate = if self.agents.lt.is_empty() {
            0
        } else {
            latency_rate
        };
        match self.pattern {
            LoadPattern::Fixed { load } => self.fixed(load, latency_rate).await,
            LoadPattern::FixedQual { load } => self.qualified(load, latency_rate).await,
            LoadPattern::FixedRepeat { load } => self.fixed_repeat(load, REPEAT_ROUNDS).await,
            LoadPattern::Step {
                start,
                end,
                step,
                qualified,
            } => self.step(start, end, step, latency_rate, qualified).await,
        }
    }

    /// Waits for every loading agent's target connections, then starts the
    /// per-agent load and the latency-agent load.
    async fn load(&mut self, load_rate: u32, latency_rate: u32) -> AppResult<()> {
        let mut open = false;
        for _ in 0..OPEN_POLL_TRIES {
            if check_open(&mut self.agents.loaders()).await? {
                open = true;
                break;
            }
            sleep(Duration::from_secs(1)).await;
        }
        if !open {
            return Err(AppError::experiment(ExperimentError::ConnectionsNotOpen {
                limit_secs: OPEN_POLL_TRIES,
            }));
        }

        let loading = self.agents.loading_count() as u32;
        if loading > 0 {
            start_load(&mut self.agents.loaders(), load_rate / loading).await?;
        }
        if !self.agents.lt.is_empty() {
            start_load(&mut self.agents.lt_only(), latency_rate).await?;
        }
        Ok(())
    }

    async fn fixed(&mut self, load_rate: u32, latency_rate: u32) -> AppResult<()> {
        info!(
            "fixed measurement: load rate {} rps, latency rate {} rps",
            load_rate, latency_rate
        );
        if self.agents.total() == 0 {
            return Err(AppError::config(ConfigError::NoAgents));
        }

        self.load(load_rate, latency_rate).await?;
        sleep(STABILIZE_WAIT).await;

        let loading = self.agents.loading_count() as u32;
        let per_agent_load = if loading > 0 { load_rate / loading } else { 0 };
        let base_rate = if self.agents.lt.is_empty() {
            f64::from(per_agent_load)
        } else {
            f64::from(latency_rate)
        };
        let measuring = self.agents.measuring_count();
        let sampling_rate = if measuring > 0 {
            self.sampling_rate * measuring as f64
        } else {
            100.0
        };
        let duration = measure_duration(self.samples, base_rate, sampling_rate)?;
        info!("will run for {} s", duration);

        start_measure(&mut self.agents.all(), self.samples, sampling_rate).await?;
        sleep(Duration::from_secs(duration)).await;
        self.collect_and_print().await
    }

    /// Measures for a caller-chosen window instead of a sample target; the
    /// sampling rate on the wire is pinned to 100.
    async fn fixed_time(
        &mut self,
        load_rate: u32,
        latency_rate: u32,
        duration_secs: u64,
    ) -> AppResult<()> {
        info!(
            "timed measurement: load rate {} rps, latency rate {} rps",
            load_rate, latency_rate
        );
        if self.agents.total() == 0 {
            return Err(AppError::config(ConfigError::NoAgents));
        }

        self.load(load_rate, latency_rate).await?;
        info!("will run for {} s", duration_secs);

        start_measure(&mut self.agents.all(), self.samples, 100.0).await?;
        sleep(Duration::from_secs(duration_secs)).await;
        self.collect_and_print().await
    }

    async fn fixed_repeat(&mut self, load_rate: u32, rounds: u32) -> AppResult<()> {
        for round in 0..rounds {
            if let Err(err) = self.fixed_time(load_rate, 0, 1).await {
                error!("repeat round {} failed: {}", round, err);
            }
        }
        Ok(())
    }

    async fn step(
        &mut self,
        start: u32,
        end: u32,
        step: u32,
        latency_rate: u32,
        qualified: bool,
    ) -> AppResult<()> {
        if step == 0 {
            return Err(AppError::config(ConfigError::ZeroStep));
        }
        let mut load_rate = start;
        while load_rate <= end {
            let result = if qualified {
                self.qualified(load_rate, latency_rate).await
            } else {
                self.fixed(load_rate, latency_rate).await
            };
            if let Err(err) = result {
                error!("step at {} rps failed: {}", load_rate, err);
            }
            info!("increasing load");
            match load_rate.checked_add(step) {
                Some(next) => load_rate = next,
                None => break,
            }
        }
        Ok(())
    }

    /// Collects throughput from the throughput agents and latency from the
    /// measuring agents, folds each latency report's embedded throughput into
    /// the throughput aggregate, and prints the tables.
    async fn collect_and_print(&mut self) -> AppResult<()> {
        let mut throughput = if self.agents.th.is_empty() {
            Vec::new()
        } else {
            report_throughput(&mut self.agents.th_only()).await?
        };

        if self.agents.measuring_count() > 0 {
            let latency = report_latency(&mut self.agents.latency_reporters()).await?;
            for reply in &latency {
                throughput.push(reply.throughput);
            }
            print_throughput(&aggregate_throughput(&throughput));
            println!("Aggregate latency");
            print_latency(&aggregate_latency(&latency));
        } else {
            print_throughput(&aggregate_throughput(&throughput));
        }
        Ok(())
    }
}
