//! Qualification state-machine scenarios against scripted agents.

mod support;

use loadctl::agents::{AgentRole, AgentSets};
use loadctl::args::parse_pattern;
use loadctl::experiment::Experiment;
use loadctl::wire::{ReportKind, Request};

use support::{
    connect_agent, latency_report, run_async_test, spawn_agent, throughput_report, AgentScript,
};

fn start_measure_rates(log: &[Request]) -> Vec<f64> {
    log.iter()
        .filter_map(|request| match request {
            Request::StartMeasure { rate, .. } => Some(*rate),
            _ => None,
        })
        .collect()
}

#[test]
fn qualification_retries_until_the_load_lands() -> Result<(), String> {
    run_async_test(async {
        // First probe is far below the requested 10000 rps, the second lands.
        let agent = spawn_agent(AgentScript {
            throughput_replies: vec![
                throughput_report(5000, 1_000_000, 1),
                throughput_report(10_500, 1_000_000, 1),
            ],
            latency_replies: vec![latency_report(
                500_000,
                1,
                0,
                throughput_report(10_500, 1_000_000, 1),
            )],
            ..AgentScript::default()
        })
        .await?;
        let mut sets = AgentSets::default();
        sets.sym
            .push(connect_agent(&agent, AgentRole::Latency).await?);

        let spec = parse_pattern("fixedQual:10000:1000").map_err(|err| err.to_string())?;
        let mut experiment = Experiment::new(&mut sets, spec, 10, false);
        experiment.run(0).await.map_err(|err| err.to_string())?;

        let log = agent.request_log()?;
        let loads = log
            .iter()
            .filter(|request| matches!(request, Request::StartLoad { .. }))
            .count();
        if loads != 2 {
            return Err(format!("expected 2 load rounds, got {}", loads));
        }
        let kinds: Vec<ReportKind> = log
            .iter()
            .filter_map(|request| match request {
                Request::ReportReq { kind } => Some(*kind),
                _ => None,
            })
            .collect();
        if kinds
            != vec![
                ReportKind::Throughput,
                ReportKind::Throughput,
                ReportKind::Latency,
            ]
        {
            return Err(format!("unexpected report sequence: {:?}", kinds));
        }
        Ok(())
    })
}

#[test]
fn qualification_reduces_the_sampling_rate_until_iid() -> Result<(), String> {
    run_async_test(async {
        let embedded = throughput_report(1000, 1_000_000, 1);
        let agent = spawn_agent(AgentScript {
            throughput_replies: vec![throughput_report(1000, 1_000_000, 1)],
            latency_replies: vec![
                latency_report(500_000, 0, 4, embedded),
                latency_report(500_000, 1, 0, embedded),
            ],
            ..AgentScript::default()
        })
        .await?;
        let mut sets = AgentSets::default();
        sets.lt.push(connect_agent(&agent, AgentRole::Latency).await?);

        // Latency-only run: the expected rps is just the latency rate.
        let spec = parse_pattern("fixedQual:0:100").map_err(|err| err.to_string())?;
        let mut experiment = Experiment::new(&mut sets, spec, 10, false);
        experiment.run(1000).await.map_err(|err| err.to_string())?;

        let rates = start_measure_rates(&agent.request_log()?);
        // Probe at 20%, first measurement at 20%, then 20/4 after the non-IID
        // report.
        if rates != vec![20.0, 20.0, 5.0] {
            return Err(format!("unexpected sampling rates: {:?}", rates));
        }
        Ok(())
    })
}

#[test]
fn qualification_gives_up_after_max_tries() -> Result<(), String> {
    run_async_test(async {
        // Every probe reports half the requested load; the band check can
        // never pass.
        let agent = spawn_agent(AgentScript {
            throughput_replies: vec![throughput_report(5000, 1_000_000, 1)],
            ..AgentScript::default()
        })
        .await?;
        let mut sets = AgentSets::default();
        sets.sym
            .push(connect_agent(&agent, AgentRole::Latency).await?);

        let spec = parse_pattern("fixedQual:10000:1000").map_err(|err| err.to_string())?;
        let mut experiment = Experiment::new(&mut sets, spec, 10, false);
        match experiment.run(0).await {
            Ok(()) => Err("expected the retry budget to run out".to_owned()),
            Err(err) => {
                let message = err.to_string();
                if !message.contains("10 qualification attempts") {
                    return Err(format!("unexpected error: {}", message));
                }
                let log = agent.request_log()?;
                let reports = log
                    .iter()
                    .filter(|request| matches!(request, Request::ReportReq { .. }))
                    .count();
                if reports != 10 {
                    return Err(format!("expected 10 probe reports, got {}", reports));
                }
                Ok(())
            }
        }
    })
}

#[test]
fn qualified_patterns_need_a_measuring_agent() -> Result<(), String> {
    run_async_test(async {
        let agent = spawn_agent(AgentScript::default()).await?;
        let mut sets = AgentSets::default();
        sets.th
            .push(connect_agent(&agent, AgentRole::Throughput).await?);

        let spec = parse_pattern("fixedQual:10000").map_err(|err| err.to_string())?;
        let mut experiment = Experiment::new(&mut sets, spec, 10, false);
        match experiment.run(0).await {
            Ok(()) => Err("expected a configuration error".to_owned()),
            Err(err) => {
                let message = err.to_string();
                if !message.contains("latency-measuring agent") {
                    return Err(format!("unexpected error: {}", message));
                }
                Ok(())
            }
        }
    })
}
