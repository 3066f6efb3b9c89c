//! Broadcast/collect primitives and the semantic command layer.
//!
//! The control plane is strictly request/reply: one frame goes to every agent
//! in the caller-supplied order, then one reply is consumed from each agent in
//! that same order. The deadlines are wire-contract constants.

use std::time::Duration;

use tracing::{debug, info};

use crate::agents::Agent;
use crate::error::{AppError, AppResult, WireError};
use crate::wire::{encode_request, LatencyStats, Reply, ReportKind, Request, ThroughputStats};

pub const ACK_DEADLINE: Duration = Duration::from_millis(500);
pub const VALUE_DEADLINE: Duration = Duration::from_millis(500);
pub const THROUGHPUT_DEADLINE: Duration = Duration::from_secs(5);
pub const LATENCY_DEADLINE: Duration = Duration::from_secs(10);
pub const CONVERGENCE_DEADLINE: Duration = Duration::from_millis(500);

async fn broadcast(agents: &mut [&mut Agent], request: &Request) -> AppResult<()> {
    let frame = encode_request(request);
    for agent in agents.iter_mut() {
        agent.channel.send(&frame).await?;
    }
    Ok(())
}

fn unexpected(agent: &Agent, expected: &'static str, reply: &Reply) -> AppError {
    AppError::wire(WireError::UnexpectedReply {
        agent: agent.name.clone(),
        expected,
        actual: reply.msg_type(),
    })
}

async fn collect_acks(agents: &mut [&mut Agent]) -> AppResult<()> {
    for agent in agents.iter_mut() {
        match agent.channel.read_reply(ACK_DEADLINE, "collect ack").await? {
            Reply::Ack(_) => {}
            other => return Err(unexpected(agent, "REPLY_ACK", &other)),
        }
    }
    Ok(())
}

async fn collect_values(agents: &mut [&mut Agent]) -> AppResult<Vec<u32>> {
    let mut values = Vec::with_capacity(agents.len());
    for agent in agents.iter_mut() {
        match agent
            .channel
            .read_reply(VALUE_DEADLINE, "collect value")
            .await?
        {
            Reply::Value(value) => values.push(value),
            other => return Err(unexpected(agent, "REPLY_VALUE", &other)),
        }
    }
    Ok(values)
}

async fn collect_throughput(agents: &mut [&mut Agent]) -> AppResult<Vec<ThroughputStats>> {
    let mut replies = Vec::with_capacity(agents.len());
    for agent in agents.iter_mut() {
        match agent
            .channel
            .read_reply(THROUGHPUT_DEADLINE, "collect throughput")
            .await?
        {
            Reply::Throughput(stats) => replies.push(stats),
            other => return Err(unexpected(agent, "REPLY_STATS_THROUGHPUT", &other)),
        }
    }
    Ok(replies)
}

async fn collect_latency(agents: &mut [&mut Agent]) -> AppResult<Vec<LatencyStats>> {
    let mut replies = Vec::with_capacity(agents.len());
    let mut iad_sum = 0u64;
    for agent in agents.iter_mut() {
        match agent
            .channel
            .read_reply(LATENCY_DEADLINE, "collect latency")
            .await?
        {
            Reply::Latency(stats) => {
                debug!("latency report from {}: {:?}", agent.name, stats);
                iad_sum = iad_sum.saturating_add(stats.throughput.correct_iad);
                replies.push(stats);
            }
            other => return Err(unexpected(agent, "REPLY_STATS_LATENCY", &other)),
        }
    }
    info!("overall inter-arrival check: {}", iad_sum);
    Ok(replies)
}

/// Part of the agent contract; no current pattern consumes convergence values.
pub async fn collect_convergence(agents: &mut [&mut Agent]) -> AppResult<Vec<u32>> {
    let mut values = Vec::with_capacity(agents.len());
    for agent in agents.iter_mut() {
        match agent
            .channel
            .read_reply(CONVERGENCE_DEADLINE, "collect convergence")
            .await?
        {
            Reply::Convergence(value) => values.push(value),
            other => return Err(unexpected(agent, "REPLY_CONVERGENCE", &other)),
        }
    }
    Ok(values)
}

/// True iff every agent reports its target-server connections open.
pub async fn check_open(agents: &mut [&mut Agent]) -> AppResult<bool> {
    broadcast(agents, &Request::ConnOpen).await?;
    let values = collect_values(agents).await?;
    Ok(values.into_iter().all(|value| value != 0))
}

pub async fn start_load(agents: &mut [&mut Agent], rps: u32) -> AppResult<()> {
    broadcast(agents, &Request::StartLoad { rps }).await?;
    collect_acks(agents).await
}

pub async fn start_measure(agents: &mut [&mut Agent], samples: u32, rate: f64) -> AppResult<()> {
    broadcast(agents, &Request::StartMeasure { samples, rate }).await?;
    collect_acks(agents).await
}

pub async fn report_throughput(agents: &mut [&mut Agent]) -> AppResult<Vec<ThroughputStats>> {
    broadcast(
        agents,
        &Request::ReportReq {
            kind: ReportKind::Throughput,
        },
    )
    .await?;
    collect_throughput(agents).await
}

pub async fn report_latency(agents: &mut [&mut Agent]) -> AppResult<Vec<LatencyStats>> {
    broadcast(
        agents,
        &Request::ReportReq {
            kind: ReportKind::Latency,
        },
    )
    .await?;
    collect_latency(agents).await
}
