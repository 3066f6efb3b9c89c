//! Scripted in-process agents that speak the coordinator's wire protocol.

use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use loadctl::agents::{Agent, AgentRole};
use loadctl::wire::{
    decode_header, decode_request, encode_reply, LatencyStats, PercentileCi, Reply, ReportKind,
    Request, ThroughputStats, HEADER_BYTES, PERCENTILE_COUNT,
};

/// Canned behavior for one agent. Reply lists are consumed in order and the
/// last entry repeats once exhausted.
#[derive(Clone, Default)]
pub struct AgentScript {
    pub open_replies: Vec<u32>,
    pub throughput_replies: Vec<ThroughputStats>,
    pub latency_replies: Vec<LatencyStats>,
    /// Answer the n-th START_LOAD (0-based) with a wrong frame type.
    pub fail_start_load_at: Option<usize>,
}

pub struct ScriptedAgent {
    pub addr: String,
    pub requests: Arc<Mutex<Vec<Request>>>,
}

impl ScriptedAgent {
    pub fn request_log(&self) -> Result<Vec<Request>, String> {
        self.requests
            .lock()
            .map(|log| log.clone())
            .map_err(|_| "request log poisoned".to_owned())
    }
}

fn pick<T: Clone + Default>(replies: &[T], index: usize) -> T {
    match replies.get(index.min(replies.len().saturating_sub(1))) {
        Some(reply) => reply.clone(),
        None => T::default(),
    }
}

pub async fn spawn_agent(script: AgentScript) -> Result<ScriptedAgent, String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .map_err(|err| format!("bind scripted agent failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("agent addr failed: {}", err))?
        .to_string();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&requests);
    tokio::spawn(async move {
        if let Ok((stream, _)) = listener.accept().await {
            serve(stream, script, log).await;
        }
    });
    Ok(ScriptedAgent { addr, requests })
}

async fn serve(mut stream: TcpStream, script: AgentScript, log: Arc<Mutex<Vec<Request>>>) {
    let mut opens = 0usize;
    let mut loads = 0usize;
    let mut throughputs = 0usize;
    let mut latencies = 0usize;
    loop {
        let mut header_bytes = [0u8; HEADER_BYTES];
        if stream.read_exact(&mut header_bytes).await.is_err() {
            return;
        }
        let header = decode_header(&header_bytes);
        let mut payload = vec![0u8; header.length as usize];
        if stream.read_exact(&mut payload).await.is_err() {
            return;
        }
        let Ok(request) = decode_request(&header, &payload) else {
            return;
        };
        if let Ok(mut entries) = log.lock() {
            entries.push(request);
        }
        let reply = match request {
            Request::ConnOpen => {
                let value = if script.open_replies.is_empty() {
                    1
                } else {
                    pick(&script.open_replies, opens)
                };
                opens += 1;
                Reply::Value(value)
            }
            Request::StartLoad { .. } => {
                let index = loads;
                loads += 1;
                if script.fail_start_load_at == Some(index) {
                    Reply::Value(0)
                } else {
                    Reply::Ack(0)
                }
            }
            Request::StartMeasure { .. } => Reply::Ack(0),
            Request::ReportReq {
                kind: ReportKind::Throughput,
            } => {
                let stats = pick(&script.throughput_replies, throughputs);
                throughputs += 1;
                Reply::Throughput(stats)
            }
            Request::ReportReq {
                kind: ReportKind::Latency,
            } => {
                let stats = pick(&script.latency_replies, latencies);
                latencies += 1;
                Reply::Latency(stats)
            }
        };
        if stream.write_all(&encode_reply(&reply)).await.is_err() {
            return;
        }
    }
}

pub async fn connect_agent(agent: &ScriptedAgent, role: AgentRole) -> Result<Agent, String> {
    Agent::connect(&agent.addr, "127.0.0.1", role)
        .await
        .map_err(|err| format!("connect to scripted agent failed: {}", err))
}

pub fn throughput_report(req_count: u64, duration: u64, correct_iad: u64) -> ThroughputStats {
    ThroughputStats {
        rx_bytes: 100 * req_count,
        tx_bytes: 50 * req_count,
        req_count,
        duration,
        correct_iad,
    }
}

pub fn latency_report(
    avg_lat: u64,
    is_iid: u64,
    to_reduce_sampling: u32,
    throughput: ThroughputStats,
) -> LatencyStats {
    let mut percentiles = [PercentileCi::default(); PERCENTILE_COUNT];
    for (i, slot) in percentiles.iter_mut().enumerate() {
        let base = avg_lat + 10_000 * i as u64;
        *slot = PercentileCi {
            low: base - 1_000,
            value: base,
            high: base + 1_000,
        };
    }
    LatencyStats {
        throughput,
        avg_lat,
        percentiles,
        to_reduce_sampling,
        is_iid,
        is_stationary: 1,
    }
}

pub fn run_async_test<F>(future: F) -> Result<(), String>
where
    F: std::future::Future<Output = Result<(), String>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("Failed to build runtime: {}", err))?;
    runtime.block_on(future)
}
