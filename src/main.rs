use std::time::Duration;

use clap::Parser;
use tracing::info;

use loadctl::agents::{
    agent_args_map, latency_args, launch, symmetric_args, throughput_args, Agent, AgentRole,
    AgentSession, AgentSets,
};
use loadctl::args::{parse_pattern, CoordinatorArgs};
use loadctl::error::AppResult;
use loadctl::experiment::Experiment;
use loadctl::logger;

/// Grace period between launching the agents and dialing their control ports.
const LAUNCH_WARMUP: Duration = Duration::from_secs(5);

fn main() {
    let args = CoordinatorArgs::parse();
    logger::init_logging();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Failed to build runtime: {}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = runtime.block_on(run(args)) {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

async fn run(args: CoordinatorArgs) -> AppResult<()> {
    let spec = parse_pattern(&args.load_pattern)?;

    if args.print_agent_args {
        println!("{}", serde_json::to_string(&agent_args_map(&args))?);
        return Ok(());
    }

    // Launcher sessions stay alive (and keep the remote agents alive) until
    // the coordinator exits.
    let mut sessions: Vec<AgentSession> = Vec::new();
    if args.run_agents {
        args.check_private_key()?;
        for host in args.load_agent_hosts() {
            sessions.push(launch(&host, &args.private_key, &throughput_args(&args)).await?);
        }
        for host in args.lt_agent_hosts() {
            sessions.push(launch(&host, &args.private_key, &latency_args(&args)).await?);
        }
        for host in args.sym_agent_hosts() {
            sessions.push(launch(&host, &args.private_key, &symmetric_args(&args)).await?);
        }
        info!("launched {} agent(s), waiting for warm-up", sessions.len());
        tokio::time::sleep(LAUNCH_WARMUP).await;
    }

    let mut agent_sets = AgentSets::default();
    for host in args.load_agent_hosts() {
        let addr = format!("{}:{}", host, args.agent_port);
        agent_sets
            .th
            .push(Agent::connect(&addr, &host, AgentRole::Throughput).await?);
    }
    for host in args.lt_agent_hosts() {
        let addr = format!("{}:{}", host, args.agent_port);
        agent_sets
            .lt
            .push(Agent::connect(&addr, &host, AgentRole::Latency).await?);
    }
    // Symmetric agents measure latency on their own load stream.
    for host in args.sym_agent_hosts() {
        let addr = format!("{}:{}", host, args.agent_port);
        agent_sets
            .sym
            .push(Agent::connect(&addr, &host, AgentRole::Latency).await?);
    }
    info!("control connections open to {} agent(s)", agent_sets.total());

    let mut experiment = Experiment::new(&mut agent_sets, spec, args.ci_size, args.strict_qual);
    experiment.run(args.latency_qps).await
}
