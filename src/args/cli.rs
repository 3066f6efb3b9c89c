use clap::{ArgAction, Parser};

use crate::error::{AppResult, ConfigError};

fn default_private_key() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/root".to_owned());
    format!("{}/.ssh/id_rsa", home)
}

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Coordinator for a distributed load-generation and latency-measurement harness."
)]
pub struct CoordinatorArgs {
    /// Control port to dial on each agent
    #[arg(long = "agentPort", default_value_t = 5001)]
    pub agent_port: u16,

    /// host:port comma-separated list of the system under test
    #[arg(long = "targetHost", default_value = "127.0.0.1:8000")]
    pub target_host: String,

    /// Comma-separated throughput-agent hosts
    #[arg(long = "loadAgents", default_value = "")]
    pub load_agents: String,

    /// Comma-separated latency-agent hosts
    #[arg(long = "ltAgents", default_value = "")]
    pub lt_agents: String,

    /// Comma-separated symmetric-agent hosts
    #[arg(long = "symAgents", default_value = "")]
    pub sym_agents: String,

    /// Loading threads per throughput/symmetric agent
    #[arg(long = "loadThreads", default_value_t = 1)]
    pub load_threads: u32,

    /// Latency threads per latency agent
    #[arg(long = "ltThreads", default_value_t = 1)]
    pub lt_threads: u32,

    /// Loading connections per throughput/symmetric agent
    #[arg(long = "loadConns", default_value_t = 1)]
    pub load_conns: u32,

    /// Latency connections per latency agent
    #[arg(long = "ltConns", default_value_t = 1)]
    pub lt_conns: u32,

    /// Inter-arrival distribution (fixed, exp)
    #[arg(long = "idist", default_value = "exp")]
    pub idist: String,

    /// Application protocol spec
    #[arg(long = "appProto", default_value = "echo:4")]
    pub app_proto: String,

    /// Transport protocol (TCP, R2P2, UDP)
    #[arg(long = "comProto", default_value = "TCP")]
    pub com_proto: String,

    /// Latency-agent load in requests per second
    #[arg(long = "lqps", default_value_t = 4000)]
    pub latency_qps: u32,

    /// Load pattern selector, e.g. fixed:10000 or stepQual:1000:9000:1000
    #[arg(long = "loadPattern", default_value = "fixed:10000")]
    pub load_pattern: String,

    /// Target 95% confidence-interval width in microseconds
    #[arg(long = "ciSize", default_value_t = 10)]
    pub ci_size: u32,

    /// NIC hardware timestamping for symmetric agents
    #[arg(long = "nicTS")]
    pub nic_ts: bool,

    /// Private key used to launch the agents
    #[arg(long = "privateKey", default_value_t = default_private_key())]
    pub private_key: String,

    /// Interface name for hardware timestamping
    #[arg(long = "ifName", default_value = "enp65s0")]
    pub if_name: String,

    /// Outstanding requests per connection
    #[arg(long = "reqPerConn", default_value_t = 1)]
    pub req_per_conn: u32,

    /// Automatically launch the agents
    #[arg(long = "runAgents", default_value_t = true, action = ArgAction::Set)]
    pub run_agents: bool,

    /// Print the per-agent launch arguments as JSON and exit
    #[arg(long = "printAgentArgs")]
    pub print_agent_args: bool,

    /// Also enforce the stationarity and CI-width checks in qualified patterns
    #[arg(long = "strictQual")]
    pub strict_qual: bool,
}

fn split_hosts(value: &str) -> Vec<String> {
    if value.is_empty() {
        return Vec::new();
    }
    value.split(',').map(str::to_owned).collect()
}

impl CoordinatorArgs {
    pub fn load_agent_hosts(&self) -> Vec<String> {
        split_hosts(&self.load_agents)
    }

    pub fn lt_agent_hosts(&self) -> Vec<String> {
        split_hosts(&self.lt_agents)
    }

    pub fn sym_agent_hosts(&self) -> Vec<String> {
        split_hosts(&self.sym_agents)
    }

    /// Fails before any network I/O if the launcher key is unusable.
    pub fn check_private_key(&self) -> AppResult<()> {
        let metadata =
            std::fs::metadata(&self.private_key).map_err(|_| ConfigError::MissingPrivateKey {
                path: self.private_key.clone(),
            })?;
        if metadata.is_dir() {
            return Err(ConfigError::PrivateKeyIsDirectory {
                path: self.private_key.clone(),
            }
            .into());
        }
        Ok(())
    }
}
