//! Agent handles and the role partition of the population.

mod channel;
mod launch_args;
mod launcher;

pub use channel::AgentChannel;
pub use launch_args::{agent_args_map, latency_args, symmetric_args, throughput_args};
pub use launcher::{launch, AgentSession};

use crate::error::AppResult;

/// Role of a remote agent. Symmetric agents measure latency on their own load
/// stream and are classified as latency agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentRole {
    Throughput,
    Latency,
}

/// Handle to one remote agent: a stable display name, an immutable role, and
/// the open control connection.
pub struct Agent {
    pub name: String,
    pub role: AgentRole,
    pub channel: AgentChannel,
}

impl Agent {
    pub async fn connect(addr: &str, name: &str, role: AgentRole) -> AppResult<Agent> {
        let channel = AgentChannel::connect(addr).await?;
        Ok(Agent {
            name: name.to_owned(),
            role,
            channel,
        })
    }
}

/// The agent population, partitioned by configuration role.
///
/// The union helpers return agents in a fixed order; within a single command
/// replies are consumed in exactly that order.
#[derive(Default)]
pub struct AgentSets {
    pub th: Vec<Agent>,
    pub lt: Vec<Agent>,
    pub sym: Vec<Agent>,
}

impl AgentSets {
    pub fn total(&self) -> usize {
        self.th.len() + self.lt.len() + self.sym.len()
    }

    /// Agents that apply the load rate: symmetric then throughput.
    pub fn loading_count(&self) -> usize {
        self.sym.len() + self.th.len()
    }

    /// Agents that report latency: symmetric then latency.
    pub fn measuring_count(&self) -> usize {
        self.sym.len() + self.lt.len()
    }

    pub fn loaders(&mut self) -> Vec<&mut Agent> {
        self.sym.iter_mut().chain(self.th.iter_mut()).collect()
    }

    pub fn latency_reporters(&mut self) -> Vec<&mut Agent> {
        self.lt.iter_mut().chain(self.sym.iter_mut()).collect()
    }

    pub fn all(&mut self) -> Vec<&mut Agent> {
        self.th
            .iter_mut()
            .chain(self.lt.iter_mut())
            .chain(self.sym.iter_mut())
            .collect()
    }

    pub fn th_only(&mut self) -> Vec<&mut Agent> {
        self.th.iter_mut().collect()
    }

    pub fn lt_only(&mut self) -> Vec<&mut Agent> {
        self.lt.iter_mut().collect()
    }
}
