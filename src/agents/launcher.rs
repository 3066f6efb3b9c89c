use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::info;

use crate::error::{AppError, AppResult, ExperimentError};

/// A running agent process on a remote host.
///
/// The ssh child is killed when the session drops; sessions are held for the
/// whole coordinator lifetime. The remote streams are forwarded to our own
/// stdout/stderr and never interpreted.
pub struct AgentSession {
    host: String,
    _child: Child,
}

impl AgentSession {
    pub fn host(&self) -> &str {
        &self.host
    }
}

const REMOTE_AGENT_BIN: &str = "agent";

fn remote_command(args: &str) -> String {
    let user = std::env::var("USER").unwrap_or_else(|_| "root".to_owned());
    format!(
        "sudo bash -c 'ulimit -c unlimited && /tmp/{}/loadctl/{} {}'",
        user, REMOTE_AGENT_BIN, args
    )
}

/// Starts an agent on `host` over ssh with the given argument string.
pub async fn launch(host: &str, private_key: &str, args: &str) -> AppResult<AgentSession> {
    let command = remote_command(args);
    info!("launching agent on {}: {}", host, command);
    let child = Command::new("ssh")
        .arg("-i")
        .arg(private_key)
        .arg("-o")
        .arg("StrictHostKeyChecking=no")
        .arg(host)
        .arg(&command)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .map_err(|err| {
            AppError::experiment(ExperimentError::Launch {
                host: host.to_owned(),
                source: err,
            })
        })?;
    Ok(AgentSession {
        host: host.to_owned(),
        _child: child,
    })
}
