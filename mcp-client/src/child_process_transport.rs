//! A transport that spawns an MCP server as a child process and speaks
//! newline-delimited JSON over its stdio. Grounded directly in the
//! `new_stdio_client` constructor this workspace's teacher crate used to
//! spawn and wire up a stdio-based server: same `kill_on_drop`, same
//! line-buffered reader, same "clear the environment, then repopulate it"
//! policy for the child's env.
use std::collections::HashMap;
use std::ffi::OsString;

use async_trait::async_trait;
use mcp_core::transport::Transport;
use mcp_core::transport::TransportError;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tokio::io::Lines;
use tokio::process::Child;
use tokio::process::ChildStderr;
use tokio::process::ChildStdin;
use tokio::process::ChildStdout;
use tokio::process::Command;

/// Environment variables passed through to the child regardless of the
/// caller-supplied `env` map, matching the minimal allowlist a subprocess
/// typically needs to run at all.
const DEFAULT_ENV_VARS: &[&str] = &["HOME", "PATH", "SHELL", "LANG", "LC_ALL", "TMPDIR"];

fn build_child_env(caller_env: Option<HashMap<String, String>>) -> HashMap<String, String> {
    let mut env: HashMap<String, String> = std::env::vars()
        .filter(|(key, _)| DEFAULT_ENV_VARS.contains(&key.as_str()))
        .collect();
    if let Some(caller_env) = caller_env {
        env.extend(caller_env);
    }
    env
}

pub struct ChildProcessTransport {
    child: Child,
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
}

impl ChildProcessTransport {
    pub async fn spawn(
        program: OsString,
        args: Vec<OsString>,
        env: Option<HashMap<String, String>>,
    ) -> std::io::Result<Self> {
        let mut child = Command::new(program)
            .args(args)
            .env_clear()
            .envs(build_child_env(env))
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| std::io::Error::other("failed to capture child stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("failed to capture child stdout"))?;
        let stderr = child.stderr.take();
        if let Some(stderr) = stderr {
            spawn_stderr_logger(stderr);
        }

        Ok(Self {
            child,
            stdin,
            lines: BufReader::new(stdout).lines(),
        })
    }

    pub fn child(&self) -> &Child {
        &self.child
    }
}

fn spawn_stderr_logger(stderr: ChildStderr) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            tracing::debug!(target: "mcp_server_stderr", "{line}");
        }
    });
}

#[async_trait]
impl Transport for ChildProcessTransport {
    async fn send(&mut self, frame: Vec<u8>) -> Result<(), TransportError> {
        self.stdin.write_all(&frame).await?;
        self.stdin.write_all(b"\n").await?;
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<Vec<u8>, TransportError>> {
        match self.lines.next_line().await {
            Ok(Some(line)) => Some(Ok(line.into_bytes())),
            Ok(None) => None,
            Err(err) => Some(Err(TransportError::Io(err))),
        }
    }
}
