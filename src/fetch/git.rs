//! `git clone` through the system git client

use super::RepositoryFetcher;
use crate::config::CloneConfig;
use crate::domain::{GraderError, GraderResult};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Fetcher that shells out to a git executable
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
    deadline: Duration,
}

impl GitCli {
    pub fn new(program: impl Into<String>, deadline: Duration) -> Self {
        Self {
            program: program.into(),
            deadline,
        }
    }

    pub fn from_config(config: &CloneConfig) -> Self {
        Self::new(config.program.clone(), Duration::from_secs(config.timeout_secs))
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::from_config(&CloneConfig::default())
    }
}

#[async_trait]
impl RepositoryFetcher for GitCli {
    async fn fetch(&self, url: &str, destination: &Path) -> GraderResult<()> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("clone")
            .arg("--quiet")
            .arg("--")
            .arg(url)
            .arg(destination)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // a timed-out clone is dropped mid-flight and must not outlive the run
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| {
            GraderError::clone_failed(format!("failed to start '{}': {}", self.program, e))
        })?;

        let output = match timeout(self.deadline, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| {
                GraderError::clone_failed(format!("failed to wait on '{}': {}", self.program, e))
            })?,
            Err(_) => {
                return Err(GraderError::clone_failed(format!(
                    "timed out after {:?}",
                    self.deadline
                )))
            }
        };

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let detail = if stderr.is_empty() {
            format!("{} exited with {}", self.program, output.status)
        } else {
            stderr
        };

        Err(GraderError::clone_failed(detail))
    }
}
