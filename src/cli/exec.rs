//! Exec command: run a command as a monitored job.
//!
//! A single argument is a shell string and goes through `sh -c`; several
//! arguments are an argv and are spawned directly, so quoting survives.
//! Stdout is inherited. Stderr is forwarded line by line as it arrives and its
//! last non-empty line is appended to the failure message so the service
//! shows why the job broke.

use std::process::{ExitStatus, Stdio};

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tracing::warn;

use cronpulse::{HeartbeatClient, JobWrapper, MonitorConfig};

pub(crate) async fn cmd_exec(
    config: &MonitorConfig,
    job_key: String,
    command: Vec<String>,
) -> Result<()> {
    let client = HeartbeatClient::from_config(job_key, config)?;
    let wrapper = JobWrapper::with_options(client, config.wrap.clone());
    wrapper.run(|| run_command(&command)).await?;
    Ok(())
}

fn build_command(command: &[String]) -> std::result::Result<Command, String> {
    match command {
        [] => Err("no command given".to_string()),
        [line] => {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(line);
            Ok(cmd)
        }
        [program, args @ ..] => {
            let mut cmd = Command::new(program);
            cmd.args(args);
            Ok(cmd)
        }
    }
}

/// Run `command` to completion. The error is the failure message to report.
pub(crate) async fn run_command(command: &[String]) -> std::result::Result<(), String> {
    let mut cmd = build_command(command)?;
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("failed to start command: {}", e))?;

    let mut last_line: Option<String> = None;
    if let Some(stderr) = child.stderr.take() {
        let mut lines = BufReader::new(stderr).lines();
        let mut out = tokio::io::stderr();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let _ = out.write_all(line.as_bytes()).await;
                    let _ = out.write_all(b"\n").await;
                    let trimmed = line.trim();
                    if !trimmed.is_empty() {
                        last_line = Some(trimmed.to_string());
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Stopped reading command stderr: {}", e);
                    break;
                }
            }
        }
    }

    let status = child
        .wait()
        .await
        .map_err(|e| format!("failed to wait for command: {}", e))?;

    if status.success() {
        Ok(())
    } else {
        Err(failure_message(status, last_line.as_deref()))
    }
}

fn failure_message(status: ExitStatus, last_stderr_line: Option<&str>) -> String {
    let reason = match status.code() {
        Some(code) => format!("exit status {}", code),
        None => "terminated by signal".to_string(),
    };
    match last_stderr_line {
        Some(last) => format!("{}: {}", reason, last),
        None => reason,
    }
}
