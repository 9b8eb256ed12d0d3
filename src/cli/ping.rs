//! Ping command: send one lifecycle ping and print the response body.

use anyhow::{Context, Result};

use cronpulse::{HeartbeatClient, MonitorConfig};

pub(crate) async fn cmd_ping(
    config: &MonitorConfig,
    job_key: String,
    state: String,
    message: Option<String>,
) -> Result<()> {
    let client = HeartbeatClient::from_config(job_key, config)?;
    let body = client
        .ping(&state, message.as_deref())
        .await
        .with_context(|| format!("Failed to send '{}' ping", state))?;
    println!("{}", body);
    Ok(())
}
