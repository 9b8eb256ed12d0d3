//! Job wrapper: surrounds a unit of work with lifecycle pings.
//!
//! One invocation sends `run`, executes the work, then sends `complete` or
//! `failed`; a panic in the work counts as a failure carrying the panic
//! message. Pings are strictly sequential. By default the work's error is
//! reported and then swallowed, so callers see `Ok(())` for both outcomes;
//! set [`WrapOptions::reraise_job_errors`] to get [`PulseError::JobFailed`]
//! back instead.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::MonitorConfig;
use crate::error::{PulseError, Result};

use super::client::HeartbeatClient;

/// What to do when the initial `run` ping cannot be delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPingFailure {
    /// Return the ping error without executing the work.
    #[default]
    Abort,
    /// Skip the work and send `failed` carrying the ping error's text, as if
    /// the job itself had failed.
    ReportAsFailure,
}

/// Policies for wrapped jobs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WrapOptions {
    pub on_run_ping_failure: RunPingFailure,
    /// Return [`PulseError::JobFailed`] after the `failed` ping instead of
    /// `Ok(())`.
    pub reraise_job_errors: bool,
}

/// Runs work between lifecycle pings for one job.
#[derive(Debug, Clone)]
pub struct JobWrapper {
    client: HeartbeatClient,
    options: WrapOptions,
}

impl JobWrapper {
    pub fn new(client: HeartbeatClient) -> Self {
        Self::with_options(client, WrapOptions::default())
    }

    pub fn with_options(client: HeartbeatClient, options: WrapOptions) -> Self {
        Self { client, options }
    }

    pub fn client(&self) -> &HeartbeatClient {
        &self.client
    }

    pub fn options(&self) -> &WrapOptions {
        &self.options
    }

    /// Execute `work` once, reporting its outcome.
    ///
    /// Errors returned here come from the pings themselves (or from a
    /// re-raised job failure); the work's own error is otherwise consumed.
    pub async fn run<F, Fut, E>(&self, work: F) -> Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<(), E>>,
        E: fmt::Display,
    {
        let job_key = self.client.job_key();
        let started_at = chrono::Local::now();
        let start = Instant::now();
        info!(job_key, started_at = %started_at.to_rfc3339(), "Job started");

        let result = self.execute(work).await;

        let elapsed_ms = start.elapsed().as_millis() as u64;
        info!(job_key, elapsed_ms, "Job execution time: {} ms", elapsed_ms);
        result
    }

    async fn execute<F, Fut, E>(&self, work: F) -> Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<(), E>>,
        E: fmt::Display,
    {
        let job_key = self.client.job_key();

        if let Err(e) = self.client.run().await {
            return match self.options.on_run_ping_failure {
                RunPingFailure::Abort => {
                    error!(job_key, "Run ping failed, job not started: {}", e);
                    Err(e)
                }
                RunPingFailure::ReportAsFailure => {
                    error!(job_key, "Run ping failed, reporting as job failure: {}", e);
                    self.report_failure(e.to_string()).await
                }
            };
        }

        // A panic in the work is a job failure like any returned error.
        let outcome = AssertUnwindSafe(async move { work().await })
            .catch_unwind()
            .await;
        let message = match outcome {
            Ok(Ok(())) => {
                self.client.complete().await?;
                return Ok(());
            }
            Ok(Err(e)) => {
                let message = e.to_string();
                error!(job_key, "Job failed: {}", message);
                message
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(job_key, "Job panicked: {}", message);
                message
            }
        };
        self.report_failure(message).await
    }

    async fn report_failure(&self, message: String) -> Result<()> {
        self.client.failed(&message).await?;
        if self.options.reraise_job_errors {
            Err(PulseError::JobFailed(message))
        } else {
            Ok(())
        }
    }

    /// Turn `work` into a reusable operation; each call is one monitored
    /// invocation.
    pub fn into_operation<F, Fut, E>(
        self,
        work: F,
    ) -> impl Fn() -> BoxFuture<'static, Result<()>> + Clone + Send + Sync
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<(), E>> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let wrapper = Arc::new(self);
        let work = Arc::new(work);
        move || {
            let wrapper = Arc::clone(&wrapper);
            let work = Arc::clone(&work);
            async move { wrapper.run(|| (*work)()).await }.boxed()
        }
    }
}

/// Text reported for a panicking job.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "job panicked".to_string()
    }
}

/// Wrap `work` for `job_key` against the default service with default
/// policies.
pub fn wrap<F, Fut, E>(
    job_key: impl Into<String>,
    work: F,
) -> Result<impl Fn() -> BoxFuture<'static, Result<()>> + Clone + Send + Sync>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<(), E>> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    wrap_with_config(job_key, &MonitorConfig::default(), work)
}

/// Wrap `work` for `job_key` using the service, transport settings and
/// policies in `config`.
pub fn wrap_with_config<F, Fut, E>(
    job_key: impl Into<String>,
    config: &MonitorConfig,
    work: F,
) -> Result<impl Fn() -> BoxFuture<'static, Result<()>> + Clone + Send + Sync>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<(), E>> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    let client = HeartbeatClient::from_config(job_key, config)?;
    Ok(JobWrapper::with_options(client, config.wrap.clone()).into_operation(work))
}
