//! CronPulse - lifecycle pings for scheduled jobs

pub mod config;
pub mod error;
pub mod monitor;

pub use config::MonitorConfig;
pub use error::{PulseError, Result};
pub use monitor::{wrap, wrap_with_config, HeartbeatClient, JobWrapper};
