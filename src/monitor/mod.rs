//! Job lifecycle monitoring: heartbeat client, transport and job wrapper.

mod client;
mod state;
mod transport;
mod wrapper;

pub use client::HeartbeatClient;
pub use state::{LifecycleState, PingRequest};
pub use transport::{HttpTransport, Transport};
pub use wrapper::{wrap, wrap_with_config, JobWrapper, RunPingFailure, WrapOptions};
