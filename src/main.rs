use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cronpulse::monitor::RunPingFailure;
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(name = "cronpulse")]
#[command(about = "Lifecycle pings for scheduled jobs", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.cronpulse/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Monitoring service origin, overrides config and environment
    #[arg(long, global = true)]
    base_url: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a single lifecycle ping
    Ping {
        /// Job identifier registered with the service
        job_key: String,
        /// One of: run, complete, failed
        state: String,
        /// Failure message (only used with `failed`)
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Run a command wrapped in run/complete/failed pings
    Exec {
        /// Job identifier registered with the service
        job_key: String,
        /// Exit non-zero when the command fails
        #[arg(long)]
        reraise: bool,
        /// Report an undeliverable `run` ping as a job failure instead of aborting
        #[arg(long)]
        report_run_failure: bool,
        /// Program and arguments, or a single shell string for `sh -c`
        #[arg(trailing_var_arg = true, required = true)]
        command: Vec<String>,
    },
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so `ping` output stays clean on stdout
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cronpulse=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) | None => {
            println!("cronpulse {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Ping {
            job_key,
            state,
            message,
        }) => {
            let config = cli::load_config(cli.config.as_deref(), cli.base_url)?;
            cli::ping::cmd_ping(&config, job_key, state, message).await?;
        }
        Some(Commands::Exec {
            job_key,
            reraise,
            report_run_failure,
            command,
        }) => {
            let mut config = cli::load_config(cli.config.as_deref(), cli.base_url)?;
            if reraise {
                config.wrap.reraise_job_errors = true;
            }
            if report_run_failure {
                config.wrap.on_run_ping_failure = RunPingFailure::ReportAsFailure;
            }
            cli::exec::cmd_exec(&config, job_key, command).await?;
        }
    }

    Ok(())
}
