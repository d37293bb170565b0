//! CLI command definitions and handlers.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use roomcast_core::{Publisher, RealtimeConfig};
use roomcast_redis::RedisBroker;

pub mod publish;
pub mod serve;
pub mod task;

/// Roomcast - realtime event publisher
#[derive(Parser)]
#[command(name = "roomcast")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true, env = "ROOMCAST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve(serve::ServeArgs),

    /// Publish a realtime event
    Publish(publish::PublishArgs),

    /// Publish a progress update
    Progress(publish::ProgressArgs),

    /// Async task table
    #[command(subcommand)]
    Task(task::TaskCommands),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = RealtimeConfig::load(self.config.as_deref())?;
        debug!(
            site = %config.site_name,
            broker = %config.redis_socketio,
            ci_bypass = config.ci_bypass,
            "Configuration loaded"
        );

        match self.command {
            Commands::Serve(args) => serve::execute(args, &config).await,
            Commands::Publish(args) => publish::execute_publish(args, &config).await,
            Commands::Progress(args) => publish::execute_progress(args, &config).await,
            Commands::Task(cmd) => task::execute(cmd, &config).await,
        }
    }
}

/// Publisher writing to the configured socketio broker.
pub fn redis_publisher(config: &RealtimeConfig) -> Result<Publisher> {
    let broker = RedisBroker::new(&config.redis_socketio)?;
    Ok(Publisher::new(Arc::new(broker)))
}
