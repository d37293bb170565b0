//! Web server command.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::sync::Arc;

use roomcast_core::{RealtimeConfig, SubscriptionGuard};
use roomcast_redis::RedisSessionStore;
use roomcast_web::AppState;

use super::redis_publisher;

#[derive(Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(long, default_value = "3030")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
}

pub async fn execute(args: ServeArgs, config: &RealtimeConfig) -> Result<()> {
    let tasks = Arc::new(roomcast_db::init_pool(&config.db_path)?);
    let sessions = Arc::new(RedisSessionStore::new(&config.redis_cache)?);
    let guard = SubscriptionGuard::new(Arc::new(config.static_permissions()))
        .with_ci_bypass(config.ci_bypass);

    let state = AppState::new(
        config.site_name.clone(),
        redis_publisher(config)?,
        sessions,
        guard,
        tasks,
    );

    println!();
    println!("  {} {}", "Roomcast".cyan().bold(), "Web Server".bold());
    println!();
    println!("  {}      {}", "Site".green(), config.site_name);
    println!("  {}    {}", "Broker".green(), config.redis_socketio);
    println!(
        "  {}   http://{}:{}/api/method",
        "Methods".green(),
        args.host,
        args.port
    );
    if config.ci_bypass {
        println!(
            "  {}",
            "CI mode: document subscription checks are bypassed".yellow()
        );
    }
    println!();
    println!("  {}", "Ctrl+C to stop".dimmed());
    println!();

    roomcast_web::run_server(state, &args.host, args.port).await?;

    Ok(())
}
