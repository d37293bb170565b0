//! Publish commands.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use roomcast_core::session::ADMINISTRATOR;
use roomcast_core::{Dispatch, Message, PublishRequest, RealtimeConfig, RequestContext};

use super::redis_publisher;

#[derive(Args)]
pub struct PublishArgs {
    /// Event name (defaults to task_progress inside a task, else global)
    #[arg(short, long)]
    pub event: Option<String>,

    /// JSON object payload
    #[arg(short, long)]
    pub message: Option<String>,

    /// Explicit room name
    #[arg(long)]
    pub room: Option<String>,

    /// Deliver to a user
    #[arg(long)]
    pub user: Option<String>,

    /// Deliver to watchers of a document (needs --docname)
    #[arg(long, requires = "docname")]
    pub doctype: Option<String>,

    /// Document name
    #[arg(long, requires = "doctype")]
    pub docname: Option<String>,

    /// Deliver to a task's progress room
    #[arg(long)]
    pub task_id: Option<String>,

    /// Publish as if running inside this background task
    #[arg(long)]
    pub in_task: Option<String>,

    /// Queue until the command finishes instead of publishing at once
    #[arg(long)]
    pub after_commit: bool,

    /// Session user for this publish
    #[arg(long, default_value = ADMINISTRATOR)]
    pub session_user: String,
}

#[derive(Args)]
pub struct ProgressArgs {
    /// Completion percentage
    pub percent: f64,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub doctype: Option<String>,

    #[arg(long)]
    pub docname: Option<String>,

    /// Publish as if running inside this background task
    #[arg(long)]
    pub in_task: Option<String>,

    /// User receiving the progress bar
    #[arg(long, default_value = ADMINISTRATOR)]
    pub session_user: String,
}

fn parse_message(raw: Option<&str>) -> Result<Option<Message>> {
    raw.map(|raw| serde_json::from_str::<Message>(raw).context("--message must be a JSON object"))
        .transpose()
}

fn context(config: &RealtimeConfig, user: &str, task: Option<String>) -> RequestContext {
    let ctx = RequestContext::new(config.site_name.clone()).with_user(user);
    match task {
        Some(task) => ctx.with_task(task),
        None => ctx,
    }
}

fn report(dispatch: Dispatch) {
    match dispatch {
        Dispatch::Sent | Dispatch::Deferred => {
            println!("{} Event {}", "✓".green().bold(), dispatch.as_str().cyan())
        }
        Dispatch::AlreadyQueued => println!("{} Event already queued", "•".yellow()),
        Dispatch::Dropped => println!(
            "{} Event dropped (broker unreachable, see logs)",
            "✗".red().bold()
        ),
    }
}

pub async fn execute_publish(args: PublishArgs, config: &RealtimeConfig) -> Result<()> {
    let publisher = redis_publisher(config)?;
    let mut ctx = context(config, &args.session_user, args.in_task);

    let request = PublishRequest {
        event: args.event,
        message: parse_message(args.message.as_deref())?,
        room: args.room,
        user: args.user,
        doctype: args.doctype,
        docname: args.docname,
        task_id: args.task_id,
        after_commit: args.after_commit,
    };

    let dispatch = publisher.publish_realtime(&mut ctx, request).await;
    report(dispatch);

    let flushed = ctx.commit(&publisher).await;
    if flushed > 0 {
        println!("{} Flushed {} deferred event(s)", "✓".green().bold(), flushed);
    }
    Ok(())
}

pub async fn execute_progress(args: ProgressArgs, config: &RealtimeConfig) -> Result<()> {
    let publisher = redis_publisher(config)?;
    let mut ctx = context(config, &args.session_user, args.in_task);

    let dispatch = publisher
        .publish_progress(
            &mut ctx,
            args.percent,
            args.title.as_deref(),
            args.doctype.as_deref(),
            args.docname.as_deref(),
            args.description.as_deref(),
        )
        .await;
    report(dispatch);
    Ok(())
}
