//! Async task commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;

use roomcast_core::{AsyncTask, RealtimeConfig, TaskStatus, TaskStore};
use roomcast_db::tasks;

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Queue a new task
    Create(CreateTaskArgs),

    /// Change a task's status
    Status(StatusArgs),

    /// Show one task
    Show {
        /// Task name
        name: String,
    },

    /// List queued or running tasks for a document
    Pending {
        doctype: String,
        docname: String,
    },
}

#[derive(Args)]
pub struct CreateTaskArgs {
    /// Document type the task works on
    #[arg(long, requires = "docname")]
    pub doctype: Option<String>,

    /// Document name the task works on
    #[arg(long, requires = "doctype")]
    pub docname: Option<String>,
}

#[derive(Args)]
pub struct StatusArgs {
    /// Task name
    pub name: String,

    /// New status (queued, running, finished, failed)
    pub status: TaskStatus,
}

fn print_task(task: &AsyncTask) {
    let status = match task.status {
        TaskStatus::Queued => task.status.as_str().dimmed(),
        TaskStatus::Running => task.status.as_str().yellow(),
        TaskStatus::Finished => task.status.as_str().green(),
        TaskStatus::Failed => task.status.as_str().red(),
    };
    println!("{} {}", task.name.cyan().bold(), status);
    if let (Some(doctype), Some(docname)) = (&task.reference_doctype, &task.reference_name) {
        println!("{}: {} {}", "Reference".bold(), doctype, docname);
    }
    println!("{}: {}", "Created".bold(), task.created_at.to_rfc3339());
    println!("{}: {}", "Updated".bold(), task.updated_at.to_rfc3339());
}

pub async fn execute(cmd: TaskCommands, config: &RealtimeConfig) -> Result<()> {
    let pool = roomcast_db::init_pool(&config.db_path)?;

    match cmd {
        TaskCommands::Create(args) => {
            let task = tasks::create_task(&pool, args.doctype.as_deref(), args.docname.as_deref())?;
            println!("{} Queued task {}", "✓".green().bold(), task.name.cyan());
        }

        TaskCommands::Status(args) => {
            let task = tasks::set_status(&pool, &args.name, args.status)?;
            println!(
                "{} Task {} is now {}",
                "✓".green().bold(),
                task.name.dimmed(),
                task.status.as_str().cyan()
            );
        }

        TaskCommands::Show { name } => {
            let task = tasks::get_task(&pool, &name)?;
            print_task(&task);
        }

        TaskCommands::Pending { doctype, docname } => {
            let names = pool.pending_tasks_for_doc(&doctype, &docname).await?;
            if names.is_empty() {
                println!("{}", "No pending tasks.".dimmed());
            }
            for name in names {
                println!("{}", name);
            }
        }
    }

    Ok(())
}
