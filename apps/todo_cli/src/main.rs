use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shared::domain::{SortDirection, SortField, TaskId};
use todo_core::{HttpRecordGateway, TodoController};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod render;
mod shell;

use config::{load_settings, Settings};
use render::render;

#[derive(Parser, Debug)]
#[command(name = "todo", about = "Keep a remote todo table in sync from the terminal")]
struct Args {
    #[arg(long)]
    base_id: Option<String>,
    #[arg(long)]
    table: Option<String>,
    #[arg(long)]
    token: Option<String>,
    #[arg(long)]
    api_root: Option<String>,
    /// title | createdTime
    #[arg(long)]
    sort_field: Option<SortField>,
    /// asc | desc
    #[arg(long)]
    direction: Option<SortDirection>,
    #[arg(long)]
    search: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print one page of open tasks.
    List {
        #[arg(long)]
        page: Option<String>,
    },
    Add {
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
    },
    Edit {
        id: String,
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
    },
    /// Toggle completion of a task.
    Complete { id: String },
    /// Interactive session with live refresh.
    Shell,
}

impl Args {
    fn apply_to(&self, settings: &mut Settings) {
        if let Some(v) = &self.base_id {
            settings.base_id = v.clone();
        }
        if let Some(v) = &self.table {
            settings.table_name = v.clone();
        }
        if let Some(v) = &self.token {
            settings.token = v.clone();
        }
        if let Some(v) = &self.api_root {
            settings.api_root = v.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let mut settings = load_settings()?;
    args.apply_to(&mut settings);
    settings.validate()?;

    let gateway = HttpRecordGateway::with_timeout(
        &settings.table_url(),
        settings.token.clone(),
        settings.request_timeout(),
    )
    .context("failed to build record store client")?;
    let controller = TodoController::new(Arc::new(gateway));
    info!("todo: store={}/{}", settings.base_id, settings.table_name);

    if let Some(field) = args.sort_field {
        controller.set_sort_field(field);
    }
    if let Some(direction) = args.direction {
        controller.set_sort_direction(direction);
    }
    if let Some(search) = &args.search {
        controller.set_query_string(search.trim());
    }

    let page_size = settings.items_per_page;
    let outcome = match args.command {
        Command::Shell => return shell::run(controller, page_size).await,
        Command::List { page } => {
            load(&controller).await;
            print!("{}", render(&controller.state(), page.as_deref(), page_size));
            return Ok(());
        }
        Command::Add { title } => {
            load(&controller).await;
            controller.add_todo(&title.join(" ")).await
        }
        Command::Edit { id, title } => {
            load(&controller).await;
            controller
                .update_todo(&TaskId::new(id), &title.join(" "))
                .await
        }
        Command::Complete { id } => {
            load(&controller).await;
            controller.complete_todo(&TaskId::new(id)).await
        }
    };

    print!("{}", render(&controller.state(), None, page_size));
    if let Some(status) = outcome.as_ref().err().and_then(|err| err.status()) {
        warn!("todo: store rejected the command status={status}");
    }
    let task = outcome.context("command failed")?;
    info!("todo: saved id={}", task.id);
    Ok(())
}

/// A failed fetch is not fatal here; it shows up in the error banner.
async fn load(controller: &TodoController) {
    if let Err(err) = controller.refresh().await {
        warn!("todo: initial fetch failed: {err}");
    }
}
