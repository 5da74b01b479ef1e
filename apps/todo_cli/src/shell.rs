//! Line-oriented interactive session over a running controller.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use anyhow::Result;
use shared::domain::{SortDirection, SortField, TaskId};
use tokio::io::{AsyncBufReadExt, BufReader};
use todo_core::{ListView, PageRoute, QueryDebouncer, SyncError, SyncState, TodoController};
use tracing::debug;

use crate::render::render;

const HELP: &str = "\
commands:
  add <title>            create a task
  edit <id> <title>      rename a task
  done <id>              toggle completion
  search <text>          filter by title (applied after typing pauses)
  clear                  drop the search filter
  sort <field> [dir]     field: title | createdTime, dir: asc | desc
  page <n> | next | prev move between pages
  dismiss                clear the error banner
  show                   print the current page
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Add(String),
    Edit { id: TaskId, title: String },
    Done(TaskId),
    Search(String),
    Clear,
    Sort {
        field: SortField,
        direction: Option<SortDirection>,
    },
    Page(String),
    Next,
    Prev,
    Dismiss,
    Show,
    Help,
    Quit,
}

impl ShellCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();

        match verb {
            "add" => Ok(Self::Add(rest.to_string())),
            "edit" => {
                let (id, title) = rest
                    .split_once(' ')
                    .ok_or_else(|| "usage: edit <id> <title>".to_string())?;
                Ok(Self::Edit {
                    id: TaskId::new(id),
                    title: title.trim().to_string(),
                })
            }
            "done" if !rest.is_empty() => Ok(Self::Done(TaskId::new(rest))),
            "done" => Err("usage: done <id>".to_string()),
            // Search text is taken verbatim, including inner spaces.
            "search" => Ok(Self::Search(rest.to_string())),
            "clear" => Ok(Self::Clear),
            "sort" => {
                let mut parts = rest.split_whitespace();
                let field = parts
                    .next()
                    .ok_or_else(|| "usage: sort <field> [dir]".to_string())?
                    .parse::<SortField>()
                    .map_err(|err| err.to_string())?;
                let direction = parts
                    .next()
                    .map(str::parse::<SortDirection>)
                    .transpose()
                    .map_err(|err| err.to_string())?;
                Ok(Self::Sort { field, direction })
            }
            "page" if !rest.is_empty() => Ok(Self::Page(rest.to_string())),
            "page" => Err("usage: page <n>".to_string()),
            "next" => Ok(Self::Next),
            "prev" => Ok(Self::Prev),
            "dismiss" => Ok(Self::Dismiss),
            "show" | "" => Ok(Self::Show),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(format!("unknown command '{other}'; type `help`")),
        }
    }
}

pub async fn run(controller: Arc<TodoController>, page_size: usize) -> Result<()> {
    let read_path = controller.spawn_read_path();
    let search = QueryDebouncer::new(Arc::clone(&controller));
    let current_page = Arc::new(AtomicUsize::new(1));
    let printer =
        spawn_fetch_printer(Arc::clone(&controller), Arc::clone(&current_page), page_size);

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match ShellCommand::parse(&line) {
            Ok(command) => command,
            Err(usage) => {
                println!("{usage}");
                continue;
            }
        };
        debug!(command = ?command, "shell command");

        let outcome = match command {
            ShellCommand::Quit => break,
            ShellCommand::Help => {
                println!("{HELP}");
                continue;
            }
            ShellCommand::Add(title) => controller.add_todo(&title).await.map(drop),
            ShellCommand::Edit { id, title } => {
                controller.update_todo(&id, &title).await.map(drop)
            }
            ShellCommand::Done(id) => controller.complete_todo(&id).await.map(drop),
            ShellCommand::Search(text) => {
                search.input(text);
                Ok(())
            }
            ShellCommand::Clear => {
                search.clear();
                Ok(())
            }
            ShellCommand::Sort { field, direction } => {
                controller.set_sort_field(field);
                if let Some(direction) = direction {
                    controller.set_sort_direction(direction);
                }
                Ok(())
            }
            ShellCommand::Page(raw) => {
                let state = controller.state();
                let view = ListView::derive(&state.todo_list, Some(raw.as_str()), page_size);
                current_page.store(view.pager.current, Ordering::SeqCst);
                print!("{}", render(&state, Some(raw.as_str()), page_size));
                continue;
            }
            ShellCommand::Next => {
                step_page(&controller, &current_page, page_size, true);
                Ok(())
            }
            ShellCommand::Prev => {
                step_page(&controller, &current_page, page_size, false);
                Ok(())
            }
            ShellCommand::Dismiss => {
                controller.dismiss_error();
                Ok(())
            }
            ShellCommand::Show => Ok(()),
        };

        if let Err(err) = outcome {
            report(&err);
        }
        print!("{}", render_current(&controller.state(), &current_page, page_size));
    }

    printer.abort();
    read_path.abort();
    Ok(())
}

fn step_page(
    controller: &TodoController,
    current_page: &AtomicUsize,
    page_size: usize,
    forward: bool,
) {
    let state = controller.state();
    let page = current_page.load(Ordering::SeqCst).to_string();
    let pager = ListView::derive(&state.todo_list, Some(page.as_str()), page_size).pager;
    let target = if forward { pager.next() } else { pager.previous() };
    match target {
        Some(target) => current_page.store(target, Ordering::SeqCst),
        None => println!("no page in that direction"),
    }
}

/// Renders the stored page. A page that no longer exists is replaced by its
/// redirect target, so the notice is printed once.
fn render_current(state: &SyncState, current_page: &AtomicUsize, page_size: usize) -> String {
    let raw = current_page.load(Ordering::SeqCst).to_string();
    let view = ListView::derive(&state.todo_list, Some(raw.as_str()), page_size);
    if let PageRoute::Redirect(target) = view.route {
        debug!("shell: page {raw} gone, moving to page {target}");
        current_page.store(target, Ordering::SeqCst);
    }
    render(state, Some(raw.as_str()), page_size)
}

fn report(err: &SyncError) {
    if err.is_validation() {
        println!("{err}");
    }
    // Remote failures already show up in the rendered banner.
}

/// Prints the page again whenever a background fetch lands.
fn spawn_fetch_printer(
    controller: Arc<TodoController>,
    current_page: Arc<AtomicUsize>,
    page_size: usize,
) -> tokio::task::JoinHandle<()> {
    let mut snapshots = controller.subscribe();
    tokio::spawn(async move {
        let mut was_loading = false;
        while snapshots.changed().await.is_ok() {
            let state = snapshots.borrow_and_update().clone();
            if was_loading && !state.is_loading {
                print!("{}", render_current(&state, &current_page, page_size));
            }
            was_loading = state.is_loading;
        }
    })
}

#[cfg(test)]
#[path = "tests/shell_tests.rs"]
mod tests;
