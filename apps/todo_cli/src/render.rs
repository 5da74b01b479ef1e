use std::fmt::Write as _;

use todo_core::{view::EMPTY_LIST_HINT, ListView, PageRoute, SyncState};

/// Text rendering of one page of open tasks plus status lines.
pub fn render(state: &SyncState, raw_page: Option<&str>, page_size: usize) -> String {
    let view = ListView::derive(&state.todo_list, raw_page, page_size);
    let mut out = String::new();

    if state.has_error() {
        let _ = writeln!(out, "! {}  (run `dismiss` to clear)", state.error_message);
    }
    if let (PageRoute::Redirect(page), Some(raw)) = (view.route, raw_page) {
        let _ = writeln!(out, "page {raw} does not exist; showing page {page}");
    }
    if state.is_loading {
        let _ = writeln!(out, "loading...");
    }

    if view.is_empty() {
        let _ = writeln!(out, "{EMPTY_LIST_HINT}");
    } else {
        for task in &view.tasks {
            let _ = writeln!(out, "[ ] {}  ({})", task.title, task.id);
        }
    }

    let _ = write!(out, "{}", view.pager.label());
    if view.pager.has_previous() {
        out.push_str("  <prev");
    }
    if view.pager.has_next() {
        out.push_str("  next>");
    }
    if state.is_saving {
        out.push_str("  saving...");
    }
    out.push('\n');
    out
}
