//! Slices of the task list shown to the presentation layer. Sorting already
//! happened on the store side; nothing here reorders tasks.

use shared::domain::Task;

pub const ITEMS_PER_PAGE: usize = 15;
pub const EMPTY_LIST_HINT: &str = "Add todo above to get started";

pub fn visible(tasks: &[Task]) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| !task.is_completed)
        .cloned()
        .collect()
}

/// One-based page of `items`; out-of-range pages are empty.
pub fn page<T>(items: &[T], page_number: usize, page_size: usize) -> &[T] {
    if page_number == 0 || page_size == 0 {
        return &[];
    }
    let start = (page_number - 1).saturating_mul(page_size).min(items.len());
    let end = page_number.saturating_mul(page_size).min(items.len());
    &items[start..end]
}

pub fn total_pages(item_count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    item_count.div_ceil(page_size)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRoute {
    Show(usize),
    /// The requested page does not exist; navigate to the contained page.
    Redirect(usize),
}

impl PageRoute {
    pub fn page(self) -> usize {
        match self {
            Self::Show(page) | Self::Redirect(page) => page,
        }
    }
}

/// Resolves the `page` route parameter. A missing parameter is page 1.
pub fn resolve_page(raw: Option<&str>, total_pages: usize) -> PageRoute {
    let Some(raw) = raw else {
        return PageRoute::Show(1);
    };
    if total_pages == 0 {
        return PageRoute::Show(1);
    }
    let Ok(requested) = raw.trim().parse::<usize>() else {
        return PageRoute::Redirect(1);
    };
    if (1..=total_pages).contains(&requested) {
        PageRoute::Show(requested)
    } else {
        PageRoute::Redirect(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    pub current: usize,
    pub total: usize,
}

impl Pager {
    pub fn has_previous(&self) -> bool {
        self.current > 1
    }

    pub fn has_next(&self) -> bool {
        self.current < self.total
    }

    pub fn previous(&self) -> Option<usize> {
        self.has_previous().then(|| self.current - 1)
    }

    pub fn next(&self) -> Option<usize> {
        self.has_next().then(|| self.current + 1)
    }

    pub fn label(&self) -> String {
        format!("Page {} of {}", self.current, self.total)
    }
}

/// Everything a renderer needs for one page of open tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListView {
    pub tasks: Vec<Task>,
    pub pager: Pager,
    pub route: PageRoute,
}

impl ListView {
    pub fn derive(tasks: &[Task], raw_page: Option<&str>, page_size: usize) -> Self {
        let open = visible(tasks);
        let total = total_pages(open.len(), page_size);
        let route = resolve_page(raw_page, total);
        let current = route.page();
        Self {
            tasks: page(&open, current, page_size).to_vec(),
            pager: Pager { current, total },
            route,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
