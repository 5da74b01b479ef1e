//! Pure state machine over [`SyncState`]. No I/O happens here; the
//! controller performs remote calls and dispatches the outcomes.

use shared::domain::{SortDirection, SortField, Task, TaskId};

use crate::query::ListQuery;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncState {
    pub todo_list: Vec<Task>,
    pub is_loading: bool,
    pub is_saving: bool,
    /// Empty means no error.
    pub error_message: String,
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
    /// Committed (debounced) search text.
    pub query_string: String,
    /// Tag of the most recently started fetch; older results are discarded.
    pub fetch_generation: u64,
}

impl SyncState {
    pub fn list_query(&self) -> ListQuery {
        ListQuery::new(self.sort_field, self.sort_direction, self.query_string.clone())
    }

    pub fn has_error(&self) -> bool {
        !self.error_message.is_empty()
    }

    pub fn find(&self, id: &TaskId) -> Option<&Task> {
        self.todo_list.iter().find(|task| &task.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    BeginFetch,
    FetchSucceeded { generation: u64, tasks: Vec<Task> },
    FetchFailed { generation: u64, message: String },
    BeginSave,
    CreateSucceeded(Task),
    OptimisticReplace(Vec<Task>),
    SaveFailed { message: String, revert_to: Vec<Task> },
    EndSave,
    ClearError,
    SetSortField(SortField),
    SetSortDirection(SortDirection),
    SetQueryString(String),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::BeginFetch => "begin_fetch",
            Self::FetchSucceeded { .. } => "fetch_succeeded",
            Self::FetchFailed { .. } => "fetch_failed",
            Self::BeginSave => "begin_save",
            Self::CreateSucceeded(_) => "create_succeeded",
            Self::OptimisticReplace(_) => "optimistic_replace",
            Self::SaveFailed { .. } => "save_failed",
            Self::EndSave => "end_save",
            Self::ClearError => "clear_error",
            Self::SetSortField(_) => "set_sort_field",
            Self::SetSortDirection(_) => "set_sort_direction",
            Self::SetQueryString(_) => "set_query_string",
        }
    }
}

pub fn reduce(mut state: SyncState, action: Action) -> SyncState {
    match action {
        Action::BeginFetch => {
            state.is_loading = true;
            state.fetch_generation += 1;
        }
        Action::FetchSucceeded { generation, tasks } => {
            if generation == state.fetch_generation {
                state.todo_list = tasks;
                state.is_loading = false;
            }
        }
        Action::FetchFailed {
            generation,
            message,
        } => {
            if generation == state.fetch_generation {
                state.error_message = message;
                state.is_loading = false;
            }
        }
        Action::BeginSave => {
            state.is_saving = true;
        }
        Action::CreateSucceeded(task) => {
            state.todo_list = upsert_task(std::mem::take(&mut state.todo_list), task);
            state.is_saving = false;
        }
        Action::OptimisticReplace(tasks) => {
            state.todo_list = tasks;
        }
        Action::SaveFailed { message, revert_to } => {
            state.error_message = message;
            state.todo_list = revert_to;
            state.is_saving = false;
        }
        Action::EndSave => {
            state.is_saving = false;
        }
        Action::ClearError => {
            state.error_message.clear();
        }
        Action::SetSortField(field) => {
            state.sort_field = field;
        }
        Action::SetSortDirection(direction) => {
            state.sort_direction = direction;
        }
        Action::SetQueryString(query) => {
            state.query_string = query;
        }
    }
    state
}

/// Copy of `tasks` with the row sharing `replacement.id` swapped out.
/// Rows with other ids keep their position and value.
pub fn replace_task(tasks: &[Task], replacement: &Task) -> Vec<Task> {
    tasks
        .iter()
        .map(|task| {
            if task.id == replacement.id {
                replacement.clone()
            } else {
                task.clone()
            }
        })
        .collect()
}

fn upsert_task(mut tasks: Vec<Task>, task: Task) -> Vec<Task> {
    match tasks.iter_mut().find(|existing| existing.id == task.id) {
        Some(existing) => *existing = task,
        None => tasks.push(task),
    }
    tasks
}

#[cfg(test)]
#[path = "tests/reducer_tests.rs"]
mod tests;
