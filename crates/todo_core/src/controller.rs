//! Owns [`SyncState`] and runs the commands that touch the remote store.
//!
//! Every command follows the same order: local dispatch, then the gateway
//! call, then the settling dispatch. Nothing here reorders those steps.

use std::sync::Arc;

use shared::{
    domain::{SortDirection, SortField, Task, TaskId},
    protocol::TaskPatch,
};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    error::SyncError,
    gateway::RecordGateway,
    query::ListQuery,
    reducer::{reduce, replace_task, Action, SyncState},
};

pub struct TodoController {
    gateway: Arc<dyn RecordGateway>,
    state: watch::Sender<SyncState>,
}

impl TodoController {
    pub fn new(gateway: Arc<dyn RecordGateway>) -> Arc<Self> {
        let (state, _) = watch::channel(SyncState::default());
        Arc::new(Self { gateway, state })
    }

    pub fn state(&self) -> SyncState {
        self.state.borrow().clone()
    }

    /// Receives a snapshot after every dispatched action.
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    pub fn dispatch(&self, action: Action) -> SyncState {
        self.dispatch_with(|_| action)
    }

    /// Builds the action from the current state and applies it in one step,
    /// so no other dispatch can land in between.
    fn dispatch_with(&self, build: impl FnOnce(&SyncState) -> Action) -> SyncState {
        self.try_dispatch_with(|state| Some(build(state)))
            .unwrap_or_else(|| self.state())
    }

    /// Like `dispatch_with`, but `None` leaves the state untouched and
    /// notifies nobody.
    fn try_dispatch_with(
        &self,
        build: impl FnOnce(&SyncState) -> Option<Action>,
    ) -> Option<SyncState> {
        let mut next = None;
        self.state.send_if_modified(|state| {
            let Some(action) = build(state) else {
                return false;
            };
            debug!(action = action.name(), "dispatch");
            *state = reduce(std::mem::take(state), action);
            next = Some(state.clone());
            true
        });
        next
    }

    pub fn set_sort_field(&self, field: SortField) {
        self.dispatch(Action::SetSortField(field));
    }

    pub fn set_sort_direction(&self, direction: SortDirection) {
        self.dispatch(Action::SetSortDirection(direction));
    }

    pub fn set_query_string(&self, query: impl Into<String>) {
        self.dispatch(Action::SetQueryString(query.into()));
    }

    pub fn dismiss_error(&self) {
        self.dispatch(Action::ClearError);
    }

    /// Fetches the list for the current view parameters.
    pub async fn refresh(&self) -> Result<(), SyncError> {
        let query = self.state.borrow().list_query();
        self.fetch(query).await
    }

    async fn fetch(&self, query: ListQuery) -> Result<(), SyncError> {
        let generation = self.dispatch(Action::BeginFetch).fetch_generation;
        self.fetch_tagged(query, generation).await
    }

    /// Runs a fetch whose `BeginFetch` was already dispatched as `generation`.
    async fn fetch_tagged(&self, query: ListQuery, generation: u64) -> Result<(), SyncError> {
        let url = query.encode(self.gateway.base_url());
        match self.gateway.list(&url).await {
            Ok(tasks) => {
                info!("sync: fetched generation={generation} count={}", tasks.len());
                self.dispatch(Action::FetchSucceeded { generation, tasks });
                Ok(())
            }
            Err(err) => {
                warn!("sync: fetch failed generation={generation} error={err}");
                self.dispatch(Action::FetchFailed {
                    generation,
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Starts the read path: one fetch immediately, then one per change of
    /// the list query. A fetch takes its generation when the loop sees the
    /// query, before the request is spawned. Fetches are not awaited in
    /// order; the reducer drops results from superseded generations.
    pub fn spawn_read_path(self: &Arc<Self>) -> JoinHandle<()> {
        let mut snapshots = self.subscribe();
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            let mut last_query: Option<ListQuery> = None;
            loop {
                let query = snapshots.borrow_and_update().list_query();
                if last_query.as_ref() != Some(&query) {
                    debug!(query = ?query, "read path: query changed");
                    last_query = Some(query.clone());
                    let generation = controller.dispatch(Action::BeginFetch).fetch_generation;
                    let controller = Arc::clone(&controller);
                    tokio::spawn(async move {
                        // Already in state and logged by the fetch itself.
                        if let Err(err) = controller.fetch_tagged(query, generation).await {
                            debug!("read path: fetch generation={generation} ended error={err}");
                        }
                    });
                }
                if snapshots.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    pub async fn add_todo(&self, title: &str) -> Result<Task, SyncError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(SyncError::validation("title must not be empty"));
        }

        self.dispatch(Action::BeginSave);
        match self.gateway.create(title).await {
            Ok(task) => {
                info!("sync: created id={}", task.id);
                self.dispatch(Action::CreateSucceeded(task.clone()));
                Ok(task)
            }
            Err(err) => {
                warn!("sync: create failed error={err}");
                let message = err.to_string();
                // No optimistic row was added, so the revert target is the list as it stands.
                self.dispatch_with(|state| Action::SaveFailed {
                    message,
                    revert_to: state.todo_list.clone(),
                });
                Err(err)
            }
        }
    }

    pub async fn update_todo(&self, id: &TaskId, new_title: &str) -> Result<Task, SyncError> {
        let new_title = new_title.trim();
        if new_title.is_empty() {
            return Err(SyncError::validation("title must not be empty"));
        }
        self.run_optimistic_edit(id, |original| {
            let edited = Task {
                title: new_title.to_string(),
                ..original.clone()
            };
            let patch = TaskPatch::title(new_title).with_completion(original.is_completed);
            (edited, patch)
        })
        .await
    }

    pub async fn complete_todo(&self, id: &TaskId) -> Result<Task, SyncError> {
        self.run_optimistic_edit(id, |original| {
            let toggled = !original.is_completed;
            let edited = Task {
                is_completed: toggled,
                ..original.clone()
            };
            (edited, TaskPatch::completion(toggled))
        })
        .await
    }

    /// Shared path for edits of an existing row: apply locally, send the
    /// patch, then reconcile with the store's copy or restore `original`.
    async fn run_optimistic_edit<F>(&self, id: &TaskId, edit: F) -> Result<Task, SyncError>
    where
        F: FnOnce(&Task) -> (Task, TaskPatch),
    {
        let mut captured = None;
        self.try_dispatch_with(|state| {
            let original = state.find(id)?;
            let (edited, patch) = edit(original);
            captured = Some((original.clone(), patch));
            Some(Action::OptimisticReplace(replace_task(
                &state.todo_list,
                &edited,
            )))
        });
        let Some((original, patch)) = captured else {
            warn!("sync: edit skipped, unknown id={id}");
            return Err(SyncError::UnknownTask(id.clone()));
        };

        self.dispatch(Action::BeginSave);
        let outcome = match self.gateway.update(id, patch).await {
            Ok(saved) => {
                info!("sync: updated id={id}");
                self.dispatch_with(|state| {
                    Action::OptimisticReplace(replace_task(&state.todo_list, &saved))
                });
                Ok(saved)
            }
            Err(err) => {
                warn!("sync: update failed id={id} error={err}; restoring original");
                let message = err.to_string();
                self.dispatch_with(|state| Action::SaveFailed {
                    message,
                    revert_to: replace_task(&state.todo_list, &original),
                });
                Err(err)
            }
        };
        self.dispatch(Action::EndSave);
        outcome
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
