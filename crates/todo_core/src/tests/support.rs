//! In-memory record store used by controller and debounce tests.

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use shared::{
    domain::{Task, TaskId},
    protocol::TaskPatch,
};
use tokio::sync::Notify;
use url::Url;

use crate::{error::SyncError, gateway::RecordGateway};

pub struct FakeGateway {
    base_url: Url,
    records: Mutex<Vec<Task>>,
    list_urls: Mutex<Vec<Url>>,
    updates: Mutex<Vec<(TaskId, TaskPatch)>>,
    failing_ids: Mutex<HashSet<TaskId>>,
    fail_creates: Option<u16>,
    fail_lists: Option<u16>,
    list_delay: Option<Duration>,
    held_id: Option<TaskId>,
    pub release: Notify,
    next_id: AtomicUsize,
}

impl FakeGateway {
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            base_url: Url::parse("https://store.test/v0/appBase/Todos").expect("url"),
            records: Mutex::new(tasks),
            list_urls: Mutex::new(Vec::new()),
            updates: Mutex::new(Vec::new()),
            failing_ids: Mutex::new(HashSet::new()),
            fail_creates: None,
            fail_lists: None,
            list_delay: None,
            held_id: None,
            release: Notify::new(),
            next_id: AtomicUsize::new(1),
        }
    }

    pub fn failing_creates(mut self, status: u16) -> Self {
        self.fail_creates = Some(status);
        self
    }

    pub fn failing_lists(mut self, status: u16) -> Self {
        self.fail_lists = Some(status);
        self
    }

    /// Lists answer only after `delay`.
    pub fn slow_lists(mut self, delay: Duration) -> Self {
        self.list_delay = Some(delay);
        self
    }

    pub fn failing_updates_for(self, id: &str) -> Self {
        self.failing_ids
            .lock()
            .expect("lock")
            .insert(TaskId::new(id));
        self
    }

    /// Updates for `id` wait on `release` before answering.
    pub fn holding_updates_for(mut self, id: &str) -> Self {
        self.held_id = Some(TaskId::new(id));
        self
    }

    pub fn list_urls(&self) -> Vec<Url> {
        self.list_urls.lock().expect("lock").clone()
    }

    pub fn updates(&self) -> Vec<(TaskId, TaskPatch)> {
        self.updates.lock().expect("lock").clone()
    }

    pub fn records(&self) -> Vec<Task> {
        self.records.lock().expect("lock").clone()
    }

    fn failure(status: u16) -> SyncError {
        SyncError::Remote {
            status,
            message: "boom".to_string(),
        }
    }
}

#[async_trait]
impl RecordGateway for FakeGateway {
    fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn list(&self, url: &Url) -> Result<Vec<Task>, SyncError> {
        self.list_urls.lock().expect("lock").push(url.clone());
        if let Some(delay) = self.list_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(status) = self.fail_lists {
            return Err(Self::failure(status));
        }
        Ok(self.records())
    }

    async fn create(&self, title: &str) -> Result<Task, SyncError> {
        if let Some(status) = self.fail_creates {
            return Err(Self::failure(status));
        }
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let task = Task::new(format!("rec{n}"), title, false);
        self.records.lock().expect("lock").push(task.clone());
        Ok(task)
    }

    async fn update(&self, id: &TaskId, patch: TaskPatch) -> Result<Task, SyncError> {
        self.updates
            .lock()
            .expect("lock")
            .push((id.clone(), patch.clone()));
        if self.held_id.as_ref() == Some(id) {
            self.release.notified().await;
        }
        if self.failing_ids.lock().expect("lock").contains(id) {
            return Err(Self::failure(500));
        }

        let mut records = self.records.lock().expect("lock");
        let record = records
            .iter_mut()
            .find(|task| &task.id == id)
            .ok_or_else(|| Self::failure(404))?;
        if let Some(title) = patch.title {
            record.title = title;
        }
        if let Some(is_completed) = patch.is_completed {
            record.is_completed = is_completed;
        }
        Ok(record.clone())
    }
}

/// Lets spawned tasks run to completion under a paused clock.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
