use serde::{Deserialize, Serialize};

use crate::domain::{Task, TaskId};

/// Record as stored remotely. The store drops `false` booleans, so
/// `is_completed` is routinely absent on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub id: TaskId,
    #[serde(default)]
    pub fields: RecordFields,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
}

/// The only place store records become tasks.
impl From<RemoteRecord> for Task {
    fn from(record: RemoteRecord) -> Self {
        Self {
            id: record.id,
            title: record.fields.title.unwrap_or_default(),
            is_completed: record.fields.is_completed.unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordsResponse {
    #[serde(default)]
    pub records: Vec<RemoteRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRecordsRequest {
    pub records: Vec<NewRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRecord {
    pub fields: NewRecordFields,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecordFields {
    pub title: String,
    pub is_completed: bool,
}

impl CreateRecordsRequest {
    pub fn single(title: impl Into<String>) -> Self {
        Self {
            records: vec![NewRecord {
                fields: NewRecordFields {
                    title: title.into(),
                    is_completed: false,
                },
            }],
        }
    }
}

/// Partial field set for an update; `None` fields are left untouched remotely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
}

impl TaskPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            is_completed: None,
        }
    }

    pub fn completion(is_completed: bool) -> Self {
        Self {
            title: None,
            is_completed: Some(is_completed),
        }
    }

    pub fn with_completion(mut self, is_completed: bool) -> Self {
        self.is_completed = Some(is_completed);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRecordsRequest {
    pub records: Vec<RecordPatch>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPatch {
    pub id: TaskId,
    pub fields: TaskPatch,
}

impl UpdateRecordsRequest {
    pub fn single(id: TaskId, fields: TaskPatch) -> Self {
        Self {
            records: vec![RecordPatch { id, fields }],
        }
    }
}
