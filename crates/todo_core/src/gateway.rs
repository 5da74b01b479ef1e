use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Response, StatusCode};
use shared::{
    domain::{Task, TaskId},
    error::StoreErrorBody,
    protocol::{CreateRecordsRequest, RecordsResponse, TaskPatch, UpdateRecordsRequest},
};
use tracing::{debug, warn};
use url::Url;

use crate::error::SyncError;

pub const DEFAULT_API_ROOT: &str = "https://api.airtable.com/v0";

/// Access to the remote record store. Implementations never retry; every
/// failure is handed back to the caller.
#[async_trait]
pub trait RecordGateway: Send + Sync {
    /// Table URL that list queries are encoded against and writes are sent to.
    fn base_url(&self) -> &Url;
    async fn list(&self, url: &Url) -> Result<Vec<Task>, SyncError>;
    async fn create(&self, title: &str) -> Result<Task, SyncError>;
    async fn update(&self, id: &TaskId, patch: TaskPatch) -> Result<Task, SyncError>;
}

pub fn table_url(api_root: &str, base_id: &str, table_name: &str) -> String {
    format!(
        "{}/{}/{}",
        api_root.trim_end_matches('/'),
        base_id,
        table_name
    )
}

pub fn parse_base_url(raw: &str) -> Result<Url, SyncError> {
    Url::parse(raw).map_err(|source| SyncError::InvalidBaseUrl {
        url: raw.to_string(),
        source,
    })
}

pub struct HttpRecordGateway {
    http: Client,
    base_url: Url,
    token: String,
}

impl HttpRecordGateway {
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self, SyncError> {
        Self::with_client(Client::new(), base_url, token)
    }

    pub fn with_timeout(
        base_url: &str,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SyncError> {
        let http = build_client(Client::builder().timeout(timeout))?;
        Self::with_client(http, base_url, token)
    }

    fn with_client(
        http: Client,
        base_url: &str,
        token: impl Into<String>,
    ) -> Result<Self, SyncError> {
        Ok(Self {
            http,
            base_url: parse_base_url(base_url)?,
            token: token.into(),
        })
    }

    async fn write_one(
        &self,
        response: Response,
        operation: &'static str,
    ) -> Result<Task, SyncError> {
        read_records(response, operation)
            .await?
            .into_iter()
            .next()
            .ok_or(SyncError::EmptyResponse { operation })
    }
}

#[async_trait]
impl RecordGateway for HttpRecordGateway {
    fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn list(&self, url: &Url) -> Result<Vec<Task>, SyncError> {
        debug!("gateway: list url={url}");
        let response = self
            .http
            .get(url.clone())
            .bearer_auth(&self.token)
            .send()
            .await?;
        read_records(response, "list").await
    }

    async fn create(&self, title: &str) -> Result<Task, SyncError> {
        debug!("gateway: create title_len={}", title.len());
        let response = self
            .http
            .post(self.base_url.clone())
            .bearer_auth(&self.token)
            .json(&CreateRecordsRequest::single(title))
            .send()
            .await?;
        self.write_one(response, "create").await
    }

    async fn update(&self, id: &TaskId, patch: TaskPatch) -> Result<Task, SyncError> {
        debug!("gateway: update id={id}");
        let response = self
            .http
            .patch(self.base_url.clone())
            .bearer_auth(&self.token)
            .json(&UpdateRecordsRequest::single(id.clone(), patch))
            .send()
            .await?;
        self.write_one(response, "update").await
    }
}

fn build_client(builder: ClientBuilder) -> Result<Client, SyncError> {
    builder.build().map_err(SyncError::ClientBuild)
}

async fn read_records(response: Response, operation: &'static str) -> Result<Vec<Task>, SyncError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        let err = remote_error(status, &body);
        warn!("gateway: {operation} failed status={} error={err}", status.as_u16());
        return Err(err);
    }

    let parsed: RecordsResponse =
        serde_json::from_str(&body).map_err(|err| SyncError::Decode(err.to_string()))?;
    Ok(parsed.records.into_iter().map(Task::from).collect())
}

fn remote_error(status: StatusCode, body: &str) -> SyncError {
    let message = serde_json::from_str::<StoreErrorBody>(body)
        .map(|parsed| parsed.message())
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
    SyncError::Remote {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
