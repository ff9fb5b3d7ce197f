//! Client for the external record store holding job records.
//!
//! The store is Notion: each intake request creates one page in a configured
//! database, and the page's shareable URL is what ends up inside the QR code.
//! The service keeps no copy of the record; once created, the page is owned
//! by the store and is only touched once more, to attach the QR image URL.
//!
//! Handlers depend on the [`RecordStore`] trait rather than the concrete
//! client so endpoint tests can swap in a double without a network.

use async_trait::async_trait;
use common::model::job::JobRecord;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::RecordStoreConfig;

const NOTION_VERSION: &str = "2022-06-28";
/// Name of the page property the QR image URL is attached to.
const QR_PROPERTY: &str = "QR Code";

#[derive(Debug, Error)]
pub enum RecordStoreError {
    #[error("record store request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("record store rejected the request: {status}: {body}")]
    Rejected { status: StatusCode, body: String },
}

/// Reference to a record created in the store: its identifier plus the
/// shareable URL embedded into the QR payload.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedRecord {
    pub id: String,
    pub url: String,
}

/// The two operations the service performs against the record store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Creates a new job record and returns its reference.
    async fn create_job(&self, job: &JobRecord) -> Result<CreatedRecord, RecordStoreError>;

    /// Attaches the QR image URL to an existing record. The record must have
    /// been created first; its identifier comes from [`Self::create_job`].
    async fn attach_qr_code(
        &self,
        record_id: &str,
        qr_code_url: &str,
    ) -> Result<(), RecordStoreError>;
}

/// Production implementation talking to the Notion pages API.
pub struct NotionRecordStore {
    client: Client,
    base_url: String,
    api_key: String,
    database_id: String,
}

impl NotionRecordStore {
    pub fn new(config: &RecordStoreConfig) -> Self {
        NotionRecordStore {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            database_id: config.database_id.clone(),
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, RecordStoreError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(RecordStoreError::Rejected { status, body })
        }
    }
}

#[async_trait]
impl RecordStore for NotionRecordStore {
    async fn create_job(&self, job: &JobRecord) -> Result<CreatedRecord, RecordStoreError> {
        let response = self
            .client
            .post(format!("{}/v1/pages", self.base_url))
            .bearer_auth(&self.api_key)
            .header("Notion-Version", NOTION_VERSION)
            .json(&create_page_payload(&self.database_id, job))
            .send()
            .await?;
        let created = Self::check(response).await?.json::<CreatedRecord>().await?;
        Ok(created)
    }

    async fn attach_qr_code(
        &self,
        record_id: &str,
        qr_code_url: &str,
    ) -> Result<(), RecordStoreError> {
        let response = self
            .client
            .patch(format!("{}/v1/pages/{}", self.base_url, record_id))
            .bearer_auth(&self.api_key)
            .header("Notion-Version", NOTION_VERSION)
            .json(&json!({
                "properties": {
                    (QR_PROPERTY): { "url": qr_code_url }
                }
            }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

/// Builds the page-creation body: one property per job field, with the
/// customer as the page title and everything else as rich text. `color` is
/// sent empty at creation and filled in later by hand in the store.
fn create_page_payload(database_id: &str, job: &JobRecord) -> Value {
    json!({
        "parent": { "database_id": database_id },
        "properties": {
            "Customer": title(&job.customer),
            "Job": rich_text(&job.job),
            "Color Name": rich_text(&job.color_name),
            "Address": rich_text(&job.address),
            "Date": rich_text(&job.date),
            "Finish": rich_text(&job.finish),
            "Texture": rich_text(&job.texture),
            "Formula": rich_text(&job.formula),
            "Color": rich_text(&job.color),
        }
    })
}

fn title(value: &str) -> Value {
    json!({ "title": [{ "text": { "content": value } }] })
}

fn rich_text(value: &str) -> Value {
    json!({ "rich_text": [{ "text": { "content": value } }] })
}
