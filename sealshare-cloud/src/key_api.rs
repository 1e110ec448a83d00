//! REST-backed key store.
//!
//! Talks to a PostgREST-style endpoint (`{base}/rest/v1/{table}`) holding
//! one row per key record. Row columns match [`KeyRecord`]'s serde form;
//! the key travels as base64 text.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use sealshare_storage::{KeyRecord, KeyStore, RecordStatus, StorageError, StorageResult};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::config::SealShareConfig;

/// HTTP client for the hosted key record table.
#[derive(Clone)]
pub struct RestKeyStore {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl RestKeyStore {
    pub fn new(base_url: &str, table: &str, api_key: Option<String>) -> StorageResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| StorageError::Backend(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/rest/v1/{table}", base_url.trim_end_matches('/')),
            api_key,
        })
    }

    pub fn from_config(config: &SealShareConfig) -> StorageResult<Self> {
        Self::new(
            &config.key_api_base_url,
            &config.key_table,
            config.key_api_key.clone(),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request(&self, method: Method) -> RequestBuilder {
        let req = self.client.request(method, &self.endpoint);
        match &self.api_key {
            Some(key) => req.header("apikey", key).bearer_auth(key),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder, what: &str) -> StorageResult<Response> {
        req.send()
            .await
            .map_err(|e| StorageError::Backend(format!("{what} request failed: {e}")))
    }

    /// Fails on any non-2xx status, carrying the response body.
    async fn check(resp: Response, what: &str) -> StorageResult<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(StorageError::Backend(format!("{what} returned {status}: {body}")))
    }

    async fn rows<T: DeserializeOwned>(resp: Response, what: &str) -> StorageResult<Vec<T>> {
        let body = resp
            .text()
            .await
            .map_err(|e| StorageError::Backend(format!("{what} body unreadable: {e}")))?;
        serde_json::from_str(&body)
            .map_err(|e| StorageError::InvalidRecord(format!("{what} response: {e}")))
    }
}

#[async_trait]
impl KeyStore for RestKeyStore {
    async fn insert(&self, record: &KeyRecord) -> StorageResult<()> {
        if record.storage_path.is_empty() {
            return Err(StorageError::InvalidRecord("empty storage path".into()));
        }

        let req = self
            .request(Method::POST)
            .header("Prefer", "return=minimal")
            .json(record);
        let resp = self.send(req, "insert").await?;

        if resp.status() == StatusCode::CONFLICT {
            return Err(StorageError::Duplicate(record.storage_path.clone()));
        }
        Self::check(resp, "insert").await?;

        debug!("inserted key record for {} via REST", record.storage_path);
        Ok(())
    }

    async fn select_by_path(&self, storage_path: &str) -> StorageResult<KeyRecord> {
        let req = self
            .request(Method::GET)
            .query(&[("storage_path", format!("eq.{storage_path}"))])
            .query(&[("select", "*")]);
        let resp = Self::check(self.send(req, "select").await?, "select").await?;

        Self::rows::<KeyRecord>(resp, "select")
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StorageError::NotFound(storage_path.to_string()))
    }

    async fn set_status(&self, storage_path: &str, status: RecordStatus) -> StorageResult<()> {
        let req = self
            .request(Method::PATCH)
            .query(&[("storage_path", format!("eq.{storage_path}"))])
            .header("Prefer", "return=representation")
            .json(&serde_json::json!({ "status": status }));
        let resp = Self::check(self.send(req, "update").await?, "update").await?;

        let updated: Vec<serde_json::Value> = Self::rows(resp, "update").await?;
        if updated.is_empty() {
            return Err(StorageError::NotFound(storage_path.to_string()));
        }
        Ok(())
    }

    async fn delete_pending(&self, storage_path: &str) -> StorageResult<bool> {
        let req = self
            .request(Method::DELETE)
            .query(&[
                ("storage_path", format!("eq.{storage_path}")),
                ("status", "eq.pending".to_string()),
            ])
            .header("Prefer", "return=representation");
        let resp = Self::check(self.send(req, "delete").await?, "delete").await?;

        let removed: Vec<serde_json::Value> = Self::rows(resp, "delete").await?;
        Ok(!removed.is_empty())
    }

    async fn delete_pending_before(&self, cutoff_ms: i64) -> StorageResult<usize> {
        let req = self
            .request(Method::DELETE)
            .query(&[
                ("status", "eq.pending".to_string()),
                ("created_at", format!("lt.{cutoff_ms}")),
            ])
            .header("Prefer", "return=representation");
        let resp = Self::check(self.send(req, "delete").await?, "delete").await?;

        let removed: Vec<serde_json::Value> = Self::rows(resp, "delete").await?;
        debug!("REST reconciliation removed {} pending records", removed.len());
        Ok(removed.len())
    }
}
