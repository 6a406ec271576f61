//! HTTP implementation of [`CatalogBackend`].
//!
//! Talks to the catalog service over three endpoints:
//!
//! | Method | Path | Parameters | Body |
//! |--------|------|------------|------|
//! | `GET`  | `/get-documents/` | `skip`, `limit` | none |
//! | `POST` | `/add-documents` | none | JSON array with one room |
//! | `POST` | `/chat/` | `msg` (URL-encoded) | none |
//!
//! Any non-2xx status becomes [`BackendError::Status`]; the body is checked
//! for a `detail` field. Transport failures become
//! [`BackendError::Transport`]. No call is retried.

use async_trait::async_trait;
use reqwest::{Client, Response};
use roomdesk_core::backend::{BackendError, CatalogBackend};
use roomdesk_core::models::{DocumentRecord, NewRoom};
use tracing::{debug, warn};

use crate::config::BackendConfig;

const LIST_PATH: &str = "/get-documents/";
const ADD_PATH: &str = "/add-documents";
const CHAT_PATH: &str = "/chat/";

/// Catalog backend reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Builds a client for `config.base_url`, applying the optional timeout.
    pub fn new(config: &BackendConfig) -> anyhow::Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: config.base().to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn transport(err: reqwest::Error) -> BackendError {
    BackendError::Transport(err.to_string())
}

/// Turns a non-success response into [`BackendError::Status`].
async fn reject(endpoint: &str, response: Response) -> BackendError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    warn!(endpoint, status = status.as_u16(), "backend returned an error status");
    BackendError::from_status(status.as_u16(), &body)
}

#[async_trait]
impl CatalogBackend for HttpBackend {
    async fn list_documents(
        &self,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<DocumentRecord>, BackendError> {
        let url = self.url(LIST_PATH);
        debug!(%url, skip, limit, "fetching documents");

        let response = self
            .client
            .get(&url)
            .query(&[("skip", skip), ("limit", limit)])
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(reject(LIST_PATH, response).await);
        }

        let body = response.text().await.map_err(transport)?;
        serde_json::from_str(&body).map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn add_documents(&self, batch: &[NewRoom]) -> Result<(), BackendError> {
        let url = self.url(ADD_PATH);
        debug!(%url, payload = ?batch, "sending documents");

        let response = self
            .client
            .post(&url)
            .json(batch)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(reject(ADD_PATH, response).await);
        }
        Ok(())
    }

    async fn chat(&self, message: &str) -> Result<String, BackendError> {
        let url = self.url(CHAT_PATH);
        debug!(%url, message, "sending chat message");

        let response = self
            .client
            .post(&url)
            .query(&[("msg", message)])
            .send()
            .await
            .map_err(transport)?;

        debug!(status = response.status().as_u16(), "chat response");
        if !response.status().is_success() {
            return Err(reject(CHAT_PATH, response).await);
        }

        response.text().await.map_err(transport)
    }
}
