//! Search-engine transport

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::response::SearchResponse;
use crate::data::error::SearchError;

const BACKEND_NAME: &str = "elasticsearch";

/// One search call: target index (and optional mapping type) plus body
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    pub index: String,
    pub doc_type: Option<String>,
    pub body: Value,
}

#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(&self, params: SearchParams) -> Result<SearchResponse, SearchError>;
}

#[derive(Debug)]
pub struct HttpSearchClient {
    client: reqwest::Client,
    base_url: String,
    credentials: Option<(String, Option<String>)>,
}

impl HttpSearchClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::Config(format!("failed to build HTTP client: {}", e)))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        tracing::debug!(base_url = %base_url, timeout_secs = timeout.as_secs(), "Search client initialized");
        Ok(Self {
            client,
            base_url,
            credentials: None,
        })
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: Option<String>) -> Self {
        self.credentials = Some((username.into(), password));
        self
    }

    /// `{base}/{index}/_search` or `{base}/{index}/{type}/_search`
    fn search_url(&self, params: &SearchParams) -> String {
        match &params.doc_type {
            Some(doc_type) => format!("{}/{}/{}/_search", self.base_url, params.index, doc_type),
            None => format!("{}/{}/_search", self.base_url, params.index),
        }
    }
}

#[async_trait]
impl SearchClient for HttpSearchClient {
    async fn search(&self, params: SearchParams) -> Result<SearchResponse, SearchError> {
        let url = self.search_url(&params);
        let mut request = self.client.post(&url).json(&params.body);
        if let Some((username, password)) = &self.credentials {
            request = request.basic_auth(username, password.as_ref());
        }

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            tracing::warn!(url = %url, status = %status, "Search request failed");
            return Err(SearchError::Backend {
                backend: BACKEND_NAME,
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp.json::<SearchResponse>().await?)
    }
}
