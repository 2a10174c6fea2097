//! BIOfid corpus API client

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info};

use crate::check_status;
use taxmap_core::{BiofidConfig, Result, SearchResponse, TaxmapError};

const SERVICE: &str = "BIOfid API";

/// API method returning terms that co-occur with a term or URI
pub const METHOD_TERM_CONTEXT: &str = "getTermContext";

/// API method returning document metadata for document ids
pub const METHOD_DOCUMENT_METADATA: &str = "getDocumentMetadata";

/// Client for the BIOfid JSON API
pub struct BiofidClient {
    client: Client,
    base_url: String,
}

impl BiofidClient {
    /// Create a new client
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TaxmapError::Http(format!("Failed to build BIOfid client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Create from config
    pub fn from_config(config: &BiofidConfig) -> Result<Self> {
        Self::new(config.base_url.clone(), Duration::from_secs(config.timeout_secs))
    }

    /// URL of an API method
    pub fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), method)
    }

    /// Terms co-occurring with `term` in the corpus
    pub async fn get_term_context(&self, term: &str) -> Result<serde_json::Value> {
        self.fetch_json(&self.method_url(METHOD_TERM_CONTEXT), &[("term", term)])
            .await
    }

    /// Metadata of one or more documents
    pub async fn get_document_metadata<S: AsRef<str>>(
        &self,
        document_ids: &[S],
    ) -> Result<serde_json::Value> {
        let params: Vec<(&str, &str)> = document_ids
            .iter()
            .map(|id| ("docId", id.as_ref()))
            .collect();

        self.fetch_json(&self.method_url(METHOD_DOCUMENT_METADATA), &params)
            .await
    }

    /// Knowledge data the BIOfid website serves for an ontology URI
    pub async fn get_uri_data(&self, uri: &str) -> Result<serde_json::Value> {
        self.fetch_json(uri, &[]).await
    }

    /// Document metadata decoded as a search response
    pub async fn get_documents<S: AsRef<str>>(&self, document_ids: &[S]) -> Result<SearchResponse> {
        let value = self.get_document_metadata(document_ids).await?;
        SearchResponse::from_value(value)
    }

    /// GET a URL with query parameters and decode the JSON body
    pub async fn fetch_json(&self, url: &str, params: &[(&str, &str)]) -> Result<serde_json::Value> {
        info!(url = %url, "Calling BIOfid");
        debug!(?params, "Request parameters");

        let response = self
            .client
            .get(url)
            .query(params)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| TaxmapError::Http(format!("{SERVICE} request failed: {e}")))?;

        let response = check_status(SERVICE, response).await?;

        let body = response
            .text()
            .await
            .map_err(|e| TaxmapError::Http(format!("{SERVICE} body read failed: {e}")))?;
        debug!(bytes = body.len(), "Received response");

        Ok(serde_json::from_str(&body)?)
    }
}
