//! HTTP client for the songlist upstream.
//!
//! # Responsibilities
//! - Build the fixed `{"url", "uid"}` request body from configuration
//! - Replay the caller's forwarding headers, forcing `Accept-Encoding: gzip`
//! - Decode the response body into raw bytes
//! - Enforce connect and request timeouts

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_TYPE};
use serde::Serialize;
use url::Url;

use crate::config::{SonglistConfig, UpstreamConfig};
use crate::upstream::decompress;
use crate::upstream::{Upstream, UpstreamError};

/// Body sent with every upstream request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SonglistQuery {
    pub url: String,
    pub uid: String,
}

impl SonglistQuery {
    pub fn from_config(config: &SonglistConfig) -> Self {
        Self {
            url: config.url.clone(),
            uid: config.uid.clone(),
        }
    }
}

/// Upstream client backed by `reqwest`.
#[derive(Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    endpoint: Url,
    query: SonglistQuery,
}

impl HttpUpstream {
    /// Create a client for the configured endpoint.
    pub fn new(config: &UpstreamConfig, songlist: &SonglistConfig) -> Result<Self, UpstreamError> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs));
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            endpoint: Url::parse(&config.endpoint)?,
            query: SonglistQuery::from_config(songlist),
        })
    }
}

impl Upstream for HttpUpstream {
    async fn fetch(&self, headers: &HeaderMap) -> Result<Bytes, UpstreamError> {
        tracing::debug!(endpoint = %self.endpoint, "Fetching data from upstream");

        let body = serde_json::to_vec(&self.query).map_err(UpstreamError::Config)?;

        let mut outgoing = headers.clone();
        outgoing.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
        if !outgoing.contains_key(CONTENT_TYPE) {
            outgoing.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        let response = self
            .client
            .post(self.endpoint.clone())
            .headers(outgoing)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status));
        }

        let gzipped = response
            .headers()
            .get(CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .is_some_and(decompress::is_gzip);

        let raw = response.bytes().await?;
        if gzipped {
            let inflated = decompress::gunzip(&raw).map_err(UpstreamError::Decode)?;
            Ok(Bytes::from(inflated))
        } else {
            Ok(raw)
        }
    }
}
