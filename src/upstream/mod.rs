//! Upstream access subsystem.
//!
//! # Data Flow
//! ```text
//! CacheService decides a fetch is needed
//!     → client.rs (fixed JSON body + forwarded headers, POST)
//!     → decompress.rs (gunzip when Content-Encoding says gzip)
//!     → raw JSON bytes back to the cache layer
//! ```
//!
//! # Design Decisions
//! - The client never interprets the body; post-processing lives in `cache`
//! - Every failure is an `UpstreamError`; nothing is retried here
//! - `Upstream` is the seam the cache layer is generic over

pub mod client;
pub mod decompress;

use std::future::Future;

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use thiserror::Error;

pub use client::{HttpUpstream, SonglistQuery};

/// Errors raised while talking to the upstream.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The fixed request body could not be encoded.
    #[error("failed to encode request body: {0}")]
    Config(#[source] serde_json::Error),

    /// The configured endpoint is not an absolute URL.
    #[error("invalid upstream endpoint: {0}")]
    Endpoint(#[from] url::ParseError),

    /// Building, sending or reading the request failed.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The upstream answered with a non-success status.
    #[error("upstream returned {0}")]
    Status(StatusCode),

    /// The body claimed gzip but could not be inflated.
    #[error("failed to decompress response: {0}")]
    Decode(#[source] std::io::Error),
}

/// Something that can produce the raw upstream payload.
pub trait Upstream: Send + Sync + 'static {
    /// Fetch the payload, replaying `headers` onto the outgoing request.
    fn fetch(&self, headers: &HeaderMap) -> impl Future<Output = Result<Bytes, UpstreamError>> + Send;
}
