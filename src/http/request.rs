//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) when the client sent none
//! - Derive the header set replayed onto the upstream request
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Hop-by-hop headers, and headers naming the inbound connection
//!   (`host`, `content-length`), never reach the upstream

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::Request;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

static HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Read the request ID of an inbound request.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Headers to replay onto the upstream request.
pub fn forwarding_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = inbound.clone();

    // Headers listed in `Connection` are hop-by-hop as well.
    let listed: Vec<HeaderName> = inbound
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();
    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }

    headers.remove(header::HOST);
    headers.remove(header::CONTENT_LENGTH);
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forwarding_strips_connection_headers() {
        let mut inbound = HeaderMap::new();
        inbound.insert(header::HOST, HeaderValue::from_static("proxy.local"));
        inbound.insert(header::CONTENT_LENGTH, HeaderValue::from_static("0"));
        inbound.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, x-trace-hop"));
        inbound.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        inbound.insert("x-trace-hop", HeaderValue::from_static("1"));
        inbound.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        inbound.insert(header::USER_AGENT, HeaderValue::from_static("songlist-web"));
        inbound.insert(header::COOKIE, HeaderValue::from_static("SESSDATA=abc"));
        inbound.insert(X_REQUEST_ID, HeaderValue::from_static("req-1"));

        let forwarded = forwarding_headers(&inbound);

        assert_eq!(forwarded.len(), 3);
        assert_eq!(forwarded[header::USER_AGENT], "songlist-web");
        assert_eq!(forwarded[header::COOKIE], "SESSDATA=abc");
        assert_eq!(forwarded[X_REQUEST_ID], "req-1");
    }

    #[test]
    fn test_request_id_lookup() {
        let mut headers = HeaderMap::new();
        assert_eq!(request_id(&headers), "unknown");
        headers.insert(X_REQUEST_ID, HeaderValue::from_static("abc"));
        assert_eq!(request_id(&headers), "abc");
    }

    #[test]
    fn test_generated_ids_are_uuids() {
        let request = Request::new(());
        let id = MakeRequestUuidV4.make_request_id(&request).unwrap();
        let text = id.header_value().to_str().unwrap();
        assert!(Uuid::parse_str(text).is_ok());
    }
}
