//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with one `POST` route per configured path
//! - Wire up middleware (request ID, tracing, timeout)
//! - Hand each request's path and forwarding headers to the cache service
//! - Map the result to `200 application/json` or `404`
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::cache::CacheService;
use crate::config::ProxyConfig;
use crate::http::request::{forwarding_headers, request_id, MakeRequestUuidV4};
use crate::lifecycle::shutdown;
use crate::observability::metrics;
use crate::upstream::{HttpUpstream, Upstream, UpstreamError};

/// HTTP server for the songlist proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a server backed by the configured HTTP upstream.
    pub fn new(config: ProxyConfig) -> Result<Self, UpstreamError> {
        let upstream = HttpUpstream::new(&config.upstream, &config.songlist)?;
        let cache = CacheService::new(upstream, &config.songlist);
        Ok(Self::with_cache(config, cache))
    }

    /// Create a server around an existing cache service.
    pub fn with_cache<U: Upstream>(config: ProxyConfig, cache: Arc<CacheService<U>>) -> Self {
        let router = Self::build_router(&config, cache);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// An expired request answers `404` like any other failed lookup.
    fn build_router<U: Upstream>(config: &ProxyConfig, cache: Arc<CacheService<U>>) -> Router {
        let mut router = Router::new();
        for path in &config.songlist.routes {
            router = router.route(path, post(songlist_handler::<U>));
        }

        router.with_state(cache).layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        path = %request.uri().path(),
                        request_id = %request_id(request.headers()),
                    )
                }))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::NOT_FOUND,
                    Duration::from_secs(config.timeouts.request_secs),
                )),
        )
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = ?self.config.songlist.routes,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown_rx))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// A clone of the router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Serve the cached songlist for the request path.
async fn songlist_handler<U: Upstream>(
    State(cache): State<Arc<CacheService<U>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let start_time = Instant::now();
    let key = uri.path();

    let response = match cache.get_or_refresh(key, &forwarding_headers(&headers)).await {
        Some(payload) if !payload.is_empty() => (
            [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            payload,
        )
            .into_response(),
        _ => {
            tracing::warn!(cache_key = %key, "No data available");
            StatusCode::NOT_FOUND.into_response()
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), start_time);
    response
}
