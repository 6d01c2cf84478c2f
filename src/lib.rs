//! Songlist caching proxy library.
//!
//! A caching reverse proxy in front of a single upstream JSON endpoint:
//! cached responses are served immediately and refreshed in the background,
//! with at most one upstream fetch per cache key in flight.

// Core subsystems
pub mod cache;
pub mod config;
pub mod http;
pub mod upstream;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use cache::CacheService;
pub use config::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
