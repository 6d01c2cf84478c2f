//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, route per configured path)
//!     → request.rs (request ID, forwarding headers)
//!     → cache service (cached or freshly fetched payload)
//!     → 200 application/json, or 404 when nothing can be served
//! ```

pub mod request;
pub mod server;

pub use request::{forwarding_headers, MakeRequestUuidV4, X_REQUEST_ID};
pub use server::HttpServer;
