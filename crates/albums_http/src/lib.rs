//! HTTP surface for the album catalog.
//!
//! Wires axum handlers over `albums_core` and exposes the server used by the
//! `albums` binary.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;

pub use config::{ConfigError, ServerConfig};
pub use error::{ApiError, ApiResult};
pub use handlers::AppState;
pub use routes::build_router;
pub use server::HttpServer;
