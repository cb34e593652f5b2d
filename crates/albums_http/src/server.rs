//! # HTTP Server
//!
//! Binds the album router to a TCP listener and serves until Ctrl-C.

use std::sync::Arc;

use albums_core::{DbPool, DbResult};
use axum::Router;
use log::{error, info};
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::handlers::AppState;
use crate::routes::build_router;

/// HTTP server for the album API.
pub struct HttpServer {
    config: ServerConfig,
    router: Router,
}

impl HttpServer {
    /// Create a server over an already opened pool.
    pub fn new(config: ServerConfig, pool: Arc<DbPool>) -> Self {
        let state = Arc::new(AppState::new(pool, config.store_timeout()));
        let router = build_router(state, config.request_timeout());
        Self { config, router }
    }

    /// Open the pool described by `config` and build the server over it.
    pub fn open(config: ServerConfig) -> DbResult<Self> {
        let pool = if config.uses_memory_db() {
            DbPool::open_in_memory()?
        } else {
            DbPool::open(&config.db_path, config.pool_size)?
        };
        Ok(Self::new(config, Arc::new(pool)))
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serve until the process receives Ctrl-C.
    pub async fn start(self) -> Result<(), std::io::Error> {
        let listener = TcpListener::bind(self.config.socket_addr()).await?;
        let local_addr = listener.local_addr()?;
        info!(
            "event=server_start module=http status=ok addr={} db_path={}",
            local_addr, self.config.db_path
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("event=server_stop module=http status=ok");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(
            "event=server_signal module=http status=error error_code=ctrl_c_unavailable error={}",
            err
        );
        // Without a signal handler, keep serving instead of exiting at once.
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_config(port: u16) -> ServerConfig {
        ServerConfig {
            db_path: crate::config::MEMORY_DB_PATH.to_string(),
            ..ServerConfig::with_port(port)
        }
    }

    #[test]
    fn test_server_creation() {
        let server = HttpServer::open(memory_config(8080)).unwrap();
        assert_eq!(server.socket_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_server_with_custom_port() {
        let server = HttpServer::open(memory_config(9000)).unwrap();
        assert_eq!(server.socket_addr(), "0.0.0.0:9000");
    }

    #[test]
    fn test_file_backed_server_opens_pool() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            db_path: dir.path().join("albums.db").to_string_lossy().into_owned(),
            pool_size: 2,
            ..ServerConfig::default()
        };
        let _router = HttpServer::open(config).unwrap().router();
        assert!(dir.path().join("albums.db").exists());
    }
}
