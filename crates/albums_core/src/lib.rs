//! Core domain logic for the album catalog.
//! This crate is the single source of truth for album invariants and storage.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{DbError, DbPool, DbResult, PoolMode};
pub use logging::{default_log_level, init_logging, logging_status, LogDestination};
pub use model::album::{Album, AlbumId, AlbumPatch, AlbumValidationError, NewAlbum};
pub use repo::album_repo::{AlbumRepository, RepoError, RepoResult, SqliteAlbumRepository};
pub use service::album_service::{AlbumService, DEFAULT_STORE_TIMEOUT};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
