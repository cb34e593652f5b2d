//! Album use-case service.
//!
//! # Responsibility
//! - Provide the CRUD entry points used by the HTTP handlers.
//! - Own the per-operation storage timeout and pass it to every store call.
//! - Implement partial-update merging on top of full-row repository updates.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Service layer remains storage-agnostic.

use crate::model::album::{Album, AlbumId, AlbumPatch, NewAlbum};
use crate::repo::album_repo::{AlbumRepository, RepoError, RepoResult};
use std::time::Duration;

/// Default bound on a single store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(3);

/// Use-case service wrapper for album CRUD operations.
pub struct AlbumService<R: AlbumRepository> {
    repo: R,
    timeout: Duration,
}

impl<R: AlbumRepository> AlbumService<R> {
    /// Creates a service using `DEFAULT_STORE_TIMEOUT`.
    pub fn new(repo: R) -> Self {
        Self::with_timeout(repo, DEFAULT_STORE_TIMEOUT)
    }

    /// Creates a service whose store calls are each bounded by `timeout`.
    pub fn with_timeout(repo: R, timeout: Duration) -> Self {
        Self { repo, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Creates an album and returns it with its store-assigned id.
    pub fn create_album(&self, input: NewAlbum) -> RepoResult<Album> {
        let mut album = input.into_album();
        self.repo.insert_album(&mut album, self.timeout)?;
        Ok(album)
    }

    pub fn list_albums(&self) -> RepoResult<Vec<Album>> {
        self.repo.list_albums(self.timeout)
    }

    pub fn get_album(&self, id: AlbumId) -> RepoResult<Album> {
        self.repo.get_album(id, self.timeout)
    }

    /// Fetches the album, overlays the fields present in `patch`, persists
    /// the merged row and returns it.
    ///
    /// # Contract
    /// - Missing album -> `RecordNotFound` (nothing is written).
    /// - Row removed between fetch and write -> `EditConflict`.
    /// - An empty patch still rewrites the row with its current values.
    pub fn update_album(&self, id: AlbumId, patch: &AlbumPatch) -> RepoResult<Album> {
        self.update_album_with(id, || Ok::<_, RepoError>(patch.clone()))
    }

    /// Like `update_album`, but the patch is produced only after the album
    /// has been found.
    ///
    /// A missing album wins over a patch that fails to produce: callers see
    /// `RecordNotFound` and `make_patch` is never run. A failing
    /// `make_patch` aborts before anything is written.
    pub fn update_album_with<E>(
        &self,
        id: AlbumId,
        make_patch: impl FnOnce() -> Result<AlbumPatch, E>,
    ) -> Result<Album, E>
    where
        E: From<RepoError>,
    {
        let mut album = self.repo.get_album(id, self.timeout)?;
        let patch = make_patch()?;
        patch.apply_to(&mut album);
        self.repo.update_album(&album, self.timeout)?;
        Ok(album)
    }

    pub fn delete_album(&self, id: AlbumId) -> RepoResult<()> {
        self.repo.delete_album(id, self.timeout)
    }
}
