//! Album repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide the five persistence operations over the `album` table.
//! - Translate storage-level "no row" outcomes into `RecordNotFound`.
//!
//! # Invariants
//! - Write paths call `Album::validate()` before SQL mutations.
//! - Ids below 1 fail with `RecordNotFound` without touching storage.
//! - Every operation is bounded by its caller-supplied timeout.

use crate::db::{DbError, DbPool};
use crate::model::album::{round_price, Album, AlbumId, AlbumValidationError};
use rusqlite::{params, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

const ALBUM_SELECT_SQL: &str = "SELECT
    id,
    title,
    artist,
    price
FROM album";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for album persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// The id does not exist, or is not a valid persisted id.
    RecordNotFound(AlbumId),
    /// An update matched no row, e.g. it was deleted after being fetched.
    EditConflict(AlbumId),
    Validation(AlbumValidationError),
    Db(DbError),
    InvalidData(String),
}

impl RepoError {
    /// Returns whether this is the caller-facing "missing record" signal.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RecordNotFound(_))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RecordNotFound(id) => write!(f, "record not found: {id}"),
            Self::EditConflict(id) => write!(f, "edit conflict: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted album data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::RecordNotFound(_) | Self::EditConflict(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<AlbumValidationError> for RepoError {
    fn from(value: AlbumValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

/// Repository SQL only runs inside pooled calls, so SQLite errors are
/// classified against the call deadline.
impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::from_call_error(value))
    }
}

/// Repository interface for album CRUD operations.
///
/// Every call takes its own timeout; there is no ambient deadline.
pub trait AlbumRepository {
    /// Persists a new album and writes the generated id back onto `album`.
    fn insert_album(&self, album: &mut Album, timeout: Duration) -> RepoResult<()>;
    /// Returns every album; an empty table yields an empty vector.
    fn list_albums(&self, timeout: Duration) -> RepoResult<Vec<Album>>;
    fn get_album(&self, id: AlbumId, timeout: Duration) -> RepoResult<Album>;
    /// Persists every field of `album` onto the row with the same id.
    fn update_album(&self, album: &Album, timeout: Duration) -> RepoResult<()>;
    /// Hard-deletes the row.
    fn delete_album(&self, id: AlbumId, timeout: Duration) -> RepoResult<()>;
}

/// SQLite-backed album repository over a shared connection pool.
pub struct SqliteAlbumRepository<'pool> {
    pool: &'pool DbPool,
}

impl<'pool> SqliteAlbumRepository<'pool> {
    pub fn new(pool: &'pool DbPool) -> Self {
        Self { pool }
    }
}

impl AlbumRepository for SqliteAlbumRepository<'_> {
    fn insert_album(&self, album: &mut Album, timeout: Duration) -> RepoResult<()> {
        album.price = round_price(album.price);
        album.validate()?;

        let id = self.pool.with_connection(timeout, |conn| -> RepoResult<AlbumId> {
            conn.execute(
                "INSERT INTO album (title, artist, price) VALUES (?1, ?2, ?3);",
                params![album.title.as_str(), album.artist.as_str(), album.price],
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        album.id = id;
        Ok(())
    }

    fn list_albums(&self, timeout: Duration) -> RepoResult<Vec<Album>> {
        self.pool.with_connection(timeout, |conn| -> RepoResult<Vec<Album>> {
            let mut stmt = conn.prepare(&format!("{ALBUM_SELECT_SQL} ORDER BY id ASC;"))?;
            let mut rows = stmt.query([])?;
            let mut albums = Vec::new();

            while let Some(row) = rows.next()? {
                albums.push(parse_album_row(row)?);
            }

            Ok(albums)
        })
    }

    fn get_album(&self, id: AlbumId, timeout: Duration) -> RepoResult<Album> {
        if id < 1 {
            return Err(RepoError::RecordNotFound(id));
        }

        let found = self.pool.with_connection(timeout, |conn| -> RepoResult<Option<Album>> {
            let mut stmt = conn.prepare(&format!("{ALBUM_SELECT_SQL} WHERE id = ?1;"))?;
            let row = stmt
                .query_row([id], |row| Ok(parse_album_row(row)))
                .optional()?;
            row.transpose()
        })?;

        found.ok_or(RepoError::RecordNotFound(id))
    }

    fn update_album(&self, album: &Album, timeout: Duration) -> RepoResult<()> {
        if !album.is_persisted() {
            return Err(RepoError::RecordNotFound(album.id));
        }
        album.validate()?;

        let changed = self.pool.with_connection(timeout, |conn| -> RepoResult<usize> {
            let changed = conn.execute(
                "UPDATE album
                 SET
                    title = ?1,
                    artist = ?2,
                    price = ?3
                 WHERE id = ?4;",
                params![
                    album.title.as_str(),
                    album.artist.as_str(),
                    round_price(album.price),
                    album.id,
                ],
            )?;
            Ok(changed)
        })?;

        if changed == 0 {
            return Err(RepoError::EditConflict(album.id));
        }

        Ok(())
    }

    fn delete_album(&self, id: AlbumId, timeout: Duration) -> RepoResult<()> {
        if id < 1 {
            return Err(RepoError::RecordNotFound(id));
        }

        let changed = self.pool.with_connection(timeout, |conn| -> RepoResult<usize> {
            Ok(conn.execute("DELETE FROM album WHERE id = ?1;", [id])?)
        })?;

        if changed == 0 {
            return Err(RepoError::RecordNotFound(id));
        }

        Ok(())
    }
}

fn parse_album_row(row: &Row<'_>) -> RepoResult<Album> {
    let id: AlbumId = row.get("id")?;
    if id < 1 {
        return Err(RepoError::InvalidData(format!(
            "invalid id value `{id}` in album.id"
        )));
    }

    let price: f64 = row.get("price")?;
    if !price.is_finite() {
        return Err(RepoError::InvalidData(format!(
            "invalid price value `{price}` in album.price"
        )));
    }

    Ok(Album {
        id,
        title: row.get("title")?,
        artist: row.get("artist")?,
        price,
        version: 0,
    })
}
