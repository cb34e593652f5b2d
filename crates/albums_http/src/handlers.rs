//! Album request handlers.
//!
//! # Responsibility
//! - Translate HTTP requests into `AlbumService` calls and results into
//!   enveloped JSON responses.
//! - Run store calls on the blocking pool so SQLite never stalls the runtime.
//!
//! # Invariants
//! - Successful bodies are single-key envelopes: `albums`, `album`, `message`.
//! - A path id that is not a positive integer is a 404 and never reaches the
//!   store.
//! - Update looks the album up before judging the body: a missing album is a
//!   404 even when the body is malformed.

use crate::error::{ApiError, ApiResult};
use albums_core::{AlbumId, AlbumPatch, AlbumService, DbPool, NewAlbum, SqliteAlbumRepository};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use log::{error, warn};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const GREETING_HTML: &str = "<main> <h1>Hello World!</h1> <br> <a href='/api/albums'>Go to Albums API</a><main><style> html { filter: invert(1); }</style>";

/// Shared state for album handlers.
pub struct AppState {
    pub pool: Arc<DbPool>,
    /// Bound on each individual store call.
    pub store_timeout: Duration,
}

impl AppState {
    pub fn new(pool: Arc<DbPool>, store_timeout: Duration) -> Self {
        Self {
            pool,
            store_timeout,
        }
    }
}

/// Parses a path id. Anything but a positive integer is reported as not found.
pub fn parse_album_id(raw: &str) -> ApiResult<AlbumId> {
    match raw.parse::<AlbumId>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(ApiError::NotFound),
    }
}

/// Builds the `Location` path for a created album.
pub fn album_location(id: AlbumId) -> String {
    format!("/api/albums/{id}")
}

pub async fn greet() -> Html<&'static str> {
    Html(GREETING_HTML)
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

pub async fn list_albums(State(state): State<Arc<AppState>>) -> ApiResult<Json<serde_json::Value>> {
    let albums = with_album_service(&state, "list", |service| service.list_albums()).await?;
    Ok(Json(json!({ "albums": albums })))
}

pub async fn get_album(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = parse_album_id(&raw_id)?;
    let album = with_album_service(&state, "get", move |service| service.get_album(id)).await?;
    Ok(Json(json!({ "album": album })))
}

pub async fn create_album(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewAlbum>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(input) = payload.map_err(bad_request)?;
    let album =
        with_album_service(&state, "create", move |service| service.create_album(input)).await?;

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, album_location(album.id))],
        Json(json!({ "album": album })),
    )
        .into_response())
}

pub async fn update_album(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    payload: Result<Json<AlbumPatch>, JsonRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = parse_album_id(&raw_id)?;
    let album = with_album_service(&state, "update", move |service| {
        service.update_album_with(id, || {
            payload.map(|Json(patch)| patch).map_err(bad_request)
        })
    })
    .await?;
    Ok(Json(json!({ "album": album })))
}

pub async fn delete_album(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = parse_album_id(&raw_id)?;
    with_album_service(&state, "delete", move |service| service.delete_album(id)).await?;
    Ok(Json(json!({ "message": "album successfully deleted" })))
}

fn bad_request(rejection: JsonRejection) -> ApiError {
    ApiError::BadRequest(rejection.body_text())
}

/// Runs `op` against a fresh service on tokio's blocking pool.
async fn with_album_service<T, E, F>(
    state: &Arc<AppState>,
    operation: &'static str,
    op: F,
) -> ApiResult<T>
where
    T: Send + 'static,
    E: Into<ApiError> + Send + 'static,
    F: FnOnce(&AlbumService<SqliteAlbumRepository<'_>>) -> Result<T, E> + Send + 'static,
{
    let state = Arc::clone(state);
    let joined = tokio::task::spawn_blocking(move || {
        let service =
            AlbumService::with_timeout(SqliteAlbumRepository::new(&state.pool), state.store_timeout);
        op(&service)
    })
    .await;

    match joined {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => {
            let api_error: ApiError = err.into();
            match &api_error {
                ApiError::Internal(detail) => error!(
                    "event=album_{} module=http status=error error={}",
                    operation, detail
                ),
                other => warn!(
                    "event=album_{} module=http status=rejected reason={}",
                    operation, other
                ),
            }
            Err(api_error)
        }
        Err(join_error) => {
            error!(
                "event=album_{} module=http status=error error_code=blocking_task_failed error={}",
                operation, join_error
            );
            Err(ApiError::Internal(join_error.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{album_location, parse_album_id};
    use crate::error::ApiError;

    #[test]
    fn parse_album_id_accepts_positive_integers_only() {
        assert_eq!(parse_album_id("1"), Ok(1));
        assert_eq!(parse_album_id("9223372036854775807"), Ok(i64::MAX));

        for raw in ["0", "-3", "abc", "1.5", "", " 1", "9223372036854775808"] {
            assert_eq!(parse_album_id(raw), Err(ApiError::NotFound), "input {raw:?}");
        }
    }

    #[test]
    fn album_location_points_at_album_resource() {
        assert_eq!(album_location(12), "/api/albums/12");
    }
}
