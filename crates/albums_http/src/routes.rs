//! Route table and middleware stack.
//!
//! # Endpoints
//!
//! - `GET /` - HTML greeting
//! - `GET /api/albums` - list albums
//! - `POST /api/albums` - create an album
//! - `GET /api/albums/:id` - fetch one album
//! - `PUT /api/albums/:id` - partially update an album
//! - `DELETE /api/albums/:id` - delete an album

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::error_handling::HandleErrorLayer;
use axum::extract::{DefaultBodyLimit, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use log::{info, warn};
use tower::timeout::error::Elapsed;
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use crate::error::ApiError;
use crate::handlers::{
    create_album, delete_album, get_album, greet, list_albums, not_found, update_album, AppState,
};

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 1_048_576;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Album CRUD routes, relative to the `/api` prefix.
pub fn album_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/albums", get(list_albums).post(create_album))
        .route(
            "/albums/:id",
            get(get_album).put(update_album).delete(delete_album),
        )
        .with_state(state)
}

/// Full application router: greeting, `/api` routes and middleware.
pub fn build_router(state: Arc<AppState>, request_timeout: Duration) -> Router {
    let routes = Router::new()
        .route("/", get(greet))
        .nest("/api", album_routes(state))
        .fallback(not_found);
    with_middleware(routes, request_timeout)
}

/// Wraps `router` in the service middleware.
///
/// Layer order, outermost first: request id, access log, panic recovery,
/// whole-request timeout (504 with the JSON error envelope).
pub fn with_middleware(router: Router, request_timeout: Duration) -> Router {
    router.layer(DefaultBodyLimit::max(MAX_BODY_BYTES)).layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(middleware::from_fn(log_request))
            .layer(CatchPanicLayer::new())
            .layer(HandleErrorLayer::new(middleware_error))
            .layer(TimeoutLayer::new(request_timeout)),
    )
}

async fn middleware_error(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        ApiError::Timeout
    } else {
        ApiError::Internal(err.to_string())
    }
}

async fn log_request(request: Request, next: Next) -> Response {
    let started_at = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let response = next.run(request).await;

    let status = response.status();
    let duration_ms = started_at.elapsed().as_millis();
    if status.is_server_error() {
        warn!(
            "event=http_request module=http status=error method={} path={} http_status={} duration_ms={} request_id={}",
            method,
            path,
            status.as_u16(),
            duration_ms,
            request_id
        );
    } else {
        info!(
            "event=http_request module=http status=ok method={} path={} http_status={} duration_ms={} request_id={}",
            method,
            path,
            status.as_u16(),
            duration_ms,
            request_id
        );
    }

    response
}
