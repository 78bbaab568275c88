//! HTTP surface: `POST /tweet` and `GET /health`.
//!
//! `auth`, `lat` and `long` are accepted both as query parameters and as
//! multipart text fields; a body value wins over a query value. The photo
//! must be a multipart file part named `image`.

pub mod handler;

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::QueryRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::response::Response;
use axum::routing::{get, post};
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::debug;

pub use handler::{HandlerError, PostHandler, Stage, TweetRequest, TweetResponse};

/// Largest accepted request body.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Body of a successful health check.
pub const HEALTHY: &str = "I'm healthy!";

/// Build the service router.
pub fn router(handler: Arc<PostHandler>) -> Router {
    Router::new()
        .route("/tweet", post(tweet))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(handler)
}

/// Serve until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    handler: Arc<PostHandler>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, router(handler))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn health() -> Json<&'static str> {
    debug!("health check");
    Json(HEALTHY)
}

#[derive(Debug, Default, Deserialize)]
struct TweetQuery {
    auth: Option<String>,
    lat: Option<String>,
    long: Option<String>,
}

async fn tweet(
    State(handler): State<Arc<PostHandler>>,
    query: Result<Query<TweetQuery>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let request = read_request(query, multipart).await;
    handler.respond(request).await
}

/// Collect the request fields. Malformed input is not an error here; it
/// shows up as missing fields and is rejected by validation.
async fn read_request(
    query: Result<Query<TweetQuery>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> TweetRequest {
    let mut request = TweetRequest::default();

    match query {
        Ok(Query(q)) => {
            request.auth = q.auth;
            request.lat = q.lat;
            request.long = q.long;
        }
        Err(rejection) => debug!(%rejection, "ignoring malformed query string"),
    }

    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            debug!(%rejection, "request body is not multipart");
            return request;
        }
    };

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                debug!(error = %e, "multipart body ended early");
                request.image.fail(e.to_string());
                break;
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" if field.file_name().is_some() => match field.bytes().await {
                Ok(data) => request.image.accept(data),
                Err(e) => request.image.fail(e.to_string()),
            },
            "auth" | "lat" | "long" => {
                let Ok(value) = field.text().await else {
                    continue;
                };
                match name.as_str() {
                    "auth" => request.auth = Some(value),
                    "lat" => request.lat = Some(value),
                    _ => request.long = Some(value),
                }
            }
            _ => debug!(field = %name, "ignoring unexpected form field"),
        }
    }

    request
}
