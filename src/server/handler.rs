//! The `/tweet` request pipeline.
//!
//! Each request moves through
//! `Unauthenticated → Validating → Classifying → Composing → Preparing →
//! Publishing → Responded`, and can leave with an error response from any
//! stage before `Responded`:
//!
//! | stage        | failure                 | response |
//! |--------------|-------------------------|----------|
//! | auth         | token mismatch          | 401      |
//! | validating   | bad lat/long, no image  | 400      |
//! | classifying  | recogniser error        | none, caption falls back to `Untitled` |
//! | preparing    | image not a JPEG        | 500      |
//! | publishing   | publish backend error   | 500      |
//!
//! Auth and validation run before any outbound call.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::caption;
use crate::error::{CoordinateIssue, ImageError, PublishError, ValidationError};
use crate::imaging;
use crate::providers::{Publisher, Recogniser};
use crate::telemetry;
use crate::types::Label;
use crate::validation::{self, ImageUpload};

/// Inbound `/tweet` fields, gathered from the query string and body.
#[derive(Debug, Clone, Default)]
pub struct TweetRequest {
    pub auth: Option<String>,
    pub lat: Option<String>,
    pub long: Option<String>,
    pub image: ImageUpload,
}

/// 201 body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TweetResponse {
    pub caption: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Pipeline stage a request is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Unauthenticated,
    Validating,
    Classifying,
    Composing,
    Preparing,
    Publishing,
    Responded,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Unauthenticated => "unauthenticated",
            Stage::Validating => "validating",
            Stage::Classifying => "classifying",
            Stage::Composing => "composing",
            Stage::Preparing => "preparing",
            Stage::Publishing => "publishing",
            Stage::Responded => "responded",
        };
        f.write_str(name)
    }
}

/// Why a request ended without a post.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("invalid auth token")]
    Unauthorized,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("image preparation failed: {0}")]
    Prepare(#[from] ImageError),

    #[error("publish failed: {0}")]
    Publish(#[from] PublishError),
}

impl HandlerError {
    pub fn status(&self) -> StatusCode {
        match self {
            HandlerError::Unauthorized => StatusCode::UNAUTHORIZED,
            HandlerError::Validation(_) => StatusCode::BAD_REQUEST,
            HandlerError::Prepare(_) | HandlerError::Publish(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stage the request was in when it failed.
    pub fn stage(&self) -> Stage {
        match self {
            HandlerError::Unauthorized => Stage::Unauthenticated,
            HandlerError::Validation(_) => Stage::Validating,
            HandlerError::Prepare(_) => Stage::Preparing,
            HandlerError::Publish(_) => Stage::Publishing,
        }
    }

    /// Client-facing message. Never includes upstream details.
    pub fn message(&self) -> &'static str {
        match self {
            HandlerError::Unauthorized => "Invalid auth token",
            HandlerError::Validation(ValidationError::InvalidCoordinates(issue)) => match issue {
                CoordinateIssue::BothOrNeither => {
                    "Longitude and latitude must be provided, or neither"
                }
                CoordinateIssue::NotNumeric => "Latitude and longitude must be decimal numbers",
                CoordinateIssue::OutOfRange => {
                    "Latitude must be within [-90, 90] and longitude within [-180, 180]"
                }
            },
            HandlerError::Validation(ValidationError::MissingImage) => {
                "Failed to read image file from field 'image'"
            }
            HandlerError::Validation(ValidationError::DuplicateImage) => {
                "Only one image file may be sent in field 'image'"
            }
            HandlerError::Prepare(_) => "Failed to prepare image",
            HandlerError::Publish(_) => "Failed to publish post",
        }
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.message())).into_response()
    }
}

/// Runs the pipeline for each `/tweet` request.
///
/// Holds only startup-time state; shared across concurrent requests without
/// locking.
pub struct PostHandler {
    auth_token: String,
    recogniser: Arc<dyn Recogniser>,
    publisher: Arc<dyn Publisher>,
    upscale_width: u32,
}

impl PostHandler {
    pub fn new(
        auth_token: impl Into<String>,
        recogniser: Arc<dyn Recogniser>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            auth_token: auth_token.into(),
            recogniser,
            publisher,
            upscale_width: imaging::DEFAULT_PUBLISH_WIDTH,
        }
    }

    /// Publish width in pixels; 0 publishes uploads unchanged.
    pub fn upscale_width(mut self, width: u32) -> Self {
        self.upscale_width = width;
        self
    }

    /// Handle a request and build the HTTP response, recording metrics.
    pub async fn respond(&self, request: TweetRequest) -> Response {
        let start = Instant::now();
        let result = self.handle(request).await;

        let status = match &result {
            Ok(_) => StatusCode::CREATED,
            Err(e) => e.status(),
        };
        let status_label = status.as_u16().to_string();
        metrics::counter!(telemetry::REQUESTS_TOTAL, "status" => status_label.clone())
            .increment(1);
        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS, "status" => status_label)
            .record(start.elapsed().as_secs_f64());

        match result {
            Ok(body) => (StatusCode::CREATED, Json(body)).into_response(),
            Err(e) => {
                let code = status.as_u16();
                let stage = e.stage();
                if status.is_server_error() {
                    warn!(status = code, %stage, error = %e, "request failed");
                } else {
                    info!(status = code, %stage, error = %e, "request rejected");
                }
                e.into_response()
            }
        }
    }

    /// Run the pipeline.
    #[instrument(name = "tweet", skip_all)]
    pub async fn handle(&self, request: TweetRequest) -> Result<TweetResponse, HandlerError> {
        let provided = request.auth.as_deref().unwrap_or_default();
        if !validation::check_auth(provided, &self.auth_token) {
            return Err(HandlerError::Unauthorized);
        }

        enter(Stage::Validating);
        let coords =
            validation::parse_coordinates(request.lat.as_deref(), request.long.as_deref())?;
        let image = validation::extract_image(request.image)?;
        debug!(
            image_bytes = image.len(),
            geolocated = coords.is_some(),
            "request validated"
        );

        enter(Stage::Classifying);
        let labels = self.classify(image.clone()).await;

        enter(Stage::Composing);
        let caption = caption::compose(&labels, coords);

        enter(Stage::Preparing);
        let prepared = imaging::prepare(image, self.upscale_width).await?;

        enter(Stage::Publishing);
        let receipt = self.publish(&caption, prepared).await?;

        enter(Stage::Responded);
        info!(
            caption = %caption.replace('\n', ""),
            post_id = receipt.post_id.as_deref().unwrap_or("-"),
            "post published"
        );

        Ok(TweetResponse {
            url: receipt.url(),
            post_id: receipt.post_id,
            caption,
        })
    }

    /// Recognition is best-effort: any failure yields no labels.
    async fn classify(&self, image: Bytes) -> Vec<Label> {
        match self.recogniser.classify(image).await {
            Ok(result) => {
                debug!(
                    recogniser = self.recogniser.name(),
                    labels = result.labels().len(),
                    "image classified"
                );
                result.labels().to_vec()
            }
            Err(e) => {
                metrics::counter!(telemetry::RECOGNITION_FAILURES_TOTAL).increment(1);
                warn!(
                    recogniser = self.recogniser.name(),
                    error = %e,
                    "image recognition failed, using fallback caption"
                );
                Vec::new()
            }
        }
    }

    async fn publish(
        &self,
        caption: &str,
        image: Bytes,
    ) -> Result<crate::types::PublishReceipt, PublishError> {
        let mode = if self.publisher.is_log_only() {
            "log_only"
        } else {
            "live"
        };
        let start = Instant::now();
        let result = self.publisher.publish(caption, image).await;
        metrics::histogram!(telemetry::PUBLISH_DURATION_SECONDS, "mode" => mode)
            .record(start.elapsed().as_secs_f64());
        result
    }
}

fn enter(stage: Stage) {
    debug!(%stage, "entering stage");
}
