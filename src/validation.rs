//! Request validation: shared-secret auth, the optional coordinate pair,
//! and the uploaded image.
//!
//! All functions here are pure. They run before any outbound call is made,
//! so a request rejected here never reaches the recognition or publish
//! backends.

use bytes::Bytes;

use crate::error::{CoordinateIssue, ValidationError};
use crate::types::Coordinates;

/// Compare a supplied auth token against the configured one.
///
/// Walks the full length of the longer input and folds any length
/// mismatch into the result instead of returning early.
pub fn check_auth(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    let len = provided.len().max(expected.len());

    let mut diff = provided.len() ^ expected.len();
    for i in 0..len {
        let a = provided.get(i).copied().unwrap_or(0);
        let b = expected.get(i).copied().unwrap_or(0);
        diff |= usize::from(a ^ b);
    }
    diff == 0
}

/// Parse the optional `lat`/`long` pair.
///
/// Empty strings count as absent. Returns `Ok(None)` when neither is
/// supplied; a pair is only ever returned complete.
pub fn parse_coordinates(
    lat_raw: Option<&str>,
    long_raw: Option<&str>,
) -> Result<Option<Coordinates>, ValidationError> {
    let lat_raw = lat_raw.filter(|s| !s.is_empty());
    let long_raw = long_raw.filter(|s| !s.is_empty());

    let (lat_raw, long_raw) = match (lat_raw, long_raw) {
        (None, None) => return Ok(None),
        (Some(lat), Some(long)) => (lat, long),
        _ => {
            return Err(ValidationError::InvalidCoordinates(
                CoordinateIssue::BothOrNeither,
            ));
        }
    };

    let (Some(lat), Some(long)) = (parse_finite(lat_raw), parse_finite(long_raw)) else {
        return Err(ValidationError::InvalidCoordinates(
            CoordinateIssue::NotNumeric,
        ));
    };

    Coordinates::new(lat, long)
        .map(Some)
        .ok_or(ValidationError::InvalidCoordinates(CoordinateIssue::OutOfRange))
}

fn parse_finite(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// State of the `image` file field while a request body is being read.
#[derive(Debug, Clone, Default)]
pub enum ImageUpload {
    #[default]
    Absent,
    Received(Bytes),
    /// More than one `image` file field was sent.
    Repeated,
    /// The part was present but could not be read.
    Unreadable(String),
}

impl ImageUpload {
    /// Record one `image` file part.
    pub fn accept(&mut self, data: Bytes) {
        *self = match std::mem::take(self) {
            ImageUpload::Absent => ImageUpload::Received(data),
            ImageUpload::Received(_) | ImageUpload::Repeated => ImageUpload::Repeated,
            unreadable @ ImageUpload::Unreadable(_) => unreadable,
        };
    }

    /// Record a read failure on an `image` part.
    pub fn fail(&mut self, reason: impl Into<String>) {
        if !matches!(self, ImageUpload::Repeated) {
            *self = ImageUpload::Unreadable(reason.into());
        }
    }
}

/// Take the image bytes out of a fully read request.
pub fn extract_image(upload: ImageUpload) -> Result<Bytes, ValidationError> {
    match upload {
        ImageUpload::Received(data) if !data.is_empty() => Ok(data),
        ImageUpload::Received(_) | ImageUpload::Absent => Err(ValidationError::MissingImage),
        ImageUpload::Unreadable(reason) => {
            tracing::debug!(%reason, "image part could not be read");
            Err(ValidationError::MissingImage)
        }
        ImageUpload::Repeated => Err(ValidationError::DuplicateImage),
    }
}
