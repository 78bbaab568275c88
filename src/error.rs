//! Tweeter error types

use std::fmt;

/// Crate-level error for startup and configuration paths.
#[derive(Debug, thiserror::Error)]
pub enum TweeterError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("publish backend: {0}")]
    Publish(#[from] PublishError),
}

/// Result type alias for Tweeter operations
pub type Result<T> = std::result::Result<T, TweeterError>;

/// Why a coordinate pair was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateIssue {
    /// Exactly one of the pair was supplied.
    BothOrNeither,
    /// A supplied value is not a finite decimal number.
    NotNumeric,
    /// Latitude outside [-90, 90] or longitude outside [-180, 180].
    OutOfRange,
}

impl fmt::Display for CoordinateIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            CoordinateIssue::BothOrNeither => "both or neither required",
            CoordinateIssue::NotNumeric => "not numeric",
            CoordinateIssue::OutOfRange => "out of range",
        };
        f.write_str(reason)
    }
}

/// Malformed or missing request input. Always reported as 400.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid coordinates (lat, long): {0}")]
    InvalidCoordinates(CoordinateIssue),

    #[error("missing image: a single 'image' file field is required")]
    MissingImage,

    #[error("duplicate image: only one 'image' file field is allowed")]
    DuplicateImage,
}

impl ValidationError {
    /// The request field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::InvalidCoordinates(_) => "lat/long",
            ValidationError::MissingImage | ValidationError::DuplicateImage => "image",
        }
    }
}

/// Recognition backend failure. The request pipeline downgrades these to
/// an empty label set.
#[derive(Debug, thiserror::Error)]
pub enum RecognitionError {
    #[error("recogniser unreachable: {0}")]
    Transport(String),

    #[error("recogniser returned status {0}")]
    Status(u16),

    #[error("recogniser response could not be decoded: {0}")]
    Decode(String),
}

/// Publish backend failure.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("publish backend unreachable: {0}")]
    Transport(String),

    #[error("credential verification failed ({status})")]
    Authentication { status: u16 },

    #[error("media upload failed ({status}): {message}")]
    Upload { status: u16, message: String },

    #[error("post creation failed ({status}): {message}")]
    Create { status: u16, message: String },

    #[error("request signing failed: {0}")]
    Signing(String),

    #[error("publish response could not be decoded: {0}")]
    Decode(String),
}

/// Failure while re-encoding the upload for publishing.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("failed to decode image as jpeg: {0}")]
    Decode(String),

    #[error("resized image would be {width}x{height}, over the size limit")]
    TooLarge { width: u32, height: u32 },

    #[error("failed to encode resized image: {0}")]
    Encode(String),

    #[error("image worker failed: {0}")]
    Worker(String),
}
