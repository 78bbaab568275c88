//! Tweeter - caption uploaded photos and post them.
//!
//! A small HTTP service: a camera uploads a JPEG to `POST /tweet`, the
//! service asks an image-recognition backend what is in it, turns the top
//! labels into hashtags (plus the location, when given) and posts the photo
//! with that caption through the Twitter API. Without publish credentials
//! the post is only logged.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use tweeter::providers::{PublishClient, RecognitionClient};
//! use tweeter::server::{self, PostHandler};
//!
//! #[tokio::main]
//! async fn main() -> tweeter::Result<()> {
//!     let recogniser = RecognitionClient::new(
//!         "http://imagerec:8080/recognize",
//!         Duration::from_secs(30),
//!     )?;
//!     let handler = PostHandler::new(
//!         "dev",
//!         Arc::new(recogniser),
//!         Arc::new(PublishClient::log_only()),
//!     );
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//!     server::serve(listener, Arc::new(handler), std::future::pending()).await?;
//!     Ok(())
//! }
//! ```

pub mod caption;
pub mod config;
pub mod error;
pub mod imaging;
pub mod providers;
pub mod server;
pub mod telemetry;
pub mod types;
pub mod validation;
mod version;

pub use error::{
    CoordinateIssue, ImageError, PublishError, RecognitionError, Result, TweeterError,
    ValidationError,
};
pub use types::{ClassificationResult, Coordinates, Label, PublishReceipt};
pub use version::{BUILD_TIMESTAMP, GIT_BRANCH, GIT_SHA, PKG_VERSION, version_string};
