//! Backend traits used by the request pipeline.
//!
//! The handler holds `Arc<dyn Recogniser>` and `Arc<dyn Publisher>` built
//! once at startup. Implementations must be cheap to share across
//! concurrent requests and must not retry internally: a single failure is
//! reported straight back to the pipeline.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{PublishError, RecognitionError};
use crate::types::{ClassificationResult, PublishReceipt};

/// Image classification backend.
#[async_trait]
pub trait Recogniser: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Classify an image. Labels come back in the backend's ranking order.
    async fn classify(&self, image: Bytes) -> Result<ClassificationResult, RecognitionError>;
}

/// Post publishing backend.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Whether posts are only logged instead of published.
    fn is_log_only(&self) -> bool {
        false
    }

    /// Publish an image with its caption.
    async fn publish(&self, caption: &str, image: Bytes) -> Result<PublishReceipt, PublishError>;
}
