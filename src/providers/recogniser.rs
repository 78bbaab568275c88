//! HTTP client for the image-recognition backend.
//!
//! The backend takes a multipart upload with a single `image` file part and
//! answers with ranked labels:
//!
//! ```json
//! { "filename": "Untitled.jpg", "labels": [{ "label": "polar bear", "probability": 0.9 }] }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use reqwest::multipart::{Form, Part};

use super::traits::Recogniser;
use crate::error::RecognitionError;
use crate::types::ClassificationResult;
use crate::TweeterError;

/// File name sent with the image part; the backend only echoes it back.
const UPLOAD_FILE_NAME: &str = "Untitled.jpg";

/// Client for the recognition backend at a fixed endpoint.
#[derive(Clone)]
pub struct RecognitionClient {
    http: Client,
    endpoint: String,
}

impl RecognitionClient {
    /// Create a client posting to `endpoint` with the given request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> crate::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TweeterError::Http(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one image for classification.
    ///
    /// Anything other than a 200 with a well-formed body is an error. There
    /// is no retry.
    pub async fn classify(
        &self,
        image: Bytes,
    ) -> Result<ClassificationResult, RecognitionError> {
        let part = Part::stream(image)
            .file_name(UPLOAD_FILE_NAME)
            .mime_str("image/jpeg")
            .map_err(|e| RecognitionError::Transport(e.to_string()))?;
        let form = Form::new().part("image", part);

        let response = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| RecognitionError::Transport(e.to_string()))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(RecognitionError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| RecognitionError::Decode(e.to_string()))?;

        serde_json::from_slice(&body).map_err(|e| RecognitionError::Decode(e.to_string()))
    }
}

#[async_trait]
impl Recogniser for RecognitionClient {
    fn name(&self) -> &str {
        "recogniser"
    }

    async fn classify(&self, image: Bytes) -> Result<ClassificationResult, RecognitionError> {
        RecognitionClient::classify(self, image).await
    }
}
