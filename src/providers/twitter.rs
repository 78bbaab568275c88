//! Publish client for the Twitter v1.1 API.
//!
//! Built once at startup. With credentials it verifies them, caches the
//! account handle, and publishes by uploading the image and then creating a
//! post that references the returned media id. Without credentials it runs
//! in log-only mode for the life of the process.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::{info, instrument};

use super::oauth::{OAuth1Signer, encode_pairs};
use super::traits::Publisher;
use crate::TweeterError;
use crate::config::{Config, PublishCredentials};
use crate::error::PublishError;
use crate::types::PublishReceipt;

/// Default base URL for the REST API.
pub const DEFAULT_API_BASE: &str = "https://api.twitter.com";

/// Default base URL for media uploads.
pub const DEFAULT_UPLOAD_BASE: &str = "https://upload.twitter.com";

const VERIFY_PATH: &str = "/1.1/account/verify_credentials.json";
const UPLOAD_PATH: &str = "/1.1/media/upload.json";
const UPDATE_PATH: &str = "/1.1/statuses/update.json";

/// Upstream error bodies are cut to this many characters.
const MAX_ERROR_BODY: usize = 200;

/// Where the publish backend lives.
#[derive(Debug, Clone)]
pub struct PublishEndpoints {
    pub api_base: String,
    pub upload_base: String,
}

impl Default for PublishEndpoints {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            upload_base: DEFAULT_UPLOAD_BASE.to_string(),
        }
    }
}

impl PublishEndpoints {
    /// Same host for API and uploads (for testing with wiremock).
    pub fn single(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            api_base: base_url.clone(),
            upload_base: base_url,
        }
    }
}

/// Publishes captioned images, or logs them in log-only mode.
pub struct PublishClient {
    mode: Mode,
}

enum Mode {
    LogOnly,
    Authenticated(Session),
}

/// Verified account, shared read-only across requests.
struct Session {
    http: Client,
    signer: OAuth1Signer,
    endpoints: PublishEndpoints,
    screen_name: String,
}

impl PublishClient {
    /// A client that never contacts the backend.
    pub fn log_only() -> Self {
        Self {
            mode: Mode::LogOnly,
        }
    }

    /// Build from resolved configuration.
    pub async fn from_config(config: &Config) -> crate::Result<Self> {
        let endpoints = PublishEndpoints {
            api_base: config.publish_api_base.clone(),
            upload_base: config.publish_upload_base.clone(),
        };
        Self::connect(config.credentials.clone(), endpoints, config.request_timeout).await
    }

    /// Verify `credentials` and cache the account, or fall back to log-only
    /// mode when there are none. Verification failure is an error; it is not
    /// retried later.
    pub async fn connect(
        credentials: Option<PublishCredentials>,
        endpoints: PublishEndpoints,
        timeout: Duration,
    ) -> crate::Result<Self> {
        let Some(credentials) = credentials else {
            info!("no publish credentials, posts will only be logged");
            return Ok(Self::log_only());
        };

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TweeterError::Http(e.to_string()))?;
        let signer = OAuth1Signer::new(&credentials);

        let screen_name = verify_credentials(&http, &signer, &endpoints).await?;
        info!(account = %screen_name, "publish credentials verified");

        Ok(Self {
            mode: Mode::Authenticated(Session {
                http,
                signer,
                endpoints,
                screen_name,
            }),
        })
    }

    pub fn is_log_only(&self) -> bool {
        matches!(self.mode, Mode::LogOnly)
    }

    /// Handle of the verified account, if any.
    pub fn account(&self) -> Option<&str> {
        match &self.mode {
            Mode::LogOnly => None,
            Mode::Authenticated(session) => Some(&session.screen_name),
        }
    }

    /// Publish an image with its caption. Always succeeds in log-only mode.
    pub async fn publish(
        &self,
        caption: &str,
        image: Bytes,
    ) -> Result<PublishReceipt, PublishError> {
        match &self.mode {
            Mode::LogOnly => {
                info!(
                    caption = %caption.replace('\n', "\\n"),
                    image_bytes = image.len(),
                    "log-only mode, post not published"
                );
                Ok(PublishReceipt::default())
            }
            Mode::Authenticated(session) => {
                let media_id = session.upload(image).await?;
                session.create(caption, &media_id).await
            }
        }
    }
}

impl Session {
    #[instrument(skip(self, image), fields(image_bytes = image.len()))]
    async fn upload(&self, image: Bytes) -> Result<String, PublishError> {
        let url = format!("{}{UPLOAD_PATH}", self.endpoints.upload_base);
        let auth = self.signer.authorization("POST", &url, &[])?;

        let part = Part::stream(image).file_name("tweet_image");
        let response = self
            .http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, auth)
            .multipart(Form::new().part("media", part))
            .send()
            .await
            .map_err(|e| PublishError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Err(PublishError::Upload {
                status,
                message: upstream_message(response).await,
            });
        }

        let media: MediaResponse = decode(response).await?;
        Ok(media.media_id_string)
    }

    #[instrument(skip(self, caption))]
    async fn create(
        &self,
        caption: &str,
        media_id: &str,
    ) -> Result<PublishReceipt, PublishError> {
        let url = format!("{}{UPDATE_PATH}", self.endpoints.api_base);
        let params = [("status", caption), ("media_ids", media_id)];
        let auth = self.signer.authorization("POST", &url, &params)?;

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, auth)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(encode_pairs(&params))
            .send()
            .await
            .map_err(|e| PublishError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Err(PublishError::Create {
                status,
                message: upstream_message(response).await,
            });
        }

        let post: StatusResponse = decode(response).await?;
        let author = post
            .user
            .map(|u| u.screen_name)
            .unwrap_or_else(|| self.screen_name.clone());
        Ok(PublishReceipt::new(post.id_str, author))
    }
}

async fn verify_credentials(
    http: &Client,
    signer: &OAuth1Signer,
    endpoints: &PublishEndpoints,
) -> Result<String, PublishError> {
    let url = format!("{}{VERIFY_PATH}", endpoints.api_base);
    let params = [("include_email", "true"), ("skip_status", "true")];
    let auth = signer.authorization("GET", &url, &params)?;

    let response = http
        .get(format!("{url}?{}", encode_pairs(&params)))
        .header(reqwest::header::AUTHORIZATION, auth)
        .send()
        .await
        .map_err(|e| PublishError::Transport(e.to_string()))?;

    if !response.status().is_success() {
        return Err(PublishError::Authentication {
            status: response.status().as_u16(),
        });
    }

    let user: UserResponse = decode(response).await?;
    Ok(user.screen_name)
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, PublishError> {
    response
        .json()
        .await
        .map_err(|e| PublishError::Decode(e.to_string()))
}

/// First upstream error message, or the raw body cut short.
async fn upstream_message(response: Response) -> String {
    let body = response.text().await.unwrap_or_default();
    if let Ok(parsed) = serde_json::from_str::<ErrorResponse>(&body)
        && let Some(first) = parsed.errors.into_iter().next()
    {
        return format!("{} (code {})", first.message, first.code);
    }
    body.chars().take(MAX_ERROR_BODY).collect()
}

#[derive(Deserialize)]
struct UserResponse {
    screen_name: String,
}

#[derive(Deserialize)]
struct MediaResponse {
    media_id_string: String,
}

#[derive(Deserialize)]
struct StatusResponse {
    id_str: String,
    #[serde(default)]
    user: Option<UserResponse>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    errors: Vec<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    code: i64,
    message: String,
}

#[async_trait]
impl Publisher for PublishClient {
    fn name(&self) -> &str {
        "twitter"
    }

    fn is_log_only(&self) -> bool {
        PublishClient::is_log_only(self)
    }

    async fn publish(&self, caption: &str, image: Bytes) -> Result<PublishReceipt, PublishError> {
        PublishClient::publish(self, caption, image).await
    }
}
