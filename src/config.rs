//! Configuration loading for the tweeter service.
//!
//! Raw values are collected into [`Settings`] from two layers, later layers
//! winning:
//! 1. an optional TOML file (`--config <path>`)
//! 2. environment variables / CLI flags
//!
//! [`Config::resolve`] then applies the [`Environment`] rules once at
//! startup. Development fills in local defaults; production requires every
//! value to be set explicitly.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::imaging::DEFAULT_PUBLISH_WIDTH;
use crate::providers::twitter::{DEFAULT_API_BASE, DEFAULT_UPLOAD_BASE};
use crate::{Result, TweeterError};

/// Recognition endpoint used in development when none is configured.
pub const DEV_RECOGNISER_ENDPOINT: &str = "http://imagerec:8080/recognize";

/// Auth token used in development when none is configured.
pub const DEV_AUTH_TOKEN: &str = "dev";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Deployment mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum Environment {
    #[serde(rename = "DEV", alias = "dev", alias = "development")]
    Development,
    #[default]
    #[serde(rename = "PROD", alias = "prod", alias = "production")]
    Production,
}

impl FromStr for Environment {
    type Err = TweeterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Development),
            "prod" | "production" => Ok(Environment::Production),
            other => Err(TweeterError::Configuration(format!(
                "unknown environment {other:?} (expected DEV or PROD)"
            ))),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => f.write_str("DEV"),
            Environment::Production => f.write_str("PROD"),
        }
    }
}

/// Publish backend credentials. Either all four are known or the publisher
/// runs in log-only mode.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct PublishCredentials {
    pub access_token: String,
    pub access_token_secret: String,
    pub consumer_key: String,
    pub consumer_secret: String,
}

impl fmt::Debug for PublishCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishCredentials")
            .field("consumer_key", &self.consumer_key)
            .finish_non_exhaustive()
    }
}

/// Credential fields as supplied; any may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CredentialSettings {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub access_token_secret: Option<String>,
    #[serde(default)]
    pub consumer_key: Option<String>,
    #[serde(default)]
    pub consumer_secret: Option<String>,
}

impl CredentialSettings {
    /// Number of credential fields that are set and non-empty.
    pub fn present(&self) -> usize {
        [
            &self.access_token,
            &self.access_token_secret,
            &self.consumer_key,
            &self.consumer_secret,
        ]
        .iter()
        .filter(|v| v.as_deref().is_some_and(|s| !s.is_empty()))
        .count()
    }

    /// All four credentials, or `None` if any is missing.
    pub fn complete(&self) -> Option<PublishCredentials> {
        let field = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());
        Some(PublishCredentials {
            access_token: field(&self.access_token)?,
            access_token_secret: field(&self.access_token_secret)?,
            consumer_key: field(&self.consumer_key)?,
            consumer_secret: field(&self.consumer_secret)?,
        })
    }

    fn overlay(self, over: CredentialSettings) -> Self {
        Self {
            access_token: over.access_token.or(self.access_token),
            access_token_secret: over.access_token_secret.or(self.access_token_secret),
            consumer_key: over.consumer_key.or(self.consumer_key),
            consumer_secret: over.consumer_secret.or(self.consumer_secret),
        }
    }
}

/// Raw, unresolved configuration values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub environment: Option<Environment>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub recogniser_endpoint: Option<String>,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub upscale_width: Option<u32>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub publish_api_base: Option<String>,
    #[serde(default)]
    pub publish_upload_base: Option<String>,
    #[serde(default)]
    pub credentials: CredentialSettings,
}

impl Settings {
    /// Read settings from a TOML file.
    ///
    /// A file holding credentials must not be readable by group or others.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            TweeterError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        let settings: Settings = toml::from_str(&content).map_err(|e| {
            TweeterError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })?;
        if settings.credentials.present() > 0 {
            check_permissions(path)?;
        }
        Ok(settings)
    }

    /// Layer `over` on top of `self`; values set in `over` win.
    pub fn overlay(self, over: Settings) -> Self {
        Self {
            environment: over.environment.or(self.environment),
            host: over.host.or(self.host),
            port: over.port.or(self.port),
            recogniser_endpoint: over.recogniser_endpoint.or(self.recogniser_endpoint),
            auth_token: over.auth_token.or(self.auth_token),
            upscale_width: over.upscale_width.or(self.upscale_width),
            request_timeout_secs: over.request_timeout_secs.or(self.request_timeout_secs),
            publish_api_base: over.publish_api_base.or(self.publish_api_base),
            publish_upload_base: over.publish_upload_base.or(self.publish_upload_base),
            credentials: self.credentials.overlay(over.credentials),
        }
    }
}

/// Check that a file holding secrets has secure permissions (0600 or 0400).
#[cfg(unix)]
fn check_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path).map_err(|e| {
        TweeterError::Configuration(format!("Failed to stat config file {path:?}: {e}"))
    })?;

    let mode = metadata.permissions().mode();
    if mode & 0o077 != 0 {
        return Err(TweeterError::Configuration(format!(
            "Config file {path:?} holds credentials but has insecure permissions {:o}. Must be 0600 or 0400.",
            mode & 0o777
        )));
    }

    Ok(())
}

#[cfg(not(unix))]
fn check_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

/// Fully resolved service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    /// Address to bind to, `host:port`.
    pub address: String,
    pub recogniser_endpoint: String,
    pub auth_token: String,
    /// `None` means the publisher runs in log-only mode.
    pub credentials: Option<PublishCredentials>,
    /// Publish width in pixels; 0 publishes the upload unchanged.
    pub upscale_width: u32,
    /// Timeout applied to every outbound request.
    pub request_timeout: Duration,
    pub publish_api_base: String,
    pub publish_upload_base: String,
}

impl Config {
    /// Apply defaults and mode rules to raw settings.
    pub fn resolve(settings: Settings) -> Result<Self> {
        let environment = settings.environment.unwrap_or_default();
        let dev = environment == Environment::Development;

        let recogniser_endpoint = match settings.recogniser_endpoint.filter(|s| !s.is_empty()) {
            Some(endpoint) => endpoint,
            None if dev => DEV_RECOGNISER_ENDPOINT.to_string(),
            None => return Err(missing("RECOGNISER_ENDPOINT")),
        };

        let auth_token = match settings.auth_token.filter(|s| !s.is_empty()) {
            Some(token) => token,
            None if dev => DEV_AUTH_TOKEN.to_string(),
            None => return Err(missing("TWEET_AUTH_TOKEN")),
        };

        let credentials = match settings.credentials.complete() {
            Some(credentials) => Some(credentials),
            None if !dev => {
                return Err(TweeterError::Configuration(
                    "TWITTER_ credentials incomplete: all four of TWITTER_ACCESS_TOKEN, \
                     TWITTER_ACCESS_TOKEN_SECRET, TWITTER_CONSUMER_KEY and \
                     TWITTER_CONSUMER_SECRET are required in PROD"
                        .to_string(),
                ));
            }
            None => {
                let present = settings.credentials.present();
                if present > 0 {
                    warn!(present, "partial publish credentials ignored, using log-only mode");
                }
                None
            }
        };

        let host = settings.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = settings.port.unwrap_or(DEFAULT_PORT);

        Ok(Self {
            environment,
            address: format!("{host}:{port}"),
            recogniser_endpoint,
            auth_token,
            credentials,
            upscale_width: settings.upscale_width.unwrap_or(DEFAULT_PUBLISH_WIDTH),
            request_timeout: Duration::from_secs(
                settings.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            publish_api_base: settings
                .publish_api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            publish_upload_base: settings
                .publish_upload_base
                .unwrap_or_else(|| DEFAULT_UPLOAD_BASE.to_string()),
        })
    }
}

fn missing(var: &str) -> TweeterError {
    TweeterError::Configuration(format!("{var} not set (required in PROD)"))
}
