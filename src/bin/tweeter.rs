//! tweeter: photo captioning and posting service.
//!
//! Every setting can come from the environment, a CLI flag, or the TOML
//! file named by `--config`; the environment and flags win over the file.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use tweeter::config::{Config, CredentialSettings, Environment, Settings};
use tweeter::providers::{PublishClient, RecognitionClient};
use tweeter::server::{self, PostHandler};

/// Captions uploaded photos and posts them.
#[derive(Parser)]
#[command(name = "tweeter")]
#[command(version = tweeter::PKG_VERSION)]
#[command(about = "Photo captioning and posting service")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "TWEETER_CONFIG")]
    config: Option<PathBuf>,

    /// Deployment mode: DEV fills in local defaults, PROD requires everything.
    #[arg(long, env = "TWEETER_ENV")]
    environment: Option<Environment>,

    /// Host to bind to.
    #[arg(long, env = "TWEETER_HOST")]
    host: Option<String>,

    /// Port to listen on.
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Recognition backend endpoint.
    #[arg(long, env = "RECOGNISER_ENDPOINT")]
    recogniser_endpoint: Option<String>,

    /// Shared secret clients must send as `auth`.
    #[arg(long, env = "TWEET_AUTH_TOKEN", hide_env_values = true)]
    auth_token: Option<String>,

    /// Width images are scaled to before posting (0 disables).
    #[arg(long, env = "UPSCALE_WIDTH")]
    upscale_width: Option<u32>,

    /// Timeout for outbound requests, in seconds.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS")]
    request_timeout_secs: Option<u64>,

    /// Publish API base URL.
    #[arg(long, env = "PUBLISH_API_BASE")]
    publish_api_base: Option<String>,

    /// Publish media upload base URL.
    #[arg(long, env = "PUBLISH_UPLOAD_BASE")]
    publish_upload_base: Option<String>,

    #[arg(long, env = "TWITTER_ACCESS_TOKEN", hide = true, hide_env_values = true)]
    twitter_access_token: Option<String>,

    #[arg(long, env = "TWITTER_ACCESS_TOKEN_SECRET", hide = true, hide_env_values = true)]
    twitter_access_token_secret: Option<String>,

    #[arg(long, env = "TWITTER_CONSUMER_KEY", hide = true, hide_env_values = true)]
    twitter_consumer_key: Option<String>,

    #[arg(long, env = "TWITTER_CONSUMER_SECRET", hide = true, hide_env_values = true)]
    twitter_consumer_secret: Option<String>,
}

impl Args {
    fn settings(&self) -> Settings {
        Settings {
            environment: self.environment,
            host: self.host.clone(),
            port: self.port,
            recogniser_endpoint: self.recogniser_endpoint.clone(),
            auth_token: self.auth_token.clone(),
            upscale_width: self.upscale_width,
            request_timeout_secs: self.request_timeout_secs,
            publish_api_base: self.publish_api_base.clone(),
            publish_upload_base: self.publish_upload_base.clone(),
            credentials: CredentialSettings {
                access_token: self.twitter_access_token.clone(),
                access_token_secret: self.twitter_access_token_secret.clone(),
                consumer_key: self.twitter_consumer_key.clone(),
                consumer_secret: self.twitter_consumer_secret.clone(),
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // Load configuration
    let file_settings = match args.config.as_deref() {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let config = Config::resolve(file_settings.overlay(args.settings()))?;

    info!(
        version = tweeter::version_string(),
        environment = %config.environment,
        "tweeter starting"
    );

    // Build backends once; they are shared read-only by every request
    let recogniser = RecognitionClient::new(&config.recogniser_endpoint, config.request_timeout)?;
    info!(endpoint = recogniser.endpoint(), "recognition backend configured");
    let publisher = PublishClient::from_config(&config).await?;
    let handler = PostHandler::new(
        config.auth_token.clone(),
        Arc::new(recogniser),
        Arc::new(publisher),
    )
    .upscale_width(config.upscale_width);

    let listener = TcpListener::bind(&config.address).await?;
    info!(address = %config.address, "listening");

    server::serve(listener, Arc::new(handler), shutdown_signal()).await?;

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutting down"),
        Err(e) => {
            warn!(error = %e, "cannot listen for ctrl-c, running until killed");
            std::future::pending::<()>().await;
        }
    }
}
