//! Clients for the two external backends.
//!
//! - [`RecognitionClient`] asks the image-recognition service for labels.
//! - [`PublishClient`] posts the captioned image, or only logs it when no
//!   credentials are configured.
//!
//! The request pipeline reaches both through the [`Recogniser`] and
//! [`Publisher`] traits so alternate backends can be swapped in.

pub mod oauth;
pub mod recogniser;
pub mod traits;
pub mod twitter;

pub use oauth::OAuth1Signer;
pub use recogniser::RecognitionClient;
pub use traits::{Publisher, Recogniser};
pub use twitter::{PublishClient, PublishEndpoints};
