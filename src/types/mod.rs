//! Public types for the Tweeter pipeline.

mod geo;
mod label;
mod receipt;

pub use geo::Coordinates;
pub use label::{ClassificationResult, Label};
pub use receipt::PublishReceipt;
