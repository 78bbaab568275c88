//! Recognition labels.

use serde::{Deserialize, Serialize};

/// A single concept the recognition backend found in an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    #[serde(rename = "label")]
    pub text: String,
    pub probability: f32,
}

impl Label {
    pub fn new(text: impl Into<String>, probability: f32) -> Self {
        Self {
            text: text.into(),
            probability,
        }
    }
}

/// Ranked labels for one image, in the order the backend returned them.
///
/// The order is the backend's confidence ranking and is never re-sorted.
/// Labels are fixed once the result is built.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ClassificationResult {
    #[serde(default)]
    filename: Option<String>,
    labels: Vec<Label>,
}

impl ClassificationResult {
    pub fn new(labels: Vec<Label>) -> Self {
        Self {
            filename: None,
            labels,
        }
    }

    /// Labels in backend ranking order.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// File name the backend echoed back, if any.
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
