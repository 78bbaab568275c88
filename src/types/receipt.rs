use serde::Serialize;

/// Base URL used to build a link to a published post.
const POST_URL_BASE: &str = "https://twitter.com";

/// What the publish backend reported about a created post.
///
/// Empty when the publisher runs in log-only mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublishReceipt {
    pub post_id: Option<String>,
    pub author: Option<String>,
}

impl PublishReceipt {
    pub fn new(post_id: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            post_id: Some(post_id.into()),
            author: Some(author.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.post_id.is_none() && self.author.is_none()
    }

    /// Public link to the post, when both the id and author are known.
    pub fn url(&self) -> Option<String> {
        match (&self.author, &self.post_id) {
            (Some(author), Some(id)) => Some(format!("{POST_URL_BASE}/{author}/status/{id}")),
            _ => None,
        }
    }
}
