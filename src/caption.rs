//! Caption composition from recognition labels.
//!
//! `#Tag #Tag ... (lat,long)`: up to five hashtags in backend ranking order,
//! followed by the location when one was supplied. Falls back to
//! [`FALLBACK_CAPTION`] when no usable label is available.

use crate::types::{Coordinates, Label};

/// Maximum number of labels turned into hashtags.
pub const MAX_TAGS: usize = 5;

/// Caption body used when there are no usable labels.
pub const FALLBACK_CAPTION: &str = "Untitled";

/// Build the caption for a post.
pub fn compose(labels: &[Label], coords: Option<Coordinates>) -> String {
    let tags: Vec<String> = labels
        .iter()
        .take(MAX_TAGS)
        .filter_map(|label| hashtag(&label.text))
        .collect();

    let mut caption = if tags.is_empty() {
        FALLBACK_CAPTION.to_string()
    } else {
        tags.join(" ")
    };

    if let Some(coords) = coords {
        caption.push_str(&format!(
            " ({:.5},{:.5})",
            coords.latitude(),
            coords.longitude()
        ));
    }

    caption
}

/// `"polar bear"` → `"#PolarBear"`. `None` if nothing alphanumeric is left.
fn hashtag(text: &str) -> Option<String> {
    let body: String = title_case(text)
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();
    if body.is_empty() {
        None
    } else {
        Some(format!("#{body}"))
    }
}

/// Uppercase the first letter of each word; the rest is left untouched.
/// Any non-alphanumeric character starts a new word.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.push(c);
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}
