use serde::{Deserialize, Serialize};

use crate::constants::artifacts::CAPTION_STRIP;

/// Raw Graph API payload. Kept untyped so the JSON artifact is a faithful
/// copy of what the API returned.
pub type MediaResponse = serde_json::Value;

/// One entry of a media listing's `data` array. Only the columns projected
/// into CSV are read; anything else stays in the JSON artifact.
#[derive(Debug, Clone, Deserialize)]
pub struct PostRecord {
    pub id: String,
    pub media_type: Option<String>,
    pub comments_count: i64,
    pub like_count: Option<i64>,
    pub caption: Option<String>,
    pub timestamp: String,
    pub media_url: Option<String>,
    pub permalink: String,
}

/// Flattened CSV projection of a [`PostRecord`]. Field order is column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsvRow {
    pub id: String,
    pub media_type: String,
    pub comments_count: i64,
    pub like_count: i64,
    pub caption: String,
    pub timestamp: String,
    pub media_url: String,
    pub permalink: String,
}

impl From<PostRecord> for CsvRow {
    fn from(post: PostRecord) -> Self {
        Self {
            id: post.id,
            media_type: post.media_type.unwrap_or_default(),
            comments_count: post.comments_count,
            like_count: post.like_count.unwrap_or(0),
            caption: post
                .caption
                .as_deref()
                .map(sanitize_caption)
                .unwrap_or_default(),
            timestamp: post.timestamp,
            media_url: post.media_url.unwrap_or_default(),
            permalink: post.permalink,
        }
    }
}

/// Strips line breaks, commas and U+2615 so a caption fits in one
/// unquoted CSV field.
#[must_use]
pub fn sanitize_caption(caption: &str) -> String {
    caption
        .chars()
        .filter(|c| !CAPTION_STRIP.contains(c))
        .collect()
}

/// The `data` array of a media listing, if the payload has one.
#[must_use]
pub fn posts(response: &MediaResponse) -> Option<&Vec<serde_json::Value>> {
    response.get("data").and_then(serde_json::Value::as_array)
}

/// Whether a payload carries nothing at all (`null`, `false`, `{}`, `[]`, `""`).
#[must_use]
pub fn is_empty_response(response: &MediaResponse) -> bool {
    match response {
        serde_json::Value::Null => true,
        serde_json::Value::Bool(b) => !b,
        serde_json::Value::Object(map) => map.is_empty(),
        serde_json::Value::Array(items) => items.is_empty(),
        serde_json::Value::String(s) => s.is_empty(),
        serde_json::Value::Number(_) => false,
    }
}
