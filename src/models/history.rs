use crate::models::common::{AspectRatio, ImageSize};
use serde::{Deserialize, Serialize};

/// One past successful generation or edit, enough to restore the session to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
    pub image_size: ImageSize,
    pub image_url: String,
}
