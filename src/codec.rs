//! Base64 payload helpers and `data:` URL framing.

use crate::error::{Result, StudioError};
use base64::{engine::general_purpose::STANDARD, Engine};

pub const DISPLAY_MIME_TYPE: &str = "image/jpeg";

pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode(payload: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(payload)
        .map_err(|e| StudioError::Validation(format!("Invalid base64 payload: {}", e)))
}

/// Composes the displayable form. Results are always labelled as JPEG.
pub fn to_data_url(payload: &str) -> String {
    format!("data:{};base64,{}", DISPLAY_MIME_TYPE, payload)
}

/// Returns the payload after the first comma, if any.
pub fn strip_data_url_prefix(data_url: &str) -> Option<&str> {
    data_url
        .split_once(',')
        .map(|(_, payload)| payload)
        .filter(|payload| !payload.is_empty())
}

pub fn mime_type_for_extension(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        _ => None,
    }
}
