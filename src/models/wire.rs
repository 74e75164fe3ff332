//! Request and response bodies of the Imagen `:predict` and Gemini
//! `:generateContent` endpoints.

use crate::{
    error::{Result, StudioError},
    models::{
        common::{AspectRatio, ImageOperation, ImageSize},
        image::ImageResult,
    },
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictRequest {
    pub instances: Vec<PredictInstance>,
    pub parameters: PredictParameters,
}

#[derive(Debug, Serialize)]
pub struct PredictInstance {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictParameters {
    pub sample_count: u32,
    pub aspect_ratio: AspectRatio,
    pub image_size: ImageSize,
    pub output_options: OutputOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputOptions {
    pub mime_type: String,
}

impl PredictRequest {
    pub fn single_image(prompt: &str, aspect_ratio: AspectRatio, image_size: ImageSize) -> Self {
        Self {
            instances: vec![PredictInstance {
                prompt: prompt.to_string(),
            }],
            parameters: PredictParameters {
                sample_count: 1,
                aspect_ratio,
                image_size,
                output_options: OutputOptions {
                    mime_type: "image/jpeg".to_string(),
                },
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PredictResponse {
    #[serde(default)]
    pub predictions: Vec<Prediction>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub bytes_base64_encoded: Option<String>,
    pub mime_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<String>,
}

impl GenerateContentRequest {
    /// An inline image followed by a text instruction, asking for image and text back.
    pub fn image_with_text(encoded_image: &str, mime_type: &str, text: &str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![
                    Part {
                        inline_data: Some(InlineData {
                            mime_type: Some(mime_type.to_string()),
                            data: Some(encoded_image.to_string()),
                        }),
                        text: None,
                    },
                    Part {
                        inline_data: None,
                        text: Some(text.to_string()),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["IMAGE".to_string(), "TEXT".to_string()],
            },
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
}

/// Google API error envelope: `{"error": {"code": 400, "message": "...", "status": "..."}}`.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub code: Option<u16>,
    pub message: Option<String>,
    pub status: Option<String>,
}

/// The two response shapes an image can come back in.
#[derive(Debug)]
pub enum RemoteImageResponse {
    Generate(PredictResponse),
    Multimodal(GenerateContentResponse),
}

impl RemoteImageResponse {
    pub fn into_image_result(self, operation: ImageOperation) -> Result<ImageResult> {
        match self {
            RemoteImageResponse::Generate(response) => {
                let first = response
                    .predictions
                    .into_iter()
                    .next()
                    .ok_or(StudioError::EmptyResult)?;
                first
                    .bytes_base64_encoded
                    .filter(|data| !data.is_empty())
                    .map(ImageResult::new)
                    .ok_or_else(|| missing_image(operation))
            }
            RemoteImageResponse::Multimodal(response) => response
                .candidates
                .into_iter()
                .next()
                .and_then(|candidate| candidate.content)
                .and_then(|content| content.parts.into_iter().find_map(|part| part.inline_data))
                .and_then(|inline| inline.data)
                .filter(|data| !data.is_empty())
                .map(ImageResult::new)
                .ok_or_else(|| missing_image(operation)),
        }
    }
}

fn missing_image(operation: ImageOperation) -> StudioError {
    StudioError::MalformedResponse(operation.missing_image_message().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn multimodal(value: serde_json::Value) -> RemoteImageResponse {
        RemoteImageResponse::Multimodal(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn test_predict_request_shape() {
        let body = PredictRequest::single_image(
            "A robot holding a red skateboard.",
            AspectRatio::Portrait,
            ImageSize::TwoK,
        );
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "instances": [{"prompt": "A robot holding a red skateboard."}],
                "parameters": {
                    "sampleCount": 1,
                    "aspectRatio": "9:16",
                    "imageSize": "2K",
                    "outputOptions": {"mimeType": "image/jpeg"}
                }
            })
        );
    }

    #[test]
    fn test_generate_content_request_shape() {
        let body = GenerateContentRequest::image_with_text("QUJD", "image/png", "make it blue");
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "contents": [{"parts": [
                    {"inlineData": {"mimeType": "image/png", "data": "QUJD"}},
                    {"text": "make it blue"}
                ]}],
                "generationConfig": {"responseModalities": ["IMAGE", "TEXT"]}
            })
        );
    }

    #[test]
    fn test_generate_shape_normalizes_first_prediction() {
        let response: PredictResponse = serde_json::from_value(json!({
            "predictions": [
                {"bytesBase64Encoded": "Zmlyc3Q=", "mimeType": "image/jpeg"},
                {"bytesBase64Encoded": "c2Vjb25k", "mimeType": "image/jpeg"}
            ]
        }))
        .unwrap();
        let result = RemoteImageResponse::Generate(response)
            .into_image_result(ImageOperation::Generate)
            .unwrap();
        assert_eq!(result.encoded_image_data, "Zmlyc3Q=");
    }

    #[test]
    fn test_generate_shape_empty_and_malformed() {
        let empty: PredictResponse = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(
            RemoteImageResponse::Generate(empty).into_image_result(ImageOperation::Generate),
            Err(StudioError::EmptyResult)
        ));

        let no_bytes: PredictResponse =
            serde_json::from_value(json!({"predictions": [{"mimeType": "image/jpeg"}]})).unwrap();
        let err = RemoteImageResponse::Generate(no_bytes)
            .into_image_result(ImageOperation::Generate)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Gemini API Error: The API response did not contain valid image data."
        );
    }

    #[test]
    fn test_multimodal_shape_skips_text_parts() {
        let response = multimodal(json!({
            "candidates": [{"content": {"parts": [
                {"text": "Here is your image"},
                {"inlineData": {"mimeType": "image/png", "data": "aW1hZ2U="}},
                {"inlineData": {"mimeType": "image/png", "data": "bGF0ZXI="}}
            ]}}]
        }));
        let result = response.into_image_result(ImageOperation::Edit).unwrap();
        assert_eq!(result.encoded_image_data, "aW1hZ2U=");
    }

    #[test]
    fn test_multimodal_shape_without_image() {
        let text_only = multimodal(json!({
            "candidates": [{"content": {"parts": [{"text": "I can't do that"}]}}]
        }));
        let err = text_only
            .into_image_result(ImageOperation::Upscale)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Gemini API Error: The API response did not contain valid upscaled image data."
        );

        let no_candidates = multimodal(json!({"candidates": []}));
        assert!(matches!(
            no_candidates.into_image_result(ImageOperation::Edit),
            Err(StudioError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_multimodal_first_inline_part_must_carry_data() {
        let empty_first = multimodal(json!({
            "candidates": [{"content": {"parts": [
                {"inlineData": {"mimeType": "image/png", "data": ""}},
                {"inlineData": {"mimeType": "image/png", "data": "aW1hZ2U="}}
            ]}}]
        }));
        assert!(matches!(
            empty_first.into_image_result(ImageOperation::Edit),
            Err(StudioError::MalformedResponse(_))
        ));

        let missing_first = multimodal(json!({
            "candidates": [{"content": {"parts": [
                {"text": "working on it"},
                {"inlineData": {"mimeType": "image/png"}},
                {"inlineData": {"mimeType": "image/png", "data": "aW1hZ2U="}}
            ]}}]
        }));
        let err = missing_first
            .into_image_result(ImageOperation::Edit)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Gemini API Error: The API response did not contain valid edited image data."
        );
    }

    #[test]
    fn test_error_envelope() {
        let envelope: ErrorEnvelope = serde_json::from_value(json!({
            "error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}
        }))
        .unwrap();
        assert_eq!(envelope.error.code, Some(400));
        assert_eq!(envelope.error.message.as_deref(), Some("API key not valid."));
    }
}
