use crate::{
    error::Result,
    gemini::Transport,
    models::{
        wire::{GenerateContentRequest, GenerateContentResponse},
        EditRequest, ImageOperation, ImageResult, RemoteImageResponse, UpscaleRequest,
    },
};
use std::sync::Arc;

/// Image editing and upscaling through the multimodal `:generateContent` endpoint.
#[derive(Clone)]
pub struct ContentClient {
    transport: Arc<Transport>,
    model: String,
}

impl ContentClient {
    pub(crate) fn new(transport: Arc<Transport>, model: String) -> Self {
        Self { transport, model }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> String {
        self.transport.endpoint(&self.model, "generateContent")
    }

    pub async fn edit(&self, request: &EditRequest) -> Result<ImageResult> {
        let body = GenerateContentRequest::image_with_text(
            &request.source.encoded(),
            &request.source.mime_type,
            &request.prompt,
        );

        log::info!(
            "Editing {} ({} KB) with model: {}",
            request.source.name,
            request.source.size_kb(),
            self.model
        );
        self.invoke(&body, ImageOperation::Edit).await
    }

    pub async fn upscale(&self, request: &UpscaleRequest) -> Result<ImageResult> {
        let body = GenerateContentRequest::image_with_text(
            &request.encoded_image,
            &request.mime_type,
            &request.instruction(),
        );

        log::info!(
            "Upscaling image by {}x with model: {}",
            request.factor,
            self.model
        );
        self.invoke(&body, ImageOperation::Upscale).await
    }

    async fn invoke(
        &self,
        body: &GenerateContentRequest,
        operation: ImageOperation,
    ) -> Result<ImageResult> {
        let outcome = match self
            .transport
            .post_json::<_, GenerateContentResponse>(&self.endpoint(), body)
            .await
        {
            Ok(response) => RemoteImageResponse::Multimodal(response).into_image_result(operation),
            Err(e) => Err(e),
        };

        if let Err(e) = &outcome {
            log::error!(
                "Error calling Gemini API for image {}: {}",
                operation.as_str(),
                e
            );
        }
        outcome
    }
}
