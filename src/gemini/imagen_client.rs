use crate::{
    error::Result,
    gemini::Transport,
    models::{
        wire::{PredictRequest, PredictResponse},
        GenerationRequest, ImageOperation, ImageResult, RemoteImageResponse,
    },
};
use std::sync::Arc;

/// Text-to-image generation through the Imagen `:predict` endpoint.
#[derive(Clone)]
pub struct ImagenClient {
    transport: Arc<Transport>,
    model: String,
}

impl ImagenClient {
    pub(crate) fn new(transport: Arc<Transport>, model: String) -> Self {
        Self { transport, model }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> String {
        self.transport.endpoint(&self.model, "predict")
    }

    pub async fn generate(&self, request: &GenerationRequest) -> Result<ImageResult> {
        let body = PredictRequest::single_image(
            &request.prompt,
            request.aspect_ratio,
            request.image_size,
        );

        log::info!(
            "Generating image with model: {} ({}, {})",
            self.model,
            request.aspect_ratio,
            request.image_size
        );

        let outcome = match self
            .transport
            .post_json::<_, PredictResponse>(&self.endpoint(), &body)
            .await
        {
            Ok(response) => {
                RemoteImageResponse::Generate(response).into_image_result(ImageOperation::Generate)
            }
            Err(e) => Err(e),
        };

        if let Err(e) = &outcome {
            log::error!("Error calling Gemini API: {}", e);
        }
        outcome
    }
}
