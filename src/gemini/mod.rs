pub mod content_client;
pub mod imagen_client;

use crate::{
    config::GeminiConfig,
    error::{Result, StudioError},
    models::{
        wire::ErrorEnvelope, EditRequest, GenerationRequest, ImageResult, UpscaleRequest,
    },
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

pub use content_client::ContentClient;
pub use imagen_client::ImagenClient;

/// The remote image service as seen by the studio.
#[async_trait]
pub trait ImageService: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<ImageResult>;
    async fn edit(&self, request: &EditRequest) -> Result<ImageResult>;
    async fn upscale(&self, request: &UpscaleRequest) -> Result<ImageResult>;
}

#[derive(Clone)]
pub struct GeminiClient {
    imagen_client: ImagenClient,
    content_client: ContentClient,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| StudioError::Config(e.to_string()))?;
        let transport = Arc::new(Transport {
            http,
            base_url: config.base_url,
            api_key: config.api_key,
        });

        log::debug!(
            "Gemini client ready (imagen: {}, content: {})",
            config.imagen_model,
            config.content_model
        );

        Ok(Self {
            imagen_client: ImagenClient::new(transport.clone(), config.imagen_model),
            content_client: ContentClient::new(transport, config.content_model),
        })
    }

    pub fn imagen(&self) -> &ImagenClient {
        &self.imagen_client
    }

    pub fn content(&self) -> &ContentClient {
        &self.content_client
    }
}

#[async_trait]
impl ImageService for GeminiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<ImageResult> {
        self.imagen_client.generate(request).await
    }

    async fn edit(&self, request: &EditRequest) -> Result<ImageResult> {
        self.content_client.edit(request).await
    }

    async fn upscale(&self, request: &UpscaleRequest) -> Result<ImageResult> {
        self.content_client.upscale(request).await
    }
}

/// Shared HTTP plumbing: one credentialed client for every endpoint.
pub(crate) struct Transport {
    http: Client,
    base_url: String,
    api_key: String,
}

impl Transport {
    pub(crate) fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    pub(crate) async fn post_json<B, R>(&self, url: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(StudioError::Service(upstream_message(status, &text)));
        }

        serde_json::from_str(&text).map_err(|e| {
            StudioError::MalformedResponse(format!("Unreadable response body: {}", e))
        })
    }
}

pub(crate) fn upstream_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| format!("HTTP {}", status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AspectRatio, ImageSize, SourceImage};
    use reqwest::StatusCode;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answers a single HTTP request with a canned response and returns the base URL.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&chunk[..n]);
                if let Some(end) = received.windows(4).position(|w| w == b"\r\n\r\n") {
                    let headers = String::from_utf8_lossy(&received[..end]).to_ascii_lowercase();
                    let length = headers
                        .lines()
                        .find_map(|line| line.strip_prefix("content-length:"))
                        .and_then(|value| value.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if received.len() >= end + 4 + length {
                        break;
                    }
                }
            }

            let response = format!(
                "{}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        format!("http://{}/v1beta", addr)
    }

    fn client_for(base_url: &str) -> GeminiClient {
        GeminiClient::new(GeminiConfig::new("key").with_base_url(base_url)).unwrap()
    }

    fn lighthouse() -> GenerationRequest {
        GenerationRequest::new("a lighthouse", AspectRatio::Square, ImageSize::TwoK).unwrap()
    }

    #[test]
    fn test_upstream_message_prefers_envelope() {
        let body = r#"{"error":{"code":429,"message":"Resource has been exhausted","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(
            upstream_message(StatusCode::TOO_MANY_REQUESTS, body),
            "Resource has been exhausted"
        );
        assert_eq!(
            upstream_message(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>"),
            "HTTP 502 Bad Gateway"
        );
    }

    #[test]
    fn test_endpoints() {
        let client = GeminiClient::new(GeminiConfig::new("key").with_base_url("http://localhost:9/v1beta"))
            .unwrap();
        assert_eq!(
            client.imagen().endpoint(),
            "http://localhost:9/v1beta/models/imagen-4.0-generate-001:predict"
        );
        assert_eq!(
            client.content().endpoint(),
            "http://localhost:9/v1beta/models/gemini-2.5-flash-image:generateContent"
        );
    }

    #[tokio::test]
    async fn test_unreachable_service_is_service_error() {
        let client = GeminiClient::new(GeminiConfig::new("key").with_base_url("http://127.0.0.1:9/v1beta"))
            .unwrap();
        let err = client.generate(&lighthouse()).await.unwrap_err();
        assert!(matches!(err, StudioError::Service(_)));
        assert!(err.to_string().starts_with("Gemini API Error: "));
    }

    #[tokio::test]
    async fn test_error_status_forwards_envelope_message() {
        let base_url = serve_once(
            "HTTP/1.1 429 Too Many Requests",
            r#"{"error":{"code":429,"message":"Resource has been exhausted","status":"RESOURCE_EXHAUSTED"}}"#,
        )
        .await;

        let err = client_for(&base_url)
            .generate(&lighthouse())
            .await
            .unwrap_err();
        assert!(matches!(&err, StudioError::Service(message) if message == "Resource has been exhausted"));
        assert_eq!(err.to_string(), "Gemini API Error: Resource has been exhausted");
    }

    #[tokio::test]
    async fn test_unreadable_success_body_is_malformed() {
        let base_url = serve_once("HTTP/1.1 200 OK", "<html>not json</html>").await;
        let request = EditRequest::new(
            "make it blue",
            SourceImage::new("a.png", "image/png", vec![1, 2, 3]),
        )
        .unwrap();

        let err = client_for(&base_url).edit(&request).await.unwrap_err();
        assert!(
            matches!(&err, StudioError::MalformedResponse(message) if message.starts_with("Unreadable response body"))
        );
    }

    #[tokio::test]
    async fn test_successful_prediction_round_trip() {
        let base_url = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"predictions":[{"bytesBase64Encoded":"aW1hZ2U=","mimeType":"image/jpeg"}]}"#,
        )
        .await;

        let image = client_for(&base_url).generate(&lighthouse()).await.unwrap();
        assert_eq!(image.encoded_image_data, "aW1hZ2U=");
    }
}
