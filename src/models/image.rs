use crate::{
    codec,
    error::{Result, StudioError},
    models::common::{AspectRatio, ImageSize},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
    pub image_size: ImageSize,
}

impl GenerationRequest {
    pub fn new(
        prompt: impl Into<String>,
        aspect_ratio: AspectRatio,
        image_size: ImageSize,
    ) -> Result<Self> {
        Ok(Self {
            prompt: validated_prompt(prompt.into())?,
            aspect_ratio,
            image_size,
        })
    }
}

/// A local image file supplied as the basis for an edit.
#[derive(Clone, PartialEq)]
pub struct SourceImage {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SourceImage {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mime_type = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(codec::mime_type_for_extension)
            .ok_or_else(|| {
                StudioError::Validation(format!("Unsupported image file: {}", path.display()))
            })?;
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self::new(name, mime_type, bytes))
    }

    pub fn size_kb(&self) -> usize {
        (self.bytes.len() + 512) / 1024
    }

    pub fn encoded(&self) -> String {
        codec::encode(&self.bytes)
    }
}

impl std::fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceImage")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditRequest {
    pub prompt: String,
    pub source: SourceImage,
}

impl EditRequest {
    pub fn new(prompt: impl Into<String>, source: SourceImage) -> Result<Self> {
        Ok(Self {
            prompt: validated_prompt(prompt.into())?,
            source,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpscaleRequest {
    pub encoded_image: String,
    pub mime_type: String,
    pub factor: u32,
}

impl UpscaleRequest {
    pub fn new(
        encoded_image: impl Into<String>,
        mime_type: impl Into<String>,
        factor: u32,
    ) -> Result<Self> {
        if factor == 0 {
            return Err(StudioError::Validation(
                "Upscale factor must be positive.".into(),
            ));
        }
        Ok(Self {
            encoded_image: encoded_image.into(),
            mime_type: mime_type.into(),
            factor,
        })
    }

    pub fn instruction(&self) -> String {
        format!(
            "Upscale this image by a factor of {}x, significantly increasing its resolution and enhancing details and clarity without changing the original content or style.",
            self.factor
        )
    }
}

/// The single image every remote operation resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageResult {
    pub encoded_image_data: String, // Base64 encoded
}

impl ImageResult {
    pub fn new(encoded_image_data: impl Into<String>) -> Self {
        Self {
            encoded_image_data: encoded_image_data.into(),
        }
    }

    pub fn to_data_url(&self) -> String {
        codec::to_data_url(&self.encoded_image_data)
    }
}

fn validated_prompt(prompt: String) -> Result<String> {
    if prompt.trim().is_empty() {
        return Err(StudioError::Validation("Please enter a prompt.".into()));
    }
    Ok(prompt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_prompt_validation() {
        assert!(GenerationRequest::new("   \n", AspectRatio::Square, ImageSize::TwoK).is_err());
        let source = SourceImage::new("a.png", "image/png", vec![1]);
        assert!(EditRequest::new("", source.clone()).is_err());
        assert!(EditRequest::new("add a hat", source).is_ok());
    }

    #[test]
    fn test_upscale_instruction() {
        let request = UpscaleRequest::new("QUJD", "image/jpeg", 4).unwrap();
        assert_eq!(
            request.instruction(),
            "Upscale this image by a factor of 4x, significantly increasing its resolution and enhancing details and clarity without changing the original content or style."
        );
        assert!(UpscaleRequest::new("QUJD", "image/jpeg", 0).is_err());
    }

    #[test]
    fn test_source_image_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reference.PNG");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(&[0x89, b'P', b'N', b'G'])
            .unwrap();

        let source = SourceImage::from_path(&path).unwrap();
        assert_eq!(source.name, "reference.PNG");
        assert_eq!(source.mime_type, "image/png");
        assert_eq!(source.encoded(), "iVBORw==");

        let text = dir.path().join("notes.txt");
        std::fs::write(&text, "hello").unwrap();
        assert!(matches!(
            SourceImage::from_path(&text),
            Err(StudioError::Validation(_))
        ));
    }

    #[test]
    fn test_image_result_data_url() {
        let result = ImageResult::new("QUJD");
        assert_eq!(result.to_data_url(), "data:image/jpeg;base64,QUJD");
    }
}
