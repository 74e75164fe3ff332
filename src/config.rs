use crate::error::{Result, StudioError};
use std::env;
use std::path::PathBuf;

pub const API_KEY_VAR: &str = "API_KEY";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_IMAGEN_MODEL: &str = "imagen-4.0-generate-001";
pub const DEFAULT_CONTENT_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_HISTORY_PATH: &str = "rimagen-history.json";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub imagen_model: String,
    pub content_model: String,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        GeminiConfig {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            imagen_model: DEFAULT_IMAGEN_MODEL.to_string(),
            content_model: DEFAULT_CONTENT_MODEL.to_string(),
        }
    }

    /// Reads the service credential once. A missing or blank key is fatal.
    pub fn from_env() -> Result<Self> {
        match env::var(API_KEY_VAR) {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(key)),
            _ => Err(StudioError::Config(format!(
                "{} environment variable not set",
                API_KEY_VAR
            ))),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_imagen_model(mut self, model: impl Into<String>) -> Self {
        self.imagen_model = model.into();
        self
    }

    pub fn with_content_model(mut self, model: impl Into<String>) -> Self {
        self.content_model = model.into();
        self
    }
}

#[derive(Debug, Clone)]
pub struct StudioConfig {
    pub gemini: GeminiConfig,
    pub history_path: PathBuf,
}

impl StudioConfig {
    pub fn new(gemini: GeminiConfig) -> Self {
        StudioConfig {
            gemini,
            history_path: PathBuf::from(DEFAULT_HISTORY_PATH),
        }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::new(GeminiConfig::from_env()?))
    }

    pub fn with_history_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.history_path = path.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_defaults() {
        let config = GeminiConfig::new("key");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.imagen_model, "imagen-4.0-generate-001");
        assert_eq!(config.content_model, "gemini-2.5-flash-image");
    }

    #[test]
    fn test_builder_overrides() {
        let config = GeminiConfig::new("key")
            .with_base_url("http://localhost:8080/v1beta/")
            .with_imagen_model("imagen-test")
            .with_content_model("content-test");
        assert_eq!(config.base_url, "http://localhost:8080/v1beta");
        assert_eq!(config.imagen_model, "imagen-test");
        assert_eq!(config.content_model, "content-test");

        let studio = StudioConfig::new(config).with_history_path("/tmp/history.json");
        assert_eq!(studio.history_path, PathBuf::from("/tmp/history.json"));
    }
}
