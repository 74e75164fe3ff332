pub mod codec;
pub mod config;
pub mod error;
pub mod gemini;
pub mod logger;
pub mod models;
pub mod reference;
pub mod storage;
pub mod studio;

pub use config::{GeminiConfig, StudioConfig};
pub use error::{Result, StudioError};
pub use gemini::{ContentClient, GeminiClient, ImageService, ImagenClient};
pub use models::*;
pub use reference::{HandleRegistry, ReferenceImage};
pub use storage::{HistoryCache, JsonFileStore, KeyValueStore, MemoryStore};
pub use studio::{Phase, Studio, StudioState};
