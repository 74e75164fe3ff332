//! Session controller: picks the remote operation for each user action and
//! feeds results into the displayed image and the history.

use crate::{
    codec,
    config::StudioConfig,
    error::{Result, StudioError},
    gemini::{GeminiClient, ImageService},
    models::{
        AspectRatio, EditRequest, GenerationRequest, HistoryEntry, ImageOperation, ImageResult,
        ImageSize, SourceImage, UpscaleRequest,
    },
    reference::{HandleRegistry, ReferenceImage},
    storage::{HistoryCache, JsonFileStore},
};
use std::sync::{Arc, Mutex, MutexGuard};

const EMPTY_PROMPT_MESSAGE: &str = "Please enter a prompt.";
const INVALID_DATA_URL_MESSAGE: &str = "Invalid image data URL.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Generating,
    Upscaling,
    Error,
}

/// Read-only view of the session for a display layer.
#[derive(Debug, Clone, PartialEq)]
pub struct StudioState {
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
    pub image_size: ImageSize,
    pub image_url: Option<String>,
    pub error: Option<String>,
    pub is_generating: bool,
    pub is_upscaling: bool,
    pub reference_url: Option<String>,
}

struct Session {
    prompt: String,
    aspect_ratio: AspectRatio,
    image_size: ImageSize,
    image_url: Option<String>,
    error: Option<String>,
    is_generating: bool,
    is_upscaling: bool,
    reference: Option<ReferenceImage>,
    history: HistoryCache,
}

impl Session {
    fn is_busy(&self) -> bool {
        self.is_generating || self.is_upscaling
    }

    fn release_reference(&mut self) {
        if let Some(reference) = self.reference.take() {
            reference.release();
        }
    }
}

/// Inputs captured when a submit starts.
struct PendingGeneration {
    prompt: String,
    aspect_ratio: AspectRatio,
    image_size: ImageSize,
    source: Option<SourceImage>,
}

/// Session state lives behind a mutex that is never held across a remote call,
/// so concurrent actions observe each other's in-flight flags.
pub struct Studio {
    service: Arc<dyn ImageService>,
    handles: HandleRegistry,
    session: Mutex<Session>,
}

impl Studio {
    pub fn new(service: Arc<dyn ImageService>, history: HistoryCache) -> Self {
        Self {
            service,
            handles: HandleRegistry::new(),
            session: Mutex::new(Session {
                prompt: String::new(),
                aspect_ratio: AspectRatio::default(),
                image_size: ImageSize::default(),
                image_url: None,
                error: None,
                is_generating: false,
                is_upscaling: false,
                reference: None,
                history,
            }),
        }
    }

    /// Builds the Gemini client once and loads history from the configured file.
    pub fn from_config(config: StudioConfig) -> Result<Self> {
        let client = GeminiClient::new(config.gemini)?;
        let history = HistoryCache::load(JsonFileStore::new(config.history_path));
        Ok(Self::new(Arc::new(client), history))
    }

    pub fn handles(&self) -> &HandleRegistry {
        &self.handles
    }

    pub fn set_prompt(&self, prompt: impl Into<String>) {
        self.lock().prompt = prompt.into();
    }

    pub fn set_aspect_ratio(&self, aspect_ratio: AspectRatio) {
        self.lock().aspect_ratio = aspect_ratio;
    }

    pub fn set_image_size(&self, image_size: ImageSize) {
        self.lock().image_size = image_size;
    }

    /// Attaches a reference image, releasing any previous one first.
    /// Returns the display handle of the new reference.
    pub fn attach_reference(&self, file: SourceImage) -> String {
        let mut session = self.lock();
        session.release_reference();
        let reference = ReferenceImage::new(&self.handles, file);
        let url = reference.display_url().to_string();
        session.reference = Some(reference);
        url
    }

    pub fn clear_reference(&self) {
        self.lock().release_reference();
    }

    /// Releases every outstanding handle. Call before the session is dropped.
    pub fn shutdown(&self) {
        self.lock().release_reference();
        log::debug!("Studio shut down");
    }

    pub fn phase(&self) -> Phase {
        let session = self.lock();
        if session.is_generating {
            Phase::Generating
        } else if session.is_upscaling {
            Phase::Upscaling
        } else if session.error.is_some() {
            Phase::Error
        } else {
            Phase::Idle
        }
    }

    pub fn snapshot(&self) -> StudioState {
        let session = self.lock();
        StudioState {
            prompt: session.prompt.clone(),
            aspect_ratio: session.aspect_ratio,
            image_size: session.image_size,
            image_url: session.image_url.clone(),
            error: session.error.clone(),
            is_generating: session.is_generating,
            is_upscaling: session.is_upscaling,
            reference_url: session
                .reference
                .as_ref()
                .map(|reference| reference.display_url().to_string()),
        }
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.lock().history.entries().to_vec()
    }

    /// Generates from the prompt, or edits the reference image when one is attached.
    ///
    /// Returns `Ok(None)` without side effects while another operation is in flight.
    pub async fn submit(&self) -> Result<Option<ImageResult>> {
        let pending = {
            let mut session = self.lock();
            if session.prompt.trim().is_empty() {
                session.error = Some(EMPTY_PROMPT_MESSAGE.to_string());
                return Err(StudioError::Validation(EMPTY_PROMPT_MESSAGE.to_string()));
            }
            if session.is_busy() {
                log::debug!("Submit ignored: an operation is already in flight");
                return Ok(None);
            }

            session.is_generating = true;
            session.error = None;
            session.image_url = None;

            PendingGeneration {
                prompt: session.prompt.clone(),
                aspect_ratio: session.aspect_ratio,
                image_size: session.image_size,
                source: session
                    .reference
                    .as_ref()
                    .map(|reference| reference.file().clone()),
            }
        };

        let outcome = self.run_generation(&pending).await;

        let mut session = self.lock();
        session.is_generating = false;
        match outcome {
            Ok(image) => {
                let image_url = image.to_data_url();
                session.image_url = Some(image_url.clone());

                let entry = HistoryEntry {
                    id: session.history.next_id(),
                    prompt: pending.prompt,
                    aspect_ratio: pending.aspect_ratio,
                    image_size: pending.image_size,
                    image_url,
                };
                if let Err(e) = session.history.record(entry) {
                    log::error!("Failed to persist history: {}", e);
                }
                Ok(Some(image))
            }
            Err(e) => {
                log::error!("Image generation failed: {}", e);
                session.error = Some(format!("Failed to generate image: {}", e));
                Err(e)
            }
        }
    }

    /// Upscales the displayed image in place. History is not touched.
    ///
    /// Returns `Ok(None)` when nothing is displayed or an operation is in flight.
    pub async fn upscale(&self, factor: u32) -> Result<Option<ImageResult>> {
        let request = {
            let mut session = self.lock();
            let Some(image_url) = session.image_url.clone() else {
                return Ok(None);
            };
            if session.is_busy() {
                log::debug!("Upscale ignored: an operation is already in flight");
                return Ok(None);
            }

            session.is_upscaling = true;
            session.error = None;

            let built = codec::strip_data_url_prefix(&image_url)
                .ok_or_else(|| StudioError::Validation(INVALID_DATA_URL_MESSAGE.to_string()))
                .and_then(|payload| UpscaleRequest::new(payload, codec::DISPLAY_MIME_TYPE, factor));
            match built {
                Ok(request) => request,
                Err(e) => {
                    session.is_upscaling = false;
                    session.error = Some(format!("Failed to upscale image: {}", e));
                    return Err(e);
                }
            }
        };

        let outcome = self.service.upscale(&request).await;

        let mut session = self.lock();
        session.is_upscaling = false;
        match outcome {
            Ok(image) => {
                session.image_url = Some(image.to_data_url());
                Ok(Some(image))
            }
            Err(e) => {
                log::error!("Image upscale failed: {}", e);
                session.error = Some(format!("Failed to upscale image: {}", e));
                Err(e)
            }
        }
    }

    /// Restores the session to a past result and drops any reference image.
    ///
    /// This also clears `is_generating`. Called while a submit is in flight, it
    /// reopens the submit guard, so a second generation can start before the
    /// first one settles. Whichever finishes last sets the displayed image.
    pub fn select_history(&self, id: &str) -> Result<()> {
        let mut session = self.lock();
        let entry = session
            .history
            .get(id)
            .cloned()
            .ok_or_else(|| StudioError::Validation(format!("Unknown history entry: {}", id)))?;

        session.image_url = Some(entry.image_url);
        session.prompt = entry.prompt;
        session.aspect_ratio = entry.aspect_ratio;
        session.image_size = entry.image_size;
        session.error = None;
        session.is_generating = false;
        session.release_reference();
        Ok(())
    }

    async fn run_generation(&self, pending: &PendingGeneration) -> Result<ImageResult> {
        let operation = match pending.source {
            Some(_) => ImageOperation::Edit,
            None => ImageOperation::Generate,
        };
        log::info!("Submitting {} request", operation.as_str());

        match &pending.source {
            Some(source) => {
                let request = EditRequest::new(pending.prompt.clone(), source.clone())?;
                self.service.edit(&request).await
            }
            None => {
                let request = GenerationRequest::new(
                    pending.prompt.clone(),
                    pending.aspect_ratio,
                    pending.image_size,
                )?;
                self.service.generate(&request).await
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
