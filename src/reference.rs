//! Reference images and the transient display handles issued for them.
//!
//! A handle stays outstanding in its [`HandleRegistry`] until it is released.
//! Dropping a [`ReferenceImage`] does not release it.

use crate::models::SourceImage;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct HandleRegistry {
    live: Arc<Mutex<HashSet<String>>>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> DisplayHandle {
        let url = format!("blob:rimagen/{}", Uuid::new_v4());
        self.lock().insert(url.clone());
        DisplayHandle {
            url,
            registry: self.clone(),
        }
    }

    pub fn outstanding(&self) -> usize {
        self.lock().len()
    }

    pub fn is_live(&self, url: &str) -> bool {
        self.lock().contains(url)
    }

    fn revoke(&self, url: &str) -> bool {
        self.lock().remove(url)
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.live.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug)]
pub struct DisplayHandle {
    url: String,
    registry: HandleRegistry,
}

impl DisplayHandle {
    pub fn url(&self) -> &str {
        &self.url
    }

    fn revoke(&self) -> bool {
        self.registry.revoke(&self.url)
    }
}

/// A user-supplied image plus the display handle previewing it.
#[derive(Debug)]
pub struct ReferenceImage {
    handle: DisplayHandle,
    file: SourceImage,
    released: bool,
}

impl ReferenceImage {
    pub fn new(registry: &HandleRegistry, file: SourceImage) -> Self {
        Self {
            handle: registry.issue(),
            file,
            released: false,
        }
    }

    pub fn display_url(&self) -> &str {
        self.handle.url()
    }

    pub fn file(&self) -> &SourceImage {
        &self.file
    }

    /// Revokes the display handle and hands back the underlying file.
    pub fn release(mut self) -> SourceImage {
        self.handle.revoke();
        self.released = true;
        log::debug!("Released reference image handle {}", self.handle.url());
        std::mem::replace(&mut self.file, SourceImage::new("", "", Vec::new()))
    }
}

impl Drop for ReferenceImage {
    fn drop(&mut self) {
        if !self.released && self.handle.registry.is_live(self.handle.url()) {
            log::warn!(
                "Reference image {} dropped without releasing {}",
                self.file.name,
                self.handle.url()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(name: &str) -> SourceImage {
        SourceImage::new(name, "image/png", vec![1, 2, 3])
    }

    #[test]
    fn test_release_revokes_handle() {
        let registry = HandleRegistry::new();
        let reference = ReferenceImage::new(&registry, source("a.png"));
        let url = reference.display_url().to_string();
        assert!(url.starts_with("blob:rimagen/"));
        assert!(registry.is_live(&url));
        assert_eq!(registry.outstanding(), 1);

        let file = reference.release();
        assert_eq!(file.name, "a.png");
        assert!(!registry.is_live(&url));
        assert_eq!(registry.outstanding(), 0);
    }

    #[test]
    fn test_drop_without_release_leaks_handle() {
        let registry = HandleRegistry::new();
        drop(ReferenceImage::new(&registry, source("leaked.png")));
        assert_eq!(registry.outstanding(), 1);
    }

    #[test]
    fn test_handles_are_unique() {
        let registry = HandleRegistry::new();
        let a = ReferenceImage::new(&registry, source("a.png"));
        let b = ReferenceImage::new(&registry, source("b.png"));
        assert_ne!(a.display_url(), b.display_url());
        assert_eq!(registry.outstanding(), 2);
        a.release();
        b.release();
        assert_eq!(registry.outstanding(), 0);
    }
}
