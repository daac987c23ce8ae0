//! Image artifacts and their ownership.
//!
//! An artifact is an immutable encoded image; edits always mint a new one.
//! The registry owns the current-image slot, the before reference used by
//! the comparison scrubber, the result library, and a bounded session
//! history.

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, ImageFormat};
use thiserror::Error;

pub const SESSION_HISTORY_LIMIT: usize = 20;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to decode {format:?} image data: {source}")]
    Decode {
        format: ImageFormat,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to encode image data: {source}")]
    Encode {
        #[source]
        source: image::ImageError,
    },
}

pub type ArtifactResult<T> = std::result::Result<T, ArtifactError>;

/// Opaque, self-describing image blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
}

impl EncodedImage {
    pub const fn new(format: ImageFormat, bytes: Vec<u8>) -> Self {
        Self { format, bytes }
    }

    pub fn decode(&self) -> ArtifactResult<DynamicImage> {
        image::load_from_memory_with_format(&self.bytes, self.format).map_err(|source| {
            ArtifactError::Decode {
                format: self.format,
                source,
            }
        })
    }

    /// Encodes decoded pixels back into a PNG blob.
    pub fn from_pixels(pixels: &DynamicImage) -> ArtifactResult<Self> {
        let mut bytes = Vec::new();
        pixels
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|source| ArtifactError::Encode { source })?;
        Ok(Self::new(ImageFormat::Png, bytes))
    }
}

/// Immutable once minted; the encoded bytes are shared between owners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageArtifact {
    pub id: u64,
    pub image: Arc<EncodedImage>,
    pub resolution_label: String,
    pub is_derived: bool,
    pub derived_from: Option<u64>,
}

#[derive(Debug, Default)]
pub struct ArtifactRegistry {
    next_id: u64,
    current: Option<ImageArtifact>,
    before: Option<ImageArtifact>,
    results: Vec<ImageArtifact>,
    session_history: VecDeque<ImageArtifact>,
}

impl ArtifactRegistry {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            current: None,
            before: None,
            results: Vec::new(),
            session_history: VecDeque::new(),
        }
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id.max(1);
        self.next_id = id.saturating_add(1);
        id
    }

    pub fn mint(
        &mut self,
        image: EncodedImage,
        resolution_label: impl Into<String>,
        derived_from: Option<u64>,
    ) -> ImageArtifact {
        ImageArtifact {
            id: self.allocate_id(),
            image: Arc::new(image),
            resolution_label: resolution_label.into(),
            is_derived: derived_from.is_some(),
            derived_from,
        }
    }

    pub fn current(&self) -> Option<&ImageArtifact> {
        self.current.as_ref()
    }

    pub fn before(&self) -> Option<&ImageArtifact> {
        self.before.as_ref()
    }

    pub fn has_before(&self) -> bool {
        self.before.is_some()
    }

    pub fn results(&self) -> &[ImageArtifact] {
        &self.results
    }

    pub fn session_history(&self) -> impl Iterator<Item = &ImageArtifact> {
        self.session_history.iter()
    }

    pub fn session_history_len(&self) -> usize {
        self.session_history.len()
    }

    /// Loads a fresh, unrelated image into the current slot. Any previous
    /// before reference is dropped: comparison is only meaningful against
    /// the image an edit was derived from.
    pub fn install_current(&mut self, artifact: ImageArtifact) {
        self.before = None;
        self.record_history(artifact.clone());
        self.current = Some(artifact);
    }

    /// Replaces the current image with a derived artifact, keeping the
    /// replaced image as the before reference for comparison.
    pub fn replace_current(&mut self, artifact: ImageArtifact) {
        self.before = self.current.take();
        self.record_history(artifact.clone());
        self.current = Some(artifact);
    }

    pub fn adopt_result(&mut self, artifact: ImageArtifact) {
        self.results.push(artifact);
    }

    fn record_history(&mut self, artifact: ImageArtifact) {
        self.session_history.push_back(artifact);
        while self.session_history.len() > SESSION_HISTORY_LIMIT {
            let evicted = self.session_history.pop_front();
            if let Some(evicted) = evicted {
                tracing::debug!(artifact_id = evicted.id, "evicted oldest session history entry");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_1x1() -> EncodedImage {
        let pixels = DynamicImage::new_rgba8(1, 1);
        EncodedImage::from_pixels(&pixels).expect("1x1 png encodes")
    }

    #[test]
    fn mint_allocates_increasing_ids_and_tags_derivation() {
        let mut registry = ArtifactRegistry::new();
        let base = registry.mint(png_1x1(), "1K", None);
        let derived = registry.mint(png_1x1(), "Cropped", Some(base.id));

        assert!(derived.id > base.id);
        assert!(!base.is_derived);
        assert!(derived.is_derived);
        assert_eq!(derived.derived_from, Some(base.id));
    }

    #[test]
    fn encode_decode_round_trip_preserves_dimensions() {
        let pixels = DynamicImage::new_rgba8(7, 3);
        let encoded = EncodedImage::from_pixels(&pixels).expect("encodes");
        let decoded = encoded.decode().expect("decodes");
        assert_eq!(decoded.width(), 7);
        assert_eq!(decoded.height(), 3);
    }

    #[test]
    fn replace_current_keeps_replaced_image_as_before_reference() {
        let mut registry = ArtifactRegistry::new();
        let original = registry.mint(png_1x1(), "1K", None);
        registry.install_current(original.clone());
        assert!(!registry.has_before());

        let edited = registry.mint(png_1x1(), "Edited", Some(original.id));
        registry.replace_current(edited.clone());

        assert_eq!(registry.before().map(|a| a.id), Some(original.id));
        assert_eq!(registry.current().map(|a| a.id), Some(edited.id));
    }

    #[test]
    fn install_current_drops_stale_before_reference() {
        let mut registry = ArtifactRegistry::new();
        let original = registry.mint(png_1x1(), "1K", None);
        registry.install_current(original.clone());
        let edited = registry.mint(png_1x1(), "Edited", Some(original.id));
        registry.replace_current(edited);
        assert!(registry.has_before());

        let unrelated = registry.mint(png_1x1(), "1K", None);
        registry.install_current(unrelated);
        assert!(!registry.has_before());
    }

    #[test]
    fn session_history_evicts_oldest_beyond_the_cap() {
        let mut registry = ArtifactRegistry::new();
        let first = registry.mint(png_1x1(), "1K", None);
        let first_id = first.id;
        registry.install_current(first);

        for _ in 0..SESSION_HISTORY_LIMIT {
            let next = registry.mint(png_1x1(), "Edited", None);
            registry.replace_current(next);
        }

        assert_eq!(registry.session_history_len(), SESSION_HISTORY_LIMIT);
        assert!(registry.session_history().all(|a| a.id != first_id));
    }

    #[test]
    fn shared_bytes_are_referenced_not_copied_between_owners() {
        let mut registry = ArtifactRegistry::new();
        let artifact = registry.mint(png_1x1(), "1K", None);
        registry.install_current(artifact.clone());
        registry.adopt_result(artifact.clone());

        let current = registry.current().expect("current installed");
        let result = &registry.results()[0];
        assert!(Arc::ptr_eq(&current.image, &result.image));
    }
}
