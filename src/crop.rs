//! Stateful crop region editor.
//!
//! A session exists only between `begin` and commit/cancel. Geometry stays
//! in percentage space for the whole interaction; pixels appear only at
//! commit, where the selected sub-rectangle is extracted at the source's
//! native resolution (never upscaled).

use thiserror::Error;

use crate::artifact::{ArtifactError, EncodedImage};
use crate::geometry::{
    clamp_region_to_bounds, map_percent_to_pixel_rect, resize_from_handle, CropRegion,
    PercentPoint, PercentSize, RatioLock, RegionHandle, CANVAS_EXTENT,
};
use crate::history::History;

pub const CROP_RESULT_LABEL: &str = "Cropped";

const DEFAULT_REGION_SIZE: PercentSize = PercentSize::new(40.0, 40.0);

#[derive(Debug, Error)]
pub enum CropError {
    #[error("no crop session is active")]
    NoActiveSession,
    #[error("crop source could not be processed: {source}")]
    Source {
        #[from]
        source: ArtifactError,
    },
    #[error("crop region maps to an empty pixel rectangle")]
    EmptyRegion,
}

pub type CropResult<T> = std::result::Result<T, CropError>;

#[derive(Debug, Clone)]
struct CropSession {
    region: CropRegion,
    history: History<CropRegion>,
    active_handle: Option<RegionHandle>,
}

impl CropSession {
    fn new() -> Self {
        let region = CropRegion::new(
            PercentPoint::new(CANVAS_EXTENT / 2.0, CANVAS_EXTENT / 2.0),
            DEFAULT_REGION_SIZE,
            RatioLock::Free,
        );
        Self {
            region,
            history: History::new(region),
            active_handle: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct CropEngine {
    session: Option<CropSession>,
}

impl CropEngine {
    pub fn new() -> Self {
        Self { session: None }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn region(&self) -> Option<CropRegion> {
        self.session.as_ref().map(|session| session.region)
    }

    pub fn active_handle(&self) -> Option<RegionHandle> {
        self.session.as_ref().and_then(|session| session.active_handle)
    }

    pub fn can_undo(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.history.can_undo())
    }

    pub fn can_redo(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.history.can_redo())
    }

    /// Opens a session with a centered default region and a single-entry
    /// history.
    pub fn begin(&mut self) {
        self.session = Some(CropSession::new());
    }

    pub fn on_handle_down(&mut self, handle: RegionHandle) {
        if let Some(session) = self.session.as_mut() {
            session.active_handle = Some(handle);
        }
    }

    /// Live region update while a handle is held; never pushed to history.
    pub fn on_handle_move(&mut self, pointer: PercentPoint) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(handle) = session.active_handle else {
            return;
        };
        let lock = session.region.ratio_lock;
        session.region = resize_from_handle(session.region, handle, pointer, lock);
    }

    /// Ends the drag: the settled region is pushed exactly once.
    pub fn on_handle_up(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.active_handle.take().is_some() {
            session.history.push(session.region);
        }
    }

    /// Applies a ratio lock: the region snaps to the lock's canonical size
    /// (free-form keeps its size), re-centers, and the result is pushed.
    pub fn set_ratio_lock(&mut self, lock: RatioLock) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let size = lock.canonical_size().unwrap_or(session.region.size);
        let center = PercentPoint::new(CANVAS_EXTENT / 2.0, CANVAS_EXTENT / 2.0);
        session.region = clamp_region_to_bounds(CropRegion::new(center, size, lock));
        session.history.push(session.region);
    }

    /// Restores the previous snapshot, region and lock together.
    pub fn undo(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        match session.history.undo() {
            Some(snapshot) => {
                session.region = *snapshot;
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        match session.history.redo() {
            Some(snapshot) => {
                session.region = *snapshot;
                true
            }
            None => false,
        }
    }

    /// Extracts the selected sub-rectangle from `source` as a new encoded
    /// image. The session is consumed whether or not extraction succeeds;
    /// on failure the source is left untouched and no artifact exists.
    pub fn commit(&mut self, source: &EncodedImage) -> CropResult<EncodedImage> {
        let session = self.session.take().ok_or(CropError::NoActiveSession)?;
        let decoded = source.decode()?;
        let rect = map_percent_to_pixel_rect(&session.region, decoded.width(), decoded.height());
        if rect.width == 0 || rect.height == 0 {
            return Err(CropError::EmptyRegion);
        }

        tracing::info!(
            x = rect.x,
            y = rect.y,
            width = rect.width,
            height = rect.height,
            "extracting crop region"
        );
        let cropped = decoded.crop_imm(rect.x, rect.y, rect.width, rect.height);
        Ok(EncodedImage::from_pixels(&cropped)?)
    }

    /// Discards region and history without producing an artifact.
    pub fn cancel(&mut self) {
        self.session = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgba, RgbaImage};

    fn solid_png(width: u32, height: u32) -> EncodedImage {
        let pixels = DynamicImage::new_rgba8(width, height);
        EncodedImage::from_pixels(&pixels).expect("test png encodes")
    }

    #[test]
    fn begin_seeds_a_centered_default_region() {
        let mut engine = CropEngine::new();
        assert!(!engine.is_active());

        engine.begin();
        let region = engine.region().expect("session active");
        assert_eq!(region.center, PercentPoint::new(50.0, 50.0));
        assert_eq!(region.size, DEFAULT_REGION_SIZE);
        assert_eq!(region.ratio_lock, RatioLock::Free);
        assert!(!engine.can_undo());
    }

    #[test]
    fn a_drag_pushes_history_once_on_release_not_per_move() {
        let mut engine = CropEngine::new();
        engine.begin();

        engine.on_handle_down(RegionHandle::TopLeft);
        engine.on_handle_move(PercentPoint::new(20.0, 20.0));
        engine.on_handle_move(PercentPoint::new(18.0, 22.0));
        engine.on_handle_move(PercentPoint::new(15.0, 25.0));
        engine.on_handle_up();
        assert!(engine.can_undo());

        // One undo returns all the way to the seeded region.
        assert!(engine.undo());
        let region = engine.region().expect("session active");
        assert_eq!(region.size, DEFAULT_REGION_SIZE);
        assert!(!engine.can_undo());
    }

    #[test]
    fn handle_release_without_drag_pushes_nothing() {
        let mut engine = CropEngine::new();
        engine.begin();
        engine.on_handle_up();
        assert!(!engine.can_undo());
    }

    #[test]
    fn moves_without_a_held_handle_are_ignored() {
        let mut engine = CropEngine::new();
        engine.begin();
        let before = engine.region().expect("session active");
        engine.on_handle_move(PercentPoint::new(10.0, 10.0));
        assert_eq!(engine.region().expect("session active"), before);
    }

    #[test]
    fn undo_restores_region_and_ratio_lock_together() {
        let mut engine = CropEngine::new();
        engine.begin();
        engine.set_ratio_lock(RatioLock::Wide16x9);
        let locked = engine.region().expect("session active");
        assert_eq!(locked.ratio_lock, RatioLock::Wide16x9);
        assert!(locked.ratio_satisfied());

        assert!(engine.undo());
        let restored = engine.region().expect("session active");
        assert_eq!(restored.ratio_lock, RatioLock::Free);
        assert_eq!(restored.size, DEFAULT_REGION_SIZE);

        assert!(engine.redo());
        assert_eq!(engine.region().expect("session active"), locked);
    }

    #[test]
    fn commit_extracts_the_mapped_pixel_rectangle_at_native_resolution() {
        let mut source = RgbaImage::from_pixel(1000, 1000, Rgba([0, 0, 0, 255]));
        // Marker at the expected top-left corner of the extraction.
        source.put_pixel(300, 300, Rgba([255, 0, 0, 255]));
        let encoded = EncodedImage::from_pixels(&DynamicImage::ImageRgba8(source))
            .expect("source encodes");

        let mut engine = CropEngine::new();
        engine.begin();
        engine.set_ratio_lock(RatioLock::Square);

        let result = engine.commit(&encoded).expect("commit extracts");
        let decoded = result.decode().expect("result decodes");
        assert_eq!(decoded.width(), 400);
        assert_eq!(decoded.height(), 400);
        assert_eq!(
            decoded.to_rgba8().get_pixel(0, 0),
            &Rgba([255, 0, 0, 255])
        );
        assert!(!engine.is_active());
    }

    #[test]
    fn commit_without_a_session_reports_no_active_session() {
        let mut engine = CropEngine::new();
        let err = engine
            .commit(&solid_png(10, 10))
            .expect_err("no session to commit");
        assert!(matches!(err, CropError::NoActiveSession));
    }

    #[test]
    fn commit_on_undecodable_bytes_consumes_the_session() {
        let mut engine = CropEngine::new();
        engine.begin();
        let broken = EncodedImage::new(image::ImageFormat::Png, vec![0xde, 0xad]);
        let err = engine.commit(&broken).expect_err("decode must fail");
        assert!(matches!(err, CropError::Source { .. }));
        assert!(!engine.is_active());
    }

    #[test]
    fn cancel_discards_the_session_without_an_artifact() {
        let mut engine = CropEngine::new();
        engine.begin();
        engine.on_handle_down(RegionHandle::Center);
        engine.on_handle_move(PercentPoint::new(30.0, 30.0));
        engine.cancel();
        assert!(!engine.is_active());
        assert_eq!(engine.region(), None);
    }
}
