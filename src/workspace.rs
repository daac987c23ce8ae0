//! The editing session context and its sole mutator gateway.
//!
//! Every component lives behind this object and is only reached through
//! operations that consult the mode machine first, which is what makes the
//! single-active-mode invariant enforceable: pointer input for a component
//! is inert unless its mode is the active one, and external-call results
//! are applied only while their request token is still the active one.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::artifact::{ArtifactRegistry, EncodedImage, ImageArtifact};
use crate::batch::{BatchOperation, BatchQueue, BatchRunReport};
use crate::compare::ComparisonScrubber;
use crate::crop::{CropEngine, CropError, CROP_RESULT_LABEL};
use crate::export::{export_all, ArtifactExporter, ExportError};
use crate::geometry::{CropRegion, PercentPoint, RatioLock, RegionHandle};
use crate::ingest::PasteTray;
use crate::mask::{MaskSurface, RasterPoint};
use crate::service::{ImageService, RequestToken, ServiceResult, UpscaleTier};
use crate::session::{BusyKind, ModeEvent, ModeMachine, SessionError, WorkspaceMode};
use crate::viewport::ViewportTransform;

pub const ORIGINAL_LABEL: &str = "Original";
pub const GENERATED_LABEL: &str = "Generated";
pub const EDITED_LABEL: &str = "Edited";
pub const WATERMARK_REMOVED_LABEL: &str = "Watermark Removed";

const REMOVE_WATERMARK_INSTRUCTION: &str =
    "Remove all watermarks, stamps, and overlaid logos; reconstruct the image underneath";

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error(transparent)]
    Mode(#[from] SessionError),
    #[error("no image is loaded")]
    NoSourceImage,
    #[error("prompt text is empty")]
    EmptyPrompt,
    #[error("instruction text is empty")]
    EmptyInstruction,
    #[error("batch queue is empty")]
    BatchEmpty,
    #[error(transparent)]
    Export(#[from] ExportError),
}

pub type WorkspaceResult<T> = std::result::Result<T, WorkspaceError>;

/// Identity of the external call the workspace is currently waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRequest {
    pub token: RequestToken,
    pub kind: BusyKind,
}

#[derive(Debug, Default)]
pub struct Workspace {
    machine: ModeMachine,
    registry: ArtifactRegistry,
    crop: CropEngine,
    mask: Option<MaskSurface>,
    viewport: Option<ViewportTransform>,
    compare: ComparisonScrubber,
    batch: BatchQueue,
    paste_tray: PasteTray,
    banner: Option<String>,
    active_request: Option<PendingRequest>,
    next_request_id: u64,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            machine: ModeMachine::new(),
            registry: ArtifactRegistry::new(),
            crop: CropEngine::new(),
            mask: None,
            viewport: None,
            compare: ComparisonScrubber::new(),
            batch: BatchQueue::new(),
            paste_tray: PasteTray::new(),
            banner: None,
            active_request: None,
            next_request_id: 1,
        }
    }

    pub fn mode(&self) -> WorkspaceMode {
        self.machine.mode()
    }

    /// Dismissible user-facing failure message, if one is showing.
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn current_artifact(&self) -> Option<&ImageArtifact> {
        self.registry.current()
    }

    pub fn before_artifact(&self) -> Option<&ImageArtifact> {
        self.registry.before()
    }

    pub fn results(&self) -> &[ImageArtifact] {
        self.registry.results()
    }

    pub fn registry(&self) -> &ArtifactRegistry {
        &self.registry
    }

    pub fn batch(&self) -> &BatchQueue {
        &self.batch
    }

    pub fn paste_tray(&self) -> &PasteTray {
        &self.paste_tray
    }

    // ---- validation predicates ------------------------------------------
    //
    // These drive control enablement: a disabled control is how validation
    // failures are prevented rather than surfaced.

    pub fn can_generate(&self) -> bool {
        self.machine.can_transition(ModeEvent::BeginBusy(BusyKind::Generate))
    }

    pub fn can_edit(&self) -> bool {
        self.registry.current().is_some()
            && self.machine.can_transition(ModeEvent::BeginBusy(BusyKind::Edit))
    }

    pub fn can_enter_tool(&self) -> bool {
        self.registry.current().is_some() && self.machine.can_transition(ModeEvent::EnterCrop)
    }

    pub fn can_compare(&self) -> bool {
        self.machine.mode().is_idle() && self.registry.has_before()
    }

    // ---- external calls --------------------------------------------------

    /// Enters `Busy(kind)` and mints the token the eventual completion must
    /// present.
    pub fn begin_external(&mut self, kind: BusyKind) -> WorkspaceResult<PendingRequest> {
        self.machine.transition(ModeEvent::BeginBusy(kind))?;
        let token = RequestToken::new(self.next_request_id);
        self.next_request_id = self.next_request_id.saturating_add(1);
        let request = PendingRequest { token, kind };
        self.active_request = Some(request);
        tracing::debug!(token = token.value(), kind = kind.label(), "external call started");
        Ok(request)
    }

    /// Applies the outcome of an external call, or discards it when the
    /// request is no longer the active one (stale completion).
    ///
    /// Returns the id of the artifact that became current, `None` when the
    /// outcome was discarded or recorded as a failure.
    pub fn complete(
        &mut self,
        request: PendingRequest,
        outcome: ServiceResult<EncodedImage>,
    ) -> WorkspaceResult<Option<u64>> {
        if self.active_request != Some(request) {
            tracing::debug!(
                token = request.token.value(),
                "discarding stale external call result"
            );
            return Ok(None);
        }
        self.active_request = None;

        match outcome {
            Ok(image) => {
                self.machine.transition(ModeEvent::FinishBusy)?;
                let artifact_id = self.adopt_external_result(request.kind, image);
                Ok(Some(artifact_id))
            }
            Err(err) => {
                self.machine.transition(ModeEvent::FailBusy)?;
                let message = err.to_string();
                tracing::warn!(kind = request.kind.label(), error = %message, "external call failed");
                self.banner = Some(message);
                Ok(None)
            }
        }
    }

    fn adopt_external_result(&mut self, kind: BusyKind, image: EncodedImage) -> u64 {
        let derived_from = match kind {
            BusyKind::Generate => None,
            _ => self.registry.current().map(|artifact| artifact.id),
        };
        let label = match kind {
            BusyKind::Generate => GENERATED_LABEL,
            BusyKind::Edit => EDITED_LABEL,
            BusyKind::Upscale(tier) => tier.result_label(),
            BusyKind::RemoveWatermark => WATERMARK_REMOVED_LABEL,
            BusyKind::Batch => EDITED_LABEL,
        };
        let artifact = self.registry.mint(image, label, derived_from);
        let artifact_id = artifact.id;
        self.registry.adopt_result(artifact.clone());
        if derived_from.is_some() {
            self.registry.replace_current(artifact);
        } else {
            self.registry.install_current(artifact);
        }
        artifact_id
    }

    pub fn generate_with<S: ImageService>(
        &mut self,
        service: &S,
        prompt: &str,
    ) -> WorkspaceResult<Option<u64>> {
        if prompt.trim().is_empty() {
            return Err(WorkspaceError::EmptyPrompt);
        }
        let request = self.begin_external(BusyKind::Generate)?;
        let outcome = service.generate(prompt);
        self.complete(request, outcome)
    }

    pub fn edit_with<S: ImageService>(
        &mut self,
        service: &S,
        instruction: &str,
    ) -> WorkspaceResult<Option<u64>> {
        if instruction.trim().is_empty() {
            return Err(WorkspaceError::EmptyInstruction);
        }
        let source = self.current_image_payload()?;
        let request = self.begin_external(BusyKind::Edit)?;
        let outcome = service.edit(&source, instruction);
        self.complete(request, outcome)
    }

    pub fn upscale_with<S: ImageService>(
        &mut self,
        service: &S,
        tier: UpscaleTier,
    ) -> WorkspaceResult<Option<u64>> {
        let source = self.current_image_payload()?;
        let request = self.begin_external(BusyKind::Upscale(tier))?;
        let outcome = service.upscale(&source, tier);
        self.complete(request, outcome)
    }

    pub fn remove_watermark_with<S: ImageService>(
        &mut self,
        service: &S,
    ) -> WorkspaceResult<Option<u64>> {
        let source = self.current_image_payload()?;
        let request = self.begin_external(BusyKind::RemoveWatermark)?;
        let outcome = service.edit(&source, REMOVE_WATERMARK_INSTRUCTION);
        self.complete(request, outcome)
    }

    fn current_image_payload(&self) -> WorkspaceResult<Arc<EncodedImage>> {
        self.registry
            .current()
            .map(|artifact| Arc::clone(&artifact.image))
            .ok_or(WorkspaceError::NoSourceImage)
    }

    // ---- error banner ----------------------------------------------------

    pub fn acknowledge_error(&mut self) -> WorkspaceResult<()> {
        self.machine.transition(ModeEvent::AcknowledgeError)?;
        self.banner = None;
        Ok(())
    }

    // ---- crop mode -------------------------------------------------------

    pub fn enter_crop(&mut self) -> WorkspaceResult<()> {
        if self.registry.current().is_none() {
            return Err(WorkspaceError::NoSourceImage);
        }
        self.machine.transition(ModeEvent::EnterCrop)?;
        self.crop.begin();
        Ok(())
    }

    pub fn crop_region(&self) -> Option<CropRegion> {
        self.crop.region()
    }

    pub fn crop_handle_down(&mut self, handle: RegionHandle) {
        if self.machine.mode() == WorkspaceMode::Cropping {
            self.crop.on_handle_down(handle);
        }
    }

    pub fn crop_handle_move(&mut self, pointer: PercentPoint) {
        if self.machine.mode() == WorkspaceMode::Cropping {
            self.crop.on_handle_move(pointer);
        }
    }

    pub fn crop_handle_up(&mut self) {
        if self.machine.mode() == WorkspaceMode::Cropping {
            self.crop.on_handle_up();
        }
    }

    pub fn set_crop_ratio(&mut self, lock: RatioLock) {
        if self.machine.mode() == WorkspaceMode::Cropping {
            self.crop.set_ratio_lock(lock);
        }
    }

    pub fn crop_undo(&mut self) -> bool {
        self.machine.mode() == WorkspaceMode::Cropping && self.crop.undo()
    }

    pub fn crop_redo(&mut self) -> bool {
        self.machine.mode() == WorkspaceMode::Cropping && self.crop.redo()
    }

    /// Extracts the selected region as a new artifact and returns to idle.
    /// Failures surface on the banner and leave the current image as it
    /// was; nothing is partially replaced.
    pub fn commit_crop(&mut self) -> WorkspaceResult<Option<u64>> {
        self.machine.transition(ModeEvent::CommitTool)?;

        let Some(source) = self.registry.current().cloned() else {
            self.crop.cancel();
            self.banner = Some("crop failed: no image is loaded".to_string());
            return Ok(None);
        };

        match self.crop.commit(&source.image) {
            Ok(image) => {
                let artifact = self.registry.mint(image, CROP_RESULT_LABEL, Some(source.id));
                let artifact_id = artifact.id;
                self.registry.replace_current(artifact);
                Ok(Some(artifact_id))
            }
            Err(err @ CropError::NoActiveSession) => {
                tracing::warn!(error = %err, "crop commit without a session");
                Ok(None)
            }
            Err(err) => {
                self.banner = Some(err.to_string());
                Ok(None)
            }
        }
    }

    pub fn cancel_crop(&mut self) -> WorkspaceResult<()> {
        self.machine.transition(ModeEvent::CancelTool)?;
        self.crop.cancel();
        Ok(())
    }

    // ---- zoom mode -------------------------------------------------------

    pub fn enter_zoom(&mut self) -> WorkspaceResult<()> {
        if self.registry.current().is_none() {
            return Err(WorkspaceError::NoSourceImage);
        }
        self.machine.transition(ModeEvent::EnterZoom)?;
        self.viewport = Some(ViewportTransform::new());
        Ok(())
    }

    pub fn viewport(&self) -> Option<&ViewportTransform> {
        self.viewport.as_ref()
    }

    pub fn zoom_by(&mut self, delta: f32) {
        if self.machine.mode() == WorkspaceMode::Zooming {
            if let Some(viewport) = self.viewport.as_mut() {
                viewport.zoom_by(delta);
            }
        }
    }

    pub fn set_zoom(&mut self, value: f32) {
        if self.machine.mode() == WorkspaceMode::Zooming {
            if let Some(viewport) = self.viewport.as_mut() {
                viewport.set_scale(value);
            }
        }
    }

    pub fn begin_pan(&mut self) -> bool {
        if self.machine.mode() != WorkspaceMode::Zooming {
            return false;
        }
        self.viewport
            .as_mut()
            .is_some_and(ViewportTransform::begin_pan)
    }

    pub fn pan_by(&mut self, delta_x: f32, delta_y: f32) {
        if self.machine.mode() == WorkspaceMode::Zooming {
            if let Some(viewport) = self.viewport.as_mut() {
                viewport.pan_by(delta_x, delta_y);
            }
        }
    }

    pub fn end_pan(&mut self) {
        if let Some(viewport) = self.viewport.as_mut() {
            viewport.end_pan();
        }
    }

    /// Leaves zoom mode, discarding the transform.
    pub fn exit_zoom(&mut self) -> WorkspaceResult<()> {
        self.machine.transition(ModeEvent::CancelTool)?;
        self.viewport = None;
        Ok(())
    }

    // ---- mask-paint mode -------------------------------------------------

    pub fn enter_mask_paint(&mut self) -> WorkspaceResult<()> {
        if self.registry.current().is_none() {
            return Err(WorkspaceError::NoSourceImage);
        }
        self.machine.transition(ModeEvent::EnterMaskPaint)?;
        self.mask = Some(MaskSurface::new());
        Ok(())
    }

    pub fn mask_surface(&self) -> Option<&MaskSurface> {
        self.mask.as_ref()
    }

    pub fn set_brush_diameter(&mut self, diameter: f32) {
        if let Some(mask) = self.mask.as_mut() {
            mask.set_brush_diameter(diameter);
        }
    }

    pub fn mask_begin_stroke(&mut self, at: RasterPoint) {
        if self.machine.mode() == WorkspaceMode::MaskPainting {
            if let Some(mask) = self.mask.as_mut() {
                mask.begin_stroke(at);
            }
        }
    }

    pub fn mask_continue_stroke(&mut self, to: RasterPoint) {
        if self.machine.mode() == WorkspaceMode::MaskPainting {
            if let Some(mask) = self.mask.as_mut() {
                mask.continue_stroke(to);
            }
        }
    }

    pub fn mask_end_stroke(&mut self) {
        if let Some(mask) = self.mask.as_mut() {
            mask.end_stroke();
        }
    }

    pub fn clear_mask(&mut self) {
        if self.machine.mode() == WorkspaceMode::MaskPainting {
            if let Some(mask) = self.mask.as_mut() {
                mask.clear();
            }
        }
    }

    /// Sends the source image plus the exported mask to the editing
    /// collaborator. The raster is discarded regardless of the outcome.
    pub fn commit_masked_edit_with<S: ImageService>(
        &mut self,
        service: &S,
        instruction: &str,
    ) -> WorkspaceResult<Option<u64>> {
        if instruction.trim().is_empty() {
            return Err(WorkspaceError::EmptyInstruction);
        }
        if self.machine.mode() != WorkspaceMode::MaskPainting {
            return Err(SessionError::InvalidModeTransition {
                from: self.machine.mode(),
                event: ModeEvent::CommitTool,
            }
            .into());
        }
        let source = self.current_image_payload()?;

        self.machine.transition(ModeEvent::CommitTool)?;
        let Some(mask) = self.mask.take() else {
            return Ok(None);
        };
        let mask_image = match mask.export_mask() {
            Ok(image) => image,
            Err(err) => {
                self.banner = Some(err.to_string());
                return Ok(None);
            }
        };

        let request = self.begin_external(BusyKind::Edit)?;
        let outcome = service.edit_with_mask(&source, &mask_image, instruction);
        self.complete(request, outcome)
    }

    pub fn cancel_mask_paint(&mut self) -> WorkspaceResult<()> {
        self.machine.transition(ModeEvent::CancelTool)?;
        self.mask = None;
        Ok(())
    }

    // ---- comparison ------------------------------------------------------

    pub fn compare_split(&self) -> f64 {
        self.compare.split_percent()
    }

    /// Moves the before/after split; inert unless a before image exists
    /// and no interactive mode or external call is active.
    pub fn scrub_compare(&mut self, pointer_x: f64, surface_left: f64, surface_width: f64) -> bool {
        if !self.can_compare() {
            return false;
        }
        self.compare.scrub(pointer_x, surface_left, surface_width);
        true
    }

    // ---- ingestion -------------------------------------------------------

    /// Files dropped or opened: the first becomes the current image when
    /// none is loaded, and every one becomes an idle batch entry.
    pub fn ingest_files(&mut self, images: Vec<EncodedImage>) {
        for image in images {
            let payload = Arc::new(image);
            if self.registry.current().is_none() {
                let artifact = self
                    .registry
                    .mint(payload.as_ref().clone(), ORIGINAL_LABEL, None);
                self.registry.install_current(artifact);
            }
            self.batch.enqueue(payload);
        }
    }

    pub fn paste_image(&mut self, image: EncodedImage) {
        self.paste_tray.push_image(Arc::new(image));
    }

    pub fn paste_text(&mut self, text: &str) {
        self.paste_tray.push_text(text);
    }

    // ---- batch -----------------------------------------------------------

    /// Processes every idle batch entry sequentially under one busy state.
    /// Per-item failures stay on their items; only queue-level conditions
    /// surface here.
    pub fn process_batch_with<S: ImageService>(
        &mut self,
        service: &S,
        operation: &BatchOperation,
    ) -> WorkspaceResult<BatchRunReport> {
        if self.batch.is_empty() {
            return Err(WorkspaceError::BatchEmpty);
        }
        let request = self.begin_external(BusyKind::Batch)?;
        let report = self.batch.process(service, operation);
        self.active_request = None;
        self.machine.transition(ModeEvent::FinishBusy)?;
        tracing::info!(
            processed = report.processed,
            failed = report.failed,
            token = request.token.value(),
            "batch run finished"
        );
        Ok(report)
    }

    // ---- export ----------------------------------------------------------

    pub fn export_current<E: ArtifactExporter>(
        &self,
        exporter: &E,
    ) -> WorkspaceResult<PathBuf> {
        let current = self.registry.current().ok_or(WorkspaceError::NoSourceImage)?;
        Ok(exporter.export_artifact(current)?)
    }

    pub fn export_results<E: ArtifactExporter>(
        &self,
        exporter: &E,
    ) -> WorkspaceResult<Vec<PathBuf>> {
        Ok(export_all(exporter, self.registry.results())?)
    }
}
