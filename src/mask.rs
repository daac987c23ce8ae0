//! Freehand mask painting over a fixed-resolution raster.
//!
//! The raster is monochrome: black pixels are kept, white pixels mark the
//! erase target drawn by strokes. Its resolution never changes with the
//! on-screen size, so strokes stay pixel-accurate under window resizing.

use image::{DynamicImage, GrayImage, Luma};

use crate::artifact::{ArtifactResult, EncodedImage};

pub const MASK_RESOLUTION: u32 = 1024;
pub const BRUSH_DIAMETER_DEFAULT: f32 = 40.0;
pub const BRUSH_DIAMETER_MIN: f32 = 5.0;
pub const BRUSH_DIAMETER_MAX: f32 = 150.0;

const KEEP: Luma<u8> = Luma([0]);
const ERASE: Luma<u8> = Luma([255]);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterPoint {
    pub x: f32,
    pub y: f32,
}

impl RasterPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone)]
pub struct MaskSurface {
    raster: GrayImage,
    brush_diameter: f32,
    stroke_anchor: Option<RasterPoint>,
}

impl Default for MaskSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl MaskSurface {
    pub fn new() -> Self {
        Self {
            raster: GrayImage::from_pixel(MASK_RESOLUTION, MASK_RESOLUTION, KEEP),
            brush_diameter: BRUSH_DIAMETER_DEFAULT,
            stroke_anchor: None,
        }
    }

    pub const fn brush_diameter(&self) -> f32 {
        self.brush_diameter
    }

    pub fn set_brush_diameter(&mut self, diameter: f32) {
        self.brush_diameter = diameter.clamp(BRUSH_DIAMETER_MIN, BRUSH_DIAMETER_MAX);
    }

    pub const fn stroke_in_progress(&self) -> bool {
        self.stroke_anchor.is_some()
    }

    /// Maps a display-space pointer position onto the raster by the ratio
    /// of raster resolution to displayed element size.
    pub fn display_to_raster(
        &self,
        display_x: f64,
        display_y: f64,
        shown_width: f64,
        shown_height: f64,
    ) -> RasterPoint {
        let scale_x = f64::from(MASK_RESOLUTION) / shown_width.max(1.0);
        let scale_y = f64::from(MASK_RESOLUTION) / shown_height.max(1.0);
        RasterPoint::new(
            (display_x * scale_x) as f32,
            (display_y * scale_y) as f32,
        )
    }

    pub fn begin_stroke(&mut self, at: RasterPoint) {
        self.stamp_disc(at);
        self.stroke_anchor = Some(at);
    }

    /// Extends the open stroke with a round-capped segment. Without a
    /// preceding `begin_stroke` this draws nothing.
    pub fn continue_stroke(&mut self, to: RasterPoint) {
        let Some(from) = self.stroke_anchor else {
            return;
        };
        self.stamp_segment(from, to);
        self.stroke_anchor = Some(to);
    }

    pub fn end_stroke(&mut self) {
        self.stroke_anchor = None;
    }

    /// Resets every pixel to "keep".
    pub fn clear(&mut self) {
        for pixel in self.raster.pixels_mut() {
            *pixel = KEEP;
        }
    }

    /// Serializes the current raster state as a PNG blob.
    pub fn export_mask(&self) -> ArtifactResult<EncodedImage> {
        EncodedImage::from_pixels(&DynamicImage::ImageLuma8(self.raster.clone()))
    }

    pub fn raster(&self) -> &GrayImage {
        &self.raster
    }

    pub fn erased_pixel_count(&self) -> usize {
        self.raster.pixels().filter(|pixel| **pixel == ERASE).count()
    }

    fn stamp_segment(&mut self, from: RasterPoint, to: RasterPoint) {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let length = (dx * dx + dy * dy).sqrt();
        // Overlapping stamps half a radius apart leave no gaps in the cap.
        let step = (self.brush_diameter / 4.0).max(0.5);
        let steps = (length / step).ceil().max(1.0) as u32;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            self.stamp_disc(RasterPoint::new(from.x + dx * t, from.y + dy * t));
        }
    }

    fn stamp_disc(&mut self, center: RasterPoint) {
        let radius = self.brush_diameter / 2.0;
        let min_x = ((center.x - radius).floor().max(0.0)) as u32;
        let min_y = ((center.y - radius).floor().max(0.0)) as u32;
        let max_x = ((center.x + radius).ceil().min(MASK_RESOLUTION as f32)) as u32;
        let max_y = ((center.y + radius).ceil().min(MASK_RESOLUTION as f32)) as u32;

        for y in min_y..max_y.min(MASK_RESOLUTION) {
            for x in min_x..max_x.min(MASK_RESOLUTION) {
                let px = x as f32 + 0.5 - center.x;
                let py = y as f32 + 0.5 - center.y;
                if px * px + py * py <= radius * radius {
                    self.raster.put_pixel(x, y, ERASE);
                }
            }
        }
    }
}
