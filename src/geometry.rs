//! Region math in normalized percentage space.
//!
//! All interactive geometry happens in [0,100] on each axis so the same
//! values drive any displayed size; conversion to pixels happens only when a
//! crop is extracted.

pub const CANVAS_EXTENT: f64 = 100.0;
pub const MIN_EDGE_PERCENT: f64 = 5.0;
pub const RATIO_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentPoint {
    pub x: f64,
    pub y: f64,
}

impl PercentPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentSize {
    pub w: f64,
    pub h: f64,
}

impl PercentSize {
    pub const fn new(w: f64, h: f64) -> Self {
        Self { w, h }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatioLock {
    Free,
    Square,
    Wide16x9,
    Tall9x16,
}

impl RatioLock {
    pub const ALL: [RatioLock; 4] = [Self::Free, Self::Square, Self::Wide16x9, Self::Tall9x16];

    pub const fn is_free(self) -> bool {
        matches!(self, Self::Free)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Free => "Free",
            Self::Square => "1:1",
            Self::Wide16x9 => "16:9",
            Self::Tall9x16 => "9:16",
        }
    }

    /// Width-over-height ratio, or `None` for free-form regions.
    pub fn ratio(self) -> Option<f64> {
        match self {
            Self::Free => None,
            Self::Square => Some(1.0),
            Self::Wide16x9 => Some(16.0 / 9.0),
            Self::Tall9x16 => Some(9.0 / 16.0),
        }
    }

    /// Default region size applied when this lock is selected.
    pub const fn canonical_size(self) -> Option<PercentSize> {
        match self {
            Self::Free => None,
            Self::Square => Some(PercentSize::new(40.0, 40.0)),
            Self::Wide16x9 => Some(PercentSize::new(80.0, 45.0)),
            Self::Tall9x16 => Some(PercentSize::new(45.0, 80.0)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionHandle {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Center,
}

/// Centered rectangle in percentage space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRegion {
    pub center: PercentPoint,
    pub size: PercentSize,
    pub ratio_lock: RatioLock,
}

impl CropRegion {
    pub const fn new(center: PercentPoint, size: PercentSize, ratio_lock: RatioLock) -> Self {
        Self {
            center,
            size,
            ratio_lock,
        }
    }

    pub fn left(&self) -> f64 {
        self.center.x - self.size.w / 2.0
    }

    pub fn right(&self) -> f64 {
        self.center.x + self.size.w / 2.0
    }

    pub fn top(&self) -> f64 {
        self.center.y - self.size.h / 2.0
    }

    pub fn bottom(&self) -> f64 {
        self.center.y + self.size.h / 2.0
    }

    pub fn in_bounds(&self) -> bool {
        self.left() >= -RATIO_TOLERANCE
            && self.top() >= -RATIO_TOLERANCE
            && self.right() <= CANVAS_EXTENT + RATIO_TOLERANCE
            && self.bottom() <= CANVAS_EXTENT + RATIO_TOLERANCE
    }

    pub fn ratio_satisfied(&self) -> bool {
        match self.ratio_lock.ratio() {
            None => true,
            Some(ratio) => (self.size.w / self.size.h - ratio).abs() <= 1e-3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Shrinks and repositions `region` so the rectangle stays within the
/// canvas. Idempotent: clamping an already-clamped region is a no-op.
pub fn clamp_region_to_bounds(region: CropRegion) -> CropRegion {
    let w = region.size.w.clamp(0.0, CANVAS_EXTENT);
    let h = region.size.h.clamp(0.0, CANVAS_EXTENT);
    let cx = region.center.x.clamp(w / 2.0, CANVAS_EXTENT - w / 2.0);
    let cy = region.center.y.clamp(h / 2.0, CANVAS_EXTENT - h / 2.0);
    CropRegion::new(
        PercentPoint::new(cx, cy),
        PercentSize::new(w, h),
        region.ratio_lock,
    )
}

/// Moves or resizes `region` from one of its handles toward `pointer`.
///
/// `Center` translates the rectangle, clamped so its edges stay in bounds.
/// A corner handle pins the opposite corner and drags the selected corner
/// toward the pointer, holding a minimum edge of [`MIN_EDGE_PERCENT`] per
/// axis. Under a ratio lock, height is derived from width; if that would
/// cross the top or bottom bound, height is clamped to the available space
/// and width re-derived so the ratio holds exactly and the pinned corner
/// never moves.
pub fn resize_from_handle(
    region: CropRegion,
    handle: RegionHandle,
    pointer: PercentPoint,
    ratio_lock: RatioLock,
) -> CropRegion {
    match handle {
        RegionHandle::Center => translate_to_pointer(region, pointer),
        corner => resize_corner(region, corner, pointer, ratio_lock),
    }
}

fn translate_to_pointer(region: CropRegion, pointer: PercentPoint) -> CropRegion {
    let half_w = region.size.w / 2.0;
    let half_h = region.size.h / 2.0;
    let cx = pointer.x.clamp(half_w, CANVAS_EXTENT - half_w);
    let cy = pointer.y.clamp(half_h, CANVAS_EXTENT - half_h);
    CropRegion::new(PercentPoint::new(cx, cy), region.size, region.ratio_lock)
}

fn anchor_corner(region: &CropRegion, handle: RegionHandle) -> PercentPoint {
    match handle {
        RegionHandle::TopLeft => PercentPoint::new(region.right(), region.bottom()),
        RegionHandle::TopRight => PercentPoint::new(region.left(), region.bottom()),
        RegionHandle::BottomLeft => PercentPoint::new(region.right(), region.top()),
        RegionHandle::BottomRight => PercentPoint::new(region.left(), region.top()),
        RegionHandle::Center => region.center,
    }
}

const fn handle_extends_left(handle: RegionHandle) -> bool {
    matches!(handle, RegionHandle::TopLeft | RegionHandle::BottomLeft)
}

const fn handle_extends_up(handle: RegionHandle) -> bool {
    matches!(handle, RegionHandle::TopLeft | RegionHandle::TopRight)
}

fn resize_corner(
    region: CropRegion,
    handle: RegionHandle,
    pointer: PercentPoint,
    ratio_lock: RatioLock,
) -> CropRegion {
    let anchor = anchor_corner(&region, handle);
    let px = pointer.x.clamp(0.0, CANVAS_EXTENT);
    let py = pointer.y.clamp(0.0, CANVAS_EXTENT);

    let max_w = if handle_extends_left(handle) {
        anchor.x
    } else {
        CANVAS_EXTENT - anchor.x
    };
    let max_h = if handle_extends_up(handle) {
        anchor.y
    } else {
        CANVAS_EXTENT - anchor.y
    };

    let dragged_w = if handle_extends_left(handle) {
        anchor.x - px
    } else {
        px - anchor.x
    };
    let mut w = dragged_w.clamp(MIN_EDGE_PERCENT, max_w.max(MIN_EDGE_PERCENT));

    let mut h = match ratio_lock.ratio() {
        Some(ratio) => {
            let mut locked_h = w / ratio;
            if locked_h > max_h {
                locked_h = max_h;
                w = locked_h * ratio;
            }
            locked_h
        }
        None => {
            let dragged_h = if handle_extends_up(handle) {
                anchor.y - py
            } else {
                py - anchor.y
            };
            dragged_h.clamp(MIN_EDGE_PERCENT, max_h.max(MIN_EDGE_PERCENT))
        }
    };
    h = h.min(max_h.max(0.0));

    let left = if handle_extends_left(handle) {
        anchor.x - w
    } else {
        anchor.x
    };
    let top = if handle_extends_up(handle) {
        anchor.y - h
    } else {
        anchor.y
    };

    CropRegion::new(
        PercentPoint::new(left + w / 2.0, top + h / 2.0),
        PercentSize::new(w, h),
        ratio_lock,
    )
}

/// Converts the centered percentage rectangle into a top-left pixel
/// rectangle over a `pixel_width` by `pixel_height` source.
pub fn map_percent_to_pixel_rect(
    region: &CropRegion,
    pixel_width: u32,
    pixel_height: u32,
) -> PixelRect {
    let source_w = f64::from(pixel_width);
    let source_h = f64::from(pixel_height);
    let width = (region.size.w / CANVAS_EXTENT * source_w).round();
    let height = (region.size.h / CANVAS_EXTENT * source_h).round();
    let x = (region.center.x / CANVAS_EXTENT * source_w - width / 2.0).round();
    let y = (region.center.y / CANVAS_EXTENT * source_h - height / 2.0).round();

    let x = x.clamp(0.0, source_w) as u32;
    let y = y.clamp(0.0, source_h) as u32;
    let width = (width.max(0.0) as u32).min(pixel_width.saturating_sub(x));
    let height = (height.max(0.0) as u32).min(pixel_height.saturating_sub(y));
    PixelRect::new(x, y, width, height)
}
