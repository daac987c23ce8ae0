use crate::service::UpscaleTier;

/// Kind of external-service call currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusyKind {
    Generate,
    Edit,
    Upscale(UpscaleTier),
    Batch,
    RemoveWatermark,
}

impl BusyKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Generate => "Generating",
            Self::Edit => "Applying edit",
            Self::Upscale(UpscaleTier::Standard) => "Upscaling (Standard)",
            Self::Upscale(UpscaleTier::Premium) => "Upscaling (Premium)",
            Self::Batch => "Processing batch",
            Self::RemoveWatermark => "Removing watermark",
        }
    }
}

/// Exactly one of these holds at any instant; the machine's transition
/// table is the sole authority over which mode may follow which.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkspaceMode {
    #[default]
    Idle,
    Busy(BusyKind),
    Cropping,
    Zooming,
    MaskPainting,
    Error,
}

impl WorkspaceMode {
    pub const fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }

    pub const fn is_busy(self) -> bool {
        matches!(self, Self::Busy(_))
    }

    /// True for the pointer-driven modes that claim exclusive input.
    pub const fn is_interactive(self) -> bool {
        matches!(self, Self::Cropping | Self::Zooming | Self::MaskPainting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_kind_labels_are_distinct_per_kind() {
        let labels = [
            BusyKind::Generate.label(),
            BusyKind::Edit.label(),
            BusyKind::Upscale(UpscaleTier::Standard).label(),
            BusyKind::Upscale(UpscaleTier::Premium).label(),
            BusyKind::Batch.label(),
            BusyKind::RemoveWatermark.label(),
        ];
        for (i, a) in labels.iter().enumerate() {
            for (j, b) in labels.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b);
                }
            }
        }
    }

    #[test]
    fn interactive_classification_covers_pointer_modes_only() {
        assert!(WorkspaceMode::Cropping.is_interactive());
        assert!(WorkspaceMode::Zooming.is_interactive());
        assert!(WorkspaceMode::MaskPainting.is_interactive());
        assert!(!WorkspaceMode::Idle.is_interactive());
        assert!(!WorkspaceMode::Busy(BusyKind::Generate).is_interactive());
        assert!(!WorkspaceMode::Error.is_interactive());
    }
}
