//! Clipboard-paste classification and the side paste tray.
//!
//! The tray is independent of the main editing session: most-recent-first,
//! unbounded, never touched by commits or mode changes.

use std::sync::Arc;

use crate::artifact::EncodedImage;

const VIDEO_URL_HOSTS: &[&str] = &["youtube.com/", "youtu.be/", "vimeo.com/"];
const VIDEO_FILE_SUFFIXES: &[&str] = &[".mp4", ".webm", ".mov"];

#[derive(Debug, Clone, PartialEq)]
pub enum PastedItem {
    Image(Arc<EncodedImage>),
    Text(String),
    VideoReference(String),
}

impl PastedItem {
    pub const fn kind_label(&self) -> &'static str {
        match self {
            Self::Image(_) => "image",
            Self::Text(_) => "text",
            Self::VideoReference(_) => "video",
        }
    }
}

/// Classifies a pasted string: known video-URL shapes become a video
/// reference, everything else stays plain text.
pub fn classify_text(text: &str) -> PastedItem {
    let trimmed = text.trim();
    if is_video_reference(trimmed) {
        PastedItem::VideoReference(trimmed.to_string())
    } else {
        PastedItem::Text(trimmed.to_string())
    }
}

fn is_video_reference(text: &str) -> bool {
    let lowered = text.to_ascii_lowercase();
    if VIDEO_URL_HOSTS.iter().any(|host| lowered.contains(host)) {
        return true;
    }
    VIDEO_FILE_SUFFIXES
        .iter()
        .any(|suffix| lowered.ends_with(suffix))
}

#[derive(Debug, Default)]
pub struct PasteTray {
    items: Vec<PastedItem>,
}

impl PasteTray {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn push_image(&mut self, image: Arc<EncodedImage>) {
        self.items.insert(0, PastedItem::Image(image));
    }

    pub fn push_text(&mut self, text: &str) {
        let item = classify_text(text);
        tracing::debug!(kind = item.kind_label(), "paste tray item added");
        self.items.insert(0, item);
    }

    /// Most recent first.
    pub fn items(&self) -> &[PastedItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat;

    #[test]
    fn known_video_url_shapes_classify_as_video_references() {
        for text in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://vimeo.com/148751763",
            "https://cdn.example.com/clip.MP4",
            "  https://example.com/loop.webm  ",
        ] {
            assert!(
                matches!(classify_text(text), PastedItem::VideoReference(_)),
                "{text} should classify as video"
            );
        }
    }

    #[test]
    fn ordinary_text_stays_text() {
        for text in [
            "make the sky more dramatic",
            "https://example.com/article",
            "mp4 is a container format",
        ] {
            assert!(
                matches!(classify_text(text), PastedItem::Text(_)),
                "{text} should classify as text"
            );
        }
    }

    #[test]
    fn classification_trims_surrounding_whitespace() {
        let item = classify_text("  hello  ");
        assert_eq!(item, PastedItem::Text("hello".to_string()));
    }

    #[test]
    fn tray_orders_most_recent_first() {
        let mut tray = PasteTray::new();
        tray.push_text("first");
        tray.push_text("second");
        tray.push_image(Arc::new(EncodedImage::new(ImageFormat::Png, vec![1])));

        assert_eq!(tray.len(), 3);
        assert_eq!(tray.items()[0].kind_label(), "image");
        assert_eq!(tray.items()[1], PastedItem::Text("second".to_string()));
        assert_eq!(tray.items()[2], PastedItem::Text("first".to_string()));
    }

    #[test]
    fn tray_grows_without_a_cap() {
        let mut tray = PasteTray::new();
        for i in 0..200 {
            tray.push_text(&format!("note {i}"));
        }
        assert_eq!(tray.len(), 200);
        assert_eq!(tray.items()[0], PastedItem::Text("note 199".to_string()));
    }
}
