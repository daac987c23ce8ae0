//! Writing artifacts to named downloadable files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::artifact::ImageArtifact;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type ExportResult<T> = std::result::Result<T, ExportError>;

pub trait ArtifactExporter {
    fn export_artifact(&self, artifact: &ImageArtifact) -> ExportResult<PathBuf>;
}

#[derive(Debug, Clone)]
pub struct FileExporter {
    export_dir: PathBuf,
}

impl FileExporter {
    pub const fn with_dir(export_dir: PathBuf) -> Self {
        Self { export_dir }
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    /// Derives a stable, collision-free file name from the artifact's
    /// label and id.
    pub fn target_path(&self, artifact: &ImageArtifact) -> PathBuf {
        let slug = label_slug(&artifact.resolution_label);
        let extension = artifact
            .image
            .format
            .extensions_str()
            .first()
            .copied()
            .unwrap_or("bin");
        let mut path = self.export_dir.clone();
        path.push(format!("{slug}-{:03}.{extension}", artifact.id));
        path
    }

    pub fn export_artifact(&self, artifact: &ImageArtifact) -> ExportResult<PathBuf> {
        let target = self.target_path(artifact);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, &artifact.image.bytes)?;
        tracing::info!(path = %target.display(), artifact_id = artifact.id, "artifact exported");
        Ok(target)
    }
}

impl ArtifactExporter for FileExporter {
    fn export_artifact(&self, artifact: &ImageArtifact) -> ExportResult<PathBuf> {
        self.export_artifact(artifact)
    }
}

/// Exports every artifact in order, one file per entry.
pub fn export_all<E: ArtifactExporter>(
    exporter: &E,
    artifacts: &[ImageArtifact],
) -> ExportResult<Vec<PathBuf>> {
    let mut paths = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        paths.push(exporter.export_artifact(artifact)?);
    }
    Ok(paths)
}

fn label_slug(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    for ch in label.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let trimmed = slug.trim_matches('-');
    if trimmed.is_empty() {
        "artifact".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{ArtifactRegistry, EncodedImage};
    use image::ImageFormat;

    fn artifact_with_label(label: &str) -> ImageArtifact {
        let mut registry = ArtifactRegistry::new();
        registry.mint(
            EncodedImage::new(ImageFormat::Png, vec![1, 2, 3]),
            label,
            None,
        )
    }

    #[test]
    fn target_path_combines_slug_id_and_format_extension() {
        let exporter = FileExporter::with_dir(PathBuf::from("/tmp/atelier-out"));
        let artifact = artifact_with_label("Upscaled 2x");
        let path = exporter.target_path(&artifact);
        assert_eq!(path, PathBuf::from("/tmp/atelier-out/upscaled-2x-001.png"));
    }

    #[test]
    fn empty_labels_fall_back_to_a_generic_slug() {
        let exporter = FileExporter::with_dir(PathBuf::from("/tmp/atelier-out"));
        let artifact = artifact_with_label("  ");
        let path = exporter.target_path(&artifact);
        assert!(path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("artifact-")));
    }

    #[test]
    fn export_writes_the_encoded_bytes_verbatim() {
        let dir = std::env::temp_dir().join("atelier-export-test");
        let exporter = FileExporter::with_dir(dir.clone());
        let artifact = artifact_with_label("Cropped");

        let path = exporter.export_artifact(&artifact).expect("export succeeds");
        let written = fs::read(&path).expect("exported file readable");
        assert_eq!(written, artifact.image.bytes);
        let _ = fs::remove_file(path);
        let _ = fs::remove_dir(dir);
    }

    #[test]
    fn export_all_writes_one_file_per_entry_in_order() {
        let dir = std::env::temp_dir().join("atelier-export-all-test");
        let exporter = FileExporter::with_dir(dir.clone());

        let mut registry = ArtifactRegistry::new();
        let artifacts: Vec<_> = (0..3)
            .map(|i| {
                registry.mint(
                    EncodedImage::new(ImageFormat::Png, vec![i]),
                    "Generated",
                    None,
                )
            })
            .collect();

        let paths = export_all(&exporter, &artifacts).expect("batch export succeeds");
        assert_eq!(paths.len(), 3);
        assert!(paths[0] < paths[1] && paths[1] < paths[2]);
        for path in &paths {
            let _ = fs::remove_file(path);
        }
        let _ = fs::remove_dir(dir);
    }
}
