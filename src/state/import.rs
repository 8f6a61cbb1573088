/// File acquisition: turns a picked folder into importable image entries.
///
/// Only names and modification times are collected; file contents are never read.
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::collection::ImageCollection;
use super::image::Image;

/// Extensions the gallery accepts on import (compared lowercase)
const IMAGE_EXTENSIONS: [&str; 8] = ["jpg", "jpeg", "png", "gif", "bmp", "webp", "tif", "tiff"];

/// A file picked for import
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedFile {
    pub path: PathBuf,
    pub modified: DateTime<Utc>,
}

impl ImportedFile {
    pub fn new(path: impl Into<PathBuf>, modified: DateTime<Utc>) -> Self {
        Self {
            path: path.into(),
            modified,
        }
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Recursively collect image files under `folder`, sorted by path
pub fn scan_folder(folder: &Path) -> Vec<ImportedFile> {
    tracing::info!(folder = %folder.display(), "scanning folder");

    let mut files: Vec<ImportedFile> = WalkDir::new(folder)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && has_image_extension(entry.path()))
        .filter(|entry| {
            let utf8 = entry.path().to_str().is_some();
            if !utf8 {
                tracing::warn!(path = %entry.path().display(), "skipping file with a non-UTF-8 path");
            }
            utf8
        })
        .map(|entry| {
            let modified = entry
                .metadata()
                .ok()
                .and_then(|meta| meta.modified().ok())
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(Utc::now);
            ImportedFile::new(entry.into_path(), modified)
        })
        .collect();

    files.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::info!(count = files.len(), "scan complete");
    files
}

/// Scan on tokio's blocking pool so the UI thread stays responsive
pub async fn scan_folder_async(folder: PathBuf) -> Result<Vec<ImportedFile>, String> {
    tokio::task::spawn_blocking(move || scan_folder(&folder))
        .await
        .map_err(|e| format!("Task join error: {}", e))
}

/// Append one unrated, uncaptioned image per file. Returns the new images.
///
/// Paths are stored as text, so files whose path is not valid UTF-8 are skipped.
pub fn import_files(collection: &ImageCollection, files: &[ImportedFile]) -> Vec<Image> {
    files
        .iter()
        .filter_map(|file| {
            let Some(path) = file.path.to_str() else {
                tracing::warn!(path = %file.path.display(), "not importing file with a non-UTF-8 path");
                return None;
            };
            let image = Image::new(path, file.modified, "", 0);
            collection.add_image(image.clone());
            Some(image)
        })
        .collect()
}
