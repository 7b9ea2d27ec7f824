//! File enumeration helpers shared by the detector, converters, and merger.
//!
//! All listings come back sorted so every pipeline stage iterates files in a
//! stable order regardless of the underlying directory order.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::YoloprepError;

/// Image extensions recognized across the pipeline.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpeg", "jpg"];

/// Annotation extensions that mark a directory as a detection dataset.
pub const ANNOTATION_EXTENSIONS: [&str; 3] = ["txt", "json", "xml"];

/// YOLO label file extension.
pub const LABEL_EXTENSION: &str = "txt";

/// List files directly inside `dir` whose extension matches `extensions`
/// (case-insensitive). A missing or empty directory yields an empty list.
pub fn list_files_with_extensions(
    dir: &Path,
    extensions: &[&str],
) -> Result<Vec<PathBuf>, YoloprepError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(YoloprepError::Io)? {
        let entry = entry.map_err(YoloprepError::Io)?;
        let path = entry.path();
        if path.is_file() && has_extension(&path, extensions) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// List every file directly inside `dir`, sorted. Missing dirs are empty.
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>, YoloprepError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(YoloprepError::Io)? {
        let entry = entry.map_err(YoloprepError::Io)?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Recursively collect every file under `root`, sorted by relative path.
pub fn walk_all_files(root: &Path) -> Result<Vec<PathBuf>, YoloprepError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|source| YoloprepError::LayoutInvalid {
            path: root.to_path_buf(),
            message: format!("failed while traversing directory: {source}"),
        })?;

        if entry.file_type().is_file() {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_by_cached_key(|path| rel_string(root, path));
    Ok(files)
}

pub fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    allowed
        .iter()
        .any(|allowed_ext| ext.eq_ignore_ascii_case(allowed_ext))
}

/// Path relative to `root`, rendered with forward slashes.
pub fn rel_string(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}
