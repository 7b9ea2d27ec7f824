//! Task-kind detection.
//!
//! A directory that contains annotation files (`.txt`, `.json`, `.xml`)
//! directly inside it is treated as a detection dataset; a tree of
//! class-named image folders is a classification dataset.

use std::fmt;
use std::path::PathBuf;

use log::info;

use crate::error::YoloprepError;
use crate::scan::{list_files_with_extensions, ANNOTATION_EXTENSIONS};

/// The kind of training task a set of dataset directories supports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskKind {
    /// Images grouped into class folders, no annotation files.
    Classification,
    /// Images paired with annotation files.
    Detection,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Classification => write!(f, "classification"),
            TaskKind::Detection => write!(f, "detection"),
        }
    }
}

/// Classify the task kind of a set of dataset directories.
///
/// Missing or empty directories contribute no evidence. If no directory
/// yields annotation files, the default is [`TaskKind::Classification`].
pub fn detect_task(dirs: &[PathBuf]) -> Result<TaskKind, YoloprepError> {
    for dir in dirs {
        let annotation_files = list_files_with_extensions(dir, &ANNOTATION_EXTENSIONS)?;
        info!(
            "{}: {} annotation file(s)",
            dir.display(),
            annotation_files.len()
        );
        if !annotation_files.is_empty() {
            return Ok(TaskKind::Detection);
        }
    }

    Ok(TaskKind::Classification)
}
