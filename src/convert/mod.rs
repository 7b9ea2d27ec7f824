//! Annotation conversion and sample collection.
//!
//! Two independent converters rewrite source annotations into YOLO `.txt`
//! records: [`voc_xml`] for Pascal VOC bounding boxes and [`via_json`] for
//! VIA polygon regions. On top of them this module collects the
//! (image, label) samples that the splitter and organizer consume.

pub mod via_json;
pub mod voc_xml;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::error::YoloprepError;
use crate::scan::{list_files_with_extensions, IMAGE_EXTENSIONS, LABEL_EXTENSION};
use crate::vocab::ClassVocabulary;

/// Outcome of converting one directory's annotations.
#[derive(Debug, Default)]
pub struct ConvertedDir {
    /// Label files written.
    pub labels_written: usize,
    /// Records skipped (unparseable files, missing images, write failures).
    pub skipped: usize,
}

/// One image together with its optional annotation file.
///
/// Samples are created during collection, consumed once by the splitter
/// and organizer, and never mutated afterward.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabeledSample {
    pub image: PathBuf,
    pub annotation: Option<PathBuf>,
}

/// Collect every class name from the annotations in `dir`, across both
/// annotation styles.
///
/// Callers pool the names from every input directory into one
/// [`ClassVocabulary`] before converting, so the ids written to label
/// files agree everywhere the vocabulary is published.
pub fn collect_class_names(dir: &Path) -> Result<Vec<String>, YoloprepError> {
    let mut names = via_json::collect_names(dir)?;
    names.extend(voc_xml::collect_names(dir)?);
    Ok(names)
}

/// Convert whatever annotation style `dir` holds into YOLO label files,
/// resolving class ids against `vocabulary`.
pub fn convert_annotations(
    dir: &Path,
    vocabulary: &ClassVocabulary,
) -> Result<ConvertedDir, YoloprepError> {
    let from_json = via_json::convert_dir(dir, vocabulary)?;
    let from_xml = voc_xml::convert_dir(dir, vocabulary)?;

    Ok(ConvertedDir {
        labels_written: from_json.labels_written + from_xml.labels_written,
        skipped: from_json.skipped + from_xml.skipped,
    })
}

/// Pair every image in `dir` with its same-stem `.txt` label file.
///
/// Images without a label get an empty one created (background images); a
/// failure to create it skips the image with a warning.
pub fn collect_detection_samples(dir: &Path) -> Result<Vec<LabeledSample>, YoloprepError> {
    let images = list_files_with_extensions(dir, &IMAGE_EXTENSIONS)?;
    info!("{}: {} image(s)", dir.display(), images.len());

    let mut samples = Vec::with_capacity(images.len());
    for image in images {
        let label = image.with_extension(LABEL_EXTENSION);
        if !label.is_file() {
            if let Err(err) = fs::write(&label, "") {
                warn!("cannot create {}: {err}, skipping", label.display());
                continue;
            }
        }
        samples.push(LabeledSample {
            image,
            annotation: Some(label),
        });
    }

    Ok(samples)
}

/// Collect classification samples grouped by class name.
///
/// A directory whose basename is numeric is one class; otherwise its
/// numeric subdirectories are the classes; otherwise all images land in
/// class `"0"`.
pub fn collect_classification_samples(
    dirs: &[PathBuf],
) -> Result<BTreeMap<String, Vec<PathBuf>>, YoloprepError> {
    let mut classes: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();

    for dir in dirs {
        if !dir.is_dir() {
            continue;
        }

        if let Some(class_name) = numeric_basename(dir) {
            let images = list_files_with_extensions(dir, &IMAGE_EXTENSIONS)?;
            classes.entry(class_name).or_default().extend(images);
            continue;
        }

        let mut found_class_dirs = false;
        for entry in fs::read_dir(dir).map_err(YoloprepError::Io)? {
            let entry = entry.map_err(YoloprepError::Io)?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            if let Some(class_name) = numeric_basename(&path) {
                found_class_dirs = true;
                let images = list_files_with_extensions(&path, &IMAGE_EXTENSIONS)?;
                classes.entry(class_name).or_default().extend(images);
            }
        }

        if !found_class_dirs {
            let images = list_files_with_extensions(dir, &IMAGE_EXTENSIONS)?;
            if !images.is_empty() {
                classes.entry("0".to_string()).or_default().extend(images);
            }
        }
    }

    Ok(classes)
}

fn numeric_basename(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty() && name.chars().all(|c| c.is_ascii_digit()))
        .map(ToOwned::to_owned)
}
