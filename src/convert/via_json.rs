//! VIA-style polygon JSON to YOLO-segmentation label conversion.
//!
//! One JSON file per directory maps arbitrary keys to records carrying an
//! image filename and a list of polygon regions, each tagged with a
//! category. [`collect_names`] gathers the categories so the caller can fix
//! one class vocabulary over the whole corpus; [`convert_dir`] then writes
//! one same-stem `.txt` per referenced image that exists on disk, with one
//! `class_id x1 y1 x2 y2 ...` line per polygon, vertices normalized by the
//! image dimensions.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::Deserialize;

use crate::convert::ConvertedDir;
use crate::error::YoloprepError;
use crate::scan::{list_files_with_extensions, LABEL_EXTENSION};
use crate::vocab::ClassVocabulary;

#[derive(Debug, Deserialize)]
struct ViaRecord {
    filename: String,
    #[serde(default)]
    regions: Vec<ViaRegion>,
}

#[derive(Debug, Deserialize)]
struct ViaRegion {
    shape_attributes: ViaShape,
    region_attributes: ViaRegionAttributes,
}

#[derive(Debug, Deserialize)]
struct ViaShape {
    name: String,
    #[serde(default)]
    all_points_x: Vec<f64>,
    #[serde(default)]
    all_points_y: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct ViaRegionAttributes {
    category: Option<String>,
}

/// Collect every region category from the polygon JSON found in `dir`.
///
/// The first `.json` file in the directory is taken as the annotation
/// index; a directory without one contributes no names.
pub fn collect_names(dir: &Path) -> Result<Vec<String>, YoloprepError> {
    let json_files = list_files_with_extensions(dir, &["json"])?;
    let Some(json_path) = json_files.first() else {
        return Ok(Vec::new());
    };

    let data = fs::read_to_string(json_path).map_err(YoloprepError::Io)?;
    let records = parse_via_str(&data, json_path)?;

    Ok(records
        .values()
        .flat_map(|record| &record.regions)
        .filter_map(|region| region.region_attributes.category.clone())
        .collect())
}

/// Convert the polygon JSON found in `dir` to YOLO label files, resolving
/// class ids against `vocabulary`.
///
/// The first `.json` file in the directory is taken as the annotation
/// index. Records whose image is missing on disk are skipped; label-write
/// failures skip that image only.
pub fn convert_dir(
    dir: &Path,
    vocabulary: &ClassVocabulary,
) -> Result<ConvertedDir, YoloprepError> {
    let json_files = list_files_with_extensions(dir, &["json"])?;
    let Some(json_path) = json_files.first() else {
        return Ok(ConvertedDir::default());
    };

    let data = fs::read_to_string(json_path).map_err(YoloprepError::Io)?;
    let records = parse_via_str(&data, json_path)?;

    info!(
        "{}: {} annotated image(s), {} class(es)",
        json_path.display(),
        records.len(),
        vocabulary.len()
    );

    let mut outcome = ConvertedDir::default();

    for record in records.values() {
        let image_path = dir.join(&record.filename);
        if !image_path.is_file() {
            warn!("image {} not found, skipping", image_path.display());
            outcome.skipped += 1;
            continue;
        }

        let size = match imagesize::size(&image_path) {
            Ok(size) => size,
            Err(err) => {
                warn!(
                    "cannot read dimensions of {}: {err}, skipping",
                    image_path.display()
                );
                outcome.skipped += 1;
                continue;
            }
        };
        let (width, height) = (size.width as f64, size.height as f64);

        let mut lines = String::new();
        for region in &record.regions {
            if region.shape_attributes.name != "polygon" {
                continue;
            }

            let Some(category) = region.region_attributes.category.as_deref() else {
                warn!(
                    "{}: region without category, skipping",
                    record.filename
                );
                continue;
            };
            let Some(class_id) = vocabulary.id(category) else {
                warn!(
                    "{}: category '{}' missing from vocabulary, skipping",
                    record.filename, category
                );
                continue;
            };

            let xs = &region.shape_attributes.all_points_x;
            let ys = &region.shape_attributes.all_points_y;
            if xs.len() != ys.len() || xs.is_empty() {
                warn!(
                    "{}: polygon with mismatched vertex lists, skipping",
                    record.filename
                );
                continue;
            }

            lines.push_str(&class_id.to_string());
            for (x, y) in xs.iter().zip(ys) {
                lines.push_str(&format!(" {} {}", x / width, y / height));
            }
            lines.push('\n');
        }

        let label_path = image_path.with_extension(LABEL_EXTENSION);
        match fs::write(&label_path, lines) {
            Ok(()) => outcome.labels_written += 1,
            Err(err) => {
                warn!("cannot write {}: {err}, skipping", label_path.display());
                outcome.skipped += 1;
            }
        }
    }

    Ok(outcome)
}

fn parse_via_str(
    data: &str,
    path: &Path,
) -> Result<BTreeMap<String, ViaRecord>, YoloprepError> {
    serde_json::from_str(data).map_err(|source| YoloprepError::ViaJsonParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Fuzz-only entrypoint for the VIA JSON parser.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_via_str(data: &str) -> Result<(), YoloprepError> {
    let _ = parse_via_str(data, Path::new("<fuzz>"))?;
    Ok(())
}
