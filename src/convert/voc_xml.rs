//! Pascal VOC XML to YOLO-box label conversion.
//!
//! Conversion is two-phase: [`collect_names`] gathers every `<object>`
//! name so the caller can fix one class vocabulary over the whole corpus
//! (which may span several directories and annotation styles), then
//! [`convert_dir`] rewrites each annotation as a same-stem `.txt` with one
//! `class_id cx cy w h` line per object, all four geometric values
//! normalized to [0,1] by the image dimensions.

use std::fs;
use std::path::Path;

use log::warn;
use roxmltree::Node;

use crate::convert::ConvertedDir;
use crate::error::YoloprepError;
use crate::scan::{list_files_with_extensions, LABEL_EXTENSION};
use crate::vocab::ClassVocabulary;

/// Collect every `<object>` name from the VOC `.xml` files in `dir`.
///
/// Names are collected even when the object's geometry is missing or
/// malformed, so a class seen only on broken objects still gets an id.
/// Unparseable files are skipped with a warning.
pub fn collect_names(dir: &Path) -> Result<Vec<String>, YoloprepError> {
    let xml_files = list_files_with_extensions(dir, &["xml"])?;

    let mut names = Vec::new();
    for xml_path in &xml_files {
        match parse_voc_file(xml_path) {
            Ok(parsed) => names.extend(parsed.objects.into_iter().map(|obj| obj.name)),
            Err(err) => warn!("skipping {}: {err}", xml_path.display()),
        }
    }
    Ok(names)
}

/// Convert every VOC `.xml` file in `dir` to a YOLO label file next to it,
/// resolving class ids against `vocabulary`.
///
/// Unparseable files and objects with missing or malformed geometry are
/// skipped with a warning; only IO failures on the listing itself are fatal.
pub fn convert_dir(
    dir: &Path,
    vocabulary: &ClassVocabulary,
) -> Result<ConvertedDir, YoloprepError> {
    let xml_files = list_files_with_extensions(dir, &["xml"])?;
    let mut outcome = ConvertedDir::default();

    for xml_path in &xml_files {
        let parsed = match parse_voc_file(xml_path) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!("skipping {}: {err}", xml_path.display());
                outcome.skipped += 1;
                continue;
            }
        };

        let mut lines = String::new();
        for object in &parsed.objects {
            let Some(bbox) = object.bbox else {
                warn!(
                    "{}: object '{}' has a missing or malformed <bndbox>, skipping",
                    xml_path.display(),
                    object.name
                );
                continue;
            };

            let Some(class_id) = vocabulary.id(&object.name) else {
                warn!(
                    "{}: object '{}' missing from vocabulary, skipping",
                    xml_path.display(),
                    object.name
                );
                continue;
            };

            let (cx, cy, w, h) = normalize_box(
                bbox.xmin,
                bbox.ymin,
                bbox.xmax,
                bbox.ymax,
                parsed.width,
                parsed.height,
            );
            lines.push_str(&format!("{} {} {} {} {}\n", class_id, cx, cy, w, h));
        }

        let label_path = xml_path.with_extension(LABEL_EXTENSION);
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

/// Normalize a pixel-space XYXY box to YOLO center/size coordinates.
pub fn normalize_box(
    xmin: f64,
    ymin: f64,
    xmax: f64,
    ymax: f64,
    width: u32,
    height: u32,
) -> (f64, f64, f64, f64) {
    let width = f64::from(width);
    let height = f64::from(height);
    (
        (xmin + xmax) / 2.0 / width,
        (ymin + ymax) / 2.0 / height,
        (xmax - xmin) / width,
        (ymax - ymin) / height,
    )
}

/// Recover a pixel-space XYXY box from YOLO center/size coordinates.
pub fn denormalize_box(
    cx: f64,
    cy: f64,
    w: f64,
    h: f64,
    width: u32,
    height: u32,
) -> (f64, f64, f64, f64) {
    let width = f64::from(width);
    let height = f64::from(height);
    (
        (cx - w / 2.0) * width,
        (cy - h / 2.0) * height,
        (cx + w / 2.0) * width,
        (cy + h / 2.0) * height,
    )
}

#[derive(Debug)]
struct ParsedVocAnnotation {
    width: u32,
    height: u32,
    objects: Vec<ParsedVocObject>,
}

#[derive(Debug)]
struct ParsedVocObject {
    name: String,
    // `None` when the <bndbox> is missing or malformed. The name still
    // counts toward the vocabulary; only the geometry is unusable.
    bbox: Option<VocBox>,
}

#[derive(Clone, Copy, Debug)]
struct VocBox {
    xmin: f64,
    ymin: f64,
    xmax: f64,
    ymax: f64,
}

fn parse_voc_file(path: &Path) -> Result<ParsedVocAnnotation, YoloprepError> {
    let xml = fs::read_to_string(path).map_err(YoloprepError::Io)?;
    parse_voc_str(&xml, path)
}

fn parse_voc_str(xml: &str, path: &Path) -> Result<ParsedVocAnnotation, YoloprepError> {
    let document =
        roxmltree::Document::parse(xml).map_err(|source| YoloprepError::VocXmlParse {
            path: path.to_path_buf(),
            message: source.to_string(),
        })?;

    let annotation = document.root_element();
    if annotation.tag_name().name() != "annotation" {
        return Err(YoloprepError::VocXmlParse {
            path: path.to_path_buf(),
            message: "missing <annotation> root element".to_string(),
        });
    }

    let size = required_child_element(annotation, "size", path, "<annotation>")?;
    let width = parse_required_u32(size, "width", path, "<size>")?;
    let height = parse_required_u32(size, "height", path, "<size>")?;

    let mut objects = Vec::new();
    for object in annotation
        .children()
        .filter(|node| node.is_element() && node.tag_name().name() == "object")
    {
        // A missing name drops the object, never the file. A missing or
        // malformed box keeps the object (its name still matters to the
        // vocabulary) and the geometry check happens at conversion time.
        let Some(name) = optional_child_text(object, "name") else {
            warn!("{}: <object> without <name>, skipping", path.display());
            continue;
        };

        let bbox = child_element(object, "bndbox").and_then(|bndbox| {
            let corners = ["xmin", "ymin", "xmax", "ymax"].map(|tag| {
                optional_child_text(bndbox, tag).and_then(|raw| raw.parse::<f64>().ok())
            });
            let [Some(xmin), Some(ymin), Some(xmax), Some(ymax)] = corners else {
                return None;
            };
            Some(VocBox {
                xmin,
                ymin,
                xmax,
                ymax,
            })
        });

        objects.push(ParsedVocObject { name, bbox });
    }

    Ok(ParsedVocAnnotation {
        width,
        height,
        objects,
    })
}

/// Parse VOC XML from a UTF-8 string.
///
/// Fuzz-only entrypoint exercising the parser in-memory.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_voc_str(xml: &str) -> Result<(), YoloprepError> {
    let _ = parse_voc_str(xml, Path::new("<fuzz>"))?;
    Ok(())
}

fn required_child_element<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<Node<'a, 'input>, YoloprepError> {
    child_element(node, tag).ok_or_else(|| YoloprepError::VocXmlParse {
        path: path.to_path_buf(),
        message: format!("missing <{tag}> in {context}"),
    })
}

fn parse_required_u32(
    node: Node<'_, '_>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<u32, YoloprepError> {
    let raw = optional_child_text(node, tag).ok_or_else(|| YoloprepError::VocXmlParse {
        path: path.to_path_buf(),
        message: format!("missing <{tag}> in {context}"),
    })?;
    raw.parse::<u32>().map_err(|_| YoloprepError::VocXmlParse {
        path: path.to_path_buf(),
        message: format!("invalid <{tag}> value '{raw}' in {context}; expected u32"),
    })
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && child.tag_name().name() == tag)
}

fn optional_child_text(node: Node<'_, '_>, tag: &str) -> Option<String> {
    child_element(node, tag)
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToOwned::to_owned)
}
