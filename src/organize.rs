//! Materializing a split into the on-disk dataset layout.
//!
//! Detection datasets get `<out>/<split>/images` + `<out>/<split>/labels`
//! and a `data.yaml` manifest; classification datasets get
//! `<out>/<split>/<class>` folders. Sources are copied, never moved, and a
//! failed copy is fatal — unlike the converter's per-record skip policy,
//! a sample that reached the organizer is expected to exist.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::convert::LabeledSample;
use crate::error::YoloprepError;
use crate::manifest::{self, DatasetManifest};
use crate::split::Split;

/// Copy a detection split into the YOLO layout and write its manifest.
pub fn organize_detection(
    split: &Split<LabeledSample>,
    out_root: &Path,
    names: Vec<String>,
) -> Result<(), YoloprepError> {
    for (split_name, samples) in split.by_name() {
        let images_dir = out_root.join(split_name).join("images");
        let labels_dir = out_root.join(split_name).join("labels");
        fs::create_dir_all(&images_dir).map_err(YoloprepError::Io)?;
        fs::create_dir_all(&labels_dir).map_err(YoloprepError::Io)?;

        for sample in samples {
            copy_into(&sample.image, &images_dir)?;
            if let Some(annotation) = &sample.annotation {
                copy_into(annotation, &labels_dir)?;
            }
        }

        info!("{split_name}: {} sample(s)", samples.len());
    }

    manifest::write_manifest(out_root, &DatasetManifest::for_layout(names))
}

/// Copy a classification split into `<out>/<split>/<class>` folders.
pub fn organize_classification(
    by_class: &BTreeMap<String, Split<PathBuf>>,
    out_root: &Path,
) -> Result<(), YoloprepError> {
    for (class_name, split) in by_class {
        for (split_name, images) in split.by_name() {
            let class_dir = out_root.join(split_name).join(class_name);
            fs::create_dir_all(&class_dir).map_err(YoloprepError::Io)?;

            for image in images {
                copy_into(image, &class_dir)?;
            }
        }

        info!("{class_name}: {} image(s)", split.len());
    }

    Ok(())
}

/// Copy `src` into `dst_dir`, keeping its file name.
pub fn copy_into(src: &Path, dst_dir: &Path) -> Result<PathBuf, YoloprepError> {
    let file_name = src
        .file_name()
        .ok_or_else(|| YoloprepError::LayoutInvalid {
            path: src.to_path_buf(),
            message: "source path has no file name".to_string(),
        })?;

    let dst = dst_dir.join(file_name);
    fs::copy(src, &dst).map_err(|source| YoloprepError::CopyFailed {
        from: src.to_path_buf(),
        to: dst.clone(),
        source,
    })?;

    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(dir: &Path, stem: &str) -> LabeledSample {
        let image = dir.join(format!("{stem}.png"));
        let label = dir.join(format!("{stem}.txt"));
        fs::write(&image, b"img").expect("write image");
        fs::write(&label, "0 0.5 0.5 0.1 0.1\n").expect("write label");
        LabeledSample {
            image,
            annotation: Some(label),
        }
    }

    #[test]
    fn detection_layout_has_images_labels_and_manifest() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let src = temp.path().join("src");
        let out = temp.path().join("out");
        fs::create_dir_all(&src).expect("create src");

        let split = Split {
            train: vec![sample(&src, "a"), sample(&src, "b")],
            val: vec![sample(&src, "c")],
            test: vec![],
        };

        organize_detection(&split, &out, vec!["cat".to_string()]).expect("organize");

        assert!(out.join("train/images/a.png").is_file());
        assert!(out.join("train/labels/b.txt").is_file());
        assert!(out.join("val/images/c.png").is_file());
        assert!(out.join("test/images").is_dir());
        assert!(out.join("data.yaml").is_file());
        // Sources are copied, not moved.
        assert!(src.join("a.png").is_file());
    }

    #[test]
    fn missing_source_is_fatal() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let out = temp.path().join("out");

        let split = Split {
            train: vec![LabeledSample {
                image: temp.path().join("ghost.png"),
                annotation: None,
            }],
            val: vec![],
            test: vec![],
        };

        let err = organize_detection(&split, &out, vec![]).unwrap_err();
        assert!(matches!(err, YoloprepError::CopyFailed { .. }));
    }

    #[test]
    fn classification_layout_uses_class_folders() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let src = temp.path().join("src");
        let out = temp.path().join("out");
        fs::create_dir_all(&src).expect("create src");

        let img = src.join("one.png");
        fs::write(&img, b"img").expect("write image");

        let mut by_class = BTreeMap::new();
        by_class.insert(
            "45".to_string(),
            Split {
                train: vec![img],
                val: vec![],
                test: vec![],
            },
        );

        organize_classification(&by_class, &out).expect("organize");
        assert!(out.join("train/45/one.png").is_file());
    }
}
