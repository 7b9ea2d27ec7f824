//! Merging previously organized dataset packages.
//!
//! The first dataset's vocabulary seeds the merged vocabulary. Every
//! subsequent dataset must be index-compatible with the vocabulary merged
//! so far (shared names at identical indices; extra trailing classes
//! allowed, which then extend the merged vocabulary) or the whole dataset
//! is excluded from the merge and reported. Admitted datasets are copied
//! split by split with the source dataset's base name prefixed onto every
//! file name, while label class ids feed a cumulative per-class count used
//! for reporting.

mod report;

pub use report::{DatasetSummary, MergeReport};

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::error::YoloprepError;
use crate::manifest::{self, DatasetManifest};
use crate::scan::list_files;
use crate::vocab::ClassVocabulary;

const SPLIT_NAMES: [&str; 3] = ["train", "val", "test"];

/// Merge organized dataset directories into one package under `out_root`.
///
/// Every input must carry a readable `data.yaml`; a missing or unparseable
/// manifest aborts the run. Vocabulary-incompatible inputs are excluded
/// and reported, not fatal.
pub fn merge_datasets(
    inputs: &[PathBuf],
    out_root: &Path,
) -> Result<MergeReport, YoloprepError> {
    if inputs.is_empty() {
        return Err(YoloprepError::MergeFailed {
            message: "no input datasets given".to_string(),
        });
    }

    let manifests: Vec<DatasetManifest> = inputs
        .iter()
        .map(|input| manifest::read_manifest(input))
        .collect::<Result<_, _>>()?;

    let mut merged_vocabulary = ClassVocabulary::from_ordered(manifests[0].names.clone());

    for split_name in SPLIT_NAMES {
        for subdir in ["images", "labels"] {
            fs::create_dir_all(out_root.join(split_name).join(subdir))
                .map_err(YoloprepError::Io)?;
        }
    }

    let mut summaries = Vec::with_capacity(inputs.len());
    let mut cumulative: BTreeMap<usize, usize> = BTreeMap::new();
    let mut merged_images = 0usize;

    for (input, dataset_manifest) in inputs.iter().zip(&manifests) {
        let dataset_name = dataset_basename(input);
        let total_images = count_images(input)?;

        // Each candidate is checked against the vocabulary merged so far,
        // not just the first dataset, so two mutually incompatible
        // extensions cannot both get in.
        let candidate = ClassVocabulary::from_ordered(dataset_manifest.names.clone());
        if let Some(conflict) = ClassVocabulary::index_conflict(&merged_vocabulary, &candidate) {
            warn!(
                "excluding {dataset_name}: class '{conflict}' disagrees with the merged vocabulary"
            );
            summaries.push(DatasetSummary::excluded(
                dataset_name,
                total_images,
                conflict.to_string(),
            ));
            continue;
        }

        // Index-compatible and longer means a pure extension of the
        // current merged vocabulary.
        if candidate.len() > merged_vocabulary.len() {
            merged_vocabulary = candidate;
        }

        copy_dataset(input, &dataset_name, out_root, &mut cumulative)?;
        merged_images += total_images;

        info!("merged {dataset_name}: {total_images} image(s)");
        summaries.push(DatasetSummary::admitted(
            dataset_name,
            total_images,
            cumulative.clone(),
        ));
    }

    let merged_names = merged_vocabulary.names().to_vec();
    manifest::write_manifest(out_root, &DatasetManifest::for_layout(merged_names.clone()))?;

    let report = MergeReport {
        datasets: summaries,
        class_names: merged_names,
        merged_images,
    };

    report.write_datasets_csv(&out_root.join("datasets.csv"))?;
    report.write_data_csv(&out_root.join("data.csv"))?;

    Ok(report)
}

fn dataset_basename(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

fn count_images(dataset_root: &Path) -> Result<usize, YoloprepError> {
    let mut total = 0;
    for split_name in SPLIT_NAMES {
        total += list_files(&dataset_root.join(split_name).join("images"))?.len();
    }
    Ok(total)
}

fn copy_dataset(
    dataset_root: &Path,
    dataset_name: &str,
    out_root: &Path,
    cumulative: &mut BTreeMap<usize, usize>,
) -> Result<(), YoloprepError> {
    for split_name in SPLIT_NAMES {
        for subdir in ["images", "labels"] {
            let src_dir = dataset_root.join(split_name).join(subdir);
            let dst_dir = out_root.join(split_name).join(subdir);

            for src in list_files(&src_dir)? {
                let file_name = src
                    .file_name()
                    .map(|name| name.to_string_lossy().to_string())
                    .unwrap_or_default();
                let dst = dst_dir.join(format!("{dataset_name}_{file_name}"));

                fs::copy(&src, &dst).map_err(|source| YoloprepError::CopyFailed {
                    from: src.clone(),
                    to: dst.clone(),
                    source,
                })?;

                if subdir == "labels" {
                    tally_label_file(&src, cumulative)?;
                }
            }
        }
    }

    Ok(())
}

/// Count the leading class id of every label line into `cumulative`.
///
/// Unparseable lines are skipped with a warning; they have already been
/// copied verbatim, counting is best-effort reporting.
fn tally_label_file(
    label_path: &Path,
    cumulative: &mut BTreeMap<usize, usize>,
) -> Result<(), YoloprepError> {
    let content = fs::read_to_string(label_path).map_err(YoloprepError::Io)?;

    for (line_idx, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let Some(token) = trimmed.split_whitespace().next() else {
            continue;
        };
        match token.parse::<usize>() {
            Ok(class_id) => *cumulative.entry(class_id).or_insert(0) += 1,
            Err(_) => warn!(
                "{} line {}: invalid class id '{token}', not counted",
                label_path.display(),
                line_idx + 1
            ),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::read_manifest;

    fn write_package(root: &Path, names: &[&str], stems: &[&str], class_id: usize) {
        for split_name in SPLIT_NAMES {
            fs::create_dir_all(root.join(split_name).join("images")).expect("create images");
            fs::create_dir_all(root.join(split_name).join("labels")).expect("create labels");
        }
        for stem in stems {
            fs::write(root.join("train/images").join(format!("{stem}.png")), b"img")
                .expect("write image");
            fs::write(
                root.join("train/labels").join(format!("{stem}.txt")),
                format!("{class_id} 0.5 0.5 0.2 0.2\n"),
            )
            .expect("write label");
        }
        let names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        manifest::write_manifest(root, &DatasetManifest::for_layout(names))
            .expect("write manifest");
    }

    #[test]
    fn compatible_datasets_are_merged_with_prefixed_names() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let a = temp.path().join("alpha");
        let b = temp.path().join("beta");
        let out = temp.path().join("merged");
        write_package(&a, &["x", "y"], &["one", "two"], 0);
        write_package(&b, &["x", "y", "z"], &["three"], 2);

        let report = merge_datasets(&[a, b], &out).expect("merge");

        assert!(out.join("train/images/alpha_one.png").is_file());
        assert!(out.join("train/labels/beta_three.txt").is_file());
        assert_eq!(report.merged_images, 3);
        // The longer admitted vocabulary wins.
        assert_eq!(report.class_names, vec!["x", "y", "z"]);
        assert_eq!(read_manifest(&out).expect("manifest").names, ["x", "y", "z"]);

        // Counts are cumulative across dataset iteration order.
        assert_eq!(report.datasets[0].cumulative_counts.get(&0), Some(&2));
        assert_eq!(report.datasets[1].cumulative_counts.get(&0), Some(&2));
        assert_eq!(report.datasets[1].cumulative_counts.get(&2), Some(&1));

        assert!(out.join("datasets.csv").is_file());
        assert!(out.join("data.csv").is_file());
    }

    #[test]
    fn reordered_vocabulary_is_excluded_not_fatal() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let a = temp.path().join("alpha");
        let b = temp.path().join("beta");
        let out = temp.path().join("merged");
        write_package(&a, &["a", "b"], &["one"], 0);
        write_package(&b, &["b", "a"], &["two"], 0);

        let report = merge_datasets(&[a, b], &out).expect("merge");

        assert_eq!(report.merged_images, 1);
        assert!(!report.datasets[1].admitted);
        assert_eq!(
            report.datasets[1].excluded_conflict.as_deref(),
            Some("b")
        );
        assert!(!out.join("train/images/beta_two.png").exists());
    }

    #[test]
    fn later_vocabulary_divergence_is_excluded() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let a = temp.path().join("alpha");
        let b = temp.path().join("beta");
        let c = temp.path().join("charlie");
        let out = temp.path().join("merged");
        write_package(&a, &["a"], &["one"], 0);
        write_package(&b, &["a", "b"], &["two"], 1);
        // Compatible with alpha alone, but its id 1 means "c" while the
        // merged vocabulary already says id 1 is "b".
        write_package(&c, &["a", "c"], &["three"], 1);

        let report = merge_datasets(&[a, b, c], &out).expect("merge");

        assert_eq!(report.merged_images, 2);
        assert_eq!(report.class_names, vec!["a", "b"]);
        assert!(!report.datasets[2].admitted);
        assert_eq!(
            report.datasets[2].excluded_conflict.as_deref(),
            Some("c")
        );
        assert!(!out.join("train/images/charlie_three.png").exists());
        assert_eq!(read_manifest(&out).expect("manifest").names, ["a", "b"]);
    }

    #[test]
    fn unreadable_manifest_aborts_the_run() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let a = temp.path().join("alpha");
        fs::create_dir_all(&a).expect("create input");

        let err = merge_datasets(&[a], &temp.path().join("merged")).unwrap_err();
        assert!(matches!(err, YoloprepError::ManifestMissing { .. }));
    }
}
