//! Reading and writing the `data.yaml` dataset manifest.
//!
//! The manifest names the per-split image roots and the ordered class
//! vocabulary. Writing builds the YAML by hand to keep the flow-list
//! `names` shape trainers expect; reading goes through serde_yaml and
//! tolerates both the sequence and the `index: name` mapping form.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::YoloprepError;

pub const MANIFEST_FILE: &str = "data.yaml";

/// A dataset manifest: one image root per split plus the class vocabulary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetManifest {
    pub train: String,
    pub val: String,
    pub test: String,
    pub names: Vec<String>,
}

impl DatasetManifest {
    /// Manifest for the canonical detection layout rooted at the manifest's
    /// own directory.
    pub fn for_layout(names: Vec<String>) -> Self {
        Self {
            train: "train/images".to_string(),
            val: "val/images".to_string(),
            test: "test/images".to_string(),
            names,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawManifest {
    #[serde(default)]
    train: Option<String>,
    #[serde(default)]
    val: Option<String>,
    #[serde(default)]
    test: Option<String>,
    names: RawNames,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawNames {
    Sequence(Vec<String>),
    Mapping(BTreeMap<usize, String>),
}

/// Read `data.yaml` from a dataset root.
///
/// A missing manifest is [`YoloprepError::ManifestMissing`]; an unparseable
/// one is [`YoloprepError::ManifestParse`]. Both are fatal for the dataset.
pub fn read_manifest(dataset_root: &Path) -> Result<DatasetManifest, YoloprepError> {
    let path = dataset_root.join(MANIFEST_FILE);
    if !path.is_file() {
        return Err(YoloprepError::ManifestMissing { path });
    }

    let data = fs::read_to_string(&path).map_err(YoloprepError::Io)?;
    let raw: RawManifest =
        serde_yaml::from_str(&data).map_err(|source| YoloprepError::ManifestParse {
            path: path.clone(),
            source,
        })?;

    let names = match raw.names {
        RawNames::Sequence(names) => names,
        RawNames::Mapping(mapping) => {
            if mapping.is_empty() {
                Vec::new()
            } else {
                let max_index = mapping.keys().max().copied().unwrap_or(0);
                let mut names = vec![String::new(); max_index + 1];
                for (index, name) in mapping {
                    names[index] = name;
                }
                for (index, name) in names.iter_mut().enumerate() {
                    if name.trim().is_empty() {
                        *name = format!("class_{}", index);
                    }
                }
                names
            }
        }
    };

    Ok(DatasetManifest {
        train: raw.train.unwrap_or_else(|| "train/images".to_string()),
        val: raw.val.unwrap_or_else(|| "val/images".to_string()),
        test: raw.test.unwrap_or_else(|| "test/images".to_string()),
        names,
    })
}

/// Write a manifest as `data.yaml` under `dataset_root`.
pub fn write_manifest(
    dataset_root: &Path,
    manifest: &DatasetManifest,
) -> Result<(), YoloprepError> {
    let quoted: Vec<String> = manifest
        .names
        .iter()
        .map(|name| yaml_single_quoted(name))
        .collect();

    let yaml = format!(
        "train: {}\nval: {}\ntest: {}\n\nnc: {}\nnames: [{}]\n",
        manifest.train,
        manifest.val,
        manifest.test,
        manifest.names.len(),
        quoted.join(", ")
    );

    fs::write(dataset_root.join(MANIFEST_FILE), yaml).map_err(YoloprepError::Io)
}

fn yaml_single_quoted(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trips() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let manifest =
            DatasetManifest::for_layout(vec!["cat".to_string(), "dog's".to_string()]);

        write_manifest(temp.path(), &manifest).expect("write manifest");
        let yaml = fs::read_to_string(temp.path().join(MANIFEST_FILE)).expect("read yaml");
        assert!(yaml.contains("nc: 2"));
        assert!(yaml.contains("names: ['cat', 'dog''s']"));

        let read = read_manifest(temp.path()).expect("read manifest");
        assert_eq!(read, manifest);
    }

    #[test]
    fn reader_accepts_mapping_form() {
        let temp = tempfile::tempdir().expect("create temp dir");
        fs::write(
            temp.path().join(MANIFEST_FILE),
            "train: train/images\nnames:\n  0: person\n  1: bicycle\n",
        )
        .expect("write yaml");

        let manifest = read_manifest(temp.path()).expect("read manifest");
        assert_eq!(manifest.names, vec!["person", "bicycle"]);
        assert_eq!(manifest.val, "val/images");
    }

    #[test]
    fn missing_manifest_is_fatal() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let err = read_manifest(temp.path()).unwrap_err();
        assert!(matches!(err, YoloprepError::ManifestMissing { .. }));
    }

    #[test]
    fn unparseable_manifest_is_fatal() {
        let temp = tempfile::tempdir().expect("create temp dir");
        fs::write(temp.path().join(MANIFEST_FILE), "names: {not valid").expect("write yaml");

        let err = read_manifest(temp.path()).unwrap_err();
        assert!(matches!(err, YoloprepError::ManifestParse { .. }));
    }
}
