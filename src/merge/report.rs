//! Merge report types, terminal rendering, and CSV export.
//!
//! The terminal rendering stands in for the original pie/line charts: the
//! per-dataset image share becomes a percentage bar chart and the
//! cumulative per-class counts become a table. The same numbers are
//! exported as `datasets.csv` and `data.csv`.
//!
//! Shares are taken over every input dataset, excluded ones included, so
//! the column always sums to 100% of what the run was given; the
//! `admitted` flag tells the two apart.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::error::YoloprepError;

const BAR_WIDTH: usize = 20;

/// Per-dataset outcome of one merge run.
#[derive(Clone, Debug)]
pub struct DatasetSummary {
    pub name: String,
    pub total_images: usize,
    pub admitted: bool,
    /// First class name whose index clashed with the merged vocabulary.
    pub excluded_conflict: Option<String>,
    /// Snapshot of the running per-class counts after this dataset, i.e.
    /// including every admitted dataset before it.
    pub cumulative_counts: BTreeMap<usize, usize>,
}

impl DatasetSummary {
    pub fn admitted(
        name: String,
        total_images: usize,
        cumulative_counts: BTreeMap<usize, usize>,
    ) -> Self {
        Self {
            name,
            total_images,
            admitted: true,
            excluded_conflict: None,
            cumulative_counts,
        }
    }

    pub fn excluded(name: String, total_images: usize, conflict: String) -> Self {
        Self {
            name,
            total_images,
            admitted: false,
            excluded_conflict: Some(conflict),
            cumulative_counts: BTreeMap::new(),
        }
    }
}

/// The result of merging a list of dataset packages.
#[derive(Clone, Debug)]
pub struct MergeReport {
    pub datasets: Vec<DatasetSummary>,
    /// The merged vocabulary written to the output manifest.
    pub class_names: Vec<String>,
    /// Total images copied into the merged package.
    pub merged_images: usize,
}

impl MergeReport {
    pub fn admitted_count(&self) -> usize {
        self.datasets.iter().filter(|d| d.admitted).count()
    }

    /// Image total over every input dataset, excluded ones included.
    /// Shares computed against it describe the run's inputs, not just
    /// what made it into the merged package.
    fn total_images_all(&self) -> usize {
        self.datasets.iter().map(|d| d.total_images).sum()
    }

    /// Every class id that appeared in any label file, ascending.
    fn class_ids(&self) -> Vec<usize> {
        let mut ids: Vec<usize> = self
            .datasets
            .iter()
            .flat_map(|d| d.cumulative_counts.keys().copied())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    fn class_label(&self, id: usize) -> String {
        self.class_names
            .get(id)
            .cloned()
            .unwrap_or_else(|| format!("class_{id}"))
    }

    /// Write the per-dataset image totals and shares.
    ///
    /// One row per input dataset, excluded ones too, with `share_pct`
    /// over the all-inputs total so the column sums to 100%.
    pub fn write_datasets_csv(&self, path: &Path) -> Result<(), YoloprepError> {
        let mut writer =
            csv::Writer::from_path(path).map_err(|source| YoloprepError::CsvWrite {
                path: path.to_path_buf(),
                source,
            })?;

        writer
            .write_record(["name", "total_images", "share_pct", "admitted"])
            .map_err(|source| YoloprepError::CsvWrite {
                path: path.to_path_buf(),
                source,
            })?;

        let total = self.total_images_all();
        for dataset in &self.datasets {
            writer
                .write_record([
                    dataset.name.clone(),
                    dataset.total_images.to_string(),
                    format!("{:.2}", share_pct(dataset.total_images, total)),
                    dataset.admitted.to_string(),
                ])
                .map_err(|source| YoloprepError::CsvWrite {
                    path: path.to_path_buf(),
                    source,
                })?;
        }

        writer.flush().map_err(YoloprepError::Io)
    }

    /// Write cumulative per-class counts, one row per admitted dataset.
    pub fn write_data_csv(&self, path: &Path) -> Result<(), YoloprepError> {
        let mut writer =
            csv::Writer::from_path(path).map_err(|source| YoloprepError::CsvWrite {
                path: path.to_path_buf(),
                source,
            })?;

        let class_ids = self.class_ids();
        let mut header = vec!["dataset".to_string()];
        header.extend(class_ids.iter().map(|&id| self.class_label(id)));
        writer
            .write_record(&header)
            .map_err(|source| YoloprepError::CsvWrite {
                path: path.to_path_buf(),
                source,
            })?;

        for dataset in self.datasets.iter().filter(|d| d.admitted) {
            let mut row = vec![dataset.name.clone()];
            row.extend(class_ids.iter().map(|id| {
                dataset
                    .cumulative_counts
                    .get(id)
                    .copied()
                    .unwrap_or(0)
                    .to_string()
            }));
            writer
                .write_record(&row)
                .map_err(|source| YoloprepError::CsvWrite {
                    path: path.to_path_buf(),
                    source,
                })?;
        }

        writer.flush().map_err(YoloprepError::Io)
    }
}

fn share_pct(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

fn bar(part: usize, total: usize) -> String {
    let filled = if total == 0 {
        0
    } else {
        (part as f64 / total as f64 * BAR_WIDTH as f64).round() as usize
    };
    "#".repeat(filled.min(BAR_WIDTH))
}

impl fmt::Display for MergeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Merged {} of {} dataset(s), {} image(s)",
            self.admitted_count(),
            self.datasets.len(),
            self.merged_images
        )?;

        writeln!(f)?;
        writeln!(f, "Image distribution:")?;
        let total = self.total_images_all();
        let name_width = self
            .datasets
            .iter()
            .map(|d| d.name.len())
            .max()
            .unwrap_or(0);
        for dataset in &self.datasets {
            writeln!(
                f,
                "  {:<name_width$}  {:>6}  {:>5.1}%  {}",
                dataset.name,
                dataset.total_images,
                share_pct(dataset.total_images, total),
                bar(dataset.total_images, total),
            )?;
        }

        let class_ids = self.class_ids();
        if !class_ids.is_empty() {
            writeln!(f)?;
            writeln!(f, "Cumulative class counts:")?;
            for dataset in self.datasets.iter().filter(|d| d.admitted) {
                write!(f, "  {:<name_width$}", dataset.name)?;
                for id in &class_ids {
                    let count = dataset.cumulative_counts.get(id).copied().unwrap_or(0);
                    write!(f, "  {}={}", self.class_label(*id), count)?;
                }
                writeln!(f)?;
            }
        }

        let excluded: Vec<&DatasetSummary> =
            self.datasets.iter().filter(|d| !d.admitted).collect();
        if !excluded.is_empty() {
            writeln!(f)?;
            writeln!(f, "Excluded:")?;
            for dataset in excluded {
                writeln!(
                    f,
                    "  {}: class '{}' conflicts with the merged vocabulary",
                    dataset.name,
                    dataset.excluded_conflict.as_deref().unwrap_or("?"),
                )?;
            }
        }

        Ok(())
    }
}
