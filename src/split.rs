//! Train/val/test splitting.
//!
//! The shuffle takes an explicit RNG so callers control reproducibility;
//! the CLI seeds a `StdRng` from `--seed`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::YoloprepError;

/// Train and validation ratios; the test share is whatever remains after
/// `train + val`, so floating drift is absorbed into the test set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplitRatios {
    pub train: f64,
    pub val: f64,
}

impl SplitRatios {
    pub fn new(train: f64, val: f64) -> Result<Self, YoloprepError> {
        if !(0.0..=1.0).contains(&train) || !(0.0..=1.0).contains(&val) {
            return Err(YoloprepError::InvalidRatios {
                message: format!("ratios must lie in [0, 1], got train={train} val={val}"),
            });
        }
        if train + val > 1.0 {
            return Err(YoloprepError::InvalidRatios {
                message: format!("train + val must not exceed 1.0, got {}", train + val),
            });
        }
        Ok(Self { train, val })
    }
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            train: 0.8,
            val: 0.1,
        }
    }
}

/// One collection partitioned into train/val/test.
#[derive(Clone, Debug, Default)]
pub struct Split<T> {
    pub train: Vec<T>,
    pub val: Vec<T>,
    pub test: Vec<T>,
}

impl<T> Split<T> {
    pub fn len(&self) -> usize {
        self.train.len() + self.val.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The three splits in their canonical (name, items) order.
    pub fn by_name(&self) -> [(&'static str, &[T]); 3] {
        [
            ("train", self.train.as_slice()),
            ("val", self.val.as_slice()),
            ("test", self.test.as_slice()),
        ]
    }
}

/// Shuffle `items` and slice them into train/val/test.
///
/// Slice sizes are `floor(n * train)`, `floor(n * val)`, remainder to test;
/// every input item lands in exactly one split.
pub fn split_samples<T>(mut items: Vec<T>, ratios: &SplitRatios, rng: &mut StdRng) -> Split<T> {
    items.shuffle(rng);

    let n_total = items.len();
    let n_train = (n_total as f64 * ratios.train).floor() as usize;
    let n_val = (n_total as f64 * ratios.val).floor() as usize;

    let mut rest = items.split_off(n_train);
    let test = rest.split_off(n_val.min(rest.len()));

    Split {
        train: items,
        val: rest,
        test,
    }
}

/// Apply [`split_samples`] independently to each class's image list.
pub fn split_by_class(
    classes: BTreeMap<String, Vec<PathBuf>>,
    ratios: &SplitRatios,
    rng: &mut StdRng,
) -> BTreeMap<String, Split<PathBuf>> {
    classes
        .into_iter()
        .map(|(class_name, images)| (class_name, split_samples(images, ratios, rng)))
        .collect()
}
