#![allow(dead_code)]

use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Tolerance for a normalize/denormalize round trip on an image of the
/// given dimensions.
pub fn eps_for_image(width: u32, height: u32) -> f64 {
    width.max(height) as f64 * 1e-9
}

/// Class-name strategy: short alphanumeric identifiers.
pub fn arb_class_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,11}"
}

/// A pixel-space box strictly inside an image of the given dimensions,
/// as (xmin, ymin, xmax, ymax) with xmin < xmax and ymin < ymax.
pub fn arb_box(width: u32, height: u32) -> impl Strategy<Value = (u32, u32, u32, u32)> {
    (0..width - 1, 0..height - 1).prop_flat_map(move |(xmin, ymin)| {
        (xmin + 1..=width, ymin + 1..=height)
            .prop_map(move |(xmax, ymax)| (xmin, ymin, xmax, ymax))
    })
}
