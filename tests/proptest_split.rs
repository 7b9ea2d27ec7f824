use std::collections::BTreeSet;

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use yoloprep::split::{split_samples, SplitRatios};

mod proptest_helpers;

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn split_is_a_partition(
        count in 0usize..500,
        train in 0.0f64..=1.0,
        val_frac in 0.0f64..=1.0,
        seed in any::<u64>(),
    ) {
        // Scale val into the headroom left by train so the pair is valid.
        let val = (1.0 - train) * val_frac;
        let ratios = SplitRatios::new(train, val).expect("valid ratios");

        let items: Vec<usize> = (0..count).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        let split = split_samples(items, &ratios, &mut rng);

        prop_assert_eq!(split.len(), count);

        let mut seen = BTreeSet::new();
        for (_, items) in split.by_name() {
            for item in items {
                prop_assert!(seen.insert(*item), "duplicate item {item}");
            }
        }
        prop_assert_eq!(seen.len(), count);
    }

    #[test]
    fn split_sizes_follow_floor_arithmetic(
        count in 0usize..500,
        seed in any::<u64>(),
    ) {
        let ratios = SplitRatios::default();
        let items: Vec<usize> = (0..count).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        let split = split_samples(items, &ratios, &mut rng);

        let train = (count as f64 * 0.8).floor() as usize;
        let val = (count as f64 * 0.1).floor() as usize;
        prop_assert_eq!(split.train.len(), train);
        prop_assert_eq!(split.val.len(), val);
        prop_assert_eq!(split.test.len(), count - train - val);
    }

    #[test]
    fn same_seed_gives_same_split(
        count in 0usize..200,
        seed in any::<u64>(),
    ) {
        let ratios = SplitRatios::default();
        let items: Vec<usize> = (0..count).collect();

        let mut rng_a = StdRng::seed_from_u64(seed);
        let mut rng_b = StdRng::seed_from_u64(seed);
        let first = split_samples(items.clone(), &ratios, &mut rng_a);
        let second = split_samples(items, &ratios, &mut rng_b);

        prop_assert_eq!(first.train, second.train);
        prop_assert_eq!(first.val, second.val);
        prop_assert_eq!(first.test, second.test);
    }
}
