//! Seeded shuffle split.

use polars::prelude::*;
use rand::prelude::*;
use rand::rngs::StdRng;

/// Number of test rows for `n` rows and a training share of `train_ratio`.
///
/// `ceil((1 - train_ratio) * n)`, clamped so both partitions are non-empty
/// when `n >= 2`. A single row goes to training.
pub fn test_size(n: usize, train_ratio: f64) -> usize {
    if n < 2 {
        return 0;
    }
    // 1 - 0.7 is 0.30000000000000004; absorb that before rounding up
    let raw = ((1.0 - train_ratio) * n as f64 - 1e-9).ceil() as usize;
    raw.clamp(1, n - 1)
}

/// Row indices of the training and test partitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<IdxSize>,
    pub test: Vec<IdxSize>,
}

impl SplitIndices {
    pub fn train_idx(&self) -> IdxCa {
        IdxCa::from_vec("train".into(), self.train.clone())
    }

    pub fn test_idx(&self) -> IdxCa {
        IdxCa::from_vec("test".into(), self.test.clone())
    }
}

/// Shuffle `0..n` with `seed` and take the leading rows as the test set.
///
/// The same seed always produces the same partitions.
pub fn shuffled_split(n: usize, train_ratio: f64, seed: u64) -> SplitIndices {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut order: Vec<IdxSize> = (0..n as IdxSize).collect();
    order.shuffle(&mut rng);

    let train = order.split_off(test_size(n, train_ratio));
    SplitIndices { train, test: order }
}
