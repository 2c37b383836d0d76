// ============================================================
// Layer 4 - Train/Validation Splitter
// ============================================================
// Shuffles samples with a seeded RNG and splits them into:
//   - Training set:   used to update model weights
//   - Validation set: used to measure performance on unseen data
//
// The validation set gets ceil(n * val_fraction) samples, so a
// 0.2 fraction of 101 rows holds out 21. With the same seed and
// the same input order the split is identical on every run.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom over a
// StdRng seeded from the caller's seed.
//
// Reference: rand crate documentation

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Seed used by the retraining pipeline
pub const SPLIT_SEED: u64 = 42;

/// Fraction of rows held out for validation
pub const VALIDATION_FRACTION: f64 = 0.2;

/// Shuffle `samples` deterministically and split into (train, validation).
pub fn split_train_val<T>(mut samples: Vec<T>, val_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total   = samples.len();
    let n_val   = ((total as f64) * val_fraction).ceil() as usize;
    let n_val   = n_val.min(total);
    let n_train = total - n_val;

    // split_off(n) removes elements [n..] from the Vec and returns them
    let val = samples.split_off(n_train);

    tracing::debug!(
        "Dataset split: {} training, {} validation (seed {})",
        samples.len(),
        val.len(),
        seed,
    );

    (samples, val)
}
