// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// Everything between the remote CSV and tensor batches.
//
//   CSV URL / path
//       │
//       ▼
//   loader          → fetches the raw text
//       │
//       ▼
//   dataset         → parses typed rows (preprocessor cleans cells)
//       │
//       ▼
//   encoder         → label-encodes categorical columns
//       │
//       ▼
//   splitter        → seeded 80/20 train/validation split
//       │
//       ▼
//   scaler          → zero-mean/unit-variance, fitted on train only
//       │
//       ▼
//   batcher         → stacks samples into tensors
//
// Reference: Rust Book §13 (Iterators and Closures)

/// Fetches CSV text over HTTP or from disk
pub mod loader;

/// Cleans raw CSV cells
pub mod preprocessor;

/// Typed rows and encoded samples
pub mod dataset;

/// Persisted category → code table
pub mod encoder;

/// Fitted feature normalisation
pub mod scaler;

/// Seeded train/validation split
pub mod splitter;

/// Tensor batches for the model
pub mod batcher;
