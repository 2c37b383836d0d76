// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Plain Rust types describing what the system works with:
// customer records, the canonical feature schema, the
// hyperparameters a run is configured with, the prediction
// handed back to the user and the history of a training run.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or network calls
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Error taxonomy shared by every layer below the CLI
pub mod error;

// The canonical feature schema and one customer's raw values
pub mod customer;

// Epochs, batch size, activation and optimizer selection
pub mod hyperparams;

// Churn score + risk classification
pub mod prediction;

// Per-epoch accuracy/loss of one training run
pub mod history;

// Progress events and the cancellation flag of a training run
pub mod progress;

// Core abstractions (traits) that other layers implement
pub mod traits;
