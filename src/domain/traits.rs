// ============================================================
// Layer 3 - Core Traits (Abstractions)
// ============================================================
// The application layer talks to these traits, not to the
// concrete HTTP loader or Burn inferencer, so tests can hand it
// an in-memory dataset.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use crate::domain::customer::CustomerRecord;
use crate::domain::error::ChurnResult;
use crate::domain::prediction::ChurnPrediction;

// ─── DatasetSource ────────────────────────────────────────────────────────────
/// Anything that can produce the raw CSV text of the churn dataset.
///
/// Implementations:
///   - HttpCsvSource  → downloads from a URL
///   - FileCsvSource  → reads a local file
///   - InlineCsvSource → holds the text in memory (tests)
pub trait DatasetSource: Send {
    /// Fetch the full CSV text, or fail with ChurnError::Fetch
    fn fetch(&self) -> ChurnResult<String>;

    /// Human-readable location for logs and errors
    fn describe(&self) -> String;
}

// ─── ChurnScorer ──────────────────────────────────────────────────────────────
/// Any component that can score a customer.
pub trait ChurnScorer {
    fn score(&self, customer: &CustomerRecord) -> ChurnResult<ChurnPrediction>;
}
