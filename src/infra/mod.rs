// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// Cross-cutting concerns used by the use cases:
//
//   artifact_store.rs - versioned model/scaler/encodings on disk,
//                       guarded by a lock file and a version check
//   metrics.rs        - per-epoch history appended to metrics.csv
//   charts.rs         - fixed-size text plots of training curves
//   exporter.rs       - standalone inference script generation
//   settings.rs       - defaults < Churn.toml < CHURN_* env vars
//
// Reference: Rust Book §7 (Modules)

pub mod artifact_store;
pub mod charts;
pub mod exporter;
pub mod metrics;
pub mod settings;
