// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// Orchestrates the other layers to accomplish one command each.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing here (that's Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern

/// Fetch → encode → split → scale → train → save
pub mod retrain_use_case;

/// Runs a retraining use case on a worker thread with progress + cancel
pub mod retrain_job;

/// Scores a customer with the current artifacts
pub mod predict_use_case;

/// Writes the standalone inference script
pub mod export_use_case;

/// Placeholder and real training charts
pub mod report_use_case;
