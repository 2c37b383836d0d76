// ============================================================
// Layer 5 - ML / Model Layer (Burn)
// ============================================================
// All Burn model and training code lives here.
//
//   model.rs      - The feed-forward churn classifier
//                   Dense layers with a configurable hidden
//                   activation and a single logit output
//
//   trainer.rs    - The training loop
//                   Forward pass, BCE loss, backward pass,
//                   optimizer step, per-epoch validation
//
//   inferencer.rs - The inference engine
//                   Encodes, scales and scores one customer
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)

/// Churn classifier architecture
pub mod model;

/// Training loop with validation and progress reporting
pub mod trainer;

/// Scores customers with a loaded model
pub mod inferencer;
