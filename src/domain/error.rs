// ============================================================
// Layer 3 - Error Taxonomy
// ============================================================
// Every failure the pipeline can surface to the user. None of
// these are recovered locally: a failing command aborts and
// prints the error chain.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChurnError {
    /// Dataset could not be downloaded or read
    #[error("Failed to fetch dataset from '{source_ref}': {message}")]
    Fetch { source_ref: String, message: String },

    /// Feature vector width does not match what the scaler/model was fitted on
    #[error("Feature vector has {actual} columns but the fitted scaler expects {expected}")]
    DataShape { expected: usize, actual: usize },

    /// Bad user input, unseen category or malformed dataset content
    #[error("Invalid value for '{field}': {message}")]
    Validation { field: String, message: String },

    /// Artifact read/write failure, missing artifacts, lock or version conflict
    #[error("Artifact store {operation} failed: {message}")]
    Persistence { operation: String, message: String },

    /// Tensor backend failure while training or scoring
    #[error("Training failed: {0}")]
    Training(String),

    #[error("Training run was cancelled")]
    Cancelled,
}

impl ChurnError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation { field: field.into(), message: message.into() }
    }

    pub fn persistence(operation: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Persistence { operation: operation.into(), message: message.to_string() }
    }

    pub fn fetch(source_ref: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Fetch { source_ref: source_ref.into(), message: message.to_string() }
    }
}

pub type ChurnResult<T> = Result<T, ChurnError>;
