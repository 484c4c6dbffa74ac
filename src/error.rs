//! Error types for the tree service.

use crate::types::SnapshotId;
use thiserror::Error;

/// Errors surfaced by the tree service and its cache.
#[derive(Debug, Error)]
pub enum TreeError {
    /// No tree has been built for the given fingerprint.
    #[error("no tree cached for fingerprint '{0}'")]
    FingerprintNotFound(String),

    /// No node with the given id is reachable in the tree.
    #[error("node with id {0} not found")]
    NodeNotFound(SnapshotId),

    /// No node is keyed by the given leaf label.
    #[error("leaf label '{0}' not found")]
    LabelNotFound(String),

    /// The visualization request failed validation.
    #[error("invalid visualization request: {0}")]
    InvalidRequest(String),

    /// The metric retrieval collaborator failed or returned malformed data.
    #[error("tree build failed: {0}")]
    BuildFailure(anyhow::Error),

    /// Configuration or logging setup failed.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl TreeError {
    /// Whether the error is one of the not-found kinds. Callers probing for
    /// optional nodes use this to distinguish expected absence from failure.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TreeError::FingerprintNotFound(_)
                | TreeError::NodeNotFound(_)
                | TreeError::LabelNotFound(_)
        )
    }
}
