use accord_store::StoreError;
use thiserror::Error;

use crate::evidence::EvidenceError;

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("proposal {0} not found")]
    ProposalNotFound(String),

    #[error("store error: {0}")]
    Store(StoreError),

    #[error("evidence write failed: {0}")]
    Evidence(#[from] EvidenceError),
}

/// Coarse failure class a caller maps to its own transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input. Nothing was written.
    Validation,
    /// The proposal does not exist. Nothing was written.
    NotFound,
    /// Storage, transaction or evidence failure. Nothing was committed and
    /// the request can be retried.
    ConflictOrInfra,
}

impl GovernanceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::ProposalNotFound(_) => ErrorKind::NotFound,
            Self::Store(_) | Self::Evidence(_) => ErrorKind::ConflictOrInfra,
        }
    }

    /// HTTP status an API layer should answer with.
    pub fn http_status(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::ConflictOrInfra => 500,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::ConflictOrInfra
    }
}

impl From<StoreError> for GovernanceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => Self::ProposalNotFound(what),
            StoreError::Validation(msg) => Self::Validation(msg),
            other => Self::Store(other),
        }
    }
}
