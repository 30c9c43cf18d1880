//! Parsing errors for the fundamental types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid actor '{0}': must be \"synthient\" or \"human\"")]
    InvalidActor(String),

    #[error("invalid decision '{0}': must be \"approve\" or \"veto\"")]
    InvalidDecision(String),

    #[error("invalid status '{0}': must be \"pending\", \"approved\" or \"rejected\"")]
    InvalidStatus(String),

    #[error("invalid identifier '{0}': expected 64 hex characters")]
    InvalidId(String),
}
