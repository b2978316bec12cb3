//! The module contains the errors the engine can throw.

use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" not found")]
    KeyNotFound(String),
    #[error("\"{0}\" already exists")]
    AlreadyExists(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid account kind: {0}")]
    InvalidKind(String),
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),
    #[error(transparent)]
    Database(#[from] DbErr),
    /// A unit of work failed and the subsequent rollback failed too; both
    /// errors are kept.
    #[error("transaction failed: {source}; rollback failed: {rollback}")]
    RollbackFailed {
        source: Box<EngineError>,
        rollback: DbErr,
    },
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::AlreadyExists(a), Self::AlreadyExists(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidKind(a), Self::InvalidKind(b)) => a == b,
            (Self::UnsupportedCurrency(a), Self::UnsupportedCurrency(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            (
                Self::RollbackFailed {
                    source: a,
                    rollback: ra,
                },
                Self::RollbackFailed {
                    source: b,
                    rollback: rb,
                },
            ) => a == b && ra.to_string() == rb.to_string(),
            _ => false,
        }
    }
}
