//! The module contains the errors the engine can throw.
//!
//! Every error maps to a stable [`ErrorKind`] so the boundary can surface a
//! category without inspecting messages:
//!
//! - [`InvalidArgument`] malformed or out-of-range input.
//! - [`Forbidden`] the caller is not allowed to act.
//! - [`KeyNotFound`] a referenced expense, user or group is absent.
//! - [`Conflict`] the state already moved on (lost a race, already a member).
//! - [`Storage`] / [`Database`] internal failures, the transaction is rolled back.
//! - [`UpstreamDegraded`] the slip verifier is unreachable; absorbed by approvals.
//!
//!  [`InvalidArgument`]: EngineError::InvalidArgument
//!  [`Forbidden`]: EngineError::Forbidden
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`Conflict`]: EngineError::Conflict
//!  [`Storage`]: EngineError::Storage
//!  [`Database`]: EngineError::Database
//!  [`UpstreamDegraded`]: EngineError::UpstreamDegraded
use sea_orm::DbErr;
use serde::Serialize;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Storage failure: {0}")]
    Storage(String),
    #[error("Upstream degraded: {0}")]
    UpstreamDegraded(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Stable failure category shown to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidArgument,
    Forbidden,
    NotFound,
    Conflict,
    Internal,
    UpstreamDegraded,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid_argument",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Internal => "internal",
            Self::UpstreamDegraded => "upstream_degraded",
        }
    }
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::KeyNotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Storage(_) | Self::Database(_) => ErrorKind::Internal,
            Self::UpstreamDegraded(_) => ErrorKind::UpstreamDegraded,
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidArgument(a), Self::InvalidArgument(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::Storage(a), Self::Storage(b)) => a == b,
            (Self::UpstreamDegraded(a), Self::UpstreamDegraded(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
