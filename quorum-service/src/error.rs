//! Error types for the service crate.

use quorum_core::AuditError;

use crate::command::CommandParseError;

/// Errors that can occur while driving an audit through the service layer.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ServiceError {
    /// An error propagated from the core protocol.
    #[error(transparent)]
    Audit(#[from] AuditError),

    /// An admin command could not be parsed.
    #[error(transparent)]
    Command(#[from] CommandParseError),

    /// The audit's actor task has stopped (registry cleared or task panic).
    #[error("audit task for '{0}' has stopped")]
    AuditUnavailable(String),

    /// The audit state could not be serialized for a dump.
    #[error("failed to serialize audit state: {0}")]
    Serialize(#[from] serde_json::Error),
}
