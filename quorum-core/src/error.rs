//! Error taxonomy for the core protocol.
//!
//! Every variant is synchronous, local, and recoverable by the caller
//! reissuing a corrected command. A failed precondition fails the whole
//! call before any mutation; phase changes are all-or-nothing.

use crate::audit::OutstandingInspection;
use crate::id::ParticipantId;
use crate::phase::Phase;

/// Errors produced by the `quorum-core` crate.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AuditError {
    /// Invalid configuration at open time (zero items, bad ratio, ...).
    #[error("configuration error: {reason}")]
    Configuration { reason: String },

    /// A command arrived outside its required phase.
    #[error("audit '{audit}' is in {actual}, command requires {expected}")]
    InvalidStateTransition {
        audit: String,
        expected: Phase,
        actual: Phase,
    },

    /// `stop` was issued while inspections are still outstanding.
    /// Recoverable: retry once the outstanding set drains.
    #[error("audit incomplete: {} inspection(s) outstanding", .outstanding.len())]
    AuditIncomplete {
        outstanding: Vec<OutstandingInspection>,
    },

    /// `start` was issued with zero registered auditors.
    #[error("cannot start an audit with no registered auditors")]
    InsufficientParticipants,

    /// An audit with this name already exists in the registry.
    #[error("audit '{0}' already exists")]
    DuplicateAudit(String),

    /// This identity is already registered as an auditor.
    #[error("auditor '{0}' is already registered")]
    DuplicateAuditor(ParticipantId),

    /// No audit with this name.
    #[error("no audit named '{0}'")]
    UnknownAudit(String),

    /// This identity is not a registered auditor of the audit.
    #[error("auditor '{0}' is not registered with this audit")]
    UnknownAuditor(ParticipantId),

    /// No item at the given index.
    #[error("no item at index {index}")]
    UnknownItem { index: usize },

    /// A finding reply could not be mapped to the yes/no vocabularies.
    #[error("answer '{0}' not recognised")]
    InvalidAnswer(String),
}
