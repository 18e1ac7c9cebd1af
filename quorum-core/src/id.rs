use std::fmt;

use serde::{Deserialize, Serialize};

/// Chat identity of a participant (audit admin or auditor).
///
/// Opaque to the core; the transport layer decides what a valid identity
/// looks like (bare JIDs in the reference deployment).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub struct ParticipantId(pub String);

impl ParticipantId {
    /// Creates a `ParticipantId` from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Ledger address an auditor's compensation is paid out to.
///
/// The core stores addresses verbatim; checksum validation happens at the
/// service boundary before an address is accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub struct PayoutAddress(pub String);

impl PayoutAddress {
    /// Creates a `PayoutAddress` from any string-like value.
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PayoutAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PayoutAddress {
    fn from(s: String) -> Self {
        Self(s)
    }
}
