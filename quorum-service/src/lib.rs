//! Actor layer for the Quorum coordinated-inspection audit protocol.
//!
//! Wraps each [`quorum_core::Audit`] in a dedicated tokio task with a
//! single inbound command queue, provides the named registry with
//! identity routing, and renders the transport-agnostic admin and auditor
//! message surfaces. Transports (chat, HTTP) sit on top of
//! [`MessageRouter`] and [`Registry`]; they never touch an audit directly.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod actor;
pub mod address;
pub mod command;
pub mod error;
pub mod notify;
pub mod onboarding;
pub mod registry;

pub use actor::{spawn_audit, AuditHandle, AuditorStatus, RegistrationReceipt, SubmitOutcome};
pub use address::{AddressValidator, HexAddressValidator};
pub use command::{help_text, AdminCommand, CommandParseError};
pub use error::ServiceError;
pub use notify::{NullNotifier, Notifier};
pub use onboarding::MessageRouter;
pub use registry::Registry;
