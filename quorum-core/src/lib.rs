//! Core domain model for Quorum, a coordinated-inspection audit protocol.
//!
//! Independent auditors inspect a shared item set, submit boolean findings,
//! and are compensated by how well their findings align with the
//! majority-vote consensus, with a slashing penalty for misalignment.
//!
//! This crate is synchronous and I/O-free: the audit lifecycle state
//! machine, the assignment / consensus / compensation engines, and the
//! error taxonomy. Serialization of commands, transport, and payout
//! encoding live in the service and gateway crates.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod audit;
pub mod auditor;
pub mod config;
pub mod error;
pub mod finding;
pub mod id;
pub mod inspection;
pub mod phase;

pub use audit::{compensation_units, Audit, OutstandingInspection};
pub use auditor::Auditor;
pub use config::{AuditConfig, SettableField};
pub use error::AuditError;
pub use id::{ParticipantId, PayoutAddress};
pub use inspection::Inspection;
pub use phase::{OnboardingState, Phase};
