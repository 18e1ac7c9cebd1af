//! Outbound participant messaging.
//!
//! The actor mutates first and notifies second: a [`Notifier`] call is a
//! side effect dispatched after the state change commits, never part of
//! the state machine itself.

use async_trait::async_trait;

use quorum_core::ParticipantId;

/// Delivery of one message to one participant, implemented by the
/// embedding transport (a chat client in the reference deployment).
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers `body` to `to`. Delivery failures are the transport's
    /// problem; the protocol state has already committed.
    async fn send(&self, to: &ParticipantId, body: &str);
}

/// Discards every message. Used when no transport is attached, e.g. when
/// the service is driven purely over the HTTP bridge or in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn send(&self, _to: &ParticipantId, _body: &str) {}
}

/// Fixed participant-facing message texts.
pub mod templates {
    pub const WELCOME: &str = "You will be notified when the audit begins";
    pub const WAITING_FOR_START: &str = "Hold your horses";
    pub const PROJECT_NOT_OPEN_YET: &str =
        "Requested project is not accepting new auditors yet, please try again later";
    pub const REGISTRATION_CLOSED: &str = "Registration for new auditors has closed";
    pub const AUDIT_STARTED: &str = "Audit has started";
    pub const AUDIT_STOPPED: &str = "Audit has finished";
    pub const WAITING_FOR_CALCULATIONS: &str =
        "Outcomes are being calculated. You will be notified once the results are ready.";
    pub const ASSIGNMENT: &str = "You have been assigned the following inspection:";
    pub const AUDITOR_COMPLETE: &str =
        "You have completed all your tasks. You will be notified when this phase is complete";
    pub const COMPENSATION: &str = "Your compensation is:";
    pub const PROJECT_NOT_FOUND: &str = "Could not find any project by that name.";
    pub const PROJECT_WELCOME: &str = "Which project would you like to join?";
    pub const PROJECT_REGISTERED: &str = "You have registered for project:";
    pub const ADDR_REQUEST: &str = "Enter your payout address:";
    pub const ADDR_INVALID: &str = "Invalid payout address.";
    pub const ADDR_ACCEPTED: &str = "Address accepted";
    pub const PROJECT_CLOSED: &str = "Requested project is not accepting new auditors";
    pub const AUDIT_NOT_COMPLETE: &str = "Not all inspections are done. Cannot finish audit";
    pub const FUNDS_TRANSFER: &str =
        "The funds will be transferred automatically to the address you supplied";
}
