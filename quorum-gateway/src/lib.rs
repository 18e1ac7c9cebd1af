//! HTTP API gateway for the Quorum coordinated-inspection audit service.
//!
//! Bridges audit creation and payout extraction to HTTP callers (the
//! ledger-side encoder in the reference deployment). Participant-facing
//! messaging stays on the service layer's [`quorum_service::MessageRouter`].

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod routes;
