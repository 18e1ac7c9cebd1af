//! Transport-facing message routing and the auditor onboarding flow.
//!
//! One inbound chat message becomes at most one actor command; replies are
//! returned to the transport as plain strings. The router holds no session
//! state of its own — an identity is either an admin, a registered auditor
//! (whose onboarding sub-state lives on their `Auditor` record), or a
//! newcomer being asked which project to join.

use std::sync::Arc;

use quorum_core::{AuditError, OnboardingState, ParticipantId, PayoutAddress, Phase};

use crate::actor::{AuditHandle, SubmitOutcome};
use crate::address::AddressValidator;
use crate::command::{help_text, AdminCommand};
use crate::error::ServiceError;
use crate::notify::templates;
use crate::registry::Registry;

/// Auditor-facing reply routing by lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PhaseGroup {
    /// Registration not yet finished; nothing to do but wait.
    PreStart,
    /// Findings are being collected.
    Active,
    /// Results pipeline pending or running.
    PostWait,
    /// Compensation is final.
    Final,
}

fn phase_group(phase: Phase) -> PhaseGroup {
    match phase {
        Phase::Initialization | Phase::RegistrationOpen | Phase::RegistrationClosed => {
            PhaseGroup::PreStart
        }
        Phase::Auditing => PhaseGroup::Active,
        Phase::AuditingFinished
        | Phase::ItemResultsCalculated
        | Phase::AuditResultsCalculated
        | Phase::AuditorResultsCalculated => PhaseGroup::PostWait,
        Phase::AwaitingPayout | Phase::Complete => PhaseGroup::Final,
        // Phase is non_exhaustive; a future phase defaults to the waiting reply.
        _ => PhaseGroup::PostWait,
    }
}

/// Routes inbound participant messages to the right audit actor and
/// renders the replies.
pub struct MessageRouter {
    registry: Arc<Registry>,
    validator: Arc<dyn AddressValidator>,
}

impl MessageRouter {
    #[must_use]
    pub fn new(registry: Arc<Registry>, validator: Arc<dyn AddressValidator>) -> Self {
        Self { registry, validator }
    }

    /// Handles one inbound message and returns the replies to send back.
    ///
    /// Admin identities get the verb surface; registered auditors get the
    /// onboarding or finding surface depending on their sub-state;
    /// everyone else is in project choice.
    pub async fn dispatch(&self, from: &ParticipantId, body: &str) -> Vec<String> {
        // Admins are routed first: an identity that administers an audit
        // never reaches the auditor surfaces.
        if let Some(handle) = self.registry.find_admin(from) {
            return self.dispatch_admin(&handle, body).await;
        }
        if let Some(handle) = self.registry.find_auditor(from) {
            return self.dispatch_auditor(&handle, from, body).await;
        }
        self.dispatch_project_choice(from, body).await
    }

    async fn dispatch_admin(&self, handle: &AuditHandle, body: &str) -> Vec<String> {
        let command = match AdminCommand::parse(body) {
            Ok(command) => command,
            Err(error) => return vec![error.to_string(), help_text()],
        };
        match handle.admin(command).await {
            Ok(reply) => vec![reply],
            Err(ServiceError::Audit(AuditError::AuditIncomplete { outstanding })) => {
                let mut replies = vec![templates::AUDIT_NOT_COMPLETE.to_owned()];
                replies.push(
                    outstanding.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n"),
                );
                replies
            }
            Err(error) => vec![error.to_string()],
        }
    }

    async fn dispatch_auditor(
        &self,
        handle: &AuditHandle,
        from: &ParticipantId,
        body: &str,
    ) -> Vec<String> {
        let status = match handle.status(from.clone()).await {
            Ok(status) => status,
            Err(error) => return vec![error.to_string()],
        };
        match status.onboarding {
            OnboardingState::AwaitingPayoutAddress => {
                self.collect_address(handle, from, body).await
            }
            OnboardingState::Ready => match phase_group(status.phase) {
                PhaseGroup::PreStart => vec![templates::WAITING_FOR_START.to_owned()],
                PhaseGroup::Active => self.collect_finding(handle, from, body, &status).await,
                PhaseGroup::PostWait => vec![templates::WAITING_FOR_CALCULATIONS.to_owned()],
                PhaseGroup::Final => vec![format!(
                    "{}\n{}\n{}",
                    templates::COMPENSATION,
                    status.compensation,
                    templates::FUNDS_TRANSFER
                )],
            },
            // Registration implies the project was already chosen; any
            // other sub-state just waits (OnboardingState is non_exhaustive).
            _ => vec![templates::WAITING_FOR_START.to_owned()],
        }
    }

    async fn collect_address(
        &self,
        handle: &AuditHandle,
        from: &ParticipantId,
        body: &str,
    ) -> Vec<String> {
        let candidate = body.trim();
        if !self.validator.is_valid(candidate) {
            // Invalid input re-prompts without mutating anything.
            return vec![templates::ADDR_INVALID.to_owned(), templates::ADDR_REQUEST.to_owned()];
        }
        match handle.confirm_address(from.clone(), PayoutAddress::new(candidate)).await {
            Ok(()) => vec![templates::ADDR_ACCEPTED.to_owned(), templates::WELCOME.to_owned()],
            Err(error) => vec![error.to_string()],
        }
    }

    async fn collect_finding(
        &self,
        handle: &AuditHandle,
        from: &ParticipantId,
        body: &str,
        status: &crate::actor::AuditorStatus,
    ) -> Vec<String> {
        if status.done {
            return vec![templates::AUDITOR_COMPLETE.to_owned()];
        }
        match handle.submit_finding(from.clone(), body.to_owned()).await {
            Ok(SubmitOutcome::NextAssignment { description, .. }) => {
                vec![format!("{}\n{description}", templates::ASSIGNMENT)]
            }
            Ok(SubmitOutcome::AllDone) => vec![templates::AUDITOR_COMPLETE.to_owned()],
            Err(ServiceError::Audit(AuditError::InvalidAnswer(_))) => {
                let mut replies = vec![answer_help()];
                if let Some((_, description)) = &status.current {
                    replies.push(format!("{}\n{description}", templates::ASSIGNMENT));
                }
                replies
            }
            Err(error) => vec![error.to_string()],
        }
    }

    async fn dispatch_project_choice(&self, from: &ParticipantId, body: &str) -> Vec<String> {
        let name = body.trim();
        let handle = match self.registry.handle(name) {
            Ok(handle) => handle,
            Err(_) => {
                return vec![
                    templates::PROJECT_NOT_FOUND.to_owned(),
                    templates::PROJECT_WELCOME.to_owned(),
                ]
            }
        };
        match handle.phase().await {
            Ok(Phase::RegistrationOpen) => {}
            Ok(Phase::Initialization) => {
                return vec![
                    templates::PROJECT_NOT_OPEN_YET.to_owned(),
                    templates::PROJECT_WELCOME.to_owned(),
                ]
            }
            Ok(_) => {
                return vec![
                    templates::PROJECT_CLOSED.to_owned(),
                    templates::PROJECT_WELCOME.to_owned(),
                ]
            }
            Err(error) => return vec![error.to_string()],
        }
        match handle.register(from.clone()).await {
            Ok(receipt) => {
                self.registry.record_registration(from.clone(), receipt.audit.clone());
                vec![
                    format!("{} {}", templates::PROJECT_REGISTERED, receipt.audit),
                    format!("The per-inspection reward for this project is: {}", receipt.inspection_reward),
                    format!("The slashing ratio for this project is: {}", receipt.slashing_ratio),
                    templates::ADDR_REQUEST.to_owned(),
                ]
            }
            Err(error) => vec![error.to_string(), templates::PROJECT_WELCOME.to_owned()],
        }
    }
}

fn answer_help() -> String {
    format!(
        "Answer not recognised.\n\
         Accepted replies for true: {:?}\n\
         Accepted replies for false: {:?}\n\
         Answers are case-insensitive",
        quorum_core::finding::TRUE_ANSWERS,
        quorum_core::finding::FALSE_ANSWERS,
    )
}
