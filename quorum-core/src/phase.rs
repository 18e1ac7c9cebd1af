use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle phase of an [`Audit`](crate::Audit).
///
/// Phases form a strict linear order with no skipping and no going back.
/// Every admin-triggered transition is guarded by its predecessor phase;
/// the only read-triggered transition is `AwaitingPayout → Complete`,
/// driven by the first payout retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Phase {
    /// Audit created; items may be added, nothing else has happened.
    Initialization,
    /// Auditors may register.
    RegistrationOpen,
    /// Registration frozen; waiting for the admin to start.
    RegistrationClosed,
    /// Inspections assigned; auditors are submitting findings.
    Auditing,
    /// All findings in; result pipeline not yet run.
    AuditingFinished,
    /// Per-item consensus verdicts computed.
    ItemResultsCalculated,
    /// Per-inspection alignment computed.
    AuditResultsCalculated,
    /// Per-auditor aggregates computed.
    AuditorResultsCalculated,
    /// Compensation computed; payout data ready for one retrieval.
    AwaitingPayout,
    /// Payout data consumed; the audit is immutable.
    Complete,
}

impl Phase {
    /// Returns the next phase in the linear order, or `None` from
    /// [`Phase::Complete`].
    #[must_use]
    pub fn successor(self) -> Option<Self> {
        match self {
            Self::Initialization => Some(Self::RegistrationOpen),
            Self::RegistrationOpen => Some(Self::RegistrationClosed),
            Self::RegistrationClosed => Some(Self::Auditing),
            Self::Auditing => Some(Self::AuditingFinished),
            Self::AuditingFinished => Some(Self::ItemResultsCalculated),
            Self::ItemResultsCalculated => Some(Self::AuditResultsCalculated),
            Self::AuditResultsCalculated => Some(Self::AuditorResultsCalculated),
            Self::AuditorResultsCalculated => Some(Self::AwaitingPayout),
            Self::AwaitingPayout => Some(Self::Complete),
            Self::Complete => None,
        }
    }

    /// Returns `true` for the terminal phase.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self == Self::Complete
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initialization => "INITIALIZATION",
            Self::RegistrationOpen => "REGISTRATION_OPEN",
            Self::RegistrationClosed => "REGISTRATION_CLOSED",
            Self::Auditing => "AUDITING",
            Self::AuditingFinished => "AUDITING_FINISHED",
            Self::ItemResultsCalculated => "ITEM_RESULTS_CALCULATED",
            Self::AuditResultsCalculated => "AUDIT_RESULTS_CALCULATED",
            Self::AuditorResultsCalculated => "AUDITOR_RESULTS_CALCULATED",
            Self::AwaitingPayout => "AWAITING_PAYOUT",
            Self::Complete => "COMPLETE",
        };
        f.write_str(name)
    }
}

/// Onboarding sub-state of an auditor, driven by the transport layer.
///
/// Progression: `AwaitingProjectChoice → AwaitingPayoutAddress → Ready`.
/// Invalid input at either prompt re-prompts without mutating the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum OnboardingState {
    /// The participant has not yet named an audit to join.
    AwaitingProjectChoice,
    /// Registered with an audit; waiting for a valid payout address.
    AwaitingPayoutAddress,
    /// Fully onboarded; messages route to the finding surface.
    Ready,
}

impl fmt::Display for OnboardingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AwaitingProjectChoice => "AWAITING_PROJECT_CHOICE",
            Self::AwaitingPayoutAddress => "AWAITING_PAYOUT_ADDRESS",
            Self::Ready => "READY",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successor_chain_visits_every_phase_once() {
        let mut phase = Phase::Initialization;
        let mut visited = vec![phase];
        while let Some(next) = phase.successor() {
            assert!(phase < next, "successor must move strictly forward");
            phase = next;
            visited.push(phase);
        }
        assert_eq!(visited.len(), 10, "linear order has exactly ten phases");
        assert_eq!(phase, Phase::Complete);
    }

    #[test]
    fn complete_is_terminal_and_has_no_successor() {
        assert!(Phase::Complete.is_terminal());
        assert!(Phase::Complete.successor().is_none());
        assert!(!Phase::AwaitingPayout.is_terminal());
    }

    #[test]
    fn phase_display_matches_wire_names() {
        assert_eq!(Phase::RegistrationOpen.to_string(), "REGISTRATION_OPEN");
        assert_eq!(Phase::AwaitingPayout.to_string(), "AWAITING_PAYOUT");
    }
}
