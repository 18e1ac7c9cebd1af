use serde::{Deserialize, Serialize};

use crate::id::{ParticipantId, PayoutAddress};
use crate::phase::OnboardingState;

/// A participant who performs inspections in exchange for compensation.
///
/// `audit_count` and `audits_aligned` are derived and valid only after the
/// auditor-results step; `compensation` only after the compensation step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Auditor {
    /// Chat identity, unique within an audit.
    pub id: ParticipantId,
    /// Payout address, present once the onboarding address prompt has been
    /// answered with an externally-validated address.
    pub address: Option<PayoutAddress>,
    /// Transport-driven onboarding sub-state.
    pub onboarding: OnboardingState,
    /// The auditor's sole outstanding unit of work, if any.
    pub current_inspection: Option<usize>,
    /// Number of inspections this auditor owns.
    pub audit_count: usize,
    /// Number of those whose finding matched the consensus verdict.
    pub audits_aligned: usize,
    /// Token amount owed, in bond units.
    pub compensation: f64,
}

impl Auditor {
    /// Creates a fresh auditor record at the start of onboarding.
    #[must_use]
    pub fn new(id: ParticipantId) -> Self {
        Self {
            id,
            address: None,
            onboarding: OnboardingState::AwaitingProjectChoice,
            current_inspection: None,
            audit_count: 0,
            audits_aligned: 0,
            compensation: 0.0,
        }
    }

    /// Stores a validated payout address and marks the auditor ready.
    pub fn accept_address(&mut self, address: PayoutAddress) {
        self.address = Some(address);
        self.onboarding = OnboardingState::Ready;
    }
}
