use serde::{Deserialize, Serialize};

use crate::id::ParticipantId;

/// One auditor's pending or completed evaluation of one item.
///
/// Inspections are created exactly once, when auditing starts, and are
/// never deleted; `inspection_id` equals the record's position in the
/// audit's inspection sequence and is stable for the audit's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Inspection {
    /// Identity of the auditor this unit is assigned to.
    pub auditor: ParticipantId,
    /// Index into the audit's item list.
    pub item: usize,
    /// Stable position in the audit's inspection sequence.
    pub inspection_id: usize,
    /// Whether a finding has been submitted.
    pub completed: bool,
    /// The submitted finding; meaningful only once `completed`.
    pub finding: bool,
    /// Whether the finding matched the consensus verdict; meaningful only
    /// after the alignment step has run.
    pub aligned: bool,
}

impl Inspection {
    /// Creates a pending inspection.
    #[must_use]
    pub fn new(auditor: ParticipantId, item: usize, inspection_id: usize) -> Self {
        Self {
            auditor,
            item,
            inspection_id,
            completed: false,
            finding: false,
            aligned: false,
        }
    }
}
