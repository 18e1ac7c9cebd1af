//! The audit aggregate: lifecycle state machine plus the assignment,
//! consensus, and compensation engines operating over its own data.
//!
//! All mutating operations are precondition-guarded and all-or-nothing:
//! a failed guard returns before anything is touched.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::auditor::Auditor;
use crate::config::{AuditConfig, SettableField};
use crate::error::AuditError;
use crate::id::{ParticipantId, PayoutAddress};
use crate::inspection::Inspection;
use crate::phase::Phase;

/// One not-yet-completed inspection, as reported by a failed `stop`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub struct OutstandingInspection {
    /// Auditor the unit is assigned to.
    pub auditor: ParticipantId,
    /// Item index the unit refers to.
    pub item: usize,
    /// Item description, for operator-facing listings.
    pub description: String,
}

impl fmt::Display for OutstandingInspection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.auditor, self.description)
    }
}

/// One run of the coordinated-inspection protocol for a named project.
///
/// Owns the item list, the auditor roster (in registration order), the
/// inspection sequence, and the master phase machine. The engines are
/// methods because they are operations over this aggregate's own data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Audit {
    name: String,
    admin: ParticipantId,
    bond: f64,
    inspection_reward: f64,
    config: AuditConfig,
    items: Vec<String>,
    auditors: IndexMap<ParticipantId, Auditor>,
    inspections: Vec<Inspection>,
    verdicts: Vec<bool>,
    phase: Phase,
    created_at: DateTime<Utc>,
}

impl Audit {
    /// Creates an audit in [`Phase::Initialization`] with default config.
    #[must_use]
    pub fn new(name: impl Into<String>, admin: ParticipantId, bond: f64) -> Self {
        Self {
            name: name.into(),
            admin,
            bond,
            inspection_reward: 0.0,
            config: AuditConfig::default(),
            items: Vec::new(),
            auditors: IndexMap::new(),
            inspections: Vec::new(),
            verdicts: Vec::new(),
            phase: Phase::Initialization,
            created_at: Utc::now(),
        }
    }

    // ── Read accessors ───────────────────────────────────────────────────

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn admin(&self) -> &ParticipantId {
        &self.admin
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Per-inspection reward, derived once when the audit opens.
    #[must_use]
    pub fn inspection_reward(&self) -> f64 {
        self.inspection_reward
    }

    #[must_use]
    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// Auditor roster in registration order.
    #[must_use]
    pub fn auditors(&self) -> &IndexMap<ParticipantId, Auditor> {
        &self.auditors
    }

    #[must_use]
    pub fn inspections(&self) -> &[Inspection] {
        &self.inspections
    }

    /// Consensus verdict table; empty before the item-results step.
    #[must_use]
    pub fn verdicts(&self) -> &[bool] {
        &self.verdicts
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Description of the item an inspection refers to.
    #[must_use]
    pub fn inspection_description(&self, inspection_id: usize) -> Option<&str> {
        let inspection = self.inspections.get(inspection_id)?;
        self.items.get(inspection.item).map(String::as_str)
    }

    fn ensure_phase(&self, expected: Phase) -> Result<(), AuditError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(AuditError::InvalidStateTransition {
                audit: self.name.clone(),
                expected,
                actual: self.phase,
            })
        }
    }

    // ── Item editing ─────────────────────────────────────────────────────

    /// Appends an item description. Allowed only before the audit opens.
    ///
    /// # Errors
    /// [`AuditError::InvalidStateTransition`] outside [`Phase::Initialization`].
    pub fn add_item(&mut self, description: impl Into<String>) -> Result<usize, AuditError> {
        self.ensure_phase(Phase::Initialization)?;
        self.items.push(description.into());
        Ok(self.items.len())
    }

    /// Deletes an item by index; later items shift down by one.
    /// Allowed until auditing starts, since no inspection exists yet.
    ///
    /// # Errors
    /// [`AuditError::InvalidStateTransition`] from [`Phase::Auditing`] onward;
    /// [`AuditError::UnknownItem`] if the index is out of range.
    pub fn delete_item(&mut self, index: usize) -> Result<String, AuditError> {
        if self.phase >= Phase::Auditing {
            return Err(AuditError::InvalidStateTransition {
                audit: self.name.clone(),
                expected: Phase::RegistrationClosed,
                actual: self.phase,
            });
        }
        if index >= self.items.len() {
            return Err(AuditError::UnknownItem { index });
        }
        Ok(self.items.remove(index))
    }

    // ── Narrow field override ────────────────────────────────────────────

    /// Overrides one of the enumerated safe fields, before the audit opens.
    ///
    /// # Errors
    /// [`AuditError::InvalidStateTransition`] outside [`Phase::Initialization`];
    /// [`AuditError::Configuration`] if the value does not parse or fails
    /// validation.
    pub fn set_field(&mut self, field: SettableField, value: &str) -> Result<(), AuditError> {
        self.ensure_phase(Phase::Initialization)?;
        match field {
            SettableField::AuditsPerItem => {
                let parsed: u32 = value.parse().map_err(|_| AuditError::Configuration {
                    reason: format!("'{value}' is not a valid audits_per_item"),
                })?;
                let candidate = AuditConfig { audits_per_item: parsed, ..self.config };
                candidate.validate()?;
                self.config = candidate;
            }
            SettableField::SlashingRatio => {
                let parsed: f64 = value.parse().map_err(|_| AuditError::Configuration {
                    reason: format!("'{value}' is not a valid slashing_ratio"),
                })?;
                let candidate = AuditConfig { slashing_ratio: parsed, ..self.config };
                candidate.validate()?;
                self.config = candidate;
            }
            SettableField::Bond => {
                let parsed: f64 = value.parse().map_err(|_| AuditError::Configuration {
                    reason: format!("'{value}' is not a valid bond"),
                })?;
                if !parsed.is_finite() || parsed < 0.0 {
                    return Err(AuditError::Configuration {
                        reason: format!("bond {parsed} must be finite and >= 0"),
                    });
                }
                self.bond = parsed;
            }
        }
        Ok(())
    }

    /// Current value of an enumerated field, rendered for the admin surface.
    #[must_use]
    pub fn get_field(&self, field: SettableField) -> String {
        match field {
            SettableField::AuditsPerItem => self.config.audits_per_item.to_string(),
            SettableField::SlashingRatio => self.config.slashing_ratio.to_string(),
            SettableField::Bond => self.bond.to_string(),
        }
    }

    // ── Registration ─────────────────────────────────────────────────────

    /// Adds an auditor to the roster. The roster keeps registration order,
    /// which the assignment engine depends on.
    ///
    /// # Errors
    /// [`AuditError::InvalidStateTransition`] outside [`Phase::RegistrationOpen`];
    /// [`AuditError::DuplicateAuditor`] if the identity is already registered.
    pub fn register_auditor(&mut self, auditor: Auditor) -> Result<(), AuditError> {
        self.ensure_phase(Phase::RegistrationOpen)?;
        if self.auditors.contains_key(&auditor.id) {
            return Err(AuditError::DuplicateAuditor(auditor.id));
        }
        self.auditors.insert(auditor.id.clone(), auditor);
        Ok(())
    }

    /// Stores an externally-validated payout address and marks the auditor
    /// ready.
    ///
    /// # Errors
    /// [`AuditError::UnknownAuditor`] if the identity is not registered.
    pub fn accept_address(
        &mut self,
        id: &ParticipantId,
        address: PayoutAddress,
    ) -> Result<(), AuditError> {
        let auditor = self
            .auditors
            .get_mut(id)
            .ok_or_else(|| AuditError::UnknownAuditor(id.clone()))?;
        auditor.accept_address(address);
        Ok(())
    }

    #[must_use]
    pub fn is_registered(&self, id: &ParticipantId) -> bool {
        self.auditors.contains_key(id)
    }

    // ── Phase transitions ────────────────────────────────────────────────

    /// Opens registration. Derives the per-inspection reward from the bond:
    /// `reward = bond / (items × audits_per_item)`.
    ///
    /// # Errors
    /// [`AuditError::Configuration`] with zero items or an invalid config;
    /// [`AuditError::InvalidStateTransition`] outside [`Phase::Initialization`].
    pub fn open(&mut self) -> Result<(), AuditError> {
        self.ensure_phase(Phase::Initialization)?;
        if self.items.is_empty() {
            return Err(AuditError::Configuration {
                reason: "audit has no items to inspect".to_owned(),
            });
        }
        self.config.validate()?;
        #[expect(
            clippy::cast_precision_loss,
            reason = "item counts are far below 2^52"
        )]
        let planned = self.items.len() as f64 * f64::from(self.config.audits_per_item);
        self.inspection_reward = self.bond / planned;
        self.phase = Phase::RegistrationOpen;
        Ok(())
    }

    /// Freezes registration. No computation happens here.
    ///
    /// # Errors
    /// [`AuditError::InvalidStateTransition`] outside [`Phase::RegistrationOpen`].
    pub fn close(&mut self) -> Result<(), AuditError> {
        self.ensure_phase(Phase::RegistrationOpen)?;
        self.phase = Phase::RegistrationClosed;
        Ok(())
    }

    /// Starts auditing: materializes the inspection sequence and gives every
    /// auditor one initial unit of work.
    ///
    /// # Errors
    /// [`AuditError::InsufficientParticipants`] with an empty roster;
    /// [`AuditError::InvalidStateTransition`] outside [`Phase::RegistrationClosed`].
    pub fn start<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), AuditError> {
        self.ensure_phase(Phase::RegistrationClosed)?;
        if self.auditors.is_empty() {
            return Err(AuditError::InsufficientParticipants);
        }
        self.phase = Phase::Auditing;
        self.assign_inspections();
        let roster: Vec<ParticipantId> = self.auditors.keys().cloned().collect();
        for id in &roster {
            self.assign_current_inspection(id, rng)?;
        }
        Ok(())
    }

    /// Stops auditing and runs the full result pipeline: item verdicts,
    /// alignment, auditor aggregation, compensation. One admin-visible call;
    /// each step still guards its own prior phase.
    ///
    /// # Errors
    /// [`AuditError::AuditIncomplete`] while inspections are outstanding
    /// (recoverable — retry once they drain);
    /// [`AuditError::InvalidStateTransition`] outside [`Phase::Auditing`].
    pub fn stop(&mut self) -> Result<(), AuditError> {
        self.ensure_phase(Phase::Auditing)?;
        if !self.is_complete() {
            return Err(AuditError::AuditIncomplete {
                outstanding: self.outstanding_inspections(),
            });
        }
        self.phase = Phase::AuditingFinished;
        self.calculate_item_results()?;
        self.calculate_audit_results()?;
        self.calculate_auditor_results()?;
        self.calculate_auditor_compensation()?;
        Ok(())
    }

    // ── Assignment engine ────────────────────────────────────────────────

    /// Creates `audits_per_item` inspections per item, item-major, cycling
    /// auditors in registration order: overall inspection `i` goes to the
    /// auditor at position `i mod roster_len`. Deterministic, and bounds
    /// per-auditor workload skew to one unit.
    fn assign_inspections(&mut self) {
        let roster: Vec<ParticipantId> = self.auditors.keys().cloned().collect();
        let mut inspection_id = 0;
        for item in 0..self.items.len() {
            for _ in 0..self.config.audits_per_item {
                let auditor = roster[inspection_id % roster.len()].clone();
                self.inspections.push(Inspection::new(auditor, item, inspection_id));
                inspection_id += 1;
            }
        }
    }

    /// Picks one of the auditor's outstanding inspections uniformly at
    /// random and sets it as their sole current unit. Returns the chosen
    /// inspection id, or `None` when the auditor has nothing left.
    ///
    /// One unit at a time limits each auditor's visibility into how often
    /// an item is being re-inspected by others.
    ///
    /// # Errors
    /// [`AuditError::UnknownAuditor`] if the identity is not registered.
    pub fn assign_current_inspection<R: Rng + ?Sized>(
        &mut self,
        id: &ParticipantId,
        rng: &mut R,
    ) -> Result<Option<usize>, AuditError> {
        if !self.auditors.contains_key(id) {
            return Err(AuditError::UnknownAuditor(id.clone()));
        }
        let outstanding: Vec<usize> = self
            .inspections
            .iter()
            .filter(|i| !i.completed && &i.auditor == id)
            .map(|i| i.inspection_id)
            .collect();
        let chosen = outstanding.choose(rng).copied();
        if let Some(auditor) = self.auditors.get_mut(id) {
            auditor.current_inspection = chosen;
        }
        Ok(chosen)
    }

    /// All inspections not yet completed, with item descriptions.
    #[must_use]
    pub fn outstanding_inspections(&self) -> Vec<OutstandingInspection> {
        self.inspections
            .iter()
            .filter(|i| !i.completed)
            .map(|i| OutstandingInspection {
                auditor: i.auditor.clone(),
                item: i.item,
                description: self.items.get(i.item).cloned().unwrap_or_default(),
            })
            .collect()
    }

    /// `true` once every inspection has a finding.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.inspections.iter().all(|i| i.completed)
    }

    #[must_use]
    pub fn auditor_done(&self, id: &ParticipantId) -> bool {
        !self
            .inspections
            .iter()
            .any(|i| !i.completed && &i.auditor == id)
    }

    /// Records a finding against the auditor's current unit, then drip-feeds
    /// the next one. Returns the newly assigned inspection id, or `None`
    /// when the auditor has finished all their units. A no-op returning
    /// `None` if the auditor has no current unit.
    ///
    /// # Errors
    /// [`AuditError::InvalidStateTransition`] outside [`Phase::Auditing`];
    /// [`AuditError::UnknownAuditor`] if the identity is not registered.
    pub fn submit_current_finding<R: Rng + ?Sized>(
        &mut self,
        id: &ParticipantId,
        finding: bool,
        rng: &mut R,
    ) -> Result<Option<usize>, AuditError> {
        self.ensure_phase(Phase::Auditing)?;
        let auditor = self
            .auditors
            .get(id)
            .ok_or_else(|| AuditError::UnknownAuditor(id.clone()))?;
        let Some(current) = auditor.current_inspection else {
            return Ok(None);
        };
        if let Some(inspection) = self.inspections.get_mut(current) {
            inspection.finding = finding;
            inspection.completed = true;
        }
        self.assign_current_inspection(id, rng)
    }

    // ── Consensus engine ─────────────────────────────────────────────────

    /// Computes the per-item majority verdict: +1 per true finding, −1 per
    /// false, verdict = sum > 0. A tied sum resolves to `false`; operators
    /// should configure an odd `audits_per_item` to avoid ties.
    ///
    /// # Errors
    /// [`AuditError::InvalidStateTransition`] outside [`Phase::AuditingFinished`];
    /// [`AuditError::AuditIncomplete`] if any inspection lacks a finding.
    pub fn calculate_item_results(&mut self) -> Result<(), AuditError> {
        self.ensure_phase(Phase::AuditingFinished)?;
        if !self.is_complete() {
            return Err(AuditError::AuditIncomplete {
                outstanding: self.outstanding_inspections(),
            });
        }
        let mut tallies = vec![0_i64; self.items.len()];
        for inspection in &self.inspections {
            tallies[inspection.item] += if inspection.finding { 1 } else { -1 };
        }
        self.verdicts = tallies.into_iter().map(|sum| sum > 0).collect();
        self.phase = Phase::ItemResultsCalculated;
        Ok(())
    }

    /// Marks every inspection aligned iff its finding matches the frozen
    /// verdict for its item.
    ///
    /// # Errors
    /// [`AuditError::InvalidStateTransition`] outside [`Phase::ItemResultsCalculated`].
    pub fn calculate_audit_results(&mut self) -> Result<(), AuditError> {
        self.ensure_phase(Phase::ItemResultsCalculated)?;
        for inspection in &mut self.inspections {
            inspection.aligned = inspection.finding == self.verdicts[inspection.item];
        }
        self.phase = Phase::AuditResultsCalculated;
        Ok(())
    }

    /// Aggregates per-auditor inspection and alignment counts.
    ///
    /// # Errors
    /// [`AuditError::InvalidStateTransition`] outside [`Phase::AuditResultsCalculated`].
    pub fn calculate_auditor_results(&mut self) -> Result<(), AuditError> {
        self.ensure_phase(Phase::AuditResultsCalculated)?;
        let mut counts: HashMap<ParticipantId, (usize, usize)> = HashMap::new();
        for inspection in &self.inspections {
            let entry = counts.entry(inspection.auditor.clone()).or_default();
            entry.0 += 1;
            if inspection.aligned {
                entry.1 += 1;
            }
        }
        for auditor in self.auditors.values_mut() {
            let (count, aligned) = counts.get(&auditor.id).copied().unwrap_or((0, 0));
            auditor.audit_count = count;
            auditor.audits_aligned = aligned;
        }
        self.phase = Phase::AuditorResultsCalculated;
        Ok(())
    }

    // ── Compensation engine ──────────────────────────────────────────────

    /// Converts alignment into token amounts:
    /// `units = max(0, aligned − ratio × incorrect)`, scaled by the
    /// per-inspection reward.
    ///
    /// # Errors
    /// [`AuditError::InvalidStateTransition`] outside
    /// [`Phase::AuditorResultsCalculated`].
    pub fn calculate_auditor_compensation(&mut self) -> Result<(), AuditError> {
        self.ensure_phase(Phase::AuditorResultsCalculated)?;
        let ratio = self.config.slashing_ratio;
        let reward = self.inspection_reward;
        for auditor in self.auditors.values_mut() {
            let units = compensation_units(auditor.audit_count, auditor.audits_aligned, ratio);
            auditor.compensation = units * reward;
        }
        self.phase = Phase::AwaitingPayout;
        Ok(())
    }

    // ── Payout extraction ────────────────────────────────────────────────

    /// Returns the parallel (address, whole-token amount) lists exactly
    /// once: the first call in [`Phase::AwaitingPayout`] yields the data
    /// and finalizes the audit; any other phase — including every call
    /// after the first — yields two empty lists.
    pub fn take_payout(&mut self) -> (Vec<PayoutAddress>, Vec<u64>) {
        if self.phase != Phase::AwaitingPayout {
            return (Vec::new(), Vec::new());
        }
        let mut addresses = Vec::with_capacity(self.auditors.len());
        let mut amounts = Vec::with_capacity(self.auditors.len());
        for auditor in self.auditors.values() {
            addresses.push(auditor.address.clone().unwrap_or_default());
            #[expect(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                reason = "compensation is non-negative; payout truncates to whole tokens"
            )]
            amounts.push(auditor.compensation as u64);
        }
        self.phase = Phase::Complete;
        (addresses, amounts)
    }
}

/// Compensation units before scaling by the inspection reward:
/// `max(0, aligned − ratio × (count − aligned))`.
///
/// A ratio above 1 zeroes compensation faster than a 1:1 penalty — a
/// configurable economic lever.
#[must_use]
pub fn compensation_units(audit_count: usize, audits_aligned: usize, slashing_ratio: f64) -> f64 {
    #[expect(clippy::cast_precision_loss, reason = "inspection counts are far below 2^52")]
    let incorrect = (audit_count - audits_aligned) as f64;
    #[expect(clippy::cast_precision_loss, reason = "inspection counts are far below 2^52")]
    let aligned = audits_aligned as f64;
    (aligned - slashing_ratio * incorrect).max(0.0)
}
