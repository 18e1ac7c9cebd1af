//! One actor task per audit.
//!
//! Every mutating operation on an audit flows through a single `mpsc`
//! command queue and is processed one command at a time, so concurrent
//! admin and auditor actions against the same audit are linearized in
//! arrival order. Different audits run fully concurrently. Core
//! operations are bounded and non-suspending; notifications go out after
//! the mutation commits.

use std::sync::Arc;

use rand::rngs::StdRng;
use tokio::sync::{mpsc, oneshot};
use tracing::info;

use quorum_core::{
    finding, Audit, AuditError, Auditor, OnboardingState, ParticipantId, PayoutAddress, Phase,
};

use crate::command::AdminCommand;
use crate::error::ServiceError;
use crate::notify::{templates, Notifier};

/// Queue depth per audit. Commands beyond this apply backpressure to the
/// transport rather than piling up unboundedly.
const COMMAND_QUEUE_DEPTH: usize = 64;

/// What a finding submission produced.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubmitOutcome {
    /// A new unit was drip-fed to the auditor.
    NextAssignment {
        inspection_id: usize,
        description: String,
    },
    /// The auditor has no units left.
    AllDone,
}

/// Reply to a successful registration, for the welcome message.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct RegistrationReceipt {
    pub audit: String,
    pub inspection_reward: f64,
    pub slashing_ratio: f64,
}

/// Snapshot of one auditor's standing, for reply routing.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct AuditorStatus {
    pub phase: Phase,
    pub onboarding: OnboardingState,
    pub done: bool,
    /// Current unit as `(inspection_id, item description)`, if any.
    pub current: Option<(usize, String)>,
    pub compensation: f64,
}

#[derive(Debug)]
enum AuditCommand {
    Admin {
        command: AdminCommand,
        reply: oneshot::Sender<Result<String, ServiceError>>,
    },
    Register {
        auditor: ParticipantId,
        reply: oneshot::Sender<Result<RegistrationReceipt, ServiceError>>,
    },
    ConfirmAddress {
        auditor: ParticipantId,
        address: PayoutAddress,
        reply: oneshot::Sender<Result<(), ServiceError>>,
    },
    SubmitFinding {
        auditor: ParticipantId,
        text: String,
        reply: oneshot::Sender<Result<SubmitOutcome, ServiceError>>,
    },
    Status {
        auditor: ParticipantId,
        reply: oneshot::Sender<Result<AuditorStatus, ServiceError>>,
    },
    Phase {
        reply: oneshot::Sender<Phase>,
    },
    TakePayout {
        reply: oneshot::Sender<(Vec<PayoutAddress>, Vec<u64>)>,
    },
}

/// Cloneable handle to an audit's actor task.
#[derive(Debug, Clone)]
pub struct AuditHandle {
    name: String,
    tx: mpsc::Sender<AuditCommand>,
}

impl AuditHandle {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn unavailable(&self) -> ServiceError {
        ServiceError::AuditUnavailable(self.name.clone())
    }

    async fn request<T>(
        &self,
        command: AuditCommand,
        rx: oneshot::Receiver<T>,
    ) -> Result<T, ServiceError> {
        self.tx.send(command).await.map_err(|_| self.unavailable())?;
        rx.await.map_err(|_| self.unavailable())
    }

    /// Runs one admin verb and returns its rendered reply.
    ///
    /// # Errors
    /// Core guard failures surface as [`ServiceError::Audit`]; a stopped
    /// actor as [`ServiceError::AuditUnavailable`].
    pub async fn admin(&self, command: AdminCommand) -> Result<String, ServiceError> {
        let (tx, rx) = oneshot::channel();
        self.request(AuditCommand::Admin { command, reply: tx }, rx).await?
    }

    /// Registers an identity as an auditor.
    ///
    /// # Errors
    /// [`ServiceError::Audit`] outside registration or on a duplicate.
    pub async fn register(&self, auditor: ParticipantId) -> Result<RegistrationReceipt, ServiceError> {
        let (tx, rx) = oneshot::channel();
        self.request(AuditCommand::Register { auditor, reply: tx }, rx).await?
    }

    /// Stores an already-validated payout address.
    ///
    /// # Errors
    /// [`ServiceError::Audit`] if the identity is not registered.
    pub async fn confirm_address(
        &self,
        auditor: ParticipantId,
        address: PayoutAddress,
    ) -> Result<(), ServiceError> {
        let (tx, rx) = oneshot::channel();
        self.request(AuditCommand::ConfirmAddress { auditor, address, reply: tx }, rx).await?
    }

    /// Submits a free-text finding for the auditor's current unit.
    ///
    /// # Errors
    /// [`ServiceError::Audit`] on an unparseable answer or outside the
    /// auditing phase.
    pub async fn submit_finding(
        &self,
        auditor: ParticipantId,
        text: String,
    ) -> Result<SubmitOutcome, ServiceError> {
        let (tx, rx) = oneshot::channel();
        self.request(AuditCommand::SubmitFinding { auditor, text, reply: tx }, rx).await?
    }

    /// Snapshot of an auditor's standing within this audit.
    ///
    /// # Errors
    /// [`ServiceError::Audit`] if the identity is not registered.
    pub async fn status(&self, auditor: ParticipantId) -> Result<AuditorStatus, ServiceError> {
        let (tx, rx) = oneshot::channel();
        self.request(AuditCommand::Status { auditor, reply: tx }, rx).await?
    }

    /// Current lifecycle phase.
    ///
    /// # Errors
    /// [`ServiceError::AuditUnavailable`] if the actor has stopped.
    pub async fn phase(&self) -> Result<Phase, ServiceError> {
        let (tx, rx) = oneshot::channel();
        self.request(AuditCommand::Phase { reply: tx }, rx).await
    }

    /// Consume-once payout extraction: full lists on the first call in
    /// `AWAITING_PAYOUT`, empty lists in every other case.
    ///
    /// # Errors
    /// [`ServiceError::AuditUnavailable`] if the actor has stopped.
    pub async fn take_payout(&self) -> Result<(Vec<PayoutAddress>, Vec<u64>), ServiceError> {
        let (tx, rx) = oneshot::channel();
        self.request(AuditCommand::TakePayout { reply: tx }, rx).await
    }
}

/// Spawns the actor task owning `audit` and returns its handle.
///
/// The random source used for work selection is injected so tests can
/// assert exact, reproducible assignment sequences.
#[must_use]
pub fn spawn_audit(audit: Audit, rng: StdRng, notifier: Arc<dyn Notifier>) -> AuditHandle {
    let (tx, rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
    let name = audit.name().to_owned();
    let actor = AuditActor { audit, rng, notifier, rx };
    tokio::spawn(actor.run());
    AuditHandle { name, tx }
}

struct AuditActor {
    audit: Audit,
    rng: StdRng,
    notifier: Arc<dyn Notifier>,
    rx: mpsc::Receiver<AuditCommand>,
}

impl AuditActor {
    async fn run(mut self) {
        while let Some(command) = self.rx.recv().await {
            self.handle(command).await;
        }
        info!(audit = %self.audit.name(), "audit actor stopped");
    }

    async fn handle(&mut self, command: AuditCommand) {
        match command {
            AuditCommand::Admin { command, reply } => {
                let result = self.handle_admin(command).await;
                let _ = reply.send(result);
            }
            AuditCommand::Register { auditor, reply } => {
                let _ = reply.send(self.handle_register(auditor));
            }
            AuditCommand::ConfirmAddress { auditor, address, reply } => {
                let result = self.audit.accept_address(&auditor, address);
                let _ = reply.send(result.map_err(ServiceError::from));
            }
            AuditCommand::SubmitFinding { auditor, text, reply } => {
                let _ = reply.send(self.handle_submit(&auditor, &text));
            }
            AuditCommand::Status { auditor, reply } => {
                let _ = reply.send(self.handle_status(&auditor));
            }
            AuditCommand::Phase { reply } => {
                let _ = reply.send(self.audit.phase());
            }
            AuditCommand::TakePayout { reply } => {
                let outcome = self.audit.take_payout();
                if !outcome.0.is_empty() {
                    info!(
                        audit = %self.audit.name(),
                        beneficiaries = outcome.0.len(),
                        "payout extracted, audit finalized"
                    );
                }
                let _ = reply.send(outcome);
            }
        }
    }

    async fn handle_admin(&mut self, command: AdminCommand) -> Result<String, ServiceError> {
        let name = self.audit.name().to_owned();
        match command {
            AdminCommand::Open => {
                self.audit.open()?;
                info!(audit = %name, phase = %self.audit.phase(), "registration opened");
                Ok(format!(
                    "Project {name} opened for auditors to register\n\
                     Reward per inspection set at: {}\n\
                     Slashing ratio set at: {}",
                    self.audit.inspection_reward(),
                    self.audit.config().slashing_ratio,
                ))
            }
            AdminCommand::Close => {
                self.audit.close()?;
                info!(audit = %name, phase = %self.audit.phase(), "registration closed");
                self.notify_all(templates::REGISTRATION_CLOSED).await;
                Ok(format!("Project {name} closed for registration."))
            }
            AdminCommand::Start => {
                self.audit.start(&mut self.rng)?;
                info!(
                    audit = %name,
                    inspections = self.audit.inspections().len(),
                    "auditing started"
                );
                self.notify_all(templates::AUDIT_STARTED).await;
                self.notify_assignments().await;
                Ok(format!("Audit for project {name} started."))
            }
            AdminCommand::Stop => {
                self.audit.stop()?;
                info!(audit = %name, phase = %self.audit.phase(), "auditing stopped, results computed");
                self.notify_all(templates::AUDIT_STOPPED).await;
                self.notify_compensation().await;
                Ok(format!("Audit for project {name} stopped."))
            }
            AdminCommand::State => Ok(format!("Audit State: {}", self.audit.phase())),
            AdminCommand::AddItem(description) => {
                let count = self.audit.add_item(description)?;
                Ok(format!("Item added. Item count: {count}"))
            }
            AdminCommand::DeleteItem(index) => {
                let removed = self.audit.delete_item(index)?;
                Ok(format!(
                    "Item deleted: {removed}. Item count: {}",
                    self.audit.items().len()
                ))
            }
            AdminCommand::ListItems => {
                let listing: Vec<String> = self
                    .audit
                    .items()
                    .iter()
                    .enumerate()
                    .map(|(index, description)| format!("{index} : {description}"))
                    .collect();
                Ok(listing.join("\n"))
            }
            AdminCommand::Outstanding => {
                let listing: Vec<String> = self
                    .audit
                    .outstanding_inspections()
                    .iter()
                    .map(ToString::to_string)
                    .collect();
                Ok(listing.join("\n"))
            }
            AdminCommand::Get(field) => Ok(self.audit.get_field(field)),
            AdminCommand::Set(field, value) => {
                self.audit.set_field(field, &value)?;
                Ok(format!("Value of {field} set to: {}", self.audit.get_field(field)))
            }
            AdminCommand::Dump => Ok(serde_json::to_string_pretty(&self.audit)?),
            AdminCommand::Help => Ok(crate::command::help_text()),
        }
    }

    fn handle_register(&mut self, id: ParticipantId) -> Result<RegistrationReceipt, ServiceError> {
        let mut auditor = Auditor::new(id.clone());
        auditor.onboarding = OnboardingState::AwaitingPayoutAddress;
        self.audit.register_auditor(auditor)?;
        info!(audit = %self.audit.name(), auditor = %id, "auditor registered");
        Ok(RegistrationReceipt {
            audit: self.audit.name().to_owned(),
            inspection_reward: self.audit.inspection_reward(),
            slashing_ratio: self.audit.config().slashing_ratio,
        })
    }

    fn handle_submit(
        &mut self,
        id: &ParticipantId,
        text: &str,
    ) -> Result<SubmitOutcome, ServiceError> {
        if self.audit.is_registered(id) && self.audit.auditor_done(id) {
            return Ok(SubmitOutcome::AllDone);
        }
        // Parse before touching anything: a bad answer must not mutate.
        let finding = finding::parse(text)?;
        match self.audit.submit_current_finding(id, finding, &mut self.rng)? {
            Some(inspection_id) => {
                let description = self
                    .audit
                    .inspection_description(inspection_id)
                    .unwrap_or_default()
                    .to_owned();
                Ok(SubmitOutcome::NextAssignment { inspection_id, description })
            }
            None => Ok(SubmitOutcome::AllDone),
        }
    }

    fn handle_status(&self, id: &ParticipantId) -> Result<AuditorStatus, ServiceError> {
        let auditor = self
            .audit
            .auditors()
            .get(id)
            .ok_or_else(|| AuditError::UnknownAuditor(id.clone()))?;
        let current = auditor.current_inspection.map(|inspection_id| {
            let description = self
                .audit
                .inspection_description(inspection_id)
                .unwrap_or_default()
                .to_owned();
            (inspection_id, description)
        });
        Ok(AuditorStatus {
            phase: self.audit.phase(),
            onboarding: auditor.onboarding,
            done: self.audit.auditor_done(id),
            current,
            compensation: auditor.compensation,
        })
    }

    async fn notify_all(&self, body: &str) {
        for id in self.audit.auditors().keys() {
            self.notifier.send(id, body).await;
        }
    }

    async fn notify_assignments(&self) {
        let mut messages = Vec::with_capacity(self.audit.auditors().len());
        for auditor in self.audit.auditors().values() {
            let body = match auditor.current_inspection {
                Some(inspection_id) => format!(
                    "{}\n{}",
                    templates::ASSIGNMENT,
                    self.audit.inspection_description(inspection_id).unwrap_or_default()
                ),
                None => templates::AUDITOR_COMPLETE.to_owned(),
            };
            messages.push((auditor.id.clone(), body));
        }
        for (id, body) in messages {
            self.notifier.send(&id, &body).await;
        }
    }

    async fn notify_compensation(&self) {
        for auditor in self.audit.auditors().values() {
            let body = format!(
                "{}\n{}\n{}",
                templates::COMPENSATION,
                auditor.compensation,
                templates::FUNDS_TRANSFER
            );
            self.notifier.send(&auditor.id, &body).await;
        }
    }
}
