//! Named collection of running audits with identity-based routing.
//!
//! The registry maps audit names to actor handles and keeps the two
//! routing indexes the transport needs: which audit an identity
//! administers, and which audit an identity audits for. The indexes are
//! plain lookups; all audit mutation goes through the actors.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use quorum_core::{Audit, AuditError, ParticipantId, PayoutAddress, Phase};

use crate::actor::{spawn_audit, AuditHandle};
use crate::error::ServiceError;
use crate::notify::Notifier;

struct AuditEntry {
    admin: ParticipantId,
    handle: AuditHandle,
}

#[derive(Default)]
struct Inner {
    audits: HashMap<String, AuditEntry>,
    // identity -> audit name, maintained when a registration commits
    auditors: HashMap<ParticipantId, String>,
}

/// Thread-safe registry of running audits.
pub struct Registry {
    notifier: Arc<dyn Notifier>,
    inner: RwLock<Inner>,
}

impl Registry {
    #[must_use]
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier, inner: RwLock::new(Inner::default()) }
    }

    /// Creates an audit and spawns its actor.
    ///
    /// # Errors
    /// [`AuditError::DuplicateAudit`] if the name is taken — an existing
    /// audit is never silently overwritten.
    ///
    /// # Panics
    /// Panics if the internal `RwLock` is poisoned.
    pub fn create_audit(
        &self,
        name: &str,
        admin: ParticipantId,
        bond: f64,
    ) -> Result<AuditHandle, ServiceError> {
        let rng = StdRng::from_entropy();
        self.create_audit_with_rng(name, admin, bond, rng)
    }

    /// Like [`Registry::create_audit`] with an injected work-selection RNG,
    /// for reproducible assignment sequences.
    ///
    /// # Errors
    /// [`AuditError::DuplicateAudit`] if the name is taken.
    ///
    /// # Panics
    /// Panics if the internal `RwLock` is poisoned.
    pub fn create_audit_with_rng(
        &self,
        name: &str,
        admin: ParticipantId,
        bond: f64,
        rng: StdRng,
    ) -> Result<AuditHandle, ServiceError> {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let mut inner = self.inner.write().expect("registry write lock poisoned");
        if inner.audits.contains_key(name) {
            return Err(AuditError::DuplicateAudit(name.to_owned()).into());
        }
        let audit = Audit::new(name, admin.clone(), bond);
        let handle = spawn_audit(audit, rng, Arc::clone(&self.notifier));
        inner.audits.insert(name.to_owned(), AuditEntry { admin, handle: handle.clone() });
        info!(audit = %name, "audit created");
        Ok(handle)
    }

    /// Handle for a named audit.
    ///
    /// # Errors
    /// [`AuditError::UnknownAudit`] if no audit has this name.
    ///
    /// # Panics
    /// Panics if the internal `RwLock` is poisoned.
    pub fn handle(&self, name: &str) -> Result<AuditHandle, ServiceError> {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let inner = self.inner.read().expect("registry read lock poisoned");
        inner
            .audits
            .get(name)
            .map(|entry| entry.handle.clone())
            .ok_or_else(|| AuditError::UnknownAudit(name.to_owned()).into())
    }

    /// The audit this identity administers, if any.
    ///
    /// # Panics
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn find_admin(&self, id: &ParticipantId) -> Option<AuditHandle> {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let inner = self.inner.read().expect("registry read lock poisoned");
        inner
            .audits
            .values()
            .find(|entry| &entry.admin == id)
            .map(|entry| entry.handle.clone())
    }

    /// The audit this identity is registered with as an auditor, if any.
    ///
    /// # Panics
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn find_auditor(&self, id: &ParticipantId) -> Option<AuditHandle> {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let inner = self.inner.read().expect("registry read lock poisoned");
        let name = inner.auditors.get(id)?;
        inner.audits.get(name).map(|entry| entry.handle.clone())
    }

    /// Records a committed registration in the identity index.
    ///
    /// # Panics
    /// Panics if the internal `RwLock` is poisoned.
    pub(crate) fn record_registration(&self, id: ParticipantId, audit_name: String) {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let mut inner = self.inner.write().expect("registry write lock poisoned");
        inner.auditors.insert(id, audit_name);
    }

    /// Consume-once payout extraction for a named audit.
    ///
    /// # Errors
    /// [`AuditError::UnknownAudit`] if no audit has this name;
    /// [`ServiceError::AuditUnavailable`] if its actor stopped.
    pub async fn get_outcome(
        &self,
        name: &str,
    ) -> Result<(Vec<PayoutAddress>, Vec<u64>), ServiceError> {
        let handle = self.handle(name)?;
        handle.take_payout().await
    }

    /// Current phase of a named audit.
    ///
    /// # Errors
    /// [`AuditError::UnknownAudit`] if no audit has this name;
    /// [`ServiceError::AuditUnavailable`] if its actor stopped.
    pub async fn phase(&self, name: &str) -> Result<Phase, ServiceError> {
        let handle = self.handle(name)?;
        handle.phase().await
    }

    /// Drops every audit; their actor tasks stop once their queues drain.
    ///
    /// # Panics
    /// Panics if the internal `RwLock` is poisoned.
    pub fn clear(&self) {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let mut inner = self.inner.write().expect("registry write lock poisoned");
        let dropped = inner.audits.len();
        inner.audits.clear();
        inner.auditors.clear();
        info!(dropped, "registry cleared");
    }

    /// Number of audits currently registered.
    ///
    /// # Panics
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let inner = self.inner.read().expect("registry read lock poisoned");
        inner.audits.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NullNotifier;

    fn registry() -> Registry {
        Registry::new(Arc::new(NullNotifier))
    }

    #[tokio::test]
    async fn duplicate_audit_name_is_rejected_not_overwritten() {
        let registry = registry();
        registry
            .create_audit("vault", ParticipantId::new("admin@a"), 10.0)
            .unwrap_or_else(|e| panic!("first create failed: {e}"));
        let result = registry.create_audit("vault", ParticipantId::new("admin@b"), 99.0);
        assert!(matches!(
            result,
            Err(ServiceError::Audit(AuditError::DuplicateAudit(ref name))) if name == "vault"
        ));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn identity_routing_distinguishes_admin_and_auditor() {
        let registry = registry();
        let admin = ParticipantId::new("admin@a");
        let handle = registry
            .create_audit("vault", admin.clone(), 10.0)
            .unwrap_or_else(|e| panic!("create failed: {e}"));
        assert!(registry.find_admin(&admin).is_some());
        assert!(registry.find_auditor(&admin).is_none());

        let stranger = ParticipantId::new("nobody@x");
        assert!(registry.find_admin(&stranger).is_none());
        assert!(registry.find_auditor(&stranger).is_none());

        // A committed registration shows up in auditor routing.
        registry.record_registration(ParticipantId::new("ana@a"), handle.name().to_owned());
        assert!(registry.find_auditor(&ParticipantId::new("ana@a")).is_some());
    }

    #[tokio::test]
    async fn outcome_for_unknown_audit_is_a_structured_error() {
        let registry = registry();
        let result = registry.get_outcome("ghost").await;
        assert!(matches!(
            result,
            Err(ServiceError::Audit(AuditError::UnknownAudit(ref name))) if name == "ghost"
        ));
    }

    #[tokio::test]
    async fn clear_drops_all_audits() {
        let registry = registry();
        registry
            .create_audit("one", ParticipantId::new("a@a"), 1.0)
            .unwrap_or_else(|e| panic!("{e}"));
        registry
            .create_audit("two", ParticipantId::new("b@b"), 2.0)
            .unwrap_or_else(|e| panic!("{e}"));
        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.handle("one").is_err());
    }
}
