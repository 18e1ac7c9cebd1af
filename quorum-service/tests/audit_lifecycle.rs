//! Integration test: a full audit driven end to end through the message
//! router, the way a chat transport would drive it.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;

use quorum_core::ParticipantId;
use quorum_service::{
    HexAddressValidator, MessageRouter, Notifier, Registry, ServiceError,
};

/// Captures every outbound message so assertions can inspect them.
#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(ParticipantId, String)>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, to: &ParticipantId, body: &str) {
        #[expect(clippy::expect_used, reason = "test helper")]
        self.sent.lock().expect("notifier mutex poisoned").push((to.clone(), body.to_owned()));
    }
}

impl RecordingNotifier {
    fn bodies_for(&self, id: &ParticipantId) -> Vec<String> {
        #[expect(clippy::expect_used, reason = "test helper")]
        self.sent
            .lock()
            .expect("notifier mutex poisoned")
            .iter()
            .filter(|(to, _)| to == id)
            .map(|(_, body)| body.clone())
            .collect()
    }
}

struct Fixture {
    notifier: Arc<RecordingNotifier>,
    registry: Arc<Registry>,
    router: MessageRouter,
    admin: ParticipantId,
}

fn fixture(seed: u64) -> Fixture {
    let notifier = Arc::new(RecordingNotifier::default());
    let registry = Arc::new(Registry::new(notifier.clone()));
    let admin = ParticipantId::new("admin@quorum");
    registry
        .create_audit_with_rng("vault-2026", admin.clone(), 90.0, StdRng::seed_from_u64(seed))
        .unwrap_or_else(|e| panic!("create_audit failed: {e}"));
    let router = MessageRouter::new(registry.clone(), Arc::new(HexAddressValidator));
    Fixture { notifier, registry, router, admin }
}

async fn admin_say(fixture: &Fixture, body: &str) -> Vec<String> {
    fixture.router.dispatch(&fixture.admin, body).await
}

/// Onboards an auditor through project choice and address collection.
async fn onboard(fixture: &Fixture, who: &str) -> ParticipantId {
    let id = ParticipantId::new(who);
    let replies = fixture.router.dispatch(&id, "vault-2026").await;
    assert!(
        replies.first().is_some_and(|r| r.contains("registered")),
        "registration reply missing, got {replies:?}"
    );
    let addr = format!("0x{:040x}", who.len());
    let replies = fixture.router.dispatch(&id, &addr).await;
    assert_eq!(replies.first().map(String::as_str), Some("Address accepted"));
    id
}

/// Answers "yes" until the drip feed runs dry.
async fn answer_all_yes(fixture: &Fixture, id: &ParticipantId) {
    for _ in 0..100 {
        let replies = fixture.router.dispatch(id, "yes").await;
        if replies.iter().any(|r| r.contains("completed all your tasks")) {
            return;
        }
    }
    panic!("drip feed never ran dry for {id}");
}

#[tokio::test]
async fn full_audit_through_the_router() {
    let fixture = fixture(7);

    for item in ["door seals intact", "inventory tags match", "no water damage"] {
        let replies = admin_say(&fixture, &format!("add {item}")).await;
        assert!(replies[0].contains("Item added"), "got {replies:?}");
    }
    let replies = admin_say(&fixture, "open").await;
    assert!(replies[0].contains("opened for auditors"), "got {replies:?}");
    assert!(replies[0].contains("Reward per inspection set at: 10"), "got {replies:?}");

    let ana = onboard(&fixture, "ana@quorum").await;
    let ben = onboard(&fixture, "ben@quorum").await;
    let cai = onboard(&fixture, "cai@quorum").await;

    admin_say(&fixture, "close").await;
    let replies = admin_say(&fixture, "start").await;
    assert!(replies[0].contains("started"), "got {replies:?}");

    // Each auditor received an assignment notification at start.
    for id in [&ana, &ben, &cai] {
        let bodies = fixture.notifier.bodies_for(id);
        assert!(
            bodies.iter().any(|b| b.contains("assigned the following inspection")),
            "{id} got no assignment notice: {bodies:?}"
        );
    }

    // Stopping early reports the outstanding set and stays in AUDITING.
    let replies = admin_say(&fixture, "stop").await;
    assert!(replies[0].contains("Cannot finish audit"), "got {replies:?}");
    let replies = admin_say(&fixture, "state").await;
    assert_eq!(replies[0], "Audit State: AUDITING");

    answer_all_yes(&fixture, &ana).await;
    answer_all_yes(&fixture, &ben).await;
    answer_all_yes(&fixture, &cai).await;

    let replies = admin_say(&fixture, "stop").await;
    assert!(replies[0].contains("stopped"), "got {replies:?}");
    let replies = admin_say(&fixture, "state").await;
    assert_eq!(replies[0], "Audit State: AWAITING_PAYOUT");

    // Compensation notices went out after the pipeline committed.
    let bodies = fixture.notifier.bodies_for(&ana);
    assert!(
        bodies.iter().any(|b| b.contains("Your compensation is:")),
        "no compensation notice: {bodies:?}"
    );

    // First outcome retrieval returns the full lists and finalizes.
    let (addresses, amounts) = fixture
        .registry
        .get_outcome("vault-2026")
        .await
        .unwrap_or_else(|e| panic!("get_outcome failed: {e}"));
    assert_eq!(addresses.len(), 3);
    assert_eq!(amounts, vec![30, 30, 30], "unanimous auditors split the 90 bond");

    // Second retrieval is empty; the audit is COMPLETE.
    let (addresses, amounts) = fixture
        .registry
        .get_outcome("vault-2026")
        .await
        .unwrap_or_else(|e| panic!("get_outcome failed: {e}"));
    assert!(addresses.is_empty() && amounts.is_empty());
    let replies = admin_say(&fixture, "state").await;
    assert_eq!(replies[0], "Audit State: COMPLETE");
}

#[tokio::test]
async fn onboarding_reprompts_without_mutation_on_bad_input() {
    let fixture = fixture(11);
    admin_say(&fixture, "add one item").await;
    admin_say(&fixture, "open").await;

    let id = ParticipantId::new("dot@quorum");

    // Unknown project name re-prompts.
    let replies = fixture.router.dispatch(&id, "no-such-project").await;
    assert_eq!(replies[0], "Could not find any project by that name.");
    assert_eq!(replies[1], "Which project would you like to join?");

    // Valid project registers and asks for an address.
    let replies = fixture.router.dispatch(&id, "vault-2026").await;
    assert!(replies.last().is_some_and(|r| r.contains("payout address")), "got {replies:?}");

    // Invalid address re-prompts without state change.
    let replies = fixture.router.dispatch(&id, "not-an-address").await;
    assert_eq!(replies[0], "Invalid payout address.");
    let replies = fixture.router.dispatch(&id, "still wrong").await;
    assert_eq!(replies[0], "Invalid payout address.");

    // A valid address completes onboarding.
    let replies = fixture.router.dispatch(&id, &format!("0x{}", "ab".repeat(20))).await;
    assert_eq!(replies[0], "Address accepted");

    // Registered and ready, but the audit has not started yet.
    let replies = fixture.router.dispatch(&id, "anything").await;
    assert_eq!(replies[0], "Hold your horses");
}

#[tokio::test]
async fn registration_rejected_outside_the_open_window() {
    let fixture = fixture(13);
    admin_say(&fixture, "add one item").await;

    // Before open: the project exists but is not accepting auditors yet.
    let id = ParticipantId::new("early@quorum");
    let replies = fixture.router.dispatch(&id, "vault-2026").await;
    assert!(replies[0].contains("not accepting new auditors yet"), "got {replies:?}");

    admin_say(&fixture, "open").await;
    onboard(&fixture, "only@quorum").await;
    admin_say(&fixture, "close").await;

    // After close: registration is refused.
    let late = ParticipantId::new("late@quorum");
    let replies = fixture.router.dispatch(&late, "vault-2026").await;
    assert_eq!(replies[0], "Requested project is not accepting new auditors");
}

#[tokio::test]
async fn unparseable_finding_is_rejected_and_reprompts_the_assignment() {
    let fixture = fixture(17);
    admin_say(&fixture, "set audits_per_item 1").await;
    admin_say(&fixture, "add solitary item").await;
    admin_say(&fixture, "open").await;
    let id = onboard(&fixture, "solo@quorum").await;
    admin_say(&fixture, "close").await;
    admin_say(&fixture, "start").await;

    let replies = fixture.router.dispatch(&id, "perhaps").await;
    assert!(replies[0].starts_with("Answer not recognised."), "got {replies:?}");
    assert!(
        replies.iter().any(|r| r.contains("solitary item")),
        "rejection must re-prompt the current assignment: {replies:?}"
    );

    // The rejected answer mutated nothing: a real answer still works.
    let replies = fixture.router.dispatch(&id, "NO").await;
    assert!(
        replies.iter().any(|r| r.contains("completed all your tasks")),
        "got {replies:?}"
    );
}

#[tokio::test]
async fn admin_help_is_returned_for_unknown_verbs() {
    let fixture = fixture(19);
    let replies = admin_say(&fixture, "launch the missiles").await;
    assert!(replies[0].contains("unknown command"), "got {replies:?}");
    assert!(replies[1].contains("open : allows auditors to register"), "got {replies:?}");
}

#[tokio::test]
async fn different_audits_are_independent() {
    let fixture = fixture(23);
    let other_admin = ParticipantId::new("other-admin@quorum");
    fixture
        .registry
        .create_audit("second-audit", other_admin.clone(), 10.0)
        .unwrap_or_else(|e| panic!("{e}"));

    // Driving one audit does not disturb the other.
    admin_say(&fixture, "add item for first").await;
    admin_say(&fixture, "open").await;
    let replies = fixture.router.dispatch(&other_admin, "state").await;
    assert_eq!(replies[0], "Audit State: INITIALIZATION");

    // The duplicate-name guard holds across the registry.
    let result = fixture.registry.create_audit(
        "second-audit",
        ParticipantId::new("third@quorum"),
        1.0,
    );
    assert!(matches!(result, Err(ServiceError::Audit(_))));
}
