//! Axum route handlers for the Quorum gateway API.
//!
//! The gateway is the payout-side bridge: audit intake, phase queries,
//! and the consume-once outcome extraction. Ledger ABI-encoding of the
//! outcome is the downstream caller's job; everything here is plain JSON.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use quorum_core::ParticipantId;
use quorum_service::Registry;

use crate::error::GatewayError;

// ── Shared state ─────────────────────────────────────────────────────────────

type SharedRegistry = Arc<Registry>;

// ── Request / response types ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateAuditBody {
    pub name: String,
    pub admin: String,
    pub bond: f64,
}

#[derive(Debug, Serialize)]
pub struct CreateAuditResponse {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub phase: String,
}

/// Parallel payout lists; both empty unless this is the first retrieval
/// of an audit in `AWAITING_PAYOUT`.
#[derive(Debug, Serialize)]
pub struct OutcomeResponse {
    pub addresses: Vec<String>,
    pub amounts: Vec<u64>,
}

// ── Router ────────────────────────────────────────────────────────────────────

/// Build the application router with the given registry.
pub fn create_router(registry: SharedRegistry) -> Router {
    Router::new()
        .route("/v1/audits", post(create_audit))
        .route("/v1/audits", delete(clear_audits))
        .route("/v1/audits/{name}/state", get(audit_state))
        .route("/v1/audits/{name}/outcome", post(audit_outcome))
        .route("/health", get(health))
        .with_state(registry)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// `GET /health` — liveness probe.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({"status": "ok"})))
}

/// `POST /v1/audits` — create an audit and spawn its actor.
///
/// # Errors
/// Returns [`GatewayError::InvalidRequest`] for an empty name or a
/// non-finite/negative bond, and 409 via the service layer for a
/// duplicate name.
pub async fn create_audit(
    State(registry): State<SharedRegistry>,
    Json(body): Json<CreateAuditBody>,
) -> Result<impl IntoResponse, GatewayError> {
    if body.name.trim().is_empty() {
        return Err(GatewayError::InvalidRequest("audit name must not be empty".to_owned()));
    }
    if !body.bond.is_finite() || body.bond < 0.0 {
        return Err(GatewayError::InvalidRequest(format!(
            "bond {} must be finite and >= 0",
            body.bond
        )));
    }
    let handle =
        registry.create_audit(&body.name, ParticipantId::new(body.admin), body.bond)?;
    Ok((StatusCode::CREATED, Json(CreateAuditResponse { name: handle.name().to_owned() })))
}

/// `DELETE /v1/audits` — drop every audit (test and operator support).
pub async fn clear_audits(State(registry): State<SharedRegistry>) -> impl IntoResponse {
    registry.clear();
    StatusCode::NO_CONTENT
}

/// `GET /v1/audits/:name/state` — current lifecycle phase.
///
/// # Errors
/// 404 via the service layer if the name is unknown.
pub async fn audit_state(
    State(registry): State<SharedRegistry>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let phase = registry.phase(&name).await?;
    Ok(Json(StateResponse { phase: phase.to_string() }))
}

/// `POST /v1/audits/:name/outcome` — consume-once payout extraction.
///
/// The first call while the audit is in `AWAITING_PAYOUT` returns the
/// full parallel lists and finalizes the audit; every other call —
/// earlier phases included — returns two empty lists. POST, not GET:
/// retrieval mutates.
///
/// # Errors
/// 404 via the service layer if the name is unknown.
pub async fn audit_outcome(
    State(registry): State<SharedRegistry>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let (addresses, amounts) = registry.get_outcome(&name).await?;
    Ok(Json(OutcomeResponse {
        addresses: addresses.into_iter().map(|a| a.0).collect(),
        amounts,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use quorum_service::NullNotifier;
    use tower::ServiceExt;

    fn test_registry() -> SharedRegistry {
        Arc::new(Registry::new(Arc::new(NullNotifier)))
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        match Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
        {
            Ok(r) => r,
            Err(e) => panic!("failed to build request: {e}"),
        }
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = match axum::body::to_bytes(resp.into_body(), 64 * 1024).await {
            Ok(b) => b,
            Err(e) => panic!("failed to read body: {e}"),
        };
        match serde_json::from_slice(&bytes) {
            Ok(v) => v,
            Err(e) => panic!("invalid JSON: {e}"),
        }
    }

    #[tokio::test]
    async fn health_returns_ok_with_status_field() {
        let app = create_router(test_registry());
        let req = match Request::builder().uri("/health").body(Body::empty()) {
            Ok(r) => r,
            Err(e) => panic!("failed to build request: {e}"),
        };
        let resp = match app.oneshot(req).await {
            Ok(r) => r,
            Err(e) => panic!("handler error: {e}"),
        };
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn create_audit_returns_201_then_409_on_duplicate() {
        let registry = test_registry();
        let payload = serde_json::json!({"name": "vault", "admin": "admin@q", "bond": 90.0});

        let app = create_router(registry.clone());
        let resp = match app.oneshot(post_json("/v1/audits", payload.clone())).await {
            Ok(r) => r,
            Err(e) => panic!("handler error: {e}"),
        };
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = body_json(resp).await;
        assert_eq!(body["name"], "vault");

        let app = create_router(registry);
        let resp = match app.oneshot(post_json("/v1/audits", payload)).await {
            Ok(r) => r,
            Err(e) => panic!("handler error: {e}"),
        };
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn create_audit_rejects_bad_bodies() {
        let app = create_router(test_registry());
        let resp = match app
            .oneshot(post_json(
                "/v1/audits",
                serde_json::json!({"name": "  ", "admin": "a@q", "bond": 1.0}),
            ))
            .await
        {
            Ok(r) => r,
            Err(e) => panic!("handler error: {e}"),
        };
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let app = create_router(test_registry());
        let resp = match app
            .oneshot(post_json(
                "/v1/audits",
                serde_json::json!({"name": "vault", "admin": "a@q", "bond": -5.0}),
            ))
            .await
        {
            Ok(r) => r,
            Err(e) => panic!("handler error: {e}"),
        };
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn state_of_unknown_audit_is_404() {
        let app = create_router(test_registry());
        let req = match Request::builder().uri("/v1/audits/ghost/state").body(Body::empty()) {
            Ok(r) => r,
            Err(e) => panic!("failed to build request: {e}"),
        };
        let resp = match app.oneshot(req).await {
            Ok(r) => r,
            Err(e) => panic!("handler error: {e}"),
        };
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn fresh_audit_reports_initialization_and_empty_outcome() {
        let registry = test_registry();
        registry
            .create_audit("vault", ParticipantId::new("admin@q"), 90.0)
            .unwrap_or_else(|e| panic!("create failed: {e}"));

        let app = create_router(registry.clone());
        let req = match Request::builder().uri("/v1/audits/vault/state").body(Body::empty()) {
            Ok(r) => r,
            Err(e) => panic!("failed to build request: {e}"),
        };
        let resp = match app.oneshot(req).await {
            Ok(r) => r,
            Err(e) => panic!("handler error: {e}"),
        };
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["phase"], "INITIALIZATION");

        // Not in AWAITING_PAYOUT: outcome is empty, not an error.
        let app = create_router(registry);
        let resp = match app
            .oneshot(post_json("/v1/audits/vault/outcome", serde_json::json!({})))
            .await
        {
            Ok(r) => r,
            Err(e) => panic!("handler error: {e}"),
        };
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["addresses"], serde_json::json!([]));
        assert_eq!(body["amounts"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn clear_empties_the_registry() {
        let registry = test_registry();
        registry
            .create_audit("vault", ParticipantId::new("admin@q"), 1.0)
            .unwrap_or_else(|e| panic!("create failed: {e}"));

        let app = create_router(registry.clone());
        let req = match Request::builder()
            .method("DELETE")
            .uri("/v1/audits")
            .body(Body::empty())
        {
            Ok(r) => r,
            Err(e) => panic!("failed to build request: {e}"),
        };
        let resp = match app.oneshot(req).await {
            Ok(r) => r,
            Err(e) => panic!("handler error: {e}"),
        };
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert!(registry.is_empty());
    }
}
