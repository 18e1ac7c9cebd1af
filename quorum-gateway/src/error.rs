//! Error types for the gateway crate.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use quorum_core::AuditError;
use quorum_service::ServiceError;

/// Errors that can occur during gateway request handling.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GatewayError {
    /// An error propagated from the service layer.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// The request body is malformed or contains invalid values.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            GatewayError::Service(ServiceError::Audit(audit_error)) => match audit_error {
                AuditError::DuplicateAudit(_) | AuditError::DuplicateAuditor(_) => {
                    StatusCode::CONFLICT
                }
                AuditError::UnknownAudit(_)
                | AuditError::UnknownAuditor(_)
                | AuditError::UnknownItem { .. } => StatusCode::NOT_FOUND,
                AuditError::Configuration { .. } | AuditError::InvalidAnswer(_) => {
                    StatusCode::BAD_REQUEST
                }
                // Phase guards and incomplete audits: the request was
                // well-formed but the state refuses it.
                _ => StatusCode::UNPROCESSABLE_ENTITY,
            },
            GatewayError::Service(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };
        (status, Json(json!({"error": self.to_string()}))).into_response()
    }
}
