use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use super::domain::{Discount, RedemptionClaim, ScholarshipError};
use super::repository::ScholarshipRepository;
use super::service::ScholarshipRedemptionEngine;
use crate::catalog::ProgramId;
use crate::enrollment::StudentId;
use crate::events::EventPublisher;

/// Router builder exposing HTTP endpoints for redemption and code administration.
pub fn scholarship_router<S, E>(service: Arc<ScholarshipRedemptionEngine<S, E>>) -> Router
where
    S: ScholarshipRepository + 'static,
    E: EventPublisher + 'static,
{
    Router::new()
        .route("/api/v1/scholarships/redeem", post(redeem_handler::<S, E>))
        .route("/api/v1/scholarships/bulk", post(bulk_handler::<S, E>))
        .route("/api/v1/scholarships", post(create_handler::<S, E>))
        .route(
            "/api/v1/scholarships/:code/revoke",
            post(revoke_handler::<S, E>),
        )
        .route(
            "/api/v1/programs/:program_id/scholarships/stats",
            get(stats_handler::<S, E>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct RedeemRequest {
    pub(crate) code: String,
    pub(crate) student_id: StudentId,
    #[serde(default)]
    pub(crate) student_email: Option<String>,
    pub(crate) program_id: ProgramId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BulkCreateRequest {
    pub(crate) program_id: ProgramId,
    pub(crate) quantity: usize,
    #[serde(flatten)]
    pub(crate) discount: Discount,
    #[serde(default)]
    pub(crate) expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateRequest {
    pub(crate) program_id: ProgramId,
    #[serde(flatten)]
    pub(crate) discount: Discount,
    #[serde(default)]
    pub(crate) expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub(crate) bound_email: Option<String>,
}

pub(crate) async fn redeem_handler<S, E>(
    State(service): State<Arc<ScholarshipRedemptionEngine<S, E>>>,
    axum::Json(request): axum::Json<RedeemRequest>,
) -> Response
where
    S: ScholarshipRepository + 'static,
    E: EventPublisher + 'static,
{
    let claim = RedemptionClaim {
        student_id: request.student_id,
        student_email: request.student_email,
        program_id: request.program_id,
        now: Utc::now(),
    };

    match service.redeem(&request.code, claim) {
        Ok(receipt) => (StatusCode::OK, axum::Json(receipt)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn bulk_handler<S, E>(
    State(service): State<Arc<ScholarshipRedemptionEngine<S, E>>>,
    axum::Json(request): axum::Json<BulkCreateRequest>,
) -> Response
where
    S: ScholarshipRepository + 'static,
    E: EventPublisher + 'static,
{
    let now = Utc::now();
    match service.bulk_create(
        request.program_id,
        request.quantity,
        request.discount,
        request.expires_at,
        now,
    ) {
        Ok(created) => {
            let views: Vec<_> = created
                .iter()
                .map(|scholarship| scholarship.status_view(now))
                .collect();
            (StatusCode::CREATED, axum::Json(views)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_handler<S, E>(
    State(service): State<Arc<ScholarshipRedemptionEngine<S, E>>>,
    axum::Json(request): axum::Json<CreateRequest>,
) -> Response
where
    S: ScholarshipRepository + 'static,
    E: EventPublisher + 'static,
{
    let now = Utc::now();
    match service.create(
        request.program_id,
        request.discount,
        request.expires_at,
        request.bound_email,
        now,
    ) {
        Ok(created) => (StatusCode::CREATED, axum::Json(created.status_view(now))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn revoke_handler<S, E>(
    State(service): State<Arc<ScholarshipRedemptionEngine<S, E>>>,
    Path(code): Path<String>,
) -> Response
where
    S: ScholarshipRepository + 'static,
    E: EventPublisher + 'static,
{
    match service.revoke(&code) {
        Ok(revoked) => (StatusCode::OK, axum::Json(revoked.status_view(Utc::now()))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn stats_handler<S, E>(
    State(service): State<Arc<ScholarshipRedemptionEngine<S, E>>>,
    Path(program_id): Path<String>,
) -> Response
where
    S: ScholarshipRepository + 'static,
    E: EventPublisher + 'static,
{
    match service.stats(&ProgramId(program_id), Utc::now()) {
        Ok(stats) => (StatusCode::OK, axum::Json(stats)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) fn error_response(error: ScholarshipError) -> Response {
    let status = match &error {
        ScholarshipError::NotFound => StatusCode::NOT_FOUND,
        ScholarshipError::AlreadyUsed => StatusCode::CONFLICT,
        ScholarshipError::Expired { .. }
        | ScholarshipError::Revoked
        | ScholarshipError::ProgramMismatch
        | ScholarshipError::EmailMismatch => StatusCode::PAYMENT_REQUIRED,
        ScholarshipError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ScholarshipError::Repository(_) | ScholarshipError::Event(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let body = json!({
        "kind": error.kind(),
        "error": error.to_string(),
    });
    (status, axum::Json(body)).into_response()
}
