use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{EnrollmentId, EnrollmentStatus, LessonProgress};
use super::repository::{EnrollmentRepository, EnrollmentView};
use super::service::{EnrollmentError, EnrollmentService, EnrollRequest, OverrideRequest};
use crate::assessment::SubmissionRepository;
use crate::catalog::LessonId;
use crate::events::EventPublisher;
use crate::progress::ProgramProgress;
use crate::scholarship::router::error_response as scholarship_error_response;
use crate::scholarship::{RedemptionReceipt, ScholarshipRepository};

/// Router builder exposing HTTP endpoints for enrollment and lesson progress.
pub fn enrollment_router<R, B, S, E>(service: Arc<EnrollmentService<R, B, S, E>>) -> Router
where
    R: EnrollmentRepository + 'static,
    B: SubmissionRepository + 'static,
    S: ScholarshipRepository + 'static,
    E: EventPublisher + 'static,
{
    Router::new()
        .route("/api/v1/enrollments", post(enroll_handler::<R, B, S, E>))
        .route(
            "/api/v1/enrollments/:enrollment_id",
            get(fetch_handler::<R, B, S, E>),
        )
        .route(
            "/api/v1/enrollments/:enrollment_id/status",
            patch(transition_handler::<R, B, S, E>),
        )
        .route(
            "/api/v1/enrollments/:enrollment_id/lessons/:lesson_id/start",
            post(start_lesson_handler::<R, B, S, E>),
        )
        .route(
            "/api/v1/enrollments/:enrollment_id/lessons/:lesson_id/complete",
            post(complete_lesson_handler::<R, B, S, E>),
        )
        .route(
            "/api/v1/enrollments/:enrollment_id/progress",
            get(progress_handler::<R, B, S, E>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct TransitionRequest {
    pub(crate) status: EnrollmentStatus,
    #[serde(default, rename = "override")]
    pub(crate) override_request: Option<OverrideRequest>,
}

#[derive(Debug, Serialize)]
pub(crate) struct EnrollResponse {
    pub(crate) enrollment: EnrollmentView,
    pub(crate) amount_due_cents: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) redemption: Option<RedemptionReceipt>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LessonResponse {
    pub(crate) lesson: LessonProgress,
    pub(crate) report: ProgramProgress,
}

pub(crate) async fn enroll_handler<R, B, S, E>(
    State(service): State<Arc<EnrollmentService<R, B, S, E>>>,
    axum::Json(request): axum::Json<EnrollRequest>,
) -> Response
where
    R: EnrollmentRepository + 'static,
    B: SubmissionRepository + 'static,
    S: ScholarshipRepository + 'static,
    E: EventPublisher + 'static,
{
    match service.enroll(request, Utc::now()) {
        Ok(outcome) => {
            let response = EnrollResponse {
                enrollment: outcome.record.status_view(),
                amount_due_cents: outcome.amount_due_cents,
                redemption: outcome.redemption,
            };
            (StatusCode::CREATED, axum::Json(response)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn fetch_handler<R, B, S, E>(
    State(service): State<Arc<EnrollmentService<R, B, S, E>>>,
    Path(enrollment_id): Path<String>,
) -> Response
where
    R: EnrollmentRepository + 'static,
    B: SubmissionRepository + 'static,
    S: ScholarshipRepository + 'static,
    E: EventPublisher + 'static,
{
    match service.fetch(&EnrollmentId(enrollment_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn transition_handler<R, B, S, E>(
    State(service): State<Arc<EnrollmentService<R, B, S, E>>>,
    Path(enrollment_id): Path<String>,
    axum::Json(request): axum::Json<TransitionRequest>,
) -> Response
where
    R: EnrollmentRepository + 'static,
    B: SubmissionRepository + 'static,
    S: ScholarshipRepository + 'static,
    E: EventPublisher + 'static,
{
    match service.transition(
        &EnrollmentId(enrollment_id),
        request.status,
        request.override_request,
        Utc::now(),
    ) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn start_lesson_handler<R, B, S, E>(
    State(service): State<Arc<EnrollmentService<R, B, S, E>>>,
    Path((enrollment_id, lesson_id)): Path<(String, String)>,
) -> Response
where
    R: EnrollmentRepository + 'static,
    B: SubmissionRepository + 'static,
    S: ScholarshipRepository + 'static,
    E: EventPublisher + 'static,
{
    match service.start_lesson(
        &EnrollmentId(enrollment_id),
        &LessonId(lesson_id),
        Utc::now(),
    ) {
        Ok(outcome) => lesson_response(outcome.lesson, outcome.report),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn complete_lesson_handler<R, B, S, E>(
    State(service): State<Arc<EnrollmentService<R, B, S, E>>>,
    Path((enrollment_id, lesson_id)): Path<(String, String)>,
) -> Response
where
    R: EnrollmentRepository + 'static,
    B: SubmissionRepository + 'static,
    S: ScholarshipRepository + 'static,
    E: EventPublisher + 'static,
{
    match service.complete_lesson(
        &EnrollmentId(enrollment_id),
        &LessonId(lesson_id),
        Utc::now(),
    ) {
        Ok(outcome) => lesson_response(outcome.lesson, outcome.report),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn progress_handler<R, B, S, E>(
    State(service): State<Arc<EnrollmentService<R, B, S, E>>>,
    Path(enrollment_id): Path<String>,
) -> Response
where
    R: EnrollmentRepository + 'static,
    B: SubmissionRepository + 'static,
    S: ScholarshipRepository + 'static,
    E: EventPublisher + 'static,
{
    match service.progress_report(&EnrollmentId(enrollment_id)) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

fn lesson_response(lesson: LessonProgress, report: ProgramProgress) -> Response {
    (StatusCode::OK, axum::Json(LessonResponse { lesson, report })).into_response()
}

pub(crate) fn error_response(error: EnrollmentError) -> Response {
    // Redemption failures keep their own status mapping (402/409-class).
    let error = match error {
        EnrollmentError::Scholarship(inner) => return scholarship_error_response(inner),
        other => other,
    };

    let status = match &error {
        EnrollmentError::NotFound
        | EnrollmentError::ProgramNotFound(_)
        | EnrollmentError::LessonNotFound(_) => StatusCode::NOT_FOUND,
        EnrollmentError::InvalidTransition { .. }
        | EnrollmentError::IncompleteProgress { .. }
        | EnrollmentError::AlreadyEnrolled => StatusCode::CONFLICT,
        EnrollmentError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EnrollmentError::Scholarship(_)
        | EnrollmentError::Progress(_)
        | EnrollmentError::Repository(_)
        | EnrollmentError::Event(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let body = json!({
        "kind": error.kind(),
        "error": error.to_string(),
    });
    (status, axum::Json(body)).into_response()
}
