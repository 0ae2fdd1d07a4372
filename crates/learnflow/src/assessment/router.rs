use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{patch, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::domain::{AnswerInput, SubmissionId};
use super::repository::SubmissionRepository;
use super::service::{GradingEngine, GradingError};
use crate::catalog::AssessmentId;
use crate::enrollment::{EnrollmentRepository, StudentId};
use crate::events::EventPublisher;

/// Router builder exposing HTTP endpoints for submission and grading.
pub fn assessment_router<B, R, E>(service: Arc<GradingEngine<B, R, E>>) -> Router
where
    B: SubmissionRepository + 'static,
    R: EnrollmentRepository + 'static,
    E: EventPublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/assessments/:assessment_id/submissions",
            post(submit_handler::<B, R, E>),
        )
        .route(
            "/api/v1/assessments/:assessment_id/drafts",
            post(draft_handler::<B, R, E>),
        )
        .route(
            "/api/v1/submissions/:submission_id/grade",
            patch(grade_handler::<B, R, E>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitRequest {
    pub(crate) student_id: StudentId,
    pub(crate) answers: Vec<AnswerInput>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GradeRequest {
    pub(crate) score: f64,
    #[serde(default)]
    pub(crate) feedback: Option<String>,
    #[serde(default)]
    pub(crate) regrade: bool,
}

pub(crate) async fn submit_handler<B, R, E>(
    State(service): State<Arc<GradingEngine<B, R, E>>>,
    Path(assessment_id): Path<String>,
    axum::Json(request): axum::Json<SubmitRequest>,
) -> Response
where
    B: SubmissionRepository + 'static,
    R: EnrollmentRepository + 'static,
    E: EventPublisher + 'static,
{
    match service.submit(
        &AssessmentId(assessment_id),
        &request.student_id,
        request.answers,
        Utc::now(),
    ) {
        Ok(submission) => {
            (StatusCode::CREATED, axum::Json(submission.status_view())).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn draft_handler<B, R, E>(
    State(service): State<Arc<GradingEngine<B, R, E>>>,
    Path(assessment_id): Path<String>,
    axum::Json(request): axum::Json<SubmitRequest>,
) -> Response
where
    B: SubmissionRepository + 'static,
    R: EnrollmentRepository + 'static,
    E: EventPublisher + 'static,
{
    match service.save_draft(
        &AssessmentId(assessment_id),
        &request.student_id,
        request.answers,
    ) {
        Ok(submission) => {
            (StatusCode::ACCEPTED, axum::Json(submission.status_view())).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn grade_handler<B, R, E>(
    State(service): State<Arc<GradingEngine<B, R, E>>>,
    Path(submission_id): Path<String>,
    axum::Json(request): axum::Json<GradeRequest>,
) -> Response
where
    B: SubmissionRepository + 'static,
    R: EnrollmentRepository + 'static,
    E: EventPublisher + 'static,
{
    match service.grade(
        &SubmissionId(submission_id),
        request.score,
        request.feedback,
        request.regrade,
        Utc::now(),
    ) {
        Ok(submission) => (StatusCode::OK, axum::Json(submission.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) fn error_response(error: GradingError) -> Response {
    let status = match &error {
        GradingError::AssessmentNotFound | GradingError::SubmissionNotFound => {
            StatusCode::NOT_FOUND
        }
        GradingError::AlreadyGraded => StatusCode::CONFLICT,
        GradingError::AttemptLimitReached { .. }
        | GradingError::Answers(_)
        | GradingError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        GradingError::Progress(_) | GradingError::Repository(_) | GradingError::Event(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let body = json!({
        "kind": error.kind(),
        "error": error.to_string(),
    });
    (status, axum::Json(body)).into_response()
}
