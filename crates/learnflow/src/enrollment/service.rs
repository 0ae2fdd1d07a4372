use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    CompletionOverride, Enrollment, EnrollmentId, EnrollmentStatus, LessonProgress, StudentId,
};
use super::repository::{blocks_reenrollment, EnrollmentRecord, EnrollmentRepository};
use crate::assessment::SubmissionRepository;
use crate::catalog::{CatalogStore, LessonId, ProgramId};
use crate::config::LearningPolicy;
use crate::events::{EventError, EventPublisher, LearningEvent};
use crate::progress::{lesson_gate_clear, ProgramProgress, ProgressError, ProgressTracker};
use crate::scholarship::{
    RedemptionClaim, RedemptionReceipt, ScholarshipError, ScholarshipRedemptionEngine,
    ScholarshipRepository,
};
use crate::storage::RepositoryError;

static ENROLLMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_enrollment_id() -> EnrollmentId {
    let id = ENROLLMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    EnrollmentId(format!("enr-{id:06}"))
}

/// Inbound enrollment intent. Identity fields come from the authentication
/// collaborator; the scholarship code is redeemed before anything is created.
#[derive(Debug, Clone, Deserialize)]
pub struct EnrollRequest {
    pub student_id: StudentId,
    #[serde(default)]
    pub student_email: Option<String>,
    pub program_id: ProgramId,
    #[serde(default)]
    pub scholarship_code: Option<String>,
    #[serde(default)]
    pub cohort: Option<String>,
}

/// Admin escape hatch for forcing COMPLETED below 100% progress. Recorded on the
/// enrollment and echoed in the emitted event so the bypass stays auditable.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OverrideRequest {
    pub actor: String,
    pub reason: String,
}

/// Result of a successful enrollment: the stored record plus what the payment
/// collaborator should charge.
#[derive(Debug)]
pub struct EnrollmentOutcome {
    pub record: EnrollmentRecord,
    pub amount_due_cents: u64,
    pub redemption: Option<RedemptionReceipt>,
}

/// Result of a lesson progress write: the mutated record and the fresh roll-up.
#[derive(Debug)]
pub struct LessonOutcome {
    pub lesson: LessonProgress,
    pub report: ProgramProgress,
}

/// Typed rejection reasons for lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum EnrollmentError {
    #[error("enrollment not found")]
    NotFound,
    #[error("program '{0}' not found")]
    ProgramNotFound(String),
    #[error("lesson '{0}' is not part of the enrolled program")]
    LessonNotFound(String),
    #[error("illegal enrollment transition {} -> {}", .from.label(), .to.label())]
    InvalidTransition {
        from: EnrollmentStatus,
        to: EnrollmentStatus,
    },
    #[error("program completion is {percentage:.1}%; completing requires 100%")]
    IncompleteProgress { percentage: f64 },
    #[error("student already has a current enrollment in this program")]
    AlreadyEnrolled,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Scholarship(#[from] ScholarshipError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Event(#[from] EventError),
}

impl EnrollmentError {
    pub fn kind(&self) -> &'static str {
        match self {
            EnrollmentError::NotFound
            | EnrollmentError::ProgramNotFound(_)
            | EnrollmentError::LessonNotFound(_) => "not_found",
            EnrollmentError::InvalidTransition { .. } => "invalid_transition",
            EnrollmentError::IncompleteProgress { .. } => "incomplete_progress",
            EnrollmentError::AlreadyEnrolled => "already_enrolled",
            EnrollmentError::Validation(_) => "validation_error",
            EnrollmentError::Scholarship(error) => error.kind(),
            EnrollmentError::Progress(_) | EnrollmentError::Repository(_) => "storage_failure",
            EnrollmentError::Event(_) => "event_failure",
        }
    }
}

/// Owns the enrollment lifecycle: creation (with the scholarship precondition),
/// status transitions validated against stored state, and monotonic lesson progress
/// writes that trigger re-aggregation.
pub struct EnrollmentService<R, B, S, E> {
    catalog: Arc<CatalogStore>,
    repository: Arc<R>,
    progress: Arc<ProgressTracker<R, B>>,
    scholarships: Arc<ScholarshipRedemptionEngine<S, E>>,
    events: Arc<E>,
    policy: LearningPolicy,
}

impl<R, B, S, E> EnrollmentService<R, B, S, E>
where
    R: EnrollmentRepository + 'static,
    B: SubmissionRepository + 'static,
    S: ScholarshipRepository + 'static,
    E: EventPublisher + 'static,
{
    pub fn new(
        catalog: Arc<CatalogStore>,
        repository: Arc<R>,
        progress: Arc<ProgressTracker<R, B>>,
        scholarships: Arc<ScholarshipRedemptionEngine<S, E>>,
        events: Arc<E>,
        policy: LearningPolicy,
    ) -> Self {
        Self {
            catalog,
            repository,
            progress,
            scholarships,
            events,
            policy,
        }
    }

    /// Register a student in a program. A supplied scholarship code is redeemed
    /// first; any redemption failure aborts before the enrollment exists.
    pub fn enroll(
        &self,
        request: EnrollRequest,
        now: DateTime<Utc>,
    ) -> Result<EnrollmentOutcome, EnrollmentError> {
        let program = self
            .catalog
            .program(&request.program_id)
            .ok_or_else(|| EnrollmentError::ProgramNotFound(request.program_id.0.clone()))?;

        if let Some(existing) = self
            .repository
            .find_current(&request.student_id, &request.program_id)?
        {
            if blocks_reenrollment(existing.enrollment.status) {
                return Err(EnrollmentError::AlreadyEnrolled);
            }
        }

        let redemption = match &request.scholarship_code {
            Some(code) => Some(self.scholarships.redeem(
                code,
                RedemptionClaim {
                    student_id: request.student_id.clone(),
                    student_email: request.student_email.clone(),
                    program_id: request.program_id.clone(),
                    now,
                },
            )?),
            None => None,
        };
        let amount_due_cents = redemption
            .as_ref()
            .map(|receipt| receipt.discounted_price_cents)
            .unwrap_or(program.price_cents);

        let status = if self.policy.approval_gate {
            EnrollmentStatus::Pending
        } else {
            EnrollmentStatus::Active
        };

        let enrollment = Enrollment {
            id: next_enrollment_id(),
            student_id: request.student_id.clone(),
            program_id: request.program_id.clone(),
            status,
            cohort: request.cohort,
            enrolled_at: now,
            completed_at: None,
            completion_override: None,
            course_progress: program
                .courses
                .iter()
                .map(|course_id| (course_id.clone(), 0.0))
                .collect(),
        };

        let record = self.repository.insert(EnrollmentRecord::new(enrollment))?;
        tracing::info!(
            enrollment = %record.enrollment.id.0,
            program = %request.program_id.0,
            status = record.enrollment.status.label(),
            "enrollment created"
        );

        let mut event = LearningEvent::new("enrollment_created", request.student_id)
            .detail("enrollment_id", record.enrollment.id.0.clone())
            .detail("program_id", request.program_id.0.clone())
            .detail("status", record.enrollment.status.label())
            .detail("amount_due_cents", amount_due_cents.to_string());
        if let Some(receipt) = &redemption {
            event = event.detail("scholarship_code", receipt.code.clone());
        }
        self.events.publish(event)?;

        Ok(EnrollmentOutcome {
            record,
            amount_due_cents,
            redemption,
        })
    }

    /// Move an enrollment along the lifecycle graph. The edge is validated against
    /// the status read from storage, never a caller-supplied previous state, and
    /// COMPLETED additionally requires full program progress unless an audited
    /// override accompanies the request.
    pub fn transition(
        &self,
        id: &EnrollmentId,
        target: EnrollmentStatus,
        override_request: Option<OverrideRequest>,
        now: DateTime<Utc>,
    ) -> Result<EnrollmentRecord, EnrollmentError> {
        let mut record = self.repository.fetch(id)?.ok_or(EnrollmentError::NotFound)?;
        let from = record.enrollment.status;

        if !from.permits(target) {
            return Err(EnrollmentError::InvalidTransition { from, to: target });
        }

        let mut applied_override = None;
        if target == EnrollmentStatus::Completed {
            let report = self.progress.evaluate(&record)?;
            if report.is_complete() {
                record.enrollment.course_progress = report.course_snapshot();
            } else {
                match override_request {
                    Some(override_request) => {
                        applied_override = Some(CompletionOverride {
                            actor: override_request.actor,
                            reason: override_request.reason,
                            at: now,
                        });
                    }
                    None => {
                        return Err(EnrollmentError::IncompleteProgress {
                            percentage: report.percentage,
                        });
                    }
                }
            }
        }

        record.enrollment.status = target;
        record.enrollment.completed_at = (target == EnrollmentStatus::Completed).then_some(now);
        if let Some(applied) = &applied_override {
            record.enrollment.completion_override = Some(applied.clone());
        }
        self.repository.update(record.clone())?;

        tracing::info!(
            enrollment = %id.0,
            from = from.label(),
            to = target.label(),
            overridden = applied_override.is_some(),
            "enrollment transitioned"
        );

        let mut event =
            LearningEvent::new("enrollment_status_changed", record.enrollment.student_id.clone())
                .detail("enrollment_id", id.0.clone())
                .detail("from", from.label())
                .detail("to", target.label());
        if let Some(applied) = &applied_override {
            event = event
                .detail("override_actor", applied.actor.clone())
                .detail("override_reason", applied.reason.clone());
        }
        self.events.publish(event)?;

        // Every transition triggers a recompute so snapshots and cache stay current.
        self.progress.recompute(id)?;
        let record = self.repository.fetch(id)?.ok_or(EnrollmentError::NotFound)?;
        Ok(record)
    }

    /// Mark a lesson started. Idempotent past the first call; gated by earlier
    /// required modules unless the lesson is a preview.
    pub fn start_lesson(
        &self,
        id: &EnrollmentId,
        lesson_id: &LessonId,
        now: DateTime<Utc>,
    ) -> Result<LessonOutcome, EnrollmentError> {
        self.write_lesson(id, lesson_id, now, LessonWrite::Start)
    }

    /// Mark a lesson completed. Idempotent; a completed lesson never regresses.
    pub fn complete_lesson(
        &self,
        id: &EnrollmentId,
        lesson_id: &LessonId,
        now: DateTime<Utc>,
    ) -> Result<LessonOutcome, EnrollmentError> {
        self.write_lesson(id, lesson_id, now, LessonWrite::Complete)
    }

    /// Read-side progress report, served through the tracker's cache.
    pub fn progress_report(&self, id: &EnrollmentId) -> Result<ProgramProgress, EnrollmentError> {
        self.progress.report(id).map_err(|error| match error {
            ProgressError::EnrollmentNotFound => EnrollmentError::NotFound,
            other => EnrollmentError::Progress(other),
        })
    }

    pub fn fetch(&self, id: &EnrollmentId) -> Result<EnrollmentRecord, EnrollmentError> {
        self.repository.fetch(id)?.ok_or(EnrollmentError::NotFound)
    }

    fn write_lesson(
        &self,
        id: &EnrollmentId,
        lesson_id: &LessonId,
        now: DateTime<Utc>,
        write: LessonWrite,
    ) -> Result<LessonOutcome, EnrollmentError> {
        let mut record = self.repository.fetch(id)?.ok_or(EnrollmentError::NotFound)?;

        if record.enrollment.status != EnrollmentStatus::Active {
            return Err(EnrollmentError::Validation(format!(
                "lesson progress requires an ACTIVE enrollment (status is {})",
                record.enrollment.status.label()
            )));
        }

        let ancestry = self
            .catalog
            .lesson_ancestry(lesson_id)
            .filter(|ancestry| ancestry.program.id == record.enrollment.program_id)
            .ok_or_else(|| EnrollmentError::LessonNotFound(lesson_id.0.clone()))?;

        if !ancestry.lesson.is_preview {
            let facts = self.progress.facts_for(&record)?;
            if !lesson_gate_clear(&self.catalog, ancestry.course, &ancestry.module.id, &facts) {
                return Err(EnrollmentError::Validation(
                    "lesson is locked until earlier required modules are complete".to_string(),
                ));
            }
        }

        let student_id = record.enrollment.student_id.clone();
        let entry = record
            .lessons
            .entry(lesson_id.clone())
            .or_insert_with(|| LessonProgress::new(lesson_id.clone()));
        let changed = match write {
            LessonWrite::Start => entry.start(now),
            LessonWrite::Complete => entry.complete(now),
        };
        let lesson = entry.clone();

        if changed {
            self.repository.update(record)?;
            let template = match write {
                LessonWrite::Start => "lesson_started",
                LessonWrite::Complete => "lesson_completed",
            };
            self.events.publish(
                LearningEvent::new(template, student_id)
                    .detail("enrollment_id", id.0.clone())
                    .detail("lesson_id", lesson_id.0.clone()),
            )?;
        }

        // Recomputing from the same facts twice is harmless; percentages derive
        // from durable records, not counters.
        let report = self.progress.recompute(id)?;
        Ok(LessonOutcome { lesson, report })
    }
}

enum LessonWrite {
    Start,
    Complete,
}
