use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::domain::{
    AnswerInput, AnswerRecord, Submission, SubmissionId, SubmissionStatus,
};
use super::grading::{
    auto_grade, objective_score, percentage_of, validate_answers, AnswerValidationError,
};
use super::repository::SubmissionRepository;
use crate::catalog::{Assessment, AssessmentId, CatalogStore};
use crate::config::LearningPolicy;
use crate::enrollment::{EnrollmentRepository, StudentId};
use crate::events::{EventError, EventPublisher, LearningEvent};
use crate::progress::{ProgressError, ProgressTracker};
use crate::storage::RepositoryError;

static SUBMISSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_submission_id() -> SubmissionId {
    let id = SUBMISSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SubmissionId(format!("sub-{id:06}"))
}

/// Typed rejection reasons for submission and grading operations.
#[derive(Debug, thiserror::Error)]
pub enum GradingError {
    #[error("assessment not found")]
    AssessmentNotFound,
    #[error("submission not found")]
    SubmissionNotFound,
    #[error("submission is already graded")]
    AlreadyGraded,
    #[error("attempt limit of {limit} reached for this assessment")]
    AttemptLimitReached { limit: u32 },
    #[error(transparent)]
    Answers(#[from] AnswerValidationError),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Event(#[from] EventError),
}

impl GradingError {
    pub fn kind(&self) -> &'static str {
        match self {
            GradingError::AssessmentNotFound | GradingError::SubmissionNotFound => "not_found",
            GradingError::AlreadyGraded => "already_graded",
            GradingError::AttemptLimitReached { .. }
            | GradingError::Answers(_)
            | GradingError::Validation(_) => "validation_error",
            GradingError::Progress(_) | GradingError::Repository(_) => "storage_failure",
            GradingError::Event(_) => "event_failure",
        }
    }
}

/// Grades submissions: validates answer shape, auto-scores objective items at submit
/// time, closes fully-objective submissions immediately, and accepts instructor
/// scores for the rest. Grading feeds the progress aggregator.
pub struct GradingEngine<B, R, E> {
    catalog: Arc<CatalogStore>,
    submissions: Arc<B>,
    enrollments: Arc<R>,
    progress: Arc<ProgressTracker<R, B>>,
    events: Arc<E>,
    policy: LearningPolicy,
}

impl<B, R, E> GradingEngine<B, R, E>
where
    B: SubmissionRepository + 'static,
    R: EnrollmentRepository + 'static,
    E: EventPublisher + 'static,
{
    pub fn new(
        catalog: Arc<CatalogStore>,
        submissions: Arc<B>,
        enrollments: Arc<R>,
        progress: Arc<ProgressTracker<R, B>>,
        events: Arc<E>,
        policy: LearningPolicy,
    ) -> Self {
        Self {
            catalog,
            submissions,
            enrollments,
            progress,
            events,
            policy,
        }
    }

    /// Park answers without turning them in. The draft occupies the next attempt
    /// slot and is replaced wholesale on each save.
    pub fn save_draft(
        &self,
        assessment_id: &AssessmentId,
        student_id: &StudentId,
        answers: Vec<AnswerInput>,
    ) -> Result<Submission, GradingError> {
        let assessment = self.published_assessment(assessment_id)?;
        validate_answers(assessment, &answers)?;

        let attempts = self.submissions.attempts(assessment_id, student_id)?;
        self.check_attempt_ceiling(&attempts)?;

        let records: Vec<AnswerRecord> = answers
            .into_iter()
            .map(|input| AnswerRecord {
                question_index: input.question_index,
                answer: input.answer,
                is_correct: None,
                points_earned: None,
            })
            .collect();

        match attempts.last().filter(|latest| latest.status == SubmissionStatus::Draft) {
            Some(draft) => {
                let mut updated = draft.clone();
                updated.answers = records;
                self.submissions.update(updated.clone())?;
                Ok(updated)
            }
            None => {
                let draft = Submission {
                    id: next_submission_id(),
                    assessment_id: assessment_id.clone(),
                    student_id: student_id.clone(),
                    attempt: next_attempt_number(&attempts),
                    status: SubmissionStatus::Draft,
                    answers: records,
                    score: None,
                    percentage: None,
                    submitted_at: None,
                    graded_at: None,
                    feedback: None,
                };
                Ok(self.submissions.insert(draft)?)
            }
        }
    }

    /// Turn in answers. Objective items are scored immediately; a fully-objective
    /// assessment goes straight to graded. Turning in after the end date succeeds
    /// and marks the submission late.
    pub fn submit(
        &self,
        assessment_id: &AssessmentId,
        student_id: &StudentId,
        answers: Vec<AnswerInput>,
        now: DateTime<Utc>,
    ) -> Result<Submission, GradingError> {
        let assessment = self.published_assessment(assessment_id)?;
        validate_answers(assessment, &answers)?;

        let attempts = self.submissions.attempts(assessment_id, student_id)?;
        self.check_attempt_ceiling(&attempts)?;

        let records = auto_grade(assessment, &answers);
        let late = assessment
            .end_date
            .map(|end_date| now > end_date)
            .unwrap_or(false);

        let (status, score, percentage, graded_at) = if assessment.is_fully_objective() {
            let score = objective_score(&records);
            let percentage = percentage_of(score, assessment.total_points());
            (SubmissionStatus::Graded, Some(score), Some(percentage), Some(now))
        } else if late {
            (SubmissionStatus::Late, None, None, None)
        } else {
            (SubmissionStatus::Submitted, None, None, None)
        };

        let reused_draft = attempts
            .last()
            .filter(|latest| latest.status == SubmissionStatus::Draft)
            .cloned();

        let submission = Submission {
            id: reused_draft
                .as_ref()
                .map(|draft| draft.id.clone())
                .unwrap_or_else(next_submission_id),
            assessment_id: assessment_id.clone(),
            student_id: student_id.clone(),
            attempt: reused_draft
                .as_ref()
                .map(|draft| draft.attempt)
                .unwrap_or_else(|| next_attempt_number(&attempts)),
            status,
            answers: records,
            score,
            percentage,
            submitted_at: Some(now),
            graded_at,
            feedback: None,
        };

        if reused_draft.is_some() {
            self.submissions.update(submission.clone())?;
        } else {
            self.submissions.insert(submission.clone())?;
        }

        tracing::info!(
            submission = %submission.id.0,
            assessment = %assessment_id.0,
            attempt = submission.attempt,
            status = submission.status.label(),
            "submission received"
        );

        if submission.is_graded() {
            self.after_grading(assessment, &submission, false)?;
        } else {
            self.events.publish(
                LearningEvent::new("submission_received", student_id.clone())
                    .detail("submission_id", submission.id.0.clone())
                    .detail("assessment_id", assessment_id.0.clone())
                    .detail("status", submission.status.label()),
            )?;
        }

        Ok(submission)
    }

    /// Instructor grading path. Re-grading an already-graded submission requires the
    /// explicit flag; the stored score is overwritten either way.
    pub fn grade(
        &self,
        submission_id: &SubmissionId,
        score: f64,
        feedback: Option<String>,
        regrade: bool,
        now: DateTime<Utc>,
    ) -> Result<Submission, GradingError> {
        let mut submission = self
            .submissions
            .fetch(submission_id)?
            .ok_or(GradingError::SubmissionNotFound)?;

        if submission.status == SubmissionStatus::Draft {
            return Err(GradingError::Validation(
                "draft submissions cannot be graded".to_string(),
            ));
        }
        if submission.is_graded() && !regrade {
            return Err(GradingError::AlreadyGraded);
        }

        let assessment = self
            .catalog
            .assessment(&submission.assessment_id)
            .ok_or(GradingError::AssessmentNotFound)?;
        let total_points = assessment.total_points();
        if !(0.0..=f64::from(total_points)).contains(&score) {
            return Err(GradingError::Validation(format!(
                "score must be between 0 and {total_points}"
            )));
        }

        submission.score = Some(score);
        submission.percentage = Some(percentage_of(score, total_points));
        submission.status = SubmissionStatus::Graded;
        submission.graded_at = Some(now);
        submission.feedback = feedback;
        self.submissions.update(submission.clone())?;

        self.after_grading(assessment, &submission, true)?;
        Ok(submission)
    }

    pub fn fetch(&self, submission_id: &SubmissionId) -> Result<Submission, GradingError> {
        self.submissions
            .fetch(submission_id)?
            .ok_or(GradingError::SubmissionNotFound)
    }

    fn published_assessment(&self, id: &AssessmentId) -> Result<&Assessment, GradingError> {
        // Unpublished definitions are invisible to students, so they look missing.
        self.catalog
            .assessment(id)
            .filter(|assessment| assessment.published)
            .ok_or(GradingError::AssessmentNotFound)
    }

    fn check_attempt_ceiling(&self, attempts: &[Submission]) -> Result<(), GradingError> {
        let turned_in = attempts
            .iter()
            .filter(|submission| submission.status != SubmissionStatus::Draft)
            .count() as u32;
        if turned_in >= self.policy.max_attempts {
            return Err(GradingError::AttemptLimitReached {
                limit: self.policy.max_attempts,
            });
        }
        Ok(())
    }

    /// Fold a grading result back into progress and notify. Idempotent at the
    /// aggregation level: the recompute reads facts rather than incrementing.
    fn after_grading(
        &self,
        assessment: &Assessment,
        submission: &Submission,
        manual: bool,
    ) -> Result<(), GradingError> {
        if let Some(program) = self.catalog.program_of_assessment(assessment) {
            if let Some(record) = self
                .enrollments
                .find_current(&submission.student_id, &program.id)?
            {
                self.progress.recompute(&record.enrollment.id)?;
            }
        }

        tracing::info!(
            submission = %submission.id.0,
            score = submission.score.unwrap_or_default(),
            manual,
            "submission graded"
        );
        self.events.publish(
            LearningEvent::new("submission_graded", submission.student_id.clone())
                .detail("submission_id", submission.id.0.clone())
                .detail("assessment_id", submission.assessment_id.0.clone())
                .detail(
                    "score",
                    submission.score.unwrap_or_default().to_string(),
                )
                .detail(
                    "percentage",
                    submission.percentage.unwrap_or_default().to_string(),
                )
                .detail("manual", manual.to_string()),
        )?;
        Ok(())
    }
}

fn next_attempt_number(attempts: &[Submission]) -> u32 {
    attempts
        .iter()
        .map(|submission| submission.attempt)
        .max()
        .unwrap_or(0)
        + 1
}
