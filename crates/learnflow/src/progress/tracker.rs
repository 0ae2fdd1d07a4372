use std::sync::Arc;
use std::time::Duration;

use super::cache::ProgressCache;
use super::rules::{program_completion, ProgramProgress, ProgressFacts};
use crate::assessment::SubmissionRepository;
use crate::catalog::{CatalogStore, ProgramId};
use crate::config::LearningPolicy;
use crate::enrollment::{EnrollmentId, EnrollmentRecord, EnrollmentRepository};
use crate::storage::RepositoryError;

/// Error raised when a progress report cannot be derived.
#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    #[error("enrollment not found")]
    EnrollmentNotFound,
    #[error("program '{0}' missing from catalog")]
    ProgramNotFound(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Orchestrates recomputation: collects durable facts, runs the pure roll-up,
/// persists course snapshot percentages onto the enrollment, and fronts reads with a
/// bounded TTL cache. Recomputing twice from the same facts yields the same report.
pub struct ProgressTracker<R, B> {
    catalog: Arc<CatalogStore>,
    enrollments: Arc<R>,
    submissions: Arc<B>,
    cache: ProgressCache,
}

impl<R, B> ProgressTracker<R, B>
where
    R: EnrollmentRepository + 'static,
    B: SubmissionRepository + 'static,
{
    pub fn new(
        catalog: Arc<CatalogStore>,
        enrollments: Arc<R>,
        submissions: Arc<B>,
        policy: &LearningPolicy,
    ) -> Self {
        Self {
            catalog,
            enrollments,
            submissions,
            cache: ProgressCache::new(
                Duration::from_secs(policy.progress_cache_ttl_secs),
                policy.progress_cache_capacity,
            ),
        }
    }

    /// Derive the fact set for an enrollment: completed lessons from its progress
    /// records, passed assessments from the student's graded submissions.
    pub fn facts_for(&self, record: &EnrollmentRecord) -> Result<ProgressFacts, ProgressError> {
        let mut facts = ProgressFacts::default();

        for (lesson_id, progress) in &record.lessons {
            if progress.is_completed() {
                facts.completed_lessons.insert(lesson_id.clone());
            }
        }

        let program = self.program_of(&record.enrollment.program_id)?;
        for assessment in self.catalog.assessments_of_program(program) {
            let attempts = self
                .submissions
                .attempts(&assessment.id, &record.enrollment.student_id)?;
            if attempts
                .iter()
                .any(|submission| submission.passed(assessment.passing_score))
            {
                facts.passed_assessments.insert(assessment.id.clone());
            }
        }

        Ok(facts)
    }

    /// Pure roll-up for an already-fetched record; persists nothing.
    pub fn evaluate(&self, record: &EnrollmentRecord) -> Result<ProgramProgress, ProgressError> {
        let facts = self.facts_for(record)?;
        let program = self.program_of(&record.enrollment.program_id)?;
        Ok(program_completion(&self.catalog, program, &facts))
    }

    /// Recompute from durable facts, persist the course snapshots, and refresh the
    /// cache. Triggered by lesson-start, lesson-complete, grading, and transitions.
    pub fn recompute(&self, id: &EnrollmentId) -> Result<ProgramProgress, ProgressError> {
        let mut record = self
            .enrollments
            .fetch(id)?
            .ok_or(ProgressError::EnrollmentNotFound)?;

        let report = self.evaluate(&record)?;

        record.enrollment.course_progress = report.course_snapshot();
        self.enrollments.update(record)?;

        self.cache.put(id.clone(), report.clone());
        Ok(report)
    }

    /// Read-side report; served from the cache when fresh.
    pub fn report(&self, id: &EnrollmentId) -> Result<ProgramProgress, ProgressError> {
        if let Some(report) = self.cache.get(id) {
            return Ok(report);
        }
        self.recompute(id)
    }

    pub fn invalidate(&self, id: &EnrollmentId) {
        self.cache.invalidate(id);
    }

    fn program_of(
        &self,
        program_id: &ProgramId,
    ) -> Result<&crate::catalog::Program, ProgressError> {
        self.catalog
            .program(program_id)
            .ok_or_else(|| ProgressError::ProgramNotFound(program_id.0.clone()))
    }
}
