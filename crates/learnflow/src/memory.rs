//! Reference in-memory adapters for the storage and event traits. They back the
//! service binary's default wiring and the test suites; swapping in a durable
//! backend means implementing the same traits over real storage.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::assessment::{Submission, SubmissionId, SubmissionRepository};
use crate::catalog::{AssessmentId, ProgramId};
use crate::enrollment::{
    EnrollmentId, EnrollmentRecord, EnrollmentRepository, StudentId,
};
use crate::events::{EventError, EventPublisher, LearningEvent};
use crate::scholarship::{
    RedemptionClaim, Scholarship, ScholarshipError, ScholarshipRepository, ScholarshipState,
};
use crate::storage::RepositoryError;

#[derive(Default, Clone)]
pub struct InMemoryEnrollmentRepository {
    records: Arc<Mutex<HashMap<EnrollmentId, EnrollmentRecord>>>,
}

impl EnrollmentRepository for InMemoryEnrollmentRepository {
    fn insert(&self, record: EnrollmentRecord) -> Result<EnrollmentRecord, RepositoryError> {
        let mut records = self.records.lock().expect("enrollment mutex poisoned");
        if records.contains_key(&record.enrollment.id) {
            return Err(RepositoryError::Conflict);
        }
        records.insert(record.enrollment.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: EnrollmentRecord) -> Result<(), RepositoryError> {
        let mut records = self.records.lock().expect("enrollment mutex poisoned");
        if records.contains_key(&record.enrollment.id) {
            records.insert(record.enrollment.id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &EnrollmentId) -> Result<Option<EnrollmentRecord>, RepositoryError> {
        let records = self.records.lock().expect("enrollment mutex poisoned");
        Ok(records.get(id).cloned())
    }

    fn find_current(
        &self,
        student: &StudentId,
        program: &ProgramId,
    ) -> Result<Option<EnrollmentRecord>, RepositoryError> {
        let records = self.records.lock().expect("enrollment mutex poisoned");
        Ok(records
            .values()
            .filter(|record| {
                record.enrollment.student_id == *student
                    && record.enrollment.program_id == *program
                    && record.enrollment.status != crate::enrollment::EnrollmentStatus::Dropped
            })
            .max_by(|a, b| a.enrollment.enrolled_at.cmp(&b.enrollment.enrolled_at))
            .cloned())
    }
}

#[derive(Default, Clone)]
pub struct InMemorySubmissionRepository {
    submissions: Arc<Mutex<HashMap<SubmissionId, Submission>>>,
}

impl SubmissionRepository for InMemorySubmissionRepository {
    fn insert(&self, submission: Submission) -> Result<Submission, RepositoryError> {
        let mut submissions = self.submissions.lock().expect("submission mutex poisoned");
        if submissions.contains_key(&submission.id) {
            return Err(RepositoryError::Conflict);
        }
        submissions.insert(submission.id.clone(), submission.clone());
        Ok(submission)
    }

    fn update(&self, submission: Submission) -> Result<(), RepositoryError> {
        let mut submissions = self.submissions.lock().expect("submission mutex poisoned");
        if submissions.contains_key(&submission.id) {
            submissions.insert(submission.id.clone(), submission);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &SubmissionId) -> Result<Option<Submission>, RepositoryError> {
        let submissions = self.submissions.lock().expect("submission mutex poisoned");
        Ok(submissions.get(id).cloned())
    }

    fn attempts(
        &self,
        assessment: &AssessmentId,
        student: &StudentId,
    ) -> Result<Vec<Submission>, RepositoryError> {
        let submissions = self.submissions.lock().expect("submission mutex poisoned");
        let mut attempts: Vec<Submission> = submissions
            .values()
            .filter(|submission| {
                submission.assessment_id == *assessment && submission.student_id == *student
            })
            .cloned()
            .collect();
        attempts.sort_by_key(|submission| submission.attempt);
        Ok(attempts)
    }
}

#[derive(Default, Clone)]
pub struct InMemoryScholarshipRepository {
    codes: Arc<Mutex<HashMap<String, Scholarship>>>,
}

impl ScholarshipRepository for InMemoryScholarshipRepository {
    fn insert(&self, scholarship: Scholarship) -> Result<Scholarship, RepositoryError> {
        let mut codes = self.codes.lock().expect("scholarship mutex poisoned");
        if codes.contains_key(&scholarship.code) {
            return Err(RepositoryError::Conflict);
        }
        codes.insert(scholarship.code.clone(), scholarship.clone());
        Ok(scholarship)
    }

    fn fetch_by_code(&self, code: &str) -> Result<Option<Scholarship>, RepositoryError> {
        let codes = self.codes.lock().expect("scholarship mutex poisoned");
        Ok(codes.get(code).cloned())
    }

    fn by_program(&self, program: &ProgramId) -> Result<Vec<Scholarship>, RepositoryError> {
        let codes = self.codes.lock().expect("scholarship mutex poisoned");
        Ok(codes
            .values()
            .filter(|scholarship| scholarship.program_id == *program)
            .cloned()
            .collect())
    }

    fn consume(
        &self,
        code: &str,
        claim: &RedemptionClaim,
    ) -> Result<Scholarship, ScholarshipError> {
        // Claim evaluation and the write share one lock scope: the conditional
        // update that makes redemption exactly-once under concurrency.
        let mut codes = self.codes.lock().expect("scholarship mutex poisoned");
        let current = codes.get(code).ok_or(ScholarshipError::NotFound)?;
        let consumed = current.claim(claim)?;
        codes.insert(code.to_string(), consumed.clone());
        Ok(consumed)
    }

    fn revoke(&self, code: &str) -> Result<Scholarship, ScholarshipError> {
        let mut codes = self.codes.lock().expect("scholarship mutex poisoned");
        let current = codes.get(code).ok_or(ScholarshipError::NotFound)?;
        match current.state {
            ScholarshipState::Used { .. } => Err(ScholarshipError::AlreadyUsed),
            ScholarshipState::Revoked => Err(ScholarshipError::Revoked),
            ScholarshipState::Active => {
                let mut revoked = current.clone();
                revoked.state = ScholarshipState::Revoked;
                codes.insert(code.to_string(), revoked.clone());
                Ok(revoked)
            }
        }
    }
}

/// Captures emitted events for assertions and demo output.
#[derive(Default, Clone)]
pub struct RecordingEventPublisher {
    events: Arc<Mutex<Vec<LearningEvent>>>,
}

impl RecordingEventPublisher {
    pub fn events(&self) -> Vec<LearningEvent> {
        self.events.lock().expect("event mutex poisoned").clone()
    }
}

impl EventPublisher for RecordingEventPublisher {
    fn publish(&self, event: LearningEvent) -> Result<(), EventError> {
        self.events
            .lock()
            .expect("event mutex poisoned")
            .push(event);
        Ok(())
    }
}
