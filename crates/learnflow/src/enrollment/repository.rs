use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{
    CompletionOverride, Enrollment, EnrollmentId, EnrollmentStatus, LessonProgress, StudentId,
};
use crate::catalog::{CourseId, LessonId, ProgramId};
use crate::storage::RepositoryError;

/// Stored aggregate: the enrollment plus its lesson progress records. Every mutation
/// of the aggregate happens through one repository call so a storage backend can keep
/// it inside a single conditional-update boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    pub enrollment: Enrollment,
    pub lessons: BTreeMap<LessonId, LessonProgress>,
}

impl EnrollmentRecord {
    pub fn new(enrollment: Enrollment) -> Self {
        Self {
            enrollment,
            lessons: BTreeMap::new(),
        }
    }

    pub fn status_view(&self) -> EnrollmentView {
        EnrollmentView {
            enrollment_id: self.enrollment.id.clone(),
            student_id: self.enrollment.student_id.clone(),
            program_id: self.enrollment.program_id.clone(),
            status: self.enrollment.status.label(),
            cohort: self.enrollment.cohort.clone(),
            enrolled_at: self.enrollment.enrolled_at.to_rfc3339(),
            completed_at: self
                .enrollment
                .completed_at
                .map(|timestamp| timestamp.to_rfc3339()),
            completion_override: self.enrollment.completion_override.clone(),
            course_progress: self.enrollment.course_progress.clone(),
        }
    }
}

/// Storage abstraction so the lifecycle manager can be exercised in isolation.
pub trait EnrollmentRepository: Send + Sync {
    fn insert(&self, record: EnrollmentRecord) -> Result<EnrollmentRecord, RepositoryError>;
    fn update(&self, record: EnrollmentRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &EnrollmentId) -> Result<Option<EnrollmentRecord>, RepositoryError>;
    /// The student's current (non-DROPPED) enrollment in a program, if any.
    fn find_current(
        &self,
        student: &StudentId,
        program: &ProgramId,
    ) -> Result<Option<EnrollmentRecord>, RepositoryError>;
}

/// Sanitized representation of an enrollment for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentView {
    pub enrollment_id: EnrollmentId,
    pub student_id: StudentId,
    pub program_id: ProgramId,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cohort: Option<String>,
    pub enrolled_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_override: Option<CompletionOverride>,
    pub course_progress: BTreeMap<CourseId, f64>,
}

/// Convenience predicate used by duplicate-enrollment checks.
pub fn blocks_reenrollment(status: EnrollmentStatus) -> bool {
    status != EnrollmentStatus::Dropped
}
