use super::domain::{Submission, SubmissionId};
use crate::catalog::AssessmentId;
use crate::enrollment::StudentId;
use crate::storage::RepositoryError;

/// Storage abstraction for submissions. Each mutation covers one whole submission so
/// a backend can keep it inside a single conditional-update boundary.
pub trait SubmissionRepository: Send + Sync {
    fn insert(&self, submission: Submission) -> Result<Submission, RepositoryError>;
    fn update(&self, submission: Submission) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &SubmissionId) -> Result<Option<Submission>, RepositoryError>;
    /// Every attempt a student has made at an assessment, in attempt order.
    fn attempts(
        &self,
        assessment: &AssessmentId,
        student: &StudentId,
    ) -> Result<Vec<Submission>, RepositoryError>;
}
