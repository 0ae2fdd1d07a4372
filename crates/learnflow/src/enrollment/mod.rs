//! Enrollment lifecycle: status machine, monotonic lesson progress, and the
//! service facade that ties the scholarship precondition and progress recompute
//! signals together.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    CompletionOverride, Enrollment, EnrollmentId, EnrollmentStatus, LessonProgress, LessonStatus,
    StudentId,
};
pub use repository::{EnrollmentRecord, EnrollmentRepository, EnrollmentView};
pub use router::enrollment_router;
pub use service::{
    EnrollmentError, EnrollmentOutcome, EnrollmentService, EnrollRequest, LessonOutcome,
    OverrideRequest,
};
