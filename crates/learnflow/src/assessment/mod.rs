//! Assessment grading: answer validation, objective auto-scoring, instructor
//! grading, and the submission state machine.

pub mod domain;
pub mod grading;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    AnswerInput, AnswerRecord, AnswerValue, Submission, SubmissionId, SubmissionStatus,
    SubmissionView,
};
pub use grading::{auto_grade, percentage_of, validate_answers, AnswerValidationError};
pub use repository::SubmissionRepository;
pub use router::assessment_router;
pub use service::{GradingEngine, GradingError};
