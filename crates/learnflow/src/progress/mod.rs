//! Progress aggregation: pure roll-up rules from lesson/submission facts to
//! module → course → program percentages, plus the tracker that persists course
//! snapshots and serves cached reads.

pub mod cache;
pub mod rules;
pub mod tracker;

pub use cache::ProgressCache;
pub use rules::{
    course_completion, lesson_gate_clear, module_completion, program_completion, CourseProgress,
    ModuleProgress, ProgramProgress, ProgressFacts, COMPLETION_THRESHOLD,
};
pub use tracker::{ProgressError, ProgressTracker};
