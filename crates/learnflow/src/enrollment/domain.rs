use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{CourseId, LessonId, ProgramId};

/// Identifier wrapper for students, supplied by the authentication collaborator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StudentId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EnrollmentId(pub String);

/// Lifecycle of a student's registration in a program.
///
/// Legal edges: PENDING → ACTIVE, ACTIVE ⇄ SUSPENDED, ACTIVE → COMPLETED, and any
/// non-terminal state → DROPPED. COMPLETED and DROPPED are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    Pending,
    Active,
    Completed,
    Suspended,
    Dropped,
}

impl EnrollmentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            EnrollmentStatus::Pending => "PENDING",
            EnrollmentStatus::Active => "ACTIVE",
            EnrollmentStatus::Completed => "COMPLETED",
            EnrollmentStatus::Suspended => "SUSPENDED",
            EnrollmentStatus::Dropped => "DROPPED",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, EnrollmentStatus::Completed | EnrollmentStatus::Dropped)
    }

    /// Whether the edge `self → target` exists in the lifecycle graph.
    pub fn permits(self, target: EnrollmentStatus) -> bool {
        use EnrollmentStatus::*;
        match (self, target) {
            (Pending, Active) => true,
            (Active, Completed) => true,
            (Active, Suspended) => true,
            (Suspended, Active) => true,
            (Pending | Active | Suspended, Dropped) => true,
            _ => false,
        }
    }
}

/// Audit trail for an admin forcing COMPLETED below 100% progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionOverride {
    pub actor: String,
    pub reason: String,
    pub at: DateTime<Utc>,
}

/// A student's registration in a program. `completed_at` is set if and only if the
/// status is COMPLETED; `course_progress` holds the last persisted snapshot
/// percentages, recomputed from facts on every progress-affecting mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub student_id: StudentId,
    pub program_id: ProgramId,
    pub status: EnrollmentStatus,
    pub cohort: Option<String>,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completion_override: Option<CompletionOverride>,
    pub course_progress: BTreeMap<CourseId, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl LessonStatus {
    pub const fn label(self) -> &'static str {
        match self {
            LessonStatus::NotStarted => "not_started",
            LessonStatus::InProgress => "in_progress",
            LessonStatus::Completed => "completed",
        }
    }
}

/// Per-lesson progress record, keyed by (enrollment, lesson) in storage. Movement is
/// monotonic toward completion: a completed lesson never regresses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonProgress {
    pub lesson_id: LessonId,
    pub status: LessonStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl LessonProgress {
    pub fn new(lesson_id: LessonId) -> Self {
        Self {
            lesson_id,
            status: LessonStatus::NotStarted,
            started_at: None,
            completed_at: None,
        }
    }

    /// Record a start. No-op once the lesson is in progress or completed.
    pub fn start(&mut self, now: DateTime<Utc>) -> bool {
        match self.status {
            LessonStatus::NotStarted => {
                self.status = LessonStatus::InProgress;
                self.started_at = Some(now);
                true
            }
            LessonStatus::InProgress | LessonStatus::Completed => false,
        }
    }

    /// Record a completion. Starting is implied for a not-started lesson so that
    /// `started_at ≤ completed_at` always holds. Idempotent once completed.
    pub fn complete(&mut self, now: DateTime<Utc>) -> bool {
        match self.status {
            LessonStatus::Completed => false,
            LessonStatus::NotStarted => {
                self.status = LessonStatus::Completed;
                self.started_at = Some(now);
                self.completed_at = Some(now);
                true
            }
            LessonStatus::InProgress => {
                self.status = LessonStatus::Completed;
                self.completed_at = Some(now);
                true
            }
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == LessonStatus::Completed
    }
}
