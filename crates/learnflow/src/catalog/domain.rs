use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for programs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProgramId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CourseId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModuleId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LessonId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssessmentId(pub String);

/// Top-level sellable unit. `published` gates catalog visibility, not lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub id: ProgramId,
    pub title: String,
    pub price_cents: u64,
    pub currency: String,
    pub courses: Vec<CourseId>,
    pub published: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub program_id: ProgramId,
    pub title: String,
    pub modules: Vec<ModuleId>,
    pub estimated_hours: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    Core,
    Project,
    Assessment,
    Capstone,
}

impl ModuleKind {
    pub const fn label(self) -> &'static str {
        match self {
            ModuleKind::Core => "core",
            ModuleKind::Project => "project",
            ModuleKind::Assessment => "assessment",
            ModuleKind::Capstone => "capstone",
        }
    }
}

/// A unit of a course. `required` feeds the lock-step gate: later lessons stay locked
/// while an earlier required module is incomplete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseModule {
    pub id: ModuleId,
    pub course_id: CourseId,
    pub title: String,
    pub kind: ModuleKind,
    pub required: bool,
    pub lessons: Vec<LessonId>,
    pub assessments: Vec<AssessmentId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonKind {
    Video,
    Reading,
    Coding,
    Assignment,
}

impl LessonKind {
    pub const fn label(self) -> &'static str {
        match self {
            LessonKind::Video => "video",
            LessonKind::Reading => "reading",
            LessonKind::Coding => "coding",
            LessonKind::Assignment => "assignment",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: LessonId,
    pub module_id: ModuleId,
    pub title: String,
    pub kind: LessonKind,
    pub estimated_minutes: u32,
    pub is_required: bool,
    pub is_preview: bool,
}

/// Where an assessment hangs in the catalog tree. Module-scoped assessments act as
/// pseudo-lessons during aggregation; course-scoped ones are gradeable but carry no
/// percentage weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentScope {
    Course(CourseId),
    Module(ModuleId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentKind {
    Quiz,
    Assignment,
    Project,
    Capstone,
}

impl AssessmentKind {
    pub const fn label(self) -> &'static str {
        match self {
            AssessmentKind::Quiz => "quiz",
            AssessmentKind::Assignment => "assignment",
            AssessmentKind::Project => "project",
            AssessmentKind::Capstone => "capstone",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub id: AssessmentId,
    pub scope: AssessmentScope,
    pub title: String,
    pub kind: AssessmentKind,
    pub questions: Vec<Question>,
    /// Pass threshold as a percentage of total points.
    pub passing_score: f64,
    pub duration_minutes: Option<u32>,
    pub end_date: Option<DateTime<Utc>>,
    pub published: bool,
}

impl Assessment {
    pub fn total_points(&self) -> u32 {
        self.questions.iter().map(|question| question.points).sum()
    }

    pub fn is_fully_objective(&self) -> bool {
        self.questions
            .iter()
            .all(|question| question.kind.is_objective())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub prompt: String,
    pub points: u32,
    pub kind: QuestionKind,
}

/// Question variants. Objective kinds carry their answer key and are machine-gradable;
/// subjective kinds wait for an instructor score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice {
        options: Vec<String>,
        correct: usize,
    },
    TrueFalse {
        correct: bool,
    },
    ShortAnswer {
        accepted: Vec<String>,
    },
    MultipleSelect {
        options: Vec<String>,
        correct: BTreeSet<usize>,
    },
    Essay,
    FileUpload,
}

impl QuestionKind {
    pub fn is_objective(&self) -> bool {
        !matches!(self, QuestionKind::Essay | QuestionKind::FileUpload)
    }
}
