use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::AssessmentId;
use crate::enrollment::StudentId;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubmissionId(pub String);

/// Submission lifecycle: draft → submitted | late → graded. A submission turned in
/// after the assessment's end date still succeeds and is marked late.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Draft,
    Submitted,
    Late,
    Graded,
}

impl SubmissionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            SubmissionStatus::Draft => "draft",
            SubmissionStatus::Submitted => "submitted",
            SubmissionStatus::Late => "late",
            SubmissionStatus::Graded => "graded",
        }
    }
}

/// Answer payload as supplied by the student. The variant must match the question
/// kind; mismatches are rejected during validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerValue {
    Choice(usize),
    Flag(bool),
    Text(String),
    Selection(BTreeSet<usize>),
    FileRef(String),
}

/// One answer as received over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerInput {
    pub question_index: usize,
    pub answer: AnswerValue,
}

/// One answer as stored. Objective answers carry their verdict immediately after
/// submission; subjective answers leave both fields unset until an instructor grades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_index: usize,
    pub answer: AnswerValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points_earned: Option<u32>,
}

/// A student's attempt at an assessment. `status = graded` implies `score`,
/// `percentage`, and `graded_at` are all set; `percentage` keeps full precision and
/// is rounded only for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    pub assessment_id: AssessmentId,
    pub student_id: StudentId,
    pub attempt: u32,
    pub status: SubmissionStatus,
    pub answers: Vec<AnswerRecord>,
    pub score: Option<f64>,
    pub percentage: Option<f64>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub graded_at: Option<DateTime<Utc>>,
    pub feedback: Option<String>,
}

impl Submission {
    pub fn is_graded(&self) -> bool {
        self.status == SubmissionStatus::Graded
    }

    /// Whether this attempt satisfies the pass threshold. Comparison uses the stored
    /// full-precision percentage, never the rounded display value.
    pub fn passed(&self, passing_score: f64) -> bool {
        self.is_graded()
            && self
                .percentage
                .map(|percentage| percentage >= passing_score)
                .unwrap_or(false)
    }

    /// Display percentage, rounded to the nearest whole number.
    pub fn rounded_percentage(&self) -> Option<i64> {
        self.percentage.map(|percentage| percentage.round() as i64)
    }

    pub fn status_view(&self) -> SubmissionView {
        SubmissionView {
            submission_id: self.id.clone(),
            assessment_id: self.assessment_id.clone(),
            student_id: self.student_id.clone(),
            attempt: self.attempt,
            status: self.status.label(),
            score: self.score,
            percentage: self.percentage,
            display_percentage: self.rounded_percentage(),
            submitted_at: self.submitted_at.map(|timestamp| timestamp.to_rfc3339()),
            graded_at: self.graded_at.map(|timestamp| timestamp.to_rfc3339()),
            feedback: self.feedback.clone(),
        }
    }
}

/// Sanitized representation of a submission for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionView {
    pub submission_id: SubmissionId,
    pub assessment_id: AssessmentId,
    pub student_id: StudentId,
    pub attempt: u32,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_percentage: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graded_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}
