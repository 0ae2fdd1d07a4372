//! Pure scoring rules: answer-shape validation and objective auto-grading. The
//! stateful submission flow in `service.rs` layers storage and events on top.

use super::domain::{AnswerInput, AnswerRecord, AnswerValue};
use crate::catalog::{Assessment, QuestionKind};

/// Shape violations in a submitted answer set.
#[derive(Debug, thiserror::Error)]
pub enum AnswerValidationError {
    #[error("answer references question {index} but the assessment has {count} questions")]
    IndexOutOfRange { index: usize, count: usize },
    #[error("duplicate answer for question {0}")]
    DuplicateIndex(usize),
    #[error("answer payload for question {index} does not match the question type")]
    PayloadMismatch { index: usize },
    #[error("selected option {option} is out of range for question {index}")]
    OptionOutOfRange { index: usize, option: usize },
}

/// Reject answers whose index, uniqueness, or payload shape is off-contract.
pub fn validate_answers(
    assessment: &Assessment,
    answers: &[AnswerInput],
) -> Result<(), AnswerValidationError> {
    let count = assessment.questions.len();
    let mut seen = vec![false; count];

    for input in answers {
        let index = input.question_index;
        if index >= count {
            return Err(AnswerValidationError::IndexOutOfRange { index, count });
        }
        if seen[index] {
            return Err(AnswerValidationError::DuplicateIndex(index));
        }
        seen[index] = true;

        let question = &assessment.questions[index];
        match (&question.kind, &input.answer) {
            (QuestionKind::MultipleChoice { options, .. }, AnswerValue::Choice(option)) => {
                if *option >= options.len() {
                    return Err(AnswerValidationError::OptionOutOfRange {
                        index,
                        option: *option,
                    });
                }
            }
            (QuestionKind::TrueFalse { .. }, AnswerValue::Flag(_)) => {}
            (QuestionKind::ShortAnswer { .. }, AnswerValue::Text(_)) => {}
            (QuestionKind::MultipleSelect { options, .. }, AnswerValue::Selection(selected)) => {
                if let Some(option) = selected.iter().find(|option| **option >= options.len()) {
                    return Err(AnswerValidationError::OptionOutOfRange {
                        index,
                        option: *option,
                    });
                }
            }
            (QuestionKind::Essay, AnswerValue::Text(_)) => {}
            (QuestionKind::FileUpload, AnswerValue::FileRef(_)) => {}
            _ => return Err(AnswerValidationError::PayloadMismatch { index }),
        }
    }

    Ok(())
}

/// Score what the machine can score. Objective answers get `is_correct` and
/// `points_earned` filled in; subjective answers are stored verbatim awaiting an
/// instructor. Records come back sorted by question index.
pub fn auto_grade(assessment: &Assessment, answers: &[AnswerInput]) -> Vec<AnswerRecord> {
    let mut records: Vec<AnswerRecord> = answers
        .iter()
        .map(|input| {
            let question = &assessment.questions[input.question_index];
            let verdict = objective_verdict(&question.kind, &input.answer);
            AnswerRecord {
                question_index: input.question_index,
                answer: input.answer.clone(),
                is_correct: verdict,
                points_earned: verdict
                    .map(|correct| if correct { question.points } else { 0 }),
            }
        })
        .collect();

    records.sort_by_key(|record| record.question_index);
    records
}

/// `Some(correct?)` for objective kinds, `None` for subjective ones.
fn objective_verdict(kind: &QuestionKind, answer: &AnswerValue) -> Option<bool> {
    match (kind, answer) {
        (QuestionKind::MultipleChoice { correct, .. }, AnswerValue::Choice(option)) => {
            Some(option == correct)
        }
        (QuestionKind::TrueFalse { correct }, AnswerValue::Flag(flag)) => Some(flag == correct),
        (QuestionKind::ShortAnswer { accepted }, AnswerValue::Text(text)) => {
            let normalized = text.trim();
            Some(
                accepted
                    .iter()
                    .any(|candidate| candidate.trim().eq_ignore_ascii_case(normalized)),
            )
        }
        (QuestionKind::MultipleSelect { correct, .. }, AnswerValue::Selection(selected)) => {
            Some(selected == correct)
        }
        _ => None,
    }
}

/// Sum of machine- or instructor-awarded points across stored answers.
pub fn objective_score(records: &[AnswerRecord]) -> f64 {
    records
        .iter()
        .filter_map(|record| record.points_earned)
        .map(f64::from)
        .sum()
}

/// Full-precision percentage for a score against an assessment's total points.
pub fn percentage_of(score: f64, total_points: u32) -> f64 {
    if total_points == 0 {
        return 0.0;
    }
    100.0 * score / f64::from(total_points)
}
