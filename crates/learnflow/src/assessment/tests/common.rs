use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use crate::assessment::domain::{AnswerInput, AnswerValue};
use crate::assessment::service::GradingEngine;
use crate::catalog::{
    Assessment, AssessmentId, AssessmentKind, AssessmentScope, CatalogStore, Course, CourseId,
    CourseModule, Lesson, LessonId, LessonKind, ModuleId, ModuleKind, Program, ProgramId,
    Question, QuestionKind,
};
use crate::config::LearningPolicy;
use crate::enrollment::service::{EnrollmentService, EnrollRequest};
use crate::enrollment::StudentId;
use crate::memory::{
    InMemoryEnrollmentRepository, InMemoryScholarshipRepository, InMemorySubmissionRepository,
    RecordingEventPublisher,
};
use crate::progress::ProgressTracker;
use crate::scholarship::ScholarshipRedemptionEngine;

pub(super) type TestGradingEngine = GradingEngine<
    InMemorySubmissionRepository,
    InMemoryEnrollmentRepository,
    RecordingEventPublisher,
>;

pub(super) type TestEnrollmentService = EnrollmentService<
    InMemoryEnrollmentRepository,
    InMemorySubmissionRepository,
    InMemoryScholarshipRepository,
    RecordingEventPublisher,
>;

pub(super) struct Stack {
    pub(super) grading: TestGradingEngine,
    pub(super) enrollment: TestEnrollmentService,
    pub(super) events: Arc<RecordingEventPublisher>,
}

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 10, 15, 0, 0).unwrap()
}

pub(super) fn student() -> StudentId {
    StudentId("s1".to_string())
}

pub(super) fn quiz_id() -> AssessmentId {
    AssessmentId("quiz1".to_string())
}

pub(super) fn project_id() -> AssessmentId {
    AssessmentId("proj1".to_string())
}

/// Objective-only checkpoint quiz worth 10/10/5 points, module-scoped.
fn checkpoint_quiz() -> Assessment {
    Assessment {
        id: quiz_id(),
        scope: AssessmentScope::Module(ModuleId("m1".to_string())),
        title: "Module checkpoint".to_string(),
        kind: AssessmentKind::Quiz,
        questions: vec![
            Question {
                prompt: "Pick the borrow checker's job".to_string(),
                points: 10,
                kind: QuestionKind::MultipleChoice {
                    options: vec!["memory safety".to_string(), "style".to_string()],
                    correct: 0,
                },
            },
            Question {
                prompt: "Slices are fat pointers".to_string(),
                points: 10,
                kind: QuestionKind::TrueFalse { correct: true },
            },
            Question {
                prompt: "Keyword for fallible returns".to_string(),
                points: 5,
                kind: QuestionKind::ShortAnswer {
                    accepted: vec!["Result".to_string()],
                },
            },
        ],
        passing_score: 70.0,
        duration_minutes: Some(20),
        end_date: None,
        published: true,
    }
}

/// Mixed project (essay + objective), course-scoped with a deadline.
fn course_project() -> Assessment {
    Assessment {
        id: project_id(),
        scope: AssessmentScope::Course(CourseId("c1".to_string())),
        title: "Course project".to_string(),
        kind: AssessmentKind::Project,
        questions: vec![
            Question {
                prompt: "Explain ownership in your own words".to_string(),
                points: 20,
                kind: QuestionKind::Essay,
            },
            Question {
                prompt: "Borrows may outlive their referent".to_string(),
                points: 10,
                kind: QuestionKind::TrueFalse { correct: false },
            },
        ],
        passing_score: 60.0,
        duration_minutes: None,
        end_date: Some(now() + chrono::Duration::hours(1)),
        published: true,
    }
}

fn hidden_quiz() -> Assessment {
    Assessment {
        id: AssessmentId("hidden".to_string()),
        scope: AssessmentScope::Course(CourseId("c1".to_string())),
        title: "Unpublished quiz".to_string(),
        kind: AssessmentKind::Quiz,
        questions: vec![Question {
            prompt: "?".to_string(),
            points: 1,
            kind: QuestionKind::TrueFalse { correct: true },
        }],
        passing_score: 50.0,
        duration_minutes: None,
        end_date: None,
        published: false,
    }
}

/// One program, one course, one module holding a required lesson and the
/// checkpoint quiz as a pseudo-lesson.
pub(super) fn catalog() -> Arc<CatalogStore> {
    Arc::new(
        CatalogStore::builder()
            .program(Program {
                id: ProgramId("p1".to_string()),
                title: "Systems Track".to_string(),
                price_cents: 20_000,
                currency: "USD".to_string(),
                courses: vec![CourseId("c1".to_string())],
                published: true,
            })
            .course(Course {
                id: CourseId("c1".to_string()),
                program_id: ProgramId("p1".to_string()),
                title: "Foundations".to_string(),
                modules: vec![ModuleId("m1".to_string())],
                estimated_hours: 6,
            })
            .module(CourseModule {
                id: ModuleId("m1".to_string()),
                course_id: CourseId("c1".to_string()),
                title: "Ownership".to_string(),
                kind: ModuleKind::Core,
                required: true,
                lessons: vec![LessonId("l1".to_string())],
                assessments: vec![quiz_id()],
            })
            .lesson(Lesson {
                id: LessonId("l1".to_string()),
                module_id: ModuleId("m1".to_string()),
                title: "Moves and borrows".to_string(),
                kind: LessonKind::Video,
                estimated_minutes: 25,
                is_required: true,
                is_preview: false,
            })
            .assessment(checkpoint_quiz())
            .assessment(course_project())
            .assessment(hidden_quiz())
            .build()
            .expect("catalog builds"),
    )
}

pub(super) fn build_stack(policy: LearningPolicy) -> Stack {
    let catalog = catalog();
    let enrollments = Arc::new(InMemoryEnrollmentRepository::default());
    let submissions = Arc::new(InMemorySubmissionRepository::default());
    let scholarships_repo = Arc::new(InMemoryScholarshipRepository::default());
    let events = Arc::new(RecordingEventPublisher::default());

    let progress = Arc::new(ProgressTracker::new(
        catalog.clone(),
        enrollments.clone(),
        submissions.clone(),
        &policy,
    ));
    let scholarships = Arc::new(ScholarshipRedemptionEngine::new(
        catalog.clone(),
        scholarships_repo,
        events.clone(),
    ));
    let grading = GradingEngine::new(
        catalog.clone(),
        submissions,
        enrollments.clone(),
        progress.clone(),
        events.clone(),
        policy.clone(),
    );
    let enrollment = EnrollmentService::new(
        catalog,
        enrollments,
        progress,
        scholarships,
        events.clone(),
        policy,
    );

    Stack {
        grading,
        enrollment,
        events,
    }
}

pub(super) fn enroll(stack: &Stack) -> crate::enrollment::EnrollmentId {
    stack
        .enrollment
        .enroll(
            EnrollRequest {
                student_id: student(),
                student_email: None,
                program_id: ProgramId("p1".to_string()),
                scholarship_code: None,
                cohort: None,
            },
            now(),
        )
        .expect("enrollment succeeds")
        .record
        .enrollment
        .id
}

pub(super) fn correct_quiz_answers() -> Vec<AnswerInput> {
    vec![
        AnswerInput {
            question_index: 0,
            answer: AnswerValue::Choice(0),
        },
        AnswerInput {
            question_index: 1,
            answer: AnswerValue::Flag(true),
        },
        AnswerInput {
            question_index: 2,
            answer: AnswerValue::Text("result".to_string()),
        },
    ]
}

pub(super) fn two_of_three_quiz_answers() -> Vec<AnswerInput> {
    vec![
        AnswerInput {
            question_index: 0,
            answer: AnswerValue::Choice(0),
        },
        AnswerInput {
            question_index: 1,
            answer: AnswerValue::Flag(true),
        },
        AnswerInput {
            question_index: 2,
            answer: AnswerValue::Text("panic".to_string()),
        },
    ]
}

pub(super) fn project_answers() -> Vec<AnswerInput> {
    vec![
        AnswerInput {
            question_index: 0,
            answer: AnswerValue::Text("Ownership moves values between bindings.".to_string()),
        },
        AnswerInput {
            question_index: 1,
            answer: AnswerValue::Flag(false),
        },
    ]
}
