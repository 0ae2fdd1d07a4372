use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use learnflow::assessment::GradingEngine;
use learnflow::catalog::{
    Assessment, AssessmentId, AssessmentKind, AssessmentScope, CatalogStore, Course, CourseId,
    CourseModule, Lesson, LessonId, LessonKind, ModuleId, ModuleKind, Program, ProgramId,
    Question, QuestionKind,
};
use learnflow::config::LearningPolicy;
use learnflow::enrollment::EnrollmentService;
use learnflow::memory::{
    InMemoryEnrollmentRepository, InMemoryScholarshipRepository, InMemorySubmissionRepository,
    RecordingEventPublisher,
};
use learnflow::progress::ProgressTracker;
use learnflow::scholarship::ScholarshipRedemptionEngine;
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type PlatformEnrollmentService = EnrollmentService<
    InMemoryEnrollmentRepository,
    InMemorySubmissionRepository,
    InMemoryScholarshipRepository,
    RecordingEventPublisher,
>;

pub(crate) type PlatformGradingEngine = GradingEngine<
    InMemorySubmissionRepository,
    InMemoryEnrollmentRepository,
    RecordingEventPublisher,
>;

pub(crate) type PlatformScholarshipEngine =
    ScholarshipRedemptionEngine<InMemoryScholarshipRepository, RecordingEventPublisher>;

/// The wired engine set behind the HTTP surface and the demo.
pub(crate) struct Platform {
    pub(crate) enrollment: Arc<PlatformEnrollmentService>,
    pub(crate) grading: Arc<PlatformGradingEngine>,
    pub(crate) scholarships: Arc<PlatformScholarshipEngine>,
    pub(crate) events: Arc<RecordingEventPublisher>,
}

pub(crate) fn build_platform(catalog: Arc<CatalogStore>, policy: LearningPolicy) -> Platform {
    let enrollments = Arc::new(InMemoryEnrollmentRepository::default());
    let submissions = Arc::new(InMemorySubmissionRepository::default());
    let scholarship_repo = Arc::new(InMemoryScholarshipRepository::default());
    let events = Arc::new(RecordingEventPublisher::default());

    let progress = Arc::new(ProgressTracker::new(
        catalog.clone(),
        enrollments.clone(),
        submissions.clone(),
        &policy,
    ));
    let scholarships = Arc::new(ScholarshipRedemptionEngine::new(
        catalog.clone(),
        scholarship_repo,
        events.clone(),
    ));
    let grading = Arc::new(GradingEngine::new(
        catalog.clone(),
        submissions,
        enrollments.clone(),
        progress.clone(),
        events.clone(),
        policy.clone(),
    ));
    let enrollment = Arc::new(EnrollmentService::new(
        catalog,
        enrollments,
        progress,
        scholarships.clone(),
        events.clone(),
        policy,
    ));

    Platform {
        enrollment,
        grading,
        scholarships,
        events,
    }
}

/// Seeded catalog for the default deployment and the demo: one certificate program
/// with a foundations course (gated modules plus a checkpoint quiz) and a tooling
/// course with an optional preview lesson.
pub(crate) fn sample_catalog() -> Arc<CatalogStore> {
    Arc::new(
        CatalogStore::builder()
            .program(Program {
                id: ProgramId("rust-systems".to_string()),
                title: "Rust Systems Certificate".to_string(),
                price_cents: 20_000,
                currency: "USD".to_string(),
                courses: vec![
                    CourseId("foundations".to_string()),
                    CourseId("tooling".to_string()),
                ],
                published: true,
            })
            .course(Course {
                id: CourseId("foundations".to_string()),
                program_id: ProgramId("rust-systems".to_string()),
                title: "Language Foundations".to_string(),
                modules: vec![
                    ModuleId("ownership".to_string()),
                    ModuleId("concurrency".to_string()),
                ],
                estimated_hours: 18,
            })
            .course(Course {
                id: CourseId("tooling".to_string()),
                program_id: ProgramId("rust-systems".to_string()),
                title: "Tooling and Workflow".to_string(),
                modules: vec![ModuleId("cargo".to_string())],
                estimated_hours: 6,
            })
            .module(CourseModule {
                id: ModuleId("ownership".to_string()),
                course_id: CourseId("foundations".to_string()),
                title: "Ownership and Borrowing".to_string(),
                kind: ModuleKind::Core,
                required: true,
                lessons: vec![
                    LessonId("moves".to_string()),
                    LessonId("borrows".to_string()),
                ],
                assessments: Vec::new(),
            })
            .module(CourseModule {
                id: ModuleId("concurrency".to_string()),
                course_id: CourseId("foundations".to_string()),
                title: "Fearless Concurrency".to_string(),
                kind: ModuleKind::Assessment,
                required: true,
                lessons: vec![LessonId("threads".to_string())],
                assessments: vec![AssessmentId("foundations-quiz".to_string())],
            })
            .module(CourseModule {
                id: ModuleId("cargo".to_string()),
                course_id: CourseId("tooling".to_string()),
                title: "Cargo in Practice".to_string(),
                kind: ModuleKind::Project,
                required: false,
                lessons: vec![
                    LessonId("workspaces".to_string()),
                    LessonId("profiles".to_string()),
                ],
                assessments: Vec::new(),
            })
            .lesson(Lesson {
                id: LessonId("moves".to_string()),
                module_id: ModuleId("ownership".to_string()),
                title: "Move Semantics".to_string(),
                kind: LessonKind::Video,
                estimated_minutes: 25,
                is_required: true,
                is_preview: true,
            })
            .lesson(Lesson {
                id: LessonId("borrows".to_string()),
                module_id: ModuleId("ownership".to_string()),
                title: "Borrowing and Lifetimes".to_string(),
                kind: LessonKind::Reading,
                estimated_minutes: 30,
                is_required: true,
                is_preview: false,
            })
            .lesson(Lesson {
                id: LessonId("threads".to_string()),
                module_id: ModuleId("concurrency".to_string()),
                title: "Threads, Channels, and Send".to_string(),
                kind: LessonKind::Coding,
                estimated_minutes: 45,
                is_required: true,
                is_preview: false,
            })
            .lesson(Lesson {
                id: LessonId("workspaces".to_string()),
                module_id: ModuleId("cargo".to_string()),
                title: "Workspace Layout".to_string(),
                kind: LessonKind::Reading,
                estimated_minutes: 15,
                is_required: true,
                is_preview: false,
            })
            .lesson(Lesson {
                id: LessonId("profiles".to_string()),
                module_id: ModuleId("cargo".to_string()),
                title: "Build Profiles".to_string(),
                kind: LessonKind::Assignment,
                estimated_minutes: 20,
                is_required: false,
                is_preview: false,
            })
            .assessment(Assessment {
                id: AssessmentId("foundations-quiz".to_string()),
                scope: AssessmentScope::Module(ModuleId("concurrency".to_string())),
                title: "Foundations Checkpoint".to_string(),
                kind: AssessmentKind::Quiz,
                questions: vec![
                    Question {
                        prompt: "Send marks types safe to move across threads".to_string(),
                        points: 10,
                        kind: QuestionKind::TrueFalse { correct: true },
                    },
                    Question {
                        prompt: "Pick the message-passing primitive".to_string(),
                        points: 10,
                        kind: QuestionKind::MultipleChoice {
                            options: vec![
                                "std::sync::mpsc::channel".to_string(),
                                "RefCell".to_string(),
                                "Box".to_string(),
                            ],
                            correct: 0,
                        },
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
                duration_minutes: Some(30),
                end_date: None,
                published: true,
            })
            .build()
            .expect("sample catalog is internally consistent"),
    )
}
