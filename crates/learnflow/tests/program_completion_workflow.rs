//! End-to-end specifications for the enrollment, grading, and redemption engines
//! driven through the public facades and HTTP routers, without reaching into
//! private modules.

mod common {
    use std::sync::Arc;

    use chrono::{DateTime, TimeZone, Utc};

    use learnflow::assessment::{assessment_router, GradingEngine};
    use learnflow::catalog::{
        Assessment, AssessmentId, AssessmentKind, AssessmentScope, CatalogStore, Course, CourseId,
        CourseModule, Lesson, LessonId, LessonKind, ModuleId, ModuleKind, Program, ProgramId,
        Question, QuestionKind,
    };
    use learnflow::config::LearningPolicy;
    use learnflow::enrollment::{enrollment_router, EnrollmentService};
    use learnflow::memory::{
        InMemoryEnrollmentRepository, InMemoryScholarshipRepository, InMemorySubmissionRepository,
        RecordingEventPublisher,
    };
    use learnflow::progress::ProgressTracker;
    use learnflow::scholarship::{scholarship_router, ScholarshipRedemptionEngine};

    pub type AppEnrollmentService = EnrollmentService<
        InMemoryEnrollmentRepository,
        InMemorySubmissionRepository,
        InMemoryScholarshipRepository,
        RecordingEventPublisher,
    >;

    pub type AppGradingEngine = GradingEngine<
        InMemorySubmissionRepository,
        InMemoryEnrollmentRepository,
        RecordingEventPublisher,
    >;

    pub struct App {
        pub enrollment: Arc<AppEnrollmentService>,
        pub grading: Arc<AppGradingEngine>,
        pub scholarships: Arc<
            ScholarshipRedemptionEngine<InMemoryScholarshipRepository, RecordingEventPublisher>,
        >,
        pub events: Arc<RecordingEventPublisher>,
    }

    impl App {
        pub fn router(&self) -> axum::Router {
            enrollment_router(self.enrollment.clone())
                .merge(assessment_router(self.grading.clone()))
                .merge(scholarship_router(self.scholarships.clone()))
        }
    }

    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 1, 9, 0, 0).unwrap()
    }

    /// A $200 program: module one holds two lessons, module two holds one lesson
    /// plus an objective checkpoint quiz that gates full completion.
    pub fn catalog() -> Arc<CatalogStore> {
        Arc::new(
            CatalogStore::builder()
                .program(Program {
                    id: ProgramId("rust-systems".to_string()),
                    title: "Rust Systems Certificate".to_string(),
                    price_cents: 20_000,
                    currency: "USD".to_string(),
                    courses: vec![CourseId("foundations".to_string())],
                    published: true,
                })
                .course(Course {
                    id: CourseId("foundations".to_string()),
                    program_id: ProgramId("rust-systems".to_string()),
                    title: "Foundations".to_string(),
                    modules: vec![
                        ModuleId("ownership".to_string()),
                        ModuleId("concurrency".to_string()),
                    ],
                    estimated_hours: 16,
                })
                .module(CourseModule {
                    id: ModuleId("ownership".to_string()),
                    course_id: CourseId("foundations".to_string()),
                    title: "Ownership".to_string(),
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
                    title: "Concurrency".to_string(),
                    kind: ModuleKind::Assessment,
                    required: true,
                    lessons: vec![LessonId("threads".to_string())],
                    assessments: vec![AssessmentId("final-quiz".to_string())],
                })
                .lesson(Lesson {
                    id: LessonId("moves".to_string()),
                    module_id: ModuleId("ownership".to_string()),
                    title: "Move semantics".to_string(),
                    kind: LessonKind::Video,
                    estimated_minutes: 20,
                    is_required: true,
                    is_preview: false,
                })
                .lesson(Lesson {
                    id: LessonId("borrows".to_string()),
                    module_id: ModuleId("ownership".to_string()),
                    title: "Borrowing".to_string(),
                    kind: LessonKind::Reading,
                    estimated_minutes: 15,
                    is_required: true,
                    is_preview: false,
                })
                .lesson(Lesson {
                    id: LessonId("threads".to_string()),
                    module_id: ModuleId("concurrency".to_string()),
                    title: "Threads and channels".to_string(),
                    kind: LessonKind::Coding,
                    estimated_minutes: 40,
                    is_required: true,
                    is_preview: false,
                })
                .assessment(Assessment {
                    id: AssessmentId("final-quiz".to_string()),
                    scope: AssessmentScope::Module(ModuleId("concurrency".to_string())),
                    title: "Checkpoint".to_string(),
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
                                options: vec!["channel".to_string(), "RefCell".to_string()],
                                correct: 0,
                            },
                        },
                    ],
                    passing_score: 70.0,
                    duration_minutes: Some(30),
                    end_date: None,
                    published: true,
                })
                .build()
                .expect("catalog builds"),
        )
    }

    pub fn build_app() -> App {
        let catalog = catalog();
        let policy = LearningPolicy::default();

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

        App {
            enrollment,
            grading,
            scholarships,
            events,
        }
    }

    pub async fn read_json_body(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }
}

use common::*;
use learnflow::assessment::{AnswerInput, AnswerValue};
use learnflow::catalog::{AssessmentId, LessonId, ProgramId};
use learnflow::enrollment::{EnrollRequest, EnrollmentStatus, StudentId};
use learnflow::scholarship::Discount;
use tower::ServiceExt;

#[test]
fn scholarship_funded_program_runs_to_completion() {
    let app = build_app();

    let code = app
        .scholarships
        .create(
            ProgramId("rust-systems".to_string()),
            Discount::Percentage(30.0),
            None,
            Some("ada@example.com".to_string()),
            now(),
        )
        .expect("code created");

    let outcome = app
        .enrollment
        .enroll(
            EnrollRequest {
                student_id: StudentId("ada".to_string()),
                student_email: Some("ada@example.com".to_string()),
                program_id: ProgramId("rust-systems".to_string()),
                scholarship_code: Some(code.code.clone()),
                cohort: Some("2026-summer".to_string()),
            },
            now(),
        )
        .expect("enrollment succeeds");
    let enrollment_id = outcome.record.enrollment.id.clone();
    assert_eq!(outcome.amount_due_cents, 14_000);

    // Work through module one.
    for lesson in ["moves", "borrows"] {
        app.enrollment
            .complete_lesson(&enrollment_id, &LessonId(lesson.to_string()), now())
            .expect("lesson completes");
    }
    let report = app
        .enrollment
        .progress_report(&enrollment_id)
        .expect("report computes");
    assert_eq!(report.percentage, 50.0);

    // Module two: lesson plus the checkpoint quiz.
    app.enrollment
        .complete_lesson(&enrollment_id, &LessonId("threads".to_string()), now())
        .expect("lesson completes");
    let report = app
        .enrollment
        .progress_report(&enrollment_id)
        .expect("report computes");
    assert_eq!(report.percentage, 75.0, "quiz still outstanding");

    app.grading
        .submit(
            &AssessmentId("final-quiz".to_string()),
            &StudentId("ada".to_string()),
            vec![
                AnswerInput {
                    question_index: 0,
                    answer: AnswerValue::Flag(true),
                },
                AnswerInput {
                    question_index: 1,
                    answer: AnswerValue::Choice(0),
                },
            ],
            now(),
        )
        .expect("quiz grades");

    let record = app
        .enrollment
        .transition(&enrollment_id, EnrollmentStatus::Completed, None, now())
        .expect("completion succeeds");
    assert_eq!(record.enrollment.status, EnrollmentStatus::Completed);
    assert_eq!(record.enrollment.completed_at, Some(now()));

    // The notification stream saw the whole journey.
    let templates: Vec<String> = app
        .events
        .events()
        .into_iter()
        .map(|event| event.template)
        .collect();
    assert!(templates.contains(&"scholarship_redeemed".to_string()));
    assert!(templates.contains(&"enrollment_created".to_string()));
    assert!(templates.contains(&"lesson_completed".to_string()));
    assert!(templates.contains(&"submission_graded".to_string()));
    assert!(templates.contains(&"enrollment_status_changed".to_string()));
}

#[tokio::test]
async fn routes_drive_the_enrollment_lifecycle() {
    let app = build_app();
    let router = app.router();

    let response = router
        .clone()
        .oneshot(
            axum::http::Request::post("/api/v1/enrollments")
                .header(axum::http::header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(
                    serde_json::json!({
                        "student_id": "grace",
                        "program_id": "rust-systems",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["amount_due_cents"], 20_000);
    let enrollment_id = payload["enrollment"]["enrollment_id"]
        .as_str()
        .expect("enrollment id present")
        .to_string();

    let response = router
        .clone()
        .oneshot(
            axum::http::Request::post(format!(
                "/api/v1/enrollments/{enrollment_id}/lessons/moves/complete"
            ))
            .body(axum::body::Body::empty())
            .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["lesson"]["status"], "completed");

    let response = router
        .clone()
        .oneshot(
            axum::http::Request::get(format!("/api/v1/enrollments/{enrollment_id}/progress"))
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["percentage"], 25.0);

    // Completing early is rejected with the specific reason.
    let response = router
        .clone()
        .oneshot(
            axum::http::Request::patch(format!("/api/v1/enrollments/{enrollment_id}/status"))
                .header(axum::http::header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(
                    serde_json::json!({ "status": "COMPLETED" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), axum::http::StatusCode::CONFLICT);
    let payload = read_json_body(response).await;
    assert_eq!(payload["kind"], "incomplete_progress");

    // Dropping is always available from ACTIVE, and terminal afterwards.
    let response = router
        .clone()
        .oneshot(
            axum::http::Request::patch(format!("/api/v1/enrollments/{enrollment_id}/status"))
                .header(axum::http::header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(
                    serde_json::json!({ "status": "DROPPED" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), axum::http::StatusCode::OK);

    let response = router
        .oneshot(
            axum::http::Request::patch(format!("/api/v1/enrollments/{enrollment_id}/status"))
                .header(axum::http::header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(
                    serde_json::json!({ "status": "ACTIVE" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), axum::http::StatusCode::CONFLICT);
    let payload = read_json_body(response).await;
    assert_eq!(payload["kind"], "invalid_transition");
}

#[tokio::test]
async fn scholarship_routes_redeem_and_report_stats() {
    let app = build_app();
    let router = app.router();

    let response = router
        .clone()
        .oneshot(
            axum::http::Request::post("/api/v1/scholarships/bulk")
                .header(axum::http::header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(
                    serde_json::json!({
                        "program_id": "rust-systems",
                        "quantity": 3,
                        "discount_type": "fixed",
                        "discount_value": 5_000,
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    let payload = read_json_body(response).await;
    let codes = payload.as_array().expect("array of codes");
    assert_eq!(codes.len(), 3);
    let code = codes[0]["code"].as_str().expect("code present").to_string();

    let response = router
        .clone()
        .oneshot(
            axum::http::Request::post("/api/v1/scholarships/redeem")
                .header(axum::http::header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(
                    serde_json::json!({
                        "code": code,
                        "student_id": "ada",
                        "program_id": "rust-systems",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["discounted_price_cents"], 15_000);

    // Second redemption of the same code conflicts.
    let response = router
        .clone()
        .oneshot(
            axum::http::Request::post("/api/v1/scholarships/redeem")
                .header(axum::http::header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(
                    serde_json::json!({
                        "code": code,
                        "student_id": "grace",
                        "program_id": "rust-systems",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), axum::http::StatusCode::CONFLICT);
    let payload = read_json_body(response).await;
    assert_eq!(payload["kind"], "already_used");

    let response = router
        .oneshot(
            axum::http::Request::get("/api/v1/programs/rust-systems/scholarships/stats")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["total"], 3);
    assert_eq!(payload["used"], 1);
    assert_eq!(payload["active"], 2);
    assert_eq!(payload["total_discount_cents"], 5_000);
}
