use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use crate::catalog::{
    CatalogStore, Course, CourseId, CourseModule, Lesson, LessonId, LessonKind, ModuleId,
    ModuleKind, Program, ProgramId,
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

pub(super) type TestEnrollmentService = EnrollmentService<
    InMemoryEnrollmentRepository,
    InMemorySubmissionRepository,
    InMemoryScholarshipRepository,
    RecordingEventPublisher,
>;

pub(super) struct Stack {
    pub(super) service: TestEnrollmentService,
    pub(super) scholarships: Arc<
        ScholarshipRedemptionEngine<InMemoryScholarshipRepository, RecordingEventPublisher>,
    >,
    pub(super) enrollments: Arc<InMemoryEnrollmentRepository>,
    pub(super) events: Arc<RecordingEventPublisher>,
}

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, 10, 0, 0).unwrap()
}

fn lesson(id: &str, module: &str, required: bool, preview: bool) -> Lesson {
    Lesson {
        id: LessonId(id.to_string()),
        module_id: ModuleId(module.to_string()),
        title: format!("Lesson {id}"),
        kind: LessonKind::Reading,
        estimated_minutes: 20,
        is_required: required,
        is_preview: preview,
    }
}

fn module(id: &str, lessons: &[&str]) -> CourseModule {
    CourseModule {
        id: ModuleId(id.to_string()),
        course_id: CourseId("c1".to_string()),
        title: format!("Module {id}"),
        kind: ModuleKind::Core,
        required: true,
        lessons: lessons
            .iter()
            .map(|lesson| LessonId(lesson.to_string()))
            .collect(),
        assessments: Vec::new(),
    }
}

/// One $200 program, one course, two required modules of two required lessons each.
/// `l3` is a preview lesson so gate-bypass behavior stays testable.
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
                modules: vec![ModuleId("m1".to_string()), ModuleId("m2".to_string())],
                estimated_hours: 10,
            })
            .module(module("m1", &["l1", "l2"]))
            .module(module("m2", &["l3", "l4"]))
            .lesson(lesson("l1", "m1", true, false))
            .lesson(lesson("l2", "m1", true, false))
            .lesson(lesson("l3", "m2", true, true))
            .lesson(lesson("l4", "m2", true, false))
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
        submissions,
        &policy,
    ));
    let scholarships = Arc::new(ScholarshipRedemptionEngine::new(
        catalog.clone(),
        scholarships_repo,
        events.clone(),
    ));
    let service = EnrollmentService::new(
        catalog,
        enrollments.clone(),
        progress,
        scholarships.clone(),
        events.clone(),
        policy,
    );

    Stack {
        service,
        scholarships,
        enrollments,
        events,
    }
}

pub(super) fn enroll_request(student: &str) -> EnrollRequest {
    EnrollRequest {
        student_id: StudentId(student.to_string()),
        student_email: None,
        program_id: ProgramId("p1".to_string()),
        scholarship_code: None,
        cohort: Some("2026-spring".to_string()),
    }
}
