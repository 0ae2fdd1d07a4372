use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use crate::catalog::{CatalogStore, CourseId, Program, ProgramId};
use crate::enrollment::StudentId;
use crate::memory::{InMemoryScholarshipRepository, RecordingEventPublisher};
use crate::scholarship::domain::RedemptionClaim;
use crate::scholarship::service::ScholarshipRedemptionEngine;

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 1, 12, 0, 0).unwrap()
}

pub(super) fn catalog() -> Arc<CatalogStore> {
    Arc::new(
        CatalogStore::builder()
            .program(Program {
                id: ProgramId("p1".to_string()),
                title: "Systems Track".to_string(),
                price_cents: 20_000,
                currency: "USD".to_string(),
                courses: Vec::<CourseId>::new(),
                published: true,
            })
            .build()
            .expect("catalog builds"),
    )
}

pub(super) fn claim_for(student: &str) -> RedemptionClaim {
    RedemptionClaim {
        student_id: StudentId(student.to_string()),
        student_email: None,
        program_id: ProgramId("p1".to_string()),
        now: now(),
    }
}

pub(super) fn build_engine() -> (
    ScholarshipRedemptionEngine<InMemoryScholarshipRepository, RecordingEventPublisher>,
    Arc<InMemoryScholarshipRepository>,
    Arc<RecordingEventPublisher>,
) {
    let repository = Arc::new(InMemoryScholarshipRepository::default());
    let events = Arc::new(RecordingEventPublisher::default());
    let engine = ScholarshipRedemptionEngine::new(catalog(), repository.clone(), events.clone());
    (engine, repository, events)
}
