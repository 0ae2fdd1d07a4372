//! Read-mostly catalog records: programs, courses, modules, lessons, and assessment
//! definitions. The engines treat this store as immutable structure; authoring flows
//! that mutate it live outside this crate.

pub mod domain;
pub mod store;

pub use domain::{
    Assessment, AssessmentId, AssessmentKind, AssessmentScope, Course, CourseId, CourseModule,
    Lesson, LessonId, LessonKind, ModuleId, ModuleKind, Program, ProgramId, Question, QuestionKind,
};
pub use store::{CatalogBuilder, CatalogError, CatalogStore};
