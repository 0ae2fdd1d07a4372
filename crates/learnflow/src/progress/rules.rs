use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::catalog::{
    AssessmentId, CatalogStore, Course, CourseId, CourseModule, LessonId, ModuleId, Program,
    ProgramId,
};

/// A percentage at or above this counts as complete. Means of exact 100s stay exact,
/// but the epsilon keeps float folds honest.
pub const COMPLETION_THRESHOLD: f64 = 100.0 - 1e-9;

/// Durable facts the roll-up derives from. The aggregator owns no storage: callers
/// collect these from enrollment and submission records, and recomputing from the
/// same facts always yields the same percentages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressFacts {
    pub completed_lessons: BTreeSet<LessonId>,
    pub passed_assessments: BTreeSet<AssessmentId>,
}

/// Module roll-up. `total_items` counts required lessons (all lessons when the module
/// has no required ones) plus module-scoped assessments as pseudo-lessons.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleProgress {
    pub module_id: ModuleId,
    pub title: String,
    pub percentage: f64,
    pub completed_items: usize,
    pub total_items: usize,
}

impl ModuleProgress {
    pub fn is_complete(&self) -> bool {
        self.percentage >= COMPLETION_THRESHOLD
    }
}

/// Course roll-up: the unweighted mean of its module percentages, so every module
/// counts equally regardless of lesson count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseProgress {
    pub course_id: CourseId,
    pub title: String,
    pub percentage: f64,
    pub modules: Vec<ModuleProgress>,
}

/// Program roll-up: the unweighted mean of its course percentages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramProgress {
    pub program_id: ProgramId,
    pub percentage: f64,
    pub courses: Vec<CourseProgress>,
}

impl ProgramProgress {
    pub fn is_complete(&self) -> bool {
        self.percentage >= COMPLETION_THRESHOLD
    }

    /// Snapshot percentages persisted onto the enrollment record.
    pub fn course_snapshot(&self) -> BTreeMap<CourseId, f64> {
        self.courses
            .iter()
            .map(|course| (course.course_id.clone(), course.percentage))
            .collect()
    }
}

pub fn module_completion(
    catalog: &CatalogStore,
    module: &CourseModule,
    facts: &ProgressFacts,
) -> ModuleProgress {
    let lessons = catalog.lessons_of(module);
    let required: Vec<_> = lessons.iter().filter(|lesson| lesson.is_required).collect();
    let countable: Vec<&LessonId> = if required.is_empty() {
        lessons.iter().map(|lesson| &lesson.id).collect()
    } else {
        required.iter().map(|lesson| &lesson.id).collect()
    };

    let assessments = catalog.assessments_of(module);

    let total_items = countable.len() + assessments.len();
    let completed_lessons = countable
        .iter()
        .filter(|id| facts.completed_lessons.contains(**id))
        .count();
    let completed_assessments = assessments
        .iter()
        .filter(|assessment| facts.passed_assessments.contains(&assessment.id))
        .count();
    let completed_items = completed_lessons + completed_assessments;

    // A module with nothing countable can never block completion.
    let percentage = if total_items == 0 {
        100.0
    } else {
        100.0 * completed_items as f64 / total_items as f64
    };

    ModuleProgress {
        module_id: module.id.clone(),
        title: module.title.clone(),
        percentage,
        completed_items,
        total_items,
    }
}

pub fn course_completion(
    catalog: &CatalogStore,
    course: &Course,
    facts: &ProgressFacts,
) -> CourseProgress {
    let modules: Vec<ModuleProgress> = catalog
        .modules_of(course)
        .into_iter()
        .map(|module| module_completion(catalog, module, facts))
        .collect();

    let percentage = mean(modules.iter().map(|module| module.percentage));

    CourseProgress {
        course_id: course.id.clone(),
        title: course.title.clone(),
        percentage,
        modules,
    }
}

pub fn program_completion(
    catalog: &CatalogStore,
    program: &Program,
    facts: &ProgressFacts,
) -> ProgramProgress {
    let courses: Vec<CourseProgress> = catalog
        .courses_of(program)
        .into_iter()
        .map(|course| course_completion(catalog, course, facts))
        .collect();

    let percentage = mean(courses.iter().map(|course| course.percentage));

    ProgramProgress {
        program_id: program.id.clone(),
        percentage,
        courses,
    }
}

/// Lock-step gate: a lesson may start only when every earlier required module of the
/// same course is complete. Preview lessons bypass the gate at the call site.
pub fn lesson_gate_clear(
    catalog: &CatalogStore,
    course: &Course,
    module_id: &ModuleId,
    facts: &ProgressFacts,
) -> bool {
    for module in catalog.modules_of(course) {
        if module.id == *module_id {
            return true;
        }
        if module.required && !module_completion(catalog, module, facts).is_complete() {
            return false;
        }
    }
    // Module not in this course's ordering; nothing to gate on.
    true
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for value in values {
        sum += value;
        count += 1;
    }
    if count == 0 {
        100.0
    } else {
        sum / count as f64
    }
}
