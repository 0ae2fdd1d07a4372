use std::collections::BTreeMap;

use super::domain::{
    Assessment, AssessmentId, AssessmentScope, Course, CourseId, CourseModule, Lesson, LessonId,
    ModuleId, Program, ProgramId,
};

/// In-memory catalog snapshot. Built once through [`CatalogBuilder`], then shared
/// read-only across the engines.
#[derive(Debug, Default)]
pub struct CatalogStore {
    programs: BTreeMap<ProgramId, Program>,
    courses: BTreeMap<CourseId, Course>,
    modules: BTreeMap<ModuleId, CourseModule>,
    lessons: BTreeMap<LessonId, Lesson>,
    assessments: BTreeMap<AssessmentId, Assessment>,
}

impl CatalogStore {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    pub fn program(&self, id: &ProgramId) -> Option<&Program> {
        self.programs.get(id)
    }

    pub fn course(&self, id: &CourseId) -> Option<&Course> {
        self.courses.get(id)
    }

    pub fn module(&self, id: &ModuleId) -> Option<&CourseModule> {
        self.modules.get(id)
    }

    pub fn lesson(&self, id: &LessonId) -> Option<&Lesson> {
        self.lessons.get(id)
    }

    pub fn assessment(&self, id: &AssessmentId) -> Option<&Assessment> {
        self.assessments.get(id)
    }

    /// Courses of a program in catalog order.
    pub fn courses_of(&self, program: &Program) -> Vec<&Course> {
        program
            .courses
            .iter()
            .filter_map(|id| self.courses.get(id))
            .collect()
    }

    /// Modules of a course in catalog order.
    pub fn modules_of(&self, course: &Course) -> Vec<&CourseModule> {
        course
            .modules
            .iter()
            .filter_map(|id| self.modules.get(id))
            .collect()
    }

    /// Lessons of a module in catalog order.
    pub fn lessons_of(&self, module: &CourseModule) -> Vec<&Lesson> {
        module
            .lessons
            .iter()
            .filter_map(|id| self.lessons.get(id))
            .collect()
    }

    pub fn assessments_of(&self, module: &CourseModule) -> Vec<&Assessment> {
        module
            .assessments
            .iter()
            .filter_map(|id| self.assessments.get(id))
            .collect()
    }

    /// Resolve the full ancestry of a lesson.
    pub fn lesson_ancestry(&self, id: &LessonId) -> Option<LessonAncestry<'_>> {
        let lesson = self.lessons.get(id)?;
        let module = self.modules.get(&lesson.module_id)?;
        let course = self.courses.get(&module.course_id)?;
        let program = self.programs.get(&course.program_id)?;
        Some(LessonAncestry {
            program,
            course,
            module,
            lesson,
        })
    }

    /// Program that owns an assessment, through its course or module scope.
    pub fn program_of_assessment(&self, assessment: &Assessment) -> Option<&Program> {
        let course_id = match &assessment.scope {
            AssessmentScope::Course(course_id) => course_id.clone(),
            AssessmentScope::Module(module_id) => self.modules.get(module_id)?.course_id.clone(),
        };
        let course = self.courses.get(&course_id)?;
        self.programs.get(&course.program_id)
    }

    /// Every assessment definition reachable from a program, in course order.
    pub fn assessments_of_program(&self, program: &Program) -> Vec<&Assessment> {
        self.assessments
            .values()
            .filter(|assessment| {
                self.program_of_assessment(assessment)
                    .map(|owner| owner.id == program.id)
                    .unwrap_or(false)
            })
            .collect()
    }
}

/// Borrowed chain from program down to a single lesson.
#[derive(Debug, Clone, Copy)]
pub struct LessonAncestry<'a> {
    pub program: &'a Program,
    pub course: &'a Course,
    pub module: &'a CourseModule,
    pub lesson: &'a Lesson,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("duplicate {kind} id '{id}'")]
    DuplicateId { kind: &'static str, id: String },
    #[error("{kind} '{id}' references unknown {target} '{target_id}'")]
    UnknownReference {
        kind: &'static str,
        id: String,
        target: &'static str,
        target_id: String,
    },
    #[error("assessment '{0}' has no questions")]
    EmptyAssessment(String),
}

/// Assembles a [`CatalogStore`], verifying referential integrity at `build` time so
/// the engines can navigate the tree without re-checking every edge.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    programs: Vec<Program>,
    courses: Vec<Course>,
    modules: Vec<CourseModule>,
    lessons: Vec<Lesson>,
    assessments: Vec<Assessment>,
}

impl CatalogBuilder {
    pub fn program(mut self, program: Program) -> Self {
        self.programs.push(program);
        self
    }

    pub fn course(mut self, course: Course) -> Self {
        self.courses.push(course);
        self
    }

    pub fn module(mut self, module: CourseModule) -> Self {
        self.modules.push(module);
        self
    }

    pub fn lesson(mut self, lesson: Lesson) -> Self {
        self.lessons.push(lesson);
        self
    }

    pub fn assessment(mut self, assessment: Assessment) -> Self {
        self.assessments.push(assessment);
        self
    }

    pub fn build(self) -> Result<CatalogStore, CatalogError> {
        let mut store = CatalogStore::default();

        for program in self.programs {
            if store.programs.contains_key(&program.id) {
                return Err(CatalogError::DuplicateId {
                    kind: "program",
                    id: program.id.0.clone(),
                });
            }
            store.programs.insert(program.id.clone(), program);
        }

        for course in self.courses {
            if store.courses.contains_key(&course.id) {
                return Err(CatalogError::DuplicateId {
                    kind: "course",
                    id: course.id.0.clone(),
                });
            }
            if !store.programs.contains_key(&course.program_id) {
                return Err(CatalogError::UnknownReference {
                    kind: "course",
                    id: course.id.0.clone(),
                    target: "program",
                    target_id: course.program_id.0.clone(),
                });
            }
            store.courses.insert(course.id.clone(), course);
        }

        for module in self.modules {
            if store.modules.contains_key(&module.id) {
                return Err(CatalogError::DuplicateId {
                    kind: "module",
                    id: module.id.0.clone(),
                });
            }
            if !store.courses.contains_key(&module.course_id) {
                return Err(CatalogError::UnknownReference {
                    kind: "module",
                    id: module.id.0.clone(),
                    target: "course",
                    target_id: module.course_id.0.clone(),
                });
            }
            store.modules.insert(module.id.clone(), module);
        }

        for lesson in self.lessons {
            if store.lessons.contains_key(&lesson.id) {
                return Err(CatalogError::DuplicateId {
                    kind: "lesson",
                    id: lesson.id.0.clone(),
                });
            }
            if !store.modules.contains_key(&lesson.module_id) {
                return Err(CatalogError::UnknownReference {
                    kind: "lesson",
                    id: lesson.id.0.clone(),
                    target: "module",
                    target_id: lesson.module_id.0.clone(),
                });
            }
            store.lessons.insert(lesson.id.clone(), lesson);
        }

        for assessment in self.assessments {
            if store.assessments.contains_key(&assessment.id) {
                return Err(CatalogError::DuplicateId {
                    kind: "assessment",
                    id: assessment.id.0.clone(),
                });
            }
            if assessment.questions.is_empty() {
                return Err(CatalogError::EmptyAssessment(assessment.id.0.clone()));
            }
            let resolvable = match &assessment.scope {
                AssessmentScope::Course(course_id) => store.courses.contains_key(course_id),
                AssessmentScope::Module(module_id) => store.modules.contains_key(module_id),
            };
            if !resolvable {
                let (target, target_id) = match &assessment.scope {
                    AssessmentScope::Course(course_id) => ("course", course_id.0.clone()),
                    AssessmentScope::Module(module_id) => ("module", module_id.0.clone()),
                };
                return Err(CatalogError::UnknownReference {
                    kind: "assessment",
                    id: assessment.id.0.clone(),
                    target,
                    target_id,
                });
            }
            store.assessments.insert(assessment.id.clone(), assessment);
        }

        // Ordering lists must only name known children.
        for program in store.programs.values() {
            for course_id in &program.courses {
                if !store.courses.contains_key(course_id) {
                    return Err(CatalogError::UnknownReference {
                        kind: "program",
                        id: program.id.0.clone(),
                        target: "course",
                        target_id: course_id.0.clone(),
                    });
                }
            }
        }
        for course in store.courses.values() {
            for module_id in &course.modules {
                if !store.modules.contains_key(module_id) {
                    return Err(CatalogError::UnknownReference {
                        kind: "course",
                        id: course.id.0.clone(),
                        target: "module",
                        target_id: module_id.0.clone(),
                    });
                }
            }
        }
        for module in store.modules.values() {
            for lesson_id in &module.lessons {
                if !store.lessons.contains_key(lesson_id) {
                    return Err(CatalogError::UnknownReference {
                        kind: "module",
                        id: module.id.0.clone(),
                        target: "lesson",
                        target_id: lesson_id.0.clone(),
                    });
                }
            }
            for assessment_id in &module.assessments {
                if !store.assessments.contains_key(assessment_id) {
                    return Err(CatalogError::UnknownReference {
                        kind: "module",
                        id: module.id.0.clone(),
                        target: "assessment",
                        target_id: assessment_id.0.clone(),
                    });
                }
            }
        }

        Ok(store)
    }
}
