use crate::error::{Result, TimetableError};
use crate::types::{ClassroomId, Instance, LocationId, SubjectId, TeacherId};
use std::collections::HashSet;

/// Validation result with collected errors, matching the teacher's
/// `ValidationResult` (errors and warnings are gathered in bulk rather than
/// failing on the first bad record).
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }
}

/// Structural validation of the raw instance: duplicate ids, dangling
/// references, and per-field sanity (`Subject::validate`). Eligibility and
/// capacity feasibility are the Model Compiler's job (`model::compiler`).
pub fn validate_instance(input: &Instance) -> Result<ValidationResult> {
    let mut result = ValidationResult::default();

    check_duplicate_ids(
        "teacher",
        input.teachers.iter().map(|t| &t.id),
        &mut result,
    );
    check_duplicate_ids(
        "classroom",
        input.classrooms.iter().map(|c| &c.id),
        &mut result,
    );
    check_duplicate_ids(
        "subject",
        input.subjects.iter().map(|s| &s.id),
        &mut result,
    );
    check_duplicate_ids(
        "location",
        input.locations.iter().map(|l| &l.id),
        &mut result,
    );

    let classroom_ids: HashSet<&ClassroomId> = input.classrooms.iter().map(|c| &c.id).collect();
    let location_ids: HashSet<&LocationId> = input.locations.iter().map(|l| &l.id).collect();
    let teacher_ids: HashSet<&TeacherId> = input.teachers.iter().map(|t| &t.id).collect();
    let subject_ids: HashSet<&SubjectId> = input.subjects.iter().map(|s| &s.id).collect();

    for subject in &input.subjects {
        if let Err(msg) = subject.validate() {
            result.add_error(msg);
        }
        for classroom_id in &subject.assigned_class_ids {
            if !classroom_ids.contains(classroom_id) {
                result.add_error(format!(
                    "subject '{}' references unknown classroom '{}'",
                    subject.id, classroom_id
                ));
            }
        }
        if let Some(loc) = &subject.location_id {
            if !location_ids.contains(loc) {
                result.add_error(format!(
                    "subject '{}' references unknown location '{}'",
                    subject.id, loc
                ));
            }
        }
        for (classroom_id, teacher_id) in &subject.pinned_teacher_by_classroom {
            if !teacher_ids.contains(teacher_id) {
                result.add_error(format!(
                    "subject '{}' pins unknown teacher '{}' for classroom '{}'",
                    subject.id, teacher_id, classroom_id
                ));
            }
        }
    }

    for fa in &input.fixed_assignments {
        if !classroom_ids.contains(&fa.classroom_id) {
            result.add_error(format!(
                "fixed assignment references unknown classroom '{}'",
                fa.classroom_id
            ));
        }
        if !subject_ids.contains(&fa.subject_id) {
            result.add_error(format!(
                "fixed assignment references unknown subject '{}'",
                fa.subject_id
            ));
        }
        if fa.day >= 5 {
            result.add_error(format!(
                "fixed assignment for classroom '{}' has out-of-range day {}",
                fa.classroom_id, fa.day
            ));
        }
    }

    for duty in &input.duties {
        if !teacher_ids.contains(&duty.teacher_id) {
            result.add_error(format!(
                "duty references unknown teacher '{}'",
                duty.teacher_id
            ));
        }
    }

    for group in &input.lesson_groups {
        if !subject_ids.contains(&group.subject_id) {
            result.add_error(format!(
                "lesson group '{}' references unknown subject '{}'",
                group.id, group.subject_id
            ));
        }
        for classroom_id in &group.classroom_ids {
            if !classroom_ids.contains(classroom_id) {
                result.add_error(format!(
                    "lesson group '{}' references unknown classroom '{}'",
                    group.id, classroom_id
                ));
            }
        }
    }

    if let Err(msg) = input.time_grid.validate() {
        result.add_error(msg);
    }
    if let Err(msg) = input.config.validate() {
        result.add_error(msg);
    }

    if input.teachers.is_empty() {
        result.add_warning("instance has no teachers".to_string());
    }

    Ok(result)
}

fn check_duplicate_ids<'a, T: Eq + std::hash::Hash + std::fmt::Display + 'a>(
    id_type: &str,
    ids: impl Iterator<Item = &'a T>,
    result: &mut ValidationResult,
) {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            result.add_error(
                TimetableError::DuplicateId {
                    id_type: id_type.to_string(),
                    id: id.to_string(),
                }
                .to_string(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SolverConfig;
    use crate::types::{Classroom, ClassGroup, Level, TimeGrid};

    fn empty_instance() -> Instance {
        Instance {
            teachers: vec![],
            classrooms: vec![],
            subjects: vec![],
            locations: vec![],
            fixed_assignments: vec![],
            lesson_groups: vec![],
            duties: vec![],
            time_grid: TimeGrid {
                middle: [6, 6, 6, 6, 6],
                high: [7, 7, 7, 7, 7],
            },
            config: SolverConfig::default(),
        }
    }

    #[test]
    fn flags_duplicate_classroom_ids() {
        let mut inst = empty_instance();
        inst.classrooms = vec![
            Classroom {
                id: ClassroomId::from("c1"),
                name: "9A".into(),
                level: Level::High,
                group: ClassGroup::None,
                homeroom_teacher: None,
            },
            Classroom {
                id: ClassroomId::from("c1"),
                name: "9B".into(),
                level: Level::High,
                group: ClassGroup::None,
                homeroom_teacher: None,
            },
        ];
        let result = validate_instance(&inst).unwrap();
        assert!(!result.is_valid());
    }

    #[test]
    fn empty_instance_is_structurally_valid() {
        let inst = empty_instance();
        let result = validate_instance(&inst).unwrap();
        assert!(result.is_valid());
        assert!(!result.warnings.is_empty());
    }
}
