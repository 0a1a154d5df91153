use crate::error::{Result, TimetableError};
use crate::types::{Cell, Instance, Level, LessonUnitIndex, LocationId, SubjectId, TeacherId};
use itertools::Itertools;
use std::collections::HashMap;

/// A teacher after index compilation; `availability[day]` has duty-blocked
/// periods already cleared, the way the teacher's own `assign_time_slots`
/// tracks per-teacher occupied periods directly rather than re-deriving them.
#[derive(Debug, Clone)]
pub struct CompiledTeacher {
    pub id: TeacherId,
    pub name: String,
    pub availability: Vec<u32>,
}

impl CompiledTeacher {
    pub fn is_free(&self, day: u8, period: u8) -> bool {
        self.availability
            .get(day as usize)
            .map(|mask| mask & (1 << period) != 0)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone)]
pub struct CompiledClassroom {
    pub id: crate::types::ClassroomId,
    pub level: Level,
    /// bitmask per day of periods that exist in the ragged grid.
    pub valid_mask: Vec<u32>,
}

/// One atomic scheduling requirement: a singleton hour, or one 2/3-block,
/// for a (subject, classroom-set) pair.
#[derive(Debug, Clone)]
pub struct LessonUnit {
    pub index: LessonUnitIndex,
    pub subject_id: SubjectId,
    pub classroom_idxs: Vec<usize>,
    pub span: u8,
    pub required_teacher_count: u8,
    /// Each inner vec is an admissible teacher-tuple (indices into
    /// `CompiledModel::teachers`), sized `required_teacher_count`.
    pub eligible_tuples: Vec<Vec<usize>>,
    pub location_idx: Option<usize>,
    pub fixed_start: Option<Cell>,
    pub day_restriction: Option<u8>,
    pub max_consec: u8,
}

pub struct CompiledModel {
    pub teachers: Vec<CompiledTeacher>,
    pub classrooms: Vec<CompiledClassroom>,
    pub locations: Vec<LocationId>,
    pub units: Vec<LessonUnit>,
    pub teacher_index: HashMap<TeacherId, usize>,
    pub classroom_index: HashMap<crate::types::ClassroomId, usize>,
    pub max_daily_hours: u8,
}

/// Compile a declarative instance into an index-based model, collecting
/// every structural/eligibility error in bulk rather than failing on the
/// first one (mirroring the teacher's `validate_input`).
pub fn compile(instance: &Instance) -> Result<CompiledModel> {
    let mut errors: Vec<TimetableError> = Vec::new();
    let max_daily_hours = instance.time_grid.max_daily_hours();

    let teacher_index: HashMap<TeacherId, usize> = instance
        .teachers
        .iter()
        .enumerate()
        .map(|(i, t)| (t.id.clone(), i))
        .collect();

    let teachers: Vec<CompiledTeacher> = instance
        .teachers
        .iter()
        .map(|t| {
            let mut availability = vec![0u32; 5];
            for day in 0..5u8 {
                let mut mask = 0u32;
                for period in 0..max_daily_hours {
                    if t.is_available(day, period) {
                        mask |= 1 << period;
                    }
                }
                availability[day as usize] = mask;
            }
            for duty in &instance.duties {
                if duty.teacher_id != t.id {
                    continue;
                }
                match duty.period {
                    Some(p) => availability[duty.day as usize] &= !(1 << p),
                    None => availability[duty.day as usize] = 0,
                }
            }
            CompiledTeacher {
                id: t.id.clone(),
                name: t.name.clone(),
                availability,
            }
        })
        .collect();

    let classroom_index: HashMap<crate::types::ClassroomId, usize> = instance
        .classrooms
        .iter()
        .enumerate()
        .map(|(i, c)| (c.id.clone(), i))
        .collect();

    let classrooms: Vec<CompiledClassroom> = instance
        .classrooms
        .iter()
        .map(|c| {
            let mut valid_mask = vec![0u32; 5];
            for day in 0..5u8 {
                let hours = instance.time_grid.hours(c.level, day);
                valid_mask[day as usize] = if hours >= 32 { u32::MAX } else { (1u32 << hours) - 1 };
            }
            CompiledClassroom {
                id: c.id.clone(),
                level: c.level,
                valid_mask,
            }
        })
        .collect();

    let location_index: HashMap<LocationId, usize> = instance
        .locations
        .iter()
        .enumerate()
        .map(|(i, l)| (l.id.clone(), i))
        .collect();
    let locations: Vec<LocationId> = instance.locations.iter().map(|l| l.id.clone()).collect();

    // Per-classroom weekly demand, for the capacity check.
    let mut demand: HashMap<usize, u32> = HashMap::new();

    let mut units: Vec<LessonUnit> = Vec::new();

    for subject in &instance.subjects {
        if let Err(_msg) = subject.validate() {
            errors.push(TimetableError::BlockSumInvalid {
                subject_id: subject.id.to_string(),
            });
            continue;
        }

        for classroom_id in &subject.assigned_class_ids {
            let Some(&classroom_idx) = classroom_index.get(classroom_id) else {
                errors.push(TimetableError::Infeasible {
                    reason: format!(
                        "subject '{}' references unknown classroom '{classroom_id}'",
                        subject.id
                    ),
                });
                continue;
            };
            let level = classrooms[classroom_idx].level;

            let pinned = subject.pinned_teacher_by_classroom.get(classroom_id);
            let eligible_single = eligible_teachers(
                instance,
                &teacher_index,
                subject,
                level,
                classroom_id,
                pinned,
                &mut errors,
            );
            if eligible_single.is_empty() {
                continue;
            }

            let tuples: Vec<Vec<usize>> = if pinned.is_some() {
                vec![eligible_single.clone()]
            } else {
                eligible_single
                    .iter()
                    .copied()
                    .combinations(subject.required_teacher_count as usize)
                    .collect()
            };
            if tuples.is_empty() {
                errors.push(TimetableError::NoEligibleTeacher {
                    subject_id: subject.id.to_string(),
                    classroom_id: classroom_id.to_string(),
                });
                continue;
            }

            *demand.entry(classroom_idx).or_default() += subject.weekly_hours as u32;

            let location_idx = subject.location_id.as_ref().and_then(|l| location_index.get(l)).copied();

            let fixed = instance
                .fixed_assignments
                .iter()
                .find(|fa| fa.classroom_id == *classroom_id && fa.subject_id == subject.id);
            let (fixed_start, day_restriction) = match fixed {
                Some(fa) => {
                    if fa.day >= 5 {
                        errors.push(TimetableError::FixedOutOfRange {
                            classroom_id: classroom_id.to_string(),
                        });
                        (None, None)
                    } else {
                        match fa.period {
                            Some(p) => (Some(Cell::new(fa.day, p)), None),
                            None => (None, Some(fa.day)),
                        }
                    }
                }
                None => (None, None),
            };

            for _ in 0..(subject.triple_block_hours / 3) {
                let idx = units.len();
                units.push(new_unit(
                    idx,
                    subject,
                    vec![classroom_idx],
                    3,
                    tuples.clone(),
                    location_idx,
                    fixed_start,
                    day_restriction,
                ));
            }
            for _ in 0..(subject.block_hours / 2) {
                let idx = units.len();
                units.push(new_unit(
                    idx,
                    subject,
                    vec![classroom_idx],
                    2,
                    tuples.clone(),
                    location_idx,
                    fixed_start,
                    day_restriction,
                ));
            }
            for _ in 0..subject.singleton_hours() {
                let idx = units.len();
                units.push(new_unit(
                    idx,
                    subject,
                    vec![classroom_idx],
                    1,
                    tuples.clone(),
                    location_idx,
                    fixed_start,
                    day_restriction,
                ));
            }
        }
    }

    for group in &instance.lesson_groups {
        let Some(subject) = instance.subjects.iter().find(|s| s.id == group.subject_id) else {
            errors.push(TimetableError::Infeasible {
                reason: format!(
                    "lesson group '{}' references unknown subject '{}'",
                    group.id, group.subject_id
                ),
            });
            continue;
        };
        let mut classroom_idxs = Vec::new();
        let mut levels = Vec::new();
        let mut ok = true;
        for cid in &group.classroom_ids {
            match classroom_index.get(cid) {
                Some(&idx) => {
                    classroom_idxs.push(idx);
                    levels.push(classrooms[idx].level);
                }
                None => {
                    errors.push(TimetableError::Infeasible {
                        reason: format!(
                            "lesson group '{}' references unknown classroom '{cid}'",
                            group.id
                        ),
                    });
                    ok = false;
                }
            }
        }
        if !ok || classroom_idxs.is_empty() {
            continue;
        }

        let eligible_single: Vec<usize> = instance
            .teachers
            .iter()
            .enumerate()
            .filter(|(_, t)| {
                (t.branches.is_empty() || t.teaches_branch(&subject.name))
                    && levels.iter().all(|&lvl| t.authorized_for(lvl))
            })
            .map(|(i, _)| i)
            .collect();
        if eligible_single.is_empty() {
            errors.push(TimetableError::NoEligibleTeacher {
                subject_id: subject.id.to_string(),
                classroom_id: group.id.to_string(),
            });
            continue;
        }
        let tuples: Vec<Vec<usize>> = eligible_single
            .into_iter()
            .combinations(subject.required_teacher_count as usize)
            .collect();
        if tuples.is_empty() {
            errors.push(TimetableError::NoEligibleTeacher {
                subject_id: subject.id.to_string(),
                classroom_id: group.id.to_string(),
            });
            continue;
        }

        let span = if group.is_block { 2 } else { 1 };
        for _ in 0..group.weekly_hours {
            let idx = units.len();
            units.push(new_unit(
                idx,
                subject,
                classroom_idxs.clone(),
                span,
                tuples.clone(),
                None,
                None,
                None,
            ));
        }
    }

    for (&classroom_idx, &weekly_demand) in &demand {
        let classroom = &instance.classrooms[classroom_idx];
        let capacity: u32 = (0..5)
            .map(|d| instance.time_grid.hours(classroom.level, d) as u32)
            .sum();
        if weekly_demand > capacity {
            errors.push(TimetableError::CapacityExceeded {
                classroom_id: classroom.id.to_string(),
                demand: weekly_demand,
                capacity,
            });
        }
    }

    if errors.len() == 1 {
        return Err(errors.pop().unwrap().into());
    }
    if !errors.is_empty() {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        return Err(TimetableError::Infeasible {
            reason: format!("{} model compilation error(s):\n{}", messages.len(), messages.join("\n")),
        }
        .into());
    }

    Ok(CompiledModel {
        teachers,
        classrooms,
        locations,
        units,
        teacher_index,
        classroom_index,
        max_daily_hours,
    })
}

#[allow(clippy::too_many_arguments)]
fn new_unit(
    index: usize,
    subject: &crate::types::Subject,
    classroom_idxs: Vec<usize>,
    span: u8,
    eligible_tuples: Vec<Vec<usize>>,
    location_idx: Option<usize>,
    fixed_start: Option<Cell>,
    day_restriction: Option<u8>,
) -> LessonUnit {
    LessonUnit {
        index: LessonUnitIndex(index),
        subject_id: subject.id.clone(),
        classroom_idxs,
        span,
        required_teacher_count: subject.required_teacher_count,
        eligible_tuples,
        location_idx,
        fixed_start,
        day_restriction,
        max_consec: subject.max_consec_or_default(),
    }
}

/// Teachers eligible for `subject` at `level`: a pin (if present and
/// qualified), otherwise branch-match plus level authorization. Pushes
/// `PinUnqualified` for a disqualified pin, `NoEligibleTeacher` when no
/// teacher matches the subject's branch at all, and `LevelMismatch` when
/// branch-matched teachers exist but none is authorized for `level`.
fn eligible_teachers(
    instance: &Instance,
    teacher_index: &HashMap<TeacherId, usize>,
    subject: &crate::types::Subject,
    level: Level,
    classroom_id: &crate::types::ClassroomId,
    pinned: Option<&TeacherId>,
    errors: &mut Vec<TimetableError>,
) -> Vec<usize> {
    if let Some(pinned_id) = pinned {
        return match teacher_index.get(pinned_id) {
            Some(&idx) => {
                let t = &instance.teachers[idx];
                if (!t.teaches_branch(&subject.name) && !t.branches.is_empty()) || !t.authorized_for(level) {
                    errors.push(TimetableError::PinUnqualified {
                        teacher_id: pinned_id.to_string(),
                        subject_id: subject.id.to_string(),
                    });
                    return vec![];
                }
                vec![idx]
            }
            None => {
                errors.push(TimetableError::PinUnqualified {
                    teacher_id: pinned_id.to_string(),
                    subject_id: subject.id.to_string(),
                });
                vec![]
            }
        };
    }

    let branch_matched: Vec<usize> = instance
        .teachers
        .iter()
        .enumerate()
        .filter(|(_, t)| t.branches.is_empty() || t.teaches_branch(&subject.name))
        .map(|(i, _)| i)
        .collect();
    if branch_matched.is_empty() {
        errors.push(TimetableError::NoEligibleTeacher {
            subject_id: subject.id.to_string(),
            classroom_id: classroom_id.to_string(),
        });
        return vec![];
    }

    let level_authorized: Vec<usize> = branch_matched
        .into_iter()
        .filter(|&i| instance.teachers[i].authorized_for(level))
        .collect();
    if level_authorized.is_empty() {
        errors.push(TimetableError::LevelMismatch {
            subject_id: subject.id.to_string(),
            classroom_id: classroom_id.to_string(),
        });
    }
    level_authorized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SolverConfig;
    use crate::types::{ClassGroup, Classroom, ClassroomId, Subject, SubjectId, Teacher, TimeGrid};
    use std::collections::HashMap as StdHashMap;

    fn trivial_instance() -> Instance {
        Instance {
            teachers: vec![Teacher {
                id: TeacherId::from("t1"),
                name: "Ada".into(),
                branches: vec!["Matematik".into()],
                levels: vec![Level::High],
                availability: vec![u32::MAX; 5],
            }],
            classrooms: vec![Classroom {
                id: ClassroomId::from("c1"),
                name: "9A".into(),
                level: Level::High,
                group: ClassGroup::None,
                homeroom_teacher: None,
            }],
            subjects: vec![Subject {
                id: SubjectId::from("mat"),
                name: "Matematik".into(),
                weekly_hours: 10,
                block_hours: 0,
                triple_block_hours: 0,
                max_consec: None,
                assigned_class_ids: vec![ClassroomId::from("c1")],
                location_id: None,
                pinned_teacher_by_classroom: StdHashMap::new(),
                required_teacher_count: 1,
            }],
            locations: vec![],
            fixed_assignments: vec![],
            lesson_groups: vec![],
            duties: vec![],
            time_grid: TimeGrid {
                middle: [6, 6, 6, 6, 6],
                high: [2, 2, 2, 2, 2],
            },
            config: SolverConfig::default(),
        }
    }

    #[test]
    fn compiles_ten_singleton_units_for_scenario_a() {
        let model = compile(&trivial_instance()).unwrap();
        assert_eq!(model.units.len(), 10);
        assert!(model.units.iter().all(|u| u.span == 1));
        assert!(model.units.iter().all(|u| u.eligible_tuples == vec![vec![0]]));
    }

    #[test]
    fn rejects_subject_with_no_eligible_teacher() {
        let mut inst = trivial_instance();
        inst.teachers[0].branches = vec!["Fizik".into()];
        assert!(compile(&inst).is_err());
    }

    #[test]
    fn capacity_exceeded_is_reported() {
        let mut inst = trivial_instance();
        inst.subjects[0].weekly_hours = 99;
        let err = compile(&inst).unwrap_err();
        assert!(format!("{err}").contains("exceeds weekly capacity"));
    }
}
