use super::{Classroom, Duty, FixedAssignment, Location, Subject, Teacher, TimeGrid};
use crate::config::SolverConfig;

/// All input data bundled together, mirroring the teacher's `ScheduleInput`.
#[derive(Debug)]
pub struct Instance {
    pub teachers: Vec<Teacher>,
    pub classrooms: Vec<Classroom>,
    pub subjects: Vec<Subject>,
    pub locations: Vec<Location>,
    pub fixed_assignments: Vec<FixedAssignment>,
    pub lesson_groups: Vec<super::LessonGroup>,
    pub duties: Vec<Duty>,
    pub time_grid: TimeGrid,
    pub config: SolverConfig,
}
