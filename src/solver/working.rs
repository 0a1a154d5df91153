use crate::model::compiler::CompiledModel;
use crate::types::{Assignment, LessonUnitIndex, Schedule, SubjectId};
use std::collections::{HashMap, HashSet};

/// What a classroom grid cell holds while the solver is searching. Carries
/// enough to reconstruct a public `Assignment` without re-deriving it from
/// the compiled model.
#[derive(Debug, Clone)]
pub struct CellOccupant {
    pub unit: LessonUnitIndex,
    pub subject_id: SubjectId,
    pub teacher_idxs: Vec<usize>,
    pub location_idx: Option<usize>,
    pub block_id: u32,
    pub block_span: u8,
}

/// The schedule under construction/modification. Owns the dense grid and
/// the teacher/location occupancy sets so feasibility checks are O(1) per
/// cell, the way the pack's heuristic solver tracks an `Occupancy` struct
/// of `HashSet<(usize, usize)>` rather than re-scanning the schedule.
pub struct WorkingSchedule<'m> {
    pub model: &'m CompiledModel,
    pub grid: Vec<Vec<Vec<Option<CellOccupant>>>>, // [classroom][day][period]
    pub teacher_busy: HashSet<(usize, u8, u8)>,
    pub location_busy: HashSet<(usize, u8, u8)>,
    pub placements: HashMap<LessonUnitIndex, (Vec<usize>, u8, u8)>, // teacher_idxs, day, start_period
    next_block_id: u32,
}

impl<'m> WorkingSchedule<'m> {
    pub fn new(model: &'m CompiledModel) -> Self {
        let periods = model.max_daily_hours as usize;
        let grid = model
            .classrooms
            .iter()
            .map(|_| (0..5).map(|_| vec![None; periods]).collect())
            .collect();
        Self {
            model,
            grid,
            teacher_busy: HashSet::new(),
            location_busy: HashSet::new(),
            placements: HashMap::new(),
            next_block_id: 0,
        }
    }

    pub fn is_placed(&self, unit_idx: LessonUnitIndex) -> bool {
        self.placements.contains_key(&unit_idx)
    }

    /// Feasibility check for placing `unit` at (day, start_period) with
    /// `teacher_idxs`, ignoring `max_consec` (checked separately since it
    /// needs a day-local scan, not a point lookup).
    pub fn can_place(
        &self,
        unit: &crate::model::compiler::LessonUnit,
        day: u8,
        start_period: u8,
        teacher_idxs: &[usize],
    ) -> bool {
        if let Some(restrict_day) = unit.day_restriction {
            if restrict_day != day {
                return false;
            }
        }
        if let Some(fixed) = unit.fixed_start {
            if fixed.day != day || fixed.period != start_period {
                return false;
            }
        }
        let end = start_period + unit.span;
        for &classroom_idx in &unit.classroom_idxs {
            let mask = self.model.classrooms[classroom_idx].valid_mask[day as usize];
            for p in start_period..end {
                if p as usize >= self.grid[classroom_idx][day as usize].len() {
                    return false;
                }
                if mask & (1 << p) == 0 {
                    return false;
                }
                if self.grid[classroom_idx][day as usize][p as usize].is_some() {
                    return false;
                }
            }
        }
        for &teacher_idx in teacher_idxs {
            for p in start_period..end {
                if !self.model.teachers[teacher_idx].is_free(day, p) {
                    return false;
                }
                if self.teacher_busy.contains(&(teacher_idx, day, p)) {
                    return false;
                }
            }
        }
        if let Some(location_idx) = unit.location_idx {
            for p in start_period..end {
                if self.location_busy.contains(&(location_idx, day, p)) {
                    return false;
                }
            }
        }
        true
    }

    /// The rolling same-subject-consecutive check, scanning the day's
    /// existing cells for the first classroom the unit occupies (lesson
    /// groups share one subject across all member classrooms, so checking
    /// one is representative).
    pub fn respects_max_consec(
        &self,
        unit: &crate::model::compiler::LessonUnit,
        day: u8,
        start_period: u8,
        max_consec: u8,
    ) -> bool {
        let classroom_idx = unit.classroom_idxs[0];
        let periods = self.grid[classroom_idx][day as usize].len();
        let mut same_subject = vec![false; periods];
        for (p, cell) in self.grid[classroom_idx][day as usize].iter().enumerate() {
            if let Some(c) = cell {
                same_subject[p] = c.subject_id == unit.subject_id;
            }
        }
        for p in start_period..(start_period + unit.span) {
            same_subject[p as usize] = true;
        }
        let mut run = 0u8;
        let mut best = 0u8;
        for flag in same_subject {
            if flag {
                run += 1;
                best = best.max(run);
            } else {
                run = 0;
            }
        }
        best <= max_consec
    }

    pub fn place(
        &mut self,
        unit: &crate::model::compiler::LessonUnit,
        day: u8,
        start_period: u8,
        teacher_idxs: Vec<usize>,
    ) {
        let block_id = self.next_block_id;
        self.next_block_id += 1;
        let end = start_period + unit.span;
        for &classroom_idx in &unit.classroom_idxs {
            for p in start_period..end {
                self.grid[classroom_idx][day as usize][p as usize] = Some(CellOccupant {
                    unit: unit.index,
                    subject_id: unit.subject_id.clone(),
                    teacher_idxs: teacher_idxs.clone(),
                    location_idx: unit.location_idx,
                    block_id,
                    block_span: unit.span,
                });
            }
        }
        for &teacher_idx in &teacher_idxs {
            for p in start_period..end {
                self.teacher_busy.insert((teacher_idx, day, p));
            }
        }
        if let Some(location_idx) = unit.location_idx {
            for p in start_period..end {
                self.location_busy.insert((location_idx, day, p));
            }
        }
        self.placements
            .insert(unit.index, (teacher_idxs, day, start_period));
    }

    pub fn remove(&mut self, unit: &crate::model::compiler::LessonUnit) {
        let Some((teacher_idxs, day, start_period)) = self.placements.remove(&unit.index) else {
            return;
        };
        let end = start_period + unit.span;
        for &classroom_idx in &unit.classroom_idxs {
            for p in start_period..end {
                self.grid[classroom_idx][day as usize][p as usize] = None;
            }
        }
        for &teacher_idx in &teacher_idxs {
            for p in start_period..end {
                self.teacher_busy.remove(&(teacher_idx, day, p));
            }
        }
        if let Some(location_idx) = unit.location_idx {
            for p in start_period..end {
                self.location_busy.remove(&(location_idx, day, p));
            }
        }
    }

    pub fn placed_count(&self) -> usize {
        self.placements.len()
    }

    /// Captures the current placement state so the caller can fall back to
    /// it later (the incumbent in a local search that may wander away from
    /// its best-seen score).
    pub fn snapshot(&self) -> HashMap<LessonUnitIndex, (Vec<usize>, u8, u8)> {
        self.placements.clone()
    }

    /// Resets the schedule to a previously captured snapshot. Clears every
    /// cell and teacher/location reservation, then replays the snapshot's
    /// placements from scratch rather than trying to diff against the
    /// current state.
    pub fn restore(&mut self, snapshot: &HashMap<LessonUnitIndex, (Vec<usize>, u8, u8)>) {
        for classroom in &mut self.grid {
            for day in classroom {
                for cell in day {
                    *cell = None;
                }
            }
        }
        self.teacher_busy.clear();
        self.location_busy.clear();
        self.placements.clear();

        let model = self.model;
        for (&unit_idx, (teacher_idxs, day, start_period)) in snapshot {
            let unit = &model.units[unit_idx.0];
            self.place(unit, *day, *start_period, teacher_idxs.clone());
        }
    }

    /// Materialize the public, wire-facing `Schedule`.
    pub fn to_schedule(&self) -> Schedule {
        let mut cells = HashMap::new();
        for (classroom_idx, classroom) in self.model.classrooms.iter().enumerate() {
            let mut days = Vec::with_capacity(5);
            for day in 0..5usize {
                let mut periods = Vec::with_capacity(self.grid[classroom_idx][day].len());
                for cell in &self.grid[classroom_idx][day] {
                    periods.push(cell.as_ref().map(|c| Assignment {
                        subject_id: c.subject_id.clone(),
                        teacher_ids: c
                            .teacher_idxs
                            .iter()
                            .map(|&i| self.model.teachers[i].id.clone())
                            .collect(),
                        location_id: c.location_idx.map(|i| self.model.locations[i].clone()),
                        block_id: c.block_id,
                        block_span: c.block_span,
                    }));
                }
                days.push(periods);
            }
            cells.insert(classroom.id.clone(), days);
        }
        Schedule { cells }
    }
}
