use super::working::WorkingSchedule;
use crate::config::SolverConfig;
use crate::types::SubjectId;
use std::collections::{HashMap, HashSet};

/// Soft-cost breakdown for a working schedule, computed the way the pack's
/// heuristic solver computes `compute_soft_scores`: per-teacher, per-day
/// gap/edge penalties summed into one objective.
#[derive(Debug, Clone, Default)]
pub struct Scores {
    pub teacher_gap: f64,
    pub teacher_edge: f64,
    pub teacher_spread: f64,
    pub same_day_split: f64,
    pub daily_overrun: f64,
    pub block_integrity: f64,
    pub total: f64,
}

/// Recompute the full objective from scratch. Used to seed the incumbent
/// and, in debug builds, to cross-check delta evaluation after every move.
pub fn compute_full(schedule: &WorkingSchedule, config: &SolverConfig) -> Scores {
    let mut gap = 0.0;
    let mut edge = 0.0;
    let mut spread = 0.0;
    let mut overrun = 0.0;

    for teacher_idx in 0..schedule.model.teachers.len() {
        let (g, e, hours_per_day) = per_teacher_gap_edge(schedule, teacher_idx);
        gap += g;
        if !config.disable_teacher_edge_penalty {
            edge += e;
        }
        spread += day_variance(&hours_per_day);
        overrun += daily_overrun_for_teacher(&hours_per_day, config);
    }

    let split = same_day_split_cost(schedule, config);
    let integrity = block_integrity_cost(schedule, config);

    let total = gap
        + edge * config.teacher_edge_weight
        + spread * config.teacher_spread_weight
        + split
        + overrun
        + integrity;

    Scores {
        teacher_gap: gap,
        teacher_edge: edge,
        teacher_spread: spread,
        same_day_split: split,
        daily_overrun: overrun,
        block_integrity: integrity,
        total,
    }
}

/// Cost contribution of a single teacher (gap + edge + daily-max overrun,
/// weighted), used for delta evaluation: callers recompute this for only
/// the teachers touched by a move rather than the whole schedule.
pub fn teacher_cost(schedule: &WorkingSchedule, teacher_idx: usize, config: &SolverConfig) -> f64 {
    let (gap, edge, hours_per_day) = per_teacher_gap_edge(schedule, teacher_idx);
    let edge_cost = if config.disable_teacher_edge_penalty {
        0.0
    } else {
        edge * config.teacher_edge_weight
    };
    gap + edge_cost
        + day_variance(&hours_per_day) * config.teacher_spread_weight
        + daily_overrun_for_teacher(&hours_per_day, config)
}

/// Positive excess over `teacherDailyMaxHours`, summed across the week.
/// Zero when the limit is unconfigured.
fn daily_overrun_for_teacher(hours_per_day: &[u8; 5], config: &SolverConfig) -> f64 {
    let Some(max_hours) = config.cp_prefs.teacher_daily_max_hours else {
        return 0.0;
    };
    hours_per_day
        .iter()
        .map(|&h| h.saturating_sub(max_hours) as f64)
        .sum()
}

/// Per (classroom, day), a subject whose placed periods form more than one
/// run costs one point per extra run, unless `allowSameDaySplit` is set.
fn same_day_split_cost(schedule: &WorkingSchedule, config: &SolverConfig) -> f64 {
    if config.cp_prefs.allow_same_day_split {
        return 0.0;
    }
    let mut cost = 0.0;
    for classroom in &schedule.grid {
        for day in classroom {
            let mut runs: HashMap<SubjectId, u32> = HashMap::new();
            let mut prev: Option<&SubjectId> = None;
            for cell in day {
                match cell {
                    Some(c) => {
                        if prev != Some(&c.subject_id) {
                            *runs.entry(c.subject_id.clone()).or_insert(0) += 1;
                        }
                        prev = Some(&c.subject_id);
                    }
                    None => prev = None,
                }
            }
            for count in runs.values() {
                if *count > 1 {
                    cost += (*count - 1) as f64;
                }
            }
        }
    }
    cost
}

/// Counts blocks whose cells no longer form one contiguous run of their
/// recorded span within a classroom/day — only possible once a move
/// operator is allowed to disassemble a block for relaxation.
fn block_integrity_cost(schedule: &WorkingSchedule, config: &SolverConfig) -> f64 {
    if config.allow_block_relaxation {
        return 0.0;
    }
    let mut by_block: HashMap<(u32, usize), (Vec<u8>, u8)> = HashMap::new();
    for (classroom_idx, classroom) in schedule.grid.iter().enumerate() {
        for day in classroom {
            for (period, cell) in day.iter().enumerate() {
                if let Some(c) = cell {
                    let entry = by_block
                        .entry((c.block_id, classroom_idx))
                        .or_insert_with(|| (Vec::new(), c.block_span));
                    entry.0.push(period as u8);
                }
            }
        }
    }
    let mut cost = 0.0;
    for (_, (mut periods, span)) in by_block {
        periods.sort_unstable();
        let contiguous =
            periods.len() as u8 == span && periods.windows(2).all(|w| w[1] == w[0] + 1);
        if !contiguous {
            cost += 1.0;
        }
    }
    cost
}

fn per_teacher_gap_edge(schedule: &WorkingSchedule, teacher_idx: usize) -> (f64, f64, [u8; 5]) {
    let mut gap = 0.0;
    let mut edge = 0.0;
    let mut hours_per_day = [0u8; 5];

    for day in 0..5u8 {
        let periods: HashSet<u8> = schedule
            .teacher_busy
            .iter()
            .filter(|&&(t, d, _)| t == teacher_idx && d == day)
            .map(|&(_, _, p)| p)
            .collect();
        if periods.is_empty() {
            continue;
        }
        hours_per_day[day as usize] = periods.len() as u8;
        let first = *periods.iter().min().unwrap();
        let last = *periods.iter().max().unwrap();
        let span = (last - first + 1) as usize;
        gap += (span - periods.len()) as f64;

        if periods.contains(&0) {
            edge += 1.0;
        }
        let max_daily = schedule.model.max_daily_hours;
        if max_daily > 0 && periods.contains(&(max_daily - 1)) {
            edge += 1.0;
        }
    }
    (gap, edge, hours_per_day)
}

fn day_variance(hours_per_day: &[u8; 5]) -> f64 {
    let values: Vec<f64> = hours_per_day.iter().map(|&h| h as f64).collect();
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::compiler::compile;
    use crate::types::{
        ClassGroup, Classroom, ClassroomId, Instance, Level, Subject, SubjectId, Teacher, TeacherId,
        TimeGrid,
    };
    use std::collections::HashMap as StdHashMap;

    fn model_fixture() -> crate::model::compiler::CompiledModel {
        let inst = Instance {
            teachers: vec![Teacher {
                id: TeacherId::from("t1"),
                name: "Ada".into(),
                branches: vec!["Mat".into()],
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
                name: "Mat".into(),
                weekly_hours: 3,
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
                middle: [5, 5, 5, 5, 5],
                high: [5, 5, 5, 5, 5],
            },
            config: crate::config::SolverConfig::default(),
        };
        compile(&inst).unwrap()
    }

    #[test]
    fn gap_cost_penalizes_non_contiguous_placement() {
        let model = model_fixture();
        let config = crate::config::SolverConfig::default();
        let mut sched = WorkingSchedule::new(&model);
        sched.place(&model.units[0], 0, 0, vec![0]);
        sched.place(&model.units[1], 0, 2, vec![0]);
        let scores = compute_full(&sched, &config);
        assert!(scores.teacher_gap > 0.0);
    }

    #[test]
    fn contiguous_placement_has_zero_gap() {
        let model = model_fixture();
        let config = crate::config::SolverConfig::default();
        let mut sched = WorkingSchedule::new(&model);
        sched.place(&model.units[0], 0, 0, vec![0]);
        sched.place(&model.units[1], 0, 1, vec![0]);
        let scores = compute_full(&sched, &config);
        assert_eq!(scores.teacher_gap, 0.0);
    }
}
