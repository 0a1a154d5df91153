use super::objective;
use super::working::WorkingSchedule;
use crate::config::{SolverConfig, TabuParams};
use crate::model::compiler::CompiledModel;
use crate::types::LessonUnitIndex;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct TabuOutcome {
    pub iterations: u32,
    pub improvements: u32,
    pub best_score: f64,
    pub elapsed: Duration,
}

/// Local-search pass over an already-seeded schedule: Relocate, Swap and
/// TeacherReassign moves, a short-term tabu list with tenure + aspiration,
/// and a time budget checked cooperatively so the caller can cancel.
pub fn improve(
    model: &CompiledModel,
    schedule: &mut WorkingSchedule,
    config: &SolverConfig,
    params: &TabuParams,
    deadline: Instant,
    cancel: &AtomicBool,
) -> TabuOutcome {
    let start = Instant::now();
    let mut rng = ChaCha8Rng::seed_from_u64(config.random_seed.unwrap_or(1));
    let mut current = objective::compute_full(schedule, config).total;
    let mut best = current;
    let mut best_snapshot = schedule.snapshot();
    let mut improvements = 0u32;
    // Forbids moving a unit again until this iteration count passes, unless
    // the move would beat `best` (aspiration).
    let mut tabu: HashMap<LessonUnitIndex, u64> = HashMap::new();
    let mut iterations: u64 = 0;

    let placed: Vec<LessonUnitIndex> = schedule.placements.keys().copied().collect();
    if placed.is_empty() {
        return TabuOutcome {
            iterations: 0,
            improvements: 0,
            best_score: current,
            elapsed: start.elapsed(),
        };
    }

    loop {
        iterations += 1;
        if iterations % 256 == 0 {
            if cancel.load(Ordering::Relaxed) || Instant::now() >= deadline {
                break;
            }
        }
        if iterations > params.iterations as u64 {
            break;
        }

        let Some(delta) = propose_move(model, schedule, &placed, &mut rng, config) else {
            continue;
        };

        let is_tabu = delta
            .touched
            .iter()
            .any(|u| tabu.get(u).copied().unwrap_or(0) > iterations);
        let candidate_score = current + delta.score_delta;
        let aspiration = candidate_score < best;

        if is_tabu && !aspiration {
            delta.undo(schedule);
            continue;
        }

        current = candidate_score;
        for &u in &delta.touched {
            tabu.insert(u, iterations + params.tenure as u64);
        }

        if current < best {
            best = current;
            improvements += 1;
            best_snapshot = schedule.snapshot();
        }

        if cfg!(debug_assertions) && iterations % 64 == 0 {
            let recomputed = objective::compute_full(schedule, config).total;
            debug_assert!(
                (recomputed - current).abs() < 1e-6,
                "delta evaluation drifted from full recompute: {recomputed} vs {current}"
            );
        }
    }

    // The walk may have wandered past its best-seen score chasing
    // aspiration moves; hand back the incumbent, not wherever it ended up.
    schedule.restore(&best_snapshot);

    TabuOutcome {
        iterations: iterations.min(u32::MAX as u64) as u32,
        improvements,
        best_score: best,
        elapsed: start.elapsed(),
    }
}

/// A move already applied to `schedule`; `undo` reverts it and `touched`
/// lists the units whose placement changed (for tabu bookkeeping).
struct AppliedMove {
    touched: Vec<LessonUnitIndex>,
    score_delta: f64,
    revert: Revert,
}

/// What it takes to put `schedule` back the way it was before a move. Kept
/// as plain data (instead of a boxed closure) since undo only ever needs to
/// re-place one or two units at their old slots.
enum Revert {
    One {
        unit: crate::model::compiler::LessonUnit,
        day: u8,
        start: u8,
        teachers: Vec<usize>,
    },
    Two {
        a: (crate::model::compiler::LessonUnit, u8, u8, Vec<usize>),
        b: (crate::model::compiler::LessonUnit, u8, u8, Vec<usize>),
    },
}

impl AppliedMove {
    fn undo(self, schedule: &mut WorkingSchedule) {
        match self.revert {
            Revert::One { unit, day, start, teachers } => {
                schedule.remove(&unit);
                schedule.place(&unit, day, start, teachers);
            }
            Revert::Two { a, b } => {
                schedule.remove(&a.0);
                schedule.remove(&b.0);
                schedule.place(&a.0, a.1, a.2, a.3);
                schedule.place(&b.0, b.1, b.2, b.3);
            }
        }
    }
}

/// Picks one of Relocate / Swap / TeacherReassign at random, applies it if
/// feasible, and returns the score delta plus an undo closure. Returns
/// `None` if the randomly chosen move found no feasible alternative this
/// iteration (caller just retries next iteration).
fn propose_move(
    model: &CompiledModel,
    schedule: &mut WorkingSchedule,
    placed: &[LessonUnitIndex],
    rng: &mut ChaCha8Rng,
    config: &SolverConfig,
) -> Option<AppliedMove> {
    match rng.gen_range(0..3) {
        0 => relocate(model, schedule, placed, rng, config),
        1 => swap(model, schedule, placed, rng, config),
        _ => reassign_teacher(model, schedule, placed, rng, config),
    }
}

fn teacher_cost_sum(schedule: &WorkingSchedule, teachers: &[usize], config: &SolverConfig) -> f64 {
    teachers.iter().map(|&t| objective::teacher_cost(schedule, t, config)).sum()
}

fn relocate(
    model: &CompiledModel,
    schedule: &mut WorkingSchedule,
    placed: &[LessonUnitIndex],
    rng: &mut ChaCha8Rng,
    config: &SolverConfig,
) -> Option<AppliedMove> {
    let unit_idx = *placed.choose(rng)?;
    let unit = &model.units[unit_idx.0];
    let (old_teachers, old_day, old_start) = schedule.placements.get(&unit_idx)?.clone();

    let before = teacher_cost_sum(schedule, &old_teachers, config);
    schedule.remove(unit);

    let mut windows: Vec<(u8, u8)> = (0..5u8)
        .flat_map(|d| (0..=model.max_daily_hours.saturating_sub(unit.span)).map(move |s| (d, s)))
        .filter(|&(d, s)| !(d == old_day && s == old_start))
        .collect();
    windows.shuffle(rng);

    for (day, start) in windows {
        if schedule.can_place(unit, day, start, &old_teachers)
            && schedule.respects_max_consec(unit, day, start, unit.max_consec)
        {
            schedule.place(unit, day, start, old_teachers.clone());
            let after = teacher_cost_sum(schedule, &old_teachers, config);
            return Some(AppliedMove {
                touched: vec![unit_idx],
                score_delta: after - before,
                revert: Revert::One {
                    unit: unit.clone(),
                    day: old_day,
                    start: old_start,
                    teachers: old_teachers,
                },
            });
        }
    }

    schedule.place(unit, old_day, old_start, old_teachers);
    None
}

fn swap(
    model: &CompiledModel,
    schedule: &mut WorkingSchedule,
    placed: &[LessonUnitIndex],
    rng: &mut ChaCha8Rng,
    config: &SolverConfig,
) -> Option<AppliedMove> {
    if placed.len() < 2 {
        return None;
    }
    let mut pair = placed.to_vec();
    pair.shuffle(rng);
    let (a_idx, b_idx) = (pair[0], pair[1]);
    if a_idx == b_idx {
        return None;
    }
    let unit_a = &model.units[a_idx.0];
    let unit_b = &model.units[b_idx.0];
    if unit_a.span != unit_b.span {
        return None;
    }

    let (teachers_a, day_a, start_a) = schedule.placements.get(&a_idx)?.clone();
    let (teachers_b, day_b, start_b) = schedule.placements.get(&b_idx)?.clone();

    let touched_teachers: Vec<usize> = teachers_a
        .iter()
        .chain(teachers_b.iter())
        .copied()
        .collect();
    let before = teacher_cost_sum(schedule, &touched_teachers, config);

    schedule.remove(unit_a);
    schedule.remove(unit_b);

    let feasible = schedule.can_place(unit_a, day_b, start_b, &teachers_a)
        && schedule.can_place(unit_b, day_a, start_a, &teachers_b);

    if !feasible {
        schedule.place(unit_a, day_a, start_a, teachers_a);
        schedule.place(unit_b, day_b, start_b, teachers_b);
        return None;
    }

    schedule.place(unit_a, day_b, start_b, teachers_a.clone());
    schedule.place(unit_b, day_a, start_a, teachers_b.clone());

    if !schedule.respects_max_consec(unit_a, day_b, start_b, unit_a.max_consec)
        || !schedule.respects_max_consec(unit_b, day_a, start_a, unit_b.max_consec)
    {
        schedule.remove(unit_a);
        schedule.remove(unit_b);
        schedule.place(unit_a, day_a, start_a, teachers_a);
        schedule.place(unit_b, day_b, start_b, teachers_b);
        return None;
    }

    let after = teacher_cost_sum(schedule, &touched_teachers, config);
    Some(AppliedMove {
        touched: vec![a_idx, b_idx],
        score_delta: after - before,
        revert: Revert::Two {
            a: (unit_a.clone(), day_a, start_a, teachers_a),
            b: (unit_b.clone(), day_b, start_b, teachers_b),
        },
    })
}

fn reassign_teacher(
    model: &CompiledModel,
    schedule: &mut WorkingSchedule,
    placed: &[LessonUnitIndex],
    rng: &mut ChaCha8Rng,
    config: &SolverConfig,
) -> Option<AppliedMove> {
    let unit_idx = *placed.choose(rng)?;
    let unit = &model.units[unit_idx.0];
    if unit.eligible_tuples.len() < 2 {
        return None;
    }
    let (old_teachers, day, start) = schedule.placements.get(&unit_idx)?.clone();

    let mut tuples = unit.eligible_tuples.clone();
    tuples.shuffle(rng);

    let before = teacher_cost_sum(schedule, &old_teachers, config);
    schedule.remove(unit);

    for tuple in tuples {
        if tuple == old_teachers {
            continue;
        }
        if schedule.can_place(unit, day, start, &tuple)
            && schedule.respects_max_consec(unit, day, start, unit.max_consec)
        {
            schedule.place(unit, day, start, tuple.clone());
            let touched: Vec<usize> = old_teachers.iter().chain(tuple.iter()).copied().collect();
            let after = teacher_cost_sum(schedule, &touched, config);
            return Some(AppliedMove {
                touched: vec![unit_idx],
                score_delta: after - before,
                revert: Revert::One {
                    unit: unit.clone(),
                    day,
                    start,
                    teachers: old_teachers,
                },
            });
        }
    }

    schedule.place(unit, day, start, old_teachers);
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::compiler::compile;
    use crate::solver::seeder;
    use crate::types::{
        ClassGroup, Classroom, ClassroomId, Instance, Level, Subject, SubjectId, Teacher, TeacherId,
        TimeGrid,
    };
    use std::collections::HashMap as StdHashMap;
    use std::sync::atomic::AtomicBool;

    fn instance() -> Instance {
        Instance {
            teachers: vec![
                Teacher {
                    id: TeacherId::from("t1"),
                    name: "Ada".into(),
                    branches: vec!["Mat".into()],
                    levels: vec![Level::High],
                    availability: vec![u32::MAX; 5],
                },
                Teacher {
                    id: TeacherId::from("t2"),
                    name: "Grace".into(),
                    branches: vec!["Mat".into()],
                    levels: vec![Level::High],
                    availability: vec![u32::MAX; 5],
                },
            ],
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
                weekly_hours: 4,
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
                high: [6, 6, 6, 6, 6],
            },
            config: SolverConfig::default(),
        }
    }

    #[test]
    fn never_worsens_the_best_seen_score() {
        let inst = instance();
        let model = compile(&inst).unwrap();
        let cancel = AtomicBool::new(false);
        let (mut schedule, _) = seeder::seed(&model, &cancel, Some(3), false);
        let before = objective::compute_full(&schedule, &inst.config).total;
        let params = crate::config::TabuParams { tenure: 5, iterations: 200 };
        let outcome = improve(
            &model,
            &mut schedule,
            &inst.config,
            &params,
            Instant::now() + Duration::from_secs(5),
            &cancel,
        );
        assert!(outcome.best_score <= before + 1e-9);
    }
}
