use super::objective;
use super::working::WorkingSchedule;
use crate::config::SolverConfig;
use crate::model::compiler::{CompiledModel, LessonUnit};
use crate::types::LessonUnitIndex;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

const INITIAL_TEMPERATURE: f64 = 2.0;
const COOLING_RATE: f64 = 0.995;
const MIN_TEMPERATURE: f64 = 0.01;

#[derive(Debug)]
pub struct AlnsOutcome {
    pub iterations: u32,
    pub accepted: u32,
    pub best_score: f64,
}

enum Destroy {
    Random,
    WorstTeacher,
    DayShaw,
    TeacherShaw,
}

/// Adaptive large-neighborhood search: ruin a chunk of the schedule with
/// one of four destroy operators, greedily repair it, and accept the
/// result under a simulated-annealing criterion so occasional worsening
/// moves can escape local optima that `tabu::improve` alone cannot.
pub fn improve(
    model: &CompiledModel,
    schedule: &mut WorkingSchedule,
    config: &SolverConfig,
    deadline: Instant,
    cancel: &AtomicBool,
) -> AlnsOutcome {
    let mut rng = ChaCha8Rng::seed_from_u64(config.random_seed.unwrap_or(2).wrapping_add(17));
    let mut current = objective::compute_full(schedule, config).total;
    let mut best = current;
    let mut best_snapshot = schedule.snapshot();
    let mut accepted = 0u32;
    let mut iterations = 0u32;
    let mut temperature = INITIAL_TEMPERATURE;

    let destroy_fraction = config.seed_ratio.clamp(0.05, 0.5);

    loop {
        iterations += 1;
        if iterations % 64 == 0 && (cancel.load(Ordering::Relaxed) || Instant::now() >= deadline) {
            break;
        }
        if Instant::now() >= deadline {
            break;
        }

        let placed: Vec<LessonUnitIndex> = schedule.placements.keys().copied().collect();
        if placed.is_empty() {
            break;
        }
        let k = ((placed.len() as f64 * destroy_fraction).ceil() as usize).max(1);

        let removed = select_removal(model, schedule, &placed, k, config, &mut rng);
        let snapshot: Vec<(LessonUnitIndex, Vec<usize>, u8, u8)> = removed
            .iter()
            .filter_map(|&idx| {
                schedule
                    .placements
                    .get(&idx)
                    .map(|(t, d, s)| (idx, t.clone(), *d, *s))
            })
            .collect();

        for &idx in &removed {
            schedule.remove(&model.units[idx.0]);
        }

        let repaired = repair(model, schedule, &removed, &mut rng);

        if !repaired {
            // Could not reinsert every removed unit; restore the original
            // placements rather than leave the schedule partially ruined.
            for &idx in &removed {
                schedule.remove(&model.units[idx.0]);
            }
            for (idx, teachers, day, start) in snapshot {
                schedule.place(&model.units[idx.0], day, start, teachers);
            }
            continue;
        }

        let candidate_score = objective::compute_full(schedule, config).total;
        let accept = candidate_score <= current
            || rng.gen::<f64>() < ((current - candidate_score) / temperature.max(MIN_TEMPERATURE)).exp();

        if accept {
            current = candidate_score;
            accepted += 1;
            if current < best {
                best = current;
                best_snapshot = schedule.snapshot();
            }
        } else {
            for &idx in &removed {
                schedule.remove(&model.units[idx.0]);
            }
            for (idx, teachers, day, start) in snapshot {
                schedule.place(&model.units[idx.0], day, start, teachers);
            }
        }

        temperature = (temperature * COOLING_RATE).max(MIN_TEMPERATURE);
    }

    // Simulated annealing accepts worsening moves on purpose; return the
    // best-seen incumbent rather than wherever the walk ended up.
    schedule.restore(&best_snapshot);

    AlnsOutcome { iterations, accepted, best_score: best }
}

fn select_removal(
    model: &CompiledModel,
    schedule: &WorkingSchedule,
    placed: &[LessonUnitIndex],
    k: usize,
    config: &SolverConfig,
    rng: &mut ChaCha8Rng,
) -> Vec<LessonUnitIndex> {
    let operator = match rng.gen_range(0..4) {
        0 => Destroy::Random,
        1 => Destroy::WorstTeacher,
        2 => Destroy::DayShaw,
        _ => Destroy::TeacherShaw,
    };

    match operator {
        Destroy::Random => {
            let mut pool = placed.to_vec();
            pool.shuffle(rng);
            pool.truncate(k);
            pool
        }
        Destroy::WorstTeacher => {
            let mut ranked: Vec<(usize, f64)> = (0..model.teachers.len())
                .map(|t| (t, objective::teacher_cost(schedule, t, config)))
                .collect();
            ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
            let worst_teachers: Vec<usize> = ranked.into_iter().take(2).map(|(t, _)| t).collect();
            let mut pool: Vec<LessonUnitIndex> = placed
                .iter()
                .copied()
                .filter(|idx| {
                    schedule
                        .placements
                        .get(idx)
                        .is_some_and(|(teachers, _, _)| teachers.iter().any(|t| worst_teachers.contains(t)))
                })
                .collect();
            pool.shuffle(rng);
            pool.truncate(k);
            pool
        }
        Destroy::DayShaw => {
            let day = rng.gen_range(0..5u8);
            let mut pool: Vec<LessonUnitIndex> = placed
                .iter()
                .copied()
                .filter(|idx| schedule.placements.get(idx).is_some_and(|(_, d, _)| *d == day))
                .collect();
            pool.shuffle(rng);
            pool.truncate(k);
            pool
        }
        Destroy::TeacherShaw => {
            let Some(&teacher) = placed
                .choose(rng)
                .and_then(|idx| schedule.placements.get(idx))
                .map(|(t, _, _)| t.first())
                .flatten()
            else {
                return vec![];
            };
            let mut pool: Vec<LessonUnitIndex> = placed
                .iter()
                .copied()
                .filter(|idx| {
                    schedule
                        .placements
                        .get(idx)
                        .is_some_and(|(t, _, _)| t.contains(&teacher))
                })
                .collect();
            pool.shuffle(rng);
            pool.truncate(k);
            pool
        }
    }
}

/// Greedy reinsertion of the units removed by a destroy operator, most-
/// constrained first. Returns `false` if any unit has nowhere to go.
fn repair(
    model: &CompiledModel,
    schedule: &mut WorkingSchedule,
    removed: &[LessonUnitIndex],
    rng: &mut ChaCha8Rng,
) -> bool {
    let mut order = removed.to_vec();
    order.sort_by_key(|idx| model.units[idx.0].eligible_tuples.len());

    for idx in order {
        let unit = &model.units[idx.0];
        if !place_best_window(model, schedule, unit, rng) {
            return false;
        }
    }
    true
}

fn place_best_window(
    model: &CompiledModel,
    schedule: &mut WorkingSchedule,
    unit: &LessonUnit,
    rng: &mut ChaCha8Rng,
) -> bool {
    let mut windows: Vec<(u8, u8)> = (0..5u8)
        .flat_map(|d| (0..=model.max_daily_hours.saturating_sub(unit.span)).map(move |s| (d, s)))
        .collect();
    windows.shuffle(rng);

    let mut tuples = unit.eligible_tuples.clone();
    tuples.shuffle(rng);

    for (day, start) in windows {
        if let Some(restrict) = unit.day_restriction {
            if restrict != day {
                continue;
            }
        }
        if let Some(fixed) = unit.fixed_start {
            if fixed.day != day || fixed.period != start {
                continue;
            }
        }
        for tuple in &tuples {
            if schedule.can_place(unit, day, start, tuple)
                && schedule.respects_max_consec(unit, day, start, unit.max_consec)
            {
                schedule.place(unit, day, start, tuple.clone());
                return true;
            }
        }
    }
    false
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
    use std::time::Duration;

    fn instance() -> Instance {
        Instance {
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
                weekly_hours: 6,
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
    fn keeps_every_unit_placed_after_ruin_and_recreate() {
        let inst = instance();
        let model = compile(&inst).unwrap();
        let cancel = AtomicBool::new(false);
        let (mut schedule, _) = seeder::seed(&model, &cancel, Some(9), false);
        let total_units = model.units.len();
        improve(
            &model,
            &mut schedule,
            &inst.config,
            Instant::now() + Duration::from_millis(200),
            &cancel,
        );
        assert_eq!(schedule.placed_count(), total_units);
    }
}
