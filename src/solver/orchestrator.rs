use super::{alns, cp_adapter, objective, seeder, tabu};
use super::working::WorkingSchedule;
use crate::config::{SolverConfig, Strategy};
use crate::error::{Result, TimetableError};
use crate::model::compiler::CompiledModel;
use crate::types::Schedule;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

/// Everything the caller needs to render a solver report: what happened,
/// not just the final schedule.
#[derive(Debug)]
pub struct SolveOutcome {
    pub schedule: Schedule,
    pub strategy_used: Strategy,
    pub fell_back_to_tabu: bool,
    pub seed_attempts: u32,
    pub seed_backtracks: u32,
    pub seed_unplaced: usize,
    pub tabu_iterations: u32,
    pub tabu_improvements: u32,
    pub alns_iterations: u32,
    pub alns_accepted: u32,
    pub objective: objective::Scores,
    pub elapsed: Duration,
    pub time_to_first_feasible: Option<Duration>,
    pub timed_out: bool,
    pub failure_reasons: seeder::FailureReasons,
    pub notes: Vec<String>,
}

/// Dispatches to the configured strategy under a single wall-clock budget,
/// optionally falling back from an exact CP attempt to the heuristic chain
/// when it times out and `allow_fallback` is set.
pub fn run(model: &CompiledModel, config: &SolverConfig, cancel: &AtomicBool) -> Result<SolveOutcome> {
    config
        .validate()
        .map_err(|reason| TimetableError::Infeasible { reason })?;

    let start = Instant::now();
    let deadline = start + Duration::from_secs(config.time_limit_seconds);

    match config.strategy {
        Strategy::Cp => {
            let (schedule, cp_outcome) = cp_adapter::solve(model, config, deadline, cancel)?;
            if !cp_outcome.timed_out {
                return Ok(finish(schedule, model, config, Strategy::Cp, false, start, None));
            }
            if !config.allow_fallback {
                return Err(TimetableError::Infeasible {
                    reason: format!(
                        "CP adapter timed out after {} cutting-plane round(s) and fallback is disabled",
                        cp_outcome.rounds
                    ),
                }
                .into());
            }
            run_heuristic_chain(model, config, cancel, start, deadline, true)
        }
        Strategy::Tabu | Strategy::Alns | Strategy::Repair => {
            run_heuristic_chain(model, config, cancel, start, deadline, false)
        }
    }
}

fn run_heuristic_chain(
    model: &CompiledModel,
    config: &SolverConfig,
    cancel: &AtomicBool,
    start: Instant,
    deadline: Instant,
    fell_back: bool,
) -> Result<SolveOutcome> {
    let (mut schedule, seed_report) = seeder::seed(
        model,
        cancel,
        config.random_seed,
        config.stop_at_first_solution && config.strategy == Strategy::Repair,
    );

    if seed_report.cancelled {
        return Err(TimetableError::Cancelled.into());
    }

    let mut tabu_outcome = None;
    let mut alns_outcome = None;

    if !matches!(config.strategy, Strategy::Repair) || fell_back {
        let tabu_deadline = if config.disable_lns {
            deadline
        } else {
            split_deadline(Instant::now(), deadline, 0.6)
        };
        tabu_outcome = Some(tabu::improve(
            model,
            &mut schedule,
            config,
            &config.tabu,
            tabu_deadline,
            cancel,
        ));

        if !config.disable_lns && Instant::now() < deadline {
            alns_outcome = Some(alns::improve(model, &mut schedule, config, deadline, cancel));
        }
    }

    let timed_out = Instant::now() >= deadline || !seed_report.unplaced.is_empty();
    let used_strategy = if fell_back { Strategy::Tabu } else { config.strategy };

    let mut outcome = finish(schedule, model, config, used_strategy, fell_back, start, seed_report.time_to_first_feasible);
    outcome.seed_attempts = seed_report.attempts;
    outcome.seed_backtracks = seed_report.backtracks;
    outcome.seed_unplaced = seed_report.unplaced.len();
    outcome.timed_out = timed_out;
    if fell_back {
        outcome.notes.push("exact solver timed out, fell back to the heuristic chain".to_string());
    }
    if !seed_report.unplaced.is_empty() {
        outcome.notes.push(format!(
            "{} lesson unit(s) could not be placed during construction",
            seed_report.unplaced.len()
        ));
    }
    outcome.failure_reasons = seed_report.failure_reasons;
    if let Some(t) = tabu_outcome {
        outcome.tabu_iterations = t.iterations;
        outcome.tabu_improvements = t.improvements;
    }
    if let Some(a) = alns_outcome {
        outcome.alns_iterations = a.iterations;
        outcome.alns_accepted = a.accepted;
    }
    Ok(outcome)
}

fn split_deadline(now: Instant, deadline: Instant, fraction: f64) -> Instant {
    let remaining = deadline.saturating_duration_since(now);
    now + Duration::from_secs_f64(remaining.as_secs_f64() * fraction)
}

fn finish(
    schedule: WorkingSchedule,
    model: &CompiledModel,
    config: &SolverConfig,
    strategy_used: Strategy,
    fell_back_to_tabu: bool,
    start: Instant,
    time_to_first_feasible: Option<Duration>,
) -> SolveOutcome {
    let scores = objective::compute_full(&schedule, config);
    let unplaced = model.units.len() - schedule.placed_count();
    SolveOutcome {
        schedule: schedule.to_schedule(),
        strategy_used,
        fell_back_to_tabu,
        seed_attempts: 0,
        seed_backtracks: 0,
        seed_unplaced: unplaced,
        tabu_iterations: 0,
        tabu_improvements: 0,
        alns_iterations: 0,
        alns_accepted: 0,
        objective: scores,
        elapsed: start.elapsed(),
        time_to_first_feasible,
        timed_out: false,
        failure_reasons: seeder::FailureReasons::default(),
        notes: Vec::new(),
    }
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

    fn instance(strategy: Strategy) -> Instance {
        let mut config = SolverConfig {
            strategy,
            time_limit_seconds: 2,
            ..SolverConfig::default()
        };
        config.random_seed = Some(11);
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
                weekly_hours: 5,
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
            config,
        }
    }

    #[test]
    fn repair_strategy_places_every_unit() {
        let inst = instance(Strategy::Repair);
        let model = compile(&inst).unwrap();
        let cancel = AtomicBool::new(false);
        let outcome = run(&model, &inst.config, &cancel).unwrap();
        assert_eq!(outcome.seed_unplaced, 0);
        assert_eq!(outcome.strategy_used, Strategy::Repair);
    }

    #[test]
    fn tabu_strategy_runs_local_search_after_seeding() {
        let inst = instance(Strategy::Tabu);
        let model = compile(&inst).unwrap();
        let cancel = AtomicBool::new(false);
        let outcome = run(&model, &inst.config, &cancel).unwrap();
        assert_eq!(outcome.seed_unplaced, 0);
        assert!(outcome.tabu_iterations > 0);
    }

    #[test]
    fn cancellation_before_a_complete_seed_surfaces_as_cancelled() {
        let inst = instance(Strategy::Repair);
        let model = compile(&inst).unwrap();
        let cancel = AtomicBool::new(true);
        let err = run(&model, &inst.config, &cancel).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TimetableError>(),
            Some(TimetableError::Cancelled)
        ));
    }
}
