//! End-to-end scenario tests exercising the full pipeline (compile, seed,
//! improve) against small hand-built instances, the same way the teacher's
//! own crate tests a pipeline against a fixed fixture rather than random data.

use school_timetabler::config::{SolverConfig, Strategy};
use school_timetabler::model::compiler::compile;
use school_timetabler::solver::orchestrator;
use school_timetabler::types::{
    ClassGroup, Classroom, ClassroomId, Duty, Instance, Level, Subject, SubjectId, Teacher,
    TeacherId, TimeGrid,
};
use std::collections::HashMap as StdHashMap;
use std::sync::atomic::AtomicBool;

fn base_teacher(id: &str, name: &str, branches: &[&str], availability: Vec<u32>) -> Teacher {
    Teacher {
        id: TeacherId::from(id),
        name: name.to_string(),
        branches: branches.iter().map(|b| b.to_string()).collect(),
        levels: vec![Level::High],
        availability,
    }
}

fn base_classroom(id: &str, name: &str) -> Classroom {
    Classroom {
        id: ClassroomId::from(id),
        name: name.to_string(),
        level: Level::High,
        group: ClassGroup::None,
        homeroom_teacher: None,
    }
}

/// Scenario A: one classroom with exactly as many weekly slots as the single
/// subject needs. Every cell must end up occupied and a perfectly packed
/// schedule has zero gap cost.
#[test]
fn scenario_a_trivial_fill_has_no_gaps() {
    let config = SolverConfig {
        strategy: Strategy::Tabu,
        time_limit_seconds: 2,
        random_seed: Some(3),
        ..SolverConfig::default()
    };
    let instance = Instance {
        teachers: vec![base_teacher("t1", "Ada", &["Mat"], vec![u32::MAX; 5])],
        classrooms: vec![base_classroom("c1", "9A")],
        subjects: vec![Subject {
            id: SubjectId::from("mat"),
            name: "Mat".into(),
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
            middle: [2, 2, 2, 2, 2],
            high: [2, 2, 2, 2, 2],
        },
        config: config.clone(),
    };

    let model = compile(&instance).expect("structurally sound instance should compile");
    let cancel = AtomicBool::new(false);
    let outcome = orchestrator::run(&model, &config, &cancel).expect("feasible instance solves");

    assert_eq!(outcome.seed_unplaced, 0);
    assert_eq!(outcome.schedule.total_occupied_cells(), 10);
    assert_eq!(outcome.objective.teacher_gap, 0.0);
}

/// Scenario B: a four-hour block subject with only two windows the teacher's
/// availability actually permits. The seeder must land both blocks exactly
/// on those windows, never splitting a block across the boundary.
#[test]
fn scenario_b_block_lands_on_the_only_feasible_windows() {
    let config = SolverConfig {
        strategy: Strategy::Repair,
        time_limit_seconds: 2,
        random_seed: Some(1),
        ..SolverConfig::default()
    };
    // Monday periods 1-2 (bits 1,2) and Wednesday periods 3-4 (bits 3,4) free;
    // nothing else.
    let availability = vec![0b0000_0110, 0, 0b0001_1000, 0, 0];
    let instance = Instance {
        teachers: vec![base_teacher("t1", "Ada", &["Fiz"], availability)],
        classrooms: vec![base_classroom("c1", "9A")],
        subjects: vec![Subject {
            id: SubjectId::from("fiz"),
            name: "Fiz".into(),
            weekly_hours: 4,
            block_hours: 4,
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
        config: config.clone(),
    };

    let model = compile(&instance).unwrap();
    let cancel = AtomicBool::new(false);
    let outcome = orchestrator::run(&model, &config, &cancel).unwrap();

    assert_eq!(outcome.seed_unplaced, 0);
    let grid = &outcome.schedule.cells[&ClassroomId::from("c1")];
    assert!(grid[0][1].is_some() && grid[0][2].is_some(), "Monday block missing");
    assert!(grid[2][3].is_some() && grid[2][4].is_some(), "Wednesday block missing");
    let occupied: usize = grid
        .iter()
        .flat_map(|day| day.iter())
        .filter(|c| c.is_some())
        .count();
    assert_eq!(occupied, 4, "block must not spill onto any other period");
}

/// Scenario C: two classrooms share a single teacher for a subject, but the
/// teacher only has two free slots total against four required hours. Two
/// lesson units must go unplaced, surfaced as teacher contention, not a
/// hard error.
#[test]
fn scenario_c_teacher_contention_leaves_units_unplaced() {
    let config = SolverConfig {
        strategy: Strategy::Repair,
        time_limit_seconds: 2,
        random_seed: Some(5),
        ..SolverConfig::default()
    };
    // Only Monday periods 0-1 are free for the shared teacher.
    let availability = vec![0b0000_0011, 0, 0, 0, 0];
    let instance = Instance {
        teachers: vec![base_teacher("t1", "Ada", &["Mat"], availability)],
        classrooms: vec![base_classroom("c1", "9A"), base_classroom("c2", "9B")],
        subjects: vec![Subject {
            id: SubjectId::from("mat"),
            name: "Mat".into(),
            weekly_hours: 2,
            block_hours: 0,
            triple_block_hours: 0,
            max_consec: None,
            assigned_class_ids: vec![ClassroomId::from("c1"), ClassroomId::from("c2")],
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
        config: config.clone(),
    };

    let model = compile(&instance).unwrap();
    let cancel = AtomicBool::new(false);
    let outcome = orchestrator::run(&model, &config, &cancel).unwrap();

    assert!(outcome.seed_unplaced >= 2, "two of the four hours cannot find a free teacher slot");
    assert!(outcome.failure_reasons.teacher_busy > 0 || outcome.failure_reasons.availability > 0);
    assert!(!outcome.notes.is_empty());
}

/// Scenario D: a duty wipes out the only slot a single-hour subject could
/// ever use. The duty is baked into teacher availability at compile time, so
/// the unit fails with an availability reason rather than a compile error.
#[test]
fn scenario_d_duty_blocks_the_only_lesson_slot() {
    let config = SolverConfig {
        strategy: Strategy::Repair,
        time_limit_seconds: 2,
        random_seed: Some(9),
        ..SolverConfig::default()
    };
    let instance = Instance {
        teachers: vec![base_teacher("t1", "Ada", &["Mat"], vec![0b0000_1000, 0, 0, 0, 0])],
        classrooms: vec![base_classroom("c1", "9A")],
        subjects: vec![Subject {
            id: SubjectId::from("mat"),
            name: "Mat".into(),
            weekly_hours: 1,
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
        duties: vec![Duty {
            teacher_id: TeacherId::from("t1"),
            day: 0,
            period: Some(3),
            label: "hall duty".into(),
        }],
        time_grid: TimeGrid {
            middle: [4, 4, 4, 4, 4],
            high: [4, 4, 4, 4, 4],
        },
        config: config.clone(),
    };

    let model = compile(&instance).unwrap();
    let cancel = AtomicBool::new(false);
    let outcome = orchestrator::run(&model, &config, &cancel).unwrap();

    assert_eq!(outcome.seed_unplaced, 1);
    assert!(outcome.failure_reasons.availability > 0);
}

/// Scenario E: a single day with three one-hour subjects on one teacher in
/// one classroom. The heuristic chain must never leave the seeded schedule
/// worse off: tabu/ALNS gap cost is always less than or equal to the
/// construction-only baseline.
#[test]
fn scenario_e_improvement_never_worsens_the_seed() {
    let teachers = vec![base_teacher("t1", "Ada", &["A", "B", "C"], vec![u32::MAX; 5])];
    let classrooms = vec![base_classroom("c1", "9A")];
    let subjects = vec!["A", "B", "C"]
        .into_iter()
        .map(|name| Subject {
            id: SubjectId::from(name),
            name: name.into(),
            weekly_hours: 1,
            block_hours: 0,
            triple_block_hours: 0,
            max_consec: None,
            assigned_class_ids: vec![ClassroomId::from("c1")],
            location_id: None,
            pinned_teacher_by_classroom: StdHashMap::new(),
            required_teacher_count: 1,
        })
        .collect();
    let time_grid = TimeGrid {
        middle: [4, 4, 4, 4, 4],
        high: [5, 0, 0, 0, 0],
    };

    let repair_config = SolverConfig {
        strategy: Strategy::Repair,
        time_limit_seconds: 2,
        random_seed: Some(21),
        ..SolverConfig::default()
    };
    let repair_instance = Instance {
        teachers: teachers.clone(),
        classrooms: classrooms.clone(),
        subjects,
        locations: vec![],
        fixed_assignments: vec![],
        lesson_groups: vec![],
        duties: vec![],
        time_grid: time_grid.clone(),
        config: repair_config.clone(),
    };
    let model = compile(&repair_instance).unwrap();
    let cancel = AtomicBool::new(false);
    let repair_outcome = orchestrator::run(&model, &repair_config, &cancel).unwrap();

    let mut tabu_config = repair_config.clone();
    tabu_config.strategy = Strategy::Tabu;
    let tabu_outcome = orchestrator::run(&model, &tabu_config, &cancel).unwrap();

    assert_eq!(repair_outcome.seed_unplaced, 0);
    assert_eq!(tabu_outcome.seed_unplaced, 0);
    assert!(
        tabu_outcome.objective.teacher_gap <= repair_outcome.objective.teacher_gap,
        "tabu/ALNS must never leave the gap cost worse than construction alone"
    );
}

/// Scenario F: an exact-solver attempt with an already-expired time budget
/// falls back to the heuristic chain and still returns a feasible schedule.
#[test]
fn scenario_f_cp_fallback_still_solves() {
    let config = SolverConfig {
        strategy: Strategy::Cp,
        time_limit_seconds: 0,
        allow_fallback: true,
        random_seed: Some(2),
        ..SolverConfig::default()
    };
    let instance = Instance {
        teachers: vec![base_teacher("t1", "Ada", &["Mat"], vec![u32::MAX; 5])],
        classrooms: vec![base_classroom("c1", "9A")],
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
        config: config.clone(),
    };

    let model = compile(&instance).unwrap();
    let cancel = AtomicBool::new(false);
    let outcome = orchestrator::run(&model, &config, &cancel).unwrap();

    assert!(outcome.fell_back_to_tabu);
    assert_eq!(outcome.seed_unplaced, 0);
}
