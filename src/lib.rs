//! A school-timetabling solver core.
//!
//! The core is a pipeline of five cooperating components:
//!
//! 1. **Model Compiler** (`model::compiler`) validates the declarative
//!    instance and compiles it to an index-based representation.
//! 2. **Feasibility Pre-Analyzer** (`model::feasibility`) computes necessary
//!    conditions before search starts.
//! 3. **Constructive Seeder** (`solver::seeder`) produces an initial
//!    assignment via greedy most-constrained-first placement.
//! 4. **Metaheuristic Improver** (`solver::tabu`, `solver::alns`) improves
//!    the seed via Tabu Search or Adaptive Large Neighborhood Search.
//! 5. **Exact CP Solver Adapter** (`solver::cp_adapter`) encodes the model
//!    as a MILP and solves it to provable or time-bounded optimality.
//!
//! `solver::orchestrator::run` selects and sequences strategies per
//! `config::SolverConfig` and produces a `solver::orchestrator::SolveOutcome`,
//! which `report::SolverReport` wraps for rendering.
//!
//! ```no_run
//! use school_timetabler::parser::load_instance_from_dir;
//! use school_timetabler::model::compiler::compile;
//! use school_timetabler::solver::orchestrator;
//! use std::path::Path;
//! use std::sync::atomic::AtomicBool;
//!
//! let instance = load_instance_from_dir(Path::new("./data/demo")).unwrap();
//! let compiled = compile(&instance).unwrap();
//! let cancel = AtomicBool::new(false);
//! let outcome = orchestrator::run(&compiled, &instance.config, &cancel).unwrap();
//! println!("objective: {:.1}", outcome.objective.total);
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod parser;
pub mod report;
pub mod solver;
pub mod types;

pub use error::{Result, TimetableError};
