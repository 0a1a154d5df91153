use super::SolverReport;
use crate::config::Strategy;
use crate::error::Result;
use crate::solver::seeder::FailureReasons;
use crate::types::Schedule;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SeedStats {
    attempts: u32,
    backtracks: u32,
    unplaced: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TabuStats {
    iterations: u32,
    improvements: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AlnsStats {
    iterations: u32,
    accepted: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ObjectiveBreakdown {
    teacher_gap: f64,
    teacher_edge: f64,
    teacher_spread: f64,
    total: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HardestUnitJson {
    subject_name: String,
    classroom_names: Vec<String>,
    eligible_tuple_count: usize,
    span: u8,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport {
    generated_at: DateTime<Utc>,
    strategy_used: Strategy,
    fell_back_to_tabu: bool,
    timed_out: bool,
    elapsed_ms: u128,
    time_to_first_feasible_ms: Option<u128>,
    seed: SeedStats,
    tabu: TabuStats,
    alns: AlnsStats,
    objective: ObjectiveBreakdown,
    failure_reasons: FailureReasons,
    hardest_units: Vec<HardestUnitJson>,
    notes: Vec<String>,
    schedule: Schedule,
}

/// Full machine-readable report: every field of `SolveOutcome` plus the
/// schedule, serialized the way the pack's own `generate_json_report`
/// serializes a `Schedule` straight through `serde_json`.
pub fn generate_json_report(report: &SolverReport) -> Result<String> {
    let outcome = report.outcome;
    let doc = JsonReport {
        generated_at: report.generated_at,
        strategy_used: outcome.strategy_used,
        fell_back_to_tabu: outcome.fell_back_to_tabu,
        timed_out: outcome.timed_out,
        elapsed_ms: outcome.elapsed.as_millis(),
        time_to_first_feasible_ms: outcome.time_to_first_feasible.map(|d| d.as_millis()),
        seed: SeedStats {
            attempts: outcome.seed_attempts,
            backtracks: outcome.seed_backtracks,
            unplaced: outcome.seed_unplaced,
        },
        tabu: TabuStats {
            iterations: outcome.tabu_iterations,
            improvements: outcome.tabu_improvements,
        },
        alns: AlnsStats {
            iterations: outcome.alns_iterations,
            accepted: outcome.alns_accepted,
        },
        objective: ObjectiveBreakdown {
            teacher_gap: outcome.objective.teacher_gap,
            teacher_edge: outcome.objective.teacher_edge,
            teacher_spread: outcome.objective.teacher_spread,
            total: outcome.objective.total,
        },
        failure_reasons: outcome.failure_reasons.clone(),
        hardest_units: report
            .hardest_units
            .iter()
            .map(|h| HardestUnitJson {
                subject_name: h.subject_name.clone(),
                classroom_names: h.classroom_names.clone(),
                eligible_tuple_count: h.eligible_tuple_count,
                span: h.span,
            })
            .collect(),
        notes: outcome.notes.clone(),
        schedule: outcome.schedule.clone(),
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonSummary {
    total_occupied_cells: usize,
    unplaced_count: usize,
    solve_time_ms: u128,
    score: f64,
}

/// A smaller summary for callers that only want the headline numbers.
pub fn generate_json_summary(report: &SolverReport) -> Result<String> {
    let outcome = report.outcome;
    let summary = JsonSummary {
        total_occupied_cells: outcome.schedule.total_occupied_cells(),
        unplaced_count: outcome.seed_unplaced,
        solve_time_ms: outcome.elapsed.as_millis(),
        score: outcome.objective.total,
    };
    Ok(serde_json::to_string_pretty(&summary)?)
}
