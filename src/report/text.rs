use super::SolverReport;
use colored::Colorize;

/// Generate a plain text report, colored for terminal display.
pub fn generate_text_report(report: &SolverReport) -> String {
    let outcome = report.outcome;
    let mut lines = Vec::new();

    lines.push("═".repeat(60));
    lines.push("               SOLVER REPORT".to_string());
    lines.push("═".repeat(60));
    lines.push(String::new());

    lines.push(format!("Generated: {}", report.generated_at.to_rfc3339()));
    lines.push(format!("Strategy: {:?}", outcome.strategy_used));
    lines.push(format!("Elapsed: {}ms", outcome.elapsed.as_millis()));
    lines.push(String::new());

    lines.push("─".repeat(40));
    lines.push("STATISTICS".to_string());
    lines.push("─".repeat(40));
    lines.push(format!(
        "  Occupied cells:  {}",
        outcome.schedule.total_occupied_cells()
    ));
    lines.push(format!("  Unplaced units:  {}", outcome.seed_unplaced));
    lines.push(format!(
        "  Seed:            {} attempts, {} backtracks",
        outcome.seed_attempts, outcome.seed_backtracks
    ));
    lines.push(format!(
        "  Tabu:            {} iterations, {} improvements",
        outcome.tabu_iterations, outcome.tabu_improvements
    ));
    lines.push(format!(
        "  ALNS:            {} iterations, {} accepted",
        outcome.alns_iterations, outcome.alns_accepted
    ));
    lines.push(format!("  Objective total: {:.2}", outcome.objective.total));
    lines.push(String::new());

    lines.push("─".repeat(40));
    let complete = outcome.seed_unplaced == 0 && !outcome.timed_out;
    if complete {
        lines.push("RESULT: COMPLETE".green().to_string());
    } else {
        lines.push("RESULT: INCOMPLETE".red().to_string());
        if outcome.fell_back_to_tabu {
            lines.push("  ! exact solver timed out, fell back to heuristic chain".to_string());
        }
        if outcome.timed_out {
            lines.push("  ! solve hit its wall-clock deadline".to_string());
        }
        if outcome.seed_unplaced > 0 {
            lines.push(format!("  ! {} lesson unit(s) left unplaced", outcome.seed_unplaced));
        }
    }
    for note in &outcome.notes {
        lines.push(format!("  - {}", note));
    }
    lines.push("─".repeat(40));
    lines.push(String::new());

    let f = &outcome.failure_reasons;
    if f.level_mismatch + f.availability + f.class_busy + f.teacher_busy + f.location_busy + f.block_boundary > 0 {
        lines.push("FAILURE REASONS".to_string());
        lines.push("─".repeat(40));
        lines.push(format!("  levelMismatch: {}", f.level_mismatch));
        lines.push(format!("  availability:  {}", f.availability));
        lines.push(format!("  classBusy:     {}", f.class_busy));
        lines.push(format!("  teacherBusy:   {}", f.teacher_busy));
        lines.push(format!("  locationBusy:  {}", f.location_busy));
        lines.push(format!("  blockBoundary: {}", f.block_boundary));
        lines.push(String::new());
    }

    if !report.hardest_units.is_empty() {
        lines.push("HARDEST LESSON UNITS".to_string());
        lines.push("─".repeat(40));
        for unit in &report.hardest_units {
            let indicator = if unit.eligible_tuple_count <= 1 {
                "●".red()
            } else if unit.eligible_tuple_count <= 3 {
                "●".yellow()
            } else {
                "●".green()
            };
            lines.push(format!(
                "  {} {} ({}) | span {} | {} eligible tuple(s)",
                indicator,
                unit.subject_name,
                unit.classroom_names.join(", "),
                unit.span,
                unit.eligible_tuple_count
            ));
        }
        lines.push(String::new());
    }

    lines.push("═".repeat(60));

    lines.join("\n")
}

/// Print a quick colored summary to stdout.
pub fn print_summary(report: &SolverReport) {
    let outcome = report.outcome;
    println!();
    if outcome.seed_unplaced == 0 && !outcome.timed_out {
        println!("{}", "✓ Schedule solved successfully".green().bold());
    } else {
        println!("{}", "✗ Schedule is incomplete".red().bold());
    }
    println!();
    println!(
        "  Occupied cells: {}",
        outcome.schedule.total_occupied_cells()
    );
    println!("  Unplaced:       {}", outcome.seed_unplaced);
    println!("  Objective:      {:.2}", outcome.objective.total);
    println!("  Time:           {}ms", outcome.elapsed.as_millis());
    println!();
}
