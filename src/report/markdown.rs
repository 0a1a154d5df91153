use super::SolverReport;

/// Generate a markdown report of the solve.
pub fn generate_markdown_report(report: &SolverReport) -> String {
    let outcome = report.outcome;
    let mut lines = vec![
        "# Solver Report".to_string(),
        String::new(),
        format!("Generated: {}", report.generated_at.to_rfc3339()),
        format!("Strategy: {:?}", outcome.strategy_used),
        format!("Elapsed: {}ms", outcome.elapsed.as_millis()),
        String::new(),
    ];

    lines.push("## Summary\n".to_string());
    lines.push("| Metric | Value |".to_string());
    lines.push("|--------|-------|".to_string());
    lines.push(format!(
        "| Occupied cells | {} |",
        outcome.schedule.total_occupied_cells()
    ));
    lines.push(format!("| Unplaced units | {} |", outcome.seed_unplaced));
    lines.push(format!("| Seed attempts | {} |", outcome.seed_attempts));
    lines.push(format!("| Seed backtracks | {} |", outcome.seed_backtracks));
    lines.push(format!("| Tabu iterations | {} |", outcome.tabu_iterations));
    lines.push(format!("| Tabu improvements | {} |", outcome.tabu_improvements));
    lines.push(format!("| ALNS iterations | {} |", outcome.alns_iterations));
    lines.push(format!("| ALNS accepted moves | {} |", outcome.alns_accepted));
    lines.push(format!("| Objective total | {:.2} |", outcome.objective.total));
    lines.push(String::new());

    lines.push(if outcome.seed_unplaced == 0 && !outcome.timed_out {
        "## Result: PASSED\n".to_string()
    } else {
        "## Result: INCOMPLETE\n".to_string()
    });
    if outcome.fell_back_to_tabu {
        lines.push("- Exact solver timed out; fell back to the heuristic chain.".to_string());
    }
    if outcome.timed_out {
        lines.push("- Solve hit its wall-clock deadline before settling.".to_string());
    }
    if outcome.seed_unplaced > 0 {
        lines.push(format!(
            "- {} lesson unit(s) could not be placed during construction.",
            outcome.seed_unplaced
        ));
    }
    for note in &outcome.notes {
        lines.push(format!("- {}", note));
    }
    lines.push(String::new());

    let f = &outcome.failure_reasons;
    if f.level_mismatch + f.availability + f.class_busy + f.teacher_busy + f.location_busy + f.block_boundary > 0 {
        lines.push("## Failure Reasons\n".to_string());
        lines.push("| Reason | Count |".to_string());
        lines.push("|--------|-------|".to_string());
        lines.push(format!("| levelMismatch | {} |", f.level_mismatch));
        lines.push(format!("| availability | {} |", f.availability));
        lines.push(format!("| classBusy | {} |", f.class_busy));
        lines.push(format!("| teacherBusy | {} |", f.teacher_busy));
        lines.push(format!("| locationBusy | {} |", f.location_busy));
        lines.push(format!("| blockBoundary | {} |", f.block_boundary));
        lines.push(String::new());
    }

    lines.push("## Objective Breakdown\n".to_string());
    lines.push("| Component | Value |".to_string());
    lines.push("|-----------|-------|".to_string());
    lines.push(format!("| Teacher gap | {:.2} |", outcome.objective.teacher_gap));
    lines.push(format!("| Teacher edge | {:.2} |", outcome.objective.teacher_edge));
    lines.push(format!("| Teacher spread | {:.2} |", outcome.objective.teacher_spread));
    lines.push(format!("| Total | {:.2} |", outcome.objective.total));
    lines.push(String::new());

    if !report.hardest_units.is_empty() {
        lines.push("## Hardest Lesson Units\n".to_string());
        lines.push("| Subject | Classrooms | Span | Eligible tuples |".to_string());
        lines.push("|---------|------------|------|-----------------|".to_string());
        for unit in &report.hardest_units {
            lines.push(format!(
                "| {} | {} | {} | {} |",
                unit.subject_name,
                unit.classroom_names.join(", "),
                unit.span,
                unit.eligible_tuple_count
            ));
        }
        lines.push(String::new());
    }

    lines.push("## Classroom Schedules\n".to_string());
    let mut classroom_ids: Vec<_> = outcome.schedule.cells.keys().collect();
    classroom_ids.sort();
    for classroom_id in classroom_ids {
        let name = report.classroom_name(classroom_id);
        lines.push(format!("### {}\n", name));
        lines.push("| Day | Period | Subject | Teacher(s) |".to_string());
        lines.push("|-----|--------|---------|------------|".to_string());
        let days = &outcome.schedule.cells[classroom_id];
        for (day_idx, periods) in days.iter().enumerate() {
            for (period_idx, cell) in periods.iter().enumerate() {
                let Some(assignment) = cell else { continue };
                let teachers: Vec<&str> = assignment
                    .teacher_ids
                    .iter()
                    .map(|id| report.teacher_name(id))
                    .collect();
                lines.push(format!(
                    "| {} | P{} | {} | {} |",
                    crate::types::Cell::new(day_idx as u8, period_idx as u8).day_name(),
                    period_idx + 1,
                    report.subject_name(&assignment.subject_id),
                    teachers.join(", ")
                ));
            }
        }
        lines.push(String::new());
    }

    lines.join("\n")
}
