use super::compiler::CompiledModel;
use std::collections::HashMap;

/// Non-fatal necessary-condition report produced before search starts,
/// mirroring the bulk-warning idiom of the parser's `ValidationResult`.
#[derive(Debug, Default)]
pub struct FeasibilityReport {
    pub warnings: Vec<String>,
    /// `(demand_hours, capacity_cells)` per teacher index, where demand is
    /// the count of units for which this teacher is the only candidate.
    pub teacher_load: HashMap<usize, (u32, u32)>,
    pub overloaded: bool,
}

/// Computes necessary conditions: teacher load vs. availability, and
/// demand vs. capacity per classroom/subject (already hard-checked at
/// compile time; here we additionally flag teachers that are individually
/// tight even though the instance as a whole compiled).
pub fn analyze(model: &CompiledModel) -> FeasibilityReport {
    let mut report = FeasibilityReport::default();

    let mut sole_candidate_demand: HashMap<usize, u32> = HashMap::new();
    for unit in &model.units {
        if let [only_tuple] = unit.eligible_tuples.as_slice() {
            if let [only_teacher] = only_tuple.as_slice() {
                *sole_candidate_demand.entry(*only_teacher).or_default() += unit.span as u32;
            }
        }
    }

    for (idx, teacher) in model.teachers.iter().enumerate() {
        let capacity: u32 = teacher
            .availability
            .iter()
            .map(|mask| mask.count_ones())
            .sum();
        let demand = sole_candidate_demand.get(&idx).copied().unwrap_or(0);
        report.teacher_load.insert(idx, (demand, capacity));
        if demand > capacity {
            report.overloaded = true;
            report.warnings.push(format!(
                "teacher '{}' has {demand} sole-candidate hours but only {capacity} available periods",
                teacher.id
            ));
        }
    }

    report
}
