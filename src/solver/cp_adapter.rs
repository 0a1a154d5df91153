use super::working::WorkingSchedule;
use crate::config::SolverConfig;
use crate::error::TimetableError;
use crate::model::compiler::CompiledModel;
use good_lp::{constraint, variable, variables, Expression, Solution, SolverModel};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

const MAX_CUTTING_PLANE_ROUNDS: u32 = 8;

#[derive(Debug)]
pub struct CpOutcome {
    pub timed_out: bool,
    pub rounds: u32,
}

/// Key identifying one admissible (unit, day, start, teacher-tuple) decision.
type VarKey = (usize, u8, u8, usize);

/// Exact formulation over the admissible placements already enumerated by
/// the compiled model: a binary per (unit, day, start, tuple), no-overlap
/// constraints on classrooms/teachers/locations, and a cutting-plane loop
/// that adds a forbidding constraint whenever the relaxed-`maxConsec`
/// solution turns out to violate it (HiGHS has no native rolling-window
/// constraint, so this is checked and patched iteratively rather than
/// encoded upfront), the same way the pack's own ILP solver builds one
/// `good_lp` model per call and re-solves after tightening constraints.
pub fn solve(
    model: &CompiledModel,
    config: &SolverConfig,
    deadline: Instant,
    cancel: &AtomicBool,
) -> crate::error::Result<(WorkingSchedule, CpOutcome)> {
    let mut forbidden: Vec<VarKey> = Vec::new();

    for round in 1..=MAX_CUTTING_PLANE_ROUNDS {
        if cancel.load(Ordering::Relaxed) || Instant::now() >= deadline {
            let schedule = WorkingSchedule::new(model);
            return Ok((schedule, CpOutcome { timed_out: true, rounds: round }));
        }

        let Some((schedule, ok)) = solve_once(model, config, &forbidden)? else {
            return Err(TimetableError::Infeasible {
                reason: "CP adapter found no feasible assignment of the admissible window set"
                    .to_string(),
            }
            .into());
        };

        if ok {
            return Ok((schedule, CpOutcome { timed_out: false, rounds: round }));
        }

        let violation = find_worst_violation(model, &schedule);
        match violation {
            Some(key) => forbidden.push(key),
            None => return Ok((schedule, CpOutcome { timed_out: false, rounds: round })),
        }
    }

    let schedule = WorkingSchedule::new(model);
    Ok((schedule, CpOutcome { timed_out: true, rounds: MAX_CUTTING_PLANE_ROUNDS }))
}

#[allow(clippy::type_complexity)]
fn solve_once(
    model: &CompiledModel,
    config: &SolverConfig,
    forbidden: &[VarKey],
) -> crate::error::Result<Option<(WorkingSchedule, bool)>> {
    let mut vars = variables!();
    let mut y: BTreeMap<VarKey, _> = BTreeMap::new();

    for unit in &model.units {
        for day in 0..5u8 {
            if let Some(restrict) = unit.day_restriction {
                if restrict != day {
                    continue;
                }
            }
            let starts: Vec<u8> = match unit.fixed_start {
                Some(fixed) if fixed.day == day => vec![fixed.period],
                Some(_) => continue,
                None => (0..=model.max_daily_hours.saturating_sub(unit.span)).collect(),
            };
            for start in starts {
                if !window_fits_classrooms(model, unit, day, start) {
                    continue;
                }
                for (tuple_idx, _) in unit.eligible_tuples.iter().enumerate() {
                    let key = (unit.index.0, day, start, tuple_idx);
                    if forbidden.contains(&key) {
                        continue;
                    }
                    y.insert(key, vars.add(variable().binary()));
                }
            }
        }
    }

    if y.is_empty() {
        return Ok(None);
    }

    // Linear preference objective: discourage first/last-period use
    // (edgeWeight) and reward back-to-back occupancy for the same teacher
    // (nogapWeight), via an AND-linearization over adjacent periods. The
    // exact gap count and same-day split cost (§4.4) need a prefix/suffix-OR
    // encoding across the whole day that isn't worth the extra constraints
    // at this layer; the heuristic improver computes those precisely and
    // runs after a CP timeout/fallback anyway.
    let mut objective = Expression::default();
    for (&(unit_idx, day, start, _tuple_idx), &var) in &y {
        let unit = &model.units[unit_idx];
        let end = start + unit.span;
        let touches_edge = start == 0 || end == model.max_daily_hours;
        if touches_edge {
            objective += (-config.cp_prefs.edge_weight) * var;
        }
        let _ = day;
    }

    let mut contiguity_pairs = Vec::new();
    if config.cp_prefs.nogap_weight != 0.0 {
        for teacher_idx in 0..model.teachers.len() {
            for day in 0..5u8 {
                let occ_at = |period: u8| -> Option<Expression> {
                    let terms: Vec<Expression> = y
                        .iter()
                        .filter(|((u, d, s, t), _)| {
                            *d == day
                                && window_covers(*s, model.units[*u].span, period)
                                && model.units[*u].eligible_tuples[*t].contains(&teacher_idx)
                        })
                        .map(|(_, &v)| Expression::from(v))
                        .collect();
                    if terms.is_empty() {
                        None
                    } else {
                        Some(terms.into_iter().sum())
                    }
                };
                for period in 0..model.max_daily_hours.saturating_sub(1) {
                    let (Some(this_occ), Some(next_occ)) = (occ_at(period), occ_at(period + 1)) else {
                        continue;
                    };
                    let contig = vars.add(variable().binary());
                    objective += config.cp_prefs.nogap_weight * contig;
                    contiguity_pairs.push((contig, this_occ, next_occ));
                }
            }
        }
    }

    let mut problem = vars.maximise(objective).using(good_lp::solvers::highs::highs);

    for (contig, this_occ, next_occ) in contiguity_pairs {
        problem = problem.with(constraint!(contig <= this_occ));
        problem = problem.with(constraint!(contig <= next_occ));
    }

    for unit in &model.units {
        let relevant: Vec<_> = y
            .iter()
            .filter(|((u, _, _, _), _)| *u == unit.index.0)
            .map(|(_, &v)| v)
            .collect();
        if relevant.is_empty() {
            return Ok(None);
        }
        let sum: Expression = relevant.into_iter().map(Expression::from).sum();
        problem = problem.with(constraint!(sum == 1));
    }

    for classroom_idx in 0..model.classrooms.len() {
        for day in 0..5u8 {
            for period in 0..model.max_daily_hours {
                let occupying: Vec<_> = y
                    .iter()
                    .filter(|((u, d, s, _), _)| {
                        *d == day
                            && model.units[*u].classroom_idxs.contains(&classroom_idx)
                            && window_covers(*s, model.units[*u].span, period)
                    })
                    .map(|(_, &v)| v)
                    .collect();
                if occupying.len() > 1 {
                    let sum: Expression = occupying.into_iter().map(Expression::from).sum();
                    problem = problem.with(constraint!(sum <= 1));
                }
            }
        }
    }

    for teacher_idx in 0..model.teachers.len() {
        for day in 0..5u8 {
            for period in 0..model.max_daily_hours {
                let occupying: Vec<_> = y
                    .iter()
                    .filter(|((u, d, s, t), _)| {
                        *d == day
                            && window_covers(*s, model.units[*u].span, period)
                            && model.units[*u].eligible_tuples[*t].contains(&teacher_idx)
                    })
                    .map(|(_, &v)| v)
                    .collect();
                if occupying.len() > 1 {
                    let sum: Expression = occupying.into_iter().map(Expression::from).sum();
                    problem = problem.with(constraint!(sum <= 1));
                }
            }
        }
    }

    for location_idx in 0..model.locations.len() {
        for day in 0..5u8 {
            for period in 0..model.max_daily_hours {
                let occupying: Vec<_> = y
                    .iter()
                    .filter(|((u, d, s, _), _)| {
                        *d == day
                            && model.units[*u].location_idx == Some(location_idx)
                            && window_covers(*s, model.units[*u].span, period)
                    })
                    .map(|(_, &v)| v)
                    .collect();
                if occupying.len() > 1 {
                    let sum: Expression = occupying.into_iter().map(Expression::from).sum();
                    problem = problem.with(constraint!(sum <= 1));
                }
            }
        }
    }

    // A solve-call failure here isn't model infeasibility (that's reported
    // as `Ok(None)`/cutting-plane exhaustion above) — it means HiGHS itself
    // couldn't produce a result for this formulation.
    let solution = problem
        .solve()
        .map_err(|e| TimetableError::BackendUnavailable(format!("{e:?}")))?;

    let mut schedule = WorkingSchedule::new(model);
    for (&(unit_idx, day, start, tuple_idx), &var) in &y {
        if solution.value(var) > 0.5 {
            let unit = &model.units[unit_idx];
            let tuple = unit.eligible_tuples[tuple_idx].clone();
            schedule.place(unit, day, start, tuple);
        }
    }

    let ok = model
        .units
        .iter()
        .all(|u| schedule.placements.contains_key(&u.index))
        && model.units.iter().all(|u| {
            let (_, day, start) = &schedule.placements[&u.index];
            schedule.respects_max_consec(u, *day, *start, u.max_consec)
        });

    Ok(Some((schedule, ok)))
}

fn window_covers(start: u8, span: u8, period: u8) -> bool {
    period >= start && period < start + span
}

fn window_fits_classrooms(model: &CompiledModel, unit: &crate::model::compiler::LessonUnit, day: u8, start: u8) -> bool {
    let end = start + unit.span;
    unit.classroom_idxs.iter().all(|&c| {
        let mask = model.classrooms[c].valid_mask[day as usize];
        (start..end).all(|p| mask & (1 << p) != 0)
    })
}

/// Finds one (unit, day, start, tuple) combination from the current
/// solution whose placement breaks `maxConsec`, to forbid and re-solve.
fn find_worst_violation(model: &CompiledModel, schedule: &WorkingSchedule) -> Option<VarKey> {
    for (idx, (teachers, day, start)) in &schedule.placements {
        let unit = &model.units[idx.0];
        if !schedule.respects_max_consec(unit, *day, *start, unit.max_consec) {
            let tuple_idx = unit
                .eligible_tuples
                .iter()
                .position(|t| t == teachers)
                .unwrap_or(0);
            return Some((idx.0, *day, *start, tuple_idx));
        }
    }
    None
}
