use super::working::WorkingSchedule;
use crate::model::compiler::{CompiledModel, LessonUnit};
use crate::types::LessonUnitIndex;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

const MAX_BACKTRACKS: u32 = 500;

/// Bucketed reasons a candidate placement was rejected during construction.
#[derive(Debug, Default, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureReasons {
    pub level_mismatch: u32,
    pub availability: u32,
    pub class_busy: u32,
    pub teacher_busy: u32,
    pub location_busy: u32,
    pub block_boundary: u32,
}

impl FailureReasons {
    pub fn record(&mut self, reason: &str) {
        match reason {
            "levelMismatch" => self.level_mismatch += 1,
            "availability" => self.availability += 1,
            "classBusy" => self.class_busy += 1,
            "teacherBusy" => self.teacher_busy += 1,
            "locationBusy" => self.location_busy += 1,
            _ => self.block_boundary += 1,
        }
    }
}

#[derive(Debug, Default)]
pub struct SeedReport {
    pub attempts: u32,
    pub backtracks: u32,
    pub failure_reasons: FailureReasons,
    pub unplaced: Vec<LessonUnitIndex>,
    pub time_to_first_feasible: Option<Duration>,
    /// Set when `cancel` fired before construction produced a complete
    /// assignment; the caller should treat the partial schedule as void.
    pub cancelled: bool,
}

struct Candidate {
    day: u8,
    start_period: u8,
    teacher_idxs: Vec<usize>,
    /// Lower is better: counts new teacher-day gaps this placement would open.
    rank: i64,
}

/// Greedy most-constrained-first construction with bounded chronological
/// backtracking: on a dead end, undo the most recently placed unit and try
/// its next-best alternative, up to `MAX_BACKTRACKS` total.
pub fn seed<'m>(
    model: &'m CompiledModel,
    cancel: &AtomicBool,
    random_seed: Option<u64>,
    stop_at_first: bool,
) -> (WorkingSchedule<'m>, SeedReport) {
    let start = Instant::now();
    let mut rng = ChaCha8Rng::seed_from_u64(random_seed.unwrap_or(0));
    let mut schedule = WorkingSchedule::new(model);
    let mut report = SeedReport::default();

    let order = order_by_urgency(model, &mut rng);
    // For each ordered position, the alternative candidates not yet tried,
    // so a backtrack can resume from where it left off.
    let mut frames: Vec<(usize, Vec<Candidate>)> = Vec::new();
    let mut pos = 0usize;

    while pos < order.len() {
        if pos % 256 == 0 && cancel.load(Ordering::Relaxed) {
            if schedule.placed_count() < model.units.len() {
                report.cancelled = true;
            }
            break;
        }
        let unit_idx = order[pos];
        let unit = &model.units[unit_idx.0];
        report.attempts += 1;

        let mut candidates = match frames.last() {
            Some((frame_pos, _)) if *frame_pos == pos => frames.pop().unwrap().1,
            _ => enumerate_candidates(model, &schedule, unit, &mut report.failure_reasons),
        };

        if let Some(best) = pop_best(&mut candidates) {
            schedule.place(unit, best.day, best.start_period, best.teacher_idxs);
            if report.time_to_first_feasible.is_none() && schedule.placed_count() == model.units.len() {
                report.time_to_first_feasible = Some(start.elapsed());
            }
            frames.push((pos, candidates));
            pos += 1;
            if stop_at_first && schedule.placed_count() == model.units.len() {
                break;
            }
        } else if let Some((prev_pos, prev_candidates)) = backtrack(&mut frames, &mut schedule, model, &order) {
            if prev_candidates.is_empty() {
                // No alternative left for the previous unit either; give up
                // on the current unit and move forward, leaving it unplaced.
                report.unplaced.push(unit_idx);
                pos += 1;
            } else {
                report.backtracks += 1;
                frames.push((prev_pos, prev_candidates));
                pos = prev_pos;
            }
            if report.backtracks > MAX_BACKTRACKS {
                report.unplaced.push(unit_idx);
                pos += 1;
            }
        } else {
            report.unplaced.push(unit_idx);
            pos += 1;
        }
    }

    (schedule, report)
}

fn backtrack<'m>(
    frames: &mut Vec<(usize, Vec<Candidate>)>,
    schedule: &mut WorkingSchedule<'m>,
    model: &'m CompiledModel,
    order: &[LessonUnitIndex],
) -> Option<(usize, Vec<Candidate>)> {
    let (prev_pos, remaining) = frames.pop()?;
    let prev_unit = &model.units[order[prev_pos].0];
    schedule.remove(prev_unit);
    Some((prev_pos, remaining))
}

fn order_by_urgency(model: &CompiledModel, rng: &mut ChaCha8Rng) -> Vec<LessonUnitIndex> {
    let mut indices: Vec<usize> = (0..model.units.len()).collect();
    indices.shuffle(rng);
    indices.sort_by_key(|&i| {
        let unit = &model.units[i];
        let feasible_estimate = feasible_window_count(model, unit);
        (
            feasible_estimate,
            std::cmp::Reverse(unit.span),
            unit.eligible_tuples.len(),
        )
    });
    indices.into_iter().map(LessonUnitIndex).collect()
}

fn feasible_window_count(model: &CompiledModel, unit: &LessonUnit) -> u32 {
    let mut count = 0u32;
    for &classroom_idx in &unit.classroom_idxs {
        let classroom = &model.classrooms[classroom_idx];
        for day in 0..5u8 {
            if let Some(restrict) = unit.day_restriction {
                if restrict != day {
                    continue;
                }
            }
            let mask = classroom.valid_mask[day as usize];
            for start in 0..model.max_daily_hours.saturating_sub(unit.span - 1) {
                let span_mask = span_bits(start, unit.span);
                if mask & span_mask == span_mask {
                    count += 1;
                }
            }
        }
    }
    count
}

fn span_bits(start: u8, span: u8) -> u32 {
    let mut m = 0u32;
    for p in start..start + span {
        m |= 1 << p;
    }
    m
}

fn enumerate_candidates(
    model: &CompiledModel,
    schedule: &WorkingSchedule,
    unit: &LessonUnit,
    failures: &mut FailureReasons,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    let max_consec = unit.max_consec;

    for day in 0..5u8 {
        if let Some(restrict) = unit.day_restriction {
            if restrict != day {
                continue;
            }
        }
        let starts: Vec<u8> = if let Some(fixed) = unit.fixed_start {
            if fixed.day == day {
                vec![fixed.period]
            } else {
                continue;
            }
        } else {
            (0..=model.max_daily_hours.saturating_sub(unit.span)).collect()
        };

        for start in starts {
            for tuple in &unit.eligible_tuples {
                if !schedule.can_place(unit, day, start, tuple) {
                    failures.record(classify_failure(model, schedule, unit, day, start, tuple));
                    continue;
                }
                if !schedule.respects_max_consec(unit, day, start, max_consec) {
                    failures.record("blockBoundary");
                    continue;
                }
                let rank = rank_candidate(schedule, day, start, tuple);
                candidates.push(Candidate {
                    day,
                    start_period: start,
                    teacher_idxs: tuple.clone(),
                    rank,
                });
            }
        }
    }
    candidates
}

fn classify_failure(
    model: &CompiledModel,
    schedule: &WorkingSchedule,
    unit: &LessonUnit,
    day: u8,
    start: u8,
    tuple: &[usize],
) -> &'static str {
    let end = start + unit.span;
    for &classroom_idx in &unit.classroom_idxs {
        let mask = model.classrooms[classroom_idx].valid_mask[day as usize];
        for p in start..end {
            if mask & (1 << p) == 0 {
                return "levelMismatch";
            }
            if schedule.grid[classroom_idx][day as usize][p as usize].is_some() {
                return "classBusy";
            }
        }
    }
    for &teacher_idx in tuple {
        for p in start..end {
            if !model.teachers[teacher_idx].is_free(day, p) {
                return "availability";
            }
            if schedule.teacher_busy.contains(&(teacher_idx, day, p)) {
                return "teacherBusy";
            }
        }
    }
    "locationBusy"
}

fn rank_candidate(schedule: &WorkingSchedule, day: u8, start: u8, tuple: &[usize]) -> i64 {
    // Prefer windows adjacent to a teacher's already-placed hours that day
    // (keeps schedules compact) and non-edge hours.
    let mut score = 0i64;
    for &teacher_idx in tuple {
        let adjacent = schedule.teacher_busy.contains(&(teacher_idx, day, start.wrapping_sub(1)))
            || schedule.teacher_busy.contains(&(teacher_idx, day, start + 1));
        if adjacent {
            score -= 5;
        }
    }
    if start == 0 {
        score += 1;
    }
    score
}

fn pop_best(candidates: &mut Vec<Candidate>) -> Option<Candidate> {
    if candidates.is_empty() {
        return None;
    }
    let best_idx = candidates
        .iter()
        .enumerate()
        .min_by_key(|(_, c)| c.rank)
        .map(|(i, _)| i)?;
    Some(candidates.remove(best_idx))
}
