use serde::{Deserialize, Serialize};

/// School level; selects which row of the ragged time grid applies to a classroom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Middle,
    High,
}

/// A single (day, period) cell. Day 0-4 is Mon-Fri; period is 0-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub day: u8,
    pub period: u8,
}

impl Cell {
    pub fn new(day: u8, period: u8) -> Self {
        Self { day, period }
    }

    pub fn day_name(&self) -> &'static str {
        match self.day {
            0 => "Monday",
            1 => "Tuesday",
            2 => "Wednesday",
            3 => "Thursday",
            4 => "Friday",
            _ => "Unknown",
        }
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} P{}", self.day_name(), self.period + 1)
    }
}

/// Ragged weekly time grid: `hours[level][day]` gives the number of
/// periods in session for that level on that day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeGrid {
    pub middle: [u8; 5],
    pub high: [u8; 5],
}

impl TimeGrid {
    pub fn hours(&self, level: Level, day: u8) -> u8 {
        let row = match level {
            Level::Middle => &self.middle,
            Level::High => &self.high,
        };
        row[day as usize]
    }

    /// Largest daily period count across every level and day; sizes dense arrays.
    pub fn max_daily_hours(&self) -> u8 {
        self.middle
            .iter()
            .chain(self.high.iter())
            .copied()
            .max()
            .unwrap_or(0)
    }

    pub fn is_valid_cell(&self, level: Level, cell: Cell) -> bool {
        cell.day < 5 && cell.period < self.hours(level, cell.day)
    }

    pub fn validate(&self) -> Result<(), String> {
        for (row, name) in [(&self.middle, "middle"), (&self.high, "high")] {
            for (day, &h) in row.iter().enumerate() {
                if !(4..=16).contains(&h) {
                    return Err(format!(
                        "{name} school hours on day {day} must be in [4,16], got {h}"
                    ));
                }
            }
        }
        Ok(())
    }
}
