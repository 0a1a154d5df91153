use super::{Level, TeacherId};
use serde::{Deserialize, Serialize};

/// A teacher available for placement. `availability[day][period]` is `true`
/// when the teacher may be scheduled in that cell; it is sized to the
/// instance's `max_daily_hours` by the model compiler, not by the teacher
/// record itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Teacher {
    pub id: TeacherId,
    pub name: String,
    /// Branch/subject tags this teacher may be matched against.
    #[serde(default)]
    pub branches: Vec<String>,
    /// School levels this teacher is authorized to teach.
    #[serde(default)]
    pub levels: Vec<Level>,
    /// `availability[day]` is a bitmask over periods, bit `p` set means free.
    #[serde(default)]
    pub availability: Vec<u32>,
}

impl Teacher {
    pub fn is_available(&self, day: u8, period: u8) -> bool {
        self.availability
            .get(day as usize)
            .map(|mask| mask & (1 << period) != 0)
            .unwrap_or(false)
    }

    pub fn authorized_for(&self, level: Level) -> bool {
        self.levels.is_empty() || self.levels.contains(&level)
    }

    pub fn teaches_branch(&self, branch: &str) -> bool {
        self.branches.iter().any(|b| b == branch)
    }
}
