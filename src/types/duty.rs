use super::TeacherId;
use serde::{Deserialize, Serialize};

use super::fixed_assignment::{deserialize_optional_period, serialize_optional_period};

/// A non-teaching obligation that blocks a teacher from lesson placement.
/// `period = None` (wire `-1`) blocks the entire day.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Duty {
    pub teacher_id: TeacherId,
    pub day: u8,
    #[serde(
        deserialize_with = "deserialize_optional_period",
        serialize_with = "serialize_optional_period"
    )]
    pub period: Option<u8>,
    #[serde(default)]
    pub label: String,
}

impl Duty {
    pub fn blocks(&self, day: u8, period: u8) -> bool {
        self.day == day && self.period.map(|p| p == period).unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_day_duty_blocks_every_period() {
        let d = Duty {
            teacher_id: TeacherId::from("t1"),
            day: 0,
            period: None,
            label: "hall duty".into(),
        };
        assert!(d.blocks(0, 0));
        assert!(d.blocks(0, 7));
        assert!(!d.blocks(1, 0));
    }
}
