use super::{ClassroomId, LocationId, SubjectId, TeacherId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const DEFAULT_MAX_CONSEC: u8 = 3;

/// A subject required for one or more classrooms each week.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub weekly_hours: u8,
    #[serde(default)]
    pub block_hours: u8,
    #[serde(default)]
    pub triple_block_hours: u8,
    #[serde(default)]
    pub max_consec: Option<u8>,
    pub assigned_class_ids: Vec<ClassroomId>,
    #[serde(default)]
    pub location_id: Option<LocationId>,
    #[serde(default)]
    pub pinned_teacher_by_classroom: HashMap<ClassroomId, TeacherId>,
    #[serde(default = "default_required_teacher_count")]
    pub required_teacher_count: u8,
}

fn default_required_teacher_count() -> u8 {
    1
}

impl Subject {
    pub fn max_consec_or_default(&self) -> u8 {
        self.max_consec.unwrap_or(DEFAULT_MAX_CONSEC)
    }

    pub fn singleton_hours(&self) -> u8 {
        self.weekly_hours
            .saturating_sub(self.block_hours)
            .saturating_sub(self.triple_block_hours)
    }

    /// Structural check only; does not know about eligibility or the grid.
    pub fn validate(&self) -> Result<(), String> {
        if self.block_hours % 2 != 0 {
            return Err(format!(
                "subject '{}': block_hours must be even, got {}",
                self.id, self.block_hours
            ));
        }
        if self.triple_block_hours % 3 != 0 {
            return Err(format!(
                "subject '{}': triple_block_hours must be a multiple of 3, got {}",
                self.id, self.triple_block_hours
            ));
        }
        if self.block_hours + self.triple_block_hours > self.weekly_hours {
            return Err(format!(
                "subject '{}': block_hours ({}) + triple_block_hours ({}) exceeds weekly_hours ({})",
                self.id, self.block_hours, self.triple_block_hours, self.weekly_hours
            ));
        }
        if self.required_teacher_count == 0 {
            return Err(format!(
                "subject '{}': required_teacher_count must be at least 1",
                self.id
            ));
        }
        Ok(())
    }
}
