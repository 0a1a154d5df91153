use super::{ClassroomId, LocationId, SubjectId, TeacherId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One occupied cell. A k-block shares the same `block_id` across its
/// consecutive periods so the improver can move the block as a unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub subject_id: SubjectId,
    pub teacher_ids: Vec<TeacherId>,
    #[serde(default)]
    pub location_id: Option<LocationId>,
    pub block_id: u32,
    pub block_span: u8,
}

/// The full weekly schedule: `cells[classroom][day][period]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schedule {
    pub cells: HashMap<ClassroomId, Vec<Vec<Option<Assignment>>>>,
}

impl Schedule {
    pub fn get(&self, classroom: &ClassroomId, day: u8, period: u8) -> Option<&Assignment> {
        self.cells
            .get(classroom)
            .and_then(|days| days.get(day as usize))
            .and_then(|periods| periods.get(period as usize))
            .and_then(|cell| cell.as_ref())
    }

    pub fn total_occupied_cells(&self) -> usize {
        self.cells
            .values()
            .flat_map(|days| days.iter())
            .flat_map(|periods| periods.iter())
            .filter(|c| c.is_some())
            .count()
    }
}
