use super::LocationId;
use serde::{Deserialize, Serialize};

/// A shared physical resource (a lab, a gym, a workshop) that at most one
/// lesson may occupy per (day, period).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    #[serde(default)]
    pub capacity: Option<u32>,
}
