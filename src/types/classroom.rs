use super::{ClassroomId, Level, TeacherId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClassGroup {
    General,
    Tm,
    Fen,
    Sos,
    Dil,
    None,
}

impl Default for ClassGroup {
    fn default() -> Self {
        ClassGroup::None
    }
}

/// A classroom (a cohort of students following the same weekly program, not
/// a physical room — physical rooms are modeled by `Location`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classroom {
    pub id: ClassroomId,
    pub name: String,
    pub level: Level,
    #[serde(default)]
    pub group: ClassGroup,
    #[serde(default)]
    pub homeroom_teacher: Option<TeacherId>,
}
