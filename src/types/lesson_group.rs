use super::{ClassroomId, LessonGroupId, SubjectId};
use serde::{Deserialize, Serialize};

/// A subject taught synchronously to several classrooms at once (e.g. a
/// cross-class elective). All member classrooms share one placement
/// decision in the compiled model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonGroup {
    pub id: LessonGroupId,
    pub subject_id: SubjectId,
    pub classroom_ids: Vec<ClassroomId>,
    pub weekly_hours: u8,
    #[serde(default)]
    pub is_block: bool,
}
