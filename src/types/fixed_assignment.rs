use super::{ClassroomId, SubjectId};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A mandated (classroom, subject, day, period) placement. `period = None`
/// means the whole day is pinned to this subject; on the wire this is
/// represented as the integer `-1`, matching how the source data encodes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedAssignment {
    pub classroom_id: ClassroomId,
    pub subject_id: SubjectId,
    pub day: u8,
    #[serde(
        deserialize_with = "deserialize_optional_period",
        serialize_with = "serialize_optional_period"
    )]
    pub period: Option<u8>,
}

pub fn deserialize_optional_period<'de, D>(d: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = i16::deserialize(d)?;
    Ok(if raw < 0 { None } else { Some(raw as u8) })
}

pub fn serialize_optional_period<S>(period: &Option<u8>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_i16(period.map(|p| p as i16).unwrap_or(-1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minus_one_round_trips_to_whole_day() {
        let json = r#"{"classroomId":"c1","subjectId":"s1","day":0,"period":-1}"#;
        let fa: FixedAssignment = serde_json::from_str(json).unwrap();
        assert_eq!(fa.period, None);
        let back = serde_json::to_string(&fa).unwrap();
        assert!(back.contains("-1"));
    }
}
