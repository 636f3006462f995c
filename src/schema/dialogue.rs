use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::actor::ActorId;
use super::emotion::Emotion;

/// One spoken line as it is remembered by the conversation log and by
/// delegate histories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueRecord {
    pub speaker: ActorId,
    pub text: String,
    pub emotion: Emotion,
    #[serde(default)]
    pub addressed_to: Option<ActorId>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl DialogueRecord {
    pub fn new(speaker: ActorId, text: impl Into<String>, emotion: Emotion, addressed_to: Option<ActorId>) -> Self {
        Self {
            speaker,
            text: text.into(),
            emotion,
            addressed_to,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_round_trip_keeps_addressee() {
        let record = DialogueRecord::new(
            ActorId::from("Theseus"),
            "Hold the thread.",
            Emotion::Solemn,
            Some(ActorId::from("Ariadne")),
        );
        let json = serde_json::to_string(&record).unwrap();
        let back: DialogueRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn missing_timestamp_defaults() {
        let back: DialogueRecord =
            serde_json::from_str(r#"{"speaker":"Sartrik","text":"Hm.","emotion":"skeptical"}"#).unwrap();
        assert_eq!(back.emotion, Emotion::Skeptical);
        assert!(back.addressed_to.is_none());
    }
}
