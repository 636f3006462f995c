use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::actor::ActorId;
use super::emotion::Emotion;

/// The kind of an event, without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    DayStart,
    DayEnd,
    Dialogue,
    Enter,
    Leave,
    Offended,
    EnvironmentChange,
    #[serde(alias = "ai_assume_control")]
    AssumeAutomatedControl,
    #[serde(alias = "user_assume_control")]
    AssumeHumanControl,
    ReturnToScript,
}

impl EventType {
    /// Parse a script's `event_type` value. Accepts the older
    /// `ai_assume_control` / `user_assume_control` spellings and dashes.
    pub fn parse(text: &str) -> Option<EventType> {
        let normalized = text.trim().to_lowercase().replace('-', "_");
        let parsed = match normalized.as_str() {
            "day_start" => Self::DayStart,
            "day_end" => Self::DayEnd,
            "dialogue" => Self::Dialogue,
            "enter" => Self::Enter,
            "leave" => Self::Leave,
            "offended" => Self::Offended,
            "environment_change" => Self::EnvironmentChange,
            "assume_automated_control" | "ai_assume_control" => Self::AssumeAutomatedControl,
            "assume_human_control" | "user_assume_control" => Self::AssumeHumanControl,
            "return_to_script" => Self::ReturnToScript,
            _ => return None,
        };
        Some(parsed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DayStart => "day_start",
            Self::DayEnd => "day_end",
            Self::Dialogue => "dialogue",
            Self::Enter => "enter",
            Self::Leave => "leave",
            Self::Offended => "offended",
            Self::EnvironmentChange => "environment_change",
            Self::AssumeAutomatedControl => "assume_automated_control",
            Self::AssumeHumanControl => "assume_human_control",
            Self::ReturnToScript => "return_to_script",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who a line is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Target {
    /// Spoken to the room.
    #[default]
    Nobody,
    One(ActorId),
    /// Applied once per recipient.
    Many(Vec<ActorId>),
}

impl Target {
    pub fn from_list(mut ids: Vec<ActorId>) -> Self {
        match ids.len() {
            0 => Self::Nobody,
            1 => Self::One(ids.remove(0)),
            _ => Self::Many(ids),
        }
    }

    /// Recipients in order; empty for `Nobody`.
    pub fn recipients(&self) -> Vec<&ActorId> {
        match self {
            Self::Nobody => Vec::new(),
            Self::One(id) => vec![id],
            Self::Many(ids) => ids.iter().collect(),
        }
    }
}

/// Settings for pre-generating a stretch of conversation under automated
/// control and replaying it later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkGeneration {
    /// Key the generated batch is stored under.
    pub batch: String,
    /// One generated line per direction, in order.
    #[serde(default)]
    pub directions: Vec<String>,
}

/// Event payloads, one variant per event kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    DayStart,
    DayEnd,
    Dialogue {
        actor: ActorId,
        target: Target,
        text: String,
        emotion: Option<Emotion>,
    },
    Enter {
        actor: ActorId,
    },
    Leave {
        actor: ActorId,
    },
    Offended {
        actor: ActorId,
        target: ActorId,
    },
    EnvironmentChange {
        actor: Option<ActorId>,
        description: String,
    },
    /// `actor: None` puts every current member under automated control.
    AssumeAutomatedControl {
        actor: Option<ActorId>,
        bulk: Option<BulkGeneration>,
    },
    AssumeHumanControl {
        actor: ActorId,
    },
    ReturnToScript {
        actor: ActorId,
    },
}

/// Something that happens during a day. Events are immutable; they are
/// applied to a group once and then discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
}

impl Event {
    pub fn new(kind: EventKind) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
        }
    }

    pub fn at(kind: EventKind, timestamp: DateTime<Utc>) -> Self {
        Self { timestamp, kind }
    }

    pub fn dialogue(
        actor: impl Into<ActorId>,
        target: Target,
        text: impl Into<String>,
        emotion: Option<Emotion>,
    ) -> Self {
        Self::new(EventKind::Dialogue {
            actor: actor.into(),
            target,
            text: text.into(),
            emotion,
        })
    }

    pub fn enter(actor: impl Into<ActorId>) -> Self {
        Self::new(EventKind::Enter { actor: actor.into() })
    }

    pub fn leave(actor: impl Into<ActorId>) -> Self {
        Self::new(EventKind::Leave { actor: actor.into() })
    }

    pub fn event_type(&self) -> EventType {
        match &self.kind {
            EventKind::DayStart => EventType::DayStart,
            EventKind::DayEnd => EventType::DayEnd,
            EventKind::Dialogue { .. } => EventType::Dialogue,
            EventKind::Enter { .. } => EventType::Enter,
            EventKind::Leave { .. } => EventType::Leave,
            EventKind::Offended { .. } => EventType::Offended,
            EventKind::EnvironmentChange { .. } => EventType::EnvironmentChange,
            EventKind::AssumeAutomatedControl { .. } => EventType::AssumeAutomatedControl,
            EventKind::AssumeHumanControl { .. } => EventType::AssumeHumanControl,
            EventKind::ReturnToScript { .. } => EventType::ReturnToScript,
        }
    }

    /// The acting character, if the event has one.
    pub fn actor(&self) -> Option<&ActorId> {
        match &self.kind {
            EventKind::DayStart | EventKind::DayEnd => None,
            EventKind::Dialogue { actor, .. }
            | EventKind::Enter { actor }
            | EventKind::Leave { actor }
            | EventKind::Offended { actor, .. }
            | EventKind::AssumeHumanControl { actor }
            | EventKind::ReturnToScript { actor } => Some(actor),
            EventKind::EnvironmentChange { actor, .. } | EventKind::AssumeAutomatedControl { actor, .. } => {
                actor.as_ref()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_from_list() {
        assert_eq!(Target::from_list(vec![]), Target::Nobody);
        assert_eq!(
            Target::from_list(vec![ActorId::from("IsoldA")]),
            Target::One(ActorId::from("IsoldA"))
        );
        let many = Target::from_list(vec![ActorId::from("IsoldA"), ActorId::from("Theseus")]);
        assert_eq!(many.recipients().len(), 2);
    }

    #[test]
    fn event_type_and_actor() {
        let e = Event::dialogue("Theseus", Target::Nobody, "Where is the thread?", Some(Emotion::Anxious));
        assert_eq!(e.event_type(), EventType::Dialogue);
        assert_eq!(e.actor().map(ActorId::as_str), Some("Theseus"));

        let start = Event::new(EventKind::DayStart);
        assert_eq!(start.event_type(), EventType::DayStart);
        assert!(start.actor().is_none());

        let bulk = Event::new(EventKind::AssumeAutomatedControl { actor: None, bulk: None });
        assert!(bulk.actor().is_none());
    }

    #[test]
    fn legacy_event_type_names_deserialize() {
        let t: EventType = serde_json::from_str("\"ai_assume_control\"").unwrap();
        assert_eq!(t, EventType::AssumeAutomatedControl);
        let t: EventType = serde_json::from_str("\"user_assume_control\"").unwrap();
        assert_eq!(t, EventType::AssumeHumanControl);
        let t: EventType = serde_json::from_str("\"return_to_script\"").unwrap();
        assert_eq!(t, EventType::ReturnToScript);
    }

    #[test]
    fn parse_event_type_names() {
        assert_eq!(EventType::parse("Dialogue"), Some(EventType::Dialogue));
        assert_eq!(EventType::parse("environment-change"), Some(EventType::EnvironmentChange));
        assert_eq!(EventType::parse("AI_ASSUME_CONTROL"), Some(EventType::AssumeAutomatedControl));
        assert_eq!(EventType::parse("dance"), None);
        for t in [EventType::DayStart, EventType::Offended, EventType::ReturnToScript] {
            assert_eq!(EventType::parse(t.as_str()), Some(t));
        }
    }
}
