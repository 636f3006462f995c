//! Day scripts: authored JSON turned into an ordered list of events.
//!
//! A script is either a flat array of entries or an array of chapters (arrays
//! of entries), flattened in order. Names are resolved through the roster.
//! Entries that reference unknown characters are skipped and recorded as
//! issues rather than failing the whole day.

use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use super::actor::ActorId;
use super::emotion::Emotion;
use super::event::{BulkGeneration, Event, EventKind, EventType, Target};
use super::roster::Roster;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("entry {index}: unknown event type '{value}'")]
    UnknownEventType { index: usize, value: String },
}

/// `to` may be absent, a single name, or a list of names.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(untagged)]
enum Recipients {
    #[default]
    None,
    One(String),
    Many(Vec<String>),
}

impl Recipients {
    fn names(&self) -> Vec<&str> {
        match self {
            Self::None => Vec::new(),
            Self::One(name) if name.trim().is_empty() => Vec::new(),
            Self::One(name) => vec![name.as_str()],
            Self::Many(names) => names.iter().map(String::as_str).filter(|n| !n.trim().is_empty()).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ScriptEntry {
    #[serde(default = "default_event_type")]
    event_type: String,
    #[serde(default)]
    character: Option<String>,
    #[serde(default)]
    to: Recipients,
    #[serde(default)]
    mood: Option<String>,
    #[serde(default)]
    text: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    bulk: Option<BulkGeneration>,
}

fn default_event_type() -> String {
    "dialogue".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScriptFile {
    Flat(Vec<ScriptEntry>),
    Chapters(Vec<Vec<ScriptEntry>>),
}

impl ScriptFile {
    fn into_entries(self) -> Vec<ScriptEntry> {
        match self {
            Self::Flat(entries) => entries,
            Self::Chapters(chapters) => chapters.into_iter().flatten().collect(),
        }
    }
}

/// A reference problem found while loading. The entry was skipped, or the
/// offending name dropped from its target list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptIssue {
    pub index: usize,
    pub message: String,
}

/// One loaded day.
#[derive(Debug, Clone)]
pub struct DayScript {
    pub id: String,
    pub events: Vec<Event>,
    pub issues: Vec<ScriptIssue>,
    moods: BTreeSet<String>,
}

impl DayScript {
    /// Load a script file; the day id is the file stem (`day-01`).
    pub fn load_from_json(path: &Path, roster: &Roster) -> Result<Self, ScriptError> {
        let contents = std::fs::read_to_string(path)?;
        let id = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::parse_json(&id, &contents, roster)
    }

    pub fn parse_json(id: &str, input: &str, roster: &Roster) -> Result<Self, ScriptError> {
        let file: ScriptFile = serde_json::from_str(input)?;
        let mut script = DayScript {
            id: id.to_string(),
            events: Vec::new(),
            issues: Vec::new(),
            moods: BTreeSet::new(),
        };

        for (index, entry) in file.into_entries().into_iter().enumerate() {
            let event_type =
                EventType::parse(&entry.event_type).ok_or_else(|| ScriptError::UnknownEventType {
                    index,
                    value: entry.event_type.clone(),
                })?;
            if let Some(mood) = &entry.mood {
                script.moods.insert(mood.clone());
            }
            if let Some(kind) = script.convert(index, event_type, entry, roster) {
                script.events.push(Event::new(kind));
            }
        }

        Ok(script)
    }

    /// Unique mood strings as authored, before resolution.
    pub fn moods(&self) -> impl Iterator<Item = &str> {
        self.moods.iter().map(String::as_str)
    }

    fn issue(&mut self, index: usize, message: String) {
        warn!(day = %self.id, index, %message, "script.reference");
        self.issues.push(ScriptIssue { index, message });
    }

    fn speaker(&mut self, index: usize, entry: &ScriptEntry, roster: &Roster) -> Option<ActorId> {
        let Some(name) = entry.character.as_deref().filter(|n| !n.trim().is_empty()) else {
            self.issue(index, format!("{} entry has no character", entry.event_type));
            return None;
        };
        let resolved = roster.resolve(name);
        if resolved.is_none() {
            self.issue(index, format!("unknown character '{}'", name));
        }
        resolved
    }

    fn targets(&mut self, index: usize, entry: &ScriptEntry, roster: &Roster) -> Vec<ActorId> {
        let mut ids = Vec::new();
        for name in entry.to.names() {
            match roster.resolve(name) {
                Some(id) => ids.push(id),
                None => self.issue(index, format!("unknown target '{}'", name)),
            }
        }
        ids
    }

    fn convert(
        &mut self,
        index: usize,
        event_type: EventType,
        entry: ScriptEntry,
        roster: &Roster,
    ) -> Option<EventKind> {
        let kind = match event_type {
            EventType::DayStart => EventKind::DayStart,
            EventType::DayEnd => EventKind::DayEnd,
            EventType::Dialogue => {
                let actor = self.speaker(index, &entry, roster)?;
                let target = Target::from_list(self.targets(index, &entry, roster));
                let emotion = Emotion::parse(entry.mood.as_deref().unwrap_or("neutral"));
                EventKind::Dialogue {
                    actor,
                    target,
                    text: entry.text,
                    emotion: Some(emotion),
                }
            }
            EventType::Enter => EventKind::Enter {
                actor: self.speaker(index, &entry, roster)?,
            },
            EventType::Leave => EventKind::Leave {
                actor: self.speaker(index, &entry, roster)?,
            },
            EventType::Offended => {
                let actor = self.speaker(index, &entry, roster)?;
                let Some(target) = self.targets(index, &entry, roster).into_iter().next() else {
                    self.issue(index, "offended entry has no resolvable target".to_string());
                    return None;
                };
                EventKind::Offended { actor, target }
            }
            EventType::EnvironmentChange => {
                let actor = match entry.character.as_deref() {
                    Some(name) if !name.trim().is_empty() => Some(self.speaker(index, &entry, roster)?),
                    _ => None,
                };
                EventKind::EnvironmentChange {
                    actor,
                    description: entry.description.unwrap_or(entry.text),
                }
            }
            EventType::AssumeAutomatedControl => {
                // A named character that fails to resolve must not widen
                // into bulk mode over the whole group.
                let actor = match entry.character.as_deref() {
                    Some(name) if !name.trim().is_empty() => Some(self.speaker(index, &entry, roster)?),
                    _ => None,
                };
                EventKind::AssumeAutomatedControl {
                    actor,
                    bulk: entry.bulk,
                }
            }
            EventType::AssumeHumanControl => EventKind::AssumeHumanControl {
                actor: self.speaker(index, &entry, roster)?,
            },
            EventType::ReturnToScript => EventKind::ReturnToScript {
                actor: self.speaker(index, &entry, roster)?,
            },
        };
        Some(kind)
    }
}

/// Every `*.json` file in `dir`, sorted by file name.
pub fn discover_days(dir: &Path) -> Result<Vec<PathBuf>, ScriptError> {
    let mut days = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            days.push(path);
        }
    }
    days.sort();
    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::actor::Traits;
    use crate::schema::roster::ActorDef;

    fn roster() -> Roster {
        Roster::new(vec![
            ActorDef::new("Theseus", Traits::new(80, 70, 75)),
            ActorDef::new("IsoldA", Traits::new(60, 75, 65)),
            ActorDef::new("Nutscracker", Traits::new(70, 90, 55)),
        ])
        .with_alias("Isolda", "IsoldA")
        .with_alias("Nut$cracker", "Nutscracker")
    }

    #[test]
    fn flat_script_defaults_to_dialogue() {
        let json = r#"[
            {"character": "Theseus", "to": "Isolda", "mood": "Hopeful", "text": "Morning."},
            {"event_type": "enter", "character": "Nut$cracker"}
        ]"#;
        let day = DayScript::parse_json("day-01", json, &roster()).unwrap();
        assert_eq!(day.events.len(), 2);
        match &day.events[0].kind {
            EventKind::Dialogue {
                actor,
                target,
                text,
                emotion,
            } => {
                assert_eq!(actor.as_str(), "Theseus");
                assert_eq!(*target, Target::One(ActorId::from("IsoldA")));
                assert_eq!(text, "Morning.");
                assert_eq!(*emotion, Some(Emotion::Hopeful));
            }
            other => panic!("expected dialogue, got {:?}", other),
        }
        assert_eq!(day.events[1].kind, EventKind::Enter { actor: ActorId::from("Nutscracker") });
    }

    #[test]
    fn chapters_are_flattened_in_order() {
        let json = r#"[
            [{"event_type": "day_start"}, {"character": "Theseus", "text": "One"}],
            [{"character": "IsoldA", "text": "Two"}, {"event_type": "day_end"}]
        ]"#;
        let day = DayScript::parse_json("day-02", json, &roster()).unwrap();
        let types: Vec<EventType> = day.events.iter().map(Event::event_type).collect();
        assert_eq!(
            types,
            vec![EventType::DayStart, EventType::Dialogue, EventType::Dialogue, EventType::DayEnd]
        );
    }

    #[test]
    fn unknown_speaker_is_skipped_and_unknown_target_dropped() {
        let json = r#"[
            {"character": "Minotaur", "text": "Roar"},
            {"character": "Theseus", "to": ["IsoldA", "Minotaur"], "text": "Run"}
        ]"#;
        let day = DayScript::parse_json("day-01", json, &roster()).unwrap();
        assert_eq!(day.events.len(), 1);
        assert_eq!(day.issues.len(), 2);
        match &day.events[0].kind {
            EventKind::Dialogue { target, .. } => assert_eq!(*target, Target::One(ActorId::from("IsoldA"))),
            other => panic!("expected dialogue, got {:?}", other),
        }
    }

    #[test]
    fn unknown_event_type_is_an_error() {
        let json = r#"[{"event_type": "dance", "character": "Theseus"}]"#;
        let err = DayScript::parse_json("day-01", json, &roster()).unwrap_err();
        assert!(matches!(err, ScriptError::UnknownEventType { index: 0, .. }));
    }

    #[test]
    fn legacy_control_names_and_bulk_payload() {
        let json = r#"[
            {"event_type": "ai_assume_control", "bulk": {"batch": "d1-party", "directions": ["gossip"]}},
            {"event_type": "user_assume_control", "character": "Theseus"},
            {"event_type": "ai_assume_control", "character": "Minotaur"}
        ]"#;
        let day = DayScript::parse_json("day-01", json, &roster()).unwrap();
        assert_eq!(day.events.len(), 2);
        match &day.events[0].kind {
            EventKind::AssumeAutomatedControl { actor: None, bulk: Some(bulk) } => {
                assert_eq!(bulk.batch, "d1-party");
                assert_eq!(bulk.directions, vec!["gossip".to_string()]);
            }
            other => panic!("expected bulk control, got {:?}", other),
        }
        assert_eq!(day.events[1].event_type(), EventType::AssumeHumanControl);
    }

    #[test]
    fn moods_are_reported_as_authored() {
        let json = r#"[
            {"character": "Theseus", "mood": "angry", "text": "a"},
            {"character": "IsoldA", "mood": "grumpy", "text": "b"},
            {"character": "IsoldA", "mood": "angry", "text": "c"}
        ]"#;
        let day = DayScript::parse_json("day-01", json, &roster()).unwrap();
        let moods: Vec<&str> = day.moods().collect();
        assert_eq!(moods, vec!["angry", "grumpy"]);
        match &day.events[1].kind {
            EventKind::Dialogue { emotion, .. } => assert_eq!(*emotion, Some(Emotion::Neutral)),
            other => panic!("expected dialogue, got {:?}", other),
        }
    }

    #[test]
    fn environment_change_uses_description_or_text() {
        let json = r#"[
            {"event_type": "environment_change", "description": "The lights flicker."},
            {"event_type": "environment_change", "text": "Rain."}
        ]"#;
        let day = DayScript::parse_json("day-01", json, &roster()).unwrap();
        assert_eq!(
            day.events[0].kind,
            EventKind::EnvironmentChange {
                actor: None,
                description: "The lights flicker.".to_string()
            }
        );
        assert_eq!(
            day.events[1].kind,
            EventKind::EnvironmentChange {
                actor: None,
                description: "Rain.".to_string()
            }
        );
    }
}
