/// Display text for applied events and group status.

use crate::schema::actor::ActorId;
use crate::schema::emotion::Emotion;

pub const DAYTIME: &str = "It is now daytime.";
pub const NIGHTTIME: &str = "It is now nighttime.";

/// `Name [to A, B, emotion]: text`, or `Name [emotion]: text` when spoken
/// to the room.
pub fn dialogue_line(speaker: &ActorId, recipients: &[&ActorId], emotion: Emotion, text: &str) -> String {
    if recipients.is_empty() {
        format!("{} [{}]: {}", speaker, emotion, text)
    } else {
        let names: Vec<&str> = recipients.iter().map(|id| id.as_str()).collect();
        format!("{} [to {}, {}]: {}", speaker, names.join(", "), emotion, text)
    }
}

pub fn entered(actor: &ActorId) -> String {
    format!("{} has entered the chatroom.", actor)
}

pub fn left(actor: &ActorId) -> String {
    format!("{} has left the chatroom.", actor)
}

pub fn offended(actor: &ActorId, by: &ActorId) -> String {
    format!("{} is offended by {}!", actor, by)
}

pub fn environment_change(description: &str) -> String {
    format!("Environment change: {}", description)
}

/// Bucketed wording for a tension level.
pub fn describe_tension(tension: f64) -> &'static str {
    if tension < 0.02 {
        "relaxed"
    } else if tension < 0.04 {
        "slightly tense"
    } else if tension < 0.06 {
        "moderately tense"
    } else if tension < 0.08 {
        "very tense"
    } else {
        "extremely tense"
    }
}
