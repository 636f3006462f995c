//! Emotion taxonomy — the closed set of moods a line can carry.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// A named emotion a character can display or hold toward another.
///
/// Declaration order is significant: it is the tie-break order for the
/// group's dominant mood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Emotion {
    // Positive
    Compassionate,
    Excited,
    Flirty,
    Hopeful,
    Humorous,
    Proud,
    Respectful,
    Solemn,

    // Neutral
    Calm,
    Confused,
    Contemplative,
    Curious,
    Surprised,
    Resigned,

    // Negative
    Angry,
    Anxious,
    Down,
    Embarrassed,
    Fearful,
    Irritated,

    // Complex
    Defensive,
    Desperate,
    Dismissive,
    Jealous,
    Sarcastic,
    Skeptical,

    // General attitudes
    Friendly,
    Neutral,
    Hostile,
    Admiration,
    Fear,
}

/// The broad bucket an emotion falls into. Buckets drive tension and
/// relationship changes; individual emotions only matter for display and
/// for the "angry friend" offense rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Positive,
    Neutral,
    Negative,
    Complex,
    Unknown,
}

impl Category {
    /// Change applied to group tension when a line in this category is spoken.
    ///
    /// Positive lines relieve more tension than negative lines add.
    pub fn tension_delta(&self) -> f64 {
        match self {
            Self::Positive => -0.03,
            Self::Neutral => 0.0,
            Self::Negative => 0.02,
            Self::Complex => 0.01,
            Self::Unknown => 0.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
            Self::Complex => "complex",
            Self::Unknown => "unknown",
        }
    }
}

impl Emotion {
    /// Every emotion, in declaration order.
    pub const ALL: [Emotion; 31] = [
        Self::Compassionate,
        Self::Excited,
        Self::Flirty,
        Self::Hopeful,
        Self::Humorous,
        Self::Proud,
        Self::Respectful,
        Self::Solemn,
        Self::Calm,
        Self::Confused,
        Self::Contemplative,
        Self::Curious,
        Self::Surprised,
        Self::Resigned,
        Self::Angry,
        Self::Anxious,
        Self::Down,
        Self::Embarrassed,
        Self::Fearful,
        Self::Irritated,
        Self::Defensive,
        Self::Desperate,
        Self::Dismissive,
        Self::Jealous,
        Self::Sarcastic,
        Self::Skeptical,
        Self::Friendly,
        Self::Neutral,
        Self::Hostile,
        Self::Admiration,
        Self::Fear,
    ];

    /// Resolve a mood string, ignoring case and surrounding whitespace.
    /// Anything unrecognised is `Neutral`.
    pub fn parse(text: &str) -> Emotion {
        Self::lookup(text).unwrap_or(Self::Neutral)
    }

    /// Like [`Emotion::parse`] but reports a miss instead of defaulting.
    pub fn lookup(text: &str) -> Option<Emotion> {
        static BY_NAME: OnceLock<FxHashMap<&'static str, Emotion>> = OnceLock::new();
        let table = BY_NAME.get_or_init(|| Self::ALL.iter().map(|e| (e.as_str(), *e)).collect());
        table.get(text.trim().to_lowercase().as_str()).copied()
    }

    pub fn category(&self) -> Category {
        match self {
            Self::Compassionate
            | Self::Excited
            | Self::Flirty
            | Self::Hopeful
            | Self::Humorous
            | Self::Proud
            | Self::Respectful
            | Self::Solemn
            | Self::Friendly
            | Self::Admiration => Category::Positive,

            Self::Calm
            | Self::Confused
            | Self::Contemplative
            | Self::Curious
            | Self::Surprised
            | Self::Resigned
            | Self::Neutral => Category::Neutral,

            Self::Angry
            | Self::Anxious
            | Self::Down
            | Self::Embarrassed
            | Self::Fearful
            | Self::Irritated
            | Self::Hostile
            | Self::Fear => Category::Negative,

            Self::Defensive
            | Self::Desperate
            | Self::Dismissive
            | Self::Jealous
            | Self::Sarcastic
            | Self::Skeptical => Category::Complex,
        }
    }

    pub fn tension_delta(&self) -> f64 {
        self.category().tension_delta()
    }

    /// Lowercase label, as authored in day scripts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compassionate => "compassionate",
            Self::Excited => "excited",
            Self::Flirty => "flirty",
            Self::Hopeful => "hopeful",
            Self::Humorous => "humorous",
            Self::Proud => "proud",
            Self::Respectful => "respectful",
            Self::Solemn => "solemn",
            Self::Calm => "calm",
            Self::Confused => "confused",
            Self::Contemplative => "contemplative",
            Self::Curious => "curious",
            Self::Surprised => "surprised",
            Self::Resigned => "resigned",
            Self::Angry => "angry",
            Self::Anxious => "anxious",
            Self::Down => "down",
            Self::Embarrassed => "embarrassed",
            Self::Fearful => "fearful",
            Self::Irritated => "irritated",
            Self::Defensive => "defensive",
            Self::Desperate => "desperate",
            Self::Dismissive => "dismissive",
            Self::Jealous => "jealous",
            Self::Sarcastic => "sarcastic",
            Self::Skeptical => "skeptical",
            Self::Friendly => "friendly",
            Self::Neutral => "neutral",
            Self::Hostile => "hostile",
            Self::Admiration => "admiration",
            Self::Fear => "fear",
        }
    }
}

impl Default for Emotion {
    fn default() -> Self {
        Self::Neutral
    }
}

impl From<String> for Emotion {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<&str> for Emotion {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
