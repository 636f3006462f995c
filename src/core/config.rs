/// Engine tuning knobs, loadable from RON.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// Every field has a default, so a config file only names what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seeds the group's random source (offense rolls).
    pub seed: u64,
    /// How many nested replies a single line may trigger.
    pub max_reply_depth: usize,
    /// Candidate lines offered to a human delegate.
    pub option_count: usize,
    /// Said in place of a failed generation. `{name}` is the speaker.
    pub fallback_line: String,
    /// `None` waits on the generator forever.
    pub generation_timeout_ms: Option<u64>,
    /// Seat every roster actor in the group when a day starts.
    pub seat_full_roster: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            max_reply_depth: 1,
            option_count: 3,
            fallback_line: "[{name} would respond here, but AI is not configured]".to_string(),
            generation_timeout_ms: Some(30_000),
            seat_full_roster: true,
        }
    }
}

impl EngineConfig {
    pub fn load_from_ron(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(input)?)
    }

    pub fn fallback_for(&self, name: &str) -> String {
        self.fallback_line.replace("{name}", name)
    }

    pub fn generation_timeout(&self) -> Option<Duration> {
        self.generation_timeout_ms.map(Duration::from_millis)
    }
}
