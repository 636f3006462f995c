//! Cast definitions — who exists, their traits, and the names scripts may
//! use for them.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

use super::actor::{Actor, ActorId, AddressRule, Traits};

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("actor defined twice: {0}")]
    DuplicateActor(String),
    #[error("alias '{alias}' points at unknown actor '{target}'")]
    DanglingAlias { alias: String, target: String },
}

/// One authored character.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorDef {
    pub name: String,
    #[serde(default)]
    pub traits: Traits,
    #[serde(default)]
    pub friends: Vec<String>,
    #[serde(default)]
    pub enemies: Vec<String>,
    #[serde(default)]
    pub address_rules: Vec<AddressRule>,
}

impl ActorDef {
    pub fn new(name: impl Into<String>, traits: Traits) -> Self {
        Self {
            name: name.into(),
            traits,
            friends: Vec::new(),
            enemies: Vec::new(),
            address_rules: Vec::new(),
        }
    }
}

/// The full cast plus alternative spellings of their names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    pub actors: Vec<ActorDef>,
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

impl Roster {
    pub fn new(actors: Vec<ActorDef>) -> Self {
        Self {
            actors,
            aliases: HashMap::new(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>, canonical: impl Into<String>) -> Self {
        self.aliases.insert(alias.into(), canonical.into());
        self
    }

    /// Load a roster from a RON file and validate it.
    pub fn load_from_ron(path: &Path) -> Result<Self, RosterError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<Self, RosterError> {
        let roster: Roster = ron::from_str(input)?;
        roster.validate()?;
        Ok(roster)
    }

    pub fn validate(&self) -> Result<(), RosterError> {
        let mut seen = FxHashSet::default();
        for def in &self.actors {
            if !seen.insert(def.name.as_str()) {
                return Err(RosterError::DuplicateActor(def.name.clone()));
            }
        }
        for (alias, target) in &self.aliases {
            if !seen.contains(target.as_str()) {
                return Err(RosterError::DanglingAlias {
                    alias: alias.clone(),
                    target: target.clone(),
                });
            }
        }
        Ok(())
    }

    /// Canonical id for a name or alias; `None` when nobody answers to it.
    pub fn resolve(&self, name: &str) -> Option<ActorId> {
        let name = name.trim();
        if self.actors.iter().any(|def| def.name == name) {
            return Some(ActorId::new(name));
        }
        self.aliases.get(name).map(|canonical| ActorId::new(canonical.as_str()))
    }

    pub fn ids(&self) -> Vec<ActorId> {
        self.actors.iter().map(|def| ActorId::new(def.name.as_str())).collect()
    }

    /// Instantiate every actor, in roster order, with relationships resolved.
    pub fn build_cast(&self) -> Vec<Actor> {
        self.actors
            .iter()
            .map(|def| {
                let mut actor = Actor::new(def.name.as_str(), def.traits);
                actor.address_rules = def.address_rules.clone();
                for name in &def.friends {
                    match self.resolve(name) {
                        Some(id) => actor.befriend(&id),
                        None => warn!(actor = %def.name, friend = %name, "roster.friend.unknown"),
                    }
                }
                for name in &def.enemies {
                    match self.resolve(name) {
                        Some(id) => actor.make_enemy(&id),
                        None => warn!(actor = %def.name, enemy = %name, "roster.enemy.unknown"),
                    }
                }
                actor
            })
            .collect()
    }
}
