/// Playback: days of events applied to one group, with undo by replay.
///
/// Built via `Playback::builder()`. Each day starts from a clean room with
/// actors as they were when the day was first entered; stepping back
/// rebuilds that state and replays up to the previous event.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::core::batch::BatchStore;
use crate::core::chooser::Chooser;
use crate::core::config::{ConfigError, EngineConfig};
use crate::core::generator::Generator;
use crate::core::group::{Group, GroupStatus};
use crate::core::markov::MarkovError;
use crate::schema::actor::Actor;
use crate::schema::roster::{Roster, RosterError};
use crate::schema::script::{discover_days, DayScript, ScriptError};

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("roster error: {0}")]
    Roster(#[from] RosterError),
    #[error("script error: {0}")]
    Script(#[from] ScriptError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("markov error: {0}")]
    Markov(#[from] MarkovError),
    #[error("no roster given")]
    MissingRoster,
    #[error("no days to play")]
    NoDays,
    #[error("unknown day: {0}")]
    UnknownDay(String),
    #[error("invalid day range: {0}")]
    BadRange(String),
}

/// Fresh random source for the day at the given index.
pub type RngFactory = Box<dyn Fn(usize) -> Box<dyn RngCore>>;

pub struct Playback {
    roster: Roster,
    group: Group,
    days: Vec<DayScript>,
    day_index: usize,
    cursor: usize,
    /// Actor state when each day was first entered.
    day_starts: Vec<Option<Vec<Actor>>>,
    rng_factory: RngFactory,
}

pub struct PlaybackBuilder {
    roster_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
    days_dir: Option<PathBuf>,
    day_files: Vec<PathBuf>,
    roster: Option<Roster>,
    config: Option<EngineConfig>,
    days: Vec<DayScript>,
    generator: Option<Arc<dyn Generator>>,
    chooser: Option<Box<dyn Chooser>>,
    batch_store: Option<Box<dyn BatchStore>>,
    rng_factory: Option<RngFactory>,
}

impl Playback {
    pub fn builder() -> PlaybackBuilder {
        PlaybackBuilder {
            roster_path: None,
            config_path: None,
            days_dir: None,
            day_files: Vec::new(),
            roster: None,
            config: None,
            days: Vec::new(),
            generator: None,
            chooser: None,
            batch_store: None,
            rng_factory: None,
        }
    }

    pub fn group(&self) -> &Group {
        &self.group
    }

    pub fn group_mut(&mut self) -> &mut Group {
        &mut self.group
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn day(&self) -> &DayScript {
        &self.days[self.day_index]
    }

    pub fn day_index(&self) -> usize {
        self.day_index
    }

    pub fn day_ids(&self) -> Vec<&str> {
        self.days.iter().map(|d| d.id.as_str()).collect()
    }

    /// Events applied so far in the current day.
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn is_day_finished(&self) -> bool {
        self.cursor >= self.day().events.len()
    }

    pub fn status(&self) -> GroupStatus {
        self.group.status()
    }

    /// Switch to the day at `index` and rewind it to its start.
    pub fn load_day(&mut self, index: usize) -> Result<(), PlaybackError> {
        let Some(day) = self.days.get(index) else {
            return Err(PlaybackError::UnknownDay(index.to_string()));
        };
        info!(day = %day.id, events = day.events.len(), "playback.load_day");
        self.day_index = index;
        self.group.set_current_day(day.id.clone());
        if self.day_starts[index].is_none() {
            self.day_starts[index] = Some(self.group.cast_snapshot());
        }
        self.rewind();
        Ok(())
    }

    pub fn load_day_by_id(&mut self, id: &str) -> Result<(), PlaybackError> {
        let index = self
            .days
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| PlaybackError::UnknownDay(id.to_string()))?;
        self.load_day(index)
    }

    /// Apply the next event. `None` once the day is over.
    pub fn step(&mut self) -> Option<Vec<String>> {
        let event = self.days[self.day_index].events.get(self.cursor)?;
        let lines = event.apply(&mut self.group);
        self.cursor += 1;
        Some(lines)
    }

    /// Undo the last event by replaying the day up to just before it.
    /// Returns `false` at the start of the day.
    pub fn step_back(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let target = self.cursor - 1;
        self.rewind();
        for event in &self.days[self.day_index].events[..target] {
            event.apply(&mut self.group);
        }
        self.cursor = target;
        true
    }

    /// Apply every remaining event of the day.
    pub fn run_to_end(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(step) = self.step() {
            lines.extend(step);
        }
        lines
    }

    pub fn next_day(&mut self) -> Result<bool, PlaybackError> {
        if self.day_index + 1 >= self.days.len() {
            return Ok(false);
        }
        self.load_day(self.day_index + 1)?;
        Ok(true)
    }

    pub fn prev_day(&mut self) -> Result<bool, PlaybackError> {
        if self.day_index == 0 {
            return Ok(false);
        }
        self.load_day(self.day_index - 1)?;
        Ok(true)
    }

    fn rewind(&mut self) {
        if let Some(cast) = &self.day_starts[self.day_index] {
            for actor in cast {
                self.group.insert_actor(actor.clone());
            }
        }
        self.group.reset_day();
        self.group.set_rng((self.rng_factory)(self.day_index));
        if self.group.config().seat_full_roster {
            for id in self.roster.ids() {
                self.group.add(&id);
            }
        }
        self.cursor = 0;
    }
}

impl PlaybackBuilder {
    pub fn roster(mut self, path: impl Into<PathBuf>) -> Self {
        self.roster_path = Some(path.into());
        self
    }

    pub fn config(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Play every `*.json` script in `dir`, in file name order.
    pub fn days_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.days_dir = Some(dir.into());
        self
    }

    pub fn day_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.day_files.push(path.into());
        self
    }

    /// Provide a roster directly (for testing without files).
    pub fn with_roster(mut self, roster: Roster) -> Self {
        self.roster = Some(roster);
        self
    }

    /// Provide a config directly (for testing without files).
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Provide an already loaded day (for testing without files).
    pub fn with_day(mut self, day: DayScript) -> Self {
        self.days.push(day);
        self
    }

    pub fn with_generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_chooser(mut self, chooser: Box<dyn Chooser>) -> Self {
        self.chooser = Some(chooser);
        self
    }

    pub fn with_batch_store(mut self, store: Box<dyn BatchStore>) -> Self {
        self.batch_store = Some(store);
        self
    }

    /// Replace the default seeded `StdRng` per day.
    pub fn with_rng_factory(mut self, factory: impl Fn(usize) -> Box<dyn RngCore> + 'static) -> Self {
        self.rng_factory = Some(Box::new(factory));
        self
    }

    pub fn build(self) -> Result<Playback, PlaybackError> {
        let config = match (self.config, &self.config_path) {
            (Some(config), _) => config,
            (None, Some(path)) => EngineConfig::load_from_ron(path)?,
            (None, None) => EngineConfig::default(),
        };

        let roster = match (self.roster, &self.roster_path) {
            (Some(roster), _) => roster,
            (None, Some(path)) => Roster::load_from_ron(path)?,
            (None, None) => return Err(PlaybackError::MissingRoster),
        };

        let mut days = self.days;
        if let Some(dir) = &self.days_dir {
            for path in discover_days(dir)? {
                days.push(DayScript::load_from_json(&path, &roster)?);
            }
        }
        for path in &self.day_files {
            days.push(DayScript::load_from_json(path, &roster)?);
        }
        if days.is_empty() {
            return Err(PlaybackError::NoDays);
        }

        let seed = config.seed;
        let rng_factory: RngFactory = match self.rng_factory {
            Some(factory) => factory,
            None => Box::new(move |day: usize| -> Box<dyn RngCore> {
                Box::new(StdRng::seed_from_u64(seed.wrapping_add(day as u64)))
            }),
        };

        let mut group = Group::new(roster.build_cast(), config);
        if let Some(generator) = self.generator {
            group.set_generator(generator);
        }
        if let Some(chooser) = self.chooser {
            group = group.with_chooser(chooser);
        }
        if let Some(store) = self.batch_store {
            group = group.with_batch_store(store);
        }

        let mut playback = Playback {
            roster,
            group,
            day_starts: vec![None; days.len()],
            days,
            day_index: 0,
            cursor: 0,
            rng_factory,
        };
        playback.load_day(0)?;
        Ok(playback)
    }
}

/// Day numbers from `"03"` or an inclusive range `"01-03"`.
pub fn parse_day_range(arg: &str) -> Result<Vec<u32>, PlaybackError> {
    let bad = || PlaybackError::BadRange(arg.to_string());
    let parse = |s: &str| s.trim().parse::<u32>().map_err(|_| bad());
    match arg.split_once('-') {
        Some((start, end)) => {
            let (start, end) = (parse(start)?, parse(end)?);
            if start > end {
                return Err(bad());
            }
            Ok((start..=end).collect())
        }
        None => Ok(vec![parse(arg)?]),
    }
}

/// `day-NN.json` under `dir`.
pub fn day_file_name(dir: &std::path::Path, day: u32) -> PathBuf {
    dir.join(format!("day-{:02}.json", day))
}
