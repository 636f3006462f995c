//! The room: who is present, how they feel about each other, and how tense
//! things are.
//!
//! `Group` is the only mutable state in a playthrough. Events reach it
//! through [`Event::apply`](crate::schema::event::Event::apply); the methods
//! here are the primitives those events are built from.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::core::batch::{BatchStore, MemoryBatchStore};
use crate::core::chooser::{Chooser, ScriptedChooser};
use crate::core::config::EngineConfig;
use crate::core::delegate::{AutomatedDelegate, HumanDelegate};
use crate::core::generator::{Generator, TimeoutGenerator, UnavailableGenerator};
use crate::core::transcript;
use crate::schema::actor::{Actor, ActorId};
use crate::schema::dialogue::DialogueRecord;
use crate::schema::emotion::{Category, Emotion};
use crate::schema::event::BulkGeneration;
use crate::schema::relationship::AttitudeMatrix;

/// Extra tension when an addressee takes offense.
pub const OFFENSE_TENSION: f64 = 0.015;

pub struct Group {
    /// Every known actor, present or not.
    cast: FxHashMap<ActorId, Actor>,
    members: Vec<ActorId>,
    attitudes: AttitudeMatrix,
    tension: f64,
    mood: BTreeMap<Emotion, f64>,
    automated: FxHashMap<ActorId, AutomatedDelegate>,
    human: FxHashMap<ActorId, HumanDelegate>,
    conversation_log: FxHashMap<String, Vec<DialogueRecord>>,
    current_day: String,
    generator: Arc<dyn Generator>,
    chooser: Box<dyn Chooser>,
    batches: Box<dyn BatchStore>,
    rng: Box<dyn RngCore>,
    config: EngineConfig,
    transcript: Vec<String>,
}

impl Group {
    /// A group that knows `cast` but has nobody seated yet. Generation is
    /// unavailable and human choices skip until collaborators are supplied.
    pub fn new(cast: impl IntoIterator<Item = Actor>, config: EngineConfig) -> Self {
        let mut group = Self {
            cast: FxHashMap::default(),
            members: Vec::new(),
            attitudes: AttitudeMatrix::new(),
            tension: 0.0,
            mood: BTreeMap::new(),
            automated: FxHashMap::default(),
            human: FxHashMap::default(),
            conversation_log: FxHashMap::default(),
            current_day: String::new(),
            generator: Arc::new(UnavailableGenerator),
            chooser: Box::new(ScriptedChooser::default()),
            batches: Box::new(MemoryBatchStore::new()),
            rng: Box::new(StdRng::seed_from_u64(config.seed)),
            config,
            transcript: Vec::new(),
        };
        for actor in cast {
            group.insert_actor(actor);
        }
        group.set_current_day("default");
        group
    }

    /// Wrapped in a timeout when the config asks for one.
    pub fn with_generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.set_generator(generator);
        self
    }

    pub fn with_chooser(mut self, chooser: Box<dyn Chooser>) -> Self {
        self.chooser = chooser;
        self
    }

    pub fn with_batch_store(mut self, batches: Box<dyn BatchStore>) -> Self {
        self.batches = batches;
        self
    }

    pub fn with_rng(mut self, rng: Box<dyn RngCore>) -> Self {
        self.rng = rng;
        self
    }

    pub fn set_generator(&mut self, generator: Arc<dyn Generator>) {
        self.generator = match self.config.generation_timeout() {
            Some(timeout) => Arc::new(TimeoutGenerator::new(generator, timeout)),
            None => generator,
        };
    }

    pub fn set_rng(&mut self, rng: Box<dyn RngCore>) {
        self.rng = rng;
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Register or replace an actor. Membership is unaffected.
    pub fn insert_actor(&mut self, actor: Actor) {
        self.cast.insert(actor.id.clone(), actor);
    }

    pub fn actor(&self, id: &ActorId) -> Option<&Actor> {
        self.cast.get(id)
    }

    pub fn actor_mut(&mut self, id: &ActorId) -> Option<&mut Actor> {
        self.cast.get_mut(id)
    }

    pub fn knows(&self, id: &ActorId) -> bool {
        self.cast.contains_key(id)
    }

    /// Every registered actor, sorted by name.
    pub fn cast_snapshot(&self) -> Vec<Actor> {
        let mut cast: Vec<Actor> = self.cast.values().cloned().collect();
        cast.sort_by(|a, b| a.id.cmp(&b.id));
        cast
    }

    pub fn members(&self) -> &[ActorId] {
        &self.members
    }

    pub fn is_member(&self, id: &ActorId) -> bool {
        self.members.contains(id)
    }

    pub fn attitude(&self, subject: &ActorId, object: &ActorId) -> Option<Emotion> {
        self.attitudes.get(subject, object)
    }

    pub fn attitudes(&self) -> &AttitudeMatrix {
        &self.attitudes
    }

    pub fn tension(&self) -> f64 {
        self.tension
    }

    pub fn tension_description(&self) -> &'static str {
        transcript::describe_tension(self.tension)
    }

    /// Share of each emotion across attitudes and members' current emotions.
    pub fn mood_shares(&self) -> &BTreeMap<Emotion, f64> {
        &self.mood
    }

    /// The most common emotion. Ties go to the emotion declared first;
    /// an empty room is `Neutral`.
    pub fn dominant_mood(&self) -> Emotion {
        let mut best: Option<(Emotion, f64)> = None;
        for (emotion, share) in &self.mood {
            if best.map_or(true, |(_, top)| *share > top) {
                best = Some((*emotion, *share));
            }
        }
        best.map(|(emotion, _)| emotion).unwrap_or_default()
    }

    pub fn current_day(&self) -> &str {
        &self.current_day
    }

    pub fn conversation_log(&self, day: &str) -> &[DialogueRecord] {
        self.conversation_log.get(day).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn automated_delegate(&self, id: &ActorId) -> Option<&AutomatedDelegate> {
        self.automated.get(id)
    }

    pub fn human_delegate(&self, id: &ActorId) -> Option<&HumanDelegate> {
        self.human.get(id)
    }

    /// Lines written since the last call, oldest first.
    pub fn take_transcript(&mut self) -> Vec<String> {
        std::mem::take(&mut self.transcript)
    }

    pub(crate) fn emit(&mut self, line: String) {
        self.transcript.push(line);
    }

    /// True when every ordered pair of distinct members has an attitude.
    pub fn attitudes_complete(&self) -> bool {
        self.members.iter().all(|subject| {
            self.members
                .iter()
                .filter(|object| *object != subject)
                .all(|object| self.attitudes.contains(subject, object))
        })
    }

    pub fn status(&self) -> GroupStatus {
        GroupStatus {
            day: self.current_day.clone(),
            members: self
                .members
                .iter()
                .filter_map(|id| self.cast.get(id))
                .map(|actor| MemberStatus {
                    name: actor.id.clone(),
                    emotion: actor.current_emotion,
                })
                .collect(),
            dominant_mood: self.dominant_mood(),
            tension: self.tension,
            tension_description: self.tension_description().to_string(),
        }
    }

    /// Seat a registered actor. Attitudes toward and from everyone already
    /// present are seeded from friend and enemy sets. Returns `false` when
    /// the actor is unknown or already seated.
    pub fn add(&mut self, id: &ActorId) -> bool {
        let Some(newcomer) = self.cast.get(id) else {
            warn!(actor = %id, "group.add.unknown_actor");
            return false;
        };
        if self.is_member(id) {
            return false;
        }

        for other_id in &self.members {
            let Some(other) = self.cast.get(other_id) else {
                continue;
            };
            self.attitudes.set(id, other_id, seeded_attitude(newcomer, other_id));
            self.attitudes.set(other_id, id, seeded_attitude(other, id));
        }
        self.members.push(id.clone());
        debug!(actor = %id, members = self.members.len(), "group.add");
        self.recompute_mood();
        debug_assert!(self.attitudes_complete());
        true
    }

    /// Unseat an actor and forget every attitude involving it. The actor
    /// stays registered and keeps its own state.
    pub fn remove(&mut self, id: &ActorId) -> bool {
        let Some(pos) = self.members.iter().position(|m| m == id) else {
            return false;
        };
        self.members.remove(pos);
        self.attitudes.purge(id);
        debug!(actor = %id, members = self.members.len(), "group.remove");
        self.recompute_mood();
        debug_assert!(self.attitudes_complete());
        true
    }

    pub fn set_current_day(&mut self, day: impl Into<String>) {
        self.current_day = day.into();
        self.conversation_log.entry(self.current_day.clone()).or_default();
    }

    /// Clear the room for a fresh start of the current day: nobody seated,
    /// no tension, no delegates, and an empty log for the day. Registered
    /// actors and other days' logs are kept.
    pub fn reset_day(&mut self) {
        self.members.clear();
        self.attitudes.clear();
        self.tension = 0.0;
        self.mood.clear();
        self.automated.clear();
        self.human.clear();
        self.transcript.clear();
        self.conversation_log.insert(self.current_day.clone(), Vec::new());
    }

    /// Apply the social effects of one spoken line.
    ///
    /// Lines from non-members are ignored. When the addressee is under
    /// delegate control its reply is applied in turn, up to the configured
    /// reply depth; replies are written to the transcript, the line itself
    /// is not.
    pub fn apply_line(
        &mut self,
        speaker: &ActorId,
        text: &str,
        addressed_to: Option<&ActorId>,
        emotion: Option<Emotion>,
    ) {
        self.apply_line_at(speaker, text, addressed_to, emotion, 0);
    }

    fn apply_line_at(
        &mut self,
        speaker: &ActorId,
        text: &str,
        addressed_to: Option<&ActorId>,
        emotion: Option<Emotion>,
        depth: usize,
    ) {
        if !self.is_member(speaker) {
            debug!(actor = %speaker, "group.line.not_a_member");
            return;
        }
        let Some(speaker_actor) = self.cast.get_mut(speaker) else {
            return;
        };
        if let Some(emotion) = emotion {
            speaker_actor.set_emotion(emotion);
        }
        let shown = speaker_actor.current_emotion;

        self.shift_tension(shown.tension_delta());

        let addressee = addressed_to.filter(|id| {
            let seated = *id != speaker && self.is_member(id);
            if !seated {
                debug!(speaker = %speaker, addressee = %id, "group.line.addressee_absent");
            }
            seated
        });

        let record = DialogueRecord::new(speaker.clone(), text, shown, addressee.cloned());
        for delegate in self.automated.values_mut().filter(|d| d.is_active()) {
            delegate.record(record.clone());
        }
        for delegate in self.human.values_mut().filter(|d| d.is_active()) {
            delegate.record(record.clone());
        }
        self.conversation_log
            .entry(self.current_day.clone())
            .or_default()
            .push(record);

        if let Some(addressee) = addressee {
            match shown.category() {
                Category::Positive => self.attitudes.set(addressee, speaker, Emotion::Friendly),
                Category::Negative => self.attitudes.set(addressee, speaker, Emotion::Hostile),
                _ => {}
            }

            let offended = self
                .cast
                .get(addressee)
                .is_some_and(|listener| listener.is_offended_by(speaker, shown, self.rng.as_mut()));
            if offended {
                debug!(actor = %addressee, by = %speaker, "group.line.offended");
                self.shift_tension(OFFENSE_TENSION);
            }

            if depth < self.config.max_reply_depth {
                let reply = self.delegated_reply(addressee, speaker);
                if !reply.is_empty() {
                    let reply_emotion = self.cast.get(addressee).map(|a| a.current_emotion).unwrap_or_default();
                    self.emit(transcript::dialogue_line(addressee, &[speaker], reply_emotion, &reply));
                    self.apply_line_at(addressee, &reply, Some(speaker), Some(reply_emotion), depth + 1);
                }
            }
        }

        for id in &self.members {
            if id == speaker {
                continue;
            }
            if let Some(bystander) = self.cast.get_mut(id) {
                bystander.react_to(speaker, shown);
            }
        }

        self.recompute_mood();
        debug_assert!(self.attitudes_complete());
    }

    /// What `addressee` says back to `speaker` when a delegate speaks for
    /// it. Empty when nobody does or the human skips.
    fn delegated_reply(&mut self, addressee: &ActorId, speaker: &ActorId) -> String {
        let Some(profile) = self.cast.get(addressee).map(Actor::profile) else {
            return String::new();
        };
        if let Some(delegate) = self.automated.get(addressee).filter(|d| d.is_active()) {
            let instruction = format!("Respond to {}.", speaker);
            let fallback = self.config.fallback_for(addressee.as_str());
            return delegate.respond(&profile, self.generator.as_ref(), Some(&instruction), &fallback);
        }
        if let Some(delegate) = self.human.get(addressee).filter(|d| d.is_active()) {
            return delegate.respond(
                &profile,
                self.generator.as_ref(),
                self.chooser.as_mut(),
                self.config.option_count,
            );
        }
        String::new()
    }

    /// The line `speaker` actually says in place of `scripted`: generated
    /// under automated control, chosen under human control, otherwise the
    /// script. A skipped human choice keeps the scripted line.
    pub fn delegated_line(&mut self, speaker: &ActorId, scripted: &str) -> String {
        let Some(profile) = self.cast.get(speaker).map(Actor::profile) else {
            return scripted.to_string();
        };
        if let Some(delegate) = self.automated.get(speaker).filter(|d| d.is_active()) {
            let fallback = self.config.fallback_for(speaker.as_str());
            return delegate.respond(&profile, self.generator.as_ref(), None, &fallback);
        }
        if let Some(delegate) = self.human.get(speaker).filter(|d| d.is_active()) {
            let chosen = delegate.respond(
                &profile,
                self.generator.as_ref(),
                self.chooser.as_mut(),
                self.config.option_count,
            );
            if !chosen.is_empty() {
                return chosen;
            }
        }
        scripted.to_string()
    }

    /// Force `actor`'s attitude toward `target` to hostile.
    pub fn mark_offended(&mut self, actor: &ActorId, target: &ActorId) -> bool {
        if actor == target || !self.is_member(actor) || !self.is_member(target) {
            warn!(actor = %actor, target = %target, "group.offended.not_members");
            return false;
        }
        self.attitudes.set(actor, target, Emotion::Hostile);
        self.recompute_mood();
        true
    }

    fn shift_tension(&mut self, delta: f64) {
        let before = self.tension;
        self.tension = (self.tension + delta).clamp(0.0, 1.0);
        if delta != 0.0 {
            debug!(before, after = self.tension, delta, "group.tension");
        }
    }

    fn recompute_mood(&mut self) {
        let mut counts: BTreeMap<Emotion, f64> = BTreeMap::new();
        for emotion in self.attitudes.emotions() {
            *counts.entry(emotion).or_default() += 1.0;
        }
        for id in &self.members {
            if let Some(actor) = self.cast.get(id) {
                *counts.entry(actor.current_emotion).or_default() += 1.0;
            }
        }
        let total: f64 = counts.values().sum();
        if total > 0.0 {
            for share in counts.values_mut() {
                *share /= total;
            }
        }
        self.mood = counts;
    }

    /// Put `actor` under automated control. A new delegate starts with the
    /// tail of the current day's log as its memory.
    pub fn assume_automated_control(&mut self, actor: &ActorId) -> bool {
        if !self.knows(actor) {
            warn!(actor = %actor, "group.control.unknown_actor");
            return false;
        }
        let log = self.conversation_log.get(&self.current_day);
        let delegate = self.automated.entry(actor.clone()).or_insert_with(|| {
            let mut delegate = AutomatedDelegate::new(actor.clone());
            if let Some(log) = log {
                delegate.history_mut().seed_from(log);
            }
            delegate
        });
        delegate.activate();
        true
    }

    /// Put `actor` under human control.
    pub fn assume_human_control(&mut self, actor: &ActorId) -> bool {
        if !self.knows(actor) {
            warn!(actor = %actor, "group.control.unknown_actor");
            return false;
        }
        let log = self.conversation_log.get(&self.current_day);
        let delegate = self.human.entry(actor.clone()).or_insert_with(|| {
            let mut delegate = HumanDelegate::new(actor.clone());
            if let Some(log) = log {
                delegate.history_mut().seed_from(log);
            }
            delegate
        });
        delegate.activate();
        true
    }

    /// Hand `actor` back to the script. Without delegates this does nothing.
    pub fn return_to_script(&mut self, actor: &ActorId) {
        if let Some(delegate) = self.automated.get_mut(actor) {
            delegate.deactivate();
        }
        if let Some(delegate) = self.human.get_mut(actor) {
            delegate.deactivate();
        }
    }

    /// Automated control over everyone present, optionally followed by a
    /// stretch of generated conversation.
    ///
    /// A batch already in the store is replayed as is. Otherwise one line is
    /// generated per direction, speakers taking turns in seating order and
    /// each addressing the first other member it is willing to, and the
    /// result is stored under the batch key. Bulk lines never trigger replies.
    pub fn assume_automated_control_of_all(&mut self, bulk: Option<&BulkGeneration>) {
        let members = self.members.clone();
        for id in &members {
            self.assume_automated_control(id);
        }
        let Some(bulk) = bulk else {
            return;
        };
        if members.is_empty() {
            warn!(batch = %bulk.batch, "group.bulk.empty_room");
            return;
        }

        match self.batches.load(&bulk.batch) {
            Ok(Some(records)) => {
                info!(batch = %bulk.batch, lines = records.len(), "group.bulk.replay");
                for record in &records {
                    self.apply_bulk_line(record);
                }
                return;
            }
            Ok(None) => {}
            Err(e) => warn!(batch = %bulk.batch, error = %e, "group.bulk.load_failed"),
        }

        info!(batch = %bulk.batch, directions = bulk.directions.len(), "group.bulk.generate");
        let mut generated = Vec::with_capacity(bulk.directions.len());
        for (turn, direction) in bulk.directions.iter().enumerate() {
            let speaker = &members[turn % members.len()];
            let Some(record) = self.generate_bulk_line(speaker, direction) else {
                continue;
            };
            self.apply_bulk_line(&record);
            generated.push(record);
        }

        if generated.is_empty() {
            return;
        }
        if let Err(e) = self.batches.save(&bulk.batch, &generated) {
            warn!(batch = %bulk.batch, error = %e, "group.bulk.save_failed");
        }
    }

    fn generate_bulk_line(&mut self, speaker: &ActorId, direction: &str) -> Option<DialogueRecord> {
        let actor = self.cast.get(speaker)?;
        let addressee = self
            .members
            .iter()
            .filter(|id| *id != speaker)
            .find(|id| self.cast.get(*id).is_some_and(|other| actor.can_address(other)))
            .cloned();
        let profile = actor.profile();
        let emotion = actor.current_emotion;
        let fallback = self.config.fallback_for(speaker.as_str());
        let delegate = self.automated.get(speaker)?;
        let text = delegate.respond(&profile, self.generator.as_ref(), Some(direction), &fallback);
        Some(DialogueRecord::new(speaker.clone(), text, emotion, addressee))
    }

    fn apply_bulk_line(&mut self, record: &DialogueRecord) {
        let recipients: Vec<&ActorId> = record.addressed_to.iter().collect();
        self.emit(transcript::dialogue_line(&record.speaker, &recipients, record.emotion, &record.text));
        let depth = self.config.max_reply_depth;
        self.apply_line_at(
            &record.speaker,
            &record.text,
            record.addressed_to.as_ref(),
            Some(record.emotion),
            depth,
        );
    }
}

fn seeded_attitude(holder: &Actor, toward: &ActorId) -> Emotion {
    if holder.is_friend(toward) {
        Emotion::Friendly
    } else if holder.is_enemy(toward) {
        Emotion::Hostile
    } else {
        Emotion::Neutral
    }
}

/// One seated member as shown in a status report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberStatus {
    pub name: ActorId,
    pub emotion: Emotion,
}

/// What a front-end needs after each event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStatus {
    pub day: String,
    pub members: Vec<MemberStatus>,
    pub dominant_mood: Emotion,
    pub tension: f64,
    pub tension_description: String,
}

impl fmt::Display for GroupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} members, mood: {}, tension: {} ({:.4})",
            self.members.len(),
            self.dominant_mood.as_str().to_uppercase(),
            self.tension_description,
            self.tension
        )
    }
}
