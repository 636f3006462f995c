/// Control delegates: stand-ins that speak for a character instead of the
/// script. Both kinds keep a bounded memory of what was said while active.

use tracing::{debug, info, warn};

use crate::core::chooser::{Choice, Chooser};
use crate::core::context::BoundedHistory;
use crate::core::generator::Generator;
use crate::schema::actor::{ActorId, ActorProfile};
use crate::schema::dialogue::DialogueRecord;

/// Speaks for its actor with whatever the generator produces.
#[derive(Debug, Clone)]
pub struct AutomatedDelegate {
    actor: ActorId,
    active: bool,
    history: BoundedHistory,
}

impl AutomatedDelegate {
    pub fn new(actor: ActorId) -> Self {
        Self {
            actor,
            active: false,
            history: BoundedHistory::new(),
        }
    }

    pub fn actor(&self) -> &ActorId {
        &self.actor
    }

    pub fn activate(&mut self) {
        self.active = true;
        info!(actor = %self.actor, "delegate.automated.activated");
    }

    pub fn deactivate(&mut self) {
        self.active = false;
        info!(actor = %self.actor, "delegate.automated.deactivated");
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn record(&mut self, entry: DialogueRecord) {
        self.history.record(entry);
    }

    pub fn history(&self) -> &BoundedHistory {
        &self.history
    }

    pub(crate) fn history_mut(&mut self) -> &mut BoundedHistory {
        &mut self.history
    }

    /// One generated line. Never fails: a generator error yields `fallback`.
    pub fn respond(
        &self,
        profile: &ActorProfile,
        generator: &dyn Generator,
        instruction: Option<&str>,
        fallback: &str,
    ) -> String {
        match generator.generate(profile, self.history.as_slice(), instruction) {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!(actor = %self.actor, error = %e, "delegate.automated.fallback");
                fallback.to_string()
            }
        }
    }
}

/// Offers candidate lines to a person and says what they pick.
#[derive(Debug, Clone)]
pub struct HumanDelegate {
    actor: ActorId,
    active: bool,
    history: BoundedHistory,
}

impl HumanDelegate {
    pub fn new(actor: ActorId) -> Self {
        Self {
            actor,
            active: false,
            history: BoundedHistory::new(),
        }
    }

    pub fn actor(&self) -> &ActorId {
        &self.actor
    }

    pub fn activate(&mut self) {
        self.active = true;
        info!(actor = %self.actor, "delegate.human.activated");
    }

    pub fn deactivate(&mut self) {
        self.active = false;
        info!(actor = %self.actor, "delegate.human.deactivated");
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn record(&mut self, entry: DialogueRecord) {
        self.history.record(entry);
    }

    pub fn history(&self) -> &BoundedHistory {
        &self.history
    }

    pub(crate) fn history_mut(&mut self) -> &mut BoundedHistory {
        &mut self.history
    }

    /// Exactly `count` candidates. Missing ones are filled with placeholders.
    pub fn options(&self, profile: &ActorProfile, generator: &dyn Generator, count: usize) -> Vec<String> {
        let mut options = match generator.generate_options(profile, self.history.as_slice(), count) {
            Ok(options) => options,
            Err(e) => {
                warn!(actor = %self.actor, error = %e, "delegate.human.options_failed");
                Vec::new()
            }
        };
        options.truncate(count);
        pad_options(&mut options, count, &profile.name);
        options
    }

    /// The chosen line, or an empty string when the person skips.
    pub fn respond(
        &self,
        profile: &ActorProfile,
        generator: &dyn Generator,
        chooser: &mut dyn Chooser,
        count: usize,
    ) -> String {
        let options = self.options(profile, generator, count);
        match chooser.choose(&self.actor, &options) {
            Choice::Pick(i) => match options.get(i) {
                Some(option) => option.clone(),
                None => {
                    warn!(actor = %self.actor, index = i, "delegate.human.pick_out_of_range");
                    String::new()
                }
            },
            Choice::Write(text) => text.trim().to_string(),
            Choice::Skip => {
                debug!(actor = %self.actor, "delegate.human.skipped");
                String::new()
            }
        }
    }
}

fn pad_options(options: &mut Vec<String>, count: usize, name: &str) {
    while options.len() < count {
        options.push(format!("[Option {} for {}]", options.len() + 1, name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chooser::ScriptedChooser;
    use crate::core::context::HISTORY_LIMIT;
    use crate::core::generator::{ScriptedGenerator, UnavailableGenerator};
    use crate::schema::actor::{Actor, Traits};
    use crate::schema::emotion::Emotion;

    fn profile() -> ActorProfile {
        Actor::new("Romeo-y-Cohiba", Traits::new(55, 65, 35)).profile()
    }

    fn id() -> ActorId {
        ActorId::from("Romeo-y-Cohiba")
    }

    #[test]
    fn delegates_start_inactive() {
        assert!(!AutomatedDelegate::new(id()).is_active());
        assert!(!HumanDelegate::new(id()).is_active());
    }

    #[test]
    fn automated_falls_back_on_failure() {
        let mut delegate = AutomatedDelegate::new(id());
        delegate.activate();
        let line = delegate.respond(&profile(), &UnavailableGenerator, None, "[fallback]");
        assert_eq!(line, "[fallback]");
    }

    #[test]
    fn automated_uses_generated_line() {
        let delegate = AutomatedDelegate::new(id());
        let generator = ScriptedGenerator::new(["  Cigar?  "]);
        assert_eq!(delegate.respond(&profile(), &generator, None, "[fallback]"), "Cigar?");
    }

    #[test]
    fn history_is_bounded() {
        let mut delegate = HumanDelegate::new(id());
        for n in 0..(HISTORY_LIMIT * 2) {
            delegate.record(DialogueRecord::new(id(), format!("{}", n), Emotion::Calm, None));
        }
        assert_eq!(delegate.history().len(), HISTORY_LIMIT);
    }

    #[test]
    fn human_options_are_padded() {
        let delegate = HumanDelegate::new(id());
        let options = delegate.options(&profile(), &UnavailableGenerator, 3);
        assert_eq!(
            options,
            vec![
                "[Option 1 for Romeo-y-Cohiba]",
                "[Option 2 for Romeo-y-Cohiba]",
                "[Option 3 for Romeo-y-Cohiba]",
            ]
        );
    }

    #[test]
    fn human_pick_write_and_skip() {
        let delegate = HumanDelegate::new(id());
        let generator = ScriptedGenerator::new(["one", "two", "three"]);
        let mut chooser = ScriptedChooser::new([
            Choice::Pick(1),
            Choice::Write(" my own words ".to_string()),
            Choice::Skip,
            Choice::Pick(9),
        ]);
        assert_eq!(delegate.respond(&profile(), &generator, &mut chooser, 3), "two");
        assert_eq!(delegate.respond(&profile(), &generator, &mut chooser, 3), "my own words");
        assert_eq!(delegate.respond(&profile(), &generator, &mut chooser, 3), "");
        assert_eq!(delegate.respond(&profile(), &generator, &mut chooser, 3), "");
    }
}
