/// Event application — the single entry point that changes a `Group`.

use tracing::{debug, info, warn};

use crate::core::group::Group;
use crate::core::transcript;
use crate::schema::event::{Event, EventKind};

impl Event {
    /// Apply this event to `group` and return the transcript lines it
    /// produced, delegate replies included.
    ///
    /// Events naming actors the group does not know are logged and skipped.
    /// Nothing here fails.
    pub fn apply(&self, group: &mut Group) -> Vec<String> {
        debug!(event = %self.event_type(), actor = ?self.actor().map(|a| a.as_str()), "event.apply");

        match &self.kind {
            EventKind::DayStart => group.emit(transcript::DAYTIME.to_string()),
            EventKind::DayEnd => group.emit(transcript::NIGHTTIME.to_string()),
            EventKind::Enter { actor } => {
                if group.knows(actor) {
                    group.add(actor);
                    group.emit(transcript::entered(actor));
                } else {
                    warn!(actor = %actor, "event.enter.unknown_actor");
                }
            }
            EventKind::Leave { actor } => {
                if group.knows(actor) {
                    group.remove(actor);
                    group.emit(transcript::left(actor));
                } else {
                    warn!(actor = %actor, "event.leave.unknown_actor");
                }
            }
            EventKind::Dialogue {
                actor,
                target,
                text,
                emotion,
            } => {
                if !group.is_member(actor) {
                    warn!(actor = %actor, "event.dialogue.speaker_absent");
                    return group.take_transcript();
                }
                let spoken = group.delegated_line(actor, text);
                let shown = emotion
                    .or_else(|| group.actor(actor).map(|a| a.current_emotion))
                    .unwrap_or_default();
                let recipients = target.recipients();
                group.emit(transcript::dialogue_line(actor, &recipients, shown, &spoken));

                if recipients.is_empty() {
                    group.apply_line(actor, &spoken, None, *emotion);
                }
                for recipient in recipients {
                    group.apply_line(actor, &spoken, Some(recipient), *emotion);
                }
            }
            EventKind::Offended { actor, target } => {
                if group.mark_offended(actor, target) {
                    group.emit(transcript::offended(actor, target));
                }
            }
            EventKind::EnvironmentChange { description, .. } => {
                group.emit(transcript::environment_change(description));
            }
            EventKind::AssumeAutomatedControl { actor: Some(actor), .. } => {
                group.assume_automated_control(actor);
            }
            EventKind::AssumeAutomatedControl { actor: None, bulk } => {
                info!(members = group.members().len(), "event.automated_control.all");
                group.assume_automated_control_of_all(bulk.as_ref());
            }
            EventKind::AssumeHumanControl { actor } => {
                group.assume_human_control(actor);
            }
            EventKind::ReturnToScript { actor } => group.return_to_script(actor),
        }

        group.take_transcript()
    }
}
