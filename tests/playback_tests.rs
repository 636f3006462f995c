/// Playback integration tests — fixture roster and day scripts end to end.

use ensemble_engine::core::batch::JsonBatchStore;
use ensemble_engine::core::generator::ScriptedGenerator;
use ensemble_engine::core::playback::{day_file_name, parse_day_range, Playback};
use ensemble_engine::schema::actor::ActorId;
use ensemble_engine::schema::emotion::Emotion;
use rand::rngs::mock::StepRng;
use std::path::Path;
use std::sync::Arc;

const ROSTER: &str = "tests/fixtures/roster.ron";
const CONFIG: &str = "tests/fixtures/config.ron";
const DAYS: &str = "tests/fixtures/days";

fn id(name: &str) -> ActorId {
    ActorId::from(name)
}

fn playback() -> Playback {
    Playback::builder()
        .roster(ROSTER)
        .config(CONFIG)
        .days_dir(DAYS)
        .with_rng_factory(|_| Box::new(StepRng::new(u64::MAX, 0)))
        .build()
        .unwrap()
}

#[test]
fn loads_fixture_days_in_order() {
    let playback = playback();
    assert_eq!(playback.day_ids(), vec!["day-01", "day-02"]);
    assert_eq!(playback.day().events.len(), 12);
    assert_eq!(playback.day().issues.len(), 1);
    assert!(playback.day().issues[0].message.contains("Minotaur"));
    // Seating the full roster is off in the fixture config.
    assert!(playback.group().members().is_empty());
}

#[test]
fn day_one_transcript() {
    let mut playback = playback();
    let lines = playback.run_to_end();
    assert_eq!(
        lines,
        vec![
            "It is now daytime.",
            "Theseus has entered the chatroom.",
            "Ariadne has entered the chatroom.",
            "UGLI 666 has entered the chatroom.",
            "Theseus [to Ariadne, hopeful]: The thread held. We can find the way out.",
            "Ariadne [to Theseus, UGLI 666, calm]: Stay close, both of you.",
            "UGLI 666 [to Theseus, angry]: Nobody asked you to lead.",
            "Theseus is offended by UGLI 666!",
            "Environment change: The walls of the labyrinth shift.",
            "Ariadne [neutral]: Did anyone else feel that?",
            "UGLI 666 has left the chatroom.",
            "It is now nighttime.",
        ]
    );

    let status = playback.status();
    assert_eq!(status.members.len(), 2);
    assert!((status.tension - 0.02).abs() < 1e-12);
    assert_eq!(status.tension_description, "slightly tense");
    assert_eq!(playback.group().conversation_log("day-01").len(), 5);
}

#[test]
fn aliases_resolve_in_scripts_and_roster() {
    let mut playback = playback();
    playback.run_to_end();
    let group = playback.group();
    // "TheZeus" spoke, and "UGLI666" entered, under their canonical names.
    assert!(group.conversation_log("day-01").iter().any(|r| r.speaker == id("Theseus")));
    assert!(group.actor(&id("Ariadne")).unwrap().is_friend(&id("Theseus")));
    assert_eq!(
        group.attitude(&id("Ariadne"), &id("Theseus")),
        Some(Emotion::Friendly)
    );
}

#[test]
fn undo_rebuilds_relationships_and_tension() {
    let mut playback = playback();
    for _ in 0..7 {
        playback.step();
    }
    assert!((playback.group().tension() - 0.02).abs() < 1e-12);
    assert_eq!(
        playback.group().attitude(&id("Theseus"), &id("UGLI 666")),
        Some(Emotion::Hostile)
    );

    assert!(playback.step_back());
    assert_eq!(playback.position(), 6);
    assert_eq!(playback.group().tension(), 0.0);
    assert_eq!(
        playback.group().attitude(&id("Theseus"), &id("UGLI 666")),
        Some(Emotion::Neutral)
    );

    // Theseus's hopeful line won UGLI 666 over; rewinding past it undoes that.
    assert!(playback.group().actor(&id("UGLI 666")).unwrap().is_friend(&id("Theseus")));
    while playback.step_back() {}
    assert_eq!(playback.position(), 0);
    assert!(playback.group().actor(&id("UGLI 666")).unwrap().is_enemy(&id("Theseus")));
}

#[test]
fn second_day_starts_from_a_clean_room() {
    let mut playback = playback();
    playback.run_to_end();
    assert!(playback.next_day().unwrap());
    assert_eq!(playback.group().current_day(), "day-02");
    assert!(playback.group().members().is_empty());
    assert_eq!(playback.group().tension(), 0.0);
    // Chapters inside one file are played back to back.
    assert_eq!(playback.day().events.len(), 11);
    assert!(playback.day().issues.is_empty());
    // The previous day's log is kept.
    assert_eq!(playback.group().conversation_log("day-01").len(), 5);
}

#[test]
fn automated_stretch_uses_the_generator() {
    let mut playback = Playback::builder()
        .roster(ROSTER)
        .config(CONFIG)
        .day_file(day_file_name(Path::new(DAYS), 2))
        .with_generator(Arc::new(ScriptedGenerator::new(["A door opens."])))
        .with_rng_factory(|_| Box::new(StepRng::new(u64::MAX, 0)))
        .build()
        .unwrap();

    let lines = playback.run_to_end();
    assert!(lines.contains(&"Monstradamus [solemn]: A door opens.".to_string()));
    assert!(!lines.iter().any(|l| l.contains("I see a door with no handle.")));

    let monstradamus = id("Monstradamus");
    let delegate = playback.group().automated_delegate(&monstradamus).unwrap();
    assert!(!delegate.is_active());
    // Three lines of the day so far, plus its own.
    assert_eq!(delegate.history().len(), 4);
}

#[test]
fn automated_stretch_without_a_generator_uses_the_fallback() {
    let mut playback = Playback::builder()
        .roster(ROSTER)
        .config(CONFIG)
        .day_file(day_file_name(Path::new(DAYS), 2))
        .build()
        .unwrap();
    let lines = playback.run_to_end();
    assert!(lines.contains(&"Monstradamus [solemn]: [Monstradamus would respond here, but AI is not configured]".to_string()));
}

#[test]
fn bulk_batches_persist_across_playthroughs() {
    let dir = tempfile::tempdir().unwrap();
    let script = r#"[
        {"event_type": "enter", "character": "Theseus"},
        {"event_type": "enter", "character": "Ariadne"},
        {"event_type": "assume_automated_control", "bulk": {"batch": "escape", "directions": ["Plan.", "Agree."]}}
    ]"#;
    let day_path = dir.path().join("day-01.json");
    std::fs::write(&day_path, script).unwrap();
    let batches = dir.path().join("batches");

    let build = |generator: ScriptedGenerator| {
        Playback::builder()
            .roster(ROSTER)
            .config(CONFIG)
            .day_file(&day_path)
            .with_generator(Arc::new(generator))
            .with_batch_store(Box::new(JsonBatchStore::new(&batches)))
            .with_rng_factory(|_| Box::new(StepRng::new(u64::MAX, 0)))
            .build()
            .unwrap()
    };

    let first = build(ScriptedGenerator::new(["We go left.", "Left it is."])).run_to_end();
    assert_eq!(
        &first[2..],
        &[
            "Theseus [to Ariadne, neutral]: We go left.".to_string(),
            "Ariadne [to Theseus, neutral]: Left it is.".to_string(),
        ]
    );
    assert!(batches.join("escape.json").exists());

    // A different generator on the second run: the stored batch wins.
    let second = build(ScriptedGenerator::new(["Something else."])).run_to_end();
    assert_eq!(first, second);
}

#[test]
fn range_argument_maps_to_fixture_files() {
    let files: Vec<_> = parse_day_range("01-02")
        .unwrap()
        .into_iter()
        .map(|n| day_file_name(Path::new(DAYS), n))
        .collect();
    assert!(files.iter().all(|f| f.exists()));

    let mut builder = Playback::builder().roster(ROSTER).config(CONFIG);
    for file in files {
        builder = builder.day_file(file);
    }
    let playback = builder.build().unwrap();
    assert_eq!(playback.day_ids(), vec!["day-01", "day-02"]);
}
