/// Labyrinth Chat example — a small room of characters with delegated control.
///
/// Scripted lines first, then Ariadne handed to an offline Markov generator,
/// then back to the script.
///
/// Run with: cargo run --example labyrinth_chat

use ensemble_engine::core::config::EngineConfig;
use ensemble_engine::core::group::Group;
use ensemble_engine::core::markov::{MarkovGenerator, MarkovTrainer};
use ensemble_engine::schema::actor::{ActorId, AddressRule, Trait, Traits};
use ensemble_engine::schema::emotion::Emotion;
use ensemble_engine::schema::event::{Event, EventKind, Target};
use ensemble_engine::schema::roster::{ActorDef, Roster};
use std::sync::Arc;

fn main() {
    // --- Cast ---
    let mut theseus = ActorDef::new("Theseus", Traits::new(80, 70, 75));
    theseus.friends.push("Ariadne".to_string());
    let mut ariadne = ActorDef::new("Ariadne", Traits::new(65, 85, 65));
    ariadne.friends.push("TheZeus".to_string());
    let mut sartrik = ActorDef::new("Sartrik", Traits::new(50, 95, 55));
    sartrik.address_rules.push(AddressRule::OtherAbove {
        which: Trait::Intelligence,
        threshold: 80,
    });
    let roster = Roster::new(vec![theseus, ariadne, sartrik]).with_alias("TheZeus", "Theseus");

    // --- Offline generator trained on a small corpus ---
    let corpus = std::fs::read_to_string("tests/fixtures/labyrinth_corpus.txt")
        .expect("Failed to read labyrinth corpus");
    let model = MarkovTrainer::train(&corpus, 2);
    let generator = MarkovGenerator::new(model, 2026).with_word_range(6, 14);

    let config = EngineConfig {
        generation_timeout_ms: Some(2_000),
        ..EngineConfig::default()
    };
    let mut group = Group::new(roster.build_cast(), config).with_generator(Arc::new(generator));

    let theseus = ActorId::from("Theseus");
    let ariadne = ActorId::from("Ariadne");
    let sartrik = ActorId::from("Sartrik");

    let play = |group: &mut Group, event: Event| {
        for line in event.apply(group) {
            println!("{}", line);
        }
    };

    println!("=== Initial state ===");
    for name in ["Theseus", "Ariadne", "Sartrik"] {
        play(&mut group, Event::enter(name));
    }
    println!("{}\n", group.status());

    println!("=== Scripted dialogue ===");
    play(
        &mut group,
        Event::dialogue(theseus.clone(), Target::One(ariadne.clone()), "The thread held.", Some(Emotion::Hopeful)),
    );
    play(
        &mut group,
        Event::dialogue(
            sartrik.clone(),
            Target::One(theseus.clone()),
            "Luck is not a method.",
            Some(Emotion::Dismissive),
        ),
    );
    println!("{}\n", group.status());

    println!("=== Ariadne under automated control ===");
    play(
        &mut group,
        Event::new(EventKind::AssumeAutomatedControl {
            actor: Some(ariadne.clone()),
            bulk: None,
        }),
    );
    play(
        &mut group,
        Event::dialogue(theseus.clone(), Target::One(ariadne.clone()), "Which way now?", Some(Emotion::Curious)),
    );
    play(
        &mut group,
        Event::dialogue(ariadne.clone(), Target::Nobody, "(replaced by the generator)", Some(Emotion::Calm)),
    );
    if let Some(delegate) = group.automated_delegate(&ariadne) {
        println!("(Ariadne remembers {} lines)", delegate.history().len());
    }
    println!("{}\n", group.status());

    println!("=== Back to the script ===");
    play(&mut group, Event::new(EventKind::ReturnToScript { actor: ariadne.clone() }));
    play(
        &mut group,
        Event::dialogue(ariadne, Target::Many(vec![theseus, sartrik]), "Follow me.", Some(Emotion::Proud)),
    );
    println!("{}", group.status());

    println!("\n=== Example complete ===");
}
