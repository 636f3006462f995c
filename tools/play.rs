/// Play — runs day scripts against a roster and prints the transcript.
///
/// Usage: play [DAYS] --roster <roster.ron> [--days-dir <dir>] [--config <config.ron>]
///             [--markov <model.ron>] [--batches <dir>] [--interactive]
use clap::Parser;
use ensemble_engine::core::batch::JsonBatchStore;
use ensemble_engine::core::chooser::TerminalChooser;
use ensemble_engine::core::markov::{load_model, MarkovGenerator};
use ensemble_engine::core::playback::{day_file_name, parse_day_range, Playback, PlaybackError};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "play")]
#[command(about = "Play scripted group conversations day by day")]
struct Args {
    /// Day number, inclusive range like 01-03, or a path to a script file
    #[arg(default_value = "01")]
    days: String,

    /// Roster of actors (RON)
    #[arg(long)]
    roster: PathBuf,

    /// Directory holding day-NN.json scripts
    #[arg(long, default_value = "play_events")]
    days_dir: PathBuf,

    /// Engine configuration (RON); defaults apply when absent
    #[arg(long)]
    config: Option<PathBuf>,

    /// Markov model used for automated lines
    #[arg(long)]
    markov: Option<PathBuf>,

    /// Directory for saved bulk-generation batches
    #[arg(long)]
    batches: Option<PathBuf>,

    /// Step through events with next/back/status/day/run/quit
    #[arg(long, short)]
    interactive: bool,

    /// Chance of printing a status report after each event
    #[arg(long, default_value_t = 0.05)]
    status_chance: f64,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), PlaybackError> {
    let mut builder = Playback::builder().roster(&args.roster);
    if let Some(config) = &args.config {
        builder = builder.config(config);
    }
    if args.days.ends_with(".json") {
        builder = builder.day_file(&args.days);
    } else {
        for day in parse_day_range(&args.days)? {
            builder = builder.day_file(day_file_name(&args.days_dir, day));
        }
    }
    if let Some(dir) = &args.batches {
        builder = builder.with_batch_store(Box::new(JsonBatchStore::new(dir)));
    }
    builder = builder.with_chooser(Box::new(TerminalChooser::stdio()));

    let mut playback = builder.build()?;
    if let Some(path) = &args.markov {
        let model = load_model(path)?;
        let seed = playback.group().config().seed;
        playback
            .group_mut()
            .set_generator(Arc::new(MarkovGenerator::new(model, seed)));
    }

    let mut rng = StdRng::seed_from_u64(playback.group().config().seed);
    if args.interactive {
        interactive(&mut playback, &mut rng)
    } else {
        run_all(&mut playback, &mut rng, args.status_chance)
    }
}

fn run_all(playback: &mut Playback, rng: &mut StdRng, status_chance: f64) -> Result<(), PlaybackError> {
    let mut day_number = 1;
    loop {
        if day_number > 1 {
            println!("\n{}", "=".repeat(50));
            println!("=== DAY {} ===", day_number);
            println!("{}\n", "=".repeat(50));
        }
        println!("\n=== Starting {} ===\n", playback.day().id);
        println!("Initial group state: {}\n", playback.status());

        while let Some(lines) = playback.step() {
            print_lines(&lines);
            if rng.gen_bool(status_chance.clamp(0.0, 1.0)) {
                print_status(playback, rng);
            }
        }

        println!("\n=== Day Complete ===");
        println!("Final group state: {}\n", playback.status());

        if !playback.next_day()? {
            return Ok(());
        }
        day_number += 1;
    }
}

fn interactive(playback: &mut Playback, rng: &mut StdRng) -> Result<(), PlaybackError> {
    println!("Commands: next (or Enter), back, status, day <id>, run, quit");
    println!("\n=== {} ===", playback.day().id);

    let stdin = io::stdin();
    loop {
        print!("[{} {}/{}]> ", playback.day().id, playback.position(), playback.day().events.len());
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => return Ok(()),
            Ok(_) => {}
        }
        let mut words = line.split_whitespace();
        match words.next().unwrap_or("next") {
            "next" | "n" => match playback.step() {
                Some(lines) => print_lines(&lines),
                None => {
                    if playback.next_day()? {
                        println!("\n=== {} ===", playback.day().id);
                    } else {
                        println!("End of the last day.");
                    }
                }
            },
            "back" | "b" => {
                if playback.step_back() {
                    println!("Rewound to event {}.", playback.position());
                } else if playback.prev_day()? {
                    println!("\n=== {} ===", playback.day().id);
                } else {
                    println!("Already at the start.");
                }
            }
            "status" | "s" => print_status(playback, rng),
            "day" | "d" => match words.next() {
                Some(id) => {
                    let id = match id.parse::<u32>() {
                        Ok(n) => format!("day-{:02}", n),
                        Err(_) => id.to_string(),
                    };
                    match playback.load_day_by_id(&id) {
                        Ok(()) => println!("\n=== {} ===", playback.day().id),
                        Err(e) => println!("{}", e),
                    }
                }
                None => println!("Days: {}", playback.day_ids().join(", ")),
            },
            "run" | "r" => print_lines(&playback.run_to_end()),
            "quit" | "q" => return Ok(()),
            other => println!("Unknown command: {}", other),
        }
    }
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

/// Group summary plus one random member's feelings toward the others.
fn print_status(playback: &Playback, rng: &mut StdRng) {
    let group = playback.group();
    println!("\nGroup status: {}", group.status());
    if let Some(member) = group.members().choose(rng) {
        if let Some(actor) = group.actor(member) {
            println!("{}'s current emotion: {}", member, actor.current_emotion.as_str().to_uppercase());
        }
        for other in group.members() {
            if other == member {
                continue;
            }
            if let Some(feeling) = group.attitude(member, other) {
                println!("  -> Feels {} towards {}", feeling.as_str().to_uppercase(), other);
            }
        }
    }
    println!();
}
