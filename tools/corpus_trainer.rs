/// Corpus Trainer — trains a per-speaker Markov model from day scripts or text.
///
/// Usage: corpus_trainer --output <model.ron> [--days-dir <dir> --roster <roster.ron>]
///                       [--input <corpus.txt>] [--ngram <2|3|4>]
use clap::Parser;
use ensemble_engine::core::markov::{save_model, speaker_corpus, MarkovTrainer};
use ensemble_engine::schema::roster::Roster;
use ensemble_engine::schema::script::{discover_days, DayScript};
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(name = "corpus_trainer")]
#[command(about = "Train a Markov model for offline character lines")]
struct Args {
    /// Plain-text corpus; `[Name]` lines start a speaker region
    #[arg(long)]
    input: Option<PathBuf>,

    /// Directory of day scripts whose dialogue becomes the corpus
    #[arg(long, requires = "roster")]
    days_dir: Option<PathBuf>,

    /// Roster used to resolve names in the day scripts
    #[arg(long)]
    roster: Option<PathBuf>,

    /// Where to write the trained model (RON)
    #[arg(long)]
    output: PathBuf,

    /// N-gram depth
    #[arg(long, default_value_t = 2)]
    ngram: usize,

    /// Also write the assembled corpus text next to the model
    #[arg(long)]
    dump_corpus: bool,
}

fn main() {
    let args = Args::parse();

    if !(2..=4).contains(&args.ngram) {
        eprintln!("Error: --ngram must be 2, 3, or 4");
        process::exit(1);
    }
    if args.input.is_none() && args.days_dir.is_none() {
        eprintln!("Error: give --input, --days-dir, or both");
        process::exit(1);
    }

    let mut text = String::new();

    if let Some(path) = &args.input {
        match std::fs::read_to_string(path) {
            Ok(contents) => text.push_str(&contents),
            Err(e) => {
                eprintln!("Error reading input file '{}': {}", path.display(), e);
                process::exit(1);
            }
        }
        text.push('\n');
    }

    if let (Some(dir), Some(roster_path)) = (&args.days_dir, &args.roster) {
        let roster = Roster::load_from_ron(roster_path).unwrap_or_else(|e| {
            eprintln!("Error loading roster '{}': {}", roster_path.display(), e);
            process::exit(1);
        });
        let paths = discover_days(dir).unwrap_or_else(|e| {
            eprintln!("Error reading '{}': {}", dir.display(), e);
            process::exit(1);
        });
        for path in paths {
            match DayScript::load_from_json(&path, &roster) {
                Ok(day) => {
                    println!("  Loaded: {} ({} events)", path.display(), day.events.len());
                    text.push_str(&speaker_corpus(&day.events));
                }
                Err(e) => eprintln!("  ERROR loading {}: {}", path.display(), e),
            }
        }
    }

    println!("Training {}-gram model...", args.ngram);
    let model = MarkovTrainer::train(&text, args.ngram);

    let transition_count: usize = model.transitions.values().map(|v| v.len()).sum();
    println!(
        "Model trained: {} unique prefixes, {} transitions",
        model.transitions.len(),
        transition_count
    );
    let speakers = model.speakers();
    if !speakers.is_empty() {
        println!("Speakers: {}", speakers.join(", "));
    }

    if args.dump_corpus {
        let corpus_path = args.output.with_extension("txt");
        if let Err(e) = std::fs::write(&corpus_path, &text) {
            eprintln!("Error writing corpus to '{}': {}", corpus_path.display(), e);
            process::exit(1);
        }
        println!("Corpus written to '{}'", corpus_path.display());
    }

    if let Err(e) = save_model(&model, &args.output) {
        eprintln!("Error saving model to '{}': {}", args.output.display(), e);
        process::exit(1);
    }

    println!("Model saved to '{}'", args.output.display());
}
