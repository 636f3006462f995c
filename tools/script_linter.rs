/// Script Linter — checks day scripts against a roster.
///
/// Usage: script_linter <script.json | days_dir> --roster <roster.ron>
use clap::Parser;
use ensemble_engine::schema::actor::Actor;
use ensemble_engine::schema::emotion::Emotion;
use ensemble_engine::schema::event::EventKind;
use ensemble_engine::schema::roster::Roster;
use ensemble_engine::schema::script::{discover_days, DayScript};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser, Debug)]
#[command(name = "script_linter")]
#[command(about = "Report unknown names, unknown moods and unreachable targets in day scripts")]
struct Args {
    /// A single script file or a directory of them
    path: PathBuf,

    /// Roster the scripts are written against
    #[arg(long)]
    roster: PathBuf,

    /// Print every distinct mood string found
    #[arg(long)]
    list_moods: bool,
}

fn main() {
    let args = Args::parse();

    let roster = Roster::load_from_ron(&args.roster).unwrap_or_else(|e| {
        eprintln!("ERROR: Failed to load roster: {}", e);
        process::exit(1);
    });
    let cast: FxHashMap<String, Actor> = roster
        .build_cast()
        .into_iter()
        .map(|actor| (actor.name().to_string(), actor))
        .collect();

    let paths = if args.path.is_dir() {
        discover_days(&args.path).unwrap_or_else(|e| {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        })
    } else if args.path.is_file() {
        vec![args.path.clone()]
    } else {
        eprintln!("ERROR: Path '{}' does not exist", args.path.display());
        process::exit(1);
    };

    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut all_moods = BTreeSet::new();

    for path in &paths {
        match DayScript::load_from_json(path, &roster) {
            Ok(day) => {
                println!("  Loaded: {} ({} events)", path.display(), day.events.len());
                lint_day(&day, &cast, &mut errors, &mut warnings);
                all_moods.extend(day.moods().map(str::to_string));
            }
            Err(e) => errors.push(format!("{}: {}", display_name(path), e)),
        }
    }

    println!("\n=== Script Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    if args.list_moods {
        println!("\nMoods used ({}):", all_moods.len());
        for mood in &all_moods {
            let marker = if Emotion::lookup(mood).is_some() { "" } else { "  (unknown)" };
            println!("  {}{}", mood, marker);
        }
    }

    println!(
        "\nSummary: {} files, {} errors, {} warnings",
        paths.len(),
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn lint_day(
    day: &DayScript,
    cast: &FxHashMap<String, Actor>,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    for issue in &day.issues {
        errors.push(format!("{} #{}: {}", day.id, issue.index, issue.message));
    }

    for mood in day.moods() {
        if Emotion::lookup(mood).is_none() {
            warnings.push(format!("{}: mood '{}' is not recognised and will read as neutral", day.id, mood));
        }
    }

    for (index, event) in day.events.iter().enumerate() {
        let EventKind::Dialogue { actor, target, text, .. } = &event.kind else {
            continue;
        };
        if text.trim().is_empty() {
            warnings.push(format!("{} event {}: {} has an empty line", day.id, index, actor));
        }
        let Some(speaker) = cast.get(actor.as_str()) else {
            continue;
        };
        for recipient in target.recipients() {
            if let Some(other) = cast.get(recipient.as_str()) {
                if !speaker.can_address(other) {
                    warnings.push(format!(
                        "{} event {}: {} is not willing to address {}",
                        day.id, index, actor, recipient
                    ));
                }
            }
        }
    }
}
