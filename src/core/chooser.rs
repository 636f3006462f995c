/// The human side of a human-controlled character.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use tracing::warn;

use crate::schema::actor::ActorId;

/// What the person at the keyboard decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    /// Zero-based index into the offered options.
    Pick(usize),
    Write(String),
    Skip,
}

/// Blocks until a choice is made.
pub trait Chooser {
    fn choose(&mut self, actor: &ActorId, options: &[String]) -> Choice;
}

/// Where a terminal chooser reads its answers from, one line at a time.
pub trait LineSource {
    /// Append the next line to `buf`, returning the bytes read (0 at end of input).
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize>;
}

impl<T: BufRead> LineSource for T {
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        BufRead::read_line(self, buf)
    }
}

/// Process stdin, locked only for the duration of each read so other code
/// on the same thread can keep reading from it.
#[derive(Debug)]
pub struct StdinLines {
    stdin: io::Stdin,
}

impl StdinLines {
    pub fn new() -> Self {
        Self { stdin: io::stdin() }
    }
}

impl Default for StdinLines {
    fn default() -> Self {
        Self::new()
    }
}

impl LineSource for StdinLines {
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        self.stdin.read_line(buf)
    }
}

/// Numbered menu over any line source and writer. `C` writes a custom line,
/// `S` skips. Invalid input re-prompts; end of input or an IO failure skips.
pub struct TerminalChooser<R, W> {
    input: R,
    output: W,
}

impl TerminalChooser<StdinLines, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(StdinLines::new(), io::stdout())
    }
}

impl<R: LineSource, W: Write> TerminalChooser<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim().to_string()),
            Err(e) => {
                warn!(error = %e, "chooser.read_failed");
                None
            }
        }
    }

    fn prompt(&mut self, actor: &ActorId, options: &[String]) -> io::Result<Choice> {
        writeln!(self.output, "\n--- {}'s Response Options ---", actor)?;
        for (i, option) in options.iter().enumerate() {
            writeln!(self.output, "{}. {}", i + 1, option)?;
        }
        writeln!(self.output, "C. Type your own response")?;
        writeln!(self.output, "S. Skip (let another character respond)")?;
        writeln!(self.output, "----------------------------------------")?;

        loop {
            write!(self.output, "Choose an option for {}: ", actor)?;
            self.output.flush()?;
            let Some(answer) = self.read_line() else {
                return Ok(Choice::Skip);
            };

            match answer.to_uppercase().as_str() {
                "S" => {
                    writeln!(self.output, "Skipping {}'s response.", actor)?;
                    return Ok(Choice::Skip);
                }
                "C" => {
                    write!(self.output, "Enter {}'s response: ", actor)?;
                    self.output.flush()?;
                    let Some(custom) = self.read_line() else {
                        return Ok(Choice::Skip);
                    };
                    if !custom.is_empty() {
                        return Ok(Choice::Write(custom));
                    }
                    writeln!(self.output, "Response cannot be empty. Please try again.")?;
                }
                other => match other.parse::<usize>() {
                    Ok(n) if (1..=options.len()).contains(&n) => return Ok(Choice::Pick(n - 1)),
                    _ => writeln!(
                        self.output,
                        "Please enter a number between 1 and {}, 'C', or 'S'.",
                        options.len()
                    )?,
                },
            }
        }
    }
}

impl<R: LineSource, W: Write> Chooser for TerminalChooser<R, W> {
    fn choose(&mut self, actor: &ActorId, options: &[String]) -> Choice {
        if options.is_empty() {
            return Choice::Skip;
        }
        self.prompt(actor, options).unwrap_or_else(|e| {
            warn!(actor = %actor, error = %e, "chooser.prompt_failed");
            Choice::Skip
        })
    }
}

/// Replays queued choices, then skips.
#[derive(Debug, Clone, Default)]
pub struct ScriptedChooser {
    choices: VecDeque<Choice>,
}

impl ScriptedChooser {
    pub fn new(choices: impl IntoIterator<Item = Choice>) -> Self {
        Self {
            choices: choices.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.choices.len()
    }
}

impl Chooser for ScriptedChooser {
    fn choose(&mut self, _actor: &ActorId, _options: &[String]) -> Choice {
        self.choices.pop_front().unwrap_or(Choice::Skip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn options() -> Vec<String> {
        vec!["Hello.".to_string(), "Leave me be.".to_string()]
    }

    fn run(input: &str) -> (Choice, String) {
        let mut chooser = TerminalChooser::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        let choice = chooser.choose(&ActorId::from("IsoldA"), &options());
        let output = String::from_utf8(chooser.into_output()).unwrap();
        (choice, output)
    }

    #[test]
    fn picks_numbered_option() {
        let (choice, output) = run("2\n");
        assert_eq!(choice, Choice::Pick(1));
        assert!(output.contains("1. Hello."));
        assert!(output.contains("C. Type your own response"));
    }

    #[test]
    fn reprompts_on_invalid_input() {
        let (choice, output) = run("7\nzzz\n1\n");
        assert_eq!(choice, Choice::Pick(0));
        assert_eq!(output.matches("Please enter a number between 1 and 2").count(), 2);
    }

    #[test]
    fn custom_line_must_not_be_empty() {
        let (choice, output) = run("c\n\nC\nI brought the thread.\n");
        assert_eq!(choice, Choice::Write("I brought the thread.".to_string()));
        assert!(output.contains("Response cannot be empty"));
    }

    #[test]
    fn skip_and_end_of_input() {
        assert_eq!(run("s\n").0, Choice::Skip);
        assert_eq!(run("").0, Choice::Skip);
    }

    #[test]
    fn stdio_chooser_leaves_stdin_unlocked() {
        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let _chooser = TerminalChooser::stdio();
            let _lock = std::io::stdin().lock();
            let _ = tx.send(());
        });
        assert!(
            rx.recv_timeout(std::time::Duration::from_secs(3)).is_ok(),
            "stdin stayed locked after building the chooser"
        );
    }

    #[test]
    fn scripted_chooser_drains_then_skips() {
        let mut chooser = ScriptedChooser::new([Choice::Pick(0), Choice::Write("x".into())]);
        let actor = ActorId::from("Theseus");
        assert_eq!(chooser.choose(&actor, &options()), Choice::Pick(0));
        assert_eq!(chooser.choose(&actor, &options()), Choice::Write("x".into()));
        assert_eq!(chooser.choose(&actor, &options()), Choice::Skip);
        assert_eq!(chooser.remaining(), 0);
    }
}
