/// Text generation collaborators.
///
/// A `Generator` turns a character profile and recent dialogue into a line.
/// Real backends live outside this crate; the ones here cover offline play
/// and tests. Failures are returned as `GenerationError` and converted to a
/// fallback line by the delegate that asked.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;

use crate::core::markov::MarkovError;
use crate::schema::actor::ActorProfile;
use crate::schema::dialogue::DialogueRecord;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generator unavailable: {0}")]
    Unavailable(String),
    #[error("generation timed out after {0:?}")]
    TimedOut(Duration),
    #[error("generator failed: {0}")]
    Backend(String),
    #[error("generator returned no text")]
    Empty,
    #[error("markov error: {0}")]
    Markov(#[from] MarkovError),
}

pub trait Generator: Send + Sync {
    fn generate(
        &self,
        profile: &ActorProfile,
        history: &[DialogueRecord],
        instruction: Option<&str>,
    ) -> Result<String, GenerationError>;

    /// Ask for `count` distinct candidate lines as a numbered list and split
    /// the answer into lines with their numbering removed. May return fewer
    /// than `count` candidates.
    fn generate_options(
        &self,
        profile: &ActorProfile,
        history: &[DialogueRecord],
        count: usize,
    ) -> Result<Vec<String>, GenerationError> {
        let instruction = format!(
            "Generate {} different response options for {}. Each option should be a complete \
             response and reflect the character's personality. Format the response as a \
             numbered list (1., 2., etc.).",
            count, profile.name
        );
        let raw = self.generate(profile, history, Some(&instruction))?;
        Ok(split_numbered_list(&raw))
    }
}

/// Lines that look like list items (`1.`, `2)`, `- `), with the marker removed.
pub fn split_numbered_list(raw: &str) -> Vec<String> {
    raw.lines()
        .filter_map(|line| {
            let line = line.trim();
            let body = if let Some(rest) = line.strip_prefix("- ") {
                rest
            } else if line.starts_with(|c: char| c.is_ascii_digit()) {
                let rest = line.trim_start_matches(|c: char| c.is_ascii_digit());
                rest.trim_start_matches(['.', ')', ':'])
            } else {
                return None;
            };
            let body = body.trim();
            (!body.is_empty()).then(|| body.to_string())
        })
        .collect()
}

/// Always fails, so every automated line becomes the fallback line.
#[derive(Debug, Clone, Default)]
pub struct UnavailableGenerator;

impl Generator for UnavailableGenerator {
    fn generate(
        &self,
        _profile: &ActorProfile,
        _history: &[DialogueRecord],
        _instruction: Option<&str>,
    ) -> Result<String, GenerationError> {
        Err(GenerationError::Unavailable("no text generator configured".to_string()))
    }
}

/// Hands out canned lines in order, wrapping around.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    lines: Vec<String>,
    cursor: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new<S: Into<String>>(lines: impl IntoIterator<Item = S>) -> Self {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            cursor: AtomicUsize::new(0),
        }
    }

    fn next_line(&self) -> Result<String, GenerationError> {
        if self.lines.is_empty() {
            return Err(GenerationError::Empty);
        }
        let n = self.cursor.fetch_add(1, Ordering::Relaxed);
        Ok(self.lines[n % self.lines.len()].clone())
    }
}

impl Generator for ScriptedGenerator {
    fn generate(
        &self,
        _profile: &ActorProfile,
        _history: &[DialogueRecord],
        _instruction: Option<&str>,
    ) -> Result<String, GenerationError> {
        self.next_line()
    }

    fn generate_options(
        &self,
        _profile: &ActorProfile,
        _history: &[DialogueRecord],
        count: usize,
    ) -> Result<Vec<String>, GenerationError> {
        (0..count).map(|_| self.next_line()).collect()
    }
}

/// Bounds how long a wrapped generator may take. The call runs on a worker
/// thread; on expiry the caller gets `TimedOut` and the worker's eventual
/// answer is discarded.
pub struct TimeoutGenerator {
    inner: Arc<dyn Generator>,
    timeout: Duration,
}

impl TimeoutGenerator {
    pub fn new(inner: Arc<dyn Generator>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    fn run<T, F>(&self, call: F) -> Result<T, GenerationError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn Generator) -> Result<T, GenerationError> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        thread::spawn(move || {
            // The receiver is gone if we already timed out.
            let _ = tx.send(call(inner.as_ref()));
        });
        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => Err(GenerationError::TimedOut(self.timeout)),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(GenerationError::Backend("generator worker exited without answering".to_string()))
            }
        }
    }
}

impl Generator for TimeoutGenerator {
    fn generate(
        &self,
        profile: &ActorProfile,
        history: &[DialogueRecord],
        instruction: Option<&str>,
    ) -> Result<String, GenerationError> {
        let profile = profile.clone();
        let history = history.to_vec();
        let instruction = instruction.map(str::to_string);
        self.run(move |inner| inner.generate(&profile, &history, instruction.as_deref()))
    }

    fn generate_options(
        &self,
        profile: &ActorProfile,
        history: &[DialogueRecord],
        count: usize,
    ) -> Result<Vec<String>, GenerationError> {
        let profile = profile.clone();
        let history = history.to_vec();
        self.run(move |inner| inner.generate_options(&profile, &history, count))
    }
}
