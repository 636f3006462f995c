/// Markov chain dialogue model — training, serialization, and an offline
/// `Generator` that speaks in each character's own words.

use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

use crate::core::generator::{GenerationError, Generator};
use crate::schema::actor::ActorProfile;
use crate::schema::dialogue::DialogueRecord;
use crate::schema::event::{Event, EventKind};

#[derive(Debug, Error)]
pub enum MarkovError {
    #[error("no data for generation (model is empty or speaker has no lines)")]
    NoData,
    #[error("no sentence start found")]
    NoSentenceStart,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("RON serialization error: {0}")]
    RonWrite(#[from] ron::Error),
}

const SENTENCE_START: &str = "<S>";
const SENTENCE_END: &str = "</S>";

const SENTENCE_ENDERS: &[char] = &['.', '!', '?'];
const PUNCTUATION: &[char] = &['.', '!', '?', ',', ';', ':', '"', '\''];

type Transitions = HashMap<Vec<String>, Vec<(String, u32)>>;

/// N-gram transition counts, overall and per speaker.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MarkovModel {
    /// N-gram depth (2 for bigrams, 3 for trigrams).
    pub n: usize,
    pub transitions: Transitions,
    /// Keyed by speaker name.
    pub tagged_transitions: HashMap<String, Transitions>,
}

impl MarkovModel {
    /// Walk the chain from a sentence start until a sentence boundary
    /// within the word range. `tag` restricts the walk to one speaker.
    pub fn generate(
        &self,
        rng: &mut StdRng,
        tag: Option<&str>,
        min_words: usize,
        max_words: usize,
    ) -> Result<String, MarkovError> {
        let transitions = match tag {
            Some(tag) => self.tagged_transitions.get(tag).ok_or(MarkovError::NoData)?,
            None => &self.transitions,
        };
        if transitions.is_empty() || self.n < 2 {
            return Err(MarkovError::NoData);
        }

        let mut tokens: Vec<String> = Vec::new();
        let mut state: Vec<String> = vec![SENTENCE_START.to_string(); self.n - 1];
        let mut word_count = 0;
        let mut last_sentence_end = 0;

        // Bounded so a chain of pure punctuation still terminates.
        for _ in 0..(max_words * 3) {
            let Some(next) = pick_next(transitions, &state, rng) else {
                break;
            };

            if next == SENTENCE_END {
                last_sentence_end = tokens.len();
                if word_count >= min_words {
                    break;
                }
                state = vec![SENTENCE_START.to_string(); self.n - 1];
                continue;
            }

            if !is_punctuation(&next) {
                word_count += 1;
            }
            tokens.push(next.clone());
            state.push(next);
            if state.len() > self.n - 1 {
                state.remove(0);
            }

            if word_count >= max_words {
                if last_sentence_end > 0 {
                    tokens.truncate(last_sentence_end);
                }
                break;
            }
        }

        if tokens.is_empty() {
            return Err(MarkovError::NoSentenceStart);
        }
        Ok(reassemble_tokens(&tokens))
    }

    pub fn speakers(&self) -> Vec<&str> {
        let mut speakers: Vec<&str> = self.tagged_transitions.keys().map(String::as_str).collect();
        speakers.sort_unstable();
        speakers
    }
}

fn is_punctuation(token: &str) -> bool {
    let mut chars = token.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if PUNCTUATION.contains(&c))
}

fn pick_next(transitions: &Transitions, state: &[String], rng: &mut StdRng) -> Option<String> {
    let options = transitions.get(state)?;
    let weights: Vec<u32> = options.iter().map(|(_, count)| *count).collect();
    let dist = WeightedIndex::new(&weights).ok()?;
    Some(options[dist.sample(rng)].0.clone())
}

/// Punctuation attaches to the previous word.
fn reassemble_tokens(tokens: &[String]) -> String {
    let mut result = String::new();
    for (i, tok) in tokens.iter().enumerate() {
        if i > 0 && !is_punctuation(tok) {
            result.push(' ');
        }
        result.push_str(tok);
    }
    result
}

pub struct MarkovTrainer;

impl MarkovTrainer {
    /// Train a model from raw text with the given n-gram depth (2 to 4).
    ///
    /// A line of the form `[Name]` attributes the following lines to that
    /// speaker until the next such line.
    pub fn train(text: &str, n: usize) -> MarkovModel {
        let n = n.clamp(2, 4);
        let mut transitions = Transitions::new();
        let mut tagged_transitions: HashMap<String, Transitions> = HashMap::new();
        let mut current_tag: Option<String> = None;

        for line in text.lines() {
            let trimmed = line.trim();
            if let Some(tag) = as_tag_line(trimmed) {
                current_tag = Some(tag.to_string());
                continue;
            }
            if trimmed.is_empty() {
                continue;
            }

            let tokens = tokenize(trimmed);
            for sentence in split_into_sentences(&tokens) {
                let mut padded = vec![SENTENCE_START.to_string(); n - 1];
                padded.extend(sentence);
                padded.push(SENTENCE_END.to_string());

                for window in padded.windows(n) {
                    let prefix = window[..n - 1].to_vec();
                    let next = window[n - 1].clone();
                    add_transition(&mut transitions, prefix.clone(), next.clone());
                    if let Some(tag) = &current_tag {
                        add_transition(tagged_transitions.entry(tag.clone()).or_default(), prefix, next);
                    }
                }
            }
        }

        MarkovModel {
            n,
            transitions,
            tagged_transitions,
        }
    }
}

fn as_tag_line(line: &str) -> Option<&str> {
    line.strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .filter(|tag| !tag.is_empty())
}

/// A training corpus from the dialogue in day scripts, one `[Name]` region
/// per line. Bracketed stage directions are left out so they are not read
/// as speaker tags.
pub fn speaker_corpus<'a>(events: impl IntoIterator<Item = &'a Event>) -> String {
    let mut corpus = String::new();
    for event in events {
        if let EventKind::Dialogue { actor, text, .. } = &event.kind {
            let text = text.trim();
            if text.is_empty() || as_tag_line(text).is_some() {
                continue;
            }
            corpus.push_str(&format!("[{}]\n{}\n", actor, text));
        }
    }
    corpus
}

fn add_transition(table: &mut Transitions, prefix: Vec<String>, next: String) {
    let entries = table.entry(prefix).or_default();
    if let Some(entry) = entries.iter_mut().find(|(tok, _)| tok == &next) {
        entry.1 += 1;
    } else {
        entries.push((next, 1));
    }
}

/// Split on whitespace with punctuation as separate tokens.
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for word in text.split_whitespace() {
        let mut remaining = word;
        while let Some(first) = remaining.chars().next() {
            if PUNCTUATION.contains(&first) {
                tokens.push(first.to_string());
                remaining = &remaining[first.len_utf8()..];
                continue;
            }
            match remaining.find(|c: char| PUNCTUATION.contains(&c)) {
                Some(pos) => {
                    tokens.push(remaining[..pos].to_string());
                    remaining = &remaining[pos..];
                }
                None => {
                    tokens.push(remaining.to_string());
                    break;
                }
            }
        }
    }
    tokens
}

fn split_into_sentences(tokens: &[String]) -> Vec<Vec<String>> {
    let mut sentences = Vec::new();
    let mut current = Vec::new();

    for tok in tokens {
        current.push(tok.clone());
        let ends_sentence = tok.len() == 1 && tok.chars().all(|c| SENTENCE_ENDERS.contains(&c));
        if ends_sentence {
            sentences.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        sentences.push(current);
    }
    sentences
}

pub fn save_model(model: &MarkovModel, path: &std::path::Path) -> Result<(), MarkovError> {
    let serialized = ron::ser::to_string_pretty(model, ron::ser::PrettyConfig::default())?;
    std::fs::write(path, serialized)?;
    Ok(())
}

pub fn load_model(path: &std::path::Path) -> Result<MarkovModel, MarkovError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(ron::from_str(&contents)?)
}

/// Offline generator: each character speaks from its own chain, or from the
/// shared chain when it has no lines of its own. History and instructions
/// are ignored.
pub struct MarkovGenerator {
    model: MarkovModel,
    rng: Mutex<StdRng>,
    min_words: usize,
    max_words: usize,
}

impl MarkovGenerator {
    pub fn new(model: MarkovModel, seed: u64) -> Self {
        Self {
            model,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            min_words: 4,
            max_words: 24,
        }
    }

    pub fn with_word_range(mut self, min_words: usize, max_words: usize) -> Self {
        self.min_words = min_words;
        self.max_words = max_words.max(min_words);
        self
    }
}

impl Generator for MarkovGenerator {
    fn generate(
        &self,
        profile: &ActorProfile,
        _history: &[DialogueRecord],
        _instruction: Option<&str>,
    ) -> Result<String, GenerationError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| GenerationError::Backend("markov generator lock poisoned".to_string()))?;
        let tag = self
            .model
            .tagged_transitions
            .contains_key(&profile.name)
            .then_some(profile.name.as_str());
        Ok(self.model.generate(&mut *rng, tag, self.min_words, self.max_words)?)
    }

    fn generate_options(
        &self,
        profile: &ActorProfile,
        history: &[DialogueRecord],
        count: usize,
    ) -> Result<Vec<String>, GenerationError> {
        (0..count).map(|_| self.generate(profile, history, None)).collect()
    }
}
