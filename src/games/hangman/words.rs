use std::path::{Path, PathBuf};

use rand::Rng;
use thiserror::Error;

/// Used when no word file is configured.
const BUILTIN_WORDS: [&str; 9] = [
    "EXAMPLE", "WEBSOCKET", "RUST", "ASYNC", "TOKIO", "HANGMAN", "TERMINAL", "NETWORK", "SOCKET",
];

#[derive(Debug, Error)]
pub enum WordListError {
    #[error("failed to read word list {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("word list contains no words")]
    Empty,
    #[error("line {line}: '{word}' is not a plain alphabetic word")]
    InvalidWord { line: usize, word: String },
}

/// Secret words, loaded once at startup and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct WordList {
    words: Vec<String>,
}

impl WordList {
    pub fn builtin() -> Self {
        Self {
            words: BUILTIN_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, WordListError> {
        let text = std::fs::read_to_string(path).map_err(|source| WordListError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// One word per line. Blank lines are skipped; anything else that is not
    /// purely ASCII letters is rejected.
    pub fn parse(text: &str) -> Result<Self, WordListError> {
        let mut words = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let word = raw.trim();
            if word.is_empty() {
                continue;
            }
            if !word.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(WordListError::InvalidWord {
                    line: idx + 1,
                    word: word.to_string(),
                });
            }
            words.push(word.to_ascii_uppercase());
        }

        if words.is_empty() {
            return Err(WordListError::Empty);
        }
        Ok(Self { words })
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Uniform pick over the whole list.
    pub fn choose<R: Rng>(&self, rng: &mut R) -> &str {
        &self.words[rng.random_range(0..self.words.len())]
    }
}
