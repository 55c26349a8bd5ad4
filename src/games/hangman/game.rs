use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One head, one body, two arms, two legs.
pub const STARTING_STRIKES: i32 = 6;

const BLANK: char = '_';

pub const INVALID_GUESS_MSG: &str = "Your guess must be a single English letter!";
pub const REPEATED_GUESS_MSG: &str = "You have already guessed this letter";
pub const HIT_MSG: &str = "The letter IS in the secret word!";
pub const MISS_MSG: &str = "The letter IS NOT in the secret word!";
pub const WIN_MSG: &str = "You win!";
pub const CANCEL_MSG: &str = "Game canceled prematurely - Game over!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    InProgress,
    Won,
    Lost,
}

impl GameStatus {
    pub fn is_over(self) -> bool {
        !matches!(self, GameStatus::InProgress)
    }
}

/// A single processed guess. Entries are never edited once pushed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub guess: char,
    pub message: String,
    pub strikes_remaining: i32,
}

/// Emitted exactly once, on the transition into `Won` or `Lost`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Finish {
    pub won: bool,
    pub points: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub message: String,
    /// False for the soft no-ops (malformed or repeated guess).
    pub applied: bool,
    pub finish: Option<Finish>,
}

impl MoveOutcome {
    fn unchanged(message: &str) -> Self {
        Self {
            message: message.to_string(),
            applied: false,
            finish: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("Illegal action: Game is already over.")]
    IllegalAction,
    #[error("Game already over! Cannot cancel!")]
    AlreadyOver,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HangmanState {
    target_string: String,
    shown_string: String,
    guessed_letters: Vec<char>,
    correct_letters: Vec<char>,
    strikes_remaining: i32,
    status: GameStatus,
    history: Vec<HistoryEntry>,
}

impl HangmanState {
    pub fn new(word: &str) -> Self {
        Self::with_strikes(word, STARTING_STRIKES)
    }

    pub fn with_strikes(word: &str, strikes_remaining: i32) -> Self {
        let target_string = word.to_ascii_uppercase();
        let shown_string = reveal(&target_string, &[]);

        Self {
            target_string,
            shown_string,
            guessed_letters: Vec::new(),
            correct_letters: Vec::new(),
            strikes_remaining,
            status: GameStatus::InProgress,
            history: Vec::new(),
        }
    }

    pub fn target_string(&self) -> &str {
        &self.target_string
    }

    pub fn shown_string(&self) -> &str {
        &self.shown_string
    }

    pub fn guessed_letters(&self) -> &[char] {
        &self.guessed_letters
    }

    pub fn correct_letters(&self) -> &[char] {
        &self.correct_letters
    }

    pub fn strikes_remaining(&self) -> i32 {
        self.strikes_remaining
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn game_over(&self) -> bool {
        self.status.is_over()
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Processes one guess. Every check runs before the first write, so a
    /// rejected or no-op guess leaves the state untouched.
    pub fn guess(&mut self, input: &str) -> Result<MoveOutcome, GameError> {
        if self.game_over() {
            return Err(GameError::IllegalAction);
        }

        let mut chars = input.chars();
        let letter = match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => c.to_ascii_uppercase(),
            _ => return Ok(MoveOutcome::unchanged(INVALID_GUESS_MSG)),
        };

        if self.guessed_letters.contains(&letter) {
            return Ok(MoveOutcome::unchanged(REPEATED_GUESS_MSG));
        }

        self.guessed_letters.push(letter);
        let message = if self.target_string.contains(letter) {
            self.correct_letters.push(letter);
            HIT_MSG
        } else {
            self.strikes_remaining -= 1;
            MISS_MSG
        };
        self.history.push(HistoryEntry {
            guess: letter,
            message: message.to_string(),
            strikes_remaining: self.strikes_remaining,
        });

        self.shown_string = reveal(&self.target_string, &self.correct_letters);

        // Win takes priority over the strike check.
        if self.shown_string == self.target_string {
            let finish = self.finalize(true);
            return Ok(MoveOutcome {
                message: WIN_MSG.to_string(),
                applied: true,
                finish: Some(finish),
            });
        }

        if self.strikes_remaining < 1 {
            let finish = self.finalize(false);
            return Ok(MoveOutcome {
                message: format!("{message} Game over!"),
                applied: true,
                finish: Some(finish),
            });
        }

        Ok(MoveOutcome {
            message: message.to_string(),
            applied: true,
            finish: None,
        })
    }

    /// Forfeits an active game. Scored as an ordinary loss with zero points.
    pub fn cancel(&mut self) -> Result<MoveOutcome, GameError> {
        if self.game_over() {
            return Err(GameError::AlreadyOver);
        }

        self.strikes_remaining = 0;
        let finish = self.finalize(false);
        Ok(MoveOutcome {
            message: CANCEL_MSG.to_string(),
            applied: true,
            finish: Some(finish),
        })
    }

    fn finalize(&mut self, won: bool) -> Finish {
        self.status = if won { GameStatus::Won } else { GameStatus::Lost };
        Finish {
            won,
            points: self.strikes_remaining,
        }
    }
}

/// Builds the shown string from scratch: each position shows its letter iff
/// that letter has been guessed correctly.
pub fn reveal(target: &str, correct_letters: &[char]) -> String {
    target
        .chars()
        .map(|c| if correct_letters.contains(&c) { c } else { BLANK })
        .collect()
}
