/// Hangman game module
pub mod game;
pub mod renderer;
pub mod words;

pub use game::{Finish, GameError, GameStatus, HangmanState, HistoryEntry, MoveOutcome};
pub use words::{WordList, WordListError};
