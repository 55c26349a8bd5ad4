/// Stored records: players, games and the scores finished games leave behind.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::games::hangman::{Finish, HangmanState};

pub type GameKey = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub email: Option<String>,
    pub games_played: u32,
    pub career_points: i64,
}

impl User {
    pub fn new(name: impl Into<String>, email: Option<String>) -> Self {
        Self {
            name: name.into(),
            email,
            games_played: 0,
            career_points: 0,
        }
    }

    /// Average points per finished game, computed on read.
    pub fn performance(&self) -> f64 {
        if self.games_played == 0 {
            0.0
        } else {
            self.career_points as f64 / f64::from(self.games_played)
        }
    }

    pub fn record_finish(&mut self, points: i32) {
        self.games_played += 1;
        self.career_points += i64::from(points);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub key: GameKey,
    pub user: String,
    pub state: HangmanState,
    /// Bumped by the store on every commit; a commit carrying a stale
    /// version is refused.
    pub version: u64,
}

impl GameRecord {
    pub fn new(user: impl Into<String>, state: HangmanState) -> Self {
        Self {
            key: Uuid::new_v4().to_string(),
            user: user.into(),
            state,
            version: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.state.game_over()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub user: String,
    pub date: NaiveDate,
    pub won: bool,
    pub points: i32,
}

impl Score {
    pub fn new(user: impl Into<String>, finish: Finish, date: NaiveDate) -> Self {
        Self {
            user: user.into(),
            date,
            won: finish.won,
            points: finish.points,
        }
    }
}
