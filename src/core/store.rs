/// Persistence boundary for users, games and scores.
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::core::model::{GameKey, GameRecord, Score, User};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("user '{0}' already exists")]
    DuplicateUser(String),
    #[error("user '{0}' not found")]
    UnknownUser(String),
    #[error("game '{0}' not found")]
    UnknownGame(GameKey),
    #[error("game '{key}' was modified concurrently (expected version {expected}, found {found})")]
    VersionConflict {
        key: GameKey,
        expected: u64,
        found: u64,
    },
}

/// Which games `list_games` returns.
#[derive(Debug, Clone, Default)]
pub struct GameFilter {
    pub user: Option<String>,
    pub active_only: bool,
}

impl GameFilter {
    pub fn active() -> Self {
        Self {
            user: None,
            active_only: true,
        }
    }

    pub fn active_for(user: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
            active_only: true,
        }
    }

    fn matches(&self, game: &GameRecord) -> bool {
        if self.active_only && !game.is_active() {
            return false;
        }
        self.user.as_deref().map_or(true, |u| u == game.user)
    }
}

#[async_trait]
pub trait GameStore: Send + Sync {
    async fn insert_user(&self, user: User) -> Result<(), StoreError>;

    async fn get_user(&self, name: &str) -> Option<User>;

    /// All users, ordered by name.
    async fn list_users(&self) -> Vec<User>;

    async fn insert_game(&self, game: GameRecord) -> Result<(), StoreError>;

    async fn get_game(&self, key: &str) -> Option<GameRecord>;

    /// Matching games in creation order.
    async fn list_games(&self, filter: GameFilter) -> Vec<GameRecord>;

    /// Writes `game` if its version still matches the stored one. When a
    /// score is supplied it is inserted and the owner's aggregates updated
    /// in the same step. Returns the record as stored, with its new version.
    async fn commit_game(
        &self,
        game: GameRecord,
        score: Option<Score>,
    ) -> Result<GameRecord, StoreError>;

    /// Scores in insertion order, optionally restricted to one user.
    async fn list_scores(&self, user: Option<&str>) -> Vec<Score>;
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<String, User>,
    games: HashMap<GameKey, GameRecord>,
    game_order: Vec<GameKey>,
    scores: Vec<Score>,
}

/// In-process store. A single lock covers all tables so a commit is atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn insert_user(&self, user: User) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(&user.name) {
            return Err(StoreError::DuplicateUser(user.name));
        }
        tables.users.insert(user.name.clone(), user);
        Ok(())
    }

    async fn get_user(&self, name: &str) -> Option<User> {
        self.tables.read().await.users.get(name).cloned()
    }

    async fn list_users(&self) -> Vec<User> {
        self.tables.read().await.users.values().cloned().collect()
    }

    async fn insert_game(&self, game: GameRecord) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&game.user) {
            return Err(StoreError::UnknownUser(game.user));
        }
        tables.game_order.push(game.key.clone());
        tables.games.insert(game.key.clone(), game);
        Ok(())
    }

    async fn get_game(&self, key: &str) -> Option<GameRecord> {
        self.tables.read().await.games.get(key).cloned()
    }

    async fn list_games(&self, filter: GameFilter) -> Vec<GameRecord> {
        let tables = self.tables.read().await;
        tables
            .game_order
            .iter()
            .filter_map(|key| tables.games.get(key))
            .filter(|game| filter.matches(game))
            .cloned()
            .collect()
    }

    async fn commit_game(
        &self,
        mut game: GameRecord,
        score: Option<Score>,
    ) -> Result<GameRecord, StoreError> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;

        let stored = tables
            .games
            .get_mut(&game.key)
            .ok_or_else(|| StoreError::UnknownGame(game.key.clone()))?;
        if stored.version != game.version {
            return Err(StoreError::VersionConflict {
                key: game.key,
                expected: game.version,
                found: stored.version,
            });
        }

        if let Some(score) = &score {
            let user = tables
                .users
                .get_mut(&score.user)
                .ok_or_else(|| StoreError::UnknownUser(score.user.clone()))?;
            user.record_finish(score.points);
        }

        game.version += 1;
        *stored = game.clone();
        tables.scores.extend(score);
        Ok(game)
    }

    async fn list_scores(&self, user: Option<&str>) -> Vec<Score> {
        self.tables
            .read()
            .await
            .scores
            .iter()
            .filter(|s| user.map_or(true, |u| u == s.user))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::hangman::{Finish, HangmanState};
    use chrono::NaiveDate;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    async fn store_with_game() -> (MemoryStore, GameRecord) {
        let store = MemoryStore::new();
        store.insert_user(User::new("ada", None)).await.unwrap();
        let game = GameRecord::new("ada", HangmanState::new("CAT"));
        store.insert_game(game.clone()).await.unwrap();
        (store, game)
    }

    #[tokio::test]
    async fn duplicate_users_are_rejected() {
        let store = MemoryStore::new();
        store.insert_user(User::new("ada", None)).await.unwrap();
        let err = store.insert_user(User::new("ada", None)).await.unwrap_err();
        assert_eq!(err, StoreError::DuplicateUser("ada".into()));
    }

    #[tokio::test]
    async fn games_need_an_owner() {
        let store = MemoryStore::new();
        let game = GameRecord::new("ghost", HangmanState::new("CAT"));
        let err = store.insert_game(game).await.unwrap_err();
        assert_eq!(err, StoreError::UnknownUser("ghost".into()));
    }

    #[tokio::test]
    async fn commit_bumps_version_and_rejects_stale_writes() {
        let (store, game) = store_with_game().await;

        let mut first = game.clone();
        first.state.guess("c").unwrap();
        let committed = store.commit_game(first, None).await.unwrap();
        assert_eq!(committed.version, 1);

        let mut stale = game;
        stale.state.guess("a").unwrap();
        let err = store.commit_game(stale, None).await.unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict { expected: 0, found: 1, .. }));

        let stored = store.get_game(&committed.key).await.unwrap();
        assert_eq!(stored.state.guessed_letters(), ['C']);
    }

    #[tokio::test]
    async fn commit_with_score_updates_user_once() {
        let (store, mut game) = store_with_game().await;
        game.state.cancel().unwrap();
        let score = Score::new("ada", Finish { won: false, points: 0 }, day());
        store.commit_game(game, Some(score)).await.unwrap();

        let user = store.get_user("ada").await.unwrap();
        assert_eq!(user.games_played, 1);
        assert_eq!(user.career_points, 0);
        assert_eq!(store.list_scores(Some("ada")).await.len(), 1);
        assert!(store.list_scores(Some("bob")).await.is_empty());
    }

    #[tokio::test]
    async fn list_games_filters_finished_and_foreign_games() {
        let (store, mut game) = store_with_game().await;
        store.insert_user(User::new("bob", None)).await.unwrap();
        let other = GameRecord::new("bob", HangmanState::new("DOG"));
        store.insert_game(other.clone()).await.unwrap();

        assert_eq!(store.list_games(GameFilter::active()).await.len(), 2);

        game.state.cancel().unwrap();
        store.commit_game(game, None).await.unwrap();

        let active = store.list_games(GameFilter::active()).await;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].key, other.key);
        assert!(store.list_games(GameFilter::active_for("ada")).await.is_empty());
        assert_eq!(store.list_games(GameFilter::default()).await.len(), 2);
    }
}
