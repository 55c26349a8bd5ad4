/// Request handling: loads records, runs the game engine, commits results.
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::core::error::ApiError;
use crate::core::model::{GameRecord, Score, User};
use crate::core::protocol::{
    GameForm, GameForms, GameHistoryForm, RpcRequest, RpcResponse, ScoreForm, ScoreForms,
    StringMessage, UserForm, UserForms,
};
use crate::core::store::{GameFilter, GameStore};
use crate::core::tasks::{AverageCache, Task, TaskQueue};
use crate::games::hangman::{renderer, HangmanState, MoveOutcome, WordList};

pub struct HangmanService {
    store: Arc<dyn GameStore>,
    words: Arc<WordList>,
    tasks: TaskQueue,
    average: AverageCache,
    /// Picks target words. Seeded from the OS unless replaced.
    rng: Mutex<StdRng>,
}

impl HangmanService {
    pub fn new(
        store: Arc<dyn GameStore>,
        words: Arc<WordList>,
        tasks: TaskQueue,
        average: AverageCache,
    ) -> Self {
        Self {
            store,
            words,
            tasks,
            average,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    pub async fn handle(&self, request: RpcRequest) -> Result<RpcResponse, ApiError> {
        debug!(method = request.method(), "rpc");
        let response = match request {
            RpcRequest::CreateUser { user_name, email } => {
                RpcResponse::Message(self.create_user(user_name, email).await?)
            }
            RpcRequest::NewGame { user_name } => RpcResponse::Game(self.new_game(&user_name).await?),
            RpcRequest::GetGame { urlsafe_game_key } => {
                RpcResponse::Game(self.get_game(&urlsafe_game_key).await?)
            }
            RpcRequest::MakeMove {
                urlsafe_game_key,
                guess,
            } => RpcResponse::Game(self.make_move(&urlsafe_game_key, &guess).await?),
            RpcRequest::CancelGame { urlsafe_game_key } => {
                RpcResponse::Game(self.cancel_game(&urlsafe_game_key).await?)
            }
            RpcRequest::GetScores => RpcResponse::Scores(self.get_scores().await),
            RpcRequest::GetUserScores { user_name } => {
                RpcResponse::Scores(self.get_user_scores(&user_name).await?)
            }
            RpcRequest::GetUserGames { user_name } => {
                RpcResponse::Games(self.get_user_games(&user_name).await?)
            }
            RpcRequest::GetHighScores { num_results } => {
                RpcResponse::Scores(self.get_high_scores(num_results).await)
            }
            RpcRequest::GetUserRankings { num_results } => {
                RpcResponse::Users(self.get_user_rankings(num_results).await)
            }
            RpcRequest::GetAverageStrikesRemaining => {
                RpcResponse::Message(self.get_average_strikes().await)
            }
            RpcRequest::GetGameHistory { urlsafe_game_key } => {
                RpcResponse::History(self.get_game_history(&urlsafe_game_key).await?)
            }
        };
        Ok(response)
    }

    pub async fn create_user(
        &self,
        user_name: String,
        email: Option<String>,
    ) -> Result<StringMessage, ApiError> {
        if user_name.trim().is_empty() {
            return Err(ApiError::BadRequest("user_name must not be empty".to_string()));
        }
        let message = format!("User {user_name} created!");
        self.store.insert_user(User::new(user_name, email)).await?;
        info!("{message}");
        Ok(StringMessage { message })
    }

    pub async fn new_game(&self, user_name: &str) -> Result<GameForm, ApiError> {
        let user = self.require_user(user_name).await?;
        let word = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            self.words.choose(&mut *rng).to_string()
        };
        let game = GameRecord::new(user.name, HangmanState::new(&word));
        self.store.insert_game(game.clone()).await?;
        info!(key = %game.key, user = %game.user, "new game");

        self.tasks.enqueue(Task::CacheAverageStrikes);
        Ok(renderer::game_form(&game, "Good luck playing Hangman!"))
    }

    pub async fn get_game(&self, key: &str) -> Result<GameForm, ApiError> {
        let game = self.load_game(key).await?;
        let message = if game.state.game_over() {
            "This game is over!"
        } else {
            "Time to guess a letter!"
        };
        Ok(renderer::game_form(&game, message))
    }

    pub async fn make_move(&self, key: &str, guess: &str) -> Result<GameForm, ApiError> {
        let mut game = self.load_game(key).await?;
        let outcome = game.state.guess(guess)?;
        self.commit(game, outcome).await
    }

    pub async fn cancel_game(&self, key: &str) -> Result<GameForm, ApiError> {
        let mut game = self.load_game(key).await?;
        let outcome = game.state.cancel()?;
        self.commit(game, outcome).await
    }

    pub async fn get_scores(&self) -> ScoreForms {
        let scores = self.store.list_scores(None).await;
        ScoreForms {
            items: scores.iter().map(ScoreForm::from).collect(),
        }
    }

    pub async fn get_user_scores(&self, user_name: &str) -> Result<ScoreForms, ApiError> {
        let user = self.require_user(user_name).await?;
        let scores = self.store.list_scores(Some(&user.name)).await;
        Ok(ScoreForms {
            items: scores.iter().map(ScoreForm::from).collect(),
        })
    }

    pub async fn get_user_games(&self, user_name: &str) -> Result<GameForms, ApiError> {
        let user = self.require_user(user_name).await?;
        let games = self.store.list_games(GameFilter::active_for(user.name)).await;
        Ok(GameForms {
            items: games.iter().map(|g| renderer::game_form(g, "")).collect(),
        })
    }

    /// Highest points first, older scores first among equals.
    pub async fn get_high_scores(&self, num_results: Option<usize>) -> ScoreForms {
        let mut scores = self.store.list_scores(None).await;
        scores.sort_by(|a, b| b.points.cmp(&a.points).then(a.date.cmp(&b.date)));
        ScoreForms {
            items: limit(scores.iter().map(ScoreForm::from), num_results),
        }
    }

    /// Best performance first, then most career points, then fewest games.
    pub async fn get_user_rankings(&self, num_results: Option<usize>) -> UserForms {
        let mut users = self.store.list_users().await;
        users.sort_by(|a, b| {
            b.performance()
                .total_cmp(&a.performance())
                .then(b.career_points.cmp(&a.career_points))
                .then(a.games_played.cmp(&b.games_played))
        });
        UserForms {
            items: limit(users.iter().map(UserForm::from), num_results),
        }
    }

    pub async fn get_average_strikes(&self) -> StringMessage {
        StringMessage {
            message: self.average.get().await.unwrap_or_default(),
        }
    }

    pub async fn get_game_history(&self, key: &str) -> Result<GameHistoryForm, ApiError> {
        let game = self.load_game(key).await?;
        Ok(renderer::history_form(&game)?)
    }

    async fn commit(&self, game: GameRecord, outcome: MoveOutcome) -> Result<GameForm, ApiError> {
        if !outcome.applied {
            return Ok(renderer::game_form(&game, outcome.message));
        }

        let score = outcome
            .finish
            .map(|finish| Score::new(game.user.clone(), finish, Utc::now().date_naive()));
        let game = self.store.commit_game(game, score).await.map_err(|e| {
            warn!(error = %e, "commit refused");
            ApiError::from(e)
        })?;

        if let Some(finish) = outcome.finish {
            info!(
                key = %game.key,
                user = %game.user,
                won = finish.won,
                points = finish.points,
                "game finished"
            );
        }
        Ok(renderer::game_form(&game, outcome.message))
    }

    async fn load_game(&self, key: &str) -> Result<GameRecord, ApiError> {
        self.store
            .get_game(key)
            .await
            .ok_or_else(|| ApiError::NotFound("Game not found!".to_string()))
    }

    async fn require_user(&self, name: &str) -> Result<User, ApiError> {
        self.store
            .get_user(name)
            .await
            .ok_or_else(|| ApiError::NotFound("A User with that name does not exist!".to_string()))
    }
}

/// `None` and `Some(0)` both mean "everything".
fn limit<T>(items: impl Iterator<Item = T>, num_results: Option<usize>) -> Vec<T> {
    match num_results {
        Some(n) if n > 0 => items.take(n).collect(),
        _ => items.collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::protocol::ErrorCode;
    use crate::core::store::MemoryStore;
    use crate::games::hangman::game::{CANCEL_MSG, HIT_MSG, INVALID_GUESS_MSG, MISS_MSG};
    use tokio::sync::mpsc;

    struct Harness {
        service: HangmanService,
        store: Arc<MemoryStore>,
        tasks: mpsc::UnboundedReceiver<Task>,
    }

    fn harness(words: &str) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let (queue, tasks) = TaskQueue::channel();
        let service = HangmanService::new(
            store.clone(),
            Arc::new(WordList::parse(words).unwrap()),
            queue,
            AverageCache::default(),
        );
        Harness {
            service,
            store,
            tasks,
        }
    }

    async fn player_game(h: &Harness, name: &str) -> GameForm {
        h.service.create_user(name.to_string(), None).await.unwrap();
        h.service.new_game(name).await.unwrap()
    }

    #[tokio::test]
    async fn create_user_rejects_duplicates() {
        let h = harness("cat");
        let msg = h.service.create_user("ada".into(), None).await.unwrap();
        assert_eq!(msg.message, "User ada created!");

        let err = h.service.create_user("ada".into(), None).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn new_game_needs_a_known_user() {
        let h = harness("cat");
        let err = h.service.new_game("nobody").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert_eq!(err.to_string(), "A User with that name does not exist!");
    }

    #[tokio::test]
    async fn new_game_starts_blank_and_schedules_average() {
        let mut h = harness("cat");
        let form = player_game(&h, "ada").await;

        assert_eq!(form.shown_string, "___");
        assert_eq!(form.strikes_remaining, 6);
        assert_eq!(form.message, "Good luck playing Hangman!");
        assert!(!form.game_over);
        assert_eq!(h.tasks.try_recv().unwrap(), Task::CacheAverageStrikes);
    }

    #[tokio::test]
    async fn winning_records_one_score_and_updates_user() {
        let h = harness("cat");
        let key = player_game(&h, "ada").await.urlsafe_key;

        let form = h.service.make_move(&key, "c").await.unwrap();
        assert_eq!(form.message, HIT_MSG);
        assert_eq!(form.shown_string, "C__");
        h.service.make_move(&key, "a").await.unwrap();
        let form = h.service.make_move(&key, "t").await.unwrap();

        assert_eq!(form.message, "You win!");
        assert!(form.game_over);
        assert_eq!(form.guessed_letters, "CAT");

        let scores = h.service.get_user_scores("ada").await.unwrap().items;
        assert_eq!(scores.len(), 1);
        assert!(scores[0].won);
        assert_eq!(scores[0].points, 6);

        let user = h.store.get_user("ada").await.unwrap();
        assert_eq!(user.games_played, 1);
        assert_eq!(user.career_points, 6);

        let err = h.service.make_move(&key, "z").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Forbidden);
        assert_eq!(h.service.get_scores().await.items.len(), 1);

        let form = h.service.get_game(&key).await.unwrap();
        assert_eq!(form.message, "This game is over!");
    }

    #[tokio::test]
    async fn seeded_services_pick_the_same_words() {
        async fn targets(seed: u64) -> Vec<String> {
            let mut h = harness("apple\nbanana\ncherry\ndate\nelder\nfig");
            h.service = h.service.with_rng(StdRng::seed_from_u64(seed));
            h.service.create_user("ada".into(), None).await.unwrap();
            let mut words = Vec::new();
            for _ in 0..8 {
                let key = h.service.new_game("ada").await.unwrap().urlsafe_key;
                let game = h.store.get_game(&key).await.unwrap();
                words.push(game.state.target_string().to_string());
            }
            words
        }

        let first = targets(11).await;
        assert_eq!(first, targets(11).await);
        assert!(first.iter().any(|w| w != &first[0]));
    }

    #[tokio::test]
    async fn soft_failures_do_not_commit() {
        let h = harness("cat");
        let key = player_game(&h, "ada").await.urlsafe_key;

        let form = h.service.make_move(&key, "ab").await.unwrap();
        assert_eq!(form.message, INVALID_GUESS_MSG);

        let stored = h.store.get_game(&key).await.unwrap();
        assert_eq!(stored.version, 0);
        assert!(stored.state.history().is_empty());
    }

    #[tokio::test]
    async fn losing_on_last_strike() {
        let h = harness("cat");
        let key = player_game(&h, "ada").await.urlsafe_key;

        for letter in ["b", "d", "e", "f", "g"] {
            let form = h.service.make_move(&key, letter).await.unwrap();
            assert_eq!(form.message, MISS_MSG);
        }
        let form = h.service.make_move(&key, "h").await.unwrap();
        assert_eq!(form.message, format!("{MISS_MSG} Game over!"));
        assert_eq!(form.strikes_remaining, 0);
        assert!(form.game_over);

        let scores = h.service.get_scores().await.items;
        assert_eq!(scores.len(), 1);
        assert!(!scores[0].won);
        assert_eq!(scores[0].points, 0);
    }

    #[tokio::test]
    async fn cancel_counts_as_a_loss() {
        let h = harness("cat");
        let key = player_game(&h, "ada").await.urlsafe_key;
        h.service.make_move(&key, "z").await.unwrap();

        let form = h.service.cancel_game(&key).await.unwrap();
        assert_eq!(form.message, CANCEL_MSG);
        assert_eq!(form.strikes_remaining, 0);
        assert!(form.game_over);

        let err = h.service.cancel_game(&key).await.unwrap_err();
        assert_eq!(err.to_string(), "Game already over! Cannot cancel!");

        let user = h.store.get_user("ada").await.unwrap();
        assert_eq!(user.games_played, 1);
        assert_eq!(user.career_points, 0);
    }

    #[tokio::test]
    async fn unknown_game_is_not_found() {
        let h = harness("cat");
        let err = h.service.make_move("missing", "a").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert_eq!(err.to_string(), "Game not found!");
    }

    #[tokio::test]
    async fn user_games_lists_only_active_games() {
        let h = harness("cat");
        let first = player_game(&h, "ada").await.urlsafe_key;
        let second = h.service.new_game("ada").await.unwrap().urlsafe_key;
        h.service.cancel_game(&first).await.unwrap();

        let games = h.service.get_user_games("ada").await.unwrap().items;
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].urlsafe_key, second);
        assert_eq!(games[0].message, "");
    }

    #[tokio::test]
    async fn high_scores_and_rankings_are_ordered() {
        let h = harness("cat");
        let ada = player_game(&h, "ada").await.urlsafe_key;
        for letter in ["c", "a", "t"] {
            h.service.make_move(&ada, letter).await.unwrap();
        }
        let bob = player_game(&h, "bob").await.urlsafe_key;
        h.service.make_move(&bob, "z").await.unwrap();
        for letter in ["c", "a", "t"] {
            h.service.make_move(&bob, letter).await.unwrap();
        }
        let cy = player_game(&h, "cy").await.urlsafe_key;
        h.service.cancel_game(&cy).await.unwrap();
        h.service.create_user("dee".into(), None).await.unwrap();

        let points: Vec<i32> = h
            .service
            .get_high_scores(None)
            .await
            .items
            .iter()
            .map(|s| s.points)
            .collect();
        assert_eq!(points, [6, 5, 0]);
        assert_eq!(h.service.get_high_scores(Some(2)).await.items.len(), 2);
        assert_eq!(h.service.get_high_scores(Some(0)).await.items.len(), 3);

        let names: Vec<String> = h
            .service
            .get_user_rankings(None)
            .await
            .items
            .into_iter()
            .map(|u| u.name)
            .collect();
        assert_eq!(names, ["ada", "bob", "dee", "cy"]);
    }

    #[tokio::test]
    async fn history_is_sorted_pretty_json() {
        let h = harness("cat");
        let key = player_game(&h, "ada").await.urlsafe_key;
        h.service.make_move(&key, "z").await.unwrap();

        let form = h.service.get_game_history(&key).await.unwrap();
        let expected = "[\n  {\n    \"guess\": \"Z\",\n    \"message\": \"The letter IS NOT in the secret word!\",\n    \"strikes_remaining\": 5\n  }\n]";
        assert_eq!(form.history, expected);
        assert_eq!(form.user_name, "ada");
        assert!(!form.game_over);
    }

    #[tokio::test]
    async fn average_reads_empty_until_cached() {
        let h = harness("cat");
        assert_eq!(h.service.get_average_strikes().await.message, "");
    }

    #[tokio::test]
    async fn handle_dispatches_by_method() {
        let h = harness("cat");
        let response = h
            .service
            .handle(RpcRequest::CreateUser {
                user_name: "ada".into(),
                email: Some("ada@example.com".into()),
            })
            .await
            .unwrap();
        assert_eq!(
            response,
            RpcResponse::Message(StringMessage {
                message: "User ada created!".into()
            })
        );

        let response = h.service.handle(RpcRequest::GetScores).await.unwrap();
        assert_eq!(response, RpcResponse::Scores(ScoreForms { items: vec![] }));
    }
}
