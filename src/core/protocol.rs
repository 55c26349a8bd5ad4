/// Wire types for the JSON-over-WebSocket RPC surface.
use serde::{Deserialize, Serialize};

use crate::core::model::{Score, User};

/// One call from a client. Serialized as `{"method": "...", "params": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "snake_case")]
pub enum RpcRequest {
    CreateUser {
        user_name: String,
        #[serde(default)]
        email: Option<String>,
    },
    NewGame {
        user_name: String,
    },
    GetGame {
        urlsafe_game_key: String,
    },
    MakeMove {
        urlsafe_game_key: String,
        guess: String,
    },
    CancelGame {
        urlsafe_game_key: String,
    },
    GetScores,
    GetUserScores {
        user_name: String,
    },
    GetUserGames {
        user_name: String,
    },
    GetHighScores {
        #[serde(default)]
        num_results: Option<usize>,
    },
    GetUserRankings {
        #[serde(default)]
        num_results: Option<usize>,
    },
    GetAverageStrikesRemaining,
    GetGameHistory {
        urlsafe_game_key: String,
    },
}

impl RpcRequest {
    pub fn method(&self) -> &'static str {
        match self {
            RpcRequest::CreateUser { .. } => "create_user",
            RpcRequest::NewGame { .. } => "new_game",
            RpcRequest::GetGame { .. } => "get_game",
            RpcRequest::MakeMove { .. } => "make_move",
            RpcRequest::CancelGame { .. } => "cancel_game",
            RpcRequest::GetScores => "get_scores",
            RpcRequest::GetUserScores { .. } => "get_user_scores",
            RpcRequest::GetUserGames { .. } => "get_user_games",
            RpcRequest::GetHighScores { .. } => "get_high_scores",
            RpcRequest::GetUserRankings { .. } => "get_user_rankings",
            RpcRequest::GetAverageStrikesRemaining => "get_average_strikes_remaining",
            RpcRequest::GetGameHistory { .. } => "get_game_history",
        }
    }
}

/// `{"id": n, "method": "...", "params": {...}}`: the call sits beside the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcEnvelope {
    pub id: u64,
    #[serde(flatten)]
    pub request: RpcRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RpcResponse {
    Message(StringMessage),
    Game(GameForm),
    Games(GameForms),
    Scores(ScoreForms),
    Users(UserForms),
    History(GameHistoryForm),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    BadRequest,
    NotFound,
    Conflict,
    Forbidden,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

/// Reply to one envelope; exactly one of `result` / `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcReply {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<RpcResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl RpcReply {
    pub fn ok(id: u64, result: RpcResponse) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn err(id: u64, error: ErrorBody) -> Self {
        Self {
            id,
            result: None,
            error: Some(error),
        }
    }

    pub fn into_result(self) -> Result<RpcResponse, ErrorBody> {
        match (self.result, self.error) {
            (_, Some(error)) => Err(error),
            (Some(result), None) => Ok(result),
            (None, None) => Err(ErrorBody {
                code: ErrorCode::Internal,
                message: "reply carried neither result nor error".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringMessage {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameForm {
    pub urlsafe_key: String,
    pub strikes_remaining: i32,
    pub shown_string: String,
    pub guessed_letters: String,
    pub game_over: bool,
    pub message: String,
    pub user_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameForms {
    pub items: Vec<GameForm>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreForm {
    pub user_name: String,
    pub date: String,
    pub won: bool,
    pub points: i32,
}

impl From<&Score> for ScoreForm {
    fn from(score: &Score) -> Self {
        Self {
            user_name: score.user.clone(),
            date: score.date.format("%Y-%m-%d").to_string(),
            won: score.won,
            points: score.points,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreForms {
    pub items: Vec<ScoreForm>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserForm {
    pub name: String,
    pub games_played: u32,
    pub career_points: i64,
    pub performance: f64,
}

impl From<&User> for UserForm {
    fn from(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            games_played: user.games_played,
            career_points: user.career_points,
            performance: user.performance(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserForms {
    pub items: Vec<UserForm>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameHistoryForm {
    pub urlsafe_key: String,
    pub game_over: bool,
    pub user_name: String,
    /// Pretty-printed JSON array with sorted keys.
    pub history: String,
}
