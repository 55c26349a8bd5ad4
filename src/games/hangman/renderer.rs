/// Presentation of hangman games: RPC forms and the terminal board.
use crate::core::model::GameRecord;
use crate::core::protocol::{GameForm, GameHistoryForm};

pub fn game_form(game: &GameRecord, message: impl Into<String>) -> GameForm {
    GameForm {
        urlsafe_key: game.key.clone(),
        strikes_remaining: game.state.strikes_remaining(),
        shown_string: game.state.shown_string().to_string(),
        guessed_letters: game.state.guessed_letters().iter().collect(),
        game_over: game.state.game_over(),
        message: message.into(),
        user_name: game.user.clone(),
    }
}

/// History as indented JSON. Going through `Value` sorts the keys.
pub fn history_form(game: &GameRecord) -> Result<GameHistoryForm, serde_json::Error> {
    let value = serde_json::to_value(game.state.history())?;
    Ok(GameHistoryForm {
        urlsafe_key: game.key.clone(),
        game_over: game.state.game_over(),
        user_name: game.user.clone(),
        history: serde_json::to_string_pretty(&value)?,
    })
}

/// Plain-text board for the command line client.
pub fn render_board(form: &GameForm) -> String {
    let spaced: Vec<String> = form.shown_string.chars().map(String::from).collect();
    let hearts = "❤".repeat(form.strikes_remaining.max(0) as usize);

    let mut lines = vec![
        format!("🎩 HANGMAN - Player: {}", form.user_name),
        "══════════════════════════════════".to_string(),
        format!("Word: {}", spaced.join(" ")),
        format!("Strikes left: {} {}", form.strikes_remaining, hearts),
    ];
    if !form.guessed_letters.is_empty() {
        lines.push(format!("Guessed: {}", form.guessed_letters));
    }
    lines.push(String::new());
    lines.push(format!("📢 {}", form.message));
    if form.game_over {
        lines.push("🏁 Game over!".to_string());
    } else {
        lines.push(format!("🔑 {}", form.urlsafe_key));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
