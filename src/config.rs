use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the game server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on. Default: "0.0.0.0:4000".
    pub addr: String,
    /// Word file, one word per line. Default: built-in list.
    pub words_path: Option<PathBuf>,
    /// How often unfinished-game reminders go out. Default: 1h.
    pub reminder_interval: Duration,
    /// How often the average strikes cache is refreshed on its own, on top
    /// of the refresh queued by every new game. Default: 5m.
    pub average_refresh_interval: Duration,
    /// From address on reminder mails. Default: "noreply@hangman.local".
    pub mail_sender: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:4000".to_string(),
            words_path: None,
            reminder_interval: Duration::from_secs(60 * 60),
            average_refresh_interval: Duration::from_secs(5 * 60),
            mail_sender: "noreply@hangman.local".to_string(),
        }
    }
}
