use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::client::websocket_client::RpcClient;
use crate::config::ServerConfig;
use crate::core::protocol::{RpcRequest, RpcResponse};
use crate::core::websocket_host::HangmanHost;
use crate::games::hangman::renderer::render_board;

#[derive(Parser)]
#[command(name = "hangman")]
#[command(about = "🎩 Hangman game server and command line client")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the game server
    Serve(ServeArgs),
    /// Call the server
    #[command(flatten)]
    Client(ClientCommand),
}

#[derive(Args)]
pub struct ServeArgs {
    /// Address to bind the server to
    #[arg(short, long, default_value = "0.0.0.0:4000")]
    pub addr: String,

    /// Word list file, one word per line (built-in list if omitted)
    #[arg(short, long)]
    pub words: Option<PathBuf>,

    /// Seconds between unfinished-game reminder runs
    #[arg(long, default_value_t = 3600, value_parser = clap::value_parser!(u64).range(1..))]
    pub reminder_interval_secs: u64,

    /// Seconds between background refreshes of the average strikes cache
    #[arg(long, default_value_t = 300, value_parser = clap::value_parser!(u64).range(1..))]
    pub average_interval_secs: u64,

    /// From address on reminder mails
    #[arg(long, default_value = "noreply@hangman.local")]
    pub mail_sender: String,
}

impl From<ServeArgs> for ServerConfig {
    fn from(args: ServeArgs) -> Self {
        Self {
            addr: args.addr,
            words_path: args.words,
            reminder_interval: Duration::from_secs(args.reminder_interval_secs),
            average_refresh_interval: Duration::from_secs(args.average_interval_secs),
            mail_sender: args.mail_sender,
        }
    }
}

#[derive(Args)]
pub struct Target {
    /// Server address (e.g. "127.0.0.1:4000")
    #[arg(long, default_value = "127.0.0.1:4000")]
    pub addr: String,
}

#[derive(Subcommand)]
pub enum ClientCommand {
    /// Register a player
    CreateUser {
        user_name: String,
        #[arg(short, long)]
        email: Option<String>,
        #[command(flatten)]
        target: Target,
    },
    /// Start a game for a player
    NewGame {
        user_name: String,
        #[command(flatten)]
        target: Target,
    },
    /// Show a game
    Show {
        game_key: String,
        #[command(flatten)]
        target: Target,
    },
    /// Guess a letter
    Guess {
        game_key: String,
        letter: String,
        #[command(flatten)]
        target: Target,
    },
    /// Forfeit a game
    Cancel {
        game_key: String,
        #[command(flatten)]
        target: Target,
    },
    /// Move history of a game
    History {
        game_key: String,
        #[command(flatten)]
        target: Target,
    },
    /// All scores, or one player's
    Scores {
        #[arg(short, long)]
        user: Option<String>,
        #[command(flatten)]
        target: Target,
    },
    /// A player's unfinished games
    Games {
        user_name: String,
        #[command(flatten)]
        target: Target,
    },
    /// Best scores
    HighScores {
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        #[command(flatten)]
        target: Target,
    },
    /// Player leaderboard
    Rankings {
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        #[command(flatten)]
        target: Target,
    },
    /// Cached average strikes remaining over active games
    AverageStrikes {
        #[command(flatten)]
        target: Target,
    },
}

impl ClientCommand {
    pub fn into_request(self) -> (String, RpcRequest) {
        match self {
            ClientCommand::CreateUser {
                user_name,
                email,
                target,
            } => (target.addr, RpcRequest::CreateUser { user_name, email }),
            ClientCommand::NewGame { user_name, target } => {
                (target.addr, RpcRequest::NewGame { user_name })
            }
            ClientCommand::Show { game_key, target } => (
                target.addr,
                RpcRequest::GetGame {
                    urlsafe_game_key: game_key,
                },
            ),
            ClientCommand::Guess {
                game_key,
                letter,
                target,
            } => (
                target.addr,
                RpcRequest::MakeMove {
                    urlsafe_game_key: game_key,
                    guess: letter,
                },
            ),
            ClientCommand::Cancel { game_key, target } => (
                target.addr,
                RpcRequest::CancelGame {
                    urlsafe_game_key: game_key,
                },
            ),
            ClientCommand::History { game_key, target } => (
                target.addr,
                RpcRequest::GetGameHistory {
                    urlsafe_game_key: game_key,
                },
            ),
            ClientCommand::Scores { user, target } => {
                let request = match user {
                    Some(user_name) => RpcRequest::GetUserScores { user_name },
                    None => RpcRequest::GetScores,
                };
                (target.addr, request)
            }
            ClientCommand::Games { user_name, target } => {
                (target.addr, RpcRequest::GetUserGames { user_name })
            }
            ClientCommand::HighScores { limit, target } => (
                target.addr,
                RpcRequest::GetHighScores { num_results: limit },
            ),
            ClientCommand::Rankings { limit, target } => (
                target.addr,
                RpcRequest::GetUserRankings { num_results: limit },
            ),
            ClientCommand::AverageStrikes { target } => {
                (target.addr, RpcRequest::GetAverageStrikesRemaining)
            }
        }
    }
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => {
            let host = HangmanHost::bind(args.into()).await?;
            println!("🚀 Hangman server running on ws://{}", host.local_addr()?);
            host.run().await
        }
        Commands::Client(command) => {
            let (addr, request) = command.into_request();
            let mut client = RpcClient::connect(&addr).await?;
            let reply = client.call(request).await?;
            let _ = client.close().await;

            match reply.into_result() {
                Ok(RpcResponse::Game(form)) => print!("{}", render_board(&form)),
                Ok(RpcResponse::History(form)) => println!("{}", form.history),
                Ok(RpcResponse::Message(msg)) => println!("{}", msg.message),
                Ok(other) => println!("{}", serde_json::to_string_pretty(&other)?),
                Err(error) => {
                    eprintln!("❌ {:?}: {}", error.code, error.message);
                    std::process::exit(1);
                }
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn guess_maps_to_make_move() {
        let cli = Cli::try_parse_from(["hangman", "guess", "abc", "e", "--addr", "10.0.0.1:4000"])
            .unwrap();
        let Commands::Client(command) = cli.command else {
            panic!("expected a client command");
        };
        let (addr, request) = command.into_request();
        assert_eq!(addr, "10.0.0.1:4000");
        assert_eq!(
            request,
            RpcRequest::MakeMove {
                urlsafe_game_key: "abc".into(),
                guess: "e".into()
            }
        );
    }

    #[test]
    fn client_commands_take_addr() {
        let cli = Cli::try_parse_from(["hangman", "scores"]).unwrap();
        let Commands::Client(command) = cli.command else {
            panic!("expected a client command");
        };
        assert_eq!(command.into_request(), ("127.0.0.1:4000".to_string(), RpcRequest::GetScores));

        let cli = Cli::try_parse_from(["hangman", "scores", "--addr", "10.0.0.1:4000"]).unwrap();
        let Commands::Client(command) = cli.command else {
            panic!("expected a client command");
        };
        assert_eq!(command.into_request(), ("10.0.0.1:4000".to_string(), RpcRequest::GetScores));

        assert!(Cli::try_parse_from(["hangman", "scores", "--server", "10.0.0.1:4000"]).is_err());
    }

    #[test]
    fn serve_args_become_config() {
        let cli = Cli::try_parse_from(["hangman", "serve", "--addr", "127.0.0.1:0"]).unwrap();
        let Commands::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        let config = ServerConfig::from(args);
        assert_eq!(config.addr, "127.0.0.1:0");
        assert_eq!(config.reminder_interval, Duration::from_secs(3600));
        assert!(config.words_path.is_none());
    }

    #[test]
    fn zero_intervals_are_rejected() {
        assert!(Cli::try_parse_from(["hangman", "serve", "--reminder-interval-secs", "0"]).is_err());
    }
}
