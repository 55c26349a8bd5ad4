pub mod core {
    pub mod error;
    pub mod model;
    pub mod protocol;
    pub mod service;
    pub mod store;
    pub mod tasks;
    pub mod websocket;
    pub mod websocket_host;
}

pub mod client {
    pub mod websocket_client;
}

pub mod cli;
pub mod config;
pub mod games;

// Re-export for convenience
pub use crate::client::websocket_client::RpcClient;
pub use crate::config::ServerConfig;
pub use crate::core::service::HangmanService;
pub use crate::core::websocket_host::HangmanHost;
pub use crate::games::hangman::{HangmanState, WordList};
