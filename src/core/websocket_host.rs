/// Wires store, word list, task worker and RPC server into one running service.
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::ServerConfig;
use crate::core::service::HangmanService;
use crate::core::store::{GameStore, MemoryStore};
use crate::core::tasks::{AverageCache, LogMailer, TaskQueue, TaskWorker};
use crate::core::websocket::RpcServer;
use crate::games::hangman::WordList;

pub struct HangmanHost {
    server: RpcServer,
    worker: JoinHandle<()>,
}

impl HangmanHost {
    pub async fn bind(config: ServerConfig) -> anyhow::Result<Self> {
        let words = match &config.words_path {
            Some(path) => WordList::load(path)
                .with_context(|| format!("loading word list from {}", path.display()))?,
            None => WordList::builtin(),
        };
        info!(words = words.len(), "word list loaded");

        let store: Arc<dyn GameStore> = Arc::new(MemoryStore::new());
        let cache = AverageCache::default();
        let (queue, rx) = TaskQueue::channel();

        let worker = TaskWorker {
            store: Arc::clone(&store),
            cache: cache.clone(),
            mailer: Arc::new(LogMailer),
            mail_sender: config.mail_sender.clone(),
            average_interval: config.average_refresh_interval,
            reminder_interval: config.reminder_interval,
        };
        let worker = tokio::spawn(worker.run(rx));

        let service = Arc::new(HangmanService::new(store, Arc::new(words), queue, cache));
        let server = RpcServer::bind(&config.addr, service)
            .await
            .with_context(|| format!("binding {}", config.addr))?;

        Ok(Self { server, worker })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.server.local_addr()
    }

    /// Serves until the listener fails or ctrl-c is received.
    pub async fn run(self) -> anyhow::Result<()> {
        let result = tokio::select! {
            result = self.server.run() => result,
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                Ok(())
            }
        };
        self.worker.abort();
        result
    }
}
