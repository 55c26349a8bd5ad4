/// Background work that gameplay never waits on: the cached average of
/// strikes remaining and the unfinished-game reminder mails.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::core::store::{GameFilter, GameStore};

pub const REMINDER_SUBJECT: &str = "Reminder - Unfinished Game!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    CacheAverageStrikes,
    SendReminders,
}

/// Producer side of the in-process task queue. Enqueueing never blocks.
#[derive(Clone)]
pub struct TaskQueue {
    tx: mpsc::UnboundedSender<Task>,
}

impl TaskQueue {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Task>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn enqueue(&self, task: Task) {
        if self.tx.send(task).is_err() {
            warn!(?task, "task queue closed, dropping task");
        }
    }
}

/// Last computed average, possibly stale.
#[derive(Clone, Default)]
pub struct AverageCache {
    inner: Arc<RwLock<Option<String>>>,
}

impl AverageCache {
    pub async fn get(&self) -> Option<String> {
        self.inner.read().await.clone()
    }

    async fn set(&self, value: String) {
        *self.inner.write().await = Some(value);
    }
}

/// Recomputes the mean strikes remaining over active games. With no active
/// games the previous value is left in place.
pub async fn cache_average_strikes(store: &dyn GameStore, cache: &AverageCache) -> Option<f64> {
    let games = store.list_games(GameFilter::active()).await;
    if games.is_empty() {
        debug!("no active games, average left unchanged");
        return None;
    }

    let total: i64 = games
        .iter()
        .map(|g| i64::from(g.state.strikes_remaining()))
        .sum();
    let average = total as f64 / games.len() as f64;
    cache
        .set(format!("The average strikes remaining is {average:.2}"))
        .await;
    info!(games = games.len(), average, "cached average strikes remaining");
    Some(average)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// One reminder per user that has an email and at least one active game.
pub async fn collect_reminders(store: &dyn GameStore, sender: &str) -> Vec<Reminder> {
    let mut reminders = Vec::new();
    for user in store.list_users().await {
        let Some(email) = user.email.clone() else {
            continue;
        };
        let games = store.list_games(GameFilter::active_for(&user.name)).await;
        if games.is_empty() {
            continue;
        }

        let mut body = format!(
            "Hello {}, you have an unfinished Hangman game!\nKey(s) are:",
            user.name
        );
        for game in &games {
            body.push('\n');
            body.push_str(&game.key);
        }
        reminders.push(Reminder {
            from: sender.to_string(),
            to: email,
            subject: REMINDER_SUBJECT.to_string(),
            body,
        });
    }
    reminders
}

/// Outbound mail. Delivery itself belongs to the platform.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, reminder: &Reminder) -> anyhow::Result<()>;
}

/// Logs reminders instead of delivering them.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, reminder: &Reminder) -> anyhow::Result<()> {
        info!(
            from = %reminder.from,
            to = %reminder.to,
            subject = %reminder.subject,
            body = %reminder.body,
            "reminder mail"
        );
        Ok(())
    }
}

/// Consumes the task queue and fires the periodic jobs.
pub struct TaskWorker {
    pub store: Arc<dyn GameStore>,
    pub cache: AverageCache,
    pub mailer: Arc<dyn Mailer>,
    pub mail_sender: String,
    pub average_interval: Duration,
    pub reminder_interval: Duration,
}

impl TaskWorker {
    pub async fn run(self, mut rx: mpsc::UnboundedReceiver<Task>) {
        let start = Instant::now();
        let mut average_tick = interval_at(start + self.average_interval, self.average_interval);
        let mut reminder_tick = interval_at(start + self.reminder_interval, self.reminder_interval);
        average_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        reminder_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let task = tokio::select! {
                task = rx.recv() => match task {
                    Some(task) => task,
                    None => break,
                },
                _ = average_tick.tick() => Task::CacheAverageStrikes,
                _ = reminder_tick.tick() => Task::SendReminders,
            };
            for task in coalesce(task, &mut rx) {
                self.process(task).await;
            }
        }
        debug!("task queue closed, worker exiting");
    }

    pub async fn process(&self, task: Task) {
        match task {
            Task::CacheAverageStrikes => {
                cache_average_strikes(self.store.as_ref(), &self.cache).await;
            }
            Task::SendReminders => {
                let reminders = collect_reminders(self.store.as_ref(), &self.mail_sender).await;
                info!(count = reminders.len(), "sending reminders");
                for reminder in &reminders {
                    if let Err(e) = self.mailer.send(reminder).await {
                        warn!(to = %reminder.to, error = %e, "failed to send reminder");
                    }
                }
            }
        }
    }
}

/// Drains whatever is already queued behind `first`, keeping one of each task
/// in arrival order.
fn coalesce(first: Task, rx: &mut mpsc::UnboundedReceiver<Task>) -> Vec<Task> {
    let mut batch = vec![first];
    while let Ok(task) = rx.try_recv() {
        if !batch.contains(&task) {
            batch.push(task);
        }
    }
    batch
}
