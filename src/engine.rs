use crate::db::Database;
use crate::errors::{EngineError, EngineResult};
use crate::models::{
    ActivityCompleted, CrmUser, EngineSettings, Notification, NotificationKind,
    INACTIVITY_ALERT_ID,
};
use crate::sources::{self, CrmApi};
use crate::{canonical, feed};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;

/// Read-model published to consumers after every state change.
#[derive(Debug, Clone, Default)]
pub struct FeedSnapshot {
    pub notifications: Vec<Notification>,
    pub loading: bool,
}

enum Command {
    Refresh {
        done: Option<oneshot::Sender<()>>,
    },
    SetUser {
        user: Option<CrmUser>,
        done: oneshot::Sender<()>,
    },
    ActivityCompleted(ActivityCompleted),
    MarkAsRead {
        id: String,
        done: oneshot::Sender<()>,
    },
    MarkAllAsRead {
        done: oneshot::Sender<()>,
    },
    Archive {
        id: String,
        done: oneshot::Sender<()>,
    },
    Remove {
        id: String,
        done: oneshot::Sender<()>,
    },
    FetchSettled {
        generation: u64,
        fresh: Vec<Notification>,
    },
    Shutdown,
}

/// Handle to the notification engine. Cloneable; all handles talk to one
/// single-writer task that serializes timer ticks, external signals, user
/// mutations and fetch completions through one queue, so at most one
/// reconciliation-and-persist sequence is ever in flight.
#[derive(Clone)]
pub struct NotificationCenter {
    commands: mpsc::Sender<Command>,
    snapshot: watch::Receiver<FeedSnapshot>,
}

impl NotificationCenter {
    /// Starts the engine: publishes the persisted prior feed immediately,
    /// queues the on-mount refresh, subscribes to the injected
    /// activity-completed channel, and begins the interval refresh loop.
    pub fn spawn(
        db: Arc<Database>,
        api: Arc<dyn CrmApi>,
        user: Option<CrmUser>,
        signals: mpsc::Receiver<ActivityCompleted>,
    ) -> EngineResult<Self> {
        let settings = db.settings()?;
        let prior = db.load_feed()?;

        let (snapshot_tx, snapshot_rx) = watch::channel(FeedSnapshot {
            notifications: prior.clone(),
            loading: true,
        });
        let (command_tx, command_rx) = mpsc::channel(64);

        let task = EngineTask {
            db,
            api,
            settings: settings.clone(),
            user,
            feed: prior,
            generation: 0,
            fetch_in_flight: false,
            refresh_pending: false,
            waiters_current: Vec::new(),
            waiters_next: Vec::new(),
            commands: command_tx.clone(),
            snapshot: snapshot_tx,
        };
        tokio::spawn(task.run(command_rx));

        if command_tx.try_send(Command::Refresh { done: None }).is_err() {
            return Err(stopped());
        }

        let ticker_commands = command_tx.clone();
        let period = Duration::from_secs(settings.refresh_interval_secs.max(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                if ticker_commands
                    .send(Command::Refresh { done: None })
                    .await
                    .is_err()
                {
                    break;
                }
            }
        });

        let signal_commands = command_tx.clone();
        tokio::spawn(async move {
            let mut signals = signals;
            while let Some(signal) = signals.recv().await {
                if signal_commands
                    .send(Command::ActivityCompleted(signal))
                    .await
                    .is_err()
                {
                    break;
                }
            }
        });

        Ok(Self {
            commands: command_tx,
            snapshot: snapshot_rx,
        })
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.snapshot.borrow().notifications.clone()
    }

    pub fn unread_count(&self) -> usize {
        feed::unread_count(&self.snapshot.borrow().notifications)
    }

    pub fn loading(&self) -> bool {
        self.snapshot.borrow().loading
    }

    /// Watch receiver of feed snapshots, for consumers that want change
    /// notifications instead of polling.
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.snapshot.clone()
    }

    /// Manually triggers a full fetch/reconcile cycle and waits for it to
    /// settle. A request arriving while a cycle is in flight coalesces into
    /// exactly one follow-up cycle.
    pub async fn refresh_notifications(&self) -> EngineResult<()> {
        let (done, ack) = oneshot::channel();
        self.send(Command::Refresh { done: Some(done) }).await?;
        ack.await.map_err(|_| stopped())
    }

    /// Switches the active identity and triggers a refresh. Results of any
    /// fetch started for the previous identity are discarded.
    pub async fn set_user(&self, user: Option<CrmUser>) -> EngineResult<()> {
        self.send_wait(move |done| Command::SetUser { user, done })
            .await
    }

    pub async fn mark_as_read(&self, id: &str) -> EngineResult<()> {
        let id = id.to_string();
        self.send_wait(move |done| Command::MarkAsRead { id, done })
            .await
    }

    pub async fn mark_all_as_read(&self) -> EngineResult<()> {
        self.send_wait(|done| Command::MarkAllAsRead { done }).await
    }

    /// Archives a record (and marks it read). Refuses the inactivity alert:
    /// that record is not archivable.
    pub async fn archive_notification(&self, id: &str) -> EngineResult<()> {
        let id = id.to_string();
        self.send_wait(move |done| Command::Archive { id, done })
            .await
    }

    pub async fn remove_notification(&self, id: &str) -> EngineResult<()> {
        let id = id.to_string();
        self.send_wait(move |done| Command::Remove { id, done })
            .await
    }

    /// Stops the engine task. The ticker and signal subscriber tasks end on
    /// their next send.
    pub async fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown).await;
    }

    async fn send(&self, command: Command) -> EngineResult<()> {
        self.commands.send(command).await.map_err(|_| stopped())
    }

    async fn send_wait(
        &self,
        make: impl FnOnce(oneshot::Sender<()>) -> Command,
    ) -> EngineResult<()> {
        let (done, ack) = oneshot::channel();
        self.send(make(done)).await?;
        ack.await.map_err(|_| stopped())
    }
}

fn stopped() -> EngineError {
    EngineError::EngineStopped("notification engine task is gone".to_string())
}

struct EngineTask {
    db: Arc<Database>,
    api: Arc<dyn CrmApi>,
    settings: EngineSettings,
    user: Option<CrmUser>,
    feed: Vec<Notification>,
    generation: u64,
    fetch_in_flight: bool,
    refresh_pending: bool,
    waiters_current: Vec<oneshot::Sender<()>>,
    waiters_next: Vec<oneshot::Sender<()>>,
    commands: mpsc::Sender<Command>,
    snapshot: watch::Sender<FeedSnapshot>,
}

impl EngineTask {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        while let Some(command) = commands.recv().await {
            match command {
                Command::Refresh { done } => self.start_refresh(done),
                Command::SetUser { user, done } => {
                    self.user = user;
                    self.generation += 1;
                    let _ = done.send(());
                    self.start_refresh(None);
                }
                Command::ActivityCompleted(signal) => self.inject_activity(signal),
                Command::MarkAsRead { id, done } => {
                    self.mark_as_read(&id);
                    let _ = done.send(());
                }
                Command::MarkAllAsRead { done } => {
                    self.mark_all_as_read();
                    let _ = done.send(());
                }
                Command::Archive { id, done } => {
                    self.archive(&id);
                    let _ = done.send(());
                }
                Command::Remove { id, done } => {
                    self.remove(&id);
                    let _ = done.send(());
                }
                Command::FetchSettled { generation, fresh } => {
                    self.finish_refresh(generation, fresh)
                }
                Command::Shutdown => break,
            }
        }
    }

    fn start_refresh(&mut self, done: Option<oneshot::Sender<()>>) {
        if self.fetch_in_flight {
            self.refresh_pending = true;
            if let Some(done) = done {
                self.waiters_next.push(done);
            }
            return;
        }
        if let Some(done) = done {
            self.waiters_current.push(done);
        }
        self.waiters_current.append(&mut self.waiters_next);
        self.fetch_in_flight = true;
        self.publish();

        let api = self.api.clone();
        let user = self.user.clone();
        let settings = self.settings.clone();
        let commands = self.commands.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            let fresh = fetch_fresh_feed(api.as_ref(), user.as_ref(), &settings).await;
            let _ = commands
                .send(Command::FetchSettled { generation, fresh })
                .await;
        });
    }

    fn finish_refresh(&mut self, generation: u64, fresh: Vec<Notification>) {
        self.fetch_in_flight = false;
        if generation != self.generation {
            tracing::debug!("discarding fetch results for a superseded identity");
            self.restart_if_pending();
            return;
        }

        // Reconcile against the feed as it stands right now, not a snapshot
        // taken at fetch-start, so mutations applied while the fetch was in
        // flight survive this cycle.
        self.feed = feed::reconcile(fresh, &self.feed);
        self.persist();
        self.publish();
        for waiter in self.waiters_current.drain(..) {
            let _ = waiter.send(());
        }
        self.restart_if_pending();
    }

    fn restart_if_pending(&mut self) {
        if self.refresh_pending {
            self.refresh_pending = false;
            self.start_refresh(None);
        }
    }

    /// Prepends a synthesized activity record, idempotent by id. This path
    /// bypasses reconciliation; the record has no backing source fetch.
    fn inject_activity(&mut self, signal: ActivityCompleted) {
        let id = signal.feed_id();
        if self.feed.iter().any(|record| record.id == id) {
            return;
        }
        let record = Notification {
            id,
            kind: NotificationKind::Activity,
            title: signal.title,
            message: "Activity completed.".to_string(),
            read: false,
            archived: false,
            created_at: signal.completed_at,
            action_url: None,
            action_label: None,
            metadata: None,
        };
        self.feed.insert(0, record);
        self.persist();
        self.publish();
    }

    fn mark_as_read(&mut self, id: &str) {
        if let Some(record) = self.feed.iter_mut().find(|record| record.id == id) {
            record.read = true;
            self.persist();
            self.publish();
        }
    }

    fn mark_all_as_read(&mut self) {
        for record in &mut self.feed {
            record.read = true;
        }
        self.persist();
        self.publish();
    }

    fn archive(&mut self, id: &str) {
        if id == INACTIVITY_ALERT_ID {
            return;
        }
        if let Some(record) = self.feed.iter_mut().find(|record| record.id == id) {
            record.archived = true;
            record.read = true;
            self.persist();
            self.publish();
        }
    }

    fn remove(&mut self, id: &str) {
        let before = self.feed.len();
        self.feed.retain(|record| record.id != id);
        if self.feed.len() != before {
            self.persist();
            self.publish();
        }
    }

    fn persist(&self) {
        if let Err(error) = self.db.save_feed(&self.feed) {
            tracing::warn!(error = %error, "failed to persist notification feed");
        }
    }

    fn publish(&self) {
        let _ = self.snapshot.send(FeedSnapshot {
            notifications: self.feed.clone(),
            loading: self.fetch_in_flight,
        });
    }
}

/// One full fetch -> canonicalize -> aggregate pass. With no active user every
/// source contributes zero records.
async fn fetch_fresh_feed(
    api: &dyn CrmApi,
    user: Option<&CrmUser>,
    settings: &EngineSettings,
) -> Vec<Notification> {
    let Some(user) = user else {
        return Vec::new();
    };
    let now = Utc::now();
    let raw = sources::collect_raw_records(api, user, now, settings).await;
    tracing::debug!(count = raw.len(), "aggregation pass collected raw records");
    let canonicalized = raw
        .into_iter()
        .map(|record| canonical::canonicalize(record, now))
        .collect();
    feed::aggregate(canonicalized)
}
