use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::models::Task;
use crate::storage::TaskStore;

/// Receives full snapshots after each mutation. Implementations must not block the
/// caller on a failed write and must never return the failure.
pub trait Persist: Send + Sync {
    fn persist(&self, tasks: Vec<Task>);
}

/// Writes on the caller's thread.
pub struct InlinePersister {
    store: TaskStore,
}

impl InlinePersister {
    pub fn new(store: TaskStore) -> Self {
        Self { store }
    }
}

impl Persist for InlinePersister {
    fn persist(&self, tasks: Vec<Task>) {
        self.store.save_reporting(&tasks);
    }
}

enum PersistMessage {
    Save(Vec<Task>),
    Flush(oneshot::Sender<()>),
}

/// Hands snapshots to a tokio worker. Queued snapshots are coalesced so only the
/// newest one is written.
pub struct BackgroundPersister {
    tx: mpsc::UnboundedSender<PersistMessage>,
}

impl BackgroundPersister {
    /// Spawns the worker on the current tokio runtime.
    pub fn spawn(store: TaskStore) -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(store, rx));
        Arc::new(Self { tx })
    }

    /// Resolves once every snapshot dispatched before this call has been written.
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(PersistMessage::Flush(ack_tx)).is_err() {
            log::warn!("persist worker gone; flush skipped");
            return;
        }
        let _ = ack_rx.await;
    }
}

impl Persist for BackgroundPersister {
    fn persist(&self, tasks: Vec<Task>) {
        if self.tx.send(PersistMessage::Save(tasks)).is_err() {
            log::warn!("persist worker gone; snapshot dropped");
        }
    }
}

async fn run_worker(store: TaskStore, mut rx: mpsc::UnboundedReceiver<PersistMessage>) {
    let mut pending_ack = Vec::new();
    while let Some(message) = rx.recv().await {
        let mut latest = None;
        absorb(message, &mut latest, &mut pending_ack);
        while let Ok(message) = rx.try_recv() {
            absorb(message, &mut latest, &mut pending_ack);
        }

        if let Some(tasks) = latest {
            write_snapshot(&store, tasks).await;
        }
        for ack in pending_ack.drain(..) {
            let _ = ack.send(());
        }
    }
    log::debug!("persist worker stopped");
}

fn absorb(
    message: PersistMessage,
    latest: &mut Option<Vec<Task>>,
    pending_ack: &mut Vec<oneshot::Sender<()>>,
) {
    match message {
        PersistMessage::Save(tasks) => *latest = Some(tasks),
        PersistMessage::Flush(ack) => pending_ack.push(ack),
    }
}

async fn write_snapshot(store: &TaskStore, tasks: Vec<Task>) {
    let store = store.clone();
    if let Err(error) = tokio::task::spawn_blocking(move || store.save_reporting(&tasks)).await {
        log::error!("persist task panicked: {error}");
    }
}
