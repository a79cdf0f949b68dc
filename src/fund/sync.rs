//! Sync coordinator: the single owner of the in-memory ledger.
//!
//! The local store bootstraps state and acts as a write-through cache; the
//! remote channel, when attached, drives state through its push stream. Each
//! remote push replaces the ledger wholesale (last writer wins).

use crate::cloud::RemoteChannel;
use crate::error::{FundError, FundWarnCode};
use crate::fund::ledger::{Applied, LedgerOp, Stats};
use crate::fund::migrate::migrate_document;
use crate::fund::model::{LedgerDocument, LedgerSnapshot};
use crate::fund::store::LedgerStore;
use crate::fund::subscription::Subscription;
use crate::fund::util::now_iso8601;
use crate::fund::warn::{self, WarnEvent};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncState {
    /// The local snapshot has not been applied yet.
    Loading,
    /// Driven by the local store and cross-process change notifications.
    LocalOnly,
    /// Driven by the remote push stream.
    Live,
}

impl SyncState {
    pub fn as_str(self) -> &'static str {
        match self {
            SyncState::Loading => "loading",
            SyncState::LocalOnly => "local-only",
            SyncState::Live => "live",
        }
    }
}

/// Receives every published snapshot. Listeners run on the publishing
/// thread and must not call back into the coordinator.
pub type Listener = Box<dyn Fn(&LedgerSnapshot) + Send + Sync + 'static>;

#[derive(Debug, Clone, Copy)]
struct Status {
    state: SyncState,
    synchronized: bool,
}

struct Shared {
    store: Arc<dyn LedgerStore>,
    remote: Arc<dyn RemoteChannel>,
    // Held across apply + publish so listeners see snapshots in order.
    sequencer: Mutex<()>,
    current: Mutex<Arc<LedgerSnapshot>>,
    listeners: Mutex<BTreeMap<u64, Arc<Listener>>>,
    next_listener: AtomicU64,
    status: Mutex<Status>,
    status_changed: Condvar,
    detached: AtomicBool,
    attachments: Mutex<Vec<Subscription>>,
    writer: Mutex<Option<RemoteWriter>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    fn is_detached(&self) -> bool {
        self.detached.load(Ordering::SeqCst)
    }

    fn status(&self) -> Status {
        *lock(&self.status)
    }

    fn set_status(&self, state: SyncState, synchronized: bool) {
        *lock(&self.status) = Status {
            state,
            synchronized,
        };
        self.status_changed.notify_all();
    }

    /// Swap in `snapshot` and hand it to every listener. Callers hold the
    /// sequencer.
    fn publish(&self, snapshot: LedgerSnapshot) -> Arc<LedgerSnapshot> {
        let snapshot = Arc::new(snapshot);
        *lock(&self.current) = Arc::clone(&snapshot);
        let listeners: Vec<Arc<Listener>> = lock(&self.listeners).values().cloned().collect();
        let published: &LedgerSnapshot = &snapshot;
        for listener in listeners {
            listener(published);
        }
        snapshot
    }

    fn on_remote_document(&self, doc: LedgerDocument) {
        let _seq = lock(&self.sequencer);
        if self.is_detached() {
            return;
        }
        let mut snapshot = migrate_document(doc);
        if snapshot.last_updated.is_none() {
            snapshot.last_updated = Some(now_iso8601());
        }
        self.store.write(&snapshot);
        self.publish(snapshot);
        self.set_status(SyncState::Live, true);
        log::debug!("applied remote ledger push");
    }

    fn on_store_changed(&self) {
        let _seq = lock(&self.sequencer);
        if self.is_detached() {
            return;
        }
        // Absent or corrupt content keeps the last known state.
        let Some(doc) = self.store.read() else {
            return;
        };
        self.publish(migrate_document(doc));
        log::debug!("reloaded ledger after external change");
    }
}

/// Single background writer for remote overwrites. Only the newest pending
/// snapshot is written; older ones queued behind it are skipped.
struct RemoteWriter {
    tx: Option<Sender<Arc<LedgerSnapshot>>>,
    handle: Option<JoinHandle<()>>,
}

impl RemoteWriter {
    fn spawn(remote: Arc<dyn RemoteChannel>) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel::<Arc<LedgerSnapshot>>();
        let handle = thread::Builder::new()
            .name("fund-remote-writer".to_string())
            .spawn(move || {
                while let Ok(mut snapshot) = rx.recv() {
                    while let Ok(newer) = rx.try_recv() {
                        snapshot = newer;
                    }
                    if let Err(err) = remote.write(&snapshot) {
                        warn::emit(WarnEvent {
                            code: FundWarnCode::RemoteWriteFailed,
                            stage: "remote",
                            action: "write-ledger",
                            reason: "write-failed",
                            err: &format!("{err:#}"),
                        });
                    }
                }
            })?;
        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
        })
    }

    fn submit(&self, snapshot: Arc<LedgerSnapshot>) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(snapshot);
        }
    }

    /// Close the queue and wait for the last pending write.
    fn finish(mut self) {
        drop(self.tx.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Owns the ledger for one session: bootstrap, remote attachment,
/// optimistic local mutation and teardown.
pub struct SyncCoordinator {
    shared: Arc<Shared>,
}

impl SyncCoordinator {
    pub fn new(store: Arc<dyn LedgerStore>, remote: Arc<dyn RemoteChannel>) -> Self {
        Self {
            shared: Arc::new(Shared {
                store,
                remote,
                sequencer: Mutex::new(()),
                current: Mutex::new(Arc::new(LedgerSnapshot::default())),
                listeners: Mutex::new(BTreeMap::new()),
                next_listener: AtomicU64::new(0),
                status: Mutex::new(Status {
                    state: SyncState::Loading,
                    synchronized: false,
                }),
                status_changed: Condvar::new(),
                detached: AtomicBool::new(false),
                attachments: Mutex::new(Vec::new()),
                writer: Mutex::new(None),
            }),
        }
    }

    /// Publish the stored ledger, then attach to the remote or, failing
    /// that, to cross-process store changes. Calling it again is a no-op.
    pub fn start(&self) -> Result<(), FundError> {
        let shared = &self.shared;
        {
            let _seq = lock(&shared.sequencer);
            if shared.is_detached() {
                return Err(FundError::Detached);
            }
            if shared.status().state != SyncState::Loading {
                return Ok(());
            }
            let snapshot = shared
                .store
                .read()
                .map(migrate_document)
                .unwrap_or_default();
            shared.publish(snapshot);
            shared.set_status(SyncState::LocalOnly, !shared.remote.configured());
        }

        if shared.remote.configured() && self.attach_remote() {
            return Ok(());
        }
        self.attach_store_watch();
        let mut status = lock(&shared.status);
        status.synchronized = true;
        shared.status_changed.notify_all();
        Ok(())
    }

    fn attach_remote(&self) -> bool {
        let shared = &self.shared;
        let weak = Arc::downgrade(shared);
        let subscribed = shared.remote.subscribe(Box::new(move |doc: LedgerDocument| {
            if let Some(shared) = weak.upgrade() {
                shared.on_remote_document(doc);
            }
        }));
        let subscription = match subscribed {
            Ok(subscription) => subscription,
            Err(err) => {
                warn::emit(WarnEvent {
                    code: FundWarnCode::RemoteSubscribeFailed,
                    stage: "sync",
                    action: "attach-remote",
                    reason: "subscribe-failed",
                    err: &format!("{err:#}"),
                });
                return false;
            }
        };

        match RemoteWriter::spawn(Arc::clone(&shared.remote)) {
            Ok(writer) => *lock(&shared.writer) = Some(writer),
            Err(err) => warn::emit(WarnEvent {
                code: FundWarnCode::RemoteWriteFailed,
                stage: "sync",
                action: "spawn-writer",
                reason: "thread-spawn-failed",
                err: &err.to_string(),
            }),
        }

        let seq = lock(&shared.sequencer);
        if shared.is_detached() {
            drop(seq);
            subscription.cancel();
            return true;
        }
        lock(&shared.attachments).push(subscription);
        let synchronized = shared.status().synchronized;
        shared.set_status(SyncState::Live, synchronized);
        log::debug!("remote ledger attached");
        true
    }

    fn attach_store_watch(&self) {
        let shared = &self.shared;
        let weak: Weak<Shared> = Arc::downgrade(shared);
        let watched = shared.store.watch(Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.on_store_changed();
            }
        }));
        match watched {
            Ok(subscription) => {
                let seq = lock(&shared.sequencer);
                if shared.is_detached() {
                    drop(seq);
                    subscription.cancel();
                } else {
                    lock(&shared.attachments).push(subscription);
                }
            }
            Err(err) => warn::emit(WarnEvent {
                code: FundWarnCode::StoreWatchFailed,
                stage: "sync",
                action: "attach-store-watch",
                reason: "watch-failed",
                err: &format!("{err:#}"),
            }),
        }
    }

    /// Register `listener`. It immediately receives the current snapshot
    /// unless the coordinator is still loading. Cancelling or dropping the
    /// returned subscription unregisters it.
    pub fn subscribe(&self, listener: Listener) -> Subscription {
        let shared = &self.shared;
        let id = shared.next_listener.fetch_add(1, Ordering::SeqCst);
        let listener = Arc::new(listener);
        {
            let _seq = lock(&shared.sequencer);
            if !shared.is_detached() {
                lock(&shared.listeners).insert(id, Arc::clone(&listener));
                if shared.status().state != SyncState::Loading {
                    let current = Arc::clone(&lock(&shared.current));
                    let current: &LedgerSnapshot = &current;
                    listener(current);
                }
            }
        }
        let weak = Arc::downgrade(shared);
        Subscription::new(move || {
            if let Some(shared) = weak.upgrade() {
                lock(&shared.listeners).remove(&id);
            }
        })
    }

    pub fn snapshot(&self) -> Arc<LedgerSnapshot> {
        Arc::clone(&lock(&self.shared.current))
    }

    pub fn stats(&self) -> Stats {
        Stats::from_snapshot(&self.snapshot())
    }

    pub fn state(&self) -> SyncState {
        self.shared.status().state
    }

    /// True once the ledger reflects its authority: the local store in
    /// local-only mode, the first remote push when live.
    pub fn is_synchronized(&self) -> bool {
        self.shared.status().synchronized
    }

    /// Block until synchronized or `timeout` elapses. Returns whether the
    /// coordinator is synchronized.
    pub fn wait_synchronized(&self, timeout: Duration) -> bool {
        let shared = &self.shared;
        let guard = lock(&shared.status);
        let (status, _) = shared
            .status_changed
            .wait_timeout_while(guard, timeout, |s| !s.synchronized && !shared.is_detached())
            .unwrap_or_else(PoisonError::into_inner);
        status.synchronized
    }

    /// Apply `op` optimistically: publish, persist locally, and queue a
    /// remote overwrite when live. Remote failures never undo the change.
    pub fn apply(&self, op: LedgerOp) -> Result<Applied, FundError> {
        let shared = &self.shared;
        let _seq = lock(&shared.sequencer);
        if shared.is_detached() {
            return Err(FundError::Detached);
        }
        let state = shared.status().state;
        if state == SyncState::Loading {
            return Err(FundError::NotStarted);
        }
        let current = Arc::clone(&lock(&shared.current));
        let (next, applied) = op.apply(&current)?;
        let published = shared.publish(next);
        shared.store.write(&published);
        if state == SyncState::Live {
            if let Some(writer) = lock(&shared.writer).as_ref() {
                writer.submit(published);
            }
        }
        log::debug!("applied {}", op.label());
        Ok(applied)
    }

    /// Detach from the remote and the store, drop all listeners and wait
    /// for the pending remote write. Idempotent.
    pub fn shutdown(&self) {
        let shared = &self.shared;
        if shared.detached.swap(true, Ordering::SeqCst) {
            return;
        }
        // Wait out a publish that is already in flight.
        drop(lock(&shared.sequencer));

        let attachments = std::mem::take(&mut *lock(&shared.attachments));
        for subscription in attachments {
            subscription.cancel();
        }
        lock(&shared.listeners).clear();
        let writer = lock(&shared.writer).take();
        if let Some(writer) = writer {
            writer.finish();
        }
        shared.status_changed.notify_all();
    }
}

impl Drop for SyncCoordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
