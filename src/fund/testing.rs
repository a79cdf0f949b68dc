//! In-memory store and channel doubles for coordinator tests.

use crate::cloud::{RemoteChannel, SnapshotCallback};
use crate::fund::model::{LedgerDocument, LedgerSnapshot};
use crate::fund::store::{ChangeCallback, LedgerStore};
use crate::fund::subscription::Subscription;
use anyhow::{Result, bail};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct Backing {
    raw: Option<String>,
    watchers: BTreeMap<u64, (usize, Arc<ChangeCallback>)>,
    next_watch: u64,
}

/// A shared key-value slot seen through one or more "tabs". A write from
/// one tab notifies the watchers of every other tab, synchronously.
#[derive(Clone)]
pub struct MemoryLedgerStore {
    tab: usize,
    backing: Arc<Mutex<Backing>>,
    tabs: Arc<AtomicUsize>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self {
            tab: 0,
            backing: Arc::new(Mutex::new(Backing::default())),
            tabs: Arc::new(AtomicUsize::new(1)),
        }
    }

    pub fn open_tab(&self) -> Self {
        Self {
            tab: self.tabs.fetch_add(1, Ordering::SeqCst),
            backing: Arc::clone(&self.backing),
            tabs: Arc::clone(&self.tabs),
        }
    }

    pub fn seed_raw(&self, raw: &str) {
        lock(&self.backing).raw = Some(raw.to_string());
    }

    pub fn document(&self) -> Option<LedgerDocument> {
        let raw = lock(&self.backing).raw.clone()?;
        LedgerDocument::parse(&raw).ok()
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn read(&self) -> Option<LedgerDocument> {
        self.document()
    }

    fn write(&self, snapshot: &LedgerSnapshot) {
        let Ok(raw) = snapshot.to_json_pretty() else {
            return;
        };
        let others: Vec<Arc<ChangeCallback>> = {
            let mut backing = lock(&self.backing);
            backing.raw = Some(raw);
            backing
                .watchers
                .values()
                .filter(|(tab, _)| *tab != self.tab)
                .map(|(_, cb)| Arc::clone(cb))
                .collect()
        };
        for on_change in others {
            on_change();
        }
    }

    fn watch(&self, on_change: ChangeCallback) -> Result<Subscription> {
        let id = {
            let mut backing = lock(&self.backing);
            let id = backing.next_watch;
            backing.next_watch += 1;
            backing.watchers.insert(id, (self.tab, Arc::new(on_change)));
            id
        };
        let backing = Arc::clone(&self.backing);
        Ok(Subscription::new(move || {
            lock(&backing).watchers.remove(&id);
        }))
    }
}

#[derive(Default)]
struct ChannelState {
    subscribers: BTreeMap<u64, Arc<SnapshotCallback>>,
    next_subscriber: u64,
    subscribe_calls: usize,
    last: Option<LedgerDocument>,
    writes: Vec<LedgerSnapshot>,
    fail_writes: bool,
    fail_subscribe: bool,
}

/// Remote double. Pushes are delivered synchronously to every subscriber;
/// writes are recorded and never echoed back.
#[derive(Clone)]
pub struct MemoryChannel {
    configured: bool,
    state: Arc<Mutex<ChannelState>>,
}

impl MemoryChannel {
    pub fn configured() -> Self {
        Self {
            configured: true,
            state: Arc::new(Mutex::new(ChannelState::default())),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::configured()
        }
    }

    pub fn push_raw(&self, raw: &str) {
        let doc = LedgerDocument::parse(raw).expect("test push must parse");
        let subscribers: Vec<Arc<SnapshotCallback>> = {
            let mut state = lock(&self.state);
            state.last = Some(doc.clone());
            state.subscribers.values().cloned().collect()
        };
        for on_snapshot in subscribers {
            on_snapshot(doc.clone());
        }
    }

    pub fn writes(&self) -> Vec<LedgerSnapshot> {
        lock(&self.state).writes.clone()
    }

    pub fn fail_writes(&self, fail: bool) {
        lock(&self.state).fail_writes = fail;
    }

    pub fn fail_subscribe(&self, fail: bool) {
        lock(&self.state).fail_subscribe = fail;
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.state).subscribers.len()
    }

    pub fn subscribe_calls(&self) -> usize {
        lock(&self.state).subscribe_calls
    }
}

impl RemoteChannel for MemoryChannel {
    fn configured(&self) -> bool {
        self.configured
    }

    fn subscribe(&self, on_snapshot: SnapshotCallback) -> Result<Subscription> {
        let on_snapshot = Arc::new(on_snapshot);
        let (id, last) = {
            let mut state = lock(&self.state);
            state.subscribe_calls += 1;
            if state.fail_subscribe {
                bail!("subscribe rejected");
            }
            let id = state.next_subscriber;
            state.next_subscriber += 1;
            state.subscribers.insert(id, Arc::clone(&on_snapshot));
            (id, state.last.clone())
        };
        if let Some(doc) = last {
            on_snapshot(doc);
        }
        let state = Arc::clone(&self.state);
        Ok(Subscription::new(move || {
            lock(&state).subscribers.remove(&id);
        }))
    }

    fn write(&self, snapshot: &LedgerSnapshot) -> Result<()> {
        let mut state = lock(&self.state);
        if state.fail_writes {
            bail!("remote write rejected");
        }
        state.writes.push(snapshot.clone());
        Ok(())
    }
}
