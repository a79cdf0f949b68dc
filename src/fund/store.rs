use crate::error::FundWarnCode;
use crate::fund::model::{LedgerDocument, LedgerSnapshot};
use crate::fund::subscription::Subscription;
use crate::fund::warn::{self, WarnEvent};
use anyhow::{Context, Result};
use fs2::FileExt;
use notify::{EventKind, RecursiveMode, Watcher};
use sha2::{Digest, Sha256};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

pub const LEDGER_FILE_NAME: &str = "ledger.json";

/// Fired when another process changes the stored ledger. Carries no
/// payload; the receiver re-reads.
pub type ChangeCallback = Box<dyn Fn() + Send + Sync + 'static>;

/// Durable local copy of the whole ledger.
///
/// Reads and writes never fail from the caller's point of view: a broken or
/// unreadable document reads as absent, and a failed write is logged.
pub trait LedgerStore: Send + Sync {
    fn read(&self) -> Option<LedgerDocument>;
    fn write(&self, snapshot: &LedgerSnapshot);
    fn watch(&self, on_change: ChangeCallback) -> Result<Subscription>;
}

pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// JSON file store. Writers replace the file atomically while holding an
/// exclusive lock on a sidecar `.lock` file; readers hold it shared.
#[derive(Debug)]
pub struct FileLedgerStore {
    path: PathBuf,
    lock_path: PathBuf,
    last_own_write: Arc<Mutex<Option<String>>>,
}

impl FileLedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut lock_name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| LEDGER_FILE_NAME.into());
        lock_name.push(".lock");
        let lock_path = path.with_file_name(lock_name);
        Self {
            path,
            lock_path,
            last_own_write: Arc::new(Mutex::new(None)),
        }
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn open_lock(&self) -> Result<File> {
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&self.lock_path)
            .with_context(|| format!("failed to open {}", self.lock_path.display()))
    }

    fn load_raw(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let lock = self.open_lock()?;
        lock.lock_shared()
            .with_context(|| format!("failed to lock {}", self.lock_path.display()))?;
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => Some(raw),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read {}", self.path.display()));
            }
        };
        let _ = lock.unlock();
        Ok(raw)
    }

    fn store(&self, snapshot: &LedgerSnapshot) -> Result<()> {
        let dir = self.parent_dir();
        fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

        let data = format!("{}\n", snapshot.to_json_pretty()?);
        let lock = self.open_lock()?;
        lock.lock_exclusive()
            .with_context(|| format!("failed to lock {}", self.lock_path.display()))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)
            .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
        tmp.write_all(data.as_bytes())?;
        tmp.as_file().sync_all()?;

        // Record before the rename lands so the watcher sees it as ours.
        *self
            .last_own_write
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(content_hash(data.as_bytes()));

        tmp.persist(&self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        let _ = lock.unlock();
        Ok(())
    }
}

impl LedgerStore for FileLedgerStore {
    fn read(&self) -> Option<LedgerDocument> {
        let raw = match self.load_raw() {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn::emit(WarnEvent {
                    code: FundWarnCode::StoreReadCorrupt,
                    stage: "store",
                    action: "read-ledger",
                    reason: "read-failed",
                    err: &format!("{err:#}"),
                });
                return None;
            }
        };
        match LedgerDocument::parse(&raw) {
            Ok(doc) => Some(doc),
            Err(err) => {
                warn::emit(WarnEvent {
                    code: FundWarnCode::StoreReadCorrupt,
                    stage: "store",
                    action: "parse-ledger",
                    reason: "unparseable-document",
                    err: &format!("{err:#}"),
                });
                None
            }
        }
    }

    fn write(&self, snapshot: &LedgerSnapshot) {
        if let Err(err) = self.store(snapshot) {
            warn::emit(WarnEvent {
                code: FundWarnCode::StoreWriteFailed,
                stage: "store",
                action: "write-ledger",
                reason: "write-failed",
                err: &format!("{err:#}"),
            });
        }
    }

    fn watch(&self, on_change: ChangeCallback) -> Result<Subscription> {
        let dir = self.parent_dir();
        fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

        let target = self.path.clone();
        let file_name = target.file_name().map(|n| n.to_os_string());
        let own = Arc::clone(&self.last_own_write);
        let mut last_seen: Option<String> = None;

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            let event = match res {
                Ok(event) => event,
                Err(err) => {
                    warn::emit(WarnEvent {
                        code: FundWarnCode::StoreWatchFailed,
                        stage: "store",
                        action: "watch-ledger",
                        reason: "watcher-error",
                        err: &err.to_string(),
                    });
                    return;
                }
            };
            if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                return;
            }
            let touches_ledger = event
                .paths
                .iter()
                .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
            if !touches_ledger {
                return;
            }
            // A removed ledger carries no new value to re-read.
            let Ok(bytes) = fs::read(&target) else {
                return;
            };
            let digest = content_hash(&bytes);
            if last_seen.as_deref() == Some(digest.as_str()) {
                return;
            }
            last_seen = Some(digest.clone());
            let own_digest = own.lock().unwrap_or_else(PoisonError::into_inner).clone();
            if own_digest.as_deref() == Some(digest.as_str()) {
                return;
            }
            log::debug!("ledger changed by another process: {}", target.display());
            on_change();
        })
        .context("failed to create ledger watcher")?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("failed to watch {}", dir.display()))?;

        Ok(Subscription::new(move || drop(watcher)))
    }
}
