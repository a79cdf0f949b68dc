pub mod firestore;
pub mod firestore_value;

use crate::fund::model::{LedgerDocument, LedgerSnapshot};
use crate::fund::subscription::Subscription;
use anyhow::Result;

pub use firestore::FirestoreChannel;

/// Receives each remote document, normalized to the wrapped shape but not
/// yet migrated.
pub type SnapshotCallback = Box<dyn Fn(LedgerDocument) + Send + Sync + 'static>;

/// Connection to the shared remote ledger document.
pub trait RemoteChannel: Send + Sync {
    /// True only when the minimum connection parameters are present.
    fn configured(&self) -> bool;

    /// Deliver the current document and every later change until the
    /// returned subscription is cancelled. Fails only when the stream cannot
    /// be set up at all (missing configuration, no listener thread);
    /// transport errors are logged by the channel and do not end the stream.
    fn subscribe(&self, on_snapshot: SnapshotCallback) -> Result<Subscription>;

    /// Overwrite the remote document with `snapshot` as a whole. Blocking.
    fn write(&self, snapshot: &LedgerSnapshot) -> Result<()>;
}
