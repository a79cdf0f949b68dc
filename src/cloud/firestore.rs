use crate::cloud::firestore_value::{decode_document, encode_document};
use crate::cloud::{RemoteChannel, SnapshotCallback};
use crate::error::FundWarnCode;
use crate::fund::config::RemoteConfig;
use crate::fund::model::{LedgerDocument, LedgerSnapshot};
use crate::fund::store::content_hash;
use crate::fund::subscription::Subscription;
use crate::fund::warn::{self, WarnEvent};
use anyhow::{Context, Result, bail};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

/// One Firestore document addressed over the REST API.
#[derive(Clone)]
struct DocumentEndpoint {
    client: Client,
    url: String,
    api_key: String,
}

impl DocumentEndpoint {
    /// Decoded document fields, or `None` when the document does not exist.
    fn fetch(&self) -> Result<Option<Value>> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .map_err(reqwest::Error::without_url)
            .context("firestore read request failed")?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            bail!("firestore read failed with status {}", response.status());
        }
        let body: Value = response
            .json()
            .map_err(reqwest::Error::without_url)
            .context("firestore read returned invalid json")?;
        Ok(Some(decode_document(&body)?))
    }

    fn replace(&self, body: &Value) -> Result<()> {
        let response = self
            .client
            .patch(&self.url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .map_err(reqwest::Error::without_url)
            .context("firestore write request failed")?;
        if !response.status().is_success() {
            bail!("firestore write failed with status {}", response.status());
        }
        Ok(())
    }
}

/// Remote channel backed by a single Firestore document.
///
/// The Firestore REST API has no listen stream (that needs the gRPC
/// `Listen` RPC), so pushes are emulated: a listener thread re-reads the
/// document every `poll_interval_ms` and reports it when its content
/// fingerprint differs from the last one seen. A failed read, including the
/// first one, is logged and retried on the next tick; it never ends the
/// subscription.
pub struct FirestoreChannel {
    config: RemoteConfig,
    endpoint: DocumentEndpoint,
}

pub fn document_url(config: &RemoteConfig) -> String {
    format!(
        "{}/v1/projects/{}/databases/(default)/documents/{}/{}",
        config.base_url.trim_end_matches('/'),
        config.project_id.trim(),
        config.collection,
        config.document
    )
}

impl FirestoreChannel {
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("failed to build firestore http client")?;
        let endpoint = DocumentEndpoint {
            client,
            url: document_url(&config),
            api_key: config.api_key.trim().to_string(),
        };
        Ok(Self { config, endpoint })
    }
}

impl RemoteChannel for FirestoreChannel {
    fn configured(&self) -> bool {
        self.config.is_configured()
    }

    fn subscribe(&self, on_snapshot: SnapshotCallback) -> Result<Subscription> {
        if !self.configured() {
            bail!("firestore channel is not configured");
        }

        // First read happens before returning so a reachable document is
        // delivered without waiting a full poll interval.
        let first = self.endpoint.fetch();

        let endpoint = self.endpoint.clone();
        let interval = Duration::from_millis(self.config.poll_interval_ms);
        let stopped = Arc::new(AtomicBool::new(false));
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let thread_stopped = Arc::clone(&stopped);
        let handle = thread::Builder::new()
            .name("fund-firestore-listen".to_string())
            .spawn(move || {
                let mut last_fingerprint: Option<String> = None;
                let mut next = first;
                loop {
                    match next {
                        Ok(Some(fields)) => {
                            let fingerprint = content_hash(fields.to_string().as_bytes());
                            if last_fingerprint.as_deref() != Some(fingerprint.as_str()) {
                                last_fingerprint = Some(fingerprint);
                                deliver(fields, &on_snapshot, &thread_stopped);
                            }
                        }
                        Ok(None) => {}
                        Err(err) => warn::emit(WarnEvent {
                            code: FundWarnCode::RemoteListenFailed,
                            stage: "remote",
                            action: "listen",
                            reason: "fetch-failed",
                            err: &format!("{err:#}"),
                        }),
                    }
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        _ => break,
                    }
                    next = endpoint.fetch();
                }
            })
            .context("failed to spawn firestore listener")?;

        let listener_id = handle.thread().id();
        Ok(Subscription::new(move || {
            stopped.store(true, Ordering::SeqCst);
            let _ = stop_tx.send(());
            // Cancelling from inside a callback must not join itself.
            if thread::current().id() != listener_id {
                let _ = handle.join();
            }
        }))
    }

    fn write(&self, snapshot: &LedgerSnapshot) -> Result<()> {
        if !self.configured() {
            bail!("firestore channel is not configured");
        }
        let body = encode_document(&snapshot.to_value()?)?;
        self.endpoint.replace(&body)
    }
}

fn deliver(fields: Value, on_snapshot: &SnapshotCallback, stopped: &AtomicBool) {
    if stopped.load(Ordering::SeqCst) {
        return;
    }
    match LedgerDocument::from_value(fields) {
        Ok(doc) => on_snapshot(doc),
        Err(err) => warn::emit(WarnEvent {
            code: FundWarnCode::RemoteDocumentMalformed,
            stage: "remote",
            action: "decode-document",
            reason: "unexpected-shape",
            err: &format!("{err:#}"),
        }),
    }
}
