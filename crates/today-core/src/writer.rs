use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use anyhow::Context;
use tracing::{debug, trace, warn};

use crate::store::KvStore;

enum Request {
    Write { key: String, value: Vec<u8> },
    Flush(Sender<()>),
}

/// Applies store writes one at a time, in the order they were submitted.
///
/// Callers never wait for a write; a failed write is logged and dropped. Each
/// write replaces the whole value, so the last submitted write is the one that
/// ends up in the store.
pub struct StoreWriter {
    tx: Option<Sender<Request>>,
    handle: Option<JoinHandle<()>>,
}

impl StoreWriter {
    pub fn spawn(store: Arc<dyn KvStore>) -> anyhow::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("store-writer".to_string())
            .spawn(move || drain(store.as_ref(), rx))
            .context("failed to spawn store writer thread")?;

        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
        })
    }

    pub fn submit(&self, key: &str, value: Vec<u8>) {
        trace!(key, bytes = value.len(), "queueing write");
        let request = Request::Write {
            key: key.to_string(),
            value,
        };
        if !self.send(request) {
            warn!(key, "store writer stopped; write dropped");
        }
    }

    /// Blocks until every write submitted before this call was applied.
    pub fn flush(&self) {
        let (done_tx, done_rx) = mpsc::channel();
        if self.send(Request::Flush(done_tx)) {
            let _ = done_rx.recv();
        }
    }

    fn send(&self, request: Request) -> bool {
        match &self.tx {
            Some(tx) => tx.send(request).is_ok(),
            None => false,
        }
    }
}

impl Drop for StoreWriter {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            warn!("store writer thread panicked");
        }
    }
}

fn drain(store: &dyn KvStore, rx: Receiver<Request>) {
    for request in rx {
        match request {
            Request::Write { key, value } => match store.set(&key, &value) {
                Ok(()) => debug!(key = %key, bytes = value.len(), "write applied"),
                Err(err) => {
                    let error = format!("{err:#}");
                    warn!(key = %key, %error, "write failed");
                }
            },
            Request::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("store writer finished");
}
