// Durable Store Bridge
//
// Exported images are handed to a single background writer so saves hit
// the durable store in export order. When several images are waiting only
// the newest is written. Save failures are logged, never returned.

use qrmaster_core::port::DurableStore;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

enum BridgeCommand {
    Save(Vec<u8>),
    Flush(oneshot::Sender<()>),
}

pub struct DurableStoreBridge {
    key: String,
    tx: mpsc::UnboundedSender<BridgeCommand>,
}

impl DurableStoreBridge {
    /// Start the writer task for `key`
    pub fn spawn(store: Arc<dyn DurableStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(store, key.clone(), rx));
        Self { key, tx }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Queue an image for saving. Returns immediately.
    pub fn persist(&self, image: Vec<u8>) {
        if self.tx.send(BridgeCommand::Save(image)).is_err() {
            warn!(key = %self.key, "Durable store writer stopped, image dropped");
        }
    }

    /// Wait until every image queued so far has been handled
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.tx.send(BridgeCommand::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }
}

async fn run_writer(
    store: Arc<dyn DurableStore>,
    key: String,
    mut rx: mpsc::UnboundedReceiver<BridgeCommand>,
) {
    while let Some(command) = rx.recv().await {
        let mut latest = match command {
            BridgeCommand::Save(image) => image,
            BridgeCommand::Flush(done) => {
                let _ = done.send(());
                continue;
            }
        };

        // Coalesce: keep the newest image, answer flushes after the write
        let mut flushes = Vec::new();
        while let Ok(next) = rx.try_recv() {
            match next {
                BridgeCommand::Save(image) => latest = image,
                BridgeCommand::Flush(done) => flushes.push(done),
            }
        }

        match store.save(&key, &latest).await {
            Ok(()) => debug!(key = %key, bytes = latest.len(), "Durable image saved"),
            Err(e) => warn!(key = %key, error = %e, "Durable image save failed"),
        }

        for done in flushes {
            let _ = done.send(());
        }
    }
    debug!(key = %key, "Durable store writer finished");
}
