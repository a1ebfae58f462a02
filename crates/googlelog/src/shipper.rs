use std::sync::mpsc as sync_mpsc;
use tokio::sync::mpsc as async_mpsc;

use crate::batch::PendingEntry;
use crate::logger::Logger;

const CHANNEL_CAPACITY: usize = 100;
const DEFAULT_MAX_BATCH_ENTRIES: usize = 100;

/// A sync to async channel bridge.
/// Forwards the entries from the [Drain's log function](crate::drain::EntryDrain) to the [`Shipper`]
pub struct Bridge {
    sync_rx: sync_mpsc::Receiver<PendingEntry>,
    async_tx: async_mpsc::Sender<PendingEntry>,
}

impl Bridge {
    /// Forwards entries from the drain to the shipper until the drain is dropped.
    ///
    /// Blocks the current thread, run it with `tokio::task::spawn_blocking`.
    /// For usage see the [`example`](crate::drain::Builder::build_with_async_shipper).
    pub fn run_sync_to_async_bridge(self) {
        while let Ok(entry) = self.sync_rx.recv() {
            if let Err(e) = self.async_tx.blocking_send(entry) {
                eprintln!(
                    "Failed to forward log entry, not sent to Google Logging: {}",
                    e
                );
                return;
            }
        }
    }
}

/// Commits the entries of a drain to the Google Logging API through a [`Logger`]
pub struct Shipper {
    logger: Logger,
    max_batch_entries: usize,
    sync_rx: Option<sync_mpsc::Receiver<PendingEntry>>,
    async_rx: async_mpsc::Receiver<PendingEntry>,
    async_tx: Option<async_mpsc::Sender<PendingEntry>>,
}

impl Shipper {
    /// Creates a `Shipper` writing the entries received on `sync_rx` to `logger`
    pub fn new(logger: Logger, sync_rx: sync_mpsc::Receiver<PendingEntry>) -> Self {
        let (async_tx, async_rx) = async_mpsc::channel::<PendingEntry>(CHANNEL_CAPACITY);

        Shipper {
            logger,
            max_batch_entries: DEFAULT_MAX_BATCH_ENTRIES,
            sync_rx: Some(sync_rx),
            async_rx,
            async_tx: Some(async_tx),
        }
    }

    /// Upper bound of entries written in one request
    #[must_use]
    pub fn with_max_batch_entries(self, max_batch_entries: usize) -> Self {
        Self {
            max_batch_entries: max_batch_entries.max(1),
            ..self
        }
    }

    /// Takes the sync receiver and async sender from the Shipper into the [`Bridge`].
    ///
    /// Returns `None` when the bridge was already taken.
    /// For usage see the [`example`](crate::drain::Builder::build_with_async_shipper).
    pub fn yield_bridge(&mut self) -> Option<Bridge> {
        match (self.sync_rx.take(), self.async_tx.take()) {
            (Some(sync_rx), Some(async_tx)) => Some(Bridge { sync_rx, async_tx }),
            (_, _) => None,
        }
    }

    /// Receives entries and commits them in batches until the bridge is gone.
    ///
    /// Entries that queued up while a request was in flight go out together.
    pub async fn run_log_shipper(mut self) {
        // Without a bridge the channel would never close
        drop(self.async_tx.take());

        while let Some(entry) = self.async_rx.recv().await {
            let mut batch = self.logger.batch();
            batch.push(entry);
            while batch.len() < self.max_batch_entries {
                match self.async_rx.try_recv() {
                    Ok(entry) => batch.push(entry),
                    Err(_) => break,
                }
            }

            if let Err(e) = batch.commit().await {
                eprintln!(
                    "Failed to send {} log entries to Google Logging: {}",
                    batch.len(),
                    e
                );
            }
        }
    }
}
