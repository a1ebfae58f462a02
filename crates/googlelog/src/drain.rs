use crate::batch::PendingEntry;
use crate::entry::{EntryOptions, Payload, Severity};
use crate::error::Error;
use crate::logger::Logger;
use crate::shipper;

use slog::{self, Key, Level, OwnedKVList, Record, KV};
use std::collections::HashMap;
use std::fmt;
use std::fmt::Write;

use serde_json::json;

use std::sync::mpsc::{sync_channel, Receiver, SyncSender};

use chrono::Utc;

// Records buffered between the drain and whoever ships them
const CHANNEL_CAPACITY: usize = 100;

/// How the record message ends up in the entry
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    /// `jsonPayload` with the message under `message`
    #[default]
    Json,
    /// `textPayload`
    Text,
}

/// Builder for the [`EntryDrain`]
#[derive(Debug)]
pub struct Builder {
    logger: Logger,
    log_level_label: Option<String>,
    default_labels: HashMap<String, String>,
    payload_format: PayloadFormat,
}

/// An [`slog::Drain`](https://slog-rs.github.io/slog/slog/trait.Drain.html) turning records into
/// [`PendingEntry`]s for a [`Logger`].
///
/// Key/value pairs of a record become labels of its entry.
pub struct EntryDrain {
    log_level_label: Option<String>,
    default_labels: HashMap<String, String>,
    payload_format: PayloadFormat,
    sync_tx: SyncSender<PendingEntry>,
}

impl Builder {
    /// Creates a Builder for the drain of `logger`.
    ///
    /// # Example
    ///
    /// ```
    /// use googlelog::{drain::Builder, Client, Credentials};
    /// let client = Client::with_http("my-gcp-project", Credentials::metadata_server()).unwrap();
    /// let (drain, _) = Builder::new(client.logger("my-log-id")).build();
    /// ```
    #[must_use = "The builder must be used"]
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            log_level_label: None,
            default_labels: HashMap::new(),
            payload_format: PayloadFormat::default(),
        }
    }

    /// Sets default labels to be applied in the labels field of every entry.
    ///
    /// These labels are added in addition to any labels set in the logger statement.
    ///
    /// # Example
    ///
    /// ```
    /// use serde_json::json;
    /// use googlelog::{drain::Builder, Client, Credentials};
    /// let client = Client::with_http("my-gcp-project", Credentials::metadata_server()).unwrap();
    /// let builder = Builder::new(client.logger("my-log-id"))
    ///     .with_default_labels(json!({
    ///         "application": "my-application",
    ///         "team": "my-team",
    ///     }))
    ///     .unwrap();
    /// ```
    ///
    /// # Errors
    ///
    /// Will return `Err` if `labels` is not a JSON object with string values.
    pub fn with_default_labels(self, labels: serde_json::Value) -> Result<Self, Error> {
        Ok(Self {
            default_labels: serde_json::from_value(labels).map_err(Error::DefaultLabelsError)?,
            ..self
        })
    }

    /// Sets the label name to store the log level
    ///
    /// If not set, the log level is not propagated, but you will still have the
    /// [severity](https://cloud.google.com/logging/docs/reference/v2/rest/v2/LogEntry#LogSeverity), which is always there.
    #[must_use = "The builder must be used"]
    pub fn with_log_level_label(self, log_level_label: &str) -> Self {
        Self {
            log_level_label: Some(log_level_label.into()),
            ..self
        }
    }

    #[must_use = "The builder must be used"]
    pub fn with_payload_format(self, payload_format: PayloadFormat) -> Self {
        Self {
            payload_format,
            ..self
        }
    }

    fn into_drain(self) -> (EntryDrain, Logger, Receiver<PendingEntry>) {
        let (sync_tx, sync_rx) = sync_channel::<PendingEntry>(CHANNEL_CAPACITY);
        (
            EntryDrain {
                log_level_label: self.log_level_label,
                default_labels: self.default_labels,
                payload_format: self.payload_format,
                sync_tx,
            },
            self.logger,
            sync_rx,
        )
    }

    /// Returns the drain and the receiving end of the channel it sends its entries to.
    ///
    /// Use this to ship the entries yourself, e.g. by filling a [`Batch`](crate::Batch).
    #[must_use = "The drain and receiver must be used to handle logging correctly"]
    pub fn build(self) -> (EntryDrain, Receiver<PendingEntry>) {
        let (drain, _, sync_rx) = self.into_drain();
        (drain, sync_rx)
    }

    /// Returns the drain and a [`Shipper`](shipper::Shipper) that commits its entries through the logger.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use slog::{o, Drain};
    /// use googlelog::{drain::Builder, Client, Credentials};
    ///
    /// # async fn run() {
    /// let client = Client::with_http("my-gcp-project", Credentials::metadata_server()).unwrap();
    /// let (drain, mut shipper) = Builder::new(client.logger("my-log-id")).build_with_async_shipper();
    ///
    /// // Forward entries from the sync channel of the drain to the async channel of the shipper
    /// let bridge = shipper.yield_bridge().unwrap();
    /// tokio::task::spawn_blocking(move || bridge.run_sync_to_async_bridge());
    /// tokio::spawn(shipper.run_log_shipper());
    ///
    /// let log = slog::Logger::root(std::sync::Mutex::new(drain).fuse(), o!());
    /// slog::info!(log, "Shipped to Google"; "user" => "alice");
    /// # }
    /// ```
    #[must_use = "The drain and shipper must be used to handle logging correctly"]
    pub fn build_with_async_shipper(self) -> (EntryDrain, shipper::Shipper) {
        let (drain, logger, sync_rx) = self.into_drain();
        (drain, shipper::Shipper::new(logger, sync_rx))
    }
}

impl EntryDrain {
    // Determine a sensible severity based on the log level
    fn get_severity(log_level: Level) -> Severity {
        match log_level {
            Level::Critical => Severity::Critical,
            Level::Error => Severity::Error,
            Level::Warning => Severity::Warning,
            Level::Info => Severity::Info,
            Level::Debug | Level::Trace => Severity::Debug,
        }
    }

    fn construct_entry(
        &self,
        message: &str,
        log_level: Level,
        serializer: Serializer,
    ) -> PendingEntry {
        let mut labels = self.default_labels.clone();

        if !serializer.map.is_empty() {
            labels.extend(serializer.map);
        }

        // We add the log level to the labels if requested
        if let Some(label) = &self.log_level_label {
            labels.insert(label.clone(), log_level.as_str().to_string());
        }

        let payload = match self.payload_format {
            PayloadFormat::Json => Payload::Json(json!({ "message": message })),
            PayloadFormat::Text => Payload::Text(message.to_string()),
        };

        let mut options = EntryOptions::new()
            .with_severity(Self::get_severity(log_level))
            .with_timestamp(Utc::now());
        if !labels.is_empty() {
            options = options.with_labels(labels);
        }

        PendingEntry::new(payload, options)
    }
}

#[derive(Debug)]
struct Serializer {
    map: HashMap<String, String>,
}

impl Serializer {
    fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }
}

impl slog::Serializer for Serializer {
    fn emit_arguments(&mut self, key: Key, val: &fmt::Arguments) -> slog::Result {
        let mut value = String::new();
        write!(value, "{val}")?;
        self.map.insert(key.into(), value);
        Ok(())
    }
}

impl slog::Drain for EntryDrain {
    type Ok = ();
    type Err = Error;

    fn log(&self, record: &Record<'_>, values: &OwnedKVList) -> Result<Self::Ok, Self::Err> {
        let mut serializer = Serializer::new();

        let kv = record.kv();
        kv.serialize(record, &mut serializer)
            .map_err(Error::KvSerializeError)?;

        values
            .serialize(record, &mut serializer)
            .map_err(Error::KvSerializeError)?;

        let entry = self.construct_entry(
            format!("{}", record.msg()).as_str(),
            record.level(),
            serializer,
        );

        self.sync_tx.send(entry).map_err(|_| Error::ChannelClosed)
    }
}
