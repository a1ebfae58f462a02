use crate::client::Client;
use crate::entry::{build_log_entry, EntryOptions, Payload};
use crate::error::{Error, Result};
use crate::logger::Logger;

use google_logging2::api::WriteLogEntriesRequest;

use serde::Serialize;
use serde_json::Value;

/// An entry waiting in a [`Batch`]
#[derive(Debug, Clone)]
pub struct PendingEntry {
    pub payload: Payload,
    pub options: EntryOptions,
}

impl PendingEntry {
    pub fn new(payload: Payload, options: EntryOptions) -> Self {
        Self { payload, options }
    }
}

/// Collects entries for a [`Logger`] and writes them in a single request.
///
/// The log name, resource and default labels of the logger are sent once, at the request
/// level. Every entry only carries its payload and the options given for it.
#[derive(Debug)]
pub struct Batch {
    logger: Logger,
    client: Client,
    entries: Vec<PendingEntry>,
}

impl Batch {
    pub fn new(logger: Logger, client: Client) -> Self {
        Self {
            logger,
            client,
            entries: Vec::new(),
        }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// The entries not yet committed
    pub fn entries(&self) -> &[PendingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, entry: PendingEntry) {
        self.entries.push(entry);
    }

    pub fn log_text(&mut self, text: impl Into<String>, options: EntryOptions) {
        self.push(PendingEntry::new(Payload::Text(text.into()), options));
    }

    pub fn log_struct(&mut self, info: Value, options: EntryOptions) {
        self.push(PendingEntry::new(Payload::Json(info), options));
    }

    /// Queues a proto payload. The message is serialized right away, only a failing
    /// serialization makes this return an error.
    pub fn log_proto<M: Serialize + ?Sized>(
        &mut self,
        message: &M,
        options: EntryOptions,
    ) -> Result<()> {
        self.push(PendingEntry::new(Payload::proto(message)?, options));
        Ok(())
    }

    /// Sends all queued entries through the batch's client.
    pub async fn commit(&mut self) -> Result<()> {
        let client = self.client.clone();
        self.commit_using(&client).await
    }

    /// Sends all queued entries through another client.
    ///
    /// Nothing is sent when one of the entries is invalid. The queue is only emptied once the
    /// API accepted the request, so a failed commit can be retried.
    pub async fn commit_using(&mut self, client: &Client) -> Result<()> {
        if self.entries.is_empty() {
            return Ok(());
        }

        let entries = self
            .entries
            .iter()
            .cloned()
            .map(|pending| build_log_entry(pending.payload, pending.options))
            .collect::<Result<Vec<_>>>()?;

        let request = WriteLogEntriesRequest {
            log_name: Some(self.logger.full_name()),
            resource: Some(self.logger.resource().clone()),
            labels: self.logger.labels().cloned(),
            entries: Some(entries),
            ..Default::default()
        };

        client.api().write_entries(request).await?;
        self.entries.clear();
        Ok(())
    }

    /// Fills the batch in `fill` and commits it when `fill` succeeds.
    ///
    /// When `fill` fails nothing is sent and the entries queued so far stay in the batch.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn run(logger: googlelog::Logger) -> Result<(), googlelog::Error> {
    /// use googlelog::{EntryOptions, Severity};
    /// use serde_json::json;
    ///
    /// let mut batch = logger.batch();
    /// batch
    ///     .fill_and_commit(|batch| {
    ///         batch.log_text("starting", EntryOptions::new());
    ///         batch.log_struct(
    ///             json!({"message": "done", "items": 3}),
    ///             EntryOptions::new().with_severity(Severity::Notice),
    ///         );
    ///         Ok::<_, googlelog::Error>(())
    ///     })
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn fill_and_commit<F, E>(&mut self, fill: F) -> std::result::Result<(), E>
    where
        F: FnOnce(&mut Batch) -> std::result::Result<(), E>,
        E: From<Error>,
    {
        fill(self)?;
        self.commit().await.map_err(E::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Severity;
    use crate::logger::Builder;
    use crate::testing::RecordingApi;
    use chrono::{DateTime, TimeZone, Utc};
    use google_logging2::api::HttpRequest;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::HashMap;

    const PROJECT: &str = "test-project";
    const TEXT: &str = "This is the entry text";

    fn client() -> (Client, RecordingApi) {
        let api = RecordingApi::default();
        (Client::new(PROJECT, api.clone()), api)
    }

    fn logger(client: &Client) -> Logger {
        Builder::new("logger_name")
            .with_labels(HashMap::from([("foo".to_string(), "spam".to_string())]))
            .build(client)
    }

    fn request() -> HttpRequest {
        HttpRequest {
            request_method: Some("POST".to_string()),
            request_url: Some("https://api.example.com/endpoint".to_string()),
            status: Some(500),
            ..Default::default()
        }
    }

    fn at(second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2016, 12, 31, 0, 0, second).unwrap()
            + chrono::Duration::microseconds(999_999)
    }

    fn message() -> Value {
        json!({"foo": true})
    }

    fn structure() -> Value {
        json!({"message": TEXT, "weather": "partly cloudy"})
    }

    #[test]
    fn ctor_defaults() {
        let (client, _) = client();
        let logger = client.logger("NAME");
        let batch = Batch::new(logger, client.clone());
        assert_eq!(batch.logger().full_name(), "projects/test-project/logs/NAME");
        assert!(batch.client().same_api(&client));
        assert_eq!(batch.len(), 0);
    }

    #[test]
    fn log_text_defaults() {
        let (client, api) = client();
        let mut batch = client.logger("NAME").batch();
        batch.log_text(TEXT, EntryOptions::new());

        assert_eq!(batch.entries().len(), 1);
        let pending = &batch.entries()[0];
        assert_eq!(pending.payload, Payload::Text(TEXT.to_string()));
        assert!(pending.options.labels.is_none());
        assert!(pending.options.insert_id.is_none());
        assert!(pending.options.severity.is_none());
        assert!(pending.options.http_request.is_none());
        assert!(pending.options.timestamp.is_none());
        assert!(api.writes().is_empty());
    }

    #[test]
    fn log_text_explicit() {
        let (client, _) = client();
        let mut batch = client.logger("NAME").batch();
        batch.log_text(
            TEXT,
            EntryOptions::new()
                .with_labels([("foo", "bar"), ("baz", "qux")])
                .with_insert_id("IID")
                .with_severity(Severity::Critical)
                .with_http_request(request())
                .with_timestamp(at(2)),
        );

        let pending = &batch.entries()[0];
        assert_eq!(pending.payload, Payload::Text(TEXT.to_string()));
        assert_eq!(pending.options.labels.as_ref().map(HashMap::len), Some(2));
        assert_eq!(pending.options.insert_id.as_deref(), Some("IID"));
        assert_eq!(pending.options.severity, Some(Severity::Critical));
        assert_eq!(
            pending.options.http_request.as_ref().and_then(|r| r.status),
            Some(500)
        );
        assert_eq!(pending.options.timestamp, Some(at(2)));
    }

    #[test]
    fn log_struct_and_proto_defaults() {
        let (client, _) = client();
        let mut batch = client.logger("NAME").batch();
        batch.log_struct(structure(), EntryOptions::new());
        batch.log_proto(&message(), EntryOptions::new()).unwrap();

        assert_eq!(batch.entries()[0].payload, Payload::Json(structure()));
        assert_eq!(batch.entries()[1].payload, Payload::Proto(message()));
    }

    #[tokio::test]
    async fn commit_w_invalid_entry() {
        let (client, api) = client();
        let mut batch = client.logger("NAME").batch();
        batch.log_text(TEXT, EntryOptions::new());
        batch.push(PendingEntry::new(
            Payload::Proto(json!("BOGUS")),
            EntryOptions::new(),
        ));

        let err = batch.commit().await.unwrap_err();

        assert!(matches!(err, Error::InvalidPayload { kind: "proto", .. }));
        assert_eq!(batch.len(), 2);
        assert!(api.writes().is_empty());
    }

    #[tokio::test]
    async fn commit_w_bound_client() {
        let (client, api) = client();
        let logger = client.logger("NAME");
        let mut batch = logger.batch();

        batch.log_text(TEXT, EntryOptions::new().with_insert_id("IID1").with_timestamp(at(1)));
        batch.log_struct(
            structure(),
            EntryOptions::new().with_insert_id("IID2").with_timestamp(at(2)),
        );
        batch
            .log_proto(
                &message(),
                EntryOptions::new().with_insert_id("IID3").with_timestamp(at(3)),
            )
            .unwrap();
        batch.commit().await.unwrap();

        assert!(batch.is_empty());
        assert_eq!(
            api.writes(),
            vec![json!({
                "logName": "projects/test-project/logs/NAME",
                "resource": {"type": "global"},
                "entries": [
                    {
                        "textPayload": TEXT,
                        "insertId": "IID1",
                        "timestamp": "2016-12-31T00:00:01.999999Z",
                    },
                    {
                        "jsonPayload": structure(),
                        "insertId": "IID2",
                        "timestamp": "2016-12-31T00:00:02.999999Z",
                    },
                    {
                        "protoPayload": message(),
                        "insertId": "IID3",
                        "timestamp": "2016-12-31T00:00:03.999999Z",
                    },
                ],
            })]
        );
    }

    #[tokio::test]
    async fn commit_w_alternate_client() {
        let (client1, api1) = client();
        let (client2, api2) = client();
        let logger = logger(&client1);
        let mut batch = Batch::new(logger, client1.clone());

        batch.log_text(TEXT, EntryOptions::new().with_labels([("foo", "bar"), ("baz", "qux")]));
        batch.log_struct(structure(), EntryOptions::new().with_severity(Severity::Critical));
        batch
            .log_proto(&message(), EntryOptions::new().with_http_request(request()))
            .unwrap();
        batch.commit_using(&client2).await.unwrap();

        assert!(batch.is_empty());
        assert!(api1.writes().is_empty());
        assert_eq!(
            api2.writes(),
            vec![json!({
                "logName": "projects/test-project/logs/logger_name",
                "resource": {"type": "global"},
                "labels": {"foo": "spam"},
                "entries": [
                    {"textPayload": TEXT, "labels": {"foo": "bar", "baz": "qux"}},
                    {"jsonPayload": structure(), "severity": "CRITICAL"},
                    {"protoPayload": message(), "httpRequest": {
                        "requestMethod": "POST",
                        "requestUrl": "https://api.example.com/endpoint",
                        "status": 500,
                    }},
                ],
            })]
        );
    }

    #[tokio::test]
    async fn commit_of_empty_batch_sends_nothing() {
        let (client, api) = client();
        let mut batch = client.logger("NAME").batch();
        batch.commit().await.unwrap();
        assert!(api.writes().is_empty());
    }

    #[tokio::test]
    async fn failed_write_keeps_the_entries() {
        let (client, api) = client();
        api.fail_writes();
        let mut batch = client.logger("NAME").batch();
        batch.log_text(TEXT, EntryOptions::new());

        assert!(batch.commit().await.is_err());
        assert_eq!(batch.len(), 1);
    }

    #[tokio::test]
    async fn fill_and_commit_success() {
        let (client, api) = client();
        let logger = logger(&client);
        let mut batch = logger.batch();

        batch
            .fill_and_commit(|other| {
                other.log_text(TEXT, EntryOptions::new().with_http_request(request()));
                other.log_struct(
                    structure(),
                    EntryOptions::new().with_labels([("foo", "bar"), ("baz", "qux")]),
                );
                other.log_proto(&message(), EntryOptions::new().with_severity(Severity::Critical))
            })
            .await
            .unwrap();

        assert!(batch.is_empty());
        assert_eq!(
            api.writes(),
            vec![json!({
                "logName": "projects/test-project/logs/logger_name",
                "resource": {"type": "global"},
                "labels": {"foo": "spam"},
                "entries": [
                    {"textPayload": TEXT, "httpRequest": {
                        "requestMethod": "POST",
                        "requestUrl": "https://api.example.com/endpoint",
                        "status": 500,
                    }},
                    {"jsonPayload": structure(), "labels": {"foo": "bar", "baz": "qux"}},
                    {"protoPayload": message(), "severity": "CRITICAL"},
                ],
            })]
        );
    }

    #[derive(Debug)]
    struct Bugout;

    impl From<Error> for Bugout {
        fn from(_: Error) -> Self {
            Bugout
        }
    }

    #[tokio::test]
    async fn fill_and_commit_failure() {
        let (client, api) = client();
        let mut batch = client.logger("NAME").batch();

        let result = batch
            .fill_and_commit(|other| -> std::result::Result<(), Bugout> {
                other.log_text(
                    TEXT,
                    EntryOptions::new()
                        .with_insert_id("IID")
                        .with_timestamp(at(2)),
                );
                other.log_struct(
                    structure(),
                    EntryOptions::new().with_severity(Severity::Critical),
                );
                other.log_proto(
                    &message(),
                    EntryOptions::new().with_labels([("foo", "bar")]).with_http_request(request()),
                )?;
                Err(Bugout)
            })
            .await;

        assert!(result.is_err());
        assert!(api.writes().is_empty());
        let unsent: Vec<_> = batch.entries().iter().map(|e| e.payload.kind()).collect();
        assert_eq!(unsent, vec!["text", "struct", "proto"]);
        assert_eq!(batch.entries()[0].options.insert_id.as_deref(), Some("IID"));
        assert_eq!(batch.entries()[1].options.severity, Some(Severity::Critical));
        assert!(batch.entries()[2].options.http_request.is_some());
    }
}
