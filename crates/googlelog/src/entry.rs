use crate::error::{Error, Result};

use google_logging2::api::{HttpRequest, LogEntry, MonitoredResource};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// The severity of a log entry.
///
/// See [LogSeverity](https://cloud.google.com/logging/docs/reference/v2/rest/v2/LogEntry#logseverity).
/// Parsing is case insensitive, formatting yields the upper case name the API expects.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Severity {
    Default,
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

/// The payload of a log entry. Exactly one is sent per entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Sent as `textPayload`
    Text(String),
    /// Sent as `jsonPayload`, must be a JSON object
    Json(Value),
    /// Sent as `protoPayload`: the JSON mapping of a protocol buffer message, must be a JSON object
    Proto(Value),
}

impl Payload {
    /// Serializes `message` into a proto payload.
    ///
    /// The message is expected to serialize to the canonical JSON mapping of a
    /// protocol buffer, i.e. a JSON object, optionally carrying an `@type` member.
    pub fn proto<M: Serialize + ?Sized>(message: &M) -> Result<Self> {
        serde_json::to_value(message)
            .map(Payload::Proto)
            .map_err(|source| Error::SerializeError {
                context: "serializing proto payload".to_string(),
                source,
            })
    }

    /// The kind name used in error messages: `text`, `struct` or `proto`.
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Text(_) => "text",
            Payload::Json(_) => "struct",
            Payload::Proto(_) => "proto",
        }
    }

    /// Checks the payload can be represented in a [`LogEntry`].
    pub fn validate(&self) -> Result<()> {
        match self {
            Payload::Text(_) => Ok(()),
            Payload::Json(value) | Payload::Proto(value) if value.is_object() => Ok(()),
            Payload::Json(value) | Payload::Proto(value) => Err(Error::InvalidPayload {
                kind: self.kind(),
                reason: format!("expected a JSON object, got {}", json_type_name(value)),
            }),
        }
    }

    fn apply(self, entry: &mut LogEntry) -> Result<()> {
        self.validate()?;
        match self {
            Payload::Text(text) => entry.text_payload = Some(text),
            Payload::Json(value) => entry.json_payload = Some(into_fields(value)),
            Payload::Proto(value) => entry.proto_payload = Some(into_fields(value)),
        }
        Ok(())
    }
}

fn into_fields(value: Value) -> HashMap<String, Value> {
    match value {
        Value::Object(map) => map.into_iter().collect(),
        _ => HashMap::new(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Optional metadata attached to a single log entry.
#[derive(Debug, Clone, Default)]
pub struct EntryOptions {
    pub labels: Option<HashMap<String, String>>,
    pub insert_id: Option<String>,
    pub severity: Option<Severity>,
    pub http_request: Option<HttpRequest>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl EntryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_labels<I, K, V>(self, labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            labels: Some(
                labels
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
            ..self
        }
    }

    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_insert_id(self, insert_id: impl Into<String>) -> Self {
        Self {
            insert_id: Some(insert_id.into()),
            ..self
        }
    }

    #[must_use]
    pub fn with_severity(self, severity: Severity) -> Self {
        Self {
            severity: Some(severity),
            ..self
        }
    }

    #[must_use]
    pub fn with_http_request(self, http_request: HttpRequest) -> Self {
        Self {
            http_request: Some(http_request),
            ..self
        }
    }

    #[must_use]
    pub fn with_timestamp(self, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp: Some(timestamp),
            ..self
        }
    }

    fn apply(self, entry: &mut LogEntry) {
        entry.labels = self.labels.filter(|labels| !labels.is_empty());
        entry.insert_id = self.insert_id;
        entry.severity = self.severity.map(|s| s.to_string());
        entry.http_request = self.http_request;
        entry.timestamp = self.timestamp;
    }
}

/// Builds the [`LogEntry`] for a payload and its options. Logger level fields
/// (`logName`, `resource`, default labels) are left to the caller.
pub(crate) fn build_log_entry(payload: Payload, options: EntryOptions) -> Result<LogEntry> {
    let mut entry = LogEntry::default();
    payload.apply(&mut entry)?;
    options.apply(&mut entry);
    Ok(entry)
}

/// A log entry as read back from the API.
#[derive(Debug, Clone, Default)]
pub struct Entry {
    pub log_name: Option<String>,
    pub payload: Option<Payload>,
    pub labels: HashMap<String, String>,
    pub insert_id: Option<String>,
    pub severity: Option<Severity>,
    pub http_request: Option<HttpRequest>,
    pub timestamp: Option<DateTime<Utc>>,
    pub resource: Option<MonitoredResource>,
}

impl Entry {
    /// The log id part of `logName`, still URL-encoded as the API returns it.
    pub fn logger_name(&self) -> Option<&str> {
        self.log_name
            .as_deref()
            .and_then(|name| name.split_once("/logs/"))
            .map(|(_, logger)| logger)
    }

    /// The project part of `logName`, for entries written under a project.
    pub fn project(&self) -> Option<&str> {
        self.log_name
            .as_deref()
            .and_then(|name| name.strip_prefix("projects/"))
            .and_then(|rest| rest.split_once("/logs/"))
            .map(|(project, _)| project)
    }
}

impl From<LogEntry> for Entry {
    fn from(entry: LogEntry) -> Self {
        let payload = match (entry.text_payload, entry.json_payload, entry.proto_payload) {
            (Some(text), _, _) => Some(Payload::Text(text)),
            (None, Some(fields), _) => {
                Some(Payload::Json(Value::Object(fields.into_iter().collect())))
            }
            (None, None, Some(fields)) => {
                Some(Payload::Proto(Value::Object(fields.into_iter().collect())))
            }
            (None, None, None) => None,
        };

        Entry {
            log_name: entry.log_name,
            payload,
            labels: entry.labels.unwrap_or_default(),
            insert_id: entry.insert_id,
            severity: entry.severity.and_then(|s| s.parse().ok()),
            http_request: entry.http_request,
            timestamp: entry.timestamp,
            resource: entry.resource,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::to_json_body;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn severity_formats_upper_case_and_parses_any_case() {
        assert_eq!(Severity::Critical.to_string(), "CRITICAL");
        assert_eq!(Severity::Default.as_ref(), "DEFAULT");
        assert_eq!("warning".parse::<Severity>().unwrap(), Severity::Warning);
        assert_eq!("EMERGENCY".parse::<Severity>().unwrap(), Severity::Emergency);
        assert!("loud".parse::<Severity>().is_err());
    }

    #[test]
    fn payload_kinds() {
        assert_eq!(Payload::Text("x".into()).kind(), "text");
        assert_eq!(Payload::Json(json!({})).kind(), "struct");
        assert_eq!(Payload::Proto(json!({})).kind(), "proto");
    }

    #[test]
    fn non_object_payloads_are_rejected() {
        let err = build_log_entry(Payload::Json(json!(["a"])), EntryOptions::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidPayload { kind: "struct", .. }));

        let err = Payload::Proto(json!("BOGUS")).validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid proto payload: expected a JSON object, got a string"
        );
    }

    #[test]
    fn proto_payload_from_serializable_message() {
        #[derive(Serialize)]
        struct Struct {
            foo: bool,
        }
        let payload = Payload::proto(&Struct { foo: true }).unwrap();
        assert_eq!(payload, Payload::Proto(json!({"foo": true})));
    }

    #[test]
    fn entry_carries_only_given_options() {
        let timestamp = Utc
            .with_ymd_and_hms(2016, 12, 31, 0, 1, 2)
            .unwrap()
            .checked_add_signed(chrono::Duration::microseconds(999_999))
            .unwrap();
        let entry = build_log_entry(
            Payload::Text("TEXT".into()),
            EntryOptions::new()
                .with_insert_id("IID")
                .with_severity(Severity::Critical)
                .with_timestamp(timestamp),
        )
        .unwrap();

        assert_eq!(
            to_json_body(&entry).unwrap(),
            json!({
                "textPayload": "TEXT",
                "insertId": "IID",
                "severity": "CRITICAL",
                "timestamp": "2016-12-31T00:01:02.999999Z",
            })
        );
    }

    #[test]
    fn empty_labels_are_omitted() {
        let entry = build_log_entry(
            Payload::Text("TEXT".into()),
            EntryOptions::new().with_labels(Vec::<(String, String)>::new()),
        )
        .unwrap();
        assert!(entry.labels.is_none());
    }

    #[test]
    fn entry_from_api_response() {
        let log_entry: LogEntry = serde_json::from_value(json!({
            "logName": "projects/test-project/logs/logger-name",
            "jsonPayload": {"message": "MESSAGE", "weather": "cloudy"},
            "labels": {"foo": "bar"},
            "insertId": "IID",
            "severity": "WARNING",
            "timestamp": "2016-12-31T00:01:02.999999Z",
            "resource": {"type": "global"},
        }))
        .unwrap();

        let entry = Entry::from(log_entry);
        assert_eq!(entry.project(), Some("test-project"));
        assert_eq!(entry.logger_name(), Some("logger-name"));
        assert_eq!(
            entry.payload,
            Some(Payload::Json(json!({"message": "MESSAGE", "weather": "cloudy"})))
        );
        assert_eq!(entry.labels.get("foo").map(String::as_str), Some("bar"));
        assert_eq!(entry.insert_id.as_deref(), Some("IID"));
        assert_eq!(entry.severity, Some(Severity::Warning));
        assert_eq!(
            entry.timestamp.map(|t| t.timestamp_subsec_micros()),
            Some(999_999)
        );
    }

    #[test]
    fn entry_without_payload() {
        let entry = Entry::from(LogEntry {
            log_name: Some("organizations/42/logs/audit".to_string()),
            ..Default::default()
        });
        assert_eq!(entry.payload, None);
        assert_eq!(entry.logger_name(), Some("audit"));
        assert_eq!(entry.project(), None);
    }
}
