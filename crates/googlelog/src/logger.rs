use crate::batch::Batch;
use crate::client::Client;
use crate::entry::{build_log_entry, EntryOptions, Payload};
use crate::error::{Error, Result};
use crate::list::{EntryPager, ListOptions};

use google_logging2::api::{LogEntry, MonitoredResource, WriteLogEntriesRequest};

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// The resource type used when none is configured
pub const GLOBAL_RESOURCE_TYPE: &str = "global";

/// Builder for the [`Logger`]
#[derive(Debug)]
pub struct Builder {
    name: String,
    labels: Option<HashMap<String, String>>,
    resource_type: String,
    resource_labels: Option<HashMap<String, String>>,
}

/// A named log under the project of its [`Client`].
///
/// Entries written through the logger end up in the log named
/// [`full_name`](Logger::full_name), attributed to its [MonitoredResource](https://cloud.google.com/logging/docs/reference/v2/rest/v2/MonitoredResource).
#[derive(Debug, Clone)]
pub struct Logger {
    name: String,
    client: Client,
    labels: Option<HashMap<String, String>>,
    resource: MonitoredResource,
}

impl Builder {
    /// Creates a Builder object.
    ///
    /// # Parameters
    /// - `name`: The log id, the last part of the `logName` of the [LogEntry](https://cloud.google.com/logging/docs/reference/v2/rest/v2/LogEntry)
    ///
    /// # Example
    ///
    /// ```
    /// use googlelog::{logger::Builder, Client, Credentials};
    /// let client = Client::with_http("my-gcp-project", Credentials::metadata_server()).unwrap();
    /// let logger = Builder::new("my-log-id")
    ///     .with_resource_type("k8s_container")
    ///     .build(&client);
    /// assert_eq!(logger.full_name(), "projects/my-gcp-project/logs/my-log-id");
    /// ```
    #[must_use = "The builder must be used"]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            labels: None,
            resource_type: GLOBAL_RESOURCE_TYPE.to_string(),
            resource_labels: None,
        }
    }

    /// Sets the labels applied to every entry written through the logger.
    #[must_use = "The builder must be used"]
    pub fn with_labels(self, labels: HashMap<String, String>) -> Self {
        Self {
            labels: Some(labels),
            ..self
        }
    }

    /// Sets default labels from a JSON object.
    ///
    /// # Example
    ///
    /// ```
    /// use serde_json::json;
    /// use googlelog::logger::Builder;
    /// let builder = Builder::new("my-log-id")
    ///     .with_default_labels(json!({
    ///         "application": "my-application",
    ///         "environment": "production",
    ///     }))
    ///     .unwrap();
    /// ```
    ///
    /// # Errors
    ///
    /// Will return `Err` if `labels` is not a JSON object with string values.
    pub fn with_default_labels(self, labels: Value) -> Result<Self> {
        Ok(Self {
            labels: Some(serde_json::from_value(labels).map_err(Error::DefaultLabelsError)?),
            ..self
        })
    }

    /// Sets the required `type` field of the `resource`, `global` when not set.
    #[must_use = "The builder must be used"]
    pub fn with_resource_type(self, resource_type: &str) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            ..self
        }
    }

    /// Sets resource labels to be applied.
    ///
    /// These labels will populate the `labels` field in the `resource` [MonitoredResource](https://cloud.google.com/logging/docs/reference/v2/rest/v2/MonitoredResource) object.
    ///
    /// # Errors
    ///
    /// Will return `Err` if `labels` is not a JSON object with string values.
    pub fn with_resource_labels(self, labels: Value) -> Result<Self> {
        Ok(Self {
            resource_labels: Some(
                serde_json::from_value(labels).map_err(Error::ResourceLabelsError)?,
            ),
            ..self
        })
    }

    pub fn build(self, client: &Client) -> Logger {
        Logger {
            name: self.name,
            client: client.clone(),
            labels: self.labels,
            resource: MonitoredResource {
                type_: Some(self.resource_type),
                labels: self.resource_labels,
            },
        }
    }
}

impl Logger {
    /// A logger with no default labels, attributed to the `global` resource.
    pub fn new(name: &str, client: &Client) -> Self {
        Builder::new(name).build(client)
    }

    pub fn builder(name: &str) -> Builder {
        Builder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn project(&self) -> &str {
        self.client.project()
    }

    /// The default labels, `None` unless configured.
    pub fn labels(&self) -> Option<&HashMap<String, String>> {
        self.labels.as_ref()
    }

    pub fn resource(&self) -> &MonitoredResource {
        &self.resource
    }

    /// `projects/{project}/logs/{name}`, the `logName` of the entries
    pub fn full_name(&self) -> String {
        format!("projects/{}/logs/{}", self.project(), self.name)
    }

    /// The URL path of the log resource
    pub fn path(&self) -> String {
        format!("/{}", self.full_name())
    }

    /// Runs the operations of this logger against another client.
    pub fn with_client<'a>(&'a self, client: &'a Client) -> LoggerWithClient<'a> {
        LoggerWithClient {
            logger: self,
            client,
        }
    }

    /// A [`Batch`] bound to this logger and its client.
    pub fn batch(&self) -> Batch {
        self.with_client(&self.client).batch()
    }

    pub async fn log_text(&self, text: impl Into<String>, options: EntryOptions) -> Result<()> {
        self.with_client(&self.client).log_text(text, options).await
    }

    /// Writes a `jsonPayload` entry, `info` must be a JSON object.
    pub async fn log_struct(&self, info: Value, options: EntryOptions) -> Result<()> {
        self.with_client(&self.client).log_struct(info, options).await
    }

    /// Writes a `protoPayload` entry from the JSON mapping of a protocol buffer message.
    pub async fn log_proto<M: Serialize + ?Sized>(
        &self,
        message: &M,
        options: EntryOptions,
    ) -> Result<()> {
        self.with_client(&self.client).log_proto(message, options).await
    }

    pub async fn log(&self, payload: Payload, options: EntryOptions) -> Result<()> {
        self.with_client(&self.client).log(payload, options).await
    }

    /// Deletes the log and all its entries.
    pub async fn delete(&self) -> Result<()> {
        self.with_client(&self.client).delete().await
    }

    /// Lists the entries of this log. A filter in `options` is combined with the log name.
    pub fn list_entries(&self, options: ListOptions) -> EntryPager {
        self.with_client(&self.client).list_entries(options)
    }

    // Default labels overlaid with the explicit ones
    fn merge_labels(
        &self,
        labels: Option<HashMap<String, String>>,
    ) -> Option<HashMap<String, String>> {
        match (&self.labels, labels) {
            (None, labels) => labels,
            (Some(defaults), None) => Some(defaults.clone()),
            (Some(defaults), Some(labels)) => {
                let mut merged = defaults.clone();
                merged.extend(labels);
                Some(merged)
            }
        }
    }

    fn construct_log_entry(&self, payload: Payload, mut options: EntryOptions) -> Result<LogEntry> {
        options.labels = self.merge_labels(options.labels.take());
        let mut entry = build_log_entry(payload, options)?;
        entry.log_name = Some(self.full_name());
        entry.resource = Some(self.resource.clone());
        Ok(entry)
    }
}

/// A [`Logger`] paired with the [`Client`] its operations go through.
#[derive(Debug, Clone, Copy)]
pub struct LoggerWithClient<'a> {
    logger: &'a Logger,
    client: &'a Client,
}

impl LoggerWithClient<'_> {
    pub fn batch(&self) -> Batch {
        Batch::new(self.logger.clone(), self.client.clone())
    }

    pub async fn log_text(&self, text: impl Into<String>, options: EntryOptions) -> Result<()> {
        self.log(Payload::Text(text.into()), options).await
    }

    pub async fn log_struct(&self, info: Value, options: EntryOptions) -> Result<()> {
        self.log(Payload::Json(info), options).await
    }

    pub async fn log_proto<M: Serialize + ?Sized>(
        &self,
        message: &M,
        options: EntryOptions,
    ) -> Result<()> {
        self.log(Payload::proto(message)?, options).await
    }

    /// Writes a single entry in its own request.
    pub async fn log(&self, payload: Payload, options: EntryOptions) -> Result<()> {
        let entry = self.logger.construct_log_entry(payload, options)?;
        let request = WriteLogEntriesRequest {
            entries: Some(vec![entry]),
            ..Default::default()
        };
        self.client.api().write_entries(request).await
    }

    pub async fn delete(&self) -> Result<()> {
        self.client
            .api()
            .logger_delete(self.logger.project(), self.logger.name())
            .await
    }

    pub fn list_entries(&self, options: ListOptions) -> EntryPager {
        let log_filter = format!("logName={}", self.logger.full_name());
        let filter = match options.filter {
            Some(filter) => format!("{filter} AND {log_filter}"),
            None => log_filter,
        };
        let projects = options
            .projects
            .or_else(|| Some(vec![self.logger.project().to_string()]));
        self.client.list_entries(ListOptions {
            projects,
            filter: Some(filter),
            ..options
        })
    }
}
