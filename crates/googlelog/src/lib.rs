//! A client for [Google Cloud Logging](https://cloud.google.com/logging), with an implementation of
//! [`slog::Drain`](https://slog-rs.github.io/slog/slog/trait.Drain.html) on top of it.
//!
//! # Usage
//!
//! A [`Client`] binds a project to a [`LoggingApi`]. In production that is the REST
//! [`HttpApi`], authorized by one of the [`Credentials`]. The client hands out [`Logger`]s,
//! which write [log entries](https://cloud.google.com/logging/docs/reference/v2/rest/v2/LogEntry)
//! one at a time or collected in a [`Batch`], delete their log, and list its entries.
//!
//! ```no_run
//! use googlelog::{Client, Credentials, EntryOptions, Severity};
//! use serde_json::json;
//!
//! # async fn run() -> googlelog::Result<()> {
//! let client = Client::with_http("my-gcp-project", Credentials::metadata_server())?;
//! let logger = client.logger("my-log-id");
//!
//! logger
//!     .log_struct(
//!         json!({"message": "started", "version": 3}),
//!         EntryOptions::new().with_severity(Severity::Notice),
//!     )
//!     .await?;
//!
//! let mut batch = logger.batch();
//! batch.log_text("one", EntryOptions::new());
//! batch.log_text("two", EntryOptions::new().with_label("step", "2"));
//! batch.commit().await?;
//! # Ok(())
//! # }
//! ```
//!
//! To send `slog` records to Google, configure the drain with the [`Builder`](drain::Builder::new)
//! and select a build method based on your shipping requirements:
//!
//! 1. [`build()`](drain::Builder::build): Receives [`PendingEntry`]s over a channel and allows you to handle the transportation manually.
//! 2. [`build_with_async_shipper()`](drain::Builder::build_with_async_shipper): Offloads transportation to the [`Shipper`](shipper::Shipper) and its sync-async Bridge in an async context.

/// Googlelog Error types
pub mod error;

/// The seam between the client and the transport
pub mod api;

pub mod batch;

pub mod client;

pub mod credentials;

/// The [`slog::Drain`](https://slog-rs.github.io/slog/slog/trait.Drain.html) Implementation of the slog Drain for [Google Cloud Logging](https://cloud.google.com/logging)
pub mod drain;

pub mod entry;

/// The REST transport
pub mod http;

pub mod list;

pub mod logger;

/// An async process to ship the entries of the drain for you
pub mod shipper;

#[cfg(test)]
mod testing;

pub use api::LoggingApi;
pub use batch::{Batch, PendingEntry};
pub use client::Client;
pub use credentials::Credentials;
pub use entry::{Entry, EntryOptions, Payload, Severity};
pub use error::{Error, Result};
pub use http::HttpApi;
pub use list::{EntryPager, ListOptions, ASCENDING, DESCENDING};
pub use logger::Logger;

pub use google_logging2::api::{
    HttpRequest, ListLogEntriesRequest, ListLogEntriesResponse, LogEntry, MonitoredResource,
    WriteLogEntriesRequest,
};
