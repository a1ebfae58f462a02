use crate::error::Result;

use async_trait::async_trait;
use google_logging2::api::{ListLogEntriesRequest, ListLogEntriesResponse, WriteLogEntriesRequest};

/// The calls this crate makes against the [Logging API](https://cloud.google.com/logging/docs/reference/v2/rest).
///
/// [`HttpApi`](crate::http::HttpApi) is the production implementation. Everything above this
/// trait only builds request bodies, which makes it the seam to substitute in tests.
#[async_trait]
pub trait LoggingApi: Send + Sync {
    /// [entries.write](https://cloud.google.com/logging/docs/reference/v2/rest/v2/entries/write)
    async fn write_entries(&self, request: WriteLogEntriesRequest) -> Result<()>;

    /// [entries.list](https://cloud.google.com/logging/docs/reference/v2/rest/v2/entries/list)
    async fn list_entries(&self, request: ListLogEntriesRequest) -> Result<ListLogEntriesResponse>;

    /// [projects.logs.delete](https://cloud.google.com/logging/docs/reference/v2/rest/v2/projects.logs/delete)
    async fn logger_delete(&self, project: &str, logger_name: &str) -> Result<()>;
}
