use crate::api::LoggingApi;
use crate::credentials::Credentials;
use crate::error::Result;
use crate::http::HttpApi;
use crate::list::{EntryPager, ListOptions};
use crate::logger::Logger;

use std::fmt;
use std::sync::Arc;

/// A project together with the API used to reach it.
///
/// Cloning is cheap, clones share the same [`LoggingApi`].
#[derive(Clone)]
pub struct Client {
    project: String,
    api: Arc<dyn LoggingApi>,
}

impl Client {
    pub fn new(project: impl Into<String>, api: impl LoggingApi + 'static) -> Self {
        Self::from_arc(project, Arc::new(api))
    }

    pub fn from_arc(project: impl Into<String>, api: Arc<dyn LoggingApi>) -> Self {
        Self {
            project: project.into(),
            api,
        }
    }

    /// A client for the production Logging API endpoint.
    pub fn with_http(project: impl Into<String>, credentials: Credentials) -> Result<Self> {
        Ok(Self::new(project, HttpApi::new(credentials)?))
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn api(&self) -> &dyn LoggingApi {
        self.api.as_ref()
    }

    /// Whether both clients talk through the very same API instance.
    pub fn same_api(&self, other: &Client) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.api) as *const (),
            Arc::as_ptr(&other.api) as *const (),
        )
    }

    /// A [`Logger`] with default settings bound to this client.
    pub fn logger(&self, name: &str) -> Logger {
        Logger::new(name, self)
    }

    /// Lists entries across logs. The projects default to the client's project.
    pub fn list_entries(&self, options: ListOptions) -> EntryPager {
        let request = options.into_request(&self.project);
        EntryPager::new(self.clone(), request)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("project", &self.project)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingApi;

    #[test]
    fn clones_share_the_api() {
        let client = Client::new("test-project", RecordingApi::default());
        let other = Client::new("test-project", RecordingApi::default());
        assert!(client.same_api(&client.clone()));
        assert!(!client.same_api(&other));
        assert_eq!(client.project(), "test-project");
    }

    #[test]
    fn logger_is_bound_to_the_client() {
        let client = Client::new("test-project", RecordingApi::default());
        let logger = client.logger("logger-name");
        assert_eq!(logger.name(), "logger-name");
        assert!(logger.client().same_api(&client));
    }
}
