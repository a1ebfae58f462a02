use crate::client::Client;
use crate::entry::Entry;
use crate::error::Result;

use google_logging2::api::ListLogEntriesRequest;

/// Oldest entries first
pub const ASCENDING: &str = "timestamp asc";
/// Newest entries first
pub const DESCENDING: &str = "timestamp desc";

/// Parameters of an [entries.list](https://cloud.google.com/logging/docs/reference/v2/rest/v2/entries/list) call.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Project ids to search, the client's project when not set
    pub projects: Option<Vec<String>>,
    /// An [advanced logs filter](https://cloud.google.com/logging/docs/view/logging-query-language)
    pub filter: Option<String>,
    /// [`ASCENDING`] or [`DESCENDING`]
    pub order_by: Option<String>,
    pub page_size: Option<i32>,
    /// Continue a previous listing
    pub page_token: Option<String>,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_projects<I, S>(self, projects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            projects: Some(projects.into_iter().map(Into::into).collect()),
            ..self
        }
    }

    #[must_use]
    pub fn with_filter(self, filter: impl Into<String>) -> Self {
        Self {
            filter: Some(filter.into()),
            ..self
        }
    }

    #[must_use]
    pub fn with_order_by(self, order_by: impl Into<String>) -> Self {
        Self {
            order_by: Some(order_by.into()),
            ..self
        }
    }

    #[must_use]
    pub fn with_page_size(self, page_size: i32) -> Self {
        Self {
            page_size: Some(page_size),
            ..self
        }
    }

    #[must_use]
    pub fn with_page_token(self, page_token: impl Into<String>) -> Self {
        Self {
            page_token: Some(page_token.into()),
            ..self
        }
    }

    pub(crate) fn into_request(self, default_project: &str) -> ListLogEntriesRequest {
        ListLogEntriesRequest {
            project_ids: Some(
                self.projects
                    .unwrap_or_else(|| vec![default_project.to_string()]),
            ),
            filter: self.filter,
            order_by: self.order_by,
            page_size: self.page_size,
            page_token: self.page_token,
            ..Default::default()
        }
    }
}

/// Walks the pages of an entries listing.
///
/// Every call to [`next_page`](EntryPager::next_page) is one API request. The
/// `nextPageToken` of a response is sent along with the following request, the listing ends
/// when a response carries none.
#[derive(Debug)]
pub struct EntryPager {
    client: Client,
    request: ListLogEntriesRequest,
    next_page_token: Option<String>,
    exhausted: bool,
}

impl EntryPager {
    pub(crate) fn new(client: Client, request: ListLogEntriesRequest) -> Self {
        Self {
            client,
            next_page_token: request.page_token.clone(),
            request,
            exhausted: false,
        }
    }

    /// The token to continue with, if the last response handed one out.
    pub fn next_page_token(&self) -> Option<&str> {
        self.next_page_token.as_deref()
    }

    /// Fetches the next page, `None` once all pages were fetched.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Entry>>> {
        if self.exhausted {
            return Ok(None);
        }

        let request = ListLogEntriesRequest {
            page_token: self.next_page_token.clone(),
            ..self.request.clone()
        };
        let response = self.client.api().list_entries(request).await?;

        self.next_page_token = response.next_page_token.filter(|token| !token.is_empty());
        self.exhausted = self.next_page_token.is_none();

        Ok(Some(
            response
                .entries
                .unwrap_or_default()
                .into_iter()
                .map(Entry::from)
                .collect(),
        ))
    }

    /// Fetches all remaining pages.
    pub async fn all(&mut self) -> Result<Vec<Entry>> {
        let mut entries = Vec::new();
        while let Some(page) = self.next_page().await? {
            entries.extend(page);
        }
        Ok(entries)
    }
}
