use crate::api::LoggingApi;
use crate::credentials::{get_error_response, Credentials};
use crate::error::{Error, Result};

use async_trait::async_trait;
use google_logging2::api::{ListLogEntriesRequest, ListLogEntriesResponse, WriteLogEntriesRequest};
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde_json::Value;
use url::Url;

/// The production endpoint of the Logging API
pub const DEFAULT_SERVICE_ENDPOINT: &str = "https://logging.googleapis.com";

// Members holding user data, nulls in there are kept.
const PAYLOAD_MEMBERS: [&str; 2] = ["jsonPayload", "protoPayload"];

/// Serializes a request body the way the API expects it: unset fields are left out instead of
/// being sent as `null`.
pub fn to_json_body<T: Serialize + ?Sized>(body: &T) -> Result<Value> {
    let mut value = serde_json::to_value(body).map_err(|source| Error::SerializeError {
        context: "serializing request body".to_string(),
        source,
    })?;
    remove_json_null_values(&mut value);
    Ok(value)
}

fn remove_json_null_values(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            for (key, v) in map.iter_mut() {
                if !PAYLOAD_MEMBERS.contains(&key.as_str()) {
                    remove_json_null_values(v);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(remove_json_null_values),
        _ => {}
    }
}

/// [`LoggingApi`] over the REST interface of the Logging API
#[derive(Debug)]
pub struct HttpApi {
    client: Client,
    api_base: Url,
    credentials: Credentials,
}

impl HttpApi {
    /// Talks to the production endpoint.
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::with_api_base(credentials, DEFAULT_SERVICE_ENDPOINT)
    }

    /// Talks to another endpoint, e.g. an emulator or a mock server.
    pub fn with_api_base(credentials: Credentials, api_base: &str) -> Result<Self> {
        let api_base = Url::parse(api_base).map_err(|e| Error::UrlError {
            url: api_base.to_string(),
            reason: e.to_string(),
        })?;
        if api_base.cannot_be_a_base() {
            return Err(Error::UrlError {
                url: api_base.to_string(),
                reason: "cannot be used as a base URL".to_string(),
            });
        }
        Ok(Self {
            client: Client::new(),
            api_base,
            credentials,
        })
    }

    pub fn api_base(&self) -> &str {
        self.api_base.as_str()
    }

    // Appends the segments to the base URL, each one percent-encoded on its own.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::UrlError {
                url: self.api_base.to_string(),
                reason: "cannot be used as a base URL".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder, context: &str) -> Result<Response> {
        let request = match self.credentials.token(&self.client).await? {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(|e| Error::ReqwestError {
            context: format!("performing HTTP request {context}"),
            source: e,
        })?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(get_error_response(response, format!("response when {context}")).await)
        }
    }
}

#[async_trait]
impl LoggingApi for HttpApi {
    async fn write_entries(&self, request: WriteLogEntriesRequest) -> Result<()> {
        let body = to_json_body(&request)?;
        let url = self.url(&["v2", "entries:write"])?;
        self.send(
            self.client.post(url).json(&body),
            "writing log entries to the Google Logging API",
        )
        .await?;
        Ok(())
    }

    async fn list_entries(&self, request: ListLogEntriesRequest) -> Result<ListLogEntriesResponse> {
        let body = to_json_body(&request)?;
        let url = self.url(&["v2", "entries:list"])?;
        let response = self
            .send(
                self.client.post(url).json(&body),
                "listing log entries from the Google Logging API",
            )
            .await?;
        response
            .json::<ListLogEntriesResponse>()
            .await
            .map_err(|e| Error::ReqwestError {
                context: "decoding the list entries response".to_string(),
                source: e,
            })
    }

    async fn logger_delete(&self, project: &str, logger_name: &str) -> Result<()> {
        let url = self.url(&["v2", "projects", project, "logs", logger_name])?;
        self.send(
            self.client.delete(url),
            "deleting a log from the Google Logging API",
        )
        .await?;
        Ok(())
    }
}
