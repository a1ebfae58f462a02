//! Access tokens for the Logging API.
//!
//! Outside of emulators the API wants a bearer token. Either pass one in, or let the
//! [metadata server](https://cloud.google.com/compute/docs/metadata/overview) hand one out,
//! which is how [workload identity](https://cloud.google.com/iam/docs/workload-identity-federation) works.
use crate::error::Error;

use chrono::{DateTime, TimeDelta, Utc};
use reqwest::{Client, Response};
use serde::Deserialize;
use std::fmt;
use tokio::sync::Mutex;

/// The documented metadata server host
pub const METADATA_HOST: &str = "http://metadata.google.internal";

/// How the [`HttpApi`](crate::http::HttpApi) authorizes its requests
pub enum Credentials {
    /// No `Authorization` header, e.g. for a local emulator
    Anonymous,
    /// A fixed bearer token
    AccessToken(String),
    /// Tokens fetched from, and cached per, the metadata server
    MetadataServer(MetadataServer),
}

impl Credentials {
    /// Fetches tokens for the `default` service account from the documented metadata server host.
    pub fn metadata_server() -> Self {
        Credentials::MetadataServer(MetadataServer::new(METADATA_HOST, "default"))
    }

    pub(crate) async fn token(&self, client: &Client) -> Result<Option<String>, Error> {
        match self {
            Credentials::Anonymous => Ok(None),
            Credentials::AccessToken(token) => Ok(Some(token.clone())),
            Credentials::MetadataServer(server) => server.token(client).await.map(Some),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Anonymous => write!(f, "Anonymous"),
            Credentials::AccessToken(_) => write!(f, "AccessToken(<redacted>)"),
            Credentials::MetadataServer(server) => f
                .debug_struct("MetadataServer")
                .field("base_url", &server.base_url)
                .field("service_account", &server.service_account)
                .finish(),
        }
    }
}

/// Token source backed by the metadata server
pub struct MetadataServer {
    base_url: String,
    service_account: String,
    token: Mutex<Token>,
}

impl MetadataServer {
    pub fn new(base_url: impl Into<String>, service_account: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            service_account: service_account.into(),
            token: Mutex::new(Token::default()),
        }
    }

    fn token_url(&self) -> String {
        format!(
            "{}/computeMetadata/v1/instance/service-accounts/{}/token",
            self.base_url.trim_end_matches('/'),
            self.service_account
        )
    }

    async fn token(&self, client: &Client) -> Result<String, Error> {
        let mut token = self.token.lock().await;
        token.fetch_access_token(client, &self.token_url()).await
    }
}

/// Token caching
#[derive(Default)]
struct Token {
    token: Option<String>,
    renew_after: DateTime<Utc>,
}

// Example:
// {
//   "access_token": "ya29.c.Ks0Cywchw6EJei_7ifQZKV....oRZy70M2ahRMfHY1qzUxGfxQcQ1cQ",
//   "expires_in": 3166,
//   "token_type": "Bearer"
// }
#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
}

pub(crate) async fn get_error_response(response: Response, context: String) -> Error {
    let status = response.status();

    let body = match response.bytes().await {
        Ok(bytes) => match serde_json::from_slice::<ErrorEnvelope>(&bytes) {
            Ok(envelope) => envelope.error.message,
            Err(_) => String::from_utf8_lossy(&bytes).to_string(),
        },
        Err(e) => format!("could not decode body of HTTP Error response: {e}"),
    };

    Error::HttpResponseError {
        context,
        status,
        body,
    }
}

// {"error": {"code": 403, "message": "...", "status": "PERMISSION_DENIED"}}
#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl Token {
    fn renew_after_from_expires_in(expires_in: u64) -> DateTime<Utc> {
        let renew_after = TimeDelta::seconds(expires_in.saturating_sub(60) as i64);
        Utc::now() + renew_after
    }

    async fn fetch_access_token(&mut self, client: &Client, url: &str) -> Result<String, Error> {
        if let Some(token) = &self.token {
            if Utc::now() < self.renew_after {
                return Ok(token.clone());
            }
        }

        let response = client
            .get(url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| Error::ReqwestError {
                context: "performing HTTP GET token credentials from metadata server".to_string(),
                source: e,
            })?;

        if response.status().is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| Error::ReqwestError {
                    context: "consuming response body of access token request".to_string(),
                    source: e,
                })?;
            let token_data: TokenResponse =
                serde_json::from_str(&body).map_err(|e| Error::SerializeError {
                    context: "deserializing token data".to_string(),
                    source: e,
                })?;
            let token_str = token_data.access_token.ok_or(Error::TokenNotFound)?;
            let expires_in = token_data.expires_in.ok_or(Error::TokenExpiryNotFound)?;
            self.token = Some(token_str.clone());
            self.renew_after = Self::renew_after_from_expires_in(expires_in);
            Ok(token_str)
        } else {
            Err(get_error_response(response, "fetching token".to_string()).await)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renewal_happens_a_minute_early() {
        let renew_after = Token::renew_after_from_expires_in(3600);
        let remaining = renew_after - Utc::now();
        assert!(remaining <= TimeDelta::seconds(3540));
        assert!(remaining > TimeDelta::seconds(3500));
    }

    #[test]
    fn short_lived_tokens_are_renewed_immediately() {
        assert!(Token::renew_after_from_expires_in(30) <= Utc::now());
    }

    #[test]
    fn token_url_for_service_account() {
        let server = MetadataServer::new("http://127.0.0.1:8080/", "logger@example.iam");
        assert_eq!(
            server.token_url(),
            "http://127.0.0.1:8080/computeMetadata/v1/instance/service-accounts/logger@example.iam/token"
        );
    }

    #[test]
    fn access_tokens_are_not_printed() {
        let credentials = Credentials::AccessToken("secret".to_string());
        assert_eq!(format!("{credentials:?}"), "AccessToken(<redacted>)");
    }

    #[tokio::test]
    async fn anonymous_and_static_tokens() {
        let client = Client::new();
        assert_eq!(Credentials::Anonymous.token(&client).await.unwrap(), None);
        assert_eq!(
            Credentials::AccessToken("TOKEN".into())
                .token(&client)
                .await
                .unwrap(),
            Some("TOKEN".to_string())
        );
    }
}
