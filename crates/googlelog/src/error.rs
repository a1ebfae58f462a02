use reqwest::{self, StatusCode};

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to read the default labels, expected a JSON object of strings. Parse error: {0}")]
    DefaultLabelsError(serde_json::Error),
    #[error("Failed to read the resource labels, expected a JSON object of strings. Parse error: {0}")]
    ResourceLabelsError(serde_json::Error),
    #[error("Invalid {kind} payload: {reason}")]
    InvalidPayload { kind: &'static str, reason: String },
    #[error("Serde JSON serialization failed with context '{context}'. Error: {source}")]
    SerializeError {
        context: String,
        source: serde_json::Error,
    },
    #[error("Reqwest error with context '{context}'. Error: {source}")]
    ReqwestError {
        context: String,
        source: reqwest::Error,
    },
    #[error("Invalid URL '{url}': {reason}")]
    UrlError { url: String, reason: String },
    #[error("No 'access_token' found in the metadata server response body")]
    TokenNotFound,
    #[error("No 'expires_in' found in the metadata server response body")]
    TokenExpiryNotFound,
    #[error("The log shipping channel is closed, the entry was dropped")]
    ChannelClosed,
    #[error("Failed to serialize the key/values of a log record: {0}")]
    KvSerializeError(slog::Error),
    #[error("unsuccessful HTTP response error with context '{context}'. HTTP status code: '{status}', body: '{body}'")]
    HttpResponseError {
        context: String,
        status: StatusCode,
        body: String,
    },
}

impl Error {
    /// The HTTP status code returned by the API, if this error came from an API response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::HttpResponseError { status, .. } => Some(*status),
            Error::ReqwestError { source, .. } => source.status(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::ReqwestError {
            context: "Error sending HTTP request".to_string(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Error;
    use reqwest::StatusCode;

    #[test]
    fn status_is_exposed_for_api_errors() {
        let err = Error::HttpResponseError {
            context: "deleting logger".to_string(),
            status: StatusCode::NOT_FOUND,
            body: "Log not found".to_string(),
        };
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert!(err.is_not_found());
    }

    #[test]
    fn validation_errors_carry_no_status() {
        let err = Error::InvalidPayload {
            kind: "proto",
            reason: "expected a JSON object".to_string(),
        };
        assert_eq!(err.status(), None);
        assert_eq!(
            err.to_string(),
            "Invalid proto payload: expected a JSON object"
        );
    }
}
