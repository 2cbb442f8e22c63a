//! Error types for the speedrun.com API client.
//!
//! # Design
//! `NotFound` gets a dedicated variant because callers frequently distinguish
//! "the resource does not exist" from "the server returned an unexpected
//! status." All other non-2xx responses land in `HttpError` with the raw
//! status code and body for debugging.
//!
//! Builder-side failures (`InvalidParameter`, `InvalidEmbed`,
//! `IncompletePath`, ...) are raised before any request is built and always
//! name the resource they were raised for.

use thiserror::Error;

/// Errors returned by the client, the query builder and the facade.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request did not complete within the configured timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Connection-level failure (DNS, refused connection, reset, TLS).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The server returned 404: the requested resource does not exist.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    #[error("{resource} does not accept the parameter `{param}`")]
    InvalidParameter { resource: &'static str, param: String },

    #[error("invalid value for `{param}` on {resource}: {reason}")]
    InvalidParameterValue {
        resource: &'static str,
        param: String,
        reason: String,
    },

    #[error("cannot embed `{embed}` in {resource}")]
    InvalidEmbed { resource: &'static str, embed: String },

    /// A terminal call was made before an identifying path parameter was set.
    #[error("{resource} query is missing the required `{param}` parameter")]
    IncompletePath {
        resource: &'static str,
        param: &'static str,
    },

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Whether a GET that failed with this error may be retried.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Timeout(_) | ApiError::Transport(_) => true,
            ApiError::HttpError { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        ApiError::InvalidUrl(err.to_string())
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_and_throttling_are_transient() {
        for status in [429, 500, 502, 503, 599] {
            let err = ApiError::HttpError {
                status,
                body: String::new(),
            };
            assert!(err.is_transient(), "{status} should be retried");
        }
    }

    #[test]
    fn client_errors_are_not_transient() {
        for status in [400, 401, 403, 422] {
            let err = ApiError::HttpError {
                status,
                body: String::new(),
            };
            assert!(!err.is_transient(), "{status} should not be retried");
        }
        assert!(!ApiError::NotFound.is_transient());
        assert!(!ApiError::DeserializationError("bad".into()).is_transient());
    }

    #[test]
    fn connection_failures_are_transient() {
        assert!(ApiError::Timeout("10s".into()).is_transient());
        assert!(ApiError::Transport("refused".into()).is_transient());
    }

    #[test]
    fn builder_errors_name_the_resource() {
        let err = ApiError::InvalidEmbed {
            resource: "Runs",
            embed: "moderators".into(),
        };
        assert_eq!(err.to_string(), "cannot embed `moderators` in Runs");

        let err = ApiError::IncompletePath {
            resource: "Leaderboards",
            param: "category",
        };
        assert_eq!(
            err.to_string(),
            "Leaderboards query is missing the required `category` parameter"
        );
    }
}
