use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised while talking to the API or writing the export.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport level failure from the HTTP client.
    #[error("{0}")]
    Reqwest(#[from] reqwest::Error),

    /// A response or record could not be (de)serialized.
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem failure while reading configuration or writing output.
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// The API refused the request because a request quota was exceeded.
    #[error("rate limit exceeded (code {code}): {message}")]
    RateLimited {
        /// Envelope error code, or the HTTP status when no envelope was sent.
        code: u16,
        /// Message returned by the API.
        message: String,
    },

    /// The API answered with a non-zero error code.
    #[error("api error (code {code}): {message}")]
    Api {
        /// Envelope error code.
        code: u16,
        /// Message returned by the API.
        message: String,
    },

    /// The server answered with a status and body that is not an API envelope.
    #[error("unexpected status code: {0}")]
    UnexpectedStatus(StatusCode),

    /// The endpoint is not present in the interface description.
    #[error("unknown endpoint `{0}`")]
    UnknownEndpoint(String),

    /// A parameter the interface description marks as required was not given.
    #[error("endpoint `{endpoint}` requires parameter `{parameter}`")]
    MissingParameter {
        /// Dotted endpoint name.
        endpoint: String,
        /// Name of the absent parameter.
        parameter: String,
    },

    /// A record lacks a field the export depends on.
    #[error("record is missing the `{0}` field")]
    MissingField(&'static str),

    /// The output directory is missing or not usable.
    #[error("{}: {reason}", .path.display())]
    InvalidDirectory {
        /// Path that was checked.
        path: PathBuf,
        /// Why it was rejected.
        reason: &'static str,
    },
}

impl Error {
    /// Returns `true` if the API signalled an exceeded quota.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Error::RateLimited { .. })
    }

    /// Returns `true` for any error reported by the API itself,
    /// as opposed to transport, decoding or local failures.
    pub fn is_api_error(&self) -> bool {
        matches!(self, Error::RateLimited { .. } | Error::Api { .. })
    }
}
