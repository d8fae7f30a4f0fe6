//! Error taxonomy for the LogStitch client.

use serde::Deserialize;

/// Errors surfaced by the client.
///
/// Queue overflow is deliberately absent: a full queue drops the new
/// event silently and is not an error condition.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid construction-time configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Network-level failure with no usable response, after exhausting
    /// the retry budget.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response from the API.
    #[error("api error (status {status}): {code}: {message}")]
    Api {
        /// HTTP status code of the response.
        status: u16,
        /// Server-provided machine-readable error code.
        code: String,
        /// Human-readable message from the server.
        message: String,
        /// Server request identifier for support correlation.
        request_id: String,
    },

    /// A request that could not be built or replayed for a retry.
    #[error("request error: {0}")]
    Request(String),
}

/// Wire shape of an API error body: `{"error": {"code", "message"}, "request_id"}`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: ErrorDetail,
    #[serde(default)]
    request_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDetail {
    code: Option<String>,
    message: Option<String>,
}

impl Error {
    /// Maps a non-2xx response to [`Error::Api`], buffering the body so
    /// server-provided details survive. Unparseable bodies fall back to
    /// `unknown_error` / `HTTP {status}` / empty request id.
    pub(crate) async fn from_response(response: reqwest::Response) -> Error {
        let status = response.status().as_u16();
        let body = response.bytes().await.unwrap_or_default();
        Error::api_from_body(status, &body)
    }

    fn api_from_body(status: u16, body: &[u8]) -> Error {
        let parsed: ErrorBody = serde_json::from_slice(body).unwrap_or_default();
        Error::Api {
            status,
            code: parsed
                .error
                .code
                .unwrap_or_else(|| "unknown_error".to_string()),
            message: parsed
                .error
                .message
                .unwrap_or_else(|| format!("HTTP {status}")),
            request_id: parsed.request_id,
        }
    }
}
