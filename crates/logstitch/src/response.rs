//! Response payloads returned by the LogStitch API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Acknowledgement for ingested events.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestResponse {
    /// Server-assigned ids of the accepted events.
    pub ids: Vec<String>,
    /// How many events had fields redacted by server policy.
    #[serde(default)]
    pub redacted_count: u64,
    #[serde(default)]
    pub request_id: String,
}

/// One page of previously ingested events.
///
/// Events are returned as raw JSON values: the server attaches fields
/// (ids, receipt timestamps) the ingest-side model does not carry.
#[derive(Debug, Clone, Deserialize)]
pub struct EventsPage {
    pub events: Vec<Value>,
    /// Opaque pagination cursor for the next page, if any.
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub request_id: String,
}

/// Request body for minting a viewer token.
#[derive(Debug, Clone, Serialize)]
pub struct ViewerTokenRequest {
    pub tenant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
    /// Requested lifetime in seconds; the server applies its default
    /// when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

impl ViewerTokenRequest {
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            tier: None,
            expires_in: None,
        }
    }
}

/// Short-lived, tenant-scoped, read-only credential for an external
/// display component.
#[derive(Debug, Clone, Deserialize)]
pub struct ViewerToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub request_id: String,
}
