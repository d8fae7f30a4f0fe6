//! Audit event data model shared by the ingest and query surfaces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Category of audit event being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Auth,
    Access,
    Mutation,
    Admin,
    Security,
    System,
}

impl EventCategory {
    /// Wire name of the category, as used in query parameters.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Auth => "auth",
            EventCategory::Access => "access",
            EventCategory::Mutation => "mutation",
            EventCategory::Admin => "admin",
            EventCategory::Security => "security",
            EventCategory::System => "system",
        }
    }
}

/// Kind of principal that performed the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorType {
    User,
    ApiKey,
    Service,
    System,
}

impl ActorType {
    /// Wire name of the actor type, as used in query parameters.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorType::User => "user",
            ActorType::ApiKey => "api_key",
            ActorType::Service => "service",
            ActorType::System => "system",
        }
    }
}

/// The principal that performed the action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    #[serde(rename = "type")]
    pub actor_type: ActorType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Actor {
    pub fn new(id: impl Into<String>, actor_type: ActorType) -> Self {
        Self {
            id: id.into(),
            actor_type,
            name: None,
            email: None,
        }
    }
}

/// The resource the action was performed on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub id: String,
    #[serde(rename = "type")]
    pub target_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Target {
    pub fn new(id: impl Into<String>, target_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            target_type: target_type.into(),
            name: None,
        }
    }
}

/// Request-level context captured alongside the event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// One field-level change: the value before and after the action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Change {
    pub field: String,
    pub before: Value,
    pub after: Value,
}

/// A single audit record: an actor's action on an optional target within
/// a tenant.
///
/// Events are immutable once handed to the client. Every event that
/// leaves the process carries a non-empty idempotency key; when the
/// caller does not supply one it is generated exactly once, at the point
/// the event is committed to the queue or to an immediate send, and
/// never regenerated on retry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Free-text verb, e.g. `user.login` or `document.delete`.
    pub action: String,
    pub category: EventCategory,
    pub actor: Actor,
    pub tenant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<RequestContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<Vec<Change>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    /// When the action occurred. The server defaults to receipt time if
    /// absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occurred_at: Option<DateTime<Utc>>,
}

impl Event {
    pub fn new(
        action: impl Into<String>,
        category: EventCategory,
        actor: Actor,
        tenant_id: impl Into<String>,
    ) -> Self {
        Self {
            action: action.into(),
            category,
            actor,
            tenant_id: tenant_id.into(),
            target: None,
            context: None,
            metadata: None,
            changes: None,
            idempotency_key: None,
            occurred_at: None,
        }
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_changes(mut self, changes: Vec<Change>) -> Self {
        self.changes = Some(changes);
        self
    }

    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    pub fn with_occurred_at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }

    /// Assigns a fresh UUIDv4 idempotency key when none is set (or the
    /// caller supplied an empty one). An existing key is left untouched.
    pub(crate) fn ensure_idempotency_key(&mut self) {
        let missing = self.idempotency_key.as_deref().map_or(true, str::is_empty);
        if missing {
            self.idempotency_key = Some(uuid::Uuid::new_v4().to_string());
        }
    }
}

/// Filter for querying previously ingested events.
///
/// Unset fields are omitted from the request entirely.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub tenant_id: Option<String>,
    pub actor_id: Option<String>,
    pub actor_type: Option<ActorType>,
    pub action: Option<String>,
    pub category: Option<EventCategory>,
    pub target_id: Option<String>,
    pub target_type: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub search: Option<String>,
    pub cursor: Option<String>,
    pub limit: Option<u32>,
}

impl EventFilter {
    /// Renders the filter as query-string pairs, string-coercing values
    /// and omitting any unset key.
    pub(crate) fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        push(&mut pairs, "tenant_id", self.tenant_id.clone());
        push(&mut pairs, "actor_id", self.actor_id.clone());
        push(
            &mut pairs,
            "actor_type",
            self.actor_type.map(|t| t.as_str().to_string()),
        );
        push(&mut pairs, "action", self.action.clone());
        push(
            &mut pairs,
            "category",
            self.category.map(|c| c.as_str().to_string()),
        );
        push(&mut pairs, "target_id", self.target_id.clone());
        push(&mut pairs, "target_type", self.target_type.clone());
        push(
            &mut pairs,
            "start_date",
            self.start_date.map(|d| d.to_rfc3339()),
        );
        push(&mut pairs, "end_date", self.end_date.map(|d| d.to_rfc3339()));
        push(&mut pairs, "search", self.search.clone());
        push(&mut pairs, "cursor", self.cursor.clone());
        push(&mut pairs, "limit", self.limit.map(|l| l.to_string()));
        pairs
    }
}

fn push(pairs: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<String>) {
    if let Some(value) = value {
        pairs.push((key, value));
    }
}
