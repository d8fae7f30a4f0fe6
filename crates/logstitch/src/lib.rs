//! Async client for the LogStitch audit-log ingestion API.
//!
//! Events are buffered in a bounded in-memory queue and delivered in
//! batches, either when the batch-size threshold is reached or when the
//! periodic flush timer fires. Delivery goes through an HTTP transport
//! with bounded retry and jittered exponential backoff: client errors
//! (4xx) surface after a single attempt, while server errors (5xx) and
//! network failures are retried.
//!
//! # Example
//!
//! ```no_run
//! use logstitch::{Actor, ActorType, Client, Config, Event, EventCategory};
//!
//! # async fn example() -> Result<(), logstitch::Error> {
//! let client = Client::new(Config {
//!     api_key: "ls_live_example".to_string(),
//!     ..Config::default()
//! })?;
//!
//! client.log(Event::new(
//!     "user.login",
//!     EventCategory::Auth,
//!     Actor::new("usr_123", ActorType::User),
//!     "tenant_1",
//! ));
//!
//! client.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Delivery guarantees
//!
//! This is not a durable queue: nothing persists across a process
//! restart, and the queue is lossy under pressure — when it is full new
//! events are dropped silently. In non-strict mode (the default),
//! delivery failures for queued events are routed to the optional error
//! callback and otherwise discarded. [`Client::log_batch`] bypasses the
//! queue and always surfaces the real outcome to the caller.

pub mod client;
pub mod config;
pub mod error;
pub mod event;
pub mod queue;
pub mod response;
pub mod transport;

pub use client::Client;
pub use config::{Config, ErrorCallback};
pub use error::Error;
pub use event::{
    Actor, ActorType, Change, Event, EventCategory, EventFilter, RequestContext, Target,
};
pub use response::{EventsPage, IngestResponse, ViewerToken, ViewerTokenRequest};
pub use transport::RetryPolicy;
