//! Client facade: queued and immediate ingestion plus the pass-through
//! query and viewer-token operations.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::config::{Config, ErrorCallback};
use crate::error::Error;
use crate::event::{Event, EventFilter};
use crate::queue::{BatchQueue, FlushHandler};
use crate::response::{EventsPage, IngestResponse, ViewerToken, ViewerTokenRequest};
use crate::transport::Transport;

const EVENTS_PATH: &str = "/api/v1/events";
const VIEWER_TOKENS_PATH: &str = "/api/v1/viewer-tokens";

/// Asynchronous LogStitch client.
///
/// Owns one batch queue and the delivery configuration; immutable after
/// construction. Cheap to clone — clones share the queue and the HTTP
/// connection pool.
#[derive(Clone)]
pub struct Client {
    delivery: Arc<Delivery>,
    queue: BatchQueue,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

/// Everything needed to put a batch on the wire, shared between the
/// facade and the queue's flush handler.
struct Delivery {
    http: reqwest::Client,
    transport: Transport,
    base_url: String,
    api_key: String,
    strict: bool,
    on_error: Option<ErrorCallback>,
}

impl Delivery {
    /// Delivers a batch: assigns missing idempotency keys, shapes the
    /// payload (a lone event posts as a bare object, two-plus as an
    /// array in insertion order), and sends through the retrying
    /// transport.
    async fn send_events(&self, mut batch: Vec<Event>) -> Result<IngestResponse, Error> {
        for event in &mut batch {
            event.ensure_idempotency_key();
        }
        let body = batch_body(&batch)?;
        let request = self
            .http
            .post(format!("{}{}", self.base_url, EVENTS_PATH))
            .bearer_auth(&self.api_key)
            .json(&body);
        let response = self.transport.send(request).await?;
        parse_response(response).await
    }

    /// Non-strict sink for handled delivery failures: the callback when
    /// configured, otherwise a debug trace and the error is discarded.
    fn report(&self, err: &Error) {
        if let Some(on_error) = &self.on_error {
            on_error(err);
        } else {
            debug!(error = %err, "audit event delivery failed, no error callback configured");
        }
    }
}

/// Binds the queue's flush output to batch delivery, applying the
/// strict/non-strict error policy so detached flushes never surface an
/// unobserved failure.
struct QueueDelivery {
    delivery: Arc<Delivery>,
}

#[async_trait]
impl FlushHandler for QueueDelivery {
    async fn handle_batch(&self, batch: Vec<Event>) -> Result<(), Error> {
        match self.delivery.send_events(batch).await {
            Ok(response) => {
                debug!(
                    accepted = response.ids.len(),
                    request_id = %response.request_id,
                    "audit batch delivered"
                );
                Ok(())
            }
            Err(err) => {
                if self.delivery.strict {
                    // An awaiting `flush`/`close` caller observes the
                    // error through the return value; a detached flush
                    // has no caller, so keep the failure observable here
                    // too.
                    error!(error = %err, "audit batch delivery failed");
                    if let Some(on_error) = &self.delivery.on_error {
                        on_error(&err);
                    }
                    Err(err)
                } else {
                    self.delivery.report(&err);
                    Ok(())
                }
            }
        }
    }
}

impl Client {
    /// Builds a client. Fails synchronously, before any network
    /// activity, when the required API key is absent or empty.
    pub fn new(config: Config) -> Result<Self, Error> {
        config.validate()?;
        let base_url = config.normalized_base_url();
        let http = reqwest::Client::new();
        let transport = Transport::new(config.retry.clone());

        let delivery = Arc::new(Delivery {
            http,
            transport,
            base_url,
            api_key: config.api_key.clone(),
            strict: config.strict,
            on_error: config.on_error.clone(),
        });
        let queue = BatchQueue::new(
            Arc::new(QueueDelivery {
                delivery: Arc::clone(&delivery),
            }),
            config.batch_size,
            config.max_queue_size,
            config.flush_interval,
        );

        Ok(Client { delivery, queue })
    }

    /// Queues an event for background delivery. Never fails: a full
    /// queue drops the event, and delivery failures are routed through
    /// the error policy, not to this caller.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn log(&self, event: Event) {
        self.queue.enqueue(event);
    }

    /// Delivers events immediately, bypassing the queue. Unlike
    /// [`Client::log`], the real outcome is awaited and failures
    /// propagate regardless of strict mode.
    pub async fn log_batch(&self, events: Vec<Event>) -> Result<IngestResponse, Error> {
        if events.is_empty() {
            return Err(Error::Request(
                "log_batch requires at least one event".to_string(),
            ));
        }
        self.delivery.send_events(events).await
    }

    /// Flushes queued events now. In strict mode delivery failures are
    /// returned; otherwise they are routed to the error callback and
    /// `Ok(())` is returned.
    pub async fn flush(&self) -> Result<(), Error> {
        self.queue.flush().await
    }

    /// Stops the flush timer and delivers any remaining queued events.
    pub async fn close(&self) -> Result<(), Error> {
        self.queue.close().await
    }

    /// Number of queued-but-undelivered events.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Lists previously ingested events matching the filter. Unset
    /// filter fields are omitted from the query string.
    pub async fn list_events(&self, filter: &EventFilter) -> Result<EventsPage, Error> {
        let delivery = &self.delivery;
        let request = delivery
            .http
            .get(format!("{}{}", delivery.base_url, EVENTS_PATH))
            .bearer_auth(&delivery.api_key)
            .query(&filter.to_query());
        let response = delivery.transport.send(request).await?;
        parse_response(response).await
    }

    /// Mints a scoped, read-only viewer token for a tenant.
    pub async fn create_viewer_token(
        &self,
        request: &ViewerTokenRequest,
    ) -> Result<ViewerToken, Error> {
        let delivery = &self.delivery;
        let req = delivery
            .http
            .post(format!("{}{}", delivery.base_url, VIEWER_TOKENS_PATH))
            .bearer_auth(&delivery.api_key)
            .json(request);
        let response = delivery.transport.send(req).await?;
        parse_response(response).await
    }
}

/// A lone event posts as a bare object; larger batches as an array that
/// preserves insertion order.
fn batch_body(batch: &[Event]) -> Result<serde_json::Value, Error> {
    let result = if batch.len() == 1 {
        serde_json::to_value(&batch[0])
    } else {
        serde_json::to_value(batch)
    };
    result.map_err(|err| Error::Request(err.to_string()))
}

/// Maps a transport response to the typed payload, converting any
/// non-2xx status to [`Error::Api`].
async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, Error> {
    if !response.status().is_success() {
        return Err(Error::from_response(response).await);
    }
    response.json::<T>().await.map_err(Error::Transport)
}
