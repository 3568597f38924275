//! Domain event fan-out.
//!
//! Every event is logged. When a NATS server is configured, events are also
//! published as JSON envelopes on `storefront.<domain>.<kind>`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::events::DomainEvent;

pub const SUBJECT_PREFIX: &str = "storefront";

#[derive(Clone, Debug, Serialize)]
pub struct EventEnvelope<'a> {
    pub id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub event: &'a DomainEvent,
}

impl<'a> EventEnvelope<'a> {
    pub fn new(event: &'a DomainEvent) -> Self {
        Self { id: Uuid::new_v4(), occurred_at: Utc::now(), event }
    }
}

#[derive(Clone, Debug, Default)]
pub struct EventPublisher {
    nats: Option<async_nats::Client>,
}

impl EventPublisher {
    /// Logs events without publishing them anywhere.
    pub fn disabled() -> Self { Self::default() }

    pub fn with_client(client: async_nats::Client) -> Self { Self { nats: Some(client) } }

    /// Connects to NATS, falling back to log-only when the server is unreachable.
    pub async fn connect(url: &str) -> Self {
        match async_nats::connect(url).await {
            Ok(client) => {
                info!(url, "connected to NATS");
                Self::with_client(client)
            }
            Err(err) => {
                warn!(url, %err, "NATS unavailable, events will only be logged");
                Self::disabled()
            }
        }
    }

    pub fn is_connected(&self) -> bool { self.nats.is_some() }

    pub async fn publish(&self, events: &[DomainEvent]) {
        for event in events {
            let subject = format!("{SUBJECT_PREFIX}.{}", event.subject());
            info!(%subject, ?event, "domain event");
            let Some(client) = &self.nats else { continue };
            let payload = match serde_json::to_vec(&EventEnvelope::new(event)) {
                Ok(payload) => payload,
                Err(err) => {
                    warn!(%subject, %err, "failed to encode event");
                    continue;
                }
            };
            if let Err(err) = client.publish(subject.clone(), payload.into()).await {
                warn!(%subject, %err, "failed to publish event");
            }
        }
    }
}
