//! # Connector Events
//!
//! Typed replacement for the host runtime's `emit(kind, payload)` callback.
//!
//! ## Overview
//!
//! Triggers report their results as a sequence of [`ConnectorEvent`]s pushed
//! into an [`EventSink`]. The host adapter translates each event into its own
//! emission. Ordering and cardinality are part of the contract:
//!
//! ```text
//! success:  Data* -> Snapshot -> End
//! no-op:    End
//! failure:  Error
//! ```
//!
//! ## Sinks
//!
//! - [`CollectingSink`]: buffers events in memory, used by tests and by hosts
//!   that drain the result after the invocation returns
//! - [`EventBus`]: `tokio::sync::broadcast` fan-out for hosts that stream
//!   events to several subscribers
//!
//! ```rust
//! use core_runtime::events::{CollectingSink, ConnectorEvent, EventSink};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let sink = CollectingSink::new();
//! sink.emit(ConnectorEvent::data(serde_json::json!({ "Name": "Ada" })))
//!     .await
//!     .unwrap();
//! sink.emit(ConnectorEvent::End).await.unwrap();
//!
//! assert_eq!(sink.kinds(), vec!["data", "end"]);
//! # }
//! ```

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::RecvError;
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// One emission towards the host runtime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "payload", rename_all = "lowercase")]
pub enum ConnectorEvent {
    /// One new or changed record
    Data(serde_json::Value),
    /// Updated cursor to persist for the next invocation
    Snapshot(serde_json::Value),
    /// The invocation failed; no snapshot follows
    Error { message: String },
    /// The invocation finished
    End,
}

impl ConnectorEvent {
    pub fn data(body: serde_json::Value) -> Self {
        ConnectorEvent::Data(body)
    }

    pub fn error(message: impl Into<String>) -> Self {
        ConnectorEvent::Error {
            message: message.into(),
        }
    }

    /// Event kind as the host runtime names it
    pub fn kind(&self) -> &'static str {
        match self {
            ConnectorEvent::Data(_) => "data",
            ConnectorEvent::Snapshot(_) => "snapshot",
            ConnectorEvent::Error { .. } => "error",
            ConnectorEvent::End => "end",
        }
    }
}

/// Destination for connector events.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: ConnectorEvent) -> Result<()>;
}

/// In-memory sink preserving emission order.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<ConnectorEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far
    pub fn events(&self) -> Vec<ConnectorEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.events().iter().map(ConnectorEvent::kind).collect()
    }

    /// Payloads of all `Data` events, in order
    pub fn data(&self) -> Vec<serde_json::Value> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ConnectorEvent::Data(body) => Some(body),
                _ => None,
            })
            .collect()
    }

    /// Payload of the last `Snapshot` event, if any
    pub fn last_snapshot(&self) -> Option<serde_json::Value> {
        self.events().into_iter().rev().find_map(|event| match event {
            ConnectorEvent::Snapshot(snapshot) => Some(snapshot),
            _ => None,
        })
    }
}

#[async_trait]
impl EventSink for CollectingSink {
    async fn emit(&self, event: ConnectorEvent) -> Result<()> {
        self.events
            .lock()
            .map_err(|_| Error::Sink("collecting sink poisoned".to_string()))?
            .push(event);
        Ok(())
    }
}

/// Broadcast sink; every subscriber sees every event.
///
/// Subscribers that fall behind receive `RecvError::Lagged(n)` and keep
/// receiving newer events. Emitting with no subscriber is not an error.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ConnectorEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> Receiver<ConnectorEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

#[async_trait]
impl EventSink for EventBus {
    async fn emit(&self, event: ConnectorEvent) -> Result<()> {
        // Err only means nobody is listening
        let _ = self.sender.send(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_kinds() {
        assert_eq!(ConnectorEvent::data(json!({})).kind(), "data");
        assert_eq!(ConnectorEvent::Snapshot(json!({})).kind(), "snapshot");
        assert_eq!(ConnectorEvent::error("boom").kind(), "error");
        assert_eq!(ConnectorEvent::End.kind(), "end");
    }

    #[test]
    fn test_event_serialization_shape() {
        let event = ConnectorEvent::Snapshot(json!({ "lastEmittedLine": 3 }));
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(
            value,
            json!({ "kind": "snapshot", "payload": { "lastEmittedLine": 3 } })
        );
    }

    #[tokio::test]
    async fn test_collecting_sink_preserves_order() {
        let sink = CollectingSink::new();
        sink.emit(ConnectorEvent::data(json!({ "A": 1 }))).await.unwrap();
        sink.emit(ConnectorEvent::data(json!({ "A": 2 }))).await.unwrap();
        sink.emit(ConnectorEvent::Snapshot(json!({ "lastEmittedLine": 2 })))
            .await
            .unwrap();
        sink.emit(ConnectorEvent::End).await.unwrap();

        assert_eq!(sink.kinds(), vec!["data", "data", "snapshot", "end"]);
        assert_eq!(sink.data(), vec![json!({ "A": 1 }), json!({ "A": 2 })]);
        assert_eq!(
            sink.last_snapshot(),
            Some(json!({ "lastEmittedLine": 2 }))
        );
    }

    #[tokio::test]
    async fn test_event_bus_fan_out() {
        let bus = EventBus::new(10);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.emit(ConnectorEvent::End).await.unwrap();

        assert_eq!(first.recv().await.unwrap(), ConnectorEvent::End);
        assert_eq!(second.recv().await.unwrap(), ConnectorEvent::End);
    }

    #[tokio::test]
    async fn test_event_bus_without_subscribers() {
        let bus = EventBus::default();
        assert!(bus.emit(ConnectorEvent::End).await.is_ok());
    }
}
