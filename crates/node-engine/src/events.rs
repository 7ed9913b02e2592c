//! Event types for streaming run progress
//!
//! Events are pushed from the orchestrator to any consumer (the editor
//! canvas, a log, a test harness) through the [`EventSink`] trait, so
//! consumers subscribe instead of polling and the engine stays decoupled
//! from any transport.

use serde::{Deserialize, Serialize};

/// Trait for delivering run events
///
/// Abstracts over the transport (in-memory channel, websocket bridge,
/// test collector).
pub trait EventSink: Send + Sync {
    /// Deliver an event
    ///
    /// Returns an error if the event could not be delivered (e.g. the
    /// channel closed).
    fn send(&self, event: RunEvent) -> Result<(), EventError>;
}

/// Error when delivering an event fails
#[derive(Debug, Clone)]
pub struct EventError {
    pub message: String,
}

impl EventError {
    pub fn channel_closed() -> Self {
        Self {
            message: "channel closed".to_string(),
        }
    }
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "event delivery failed: {}", self.message)
    }
}

impl std::error::Error for EventError {}

/// Events emitted over the lifetime of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RunEvent {
    /// A run started
    #[serde(rename_all = "camelCase")]
    RunStarted {
        workflow_id: String,
        run_id: String,
        node_count: usize,
    },

    /// A node began executing
    #[serde(rename_all = "camelCase")]
    NodeStarted {
        run_id: String,
        node_id: String,
        execution_id: String,
    },

    /// A node completed successfully
    #[serde(rename_all = "camelCase")]
    NodeCompleted {
        run_id: String,
        node_id: String,
        execution_id: String,
        output: Option<serde_json::Value>,
    },

    /// A node failed
    #[serde(rename_all = "camelCase")]
    NodeFailed {
        run_id: String,
        node_id: String,
        execution_id: String,
        error: String,
    },

    /// The run finished with every scheduled node completed
    #[serde(rename_all = "camelCase")]
    RunCompleted {
        workflow_id: String,
        run_id: String,
    },

    /// The run halted on a node failure
    #[serde(rename_all = "camelCase")]
    RunFailed {
        workflow_id: String,
        run_id: String,
        error: String,
    },
}

/// A no-op sink that discards all events
///
/// Useful for tests and headless callers.
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: RunEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// A collecting sink for tests
pub struct VecEventSink {
    events: std::sync::Mutex<Vec<RunEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self {
            events: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// All events collected so far
    pub fn events(&self) -> Vec<RunEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Drop all collected events
    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl Default for VecEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: RunEvent) -> Result<(), EventError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

/// A sink backed by a tokio unbounded channel
///
/// The receiving half can be polled or awaited by whatever serves the
/// editor (SSE bridge, websocket, CLI progress).
pub struct ChannelEventSink {
    sender: tokio::sync::mpsc::UnboundedSender<RunEvent>,
}

impl ChannelEventSink {
    /// Create a sink and its receiving half
    pub fn new() -> (Self, tokio::sync::mpsc::UnboundedReceiver<RunEvent>) {
        let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl EventSink for ChannelEventSink {
    fn send(&self, event: RunEvent) -> Result<(), EventError> {
        self.sender.send(event).map_err(|_| EventError::channel_closed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_sink_collects() {
        let sink = VecEventSink::new();
        sink.send(RunEvent::RunStarted {
            workflow_id: "wf".into(),
            run_id: "run-1".into(),
            node_count: 3,
        })
        .unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 1);
        match &events[0] {
            RunEvent::RunStarted { node_count, .. } => assert_eq!(*node_count, 3),
            other => panic!("unexpected event: {:?}", other),
        }

        sink.clear();
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_null_sink_accepts_everything() {
        let sink = NullEventSink;
        sink.send(RunEvent::RunCompleted {
            workflow_id: "wf".into(),
            run_id: "run-1".into(),
        })
        .unwrap();
    }

    #[tokio::test]
    async fn test_channel_sink_delivers() {
        let (sink, mut receiver) = ChannelEventSink::new();
        sink.send(RunEvent::NodeStarted {
            run_id: "run-1".into(),
            node_id: "a".into(),
            execution_id: "exec-1".into(),
        })
        .unwrap();

        let event = receiver.recv().await.unwrap();
        assert!(matches!(event, RunEvent::NodeStarted { .. }));
    }

    #[tokio::test]
    async fn test_channel_sink_reports_closed() {
        let (sink, receiver) = ChannelEventSink::new();
        drop(receiver);
        assert!(sink
            .send(RunEvent::RunCompleted {
                workflow_id: "wf".into(),
                run_id: "run-1".into(),
            })
            .is_err());
    }

    #[test]
    fn test_event_wire_format() {
        let event = RunEvent::NodeCompleted {
            run_id: "run-1".into(),
            node_id: "a".into(),
            execution_id: "exec-1".into(),
            output: Some(serde_json::json!({"text": "hi"})),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "nodeCompleted");
        assert_eq!(json["runId"], "run-1");
    }
}
