//! Bundled host event sinks

use crate::events::{HostEventSink, ViewId};
use crossbeam_channel::Sender;
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde_json::Value;

/// One event as received by a sink
#[derive(Debug, Clone, PartialEq)]
pub struct HostEvent {
    pub target: ViewId,
    pub name: String,
    pub payload: Value,
}

/// Sink forwarding events into a channel
pub struct ChannelSink {
    tx: Sender<HostEvent>,
}

impl ChannelSink {
    pub fn new(tx: Sender<HostEvent>) -> Self {
        Self { tx }
    }
}

impl HostEventSink for ChannelSink {
    fn receive_event(&self, target: ViewId, name: &str, payload: Value) {
        let event = HostEvent {
            target,
            name: name.to_string(),
            payload,
        };
        if self.tx.send(event).is_err() {
            warn!("Host event receiver dropped, discarding {}", name);
        }
    }
}

/// Sink that logs every event
pub struct LoggingSink;

impl HostEventSink for LoggingSink {
    fn receive_event(&self, target: ViewId, name: &str, payload: Value) {
        // Progress is frequent enough to flood info logs
        if name == crate::events::EVENT_PROGRESS {
            debug!("[view {}] {} {}", target.0, name, payload);
        } else {
            info!("[view {}] {} {}", target.0, name, payload);
        }
    }
}

/// Sink collecting events in memory
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<HostEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.events.lock().clone()
    }

    /// Names of the recorded events, in order
    pub fn names(&self) -> Vec<String> {
        self.events.lock().iter().map(|e| e.name.clone()).collect()
    }

    /// Recorded events with the given name
    pub fn named(&self, name: &str) -> Vec<HostEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.name == name)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl HostEventSink for RecordingSink {
    fn receive_event(&self, target: ViewId, name: &str, payload: Value) {
        self.events.lock().push(HostEvent {
            target,
            name: name.to_string(),
            payload,
        });
    }
}
