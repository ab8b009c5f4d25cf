//! Outward event vocabulary for playerview
//!
//! Normalized events are delivered to the host as `(target, name, payload)`
//! triples. All time values in payloads are fractional seconds.

mod sink;

pub use sink::{ChannelSink, HostEvent, LoggingSink, RecordingSink};

use serde_json::{json, Value};

pub const EVENT_LOAD_START: &str = "onVideoLoadStart";
pub const EVENT_LOAD: &str = "onVideoLoad";
pub const EVENT_BUFFER: &str = "onVideoBuffer";
pub const EVENT_ERROR: &str = "onVideoError";
pub const EVENT_PROGRESS: &str = "onVideoProgress";
pub const EVENT_SEEK: &str = "onVideoSeek";
pub const EVENT_PAUSE: &str = "onVideoPause";
pub const EVENT_STOP: &str = "onVideoStop";
pub const EVENT_END: &str = "onVideoEnd";

/// Every event name the host needs to register
pub const EVENT_NAMES: [&str; 9] = [
    EVENT_LOAD_START,
    EVENT_LOAD,
    EVENT_BUFFER,
    EVENT_ERROR,
    EVENT_PROGRESS,
    EVENT_SEEK,
    EVENT_PAUSE,
    EVENT_STOP,
    EVENT_END,
];

/// Host-side identifier of the view instance events are addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(pub i32);

/// Normalized playback event
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    /// A new source was bound
    LoadStart { uri: String },

    /// First frame is playing; duration is now known
    Load { duration: f64, current_time: f64 },

    /// Buffer fill level; `stalled` is the stall state after this event
    Buffer { progress: f32, stalled: bool },

    /// Playback failed
    Error { what: String },

    /// Throttled playback position
    Progress { current_time: f64 },

    /// A seek was requested
    Seek { current_time: f64, seek_time: f64 },

    Pause,

    Stop,

    End,
}

impl ViewEvent {
    /// Event name as registered with the host
    pub fn name(&self) -> &'static str {
        match self {
            ViewEvent::LoadStart { .. } => EVENT_LOAD_START,
            ViewEvent::Load { .. } => EVENT_LOAD,
            ViewEvent::Buffer { .. } => EVENT_BUFFER,
            ViewEvent::Error { .. } => EVENT_ERROR,
            ViewEvent::Progress { .. } => EVENT_PROGRESS,
            ViewEvent::Seek { .. } => EVENT_SEEK,
            ViewEvent::Pause => EVENT_PAUSE,
            ViewEvent::Stop => EVENT_STOP,
            ViewEvent::End => EVENT_END,
        }
    }

    /// Payload handed to the host
    pub fn payload(&self) -> Value {
        match self {
            ViewEvent::LoadStart { uri } => json!({ "src": { "uri": uri } }),
            ViewEvent::Load {
                duration,
                current_time,
            } => json!({ "duration": duration, "currentTime": current_time }),
            ViewEvent::Buffer { progress, stalled } => {
                json!({ "progress": progress, "stalled": stalled })
            }
            ViewEvent::Error { what } => json!({ "error": { "what": what } }),
            ViewEvent::Progress { current_time } => json!({ "currentTime": current_time }),
            ViewEvent::Seek {
                current_time,
                seek_time,
            } => json!({ "currentTime": current_time, "seekTime": seek_time }),
            ViewEvent::Pause | ViewEvent::Stop | ViewEvent::End => json!({}),
        }
    }
}

/// Receiver of normalized events on the host side
///
/// Implementations are called while the view holds its session lock and
/// must not call back into the view synchronously.
pub trait HostEventSink: Send + Sync {
    /// Receive one event addressed to `target`
    fn receive_event(&self, target: ViewId, name: &str, payload: Value);
}
