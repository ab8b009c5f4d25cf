//! Media engine interfaces for playerview
//!
//! The concrete decoding/rendering engine is a black box. This module defines
//! the surface of it the view depends on: construction through a factory,
//! playback commands, synchronous getters, and an asynchronous event stream
//! delivered through an [`EngineEventSink`].

pub mod mock;

pub use mock::{MockEngine, MockEngineFactory, MockSurface};

use crate::surface::Surface;
use crate::utils::error::Result;
use std::sync::Arc;

/// Largest value accepted by [`MediaEngine::set_volume`]
pub const ENGINE_MAX_VOLUME: i32 = 200;

/// Raw event delivered by the engine on its own thread
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineEvent {
    /// Playback reached the end of the media
    EndReached,

    /// The engine failed and can no longer be used
    EncounteredError,

    /// Buffer fill level in percent
    Buffering(f32),

    /// Playback started or resumed
    Playing,

    /// Playback paused
    Paused,

    /// Playback stopped
    Stopped,

    /// The engine started opening the bound media
    Opening,

    /// Playback position advanced, in milliseconds
    TimeChanged(i64),
}

/// Player state as reported by the engine getter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Opening,
    Buffering,
    Playing,
    Paused,
    Stopped,
    Ended,
    Error,
}

/// Media object bound to an engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSource {
    /// Media location
    pub uri: String,

    /// Allow hardware decoding
    pub hardware_decoding: bool,

    /// Fail instead of falling back to software decoding
    pub force_hardware: bool,
}

impl MediaSource {
    pub fn new(uri: impl Into<String>, hardware_decoding: bool) -> Self {
        Self {
            uri: uri.into(),
            hardware_decoding,
            force_hardware: false,
        }
    }
}

/// Consumer of the engine's raw event stream
pub trait EngineEventSink: Send + Sync {
    /// Handle one raw engine event
    fn on_engine_event(&self, event: EngineEvent);
}

/// Synchronous getters the event normalizer reads
pub trait EngineReadout {
    /// Media length in milliseconds, or -1 when unknown
    fn length_ms(&self) -> i64;

    /// Current playback position in milliseconds
    fn time_ms(&self) -> i64;

    /// Engine-side player state
    fn player_state(&self) -> EngineState;
}

/// Media playback engine
///
/// Methods other than [`MediaEngine::stop`] and [`MediaEngine::release`] are
/// expected to return promptly.
pub trait MediaEngine: EngineReadout + Send {
    /// Install or remove the event listener
    fn set_event_listener(&mut self, listener: Option<Arc<dyn EngineEventSink>>);

    /// Bind a new media object
    fn set_media(&mut self, media: MediaSource) -> Result<()>;

    /// Start or resume playback
    fn play(&mut self);

    /// Pause playback
    fn pause(&mut self);

    /// Stop playback; may block on decoder shutdown
    fn stop(&mut self);

    /// Jump to a position in milliseconds
    fn set_time(&mut self, ms: i64);

    /// Set output volume in the range `0..=ENGINE_MAX_VOLUME`
    fn set_volume(&mut self, volume: i32);

    /// Attach the video output to a surface
    fn attach_output(&mut self, surface: Arc<dyn Surface>) -> Result<()>;

    /// Detach the video output from its surface
    fn detach_output(&mut self);

    /// Tell the video output how large the window is
    fn set_window_size(&mut self, width: u32, height: u32);

    /// Release native resources; may block
    fn release(&mut self);
}

/// Builds engines from an option list
pub trait EngineFactory: Send + Sync {
    /// Create a new engine
    ///
    /// # Arguments
    ///
    /// * `options` - Engine options, base options first
    fn create(&self, options: &[String]) -> Result<Box<dyn MediaEngine>>;
}
