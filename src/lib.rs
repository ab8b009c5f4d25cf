//! playerview - view-level playback controller
//!
//! Binds a host-owned rendering surface to an exclusively owned media
//! engine and translates raw engine events into a small, stable event
//! vocabulary for the host.

pub mod engine;
pub mod events;
pub mod player;
pub mod surface;
pub mod utils;

pub use engine::{EngineEvent, EngineFactory, EngineState, MediaEngine};
pub use events::{HostEventSink, ViewEvent, ViewId};
pub use player::{LifecycleObserver, PlayerView, PlayerViewBuilder, PropertyBinder, SourceOptions};
pub use surface::{Dimensions, Orientation, Surface, SurfaceObserver};
pub use utils::{Config, PlayerViewError, Result};
