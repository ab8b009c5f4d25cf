//! Player view module for playerview
//!
//! This module binds a host-owned rendering surface to a media engine. It
//! reconciles the surface lifecycle, the host lifecycle and the engine's
//! asynchronous events into one consistent playback session, and reports
//! normalized events back to the host.

mod lifecycle;
mod modifiers;
mod normalizer;
mod props;
mod release;
mod session;
mod view;

pub use modifiers::{scale_volume, Modifiers};
pub use normalizer::{Effect, EventNormalizer, Outcome, ENGINE_ERROR_WHAT};
pub use props::{PropertyBinder, PROP_MUTED, PROP_PAUSED, PROP_SRC, PROP_VOLUME};
pub use release::{run_release_sequence, ReleaseExecutor, ReleaseHandle};
pub use session::{PlayerSession, Source, SourceOptions, VideoLayout};
pub use view::{PlayerView, PlayerViewBuilder, SessionSnapshot};

/// Receiver of host lifecycle notifications
///
/// The host calls these from its control thread. None of them tear the
/// session down; release happens on view detach or on a terminal engine
/// event.
pub trait LifecycleObserver {
    /// The host came back to the foreground
    ///
    /// Re-applies modifiers and reattaches a detached video output when a
    /// surface is available.
    fn on_host_foreground(&self);

    /// The host went to the background
    ///
    /// Pauses a live engine without releasing it.
    fn on_host_background(&self);

    /// The host is being destroyed
    fn on_host_destroy(&self);
}
