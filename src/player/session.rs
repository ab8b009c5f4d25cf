//! Session state for playerview
//!
//! A `PlayerSession` is the live binding between one engine instance and one
//! rendering surface. It lives behind the view's session lock; every field is
//! written only while that lock is held.

use crate::engine::MediaEngine;
use crate::player::modifiers::Modifiers;
use crate::player::normalizer::EventNormalizer;
use crate::player::release::ReleaseHandle;
use crate::surface::{Dimensions, Orientation};
use crate::utils::config::PlaybackConfig;
use std::fmt;
use std::sync::Arc;

/// Engine options attached to a source
///
/// Two option sets are considered the same only when they share one
/// allocation: a live engine is recreated whenever the host hands over a new
/// option list, even one with equal contents.
#[derive(Clone, Default)]
pub struct SourceOptions(Option<Arc<[String]>>);

impl SourceOptions {
    /// No per-source options
    pub fn none() -> Self {
        Self(None)
    }

    pub fn new<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(Some(options.into_iter().map(Into::into).collect()))
    }

    /// Whether both values refer to the same option list
    pub fn same_identity(&self, other: &SourceOptions) -> bool {
        match (&self.0, &other.0) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn as_slice(&self) -> &[String] {
        self.0.as_deref().unwrap_or(&[])
    }
}

impl fmt::Debug for SourceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

/// Requested media identity
#[derive(Debug, Clone)]
pub struct Source {
    pub uri: String,
    pub options: SourceOptions,
}

/// Geometry reported by the engine for the current media
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VideoLayout {
    pub dimensions: Dimensions,
    pub sar_num: u32,
    pub sar_den: u32,
}

/// Live binding between one engine and one surface
pub struct PlayerSession {
    /// Exclusively owned engine, if one is live
    pub engine: Option<Box<dyn MediaEngine>>,

    /// Identifies the current engine binding; bumped on every engine creation and release
    pub generation: u64,

    /// Completion of the most recent release
    pub pending_release: Option<ReleaseHandle>,

    /// Pending or bound source
    pub source: Option<Source>,

    /// Options the live engine was created with, compared by identity
    pub engine_options: SourceOptions,

    /// The pending source has been handed to the live engine
    pub source_bound: bool,

    /// Playback ended or failed; only the host may bind the source again
    pub rebind_blocked: bool,

    pub modifiers: Modifiers,

    /// Loaded/stalled/progress state
    pub normalizer: EventNormalizer,

    /// A surface exists and can receive the video output
    pub surface_available: bool,

    /// The engine's video output is attached to the surface
    pub output_attached: bool,

    pub keep_alive: bool,

    pub video_layout: VideoLayout,

    pub root_view_dimensions: Dimensions,

    pub orientation: Orientation,
}

impl PlayerSession {
    pub fn new(config: &PlaybackConfig, orientation: Orientation) -> Self {
        Self {
            engine: None,
            generation: 0,
            pending_release: None,
            source: None,
            engine_options: SourceOptions::none(),
            source_bound: false,
            rebind_blocked: false,
            modifiers: Modifiers::default(),
            normalizer: EventNormalizer::new(config),
            surface_available: false,
            output_attached: false,
            keep_alive: false,
            video_layout: VideoLayout::default(),
            root_view_dimensions: Dimensions::default(),
            orientation,
        }
    }

    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }
}
