//! Event normalization for playerview
//!
//! Turns the engine's raw, noisy event stream into the small outward
//! vocabulary of [`ViewEvent`]s. The normalizer itself never touches the
//! engine or the surface: it reads engine getters through [`EngineReadout`] and
//! reports side effects as [`Effect`]s for the view to carry out.

use crate::engine::{EngineEvent, EngineReadout, EngineState};
use crate::events::ViewEvent;
use crate::utils::config::PlaybackConfig;
use crate::utils::millis_to_secs;
use log::{debug, trace};

/// Diagnostic reported for engine-side playback failures
pub const ENGINE_ERROR_WHAT: &str = "MediaPlayer.Event.EncounteredError";

/// Side effect requested by the normalizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Set or clear the surface keep-alive flag
    KeepAlive(bool),

    /// Re-apply paused/muted/volume
    ApplyModifiers,

    /// Tear the engine down
    Release,
}

/// Result of normalizing one raw event
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Outcome {
    /// Events to emit, in order
    pub events: Vec<ViewEvent>,

    /// Effects to perform after the events are emitted
    pub effects: Vec<Effect>,
}

impl Outcome {
    fn event(mut self, event: ViewEvent) -> Self {
        self.events.push(event);
        self
    }

    fn effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Per-binding normalization state
#[derive(Debug, Clone)]
pub struct EventNormalizer {
    min_progress_interval_ms: i64,
    stall_threshold: f32,

    /// First `Playing` since the last bind has been seen
    loaded: bool,

    /// Playback is stalled on buffering
    stalled: bool,

    /// Media time of the last progress actually emitted
    last_reported_ms: i64,

    /// Last raw buffering percentage
    last_buffering_percent: f32,
}

impl EventNormalizer {
    pub fn new(config: &PlaybackConfig) -> Self {
        Self {
            min_progress_interval_ms: (config.min_progress_interval_secs * 1000.0).round() as i64,
            stall_threshold: config.stall_threshold_percent,
            loaded: false,
            stalled: false,
            last_reported_ms: 0,
            last_buffering_percent: 0.0,
        }
    }

    pub fn loaded(&self) -> bool {
        self.loaded
    }

    pub fn stalled(&self) -> bool {
        self.stalled
    }

    /// Last emitted progress, in seconds
    pub fn last_reported_progress(&self) -> f64 {
        millis_to_secs(self.last_reported_ms)
    }

    /// Forget per-source state after a new media is bound
    pub fn reset_for_bind(&mut self) {
        self.loaded = false;
        self.stalled = false;
    }

    /// Normalize one raw engine event
    pub fn handle<R: EngineReadout + ?Sized>(
        &mut self,
        event: EngineEvent,
        readout: &R,
    ) -> Outcome {
        trace!("Engine event: {:?}", event);

        match event {
            EngineEvent::EndReached => Outcome::default()
                .event(ViewEvent::End)
                .effect(Effect::Release),

            EngineEvent::EncounteredError => Outcome::default()
                .event(ViewEvent::Error {
                    what: ENGINE_ERROR_WHAT.to_string(),
                })
                .effect(Effect::Release),

            EngineEvent::Buffering(percent) => self.on_buffering(percent),

            EngineEvent::Playing => {
                let mut outcome = Outcome::default();
                if !self.loaded {
                    let duration = millis_to_secs(readout.length_ms());
                    let current_time = millis_to_secs(readout.time_ms());
                    debug!("Media loaded: duration={:.3}s position={:.3}s", duration, current_time);
                    outcome = outcome.event(ViewEvent::Load {
                        duration,
                        current_time,
                    });
                    self.loaded = true;
                }
                outcome.effect(Effect::KeepAlive(true))
            }

            EngineEvent::Paused => Outcome::default()
                .event(ViewEvent::Pause)
                .effect(Effect::KeepAlive(false)),

            EngineEvent::Stopped => Outcome::default()
                .event(ViewEvent::Stop)
                .effect(Effect::KeepAlive(false)),

            // First point at which the engine accepts commands for the new media
            EngineEvent::Opening => Outcome::default().effect(Effect::ApplyModifiers),

            EngineEvent::TimeChanged(ms) => self.on_time_changed(ms, readout.player_state()),
        }
    }

    /// Build the seek notification for a jump to `target_ms`
    pub fn seek<R: EngineReadout + ?Sized>(&self, readout: &R, target_ms: i64) -> ViewEvent {
        ViewEvent::Seek {
            current_time: millis_to_secs(readout.time_ms()),
            seek_time: millis_to_secs(target_ms),
        }
    }

    fn on_buffering(&mut self, percent: f32) -> Outcome {
        self.last_buffering_percent = percent;

        if percent < self.stall_threshold && !self.stalled {
            debug!("Stall began at {:.1}% buffered", percent);
            self.stalled = true;
        }

        Outcome::default().event(ViewEvent::Buffer {
            progress: percent,
            stalled: self.stalled,
        })
    }

    fn on_time_changed(&mut self, ms: i64, state: EngineState) -> Outcome {
        let mut outcome = Outcome::default();

        // Compared in whole milliseconds so 100 ms steps are never lost to rounding
        if (ms - self.last_reported_ms).abs() >= self.min_progress_interval_ms || ms == 0 {
            self.last_reported_ms = ms;
            outcome = outcome.event(ViewEvent::Progress {
                current_time: millis_to_secs(ms),
            });
        }

        // Only a real time advance while playing ends a stall
        if state == EngineState::Playing && self.stalled {
            debug!("Stall cleared at {}ms", ms);
            self.stalled = false;
            outcome = outcome.event(ViewEvent::Buffer {
                progress: self.last_buffering_percent,
                stalled: false,
            });
        }

        outcome
    }
}
