//! Playback modifiers (paused, muted, volume)
//!
//! Modifiers are the last requested desired state. They are stored
//! regardless of whether an engine exists and re-applied, in the fixed order
//! paused → muted → volume, whenever the engine is (re)created, a new media
//! starts opening, or the host returns to the foreground.

use crate::engine::{MediaEngine, ENGINE_MAX_VOLUME};
use crate::utils::config::VolumeScaling;
use log::{debug, warn};

/// Desired playback state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Modifiers {
    pub paused: bool,
    pub muted: bool,
    /// Nominal volume, 1.0 is the host default
    pub volume: f32,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            paused: false,
            muted: false,
            volume: 1.0,
        }
    }
}

impl Modifiers {
    /// Engine volume for the stored state; muted always yields zero
    pub fn engine_volume(&self, scaling: VolumeScaling) -> i32 {
        if self.muted {
            0
        } else {
            scale_volume(self.volume, scaling)
        }
    }

    pub fn apply_paused(&self, engine: &mut dyn MediaEngine) {
        if self.paused {
            engine.pause();
        } else {
            engine.play();
        }
    }

    pub fn apply_muted(&self, engine: &mut dyn MediaEngine, scaling: VolumeScaling) {
        engine.set_volume(self.engine_volume(scaling));
    }

    pub fn apply_volume(&self, engine: &mut dyn MediaEngine, scaling: VolumeScaling) {
        engine.set_volume(self.engine_volume(scaling));
    }

    /// Apply paused, muted and volume, in that order
    pub fn apply_all(&self, engine: &mut dyn MediaEngine, scaling: VolumeScaling) {
        debug!(
            "Applying modifiers: paused={} muted={} volume={:.2}",
            self.paused, self.muted, self.volume
        );
        self.apply_paused(engine);
        self.apply_muted(engine, scaling);
        self.apply_volume(engine, scaling);
    }
}

/// Map a nominal volume onto the engine range
///
/// `Truncating` drops the fractional part before scaling, so every volume
/// below 1.0 maps to silence. A warning is logged whenever that differs from
/// the linear result. The result always lies in `0..=ENGINE_MAX_VOLUME`.
pub fn scale_volume(volume: f32, scaling: VolumeScaling) -> i32 {
    let linear = (volume * ENGINE_MAX_VOLUME as f32).round() as i32;
    let scaled = match scaling {
        VolumeScaling::Linear => linear,
        VolumeScaling::Truncating => {
            let truncated = (volume as i32).saturating_mul(ENGINE_MAX_VOLUME);
            if truncated != linear {
                warn!(
                    "Volume {:.2} truncated to engine volume {} (linear scaling would give {})",
                    volume, truncated, linear
                );
            }
            truncated
        }
    };
    scaled.clamp(0, ENGINE_MAX_VOLUME)
}
