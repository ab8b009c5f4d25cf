//! Lifecycle coordination for playerview
//!
//! Translates view attachment, host foreground/background, surface
//! availability and orientation changes into session transitions.

use crate::player::release::ReleaseHandle;
use crate::player::session::SourceOptions;
use crate::player::view::PlayerView;
use crate::player::LifecycleObserver;
use crate::surface::{Dimensions, Orientation, SurfaceObserver};
use crate::utils::config::ConstructionPolicy;
use log::{debug, info};

impl PlayerView {
    /// The view was attached to the window hierarchy
    pub fn on_attach(&self) {
        let inner = &self.inner;
        let mut guard = inner.session.lock();
        let session = &mut *guard;
        info!("View {} attached", self.id().0);
        session.rebind_blocked = false;

        if inner.config.engine.construction == ConstructionPolicy::Eager {
            if let Some(surface) = inner.surface.upgrade() {
                let options = session
                    .source
                    .as_ref()
                    .map(|source| source.options.clone())
                    .unwrap_or_else(SourceOptions::none);
                inner.ensure_engine_locked(session, &options, &surface);
            }
        }

        if let Some(source) = session.source.clone() {
            inner.set_source_locked(session, Some(&source.uri), source.options);
        }
    }

    /// The view was detached; the engine is released unconditionally
    pub fn on_detach(&self) -> ReleaseHandle {
        info!("View {} detached", self.id().0);
        self.release()
    }

    /// Record a device orientation change
    ///
    /// On an actual change the cached root view dimensions are swapped.
    pub fn on_orientation_changed(&self, orientation: Orientation) {
        let mut session = self.inner.session.lock();
        if session.orientation == orientation {
            return;
        }

        session.root_view_dimensions = session.root_view_dimensions.swapped();
        session.orientation = orientation;
        debug!(
            "Orientation now {:?}, root view {}x{}",
            orientation, session.root_view_dimensions.width, session.root_view_dimensions.height
        );
    }

    /// Engine reported the video geometry of the current media
    pub fn on_video_layout_ready(&self, width: u32, height: u32, sar_num: u32, sar_den: u32) {
        let dimensions = Dimensions::new(width, height);
        if dimensions.is_empty() {
            debug!("Ignoring empty video layout {}x{}", width, height);
            return;
        }

        let root = self.inner.surface.upgrade().map(|s| s.root_view_size());
        let mut session = self.inner.session.lock();
        session.video_layout.dimensions = dimensions;
        session.video_layout.sar_num = sar_num;
        session.video_layout.sar_den = sar_den;
        if let Some(root) = root {
            session.root_view_dimensions = root;
        }
        debug!("Video layout {}x{} (sar {}/{})", width, height, sar_num, sar_den);
    }
}

impl LifecycleObserver for PlayerView {
    fn on_host_foreground(&self) {
        let inner = &self.inner;
        let mut guard = inner.session.lock();
        let session = &mut *guard;
        debug!("Host foreground");

        inner.apply_modifiers_locked(session);
        if session.engine.is_some() && !session.output_attached && session.surface_available {
            inner.attach_output_locked(session);
        }
    }

    fn on_host_background(&self) {
        let mut session = self.inner.session.lock();
        debug!("Host background");
        if let Some(engine) = session.engine.as_mut() {
            engine.pause();
        }
    }

    fn on_host_destroy(&self) {
        debug!("Host destroyed");
    }
}

impl SurfaceObserver for PlayerView {
    fn on_surface_created(&self) {
        let inner = &self.inner;
        let mut guard = inner.session.lock();
        let session = &mut *guard;
        session.surface_available = true;
        info!("Surface created for view {}", self.id().0);

        if let Some(surface) = inner.surface.upgrade() {
            session.video_layout.dimensions = surface.size();
        }

        if session.engine.is_some() {
            if session.output_attached {
                let size = session.video_layout.dimensions;
                if let Some(engine) = session.engine.as_mut() {
                    engine.set_window_size(size.width, size.height);
                }
            } else {
                inner.attach_output_locked(session);
            }
        }

        if session.rebind_blocked {
            debug!("Playback ended or failed, leaving the source to the host");
        } else if session.source.is_some() && !session.source_bound {
            inner.bind_source_locked(session);
        }
    }

    fn on_surface_changed(&self, width: u32, height: u32) {
        let mut session = self.inner.session.lock();
        if let Some(engine) = session.engine.as_mut() {
            engine.set_window_size(width, height);
        }
    }

    fn on_surface_destroyed(&self) {
        let mut session = self.inner.session.lock();
        session.surface_available = false;
        info!("Surface destroyed for view {}", self.id().0);

        if session.output_attached {
            if let Some(engine) = session.engine.as_mut() {
                engine.detach_output();
            }
            session.output_attached = false;
        }
    }
}
