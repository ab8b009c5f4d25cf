//! Player view implementation for playerview
//!
//! `PlayerView` owns one [`PlayerSession`] and drives it from three sides:
//! control-thread commands (source, modifiers, seek, lifecycle), the engine's
//! callback thread, and the background release context. All session state
//! sits behind one lock, and normalized events are emitted while it is held.

use crate::engine::{EngineEvent, EngineEventSink, EngineFactory, MediaSource};
use crate::events::{HostEventSink, ViewEvent, ViewId};
use crate::player::modifiers::Modifiers;
use crate::player::normalizer::Effect;
use crate::player::release::{ReleaseExecutor, ReleaseHandle};
use crate::player::session::{PlayerSession, Source, SourceOptions, VideoLayout};
use crate::surface::{Dimensions, Orientation, Surface};
use crate::utils::config::Config;
use crate::utils::error::{PlayerViewError, Result};
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Builder for [`PlayerView`]
pub struct PlayerViewBuilder {
    id: ViewId,
    config: Config,
    factory: Option<Arc<dyn EngineFactory>>,
    surface: Option<Weak<dyn Surface>>,
    sink: Option<Arc<dyn HostEventSink>>,
    executor: Option<ReleaseExecutor>,
    orientation: Orientation,
}

impl PlayerViewBuilder {
    /// Create a builder for the view addressed as `id` by the host
    pub fn new(id: ViewId) -> Self {
        Self {
            id,
            config: Config::default(),
            factory: None,
            surface: None,
            sink: None,
            executor: None,
            orientation: Orientation::Undefined,
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn with_engine_factory(mut self, factory: Arc<dyn EngineFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Observe `surface`; the view keeps only a weak reference
    pub fn with_surface<S: Surface + 'static>(mut self, surface: &Arc<S>) -> Self {
        let surface: Arc<dyn Surface> = surface.clone();
        self.surface = Some(Arc::downgrade(&surface));
        self
    }

    pub fn with_surface_weak(mut self, surface: Weak<dyn Surface>) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn with_event_sink(mut self, sink: Arc<dyn HostEventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Run releases on `executor` instead of a private runtime
    pub fn with_executor(mut self, executor: ReleaseExecutor) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Orientation at creation time
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Build the view
    pub fn build(self) -> Result<PlayerView> {
        self.config.validate()?;

        let factory = self
            .factory
            .ok_or_else(|| PlayerViewError::Config("An engine factory is required".to_string()))?;
        let surface = self
            .surface
            .ok_or_else(|| PlayerViewError::Surface("A surface is required".to_string()))?;
        let sink = self
            .sink
            .ok_or_else(|| PlayerViewError::Config("An event sink is required".to_string()))?;
        let executor = match self.executor {
            Some(executor) => executor,
            None => ReleaseExecutor::new()?,
        };

        let session = PlayerSession::new(&self.config.playback, self.orientation);
        let config = self.config;
        let id = self.id;

        let inner = Arc::new_cyclic(|self_ref| ViewInner {
            id,
            config,
            factory,
            surface,
            sink,
            executor,
            session: Mutex::new(session),
            self_ref: self_ref.clone(),
        });

        info!("Created player view {}", id.0);
        Ok(PlayerView { inner })
    }
}

/// Point-in-time copy of the session state
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub has_engine: bool,
    pub generation: u64,
    pub source_uri: Option<String>,
    pub source_bound: bool,
    pub rebind_blocked: bool,
    pub loaded: bool,
    pub stalled: bool,
    pub last_reported_progress: f64,
    pub modifiers: Modifiers,
    pub keep_alive: bool,
    pub surface_available: bool,
    pub output_attached: bool,
    pub video_layout: VideoLayout,
    pub root_view_dimensions: Dimensions,
    pub orientation: Orientation,
}

/// View-level playback controller
///
/// Cloning yields another handle onto the same view.
#[derive(Clone)]
pub struct PlayerView {
    pub(crate) inner: Arc<ViewInner>,
}

pub(crate) struct ViewInner {
    id: ViewId,
    pub(crate) config: Config,
    factory: Arc<dyn EngineFactory>,
    pub(crate) surface: Weak<dyn Surface>,
    sink: Arc<dyn HostEventSink>,
    executor: ReleaseExecutor,
    pub(crate) session: Mutex<PlayerSession>,
    self_ref: Weak<ViewInner>,
}

/// Engine listener bound to one engine generation
struct SessionListener {
    view: Weak<ViewInner>,
    generation: u64,
}

impl EngineEventSink for SessionListener {
    fn on_engine_event(&self, event: EngineEvent) {
        if let Some(view) = self.view.upgrade() {
            view.dispatch_engine_event(self.generation, event);
        }
    }
}

impl PlayerView {
    /// Host-side identifier of this view
    pub fn id(&self) -> ViewId {
        self.inner.id
    }

    /// Request a new source
    ///
    /// A live engine is stopped first, and released when `options` is not
    /// the list it was built with. Binding waits for an available surface.
    ///
    /// # Arguments
    ///
    /// * `uri` - Media to play; `None` or an empty string clears the pending source
    /// * `options` - Per-source engine options, compared by identity
    pub fn set_source(&self, uri: Option<&str>, options: SourceOptions) {
        let mut session = self.inner.session.lock();
        self.inner.set_source_locked(&mut session, uri, options);
    }

    pub fn set_paused_modifier(&self, paused: bool) {
        let mut guard = self.inner.session.lock();
        let session = &mut *guard;
        session.modifiers.paused = paused;
        if let Some(engine) = session.engine.as_mut() {
            session.modifiers.apply_paused(engine.as_mut());
        }
    }

    pub fn set_muted_modifier(&self, muted: bool) {
        let scaling = self.inner.config.engine.volume_scaling;
        let mut guard = self.inner.session.lock();
        let session = &mut *guard;
        session.modifiers.muted = muted;
        if let Some(engine) = session.engine.as_mut() {
            session.modifiers.apply_muted(engine.as_mut(), scaling);
        }
    }

    pub fn set_volume_modifier(&self, volume: f32) {
        let scaling = self.inner.config.engine.volume_scaling;
        let mut guard = self.inner.session.lock();
        let session = &mut *guard;
        session.modifiers.volume = volume;
        if let Some(engine) = session.engine.as_mut() {
            session.modifiers.apply_volume(engine.as_mut(), scaling);
        }
    }

    /// Re-apply paused, muted and volume to a live engine
    pub fn apply_modifiers(&self) {
        let mut session = self.inner.session.lock();
        self.inner.apply_modifiers_locked(&mut session);
    }

    /// Jump to a new media position, announcing the seek first
    ///
    /// Ignored when no engine is live.
    ///
    /// # Arguments
    ///
    /// * `ms` - Target position in milliseconds
    pub fn seek_to(&self, ms: i64) {
        let mut guard = self.inner.session.lock();
        let session = &mut *guard;
        let Some(engine) = session.engine.as_mut() else {
            debug!("Seek to {}ms ignored, no engine", ms);
            return;
        };

        let event = session.normalizer.seek(&**engine, ms);
        self.inner.emit(&event);
        engine.set_time(ms);
    }

    /// Release the engine in the background
    ///
    /// Events from the released engine stop reaching the host immediately.
    ///
    /// # Returns
    ///
    /// A handle that completes once the engine is torn down, or an
    /// already-complete handle when no engine is live
    pub fn release(&self) -> ReleaseHandle {
        let mut session = self.inner.session.lock();
        self.inner.release_locked(&mut session)
    }

    /// Completion handle of the most recent release, if any
    pub fn pending_release(&self) -> Option<ReleaseHandle> {
        self.inner.session.lock().pending_release.clone()
    }

    pub fn has_engine(&self) -> bool {
        self.inner.session.lock().has_engine()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let session = self.inner.session.lock();
        SessionSnapshot {
            has_engine: session.has_engine(),
            generation: session.generation,
            source_uri: session.source.as_ref().map(|s| s.uri.clone()),
            source_bound: session.source_bound,
            rebind_blocked: session.rebind_blocked,
            loaded: session.normalizer.loaded(),
            stalled: session.normalizer.stalled(),
            last_reported_progress: session.normalizer.last_reported_progress(),
            modifiers: session.modifiers,
            keep_alive: session.keep_alive,
            surface_available: session.surface_available,
            output_attached: session.output_attached,
            video_layout: session.video_layout,
            root_view_dimensions: session.root_view_dimensions,
            orientation: session.orientation,
        }
    }
}

impl ViewInner {
    pub(crate) fn emit(&self, event: &ViewEvent) {
        debug!("View {} emits {}", self.id.0, event.name());
        self.sink.receive_event(self.id, event.name(), event.payload());
    }

    pub(crate) fn set_source_locked(
        &self,
        session: &mut PlayerSession,
        uri: Option<&str>,
        options: SourceOptions,
    ) {
        session.rebind_blocked = false;
        if let Some(engine) = session.engine.as_mut() {
            engine.stop();
            if !options.same_identity(&session.engine_options) {
                info!("Source options changed, recreating engine");
                self.release_locked(session);
            }
        }

        let uri = match uri.filter(|u| !u.is_empty()) {
            Some(uri) => uri.to_string(),
            None => {
                debug!("Source cleared");
                session.source = None;
                session.source_bound = false;
                return;
            }
        };

        session.source = Some(Source {
            uri: uri.clone(),
            options,
        });
        session.source_bound = false;

        if !session.surface_available || self.surface.upgrade().is_none() {
            debug!("No surface yet, deferring bind of {}", uri);
            return;
        }

        self.bind_source_locked(session);
    }

    /// Bind the pending source to the engine, constructing it if needed
    pub(crate) fn bind_source_locked(&self, session: &mut PlayerSession) {
        let Some(source) = session.source.clone() else {
            return;
        };
        let Some(surface) = self.surface.upgrade() else {
            warn!("Surface dropped before {} could be bound", source.uri);
            return;
        };

        if !self.ensure_engine_locked(session, &source.options, &surface) {
            session.rebind_blocked = true;
            return;
        }

        let media = MediaSource::new(source.uri.clone(), self.config.engine.hardware_decoding);
        let bound = match session.engine.as_mut() {
            Some(engine) => engine.set_media(media),
            None => return,
        };

        if let Err(e) = bound {
            error!("Failed to bind {}: {}", source.uri, e);
            self.emit(&ViewEvent::Error { what: e.to_string() });
            self.release_locked(session);
            session.rebind_blocked = true;
            return;
        }

        session.normalizer.reset_for_bind();
        session.source_bound = true;
        info!("Bound source {}", source.uri);
        self.emit(&ViewEvent::LoadStart { uri: source.uri });

        self.apply_modifiers_locked(session);
    }

    /// Make sure an engine is live; returns `false` when construction failed
    pub(crate) fn ensure_engine_locked(
        &self,
        session: &mut PlayerSession,
        options: &SourceOptions,
        surface: &Arc<dyn Surface>,
    ) -> bool {
        if session.engine.is_some() {
            if !session.output_attached && session.surface_available {
                self.attach_output_locked(session);
            }
            return true;
        }

        // Single writer: never overlap a new engine with an unfinished release
        if let Some(pending) = session.pending_release.take() {
            let timeout = Duration::from_millis(self.config.general.release_timeout_ms);
            if !pending.wait_timeout(timeout) {
                warn!(
                    "Previous engine release still running after {:?}, waiting for it",
                    timeout
                );
                pending.wait();
            }
        }

        let mut all_options = self.config.engine.base_options.clone();
        all_options.extend_from_slice(options.as_slice());

        let mut engine = match self.factory.create(&all_options) {
            Ok(engine) => engine,
            Err(e) => {
                error!("Engine construction failed: {}", e);
                self.emit(&ViewEvent::Error { what: e.to_string() });
                return false;
            }
        };

        session.generation += 1;
        engine.set_event_listener(Some(Arc::new(SessionListener {
            view: self.self_ref.clone(),
            generation: session.generation,
        })));

        // Output waits for on_surface_created when no surface exists yet
        let attached = if session.surface_available {
            engine.attach_output(Arc::clone(surface)).map(|()| true)
        } else {
            Ok(false)
        };
        session.engine = Some(engine);
        session.engine_options = options.clone();
        info!("Engine #{} created", session.generation);

        match attached {
            Ok(true) => {
                session.output_attached = true;
                let size = surface.size();
                if let Some(engine) = session.engine.as_mut() {
                    engine.set_window_size(size.width, size.height);
                }
            }
            Ok(false) => debug!("Engine #{} created without a surface", session.generation),
            Err(e) => {
                error!("Failed to attach video output: {}", e);
                self.emit(&ViewEvent::Error { what: e.to_string() });
                self.release_locked(session);
                return false;
            }
        }

        true
    }

    /// Reattach the video output to the surface
    pub(crate) fn attach_output_locked(&self, session: &mut PlayerSession) {
        let Some(surface) = self.surface.upgrade() else {
            return;
        };
        let Some(engine) = session.engine.as_mut() else {
            return;
        };

        match engine.attach_output(Arc::clone(&surface)) {
            Ok(()) => {
                let size = surface.size();
                engine.set_window_size(size.width, size.height);
                session.output_attached = true;
                debug!("Video output reattached at {}x{}", size.width, size.height);
            }
            Err(e) => warn!("Failed to reattach video output: {}", e),
        }
    }

    pub(crate) fn apply_modifiers_locked(&self, session: &mut PlayerSession) {
        let scaling = self.config.engine.volume_scaling;
        if let Some(engine) = session.engine.as_mut() {
            session.modifiers.apply_all(engine.as_mut(), scaling);
        }
    }

    fn set_keep_alive_locked(&self, session: &mut PlayerSession, keep_alive: bool) {
        session.keep_alive = keep_alive;
        if let Some(surface) = self.surface.upgrade() {
            surface.set_keep_screen_on(keep_alive);
        }
    }

    /// Detach the engine from the session and tear it down in the background
    ///
    /// The generation moves on before the engine leaves the session, so
    /// callbacks from its listener are dropped from here on.
    pub(crate) fn release_locked(&self, session: &mut PlayerSession) -> ReleaseHandle {
        let Some(engine) = session.engine.take() else {
            return ReleaseHandle::completed();
        };

        let released = session.generation;
        session.generation += 1;
        info!("Releasing engine #{}", released);
        session.output_attached = false;
        session.keep_alive = false;
        session.source_bound = false;
        session.engine_options = SourceOptions::none();

        let handle = self.executor.schedule(engine, self.surface.clone(), released);
        session.pending_release = Some(handle.clone());
        handle
    }

    fn dispatch_engine_event(&self, generation: u64, event: EngineEvent) {
        let mut guard = self.session.lock();
        let session = &mut *guard;

        if session.generation != generation {
            debug!("Dropping {:?} from stale engine #{}", event, generation);
            return;
        }

        let Some(engine) = session.engine.as_deref() else {
            return;
        };
        let outcome = session.normalizer.handle(event, engine);

        for event in &outcome.events {
            self.emit(event);
        }

        for effect in outcome.effects {
            match effect {
                Effect::KeepAlive(on) => self.set_keep_alive_locked(session, on),
                Effect::ApplyModifiers => self.apply_modifiers_locked(session),
                Effect::Release => {
                    self.release_locked(session);
                    session.rebind_blocked = true;
                }
            }
        }
    }
}

impl Drop for ViewInner {
    fn drop(&mut self) {
        let timeout = Duration::from_millis(self.config.general.release_timeout_ms);
        let session = self.session.get_mut();

        if let Some(engine) = session.engine.take() {
            warn!("View {} dropped with a live engine, releasing", self.id.0);
            let handle = self
                .executor
                .schedule(engine, self.surface.clone(), session.generation);
            session.pending_release = Some(handle);
        }

        if let Some(pending) = session.pending_release.take() {
            if !pending.wait_timeout(timeout) {
                warn!("View {} dropped before its engine release finished", self.id.0);
            }
        }
    }
}
