//! In-memory engine and surface for the demo binary and tests
//!
//! `MockEngine` records every command it receives and lets the caller fire
//! raw engine events at the installed listener through a [`MockEngineHandle`],
//! the same way a real engine would from its callback thread.

use crate::engine::{
    EngineEvent, EngineEventSink, EngineFactory, EngineReadout, EngineState, MediaEngine,
    MediaSource,
};
use crate::surface::{Dimensions, Surface};
use crate::utils::error::{PlayerViewError, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Command recorded by a [`MockEngine`]
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    SetListener(bool),
    SetMedia(MediaSource),
    Play,
    Pause,
    Stop,
    SetTime(i64),
    SetVolume(i32),
    AttachOutput,
    DetachOutput,
    SetWindowSize(u32, u32),
    Release,
}

/// Engine construction/destruction record shared by all engines of a factory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Created(usize),
    Released(usize),
}

struct MockEngineState {
    id: usize,
    options: Vec<String>,
    calls: Vec<EngineCall>,
    listener: Option<Arc<dyn EngineEventSink>>,
    state: EngineState,
    time_ms: i64,
    length_ms: i64,
    released: bool,
    fail_set_media: bool,
    release_delay: Duration,
}

/// Scriptable in-memory engine
pub struct MockEngine {
    shared: Arc<Mutex<MockEngineState>>,
    lifecycle: Arc<Mutex<Vec<Lifecycle>>>,
}

/// Test-side handle onto a [`MockEngine`]
#[derive(Clone)]
pub struct MockEngineHandle {
    shared: Arc<Mutex<MockEngineState>>,
}

impl MockEngine {
    fn record(&self, call: EngineCall) {
        self.shared.lock().calls.push(call);
    }
}

impl EngineReadout for MockEngine {
    fn length_ms(&self) -> i64 {
        self.shared.lock().length_ms
    }

    fn time_ms(&self) -> i64 {
        self.shared.lock().time_ms
    }

    fn player_state(&self) -> EngineState {
        self.shared.lock().state
    }
}

impl MediaEngine for MockEngine {
    fn set_event_listener(&mut self, listener: Option<Arc<dyn EngineEventSink>>) {
        let mut state = self.shared.lock();
        state.calls.push(EngineCall::SetListener(listener.is_some()));
        state.listener = listener;
    }

    fn set_media(&mut self, media: MediaSource) -> Result<()> {
        let mut state = self.shared.lock();
        if state.fail_set_media {
            return Err(PlayerViewError::Engine(format!("cannot open {}", media.uri)));
        }
        state.calls.push(EngineCall::SetMedia(media));
        state.time_ms = 0;
        Ok(())
    }

    fn play(&mut self) {
        self.record(EngineCall::Play);
    }

    fn pause(&mut self) {
        self.record(EngineCall::Pause);
    }

    fn stop(&mut self) {
        let mut state = self.shared.lock();
        state.calls.push(EngineCall::Stop);
        state.state = EngineState::Stopped;
    }

    fn set_time(&mut self, ms: i64) {
        let mut state = self.shared.lock();
        state.calls.push(EngineCall::SetTime(ms));
        state.time_ms = ms;
    }

    fn set_volume(&mut self, volume: i32) {
        self.record(EngineCall::SetVolume(volume));
    }

    fn attach_output(&mut self, _surface: Arc<dyn Surface>) -> Result<()> {
        self.record(EngineCall::AttachOutput);
        Ok(())
    }

    fn detach_output(&mut self) {
        self.record(EngineCall::DetachOutput);
    }

    fn set_window_size(&mut self, width: u32, height: u32) {
        self.record(EngineCall::SetWindowSize(width, height));
    }

    fn release(&mut self) {
        let (id, delay) = {
            let mut state = self.shared.lock();
            state.calls.push(EngineCall::Release);
            (state.id, state.release_delay)
        };

        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        self.shared.lock().released = true;
        self.lifecycle.lock().push(Lifecycle::Released(id));
    }
}

impl MockEngineHandle {
    /// Deliver a raw event to the installed listener on the calling thread
    ///
    /// Playback-state events also update the state reported by
    /// [`EngineReadout::player_state`], and `TimeChanged` updates the time.
    pub fn fire(&self, event: EngineEvent) {
        let listener = {
            let mut state = self.shared.lock();
            match event {
                EngineEvent::Playing => state.state = EngineState::Playing,
                EngineEvent::Paused => state.state = EngineState::Paused,
                EngineEvent::Stopped => state.state = EngineState::Stopped,
                EngineEvent::Opening => state.state = EngineState::Opening,
                EngineEvent::EndReached => state.state = EngineState::Ended,
                EngineEvent::EncounteredError => state.state = EngineState::Error,
                EngineEvent::TimeChanged(ms) => state.time_ms = ms,
                EngineEvent::Buffering(_) => {}
            }
            state.listener.clone()
        };

        if let Some(listener) = listener {
            listener.on_engine_event(event);
        }
    }

    /// Deliver a raw event without touching the reported state
    pub fn fire_raw(&self, event: EngineEvent) {
        let listener = self.shared.lock().listener.clone();
        if let Some(listener) = listener {
            listener.on_engine_event(event);
        }
    }

    pub fn set_player_state(&self, state: EngineState) {
        self.shared.lock().state = state;
    }

    pub fn set_length_ms(&self, length_ms: i64) {
        self.shared.lock().length_ms = length_ms;
    }

    pub fn set_time_ms(&self, time_ms: i64) {
        self.shared.lock().time_ms = time_ms;
    }

    pub fn id(&self) -> usize {
        self.shared.lock().id
    }

    /// Options the engine was created with
    pub fn options(&self) -> Vec<String> {
        self.shared.lock().options.clone()
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.shared.lock().calls.clone()
    }

    /// Number of recorded calls equal to `call`
    pub fn count(&self, call: &EngineCall) -> usize {
        self.shared.lock().calls.iter().filter(|c| *c == call).count()
    }

    pub fn has_listener(&self) -> bool {
        self.shared.lock().listener.is_some()
    }

    pub fn is_released(&self) -> bool {
        self.shared.lock().released
    }

    /// Last volume pushed to the engine
    pub fn volume(&self) -> Option<i32> {
        self.shared.lock().calls.iter().rev().find_map(|c| match c {
            EngineCall::SetVolume(v) => Some(*v),
            _ => None,
        })
    }

    /// Last media bound to the engine
    pub fn media(&self) -> Option<MediaSource> {
        self.shared.lock().calls.iter().rev().find_map(|c| match c {
            EngineCall::SetMedia(m) => Some(m.clone()),
            _ => None,
        })
    }

    pub fn clear_calls(&self) {
        self.shared.lock().calls.clear();
    }

    pub fn set_fail_set_media(&self, fail: bool) {
        self.shared.lock().fail_set_media = fail;
    }
}

#[derive(Default)]
struct FactoryState {
    engines: Vec<MockEngineHandle>,
    failure: Option<String>,
    release_delay: Duration,
    default_length_ms: i64,
}

/// Factory producing [`MockEngine`]s
#[derive(Clone, Default)]
pub struct MockEngineFactory {
    state: Arc<Mutex<FactoryState>>,
    lifecycle: Arc<Mutex<Vec<Lifecycle>>>,
}

impl MockEngineFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every engine's `release` block for `delay`
    pub fn with_release_delay(self, delay: Duration) -> Self {
        self.state.lock().release_delay = delay;
        self
    }

    /// Length reported by newly created engines
    pub fn with_length_ms(self, length_ms: i64) -> Self {
        self.state.lock().default_length_ms = length_ms;
        self
    }

    /// Fail subsequent `create` calls with `message`, or succeed again with `None`
    pub fn set_failure(&self, message: Option<&str>) {
        self.state.lock().failure = message.map(str::to_string);
    }

    pub fn engines(&self) -> Vec<MockEngineHandle> {
        self.state.lock().engines.clone()
    }

    pub fn last(&self) -> Option<MockEngineHandle> {
        self.state.lock().engines.last().cloned()
    }

    pub fn created_count(&self) -> usize {
        self.state.lock().engines.len()
    }

    /// Construction/release order across all engines
    pub fn lifecycle(&self) -> Vec<Lifecycle> {
        self.lifecycle.lock().clone()
    }
}

impl EngineFactory for MockEngineFactory {
    fn create(&self, options: &[String]) -> Result<Box<dyn MediaEngine>> {
        let mut factory = self.state.lock();
        if let Some(message) = &factory.failure {
            return Err(PlayerViewError::EngineConstruction(message.clone()));
        }

        let id = factory.engines.len();
        let shared = Arc::new(Mutex::new(MockEngineState {
            id,
            options: options.to_vec(),
            calls: Vec::new(),
            listener: None,
            state: EngineState::Idle,
            time_ms: 0,
            length_ms: factory.default_length_ms,
            released: false,
            fail_set_media: false,
            release_delay: factory.release_delay,
        }));

        factory.engines.push(MockEngineHandle {
            shared: Arc::clone(&shared),
        });
        self.lifecycle.lock().push(Lifecycle::Created(id));

        Ok(Box::new(MockEngine {
            shared,
            lifecycle: Arc::clone(&self.lifecycle),
        }))
    }
}

/// In-memory surface with adjustable geometry
pub struct MockSurface {
    size: Mutex<Dimensions>,
    root_size: Mutex<Dimensions>,
    keep_on: AtomicBool,
}

impl MockSurface {
    pub fn new(size: Dimensions, root_size: Dimensions) -> Self {
        Self {
            size: Mutex::new(size),
            root_size: Mutex::new(root_size),
            keep_on: AtomicBool::new(false),
        }
    }

    pub fn set_size(&self, size: Dimensions) {
        *self.size.lock() = size;
    }

    pub fn set_root_view_size(&self, size: Dimensions) {
        *self.root_size.lock() = size;
    }
}

impl Surface for MockSurface {
    fn size(&self) -> Dimensions {
        *self.size.lock()
    }

    fn root_view_size(&self) -> Dimensions {
        *self.root_size.lock()
    }

    fn set_keep_screen_on(&self, keep_on: bool) {
        self.keep_on.store(keep_on, Ordering::SeqCst);
    }

    fn keep_screen_on(&self) -> bool {
        self.keep_on.load(Ordering::SeqCst)
    }
}
