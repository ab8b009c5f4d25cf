//! Engine release sequencing for playerview
//!
//! Teardown of an engine can block on I/O and decoder shutdown, so it never
//! runs on the path that triggered it. The view detaches the engine from the
//! session under its lock, then hands it to [`ReleaseExecutor`] which runs
//! the release steps on a tokio blocking thread.

use crate::engine::MediaEngine;
use crate::surface::Surface;
use crate::utils::error::{PlayerViewError, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use log::{debug, info};
use std::sync::Weak;
use std::time::Duration;
use tokio::runtime::{Builder, Handle, Runtime};

/// Completion signal of one release
///
/// The release task holds the sending half and drops it when the sequence
/// has finished, successfully or by unwinding.
#[derive(Clone, Debug)]
pub struct ReleaseHandle {
    done: Receiver<()>,
}

impl ReleaseHandle {
    fn pair() -> (Sender<()>, Self) {
        let (tx, rx) = crossbeam_channel::bounded(0);
        (tx, Self { done: rx })
    }

    /// Handle for a release that had nothing to do
    pub fn completed() -> Self {
        let (_, handle) = Self::pair();
        handle
    }

    /// Whether the release has finished
    pub fn is_complete(&self) -> bool {
        matches!(self.done.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Block until the release has finished
    pub fn wait(&self) {
        let _ = self.done.recv();
    }

    /// Block until the release has finished or `timeout` elapses
    ///
    /// Returns `true` when the release finished.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        !matches!(self.done.recv_timeout(timeout), Err(RecvTimeoutError::Timeout))
    }
}

/// Runtime dropped without blocking, safe inside async contexts
struct OwnedRuntime(Option<Runtime>);

impl Drop for OwnedRuntime {
    fn drop(&mut self) {
        if let Some(runtime) = self.0.take() {
            runtime.shutdown_background();
        }
    }
}

/// Background execution context for engine teardown
pub struct ReleaseExecutor {
    handle: Handle,
    _runtime: Option<OwnedRuntime>,
}

impl ReleaseExecutor {
    /// Create an executor with its own single-worker runtime
    pub fn new() -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("playerview-release")
            .enable_all()
            .build()
            .map_err(|e| PlayerViewError::Internal(format!("Failed to create release runtime: {}", e)))?;

        Ok(Self {
            handle: runtime.handle().clone(),
            _runtime: Some(OwnedRuntime(Some(runtime))),
        })
    }

    /// Run releases on an existing runtime
    pub fn from_handle(handle: Handle) -> Self {
        Self {
            handle,
            _runtime: None,
        }
    }

    /// Schedule the release sequence for `engine`
    pub fn schedule(
        &self,
        engine: Box<dyn MediaEngine>,
        surface: Weak<dyn Surface>,
        generation: u64,
    ) -> ReleaseHandle {
        let (done, handle) = ReleaseHandle::pair();

        self.handle.spawn_blocking(move || {
            run_release_sequence(engine, surface, generation);
            drop(done);
        });

        handle
    }
}

/// Tear down one engine
///
/// The event listener goes first so that a callback racing with teardown can
/// not reach the view; the engine is dropped last.
pub fn run_release_sequence(
    mut engine: Box<dyn MediaEngine>,
    surface: Weak<dyn Surface>,
    generation: u64,
) {
    debug!("Release #{}: detaching event listener", generation);
    engine.set_event_listener(None);

    if let Some(surface) = surface.upgrade() {
        surface.set_keep_screen_on(false);
    }

    debug!("Release #{}: stopping playback", generation);
    engine.stop();

    debug!("Release #{}: detaching video output", generation);
    engine.detach_output();

    engine.release();
    drop(engine);

    info!("Engine binding #{} released", generation);
}
