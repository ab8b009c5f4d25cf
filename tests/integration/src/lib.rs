//! Integration test utilities for playerview
//!
//! This module provides common utilities for integration testing including:
//! - A view fixture wired to a mock engine, surface and recording sink
//! - Scripted engine event sequences
//! - Config file helpers

use anyhow::Result;
use playerview::engine::mock::MockEngineHandle;
use playerview::engine::{MockEngineFactory, MockSurface};
use playerview::events::{HostEventSink, RecordingSink, ViewId};
use playerview::player::{PlayerView, PlayerViewBuilder, ReleaseExecutor};
use playerview::utils::Config;
use playerview::Dimensions;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Media length reported by fixture engines
pub const MEDIA_LENGTH_MS: i64 = 120_000;

/// Upper bound for waiting on a background release
pub const RELEASE_WAIT: Duration = Duration::from_secs(5);

/// Test fixture for integration tests
pub struct TestFixture {
    pub view: PlayerView,
    pub factory: MockEngineFactory,
    pub surface: Arc<MockSurface>,
    pub sink: Arc<RecordingSink>,
}

impl TestFixture {
    /// Create a fixture with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Result<Self> {
        Self::build(config, MockEngineFactory::new(), None)
    }

    /// Create a fixture whose engines take `delay` to release
    pub fn with_release_delay(delay: Duration) -> Result<Self> {
        Self::build(
            Config::default(),
            MockEngineFactory::new().with_release_delay(delay),
            None,
        )
    }

    /// Create a fixture with custom configuration and slow releases
    pub fn with_config_and_release_delay(config: Config, delay: Duration) -> Result<Self> {
        Self::build(
            config,
            MockEngineFactory::new().with_release_delay(delay),
            None,
        )
    }

    /// Create a fixture releasing on an existing runtime
    pub fn with_executor(executor: ReleaseExecutor) -> Result<Self> {
        Self::build(Config::default(), MockEngineFactory::new(), Some(executor))
    }

    fn build(
        config: Config,
        factory: MockEngineFactory,
        executor: Option<ReleaseExecutor>,
    ) -> Result<Self> {
        let factory = factory.with_length_ms(MEDIA_LENGTH_MS);
        let surface = Arc::new(MockSurface::new(
            Dimensions::new(1280, 720),
            Dimensions::new(1080, 1920),
        ));
        let sink = Arc::new(RecordingSink::new());

        let mut builder = PlayerViewBuilder::new(ViewId(42))
            .with_config(config)
            .with_engine_factory(Arc::new(factory.clone()))
            .with_surface(&surface)
            .with_event_sink(sink.clone());
        if let Some(executor) = executor {
            builder = builder.with_executor(executor);
        }

        Ok(Self {
            view: builder.build()?,
            factory,
            surface,
            sink,
        })
    }

    /// Handle onto the most recently constructed engine
    pub fn engine(&self) -> MockEngineHandle {
        self.factory.last().expect("no engine was constructed")
    }

    /// Wait for the most recent release to finish
    pub fn wait_release(&self) {
        if let Some(pending) = self.view.pending_release() {
            assert!(pending.wait_timeout(RELEASE_WAIT), "release timed out");
        }
    }
}

/// View wired to a caller-provided sink
pub struct SinkFixture {
    pub view: PlayerView,
    pub factory: MockEngineFactory,
    pub surface: Arc<MockSurface>,
}

/// Build a view around a caller-provided sink
pub fn view_with_sink(sink: Arc<dyn HostEventSink>) -> Result<SinkFixture> {
    let factory = MockEngineFactory::new().with_length_ms(MEDIA_LENGTH_MS);
    let surface = Arc::new(MockSurface::new(
        Dimensions::new(640, 360),
        Dimensions::new(640, 360),
    ));

    let view = PlayerViewBuilder::new(ViewId(7))
        .with_engine_factory(Arc::new(factory.clone()))
        .with_surface(&surface)
        .with_event_sink(sink)
        .build()?;

    Ok(SinkFixture {
        view,
        factory,
        surface,
    })
}

/// Scripted engine event sequences
pub mod scripts {
    use playerview::engine::EngineEvent;

    /// Buffering runs that dip under the stall threshold twice
    pub fn buffering_with_two_stalls() -> Vec<EngineEvent> {
        vec![
            EngineEvent::Buffering(80.0),
            EngineEvent::Buffering(20.0),
            EngineEvent::Buffering(10.0),
            EngineEvent::Buffering(50.0),
            EngineEvent::TimeChanged(1_000),
            EngineEvent::Buffering(5.0),
            EngineEvent::Buffering(25.0),
        ]
    }

    /// Time ticks of a steady playback, every `step_ms` up to `end_ms`
    pub fn ticks(step_ms: i64, end_ms: i64) -> Vec<EngineEvent> {
        (0..=end_ms)
            .step_by(step_ms as usize)
            .map(EngineEvent::TimeChanged)
            .collect()
    }
}

/// Config file helpers
pub mod config_files {
    use super::*;

    /// Temporary directory holding one config file
    pub struct ConfigFile {
        pub dir: TempDir,
        pub path: PathBuf,
    }

    impl ConfigFile {
        pub fn write(contents: &str) -> Result<Self> {
            let dir = TempDir::new()?;
            let path = dir.path().join("config.toml");
            std::fs::write(&path, contents)?;
            Ok(Self { dir, path })
        }

        pub fn path(&self) -> &Path {
            &self.path
        }
    }
}
