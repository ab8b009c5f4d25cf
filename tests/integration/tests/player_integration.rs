//! Integration tests for the playerview view controller
//!
//! These tests drive a complete view through a mock engine and verify:
//! - Deferred binding until a surface exists
//! - Event normalization end to end
//! - Error handling and release
//! - Engine recreation ordering
//! - Host lifecycle behavior

use anyhow::Result;
use mockall::mock;
use playerview::engine::mock::{EngineCall, Lifecycle};
use playerview::engine::{EngineEvent, EngineState, ENGINE_MAX_VOLUME};
use playerview::events::{
    ChannelSink, HostEventSink, LoggingSink, ViewId, EVENT_BUFFER, EVENT_END, EVENT_ERROR,
    EVENT_LOAD, EVENT_LOAD_START, EVENT_PROGRESS,
};
use playerview::player::{PropertyBinder, ReleaseExecutor, SourceOptions, ENGINE_ERROR_WHAT};
use playerview::utils::{Config, VolumeScaling};
use playerview::{LifecycleObserver, Surface, SurfaceObserver};
use playerview_integration_tests::{scripts, view_with_sink, TestFixture, RELEASE_WAIT};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

mock! {
    pub Sink {}

    impl HostEventSink for Sink {
        fn receive_event(&self, target: ViewId, name: &str, payload: Value);
    }
}

#[test]
fn test_load_start_deferred_until_surface_created() -> Result<()> {
    let fixture = TestFixture::new()?;
    fixture.view.on_attach();

    fixture
        .view
        .set_source(Some("a.mp4"), SourceOptions::new(["--network-caching=150"]));

    // No surface yet: nothing constructed, nothing emitted
    assert_eq!(fixture.factory.created_count(), 0);
    assert!(fixture.sink.events().is_empty());

    fixture.view.on_surface_created();

    assert_eq!(fixture.factory.created_count(), 1);
    assert_eq!(fixture.sink.names(), vec![EVENT_LOAD_START.to_string()]);
    assert_eq!(fixture.sink.events()[0].payload, json!({"src": {"uri": "a.mp4"}}));
    assert_eq!(
        fixture.engine().options(),
        vec!["-vvvv".to_string(), "--network-caching=150".to_string()]
    );

    Ok(())
}

#[test]
fn test_reference_event_sequence() -> Result<()> {
    let fixture = TestFixture::new()?;
    fixture.view.on_surface_created();
    fixture.view.set_source(Some("a.mp4"), SourceOptions::none());

    let engine = fixture.engine();
    engine.set_player_state(EngineState::Playing);
    fixture.sink.clear();

    // Engine reports "playing" throughout
    for event in [
        EngineEvent::Opening,
        EngineEvent::Playing,
        EngineEvent::TimeChanged(0),
        EngineEvent::TimeChanged(150),
        EngineEvent::Buffering(10.0),
        EngineEvent::TimeChanged(300),
    ] {
        engine.fire_raw(event);
    }

    let emitted: Vec<(String, Value)> = fixture
        .sink
        .events()
        .into_iter()
        .map(|e| (e.name, e.payload))
        .collect();

    assert_eq!(
        emitted,
        vec![
            (
                EVENT_LOAD.to_string(),
                json!({"duration": 120.0, "currentTime": 0.0})
            ),
            (EVENT_PROGRESS.to_string(), json!({"currentTime": 0.0})),
            (EVENT_PROGRESS.to_string(), json!({"currentTime": 0.15})),
            (
                EVENT_BUFFER.to_string(),
                json!({"progress": 10.0, "stalled": true})
            ),
            (EVENT_PROGRESS.to_string(), json!({"currentTime": 0.3})),
            (
                EVENT_BUFFER.to_string(),
                json!({"progress": 10.0, "stalled": false})
            ),
        ]
    );

    let snapshot = fixture.view.snapshot();
    assert!(snapshot.loaded);
    assert!(!snapshot.stalled);

    Ok(())
}

#[test]
fn test_engine_error_emits_once_and_releases() -> Result<()> {
    let fixture = TestFixture::new()?;
    fixture.view.on_surface_created();
    fixture.view.set_source(Some("a.mp4"), SourceOptions::none());

    let engine = fixture.engine();
    engine.fire(EngineEvent::Playing);
    fixture.sink.clear();

    engine.fire(EngineEvent::EncounteredError);
    fixture.wait_release();

    let errors = fixture.sink.named(EVENT_ERROR);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].payload["error"]["what"], ENGINE_ERROR_WHAT);

    assert!(!fixture.view.has_engine());
    assert!(engine.is_released());
    assert!(!engine.has_listener());
    assert!(!fixture.surface.keep_screen_on());

    // Nothing from the dead engine reaches the host anymore
    let before = fixture.sink.events().len();
    engine.fire_raw(EngineEvent::Playing);
    engine.fire_raw(EngineEvent::TimeChanged(5_000));
    assert_eq!(fixture.sink.events().len(), before);

    Ok(())
}

#[test]
fn test_release_twice_is_idempotent() -> Result<()> {
    let fixture = TestFixture::new()?;
    fixture.view.on_surface_created();
    fixture.view.set_source(Some("a.mp4"), SourceOptions::none());

    let first = fixture.view.release();
    let second = fixture.view.release();

    assert!(second.is_complete());
    assert!(first.wait_timeout(RELEASE_WAIT));
    assert_eq!(fixture.engine().count(&EngineCall::Release), 1);

    // Detaching afterwards is just as harmless
    assert!(fixture.view.on_detach().is_complete());
    Ok(())
}

#[test]
fn test_new_options_wait_for_previous_release() -> Result<()> {
    let fixture = TestFixture::with_release_delay(Duration::from_millis(100))?;
    fixture.view.on_surface_created();

    fixture
        .view
        .set_source(Some("a.mp4"), SourceOptions::new(["-a"]));
    fixture
        .view
        .set_source(Some("b.mp4"), SourceOptions::new(["-a"]));

    assert_eq!(
        fixture.factory.lifecycle(),
        vec![
            Lifecycle::Created(0),
            Lifecycle::Released(0),
            Lifecycle::Created(1),
        ]
    );
    assert_eq!(fixture.sink.named(EVENT_LOAD_START).len(), 2);
    assert_eq!(fixture.engine().media().unwrap().uri, "b.mp4");

    Ok(())
}

#[test]
fn test_shared_options_keep_engine() -> Result<()> {
    let fixture = TestFixture::new()?;
    fixture.view.on_surface_created();

    let (_, options) = PropertyBinder::parse_source(&json!({"uri": "a.mp4", "options": ["-x"]}))?;
    fixture.view.set_source(Some("a.mp4"), options.clone());
    fixture.view.set_source(Some("b.mp4"), options);

    assert_eq!(fixture.factory.created_count(), 1);

    // A fresh property update carries a fresh option list
    PropertyBinder::apply(
        &fixture.view,
        "src",
        &json!({"uri": "b.mp4", "options": ["-x"]}),
    )?;
    assert_eq!(fixture.factory.created_count(), 2);

    Ok(())
}

#[test]
fn test_load_once_per_bind() -> Result<()> {
    let fixture = TestFixture::new()?;
    fixture.view.on_surface_created();
    fixture.view.set_source(Some("a.mp4"), SourceOptions::none());
    let engine = fixture.engine();

    engine.fire(EngineEvent::Playing);
    engine.fire(EngineEvent::Paused);
    engine.fire(EngineEvent::Playing);
    assert_eq!(fixture.sink.named(EVENT_LOAD).len(), 1);

    fixture.view.set_source(Some("b.mp4"), SourceOptions::none());
    engine.fire(EngineEvent::Playing);
    engine.fire(EngineEvent::Playing);
    assert_eq!(fixture.sink.named(EVENT_LOAD).len(), 2);

    Ok(())
}

#[test]
fn test_stall_signalled_once_per_run() -> Result<()> {
    let fixture = TestFixture::new()?;
    fixture.view.on_surface_created();
    fixture.view.set_source(Some("a.mp4"), SourceOptions::none());
    let engine = fixture.engine();
    engine.set_player_state(EngineState::Playing);

    for event in scripts::buffering_with_two_stalls() {
        engine.fire_raw(event);
    }

    let stalled: Vec<bool> = fixture
        .sink
        .named(EVENT_BUFFER)
        .iter()
        .map(|e| e.payload["stalled"].as_bool().unwrap_or(false))
        .collect();
    assert_eq!(stalled, vec![false, true, true, true, false, true, true]);

    let begins = stalled.windows(2).filter(|w| !w[0] && w[1]).count();
    assert_eq!(begins, 2);

    Ok(())
}

#[test]
fn test_buffering_alone_never_clears_stall() -> Result<()> {
    let fixture = TestFixture::new()?;
    fixture.view.on_surface_created();
    fixture.view.set_source(Some("a.mp4"), SourceOptions::none());
    let engine = fixture.engine();

    engine.fire(EngineEvent::Buffering(5.0));
    engine.fire(EngineEvent::Buffering(100.0));
    assert!(fixture.view.snapshot().stalled);

    // Time advancing while paused does not clear it either
    engine.fire(EngineEvent::Paused);
    engine.fire(EngineEvent::TimeChanged(400));
    assert!(fixture.view.snapshot().stalled);

    engine.fire(EngineEvent::Playing);
    engine.fire(EngineEvent::TimeChanged(600));
    assert!(!fixture.view.snapshot().stalled);

    Ok(())
}

#[test]
fn test_progress_spacing() -> Result<()> {
    let fixture = TestFixture::new()?;
    fixture.view.on_surface_created();
    fixture.view.set_source(Some("a.mp4"), SourceOptions::none());
    let engine = fixture.engine();

    for event in scripts::ticks(40, 2_000) {
        engine.fire(event);
    }

    let times: Vec<f64> = fixture
        .sink
        .named(EVENT_PROGRESS)
        .iter()
        .filter_map(|e| e.payload["currentTime"].as_f64())
        .collect();

    // Every third 40 ms tick is the first one at least 100 ms past the last report
    let expected: Vec<f64> = (0..=16).map(|k| f64::from(k * 120) / 1000.0).collect();
    assert_eq!(times, expected);

    Ok(())
}

#[test]
fn test_progress_reported_at_exact_interval() -> Result<()> {
    let fixture = TestFixture::new()?;
    fixture.view.on_surface_created();
    fixture.view.set_source(Some("a.mp4"), SourceOptions::none());
    let engine = fixture.engine();

    for ms in [0, 150, 250, 350, 420, 450] {
        engine.fire(EngineEvent::TimeChanged(ms));
    }

    let times: Vec<f64> = fixture
        .sink
        .named(EVENT_PROGRESS)
        .iter()
        .filter_map(|e| e.payload["currentTime"].as_f64())
        .collect();
    assert_eq!(times, vec![0.0, 0.15, 0.25, 0.35, 0.45]);
    assert_eq!(fixture.view.snapshot().last_reported_progress, 0.45);

    Ok(())
}

#[test]
fn test_modifiers_survive_engine_recreation() -> Result<()> {
    let mut config = Config::default();
    config.engine.volume_scaling = VolumeScaling::Linear;
    let fixture = TestFixture::with_config(config)?;

    PropertyBinder::apply(&fixture.view, "paused", &json!(true))?;
    PropertyBinder::apply(&fixture.view, "volume", &json!(0.5))?;

    fixture.view.on_surface_created();
    fixture.view.set_source(Some("a.mp4"), SourceOptions::new(["-a"]));
    let first = fixture.engine();
    assert_eq!(first.volume(), Some(100));
    assert!(first.calls().contains(&EngineCall::Pause));

    fixture.view.set_source(Some("a.mp4"), SourceOptions::new(["-b"]));
    let second = fixture.engine();
    assert_ne!(first.id(), second.id());
    assert_eq!(second.volume(), Some(100));
    assert!(second.calls().contains(&EngineCall::Pause));

    PropertyBinder::apply(&fixture.view, "muted", &json!(true))?;
    assert_eq!(second.volume(), Some(0));

    Ok(())
}

#[test]
fn test_end_reached_then_rebind() -> Result<()> {
    let fixture = TestFixture::new()?;
    fixture.view.on_surface_created();
    fixture.view.set_source(Some("a.mp4"), SourceOptions::none());

    fixture.engine().fire(EngineEvent::Playing);
    fixture.engine().fire(EngineEvent::EndReached);
    fixture.wait_release();

    assert_eq!(fixture.sink.named(EVENT_END).len(), 1);
    assert!(!fixture.view.has_engine());

    // Detach and attach again rebinds the remembered source
    fixture.view.on_detach();
    fixture.view.on_attach();
    assert_eq!(fixture.factory.created_count(), 2);
    assert_eq!(fixture.sink.named(EVENT_LOAD_START).len(), 2);

    Ok(())
}

#[test]
fn test_surface_recreated_after_error_does_not_retry() -> Result<()> {
    let fixture = TestFixture::new()?;
    fixture.view.on_attach();
    fixture.view.on_surface_created();
    fixture.view.set_source(Some("a.mp4"), SourceOptions::none());

    fixture.engine().fire(EngineEvent::Playing);
    fixture.engine().fire(EngineEvent::EncounteredError);
    fixture.wait_release();

    // Host goes to the background and comes back with a new surface
    fixture.view.on_host_background();
    fixture.view.on_surface_destroyed();
    fixture.view.on_surface_created();
    fixture.view.on_host_foreground();

    assert_eq!(fixture.factory.created_count(), 1);
    assert_eq!(fixture.sink.named(EVENT_LOAD_START).len(), 1);
    assert!(!fixture.view.has_engine());
    assert_eq!(
        fixture.view.snapshot().source_uri.as_deref(),
        Some("a.mp4")
    );

    // Retrying is the host's call
    fixture.view.set_source(Some("a.mp4"), SourceOptions::none());
    assert_eq!(fixture.factory.created_count(), 2);
    assert_eq!(fixture.sink.named(EVENT_LOAD_START).len(), 2);

    Ok(())
}

#[test]
fn test_surface_recreated_after_end_does_not_replay() -> Result<()> {
    let fixture = TestFixture::new()?;
    fixture.view.on_surface_created();
    fixture.view.set_source(Some("a.mp4"), SourceOptions::none());

    fixture.engine().fire(EngineEvent::EndReached);
    fixture.wait_release();

    fixture.view.on_surface_destroyed();
    fixture.view.on_surface_created();

    assert_eq!(fixture.factory.created_count(), 1);
    assert_eq!(fixture.sink.named(EVENT_END).len(), 1);
    assert_eq!(fixture.sink.named(EVENT_LOAD_START).len(), 1);

    Ok(())
}

#[test]
fn test_release_timeout_never_overlaps_engines() -> Result<()> {
    let mut config = Config::default();
    config.general.release_timeout_ms = 20;
    let fixture =
        TestFixture::with_config_and_release_delay(config, Duration::from_millis(300))?;
    fixture.view.on_surface_created();

    fixture
        .view
        .set_source(Some("a.mp4"), SourceOptions::new(["-a"]));
    fixture
        .view
        .set_source(Some("a.mp4"), SourceOptions::new(["-a"]));

    // The timeout only bounds the quiet wait; construction still waits for the release
    assert_eq!(
        fixture.factory.lifecycle(),
        vec![
            Lifecycle::Created(0),
            Lifecycle::Released(0),
            Lifecycle::Created(1),
        ]
    );
    assert!(fixture.view.has_engine());

    Ok(())
}

#[test]
fn test_volume_never_exceeds_engine_range() -> Result<()> {
    for scaling in [VolumeScaling::Truncating, VolumeScaling::Linear] {
        let mut config = Config::default();
        config.engine.volume_scaling = scaling;
        let fixture = TestFixture::with_config(config)?;

        PropertyBinder::apply(&fixture.view, "volume", &json!(2.0))?;
        fixture.view.on_surface_created();
        fixture.view.set_source(Some("a.mp4"), SourceOptions::none());
        let engine = fixture.engine();
        assert_eq!(engine.volume(), Some(ENGINE_MAX_VOLUME), "{:?}", scaling);

        PropertyBinder::apply(&fixture.view, "volume", &json!(7.5))?;
        assert_eq!(engine.volume(), Some(ENGINE_MAX_VOLUME), "{:?}", scaling);
    }

    Ok(())
}

#[test]
fn test_background_then_foreground() -> Result<()> {
    let fixture = TestFixture::new()?;
    fixture.view.on_surface_created();
    fixture.view.set_source(Some("a.mp4"), SourceOptions::none());
    let engine = fixture.engine();

    fixture.view.on_host_background();
    fixture.view.on_surface_destroyed();
    assert!(fixture.view.has_engine());
    assert_eq!(engine.count(&EngineCall::DetachOutput), 1);

    fixture.view.on_surface_created();
    engine.clear_calls();
    fixture.view.on_host_foreground();

    // Output is back; modifiers re-applied in order
    assert!(fixture.view.snapshot().output_attached);
    assert_eq!(
        engine.calls(),
        vec![
            EngineCall::Play,
            EngineCall::SetVolume(200),
            EngineCall::SetVolume(200),
        ]
    );

    Ok(())
}

#[test]
fn test_construction_failure_reports_error() -> Result<()> {
    let fixture = TestFixture::new()?;
    fixture.factory.set_failure(Some("engine unavailable"));
    fixture.view.on_surface_created();
    fixture.view.set_source(Some("a.mp4"), SourceOptions::none());

    assert_eq!(fixture.sink.names(), vec![EVENT_ERROR.to_string()]);
    assert!(!fixture.view.has_engine());

    // The host retries by setting the source again
    fixture.factory.set_failure(None);
    fixture.view.set_source(Some("a.mp4"), SourceOptions::none());
    assert!(fixture.view.has_engine());
    assert_eq!(fixture.sink.named(EVENT_LOAD_START).len(), 1);

    Ok(())
}

#[test]
fn test_mock_sink_receives_addressed_events() -> Result<()> {
    let mut sink = MockSink::new();
    sink.expect_receive_event()
        .withf(|target, name, payload| {
            *target == ViewId(7)
                && name == EVENT_LOAD_START
                && payload["src"]["uri"] == "rtsp://cam/1"
        })
        .times(1)
        .return_const(());
    sink.expect_receive_event()
        .withf(|target, name, payload| {
            *target == ViewId(7) && name == EVENT_LOAD && payload["duration"] == 120.0
        })
        .times(1)
        .return_const(());

    let fixture = view_with_sink(Arc::new(sink))?;
    fixture.view.on_surface_created();
    fixture
        .view
        .set_source(Some("rtsp://cam/1"), SourceOptions::none());
    fixture.factory.last().unwrap().fire(EngineEvent::Playing);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_release_on_shared_runtime() -> Result<()> {
    let executor = ReleaseExecutor::from_handle(tokio::runtime::Handle::current());
    let fixture = TestFixture::with_executor(executor)?;
    fixture.view.on_surface_created();
    fixture.view.set_source(Some("a.mp4"), SourceOptions::none());
    let engine = fixture.engine();

    let handle = fixture.view.release();
    let finished =
        tokio::task::spawn_blocking(move || handle.wait_timeout(RELEASE_WAIT)).await?;

    assert!(finished);
    assert!(engine.is_released());
    Ok(())
}

#[tokio::test]
async fn test_channel_sink_delivers_in_order() -> Result<()> {
    let (tx, rx) = crossbeam_channel::unbounded();
    let fixture = view_with_sink(Arc::new(ChannelSink::new(tx)))?;
    fixture.view.on_surface_created();
    fixture.view.set_source(Some("a.mp4"), SourceOptions::none());

    let engine = fixture.factory.last().unwrap();
    engine.fire(EngineEvent::Playing);
    engine.fire(EngineEvent::Paused);
    fixture.view.seek_to(30_000);

    let names: Vec<String> = rx.try_iter().map(|e| e.name).collect();
    assert_eq!(
        names,
        vec![
            "onVideoLoadStart",
            "onVideoLoad",
            "onVideoPause",
            "onVideoSeek"
        ]
    );
    Ok(())
}

#[test]
fn test_logging_sink_session() -> Result<()> {
    let fixture = view_with_sink(Arc::new(LoggingSink))?;
    fixture.view.on_surface_created();
    fixture.view.set_source(Some("a.mp4"), SourceOptions::none());

    let engine = fixture.factory.last().unwrap();
    for event in scripts::ticks(100, 500) {
        engine.fire(event);
    }
    engine.fire(EngineEvent::EndReached);

    let pending = fixture.view.pending_release().expect("end releases the engine");
    assert!(pending.wait_timeout(RELEASE_WAIT));
    assert!(engine.is_released());
    assert!(fixture.view.on_detach().is_complete());
    Ok(())
}
