//! Configuration tests for playerview
//!
//! Environment overrides touch process-wide state, so every test that reads
//! or writes `PLAYERVIEW_*` variables runs serially.

use anyhow::Result;
use playerview::engine::{EngineEvent, MediaSource};
use playerview::events::EVENT_BUFFER;
use playerview::player::SourceOptions;
use playerview::utils::{Config, ConstructionPolicy, VolumeScaling};
use playerview::SurfaceObserver;
use playerview_integration_tests::config_files::ConfigFile;
use playerview_integration_tests::TestFixture;
use serial_test::serial;

const ENV_VARS: [&str; 4] = [
    "PLAYERVIEW_LOG_LEVEL",
    "PLAYERVIEW_MIN_PROGRESS_INTERVAL",
    "PLAYERVIEW_STALL_THRESHOLD",
    "PLAYERVIEW_VOLUME_SCALING",
];

fn clear_env() {
    for var in ENV_VARS {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_file_values_reach_the_view() -> Result<()> {
    clear_env();
    let file = ConfigFile::write(
        r#"
[playback]
stall_threshold_percent = 50.0

[engine]
base_options = ["--verbose=0"]
hardware_decoding = false
construction = "eager"
"#,
    )?;

    let config = Config::from_file(file.path())?;
    assert_eq!(config.engine.construction, ConstructionPolicy::Eager);
    assert_eq!(config.playback.min_progress_interval_secs, 0.1);

    let fixture = TestFixture::with_config(config)?;
    fixture.view.on_attach();
    assert_eq!(fixture.factory.created_count(), 1);

    fixture.view.on_surface_created();
    fixture
        .view
        .set_source(Some("a.mp4"), SourceOptions::new(["-x"]));

    // New options after eager construction recreate the engine
    let engine = fixture.engine();
    assert_eq!(engine.options(), vec!["--verbose=0".to_string(), "-x".to_string()]);
    assert_eq!(engine.media(), Some(MediaSource::new("a.mp4", false)));

    engine.fire(EngineEvent::Buffering(40.0));
    let buffer = fixture.sink.named(EVENT_BUFFER);
    assert_eq!(buffer[0].payload["stalled"], true);

    Ok(())
}

#[test]
#[serial]
fn test_env_overrides_file() -> Result<()> {
    clear_env();
    let file = ConfigFile::write("[general]\nlog_level = \"warn\"\n")?;

    std::env::set_var("PLAYERVIEW_LOG_LEVEL", "debug");
    std::env::set_var("PLAYERVIEW_VOLUME_SCALING", "linear");
    std::env::set_var("PLAYERVIEW_MIN_PROGRESS_INTERVAL", "0.25");
    let config = Config::from_file(file.path());
    clear_env();

    let config = config?;
    assert_eq!(config.general.log_level, "debug");
    assert_eq!(config.engine.volume_scaling, VolumeScaling::Linear);
    assert_eq!(config.playback.min_progress_interval_secs, 0.25);
    Ok(())
}

#[test]
#[serial]
fn test_invalid_env_value_is_rejected() -> Result<()> {
    clear_env();
    let file = ConfigFile::write("")?;

    std::env::set_var("PLAYERVIEW_STALL_THRESHOLD", "plenty");
    let result = Config::from_file(file.path());
    clear_env();
    assert!(result.is_err());

    std::env::set_var("PLAYERVIEW_STALL_THRESHOLD", "250");
    let result = Config::from_file(file.path());
    clear_env();
    assert!(result.is_err());

    Ok(())
}

#[test]
#[serial]
fn test_save_round_trip() -> Result<()> {
    clear_env();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config.general.release_timeout_ms = 750;
    config.engine.volume_scaling = VolumeScaling::Linear;
    config.save_to(&path)?;

    let loaded = Config::from_file(&path)?;
    assert_eq!(loaded.general.release_timeout_ms, 750);
    assert_eq!(loaded.engine.volume_scaling, VolumeScaling::Linear);
    assert_eq!(loaded.engine.base_options, vec!["-vvvv".to_string()]);
    Ok(())
}

#[test]
fn test_malformed_file_is_rejected() -> Result<()> {
    let file = ConfigFile::write("[engine]\nconstruction = \"sometimes\"\n")?;
    assert!(Config::from_file(file.path()).is_err());
    Ok(())
}
