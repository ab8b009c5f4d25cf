use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn};
use playerview::engine::mock::MockEngineHandle;
use playerview::engine::{EngineEvent, MockEngineFactory, MockSurface};
use playerview::events::{HostEventSink, LoggingSink, ViewId};
use playerview::player::{
    PropertyBinder, ReleaseExecutor, PROP_MUTED, PROP_PAUSED, PROP_SRC, PROP_VOLUME,
};
use playerview::utils::{init_logging, load_config, Config, ConstructionPolicy};
use playerview::{Dimensions, LifecycleObserver, PlayerView, PlayerViewBuilder, SurfaceObserver};
use serde_json::{json, Value};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

/// Media length of the scripted session
const SCRIPT_LENGTH_MS: i64 = 3_000;

/// Engine tick interval of the scripted session
const SCRIPT_TICK_MS: i64 = 250;

/// playerview - replay a scripted playback session and print host events
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Media URI to bind
    #[arg(long, default_value = "file:///media/sample.mp4")]
    uri: String,

    /// Start with the paused modifier set
    #[arg(long)]
    paused: bool,

    /// Start muted
    #[arg(long)]
    muted: bool,

    /// Initial volume (1.0 is the default level)
    #[arg(long, default_value = "1.0")]
    volume: f32,

    /// Configuration file to use instead of the default locations
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Construct the engine as soon as the view is attached
    #[arg(long)]
    eager: bool,

    /// Inject an engine error at this media time
    #[arg(long, value_name = "MS")]
    fail_at_ms: Option<i64>,

    /// Log host events instead of printing them as JSON lines
    #[arg(long)]
    log_events: bool,

    /// Write the effective configuration to the user config file and exit
    #[arg(long)]
    save_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => load_config().context("Failed to load config")?,
    };
    if args.eager {
        config.engine.construction = ConstructionPolicy::Eager;
    }

    if args.save_config {
        config.save().context("Failed to save config")?;
        if let Some(path) = Config::user_config_path() {
            println!("Configuration written to {}", path.display());
        }
        return Ok(());
    }

    let log_level = if args.debug {
        "debug".to_string()
    } else {
        config.general.log_level.clone()
    };
    init_logging(&log_level);

    info!("Starting playerview v{}", env!("CARGO_PKG_VERSION"));

    let handle = Handle::current();
    tokio::task::spawn_blocking(move || run_session(args, config, handle))
        .await
        .context("Session task panicked")??;

    info!("Session finished");
    Ok(())
}

/// Drive one view through attach, bind, playback and detach
fn run_session(args: Args, config: Config, handle: Handle) -> Result<()> {
    let factory = MockEngineFactory::new().with_length_ms(SCRIPT_LENGTH_MS);
    let surface = Arc::new(MockSurface::new(
        Dimensions::new(1280, 720),
        Dimensions::new(1280, 720),
    ));

    let sink: Arc<dyn HostEventSink> = if args.log_events {
        Arc::new(LoggingSink)
    } else {
        Arc::new(JsonLinesSink)
    };

    let view = PlayerViewBuilder::new(ViewId(1))
        .with_config(config)
        .with_engine_factory(Arc::new(factory.clone()))
        .with_surface(&surface)
        .with_event_sink(sink)
        .with_executor(ReleaseExecutor::from_handle(handle))
        .build()?;

    view.on_attach();
    PropertyBinder::apply(&view, PROP_PAUSED, &json!(args.paused))?;
    PropertyBinder::apply(&view, PROP_MUTED, &json!(args.muted))?;
    PropertyBinder::apply(&view, PROP_VOLUME, &json!(args.volume))?;
    PropertyBinder::apply(&view, PROP_SRC, &json!({ "uri": args.uri }))?;
    view.on_surface_created();

    match factory.last() {
        Some(engine) => play_script(&view, &engine, args.fail_at_ms),
        None => warn!("No engine was constructed, nothing to play"),
    }

    view.on_detach();
    if let Some(pending) = view.pending_release() {
        if !pending.wait_timeout(Duration::from_secs(5)) {
            warn!("Engine release did not finish in time");
        }
    }
    view.on_surface_destroyed();
    Ok(())
}

/// Fire the engine events of a short network playback
fn play_script(view: &PlayerView, engine: &MockEngineHandle, fail_at_ms: Option<i64>) {
    engine.fire(EngineEvent::Opening);
    engine.fire(EngineEvent::Buffering(12.0));
    engine.fire(EngineEvent::Buffering(64.0));
    engine.fire(EngineEvent::Playing);

    let mut time_ms = 0;
    while time_ms <= SCRIPT_LENGTH_MS {
        if fail_at_ms.is_some_and(|at| time_ms >= at) {
            warn!("Injecting engine error at {}ms", time_ms);
            engine.fire(EngineEvent::EncounteredError);
            return;
        }

        engine.fire(EngineEvent::TimeChanged(time_ms));

        if time_ms == SCRIPT_LENGTH_MS / 2 {
            debug!("Simulating a rebuffer");
            engine.fire(EngineEvent::Buffering(8.0));
            engine.fire(EngineEvent::TimeChanged(time_ms));

            view.on_host_background();
            engine.fire(EngineEvent::Paused);
            view.on_host_foreground();
            engine.fire(EngineEvent::Playing);

            view.seek_to(time_ms + SCRIPT_TICK_MS * 2);
            time_ms += SCRIPT_TICK_MS * 2;
            continue;
        }

        time_ms += SCRIPT_TICK_MS;
    }

    engine.fire(EngineEvent::EndReached);
}

/// Sink printing each host event as one JSON line on stdout
struct JsonLinesSink;

impl HostEventSink for JsonLinesSink {
    fn receive_event(&self, target: ViewId, name: &str, payload: Value) {
        let line = json!({ "target": target.0, "name": name, "payload": payload });
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", line) {
            warn!("Failed to write event {}: {}", name, e);
        }
    }
}
