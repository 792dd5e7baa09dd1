//! Click Guard demo host entry point.
//!
//! Wires the debounce guard, the dispatch interceptor, and a scripted click
//! source together, then replays a burst of clicks against two buttons so the
//! suppression is visible in the log.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()                 -- threshold, enabled flag, log level
//!  └─ save_config()                 -- writes the defaults on first run
//!  └─ DispatchInterceptor::new()    -- DebounceGuard + MonotonicClock
//!  └─ ClickDispatcher::install()    -- wraps every handler registered next
//!       ├─ "submit" handler         -- debounced
//!       └─ "counter" handler        -- exempt
//!  └─ run_dispatch_loop()           -- Tokio task draining the click source
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use click_guard::application::dispatch_registry::{ClickDispatcher, HandlerOptions};
use click_guard::application::intercept_click::{extract_target, ClickArg, DispatchInterceptor};
use click_guard::infrastructure::click_source::{
    mock::ScriptedClickSource, run_dispatch_loop, ClickEvent, ClickSource,
};
use click_guard::infrastructure::storage::config::{
    config_file_path, load_config, save_config, AppConfig,
};
use click_guard_core::{DebounceGuard, MonotonicClock, View};

/// Millisecond offsets of the scripted clicks on each button.
const SUBMIT_SCRIPT: [u64; 6] = [0, 100, 400, 600, 1_000, 1_100];
const COUNTER_SCRIPT: [u64; 3] = [0, 10, 20];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("failed to load config, using defaults: {e}");
            AppConfig::default()
        }
    };

    // Initialise structured logging.  `RUST_LOG` overrides the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.log_level)),
        )
        .init();

    // First run: write the defaults so there is a file to edit.
    if let Ok(path) = config_file_path() {
        if !path.exists() {
            match save_config(&config) {
                Ok(()) => info!(path = %path.display(), "wrote default config"),
                Err(e) => warn!("could not write default config: {e}"),
            }
        }
    }

    info!(
        threshold_ms = config.debounce.threshold_ms,
        enabled = config.debounce.enabled,
        "Click Guard demo starting"
    );

    let guard = Arc::new(DebounceGuard::new(config.debounce.threshold()));
    let interceptor = Arc::new(DispatchInterceptor::new(
        Arc::clone(&guard),
        Arc::new(MonotonicClock::new()),
    ));
    interceptor.set_enabled(config.debounce.enabled);

    let mut dispatcher = ClickDispatcher::new();
    dispatcher.install(interceptor.clone())?;

    let submit_runs = Arc::new(AtomicU64::new(0));
    let counter_runs = Arc::new(AtomicU64::new(0));

    let runs = Arc::clone(&submit_runs);
    let submit_id = dispatcher.register("submit", HandlerOptions::default(), move |args: &[ClickArg]| {
        let n = runs.fetch_add(1, Ordering::Relaxed) + 1;
        match extract_target(args) {
            Ok(view) => info!(view = view.label(), n, "submit handler ran"),
            Err(e) => warn!("submit handler ran without a view: {e}"),
        }
    });

    let runs = Arc::clone(&counter_runs);
    let counter_id = dispatcher.register("counter", HandlerOptions::exempt(), move |_args: &[ClickArg]| {
        let n = runs.fetch_add(1, Ordering::Relaxed) + 1;
        info!(n, "counter handler ran");
    });

    let submit_button = View::new("submit-button");
    let counter_button = View::new("counter-button");

    let source = ScriptedClickSource::new();
    let rx = source.start()?;
    let dispatch_task = tokio::spawn(run_dispatch_loop(Arc::new(dispatcher), rx));

    // Merge both scripts into one timeline and replay it in real time.
    let mut timeline: Vec<(u64, ClickEvent)> = SUBMIT_SCRIPT
        .iter()
        .map(|&t| (t, ClickEvent::on(submit_id, &submit_button)))
        .chain(
            COUNTER_SCRIPT
                .iter()
                .map(|&t| (t, ClickEvent::on(counter_id, &counter_button))),
        )
        .collect();
    timeline.sort_by_key(|(t, _)| *t);

    let mut elapsed = 0;
    for (at_ms, event) in timeline {
        tokio::time::sleep(Duration::from_millis(at_ms - elapsed)).await;
        elapsed = at_ms;
        source.inject(event)?;
    }
    source.stop();

    let summary = dispatch_task.await?;
    let stats = interceptor.stats();
    info!(
        forwarded = summary.forwarded,
        suppressed = summary.suppressed,
        submit_runs = submit_runs.load(Ordering::Relaxed),
        counter_runs = counter_runs.load(Ordering::Relaxed),
        tracked_targets = guard.tracked_targets()?,
        "replay finished"
    );
    info!(?stats, "interceptor stats");

    info!("Click Guard demo stopped");
    Ok(())
}
