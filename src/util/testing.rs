//! Shared test setup: a `tracing` subscriber installed once per test binary

use std::env;
use std::sync::Once;

use tracing::{debug, info};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

static TEST_SETUP: Once = Once::new();

/// Install the test subscriber. Safe to call from every test.
pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    // RUST_LOG wins; otherwise trace our own crate only
    let env_filter = env::var("RUST_LOG")
        .ok()
        .and_then(|spec| EnvFilter::try_new(spec).ok())
        .unwrap_or_else(|| EnvFilter::new("treemodel=trace"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_test_writer()
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(env_filter),
    );

    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else if let Err(e) = subscriber.try_init() {
        eprintln!("Error: Failed to set up logging: {}", e);
    }
}
