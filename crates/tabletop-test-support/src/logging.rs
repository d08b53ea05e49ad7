//! Test log output.

use tracing_subscriber::EnvFilter;

/// Routes `tracing` output to the test harness. Honors `RUST_LOG`, defaults
/// to `warn`. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
