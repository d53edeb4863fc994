use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber for the `tableflow` binary.
///
/// A directive in `RUST_LOG` wins; otherwise `log_level` from `--log-level`
/// applies to every target. Event targets are omitted from output.
pub fn init(log_level: &str) {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(from_env) => from_env,
        Err(_) => EnvFilter::new(log_level),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
