use tracing_subscriber::EnvFilter;

/// Install the process-wide fmt subscriber.
///
/// `RUST_LOG` wins when set and valid; otherwise `server.log_level` becomes
/// the filter for this crate, with dependencies held at `warn`. Later calls
/// are no-ops.
pub fn init(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(log_level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Filter directive for a configured level name. Unknown names mean `info`.
pub(crate) fn default_directive(log_level: &str) -> String {
    let level = match log_level.trim().to_lowercase().as_str() {
        "error" => "error",
        "warn" | "warning" => "warn",
        "debug" => "debug",
        "trace" => "trace",
        _ => "info",
    };
    format!("warn,weathercast={level}")
}
