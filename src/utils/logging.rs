use crate::config::LoggingSettings;

/// Initialize tracing for the process from `LoggingSettings`.
///
/// Unknown level names fall back to `info`.
pub fn init(settings: &LoggingSettings) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(parse_level(&settings.level))
        .with_target(settings.with_target)
        .try_init();
}

pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "error" => tracing::Level::ERROR,
        "warn" | "warning" => tracing::Level::WARN,
        "debug" => tracing::Level::DEBUG,
        "trace" => tracing::Level::TRACE,
        _ => tracing::Level::INFO,
    }
}
