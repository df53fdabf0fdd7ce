use log::LevelFilter;
use simplelog::{Config, SimpleLogger};

/// Initialize console logging once at startup. A second init attempt is a
/// no-op
pub(crate) fn setup_logging(level: &str) {
    let log_level = match level {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        _ => LevelFilter::Info,
    };

    let _ = SimpleLogger::init(log_level, Config::default());
}

#[cfg(test)]
mod tests {
    use super::setup_logging;

    #[test]
    fn test_setup_logging() {
        setup_logging("info");
        // Re-init must not panic
        setup_logging("debug");
    }
}
