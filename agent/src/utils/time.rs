use chrono::{Local, SecondsFormat, Utc};

/// Time now as a UTC ISO8601 string
pub(crate) fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Local wall-clock HH:MM for console output
pub(crate) fn clock_display() -> String {
    Local::now().format("%H:%M").to_string()
}
