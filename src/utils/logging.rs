//! Thin adapter over the `log` facade: message deduplication and the
//! process-wide verbosity floor.

use std::collections::HashSet;
use std::sync::{Mutex, OnceLock};

use log::{Level, LevelFilter};

static SEEN: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();

fn seen() -> &'static Mutex<HashSet<String>> {
    SEEN.get_or_init(|| Mutex::new(HashSet::new()))
}

/// Log `message` at `level` the first time it is seen; later identical
/// messages are dropped. Returns whether the message was emitted.
///
/// Dedup is keyed on the formatted message, so callers embedding
/// varying detail get one line per distinct formatting.
pub fn log_once(level: Level, message: &str) -> bool {
    let mut seen = seen().lock().unwrap_or_else(|poison| poison.into_inner());
    if seen.insert(message.to_string()) {
        log::log!(level, "{}", message);
        true
    } else {
        false
    }
}

/// Forget every message `log_once` has seen, for test isolation.
pub fn reset_log_once() {
    seen()
        .lock()
        .unwrap_or_else(|poison| poison.into_inner())
        .clear();
}

/// The current process-wide verbosity floor.
pub fn verbosity_floor() -> LevelFilter {
    log::max_level()
}

/// Raise the verbosity floor to at least `level`. Monotonic: a floor
/// already above `level` is left alone.
pub fn raise_verbosity_floor(level: LevelFilter) {
    if level > log::max_level() {
        log::set_max_level(level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_once_deduplicates_by_message() {
        reset_log_once();
        assert!(log_once(Level::Info, "logging-dedup-probe"));
        assert!(!log_once(Level::Info, "logging-dedup-probe"));
        assert!(log_once(Level::Info, "logging-dedup-probe-2"));
        reset_log_once();
        assert!(log_once(Level::Info, "logging-dedup-probe"));
    }

    #[test]
    fn floor_only_rises() {
        raise_verbosity_floor(LevelFilter::Debug);
        assert!(verbosity_floor() >= LevelFilter::Debug);
        raise_verbosity_floor(LevelFilter::Error);
        // Floors never come back down mid-session.
        assert!(verbosity_floor() >= LevelFilter::Debug);
    }
}
