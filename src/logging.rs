#![cfg(feature = "std")]

use std::env;
use std::sync::OnceLock;
use std::time::Instant;

use log::{self, LevelFilter, Metadata, Record};

/// Env var holding the log level (`error`, `warn`, `info`, `debug`, `trace`).
pub const LOG_ENV: &str = "TICTACTOE_LOG";

/// Writes to stderr so log lines never mix with the board on stdout. Each
/// line carries the time since start-up and the module it came from.
struct PeerLogger {
    started: OnceLock<Instant>,
}

impl PeerLogger {
    fn elapsed_secs(&self) -> f64 {
        self.started.get_or_init(Instant::now).elapsed().as_secs_f64()
    }
}

/// Module path without the crate prefix, e.g. `session` or `signaling::tcp`.
fn short_target(target: &str) -> &str {
    target
        .strip_prefix("p2p_tictactoe::")
        .unwrap_or(target)
}

impl log::Log for PeerLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!(
                "[{:8.3}s] {:5} {}: {}",
                self.elapsed_secs(),
                record.level(),
                short_target(record.target()),
                record.args()
            );
        }
    }

    fn flush(&self) {}
}

static LOGGER: PeerLogger = PeerLogger {
    started: OnceLock::new(),
};

/// Initialize logging with a level taken from the `TICTACTOE_LOG` environment variable.
/// Defaults to `info` if the variable is not set or invalid.
pub fn init_logging() {
    init_logging_with(LevelFilter::Info);
}

/// Like [`init_logging`], with a caller-chosen fallback level. Calling it
/// again after a logger is installed does nothing.
pub fn init_logging_with(default: LevelFilter) {
    let level = env::var(LOG_ENV)
        .ok()
        .and_then(|lvl| lvl.parse().ok())
        .unwrap_or(default);
    LOGGER.started.get_or_init(Instant::now);
    let _ = log::set_logger(&LOGGER).map(|()| log::set_max_level(level));
}
