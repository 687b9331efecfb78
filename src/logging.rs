//! Logging for the host side of the extension.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Once, RwLock};

use log::{LevelFilter, Log, Metadata, Record};
use once_cell::sync::Lazy;

const LOGGER_STATE_UNINIT: u8 = 0;
const LOGGER_STATE_READY: u8 = 1;
const LOGGER_STATE_FAILED: u8 = 2;

/// Target whose records the plain level setting applies to.
const DEFAULT_TARGET: &str = "hello";

static LOGGER_STATE: AtomicU8 = AtomicU8::new(LOGGER_STATE_UNINIT);
static LOGGER_INIT: Once = Once::new();
static HOST_LOGGER: Lazy<HostLogger> = Lazy::new(HostLogger::new);

/// Errors raised while configuring logging.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("invalid log filter `{filter}`: {reason}")]
    InvalidFilter { filter: String, reason: String },
    #[error("logging already initialized by another logger")]
    AlreadyInitialized,
}

#[derive(Clone, Debug)]
struct TargetFilter {
    target: String,
    level: LevelFilter,
}

/// A parsed `RUST_LOG`-style filter.
#[derive(Clone, Debug)]
pub struct LogFilter {
    default: LevelFilter,
    directives: Vec<TargetFilter>,
}

impl LogFilter {
    /// Applies `level` to this crate's records and silences everything else.
    pub fn for_level(level: LevelFilter) -> Self {
        Self {
            default: LevelFilter::Off,
            directives: vec![TargetFilter {
                target: DEFAULT_TARGET.to_string(),
                level,
            }],
        }
    }

    /// Parses comma-separated `level`, `target` or `target=level` directives.
    pub fn parse(spec: &str) -> Result<Self, String> {
        let mut default = LevelFilter::Off;
        let mut directives = Vec::new();

        for (index, raw) in spec.split(',').enumerate() {
            let directive = raw.trim();
            if directive.is_empty() {
                continue;
            }
            let (left, right) = match directive.split_once('=') {
                Some((left, right)) => (left.trim(), Some(right.trim())),
                None => (directive, None),
            };

            if left.is_empty() {
                return Err(format!("empty log directive at position {index}"));
            }

            match right {
                Some("") => return Err(format!("missing log level for target `{left}`")),
                Some(level_str) => {
                    let level = parse_level(level_str)
                        .ok_or_else(|| format!("invalid level `{level_str}`"))?;
                    directives.push(TargetFilter {
                        target: left.to_string(),
                        level,
                    });
                }
                None => match parse_level(left) {
                    Some(level) => default = level,
                    None => directives.push(TargetFilter {
                        target: left.to_string(),
                        level: LevelFilter::Trace,
                    }),
                },
            }
        }

        Ok(Self { default, directives })
    }

    /// Longest matching target prefix decides; otherwise the default level.
    pub fn enabled(&self, metadata: &Metadata) -> bool {
        let target = metadata.target();
        let mut best_level = self.default;
        let mut best_len = 0usize;

        for directive in &self.directives {
            if target.starts_with(&directive.target) && directive.target.len() >= best_len {
                best_len = directive.target.len();
                best_level = directive.level;
            }
        }

        metadata.level().to_level_filter() <= best_level
    }

    /// Most verbose level any directive enables.
    pub fn max_level(&self) -> LevelFilter {
        self.directives
            .iter()
            .map(|directive| directive.level)
            .fold(self.default, |max, level| max.max(level))
    }
}

struct HostLogger {
    filter: RwLock<LogFilter>,
}

impl HostLogger {
    fn new() -> Self {
        Self {
            filter: RwLock::new(LogFilter::for_level(LevelFilter::Warn)),
        }
    }

    fn update(&self, filter: LogFilter) {
        let mut guard = self.filter.write().unwrap_or_else(|err| err.into_inner());
        *guard = filter;
    }

    fn with_filter<T>(&self, f: impl FnOnce(&LogFilter) -> T) -> T {
        let guard = self.filter.read().unwrap_or_else(|err| err.into_inner());
        f(&guard)
    }
}

impl Log for HostLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.with_filter(|filter| filter.enabled(metadata))
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        eprintln!("{} {}: {}", record.level(), record.target(), record.args());
    }

    fn flush(&self) {}
}

fn parse_level(value: &str) -> Option<LevelFilter> {
    match value.trim().to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

/// Picks the `RUST_LOG` value when set, otherwise `level` for this crate.
fn resolve_filter(
    env_filter: Option<String>,
    level: LevelFilter,
) -> Result<LogFilter, LoggingError> {
    match env_filter {
        Some(filter) => LogFilter::parse(&filter)
            .map_err(|reason| LoggingError::InvalidFilter { filter, reason }),
        None => Ok(LogFilter::for_level(level)),
    }
}

fn ensure_logger() -> Result<(), LoggingError> {
    LOGGER_INIT.call_once(|| {
        let state = if log::set_logger(&*HOST_LOGGER).is_ok() {
            LOGGER_STATE_READY
        } else {
            LOGGER_STATE_FAILED
        };
        LOGGER_STATE.store(state, Ordering::SeqCst);
    });

    match LOGGER_STATE.load(Ordering::SeqCst) {
        LOGGER_STATE_READY => Ok(()),
        _ => Err(LoggingError::AlreadyInitialized),
    }
}

/// Installs the stderr logger, or replaces its filter if already installed.
pub fn init(level: LevelFilter) -> Result<(), LoggingError> {
    let filter = resolve_filter(std::env::var("RUST_LOG").ok(), level)?;
    init_with_filter(filter)
}

/// Installs the stderr logger with an explicit filter, replacing any previous one.
pub fn init_with_filter(filter: LogFilter) -> Result<(), LoggingError> {
    ensure_logger()?;
    log::set_max_level(filter.max_level());
    HOST_LOGGER.update(filter);
    Ok(())
}
