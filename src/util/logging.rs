//! Structured logging setup for finsight
//!
//! Logs always go to stderr so that `--format json` output on stdout stays
//! machine-readable. `RUST_LOG`, when set, takes precedence over everything
//! configured here.
//!
//! # Example
//!
//! ```no_run
//! use finsight::util::logging;
//! use tracing::{debug, info};
//!
//! // Reads FINSIGHT_LOG_LEVEL and FINSIGHT_LOG_JSON
//! logging::init_from_env();
//!
//! info!("Pipeline started");
//! debug!(root = "/srv/finance", "Resolved project root");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Crates whose request-level chatter is capped at `warn`
const NOISY_TARGETS: &[&str] = &["h2", "hyper", "hyper_util", "reqwest", "hf_hub", "tokenizers"];

/// Configuration for logging initialization
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum level for `finsight` targets
    pub level: Level,

    /// Emit one JSON object per event
    pub use_json: bool,

    /// Include the module target (e.g. finsight::kb::builder)
    pub include_target: bool,

    /// Include file and line number information
    pub include_location: bool,

    /// Include thread ID and name
    pub include_thread_ids: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
            include_thread_ids: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// JSON output with location and thread metadata
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            use_json: true,
            include_target: true,
            include_location: true,
            include_thread_ids: true,
        }
    }

    pub fn development() -> Self {
        Self {
            level: Level::DEBUG,
            use_json: false,
            include_target: true,
            include_location: false,
            include_thread_ids: false,
        }
    }

    /// Resolves the level from CLI flags
    ///
    /// An explicit `--log-level` wins, then `--verbose` (debug), then
    /// `--quiet` (error), then `FINSIGHT_LOG_LEVEL`, then info.
    pub fn from_flags(log_level: Option<&str>, verbose: bool, quiet: bool, json: bool) -> Self {
        let level = if let Some(level_str) = log_level {
            parse_level(level_str)
        } else if verbose {
            Level::DEBUG
        } else if quiet {
            Level::ERROR
        } else {
            parse_level(&env::var("FINSIGHT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()))
        };

        Self {
            level,
            use_json: json || env_json(),
            ..Default::default()
        }
    }
}

fn env_json() -> bool {
    env::var("FINSIGHT_LOG_JSON")
        .ok()
        .and_then(|v| v.trim().parse::<bool>().ok())
        .unwrap_or(false)
}

/// Parses a log level case-insensitively, falling back to INFO
///
/// ```
/// use finsight::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("debug"), Level::DEBUG);
/// assert_eq!(parse_level("WARN"), Level::WARN);
/// assert_eq!(parse_level("loud"), Level::INFO);
/// ```
pub fn parse_level(level_str: &str) -> Level {
    match level_str.trim().to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

fn add_directive(filter: EnvFilter, directive: &str) -> EnvFilter {
    match directive.parse::<Directive>() {
        Ok(parsed) => filter.add_directive(parsed),
        Err(e) => {
            eprintln!("Ignoring invalid log directive '{}': {}", directive, e);
            filter
        }
    }
}

/// Directives applied when `RUST_LOG` is unset
fn default_directives(level: Level) -> Vec<String> {
    let mut directives = vec![format!("finsight={}", level.as_str().to_lowercase())];
    directives.extend(NOISY_TARGETS.iter().map(|target| format!("{}=warn", target)));
    directives
}

fn build_filter(level: Level) -> EnvFilter {
    if env::var("RUST_LOG").is_ok() {
        return EnvFilter::from_default_env();
    }
    default_directives(level)
        .iter()
        .fold(EnvFilter::new("warn"), |filter, directive| {
            add_directive(filter, directive)
        })
}

/// Installs the global subscriber; later calls are ignored
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = build_filter(config.level);

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_thread_ids(config.include_thread_ids)
                        .with_thread_names(config.include_thread_ids),
                )
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_thread_ids(config.include_thread_ids)
                        .with_thread_names(config.include_thread_ids),
                )
                .init();
        }
    });
}

pub fn init_default() {
    init_logging(LoggingConfig::default());
}

/// Initializes logging from `FINSIGHT_LOG_LEVEL` and `FINSIGHT_LOG_JSON`
pub fn init_from_env() {
    init_logging(LoggingConfig::from_flags(None, false, false, false));
}
