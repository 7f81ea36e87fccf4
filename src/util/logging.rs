//! Structured logging setup
//!
//! Logs always go to stderr so that `--format json` output on stdout stays
//! machine-readable.
//!
//! Configuration sources, in order of precedence:
//! - `RUST_LOG` for arbitrary per-target filtering
//! - `RESOLUTES_LOG_LEVEL` (trace, debug, info, warn, error)
//! - `RESOLUTES_LOG_JSON` (true/false) for JSON lines
//!
//! ```no_run
//! use resolutes::util::logging;
//!
//! logging::init_from_env();
//! tracing::info!(subject = "Acme", "Analysis started");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_LEVEL_ENV: &str = "RESOLUTES_LOG_LEVEL";
pub const LOG_JSON_ENV: &str = "RESOLUTES_LOG_JSON";

static INIT: Once = Once::new();

/// Chatty dependencies held at warn unless `RUST_LOG` says otherwise
const QUIET_TARGETS: [&str; 4] = ["h2=warn", "hyper=warn", "reqwest=warn", "genai=warn"];

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: Level,
    pub use_json: bool,
    pub include_target: bool,
    pub include_location: bool,
    pub include_thread_ids: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: false,
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

    /// JSON lines with full metadata, for log collectors
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            use_json: true,
            include_target: true,
            include_location: true,
            include_thread_ids: true,
        }
    }

    /// Level for the CLI's `-v` counter and `-q` flag
    pub fn from_verbosity(verbose: u8, quiet: bool) -> Self {
        let level = if quiet {
            Level::ERROR
        } else {
            match verbose {
                0 => Level::INFO,
                1 => Level::DEBUG,
                _ => Level::TRACE,
            }
        };
        Self::with_level(level)
    }
}

/// Case-insensitive; unknown values fall back to INFO with a note on stderr
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

fn build_filter(level: Level, rust_log_set: bool) -> EnvFilter {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("resolutes={}", level).parse() {
        filter = filter.add_directive(directive);
    }
    if !rust_log_set {
        for target in QUIET_TARGETS {
            if let Ok(directive) = target.parse() {
                filter = filter.add_directive(directive);
            }
        }
    }
    filter
}

/// First call wins; later calls are no-ops
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = build_filter(config.level, env::var("RUST_LOG").is_ok());

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

/// Reads `RESOLUTES_LOG_LEVEL` and `RESOLUTES_LOG_JSON`, layered over `base`
pub fn config_from_env(base: LoggingConfig) -> LoggingConfig {
    let level = env::var(LOG_LEVEL_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(|v| parse_level(&v))
        .unwrap_or(base.level);

    let use_json = env::var(LOG_JSON_ENV)
        .ok()
        .and_then(|v| v.trim().parse::<bool>().ok())
        .unwrap_or(base.use_json);

    LoggingConfig {
        level,
        use_json,
        ..base
    }
}

pub fn init_from_env() {
    init_logging(config_from_env(LoggingConfig::default()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    struct EnvGuard {
        key: &'static str,
        original: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &'static str, value: &str) -> Self {
            let original = env::var(key).ok();
            env::set_var(key, value);
            Self { key, original }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.original {
                Some(v) => env::set_var(self.key, v),
                None => env::remove_var(self.key),
            }
        }
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace"), Level::TRACE);
        assert_eq!(parse_level("Debug"), Level::DEBUG);
        assert_eq!(parse_level(" WARNING "), Level::WARN);
        assert_eq!(parse_level("error"), Level::ERROR);
        assert_eq!(parse_level("loud"), Level::INFO);
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(LoggingConfig::from_verbosity(0, false).level, Level::INFO);
        assert_eq!(LoggingConfig::from_verbosity(1, false).level, Level::DEBUG);
        assert_eq!(LoggingConfig::from_verbosity(2, false).level, Level::TRACE);
        assert_eq!(LoggingConfig::from_verbosity(7, false).level, Level::TRACE);
        assert_eq!(LoggingConfig::from_verbosity(3, true).level, Level::ERROR);
    }

    #[test]
    fn test_production_config() {
        let config = LoggingConfig::production();
        assert!(config.use_json);
        assert!(config.include_location);
    }

    #[test]
    #[serial]
    fn test_config_from_env_overrides_base() {
        let _level = EnvGuard::set(LOG_LEVEL_ENV, "debug");
        let _json = EnvGuard::set(LOG_JSON_ENV, "true");

        let config = config_from_env(LoggingConfig::with_level(Level::ERROR));
        assert_eq!(config.level, Level::DEBUG);
        assert!(config.use_json);
    }

    #[test]
    #[serial]
    fn test_config_from_env_keeps_base_when_unset() {
        let _level = EnvGuard::set(LOG_LEVEL_ENV, "");
        let _json = EnvGuard::set(LOG_JSON_ENV, "maybe");

        let config = config_from_env(LoggingConfig::with_level(Level::WARN));
        assert_eq!(config.level, Level::WARN);
        assert!(!config.use_json);
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_logging(LoggingConfig::with_level(Level::ERROR));
        init_logging(LoggingConfig::production());
    }
}
