//! Structured logging bootstrap.
//!
//! Installs a `tracing` subscriber made of an `EnvFilter`, the per-request
//! [`RecordLayer`] that feeds the debug block, and a JSON or pretty `fmt`
//! layer writing through a non-blocking `tracing-appender` writer, to stdout,
//! stderr or a file.
//!
//! ```rust,no_run
//! use nasse::config::Config;
//! use nasse::logging::{init_logging_with_config, LogConfig};
//!
//! let config = Config::named("Demo").apply_env();
//! let _guard = init_logging_with_config(&LogConfig::from_config(&config))
//!     .expect("Failed to initialize logging");
//! ```

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::{Config, LogSink};
use crate::record::RecordLayer;

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// trace/debug/info/warn/error, case-insensitive
    pub log_level: String,
    pub format: LogFormat,
    /// Log file; the sink is used when absent
    pub file: Option<PathBuf>,
    pub sink: LogSink,
    /// Extra comma-separated filter directives
    pub target_filter: Option<String>,
    /// Include file:line location
    pub include_location: bool,
}

impl LogConfig {
    /// Parse configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            log_level: env::var("NASSE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: LogFormat::parse(
                &env::var("NASSE_LOG_FORMAT").unwrap_or_else(|_| "json".to_string()),
            ),
            file: env::var("NASSE_LOG_FILE").ok().map(PathBuf::from),
            sink: LogSink::Stdout,
            target_filter: env::var("NASSE_LOG_TARGET_FILTER").ok(),
            include_location: env::var("NASSE_LOG_INCLUDE_LOCATION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),
        }
    }

    /// Logging as the application configuration describes it. Debug mode
    /// switches to the pretty format with locations.
    pub fn from_config(config: &Config) -> Self {
        Self {
            log_level: config.log_level.clone(),
            format: if config.debug {
                LogFormat::Pretty
            } else {
                LogFormat::Json
            },
            file: config.log_file.clone(),
            sink: config.log_sink,
            target_filter: env::var("NASSE_LOG_TARGET_FILTER").ok(),
            include_location: config.debug,
        }
    }

    fn level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" | "warning" => Level::WARN,
            "error" | "critical" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

/// Keeps the background log writer alive. Dropping it flushes pending lines.
#[derive(Debug)]
pub struct LoggingGuard {
    _writer: WorkerGuard,
}

/// Initialize the global subscriber.
///
/// Fails when a global subscriber is already installed or the log file
/// cannot be opened.
pub fn init_logging_with_config(config: &LogConfig) -> Result<LoggingGuard> {
    let level = config.level();
    let mut env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    if let Some(target_filter) = &config.target_filter {
        for filter in target_filter.split(',') {
            let filter = filter.trim();
            if filter.is_empty() {
                continue;
            }
            let directive = filter
                .parse::<Directive>()
                .with_context(|| format!("Invalid log filter directive: {filter}"))?;
            env_filter = env_filter.add_directive(directive);
        }
    }

    let (writer, guard) = match (&config.file, config.sink) {
        (Some(path), _) => {
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map_or_else(|| PathBuf::from("."), PathBuf::from);
            let file_name = path
                .file_name()
                .with_context(|| format!("Log file path has no file name: {}", path.display()))?;
            std::fs::create_dir_all(&directory)
                .with_context(|| format!("Failed to create log directory {}", directory.display()))?;
            tracing_appender::non_blocking(tracing_appender::rolling::never(directory, file_name))
        }
        (None, LogSink::Stdout) => tracing_appender::non_blocking(std::io::stdout()),
        (None, LogSink::Stderr) => tracing_appender::non_blocking(std::io::stderr()),
    };

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(RecordLayer::new());

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_span_list(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_ansi(config.file.is_none())
            .with_writer(writer)
            .boxed(),
    };

    registry
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(LoggingGuard { _writer: guard })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("PRETTY"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("anything"), LogFormat::Json);
    }

    #[test]
    fn test_from_config_debug() {
        let config = Config::named("Demo").with_debug(true).normalize();
        let log = LogConfig::from_config(&config);
        assert_eq!(log.format, LogFormat::Pretty);
        assert_eq!(log.level(), Level::DEBUG);
        assert!(log.file.as_ref().unwrap().ends_with("nasse.debug.log"));
        assert!(log.include_location);
    }

    #[test]
    fn test_from_config_default() {
        let log = LogConfig::from_config(&Config::default().normalize());
        assert_eq!(log.format, LogFormat::Json);
        assert_eq!(log.level(), Level::INFO);
        assert!(log.file.is_none());
        assert_eq!(log.sink, LogSink::Stdout);
    }
}
