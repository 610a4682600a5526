//! Structured logging setup.
//!
//! - JSON formatting for production, pretty output for development
//! - stderr by default so stdout stays reserved for command output
//! - optional file output with daily rotation

use anyhow::{Context, Result};
use std::env;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use strum::{Display, EnumString};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Configuration for logging setup.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub output: LogOutput,
    /// Directory for log files (when output is `file`)
    pub log_dir: PathBuf,
    pub log_file_prefix: String,
    pub service_name: String,
    pub service_version: String,
    /// Environment (e.g. "development", "production")
    pub environment: String,
    /// Rotate log files daily
    pub enable_rotation: bool,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Log output destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogOutput {
    Stdout,
    Stderr,
    File,
}

impl LoggingConfig {
    fn is_production(&self) -> bool {
        matches!(self.environment.as_str(), "production" | "prod")
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("ENV"))
            .unwrap_or_else(|_| "development".to_string());
        let is_production = matches!(environment.as_str(), "production" | "prod");

        Self {
            format: if is_production {
                LogFormat::Json
            } else {
                LogFormat::Pretty
            },
            output: LogOutput::Stderr,
            log_dir: PathBuf::from("logs"),
            log_file_prefix: env!("CARGO_PKG_NAME").to_string(),
            service_name: env!("CARGO_PKG_NAME").to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            environment,
            enable_rotation: true,
        }
    }
}

impl LoggingConfig {
    /// Defaults overridden by `LOG_FORMAT`, `LOG_OUTPUT`, `LOG_DIR` and
    /// `LOG_ROTATION`. Unrecognised values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(format) = env::var("LOG_FORMAT")
            .ok()
            .and_then(|v| LogFormat::from_str(&v).ok())
        {
            config.format = format;
        }

        if let Some(output) = env::var("LOG_OUTPUT")
            .ok()
            .and_then(|v| LogOutput::from_str(&v).ok())
        {
            config.output = output;
        }

        if let Ok(log_dir) = env::var("LOG_DIR") {
            config.log_dir = PathBuf::from(log_dir);
        }

        if let Ok(rotation) = env::var("LOG_ROTATION") {
            match rotation.to_lowercase().as_str() {
                "never" | "false" | "0" => config.enable_rotation = false,
                "daily" | "true" | "1" => config.enable_rotation = true,
                _ => {}
            }
        }

        config
    }
}

/// Initialize structured logging with the given configuration.
///
/// The returned guard must be held until exit so buffered lines are flushed.
pub fn init_logging(config: LoggingConfig) -> Result<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let default_level = if config.is_production() { "warn" } else { "info" };
        EnvFilter::new(format!("{default_level},oxigraph=warn"))
    });

    let (writer, guard) = match config.output {
        LogOutput::Stdout => tracing_appender::non_blocking(io::stdout()),
        LogOutput::Stderr => tracing_appender::non_blocking(io::stderr()),
        LogOutput::File => {
            std::fs::create_dir_all(&config.log_dir).context("Failed to create log directory")?;

            let file_appender = if config.enable_rotation {
                tracing_appender::rolling::daily(&config.log_dir, &config.log_file_prefix)
            } else {
                tracing_appender::rolling::never(&config.log_dir, &config.log_file_prefix)
            };
            tracing_appender::non_blocking(file_appender)
        }
    };

    let registry = tracing_subscriber::registry();

    match config.format {
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_writer(writer)
                .with_target(true)
                .with_level(true)
                .with_line_number(true)
                .with_file(true)
                .with_span_events(FmtSpan::CLOSE)
                .with_current_span(true)
                .with_filter(env_filter);
            registry.with(fmt_layer).try_init()
        }
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .pretty()
                .with_writer(writer)
                .with_target(true)
                .with_level(true)
                .with_line_number(true)
                .with_file(true)
                .with_span_events(FmtSpan::CLOSE)
                .with_ansi(config.output != LogOutput::File)
                .with_filter(env_filter);
            registry.with(fmt_layer).try_init()
        }
    }
    .context("Failed to install tracing subscriber")?;

    tracing::debug!(
        service = %config.service_name,
        version = %config.service_version,
        environment = %config.environment,
        format = %config.format,
        output = %config.output,
        "logging initialized"
    );

    Ok(guard)
}

/// Span wrapping one CLI command.
pub fn command_span(command: &'static str) -> tracing::Span {
    tracing::info_span!(
        "command",
        command = command,
        service = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        unsafe {
            env::remove_var("LOG_FORMAT");
            env::remove_var("LOG_OUTPUT");
            env::remove_var("LOG_DIR");
            env::remove_var("LOG_ROTATION");
        }
    }

    #[test]
    #[serial]
    fn test_logging_config_default() {
        clear_env();
        let config = LoggingConfig::from_env();
        assert_eq!(config.service_name, "ait-introspect");
        assert_eq!(config.output, LogOutput::Stderr);
        assert!(config.enable_rotation);
    }

    #[test]
    #[serial]
    fn test_logging_config_from_env() {
        clear_env();
        unsafe {
            env::set_var("LOG_FORMAT", "JSON");
            env::set_var("LOG_OUTPUT", "file");
            env::set_var("LOG_DIR", "/tmp/ait-logs");
            env::set_var("LOG_ROTATION", "never");
        }

        let config = LoggingConfig::from_env();
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.output, LogOutput::File);
        assert_eq!(config.log_dir, PathBuf::from("/tmp/ait-logs"));
        assert!(!config.enable_rotation);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_unknown_values_keep_defaults() {
        clear_env();
        unsafe {
            env::set_var("LOG_OUTPUT", "syslog");
        }
        let config = LoggingConfig::from_env();
        assert_eq!(config.output, LogOutput::Stderr);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_init_logging_hands_back_guard_once() {
        clear_env();
        let config = LoggingConfig::from_env();

        let guard = init_logging(config.clone());
        assert!(guard.is_ok());

        let err = init_logging(config).unwrap_err();
        assert!(err.to_string().contains("Failed to install tracing subscriber"));
        drop(guard);
    }
}
