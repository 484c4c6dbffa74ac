//! Logging System
//!
//! Structured logging via the `tracing` crate: configurable level, output
//! format, and destination. Service and cache operations emit their spans
//! and events through the subscriber installed here.

use crate::error::TreeError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Whether logging is enabled (default: true).
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level: trace, debug, info, warn, error, off.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text (default: text).
    #[serde(default = "default_format")]
    pub format: String,

    /// Output destination: stdout, stderr, file, file+stderr.
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file path when output includes file; None means runtime default.
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Colored output (text format, terminal destinations only).
    #[serde(default = "default_true")]
    pub color: bool,

    /// Module-specific log levels.
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "stderr".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: None,
            color: default_true(),
            modules: HashMap::new(),
        }
    }
}

/// Resolve the log file path with precedence: explicit override,
/// `CODECITY_LOG_FILE`, config file, platform default.
pub fn resolve_log_file_path(
    override_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
) -> Result<PathBuf, TreeError> {
    if let Some(p) = override_file {
        if !p.as_os_str().is_empty() {
            return Ok(p);
        }
    }
    if let Ok(env_path) = std::env::var("CODECITY_LOG_FILE") {
        if !env_path.is_empty() {
            return Ok(PathBuf::from(env_path));
        }
    }
    if let Some(p) = config_file {
        if !p.as_os_str().is_empty() {
            return Ok(p);
        }
    }
    default_log_file_path()
}

fn default_log_file_path() -> Result<PathBuf, TreeError> {
    let project_dirs = directories::ProjectDirs::from("", "codecity", "codecity").ok_or_else(|| {
        TreeError::ConfigError("Could not determine platform state directory for log file".to_string())
    })?;
    let state_dir = project_dirs
        .state_dir()
        .ok_or_else(|| {
            TreeError::ConfigError("Platform state directory not available for log file".to_string())
        })?
        .to_path_buf();
    Ok(state_dir.join("codecity.log"))
}

/// Destination flags; stdout is the fallback when neither is set.
struct OutputTargets {
    stderr: bool,
    file: bool,
}

/// Initialize the logging system.
///
/// Priority order (highest to lowest): environment variables
/// (`CODECITY_LOG`, `CODECITY_LOG_FORMAT`), configuration, defaults.
/// Calling this twice fails inside `tracing` since a global subscriber is
/// already set; initialize once per process.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), TreeError> {
    let disabled = config.map(|c| !c.enabled).unwrap_or(false);
    if disabled {
        Registry::default()
            .with(EnvFilter::new("off"))
            .with(fmt::layer().with_writer(|| std::io::sink()))
            .init();
        return Ok(());
    }

    let filter = build_env_filter(config)?;
    let format = determine_format(config)?;
    let output = determine_output(config)?;
    let use_color = config.map(|c| c.color).unwrap_or(true);

    let log_file_path = config
        .and_then(|c| c.file.clone())
        .or_else(|| resolve_log_file_path(None, None).ok());
    let open_file_writer = || -> Result<std::fs::File, TreeError> {
        let log_file = log_file_path.clone().ok_or_else(|| {
            TreeError::ConfigError("Log file path not set and default resolution failed".to_string())
        })?;
        if let Some(parent) = log_file.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                TreeError::ConfigError(format!("Failed to create log directory: {}", e))
            })?;
        }
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .map_err(|e| {
                TreeError::ConfigError(format!("Failed to open log file {:?}: {}", log_file, e))
            })
    };

    let base_subscriber = Registry::default().with(filter);

    if format == "json" {
        if output.file && output.stderr {
            let writer = open_file_writer()?.and(std::io::stderr);
            base_subscriber
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(ChronoUtc::rfc_3339())
                        .with_writer(writer),
                )
                .init();
        } else if output.file {
            base_subscriber
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(ChronoUtc::rfc_3339())
                        .with_writer(open_file_writer()?),
                )
                .init();
        } else if output.stderr {
            base_subscriber
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(ChronoUtc::rfc_3339())
                        .with_writer(std::io::stderr),
                )
                .init();
        } else {
            base_subscriber
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(ChronoUtc::rfc_3339())
                        .with_writer(std::io::stdout),
                )
                .init();
        }
    } else if output.file && output.stderr {
        let writer = open_file_writer()?.and(std::io::stderr);
        base_subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .with_writer(writer),
            )
            .init();
    } else if output.file {
        base_subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .with_writer(open_file_writer()?),
            )
            .init();
    } else if output.stderr {
        base_subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(use_color)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        base_subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(use_color)
                    .with_writer(std::io::stdout),
            )
            .init();
    }

    Ok(())
}

/// Build the environment filter from config or environment variables.
fn build_env_filter(config: Option<&LoggingConfig>) -> Result<EnvFilter, TreeError> {
    if let Ok(filter) = EnvFilter::try_from_env("CODECITY_LOG") {
        return Ok(filter);
    }

    let level = config.map(|c| c.level.as_str()).unwrap_or("info");
    if level == "off" {
        return Ok(EnvFilter::new("off"));
    }

    let mut filter = EnvFilter::new(level);
    if let Some(config) = config {
        for (module, module_level) in &config.modules {
            let directive = format!("{}={}", module, module_level);
            filter = filter.add_directive(
                directive
                    .parse()
                    .map_err(|e| TreeError::ConfigError(format!("Invalid log directive: {}", e)))?,
            );
        }
    }

    Ok(filter)
}

fn determine_format(config: Option<&LoggingConfig>) -> Result<String, TreeError> {
    if let Ok(format) = std::env::var("CODECITY_LOG_FORMAT") {
        if format == "json" || format == "text" {
            return Ok(format);
        }
    }

    let format = config.map(|c| c.format.as_str()).unwrap_or("text");
    if format != "json" && format != "text" {
        return Err(TreeError::ConfigError(format!(
            "Invalid log format: {} (must be 'json' or 'text')",
            format
        )));
    }
    Ok(format.to_string())
}

fn determine_output(config: Option<&LoggingConfig>) -> Result<OutputTargets, TreeError> {
    let output = config.map(|c| c.output.as_str()).unwrap_or("stderr");
    match output {
        "stdout" => Ok(OutputTargets {
            stderr: false,
            file: false,
        }),
        "stderr" => Ok(OutputTargets {
            stderr: true,
            file: false,
        }),
        "file" => Ok(OutputTargets {
            stderr: false,
            file: true,
        }),
        "file+stderr" => Ok(OutputTargets {
            stderr: true,
            file: true,
        }),
        other => Err(TreeError::ConfigError(format!(
            "Invalid log output: {} (must be 'stdout', 'stderr', 'file', or 'file+stderr')",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_enabled_text_stderr() {
        let config = LoggingConfig::default();
        assert!(config.enabled);
        assert_eq!(config.level, "info");
        assert_eq!(config.format, "text");
        assert_eq!(config.output, "stderr");
    }

    #[test]
    fn explicit_override_wins_over_config_file() {
        let resolved = resolve_log_file_path(
            Some(PathBuf::from("/tmp/override.log")),
            Some(PathBuf::from("/tmp/config.log")),
        )
        .unwrap();
        assert_eq!(resolved, PathBuf::from("/tmp/override.log"));
    }

    #[test]
    fn invalid_output_is_rejected() {
        let config = LoggingConfig {
            output: "syslog".to_string(),
            ..LoggingConfig::default()
        };
        assert!(matches!(
            determine_output(Some(&config)),
            Err(TreeError::ConfigError(_))
        ));
    }

    #[test]
    fn off_level_builds_filter() {
        let config = LoggingConfig {
            level: "off".to_string(),
            ..LoggingConfig::default()
        };
        assert!(build_env_filter(Some(&config)).is_ok());
    }
}
