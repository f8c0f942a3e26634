use crate::config::TelemetryConfig;
use std::fmt;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// Where the active log filter came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterOrigin {
    RustLog,
    Config,
}

impl FilterOrigin {
    fn variable(self) -> &'static str {
        match self {
            FilterOrigin::RustLog => "RUST_LOG",
            FilterOrigin::Config => "APP_LOG_LEVEL",
        }
    }
}

#[derive(Debug)]
pub enum TelemetryError {
    InvalidFilter {
        variable: &'static str,
        directive: String,
        source: ParseError,
    },
    AlreadyInstalled(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::InvalidFilter {
                variable,
                directive,
                source,
            } => write!(f, "{variable}='{directive}' is not a valid log filter: {source}"),
            TelemetryError::AlreadyInstalled(err) => {
                write!(f, "a global tracing subscriber is already installed: {err}")
            }
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::InvalidFilter { source, .. } => Some(source),
            TelemetryError::AlreadyInstalled(err) => Some(&**err),
        }
    }
}

/// `RUST_LOG` wins when set; otherwise the configured level applies. A malformed
/// `RUST_LOG` is an error rather than a silent fallback.
fn build_filter(
    rust_log: Option<String>,
    config: &TelemetryConfig,
) -> Result<EnvFilter, TelemetryError> {
    let (origin, directive) = match rust_log {
        Some(value) if !value.trim().is_empty() => (FilterOrigin::RustLog, value),
        _ => (FilterOrigin::Config, config.log_level.clone()),
    };

    EnvFilter::try_new(&directive).map_err(|source| TelemetryError::InvalidFilter {
        variable: origin.variable(),
        directive,
        source,
    })
}

/// Installs the global subscriber. Events go to stderr so stdout carries only the
/// report.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = build_filter(std::env::var("RUST_LOG").ok(), config)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::AlreadyInstalled)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(level: &str) -> TelemetryConfig {
        TelemetryConfig {
            log_level: level.to_string(),
        }
    }

    #[test]
    fn configured_level_is_used_without_rust_log() {
        assert!(build_filter(None, &config("teacher_sweep=debug,info")).is_ok());
        assert!(build_filter(Some("  ".to_string()), &config("warn")).is_ok());
    }

    #[test]
    fn invalid_configured_level_names_its_variable() {
        match build_filter(None, &config("sweep=loud")) {
            Err(err @ TelemetryError::InvalidFilter { .. }) => {
                assert!(err.to_string().starts_with("APP_LOG_LEVEL='sweep=loud'"));
            }
            other => panic!("expected filter error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_rust_log_is_reported_instead_of_ignored() {
        match build_filter(Some("sweep=loud".to_string()), &config("info")) {
            Err(TelemetryError::InvalidFilter {
                variable,
                directive,
                ..
            }) => {
                assert_eq!(variable, "RUST_LOG");
                assert_eq!(directive, "sweep=loud");
            }
            other => panic!("expected filter error, got {other:?}"),
        }
    }
}
