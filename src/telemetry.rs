use nexus_engine::{AppEnvironment, TelemetryConfig};
use std::fmt;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
pub enum TelemetryError {
    EnvFilter { value: String, source: ParseError },
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::EnvFilter { value, .. } => {
                write!(f, "log filter '{value}' is not a valid tracing directive")
            }
            TelemetryError::Subscriber(err) => {
                write!(f, "unable to install the tracing subscriber: {err}")
            }
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::EnvFilter { source, .. } => Some(source),
            TelemetryError::Subscriber(err) => Some(&**err),
        }
    }
}

/// Installs the global subscriber on stderr, keeping stdout free for reports.
/// `RUST_LOG` wins over the configured level.
pub fn init(config: &TelemetryConfig, environment: AppEnvironment) -> Result<(), TelemetryError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let directive = filter_directive(&config.log_level, environment);
            EnvFilter::try_new(&directive).map_err(|source| TelemetryError::EnvFilter {
                value: directive.clone(),
                source,
            })?
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(environment == AppEnvironment::Development)
        .compact()
        .with_ansi(environment == AppEnvironment::Development)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

/// A bare level is widened per environment: development also traces threshold
/// crossings in the engine, tests only surface warnings. Explicit directives are
/// used as given.
fn filter_directive(log_level: &str, environment: AppEnvironment) -> String {
    let level = log_level.trim();
    if level.contains('=') || level.contains(',') {
        return level.to_string();
    }
    match environment {
        AppEnvironment::Development => format!("{level},nexus_engine=debug"),
        AppEnvironment::Test => "warn".to_string(),
        AppEnvironment::Production => level.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_levels_are_widened_per_environment() {
        assert_eq!(
            filter_directive("info", AppEnvironment::Development),
            "info,nexus_engine=debug"
        );
        assert_eq!(filter_directive(" info ", AppEnvironment::Production), "info");
        assert_eq!(filter_directive("debug", AppEnvironment::Test), "warn");
    }

    #[test]
    fn explicit_directives_are_kept() {
        assert_eq!(
            filter_directive("warn,nexus_engine=trace", AppEnvironment::Development),
            "warn,nexus_engine=trace"
        );
    }
}
