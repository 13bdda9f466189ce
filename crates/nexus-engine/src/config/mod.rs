use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the batch runner.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub engine: EngineConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );
        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let mut engine = EngineConfig::default();
        if let Some(value) = decimal_var("NEXUS_CLOSE_TO_THRESHOLD_PCT")? {
            engine.close_to_threshold_pct = value;
        }
        if let Some(value) = decimal_var("NEXUS_DEFAULT_EXEMPTION_RATE")? {
            engine.default_exemption_rate = value;
        }
        if let Some(value) = decimal_var("NEXUS_PENALTY_RATE")? {
            engine.penalty_rate = value;
        }
        if let Some(value) = decimal_var("NEXUS_MONTHLY_INTEREST_RATE")? {
            engine.monthly_interest_rate = value;
        }
        if let Some(value) = decimal_var("NEXUS_HIGH_RISK_THRESHOLD")? {
            engine.high_risk_threshold = value;
        }
        engine.validate()?;

        Ok(Self {
            environment,
            engine,
            telemetry: TelemetryConfig { log_level },
        })
    }
}

fn decimal_var(key: &'static str) -> Result<Option<Decimal>, ConfigError> {
    match env::var(key) {
        Ok(raw) => Decimal::from_str(raw.trim())
            .map(Some)
            .map_err(|_| ConfigError::InvalidDecimal { key, value: raw }),
        Err(_) => Ok(None),
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Policy dials for nexus and liability math.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Percentage of a threshold at which a jurisdiction is flagged as approaching.
    pub close_to_threshold_pct: Decimal,
    /// Share of otherwise taxable sales assumed exempt without an explicit flag.
    pub default_exemption_rate: Decimal,
    pub penalty_rate: Decimal,
    pub monthly_interest_rate: Decimal,
    pub high_risk_threshold: Decimal,
    pub medium_risk_threshold: Decimal,
    pub overdue_months_high_risk: u32,
    /// Evaluation date for deadline, penalty and interest math. The default reads the
    /// local clock, so reproducible runs must set it through [`EngineConfig::as_of`].
    pub as_of: NaiveDate,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            close_to_threshold_pct: dec!(80),
            default_exemption_rate: dec!(0.10),
            penalty_rate: dec!(0.10),
            monthly_interest_rate: dec!(0.01),
            high_risk_threshold: dec!(10000),
            medium_risk_threshold: dec!(1000),
            overdue_months_high_risk: 6,
            as_of: Local::now().date_naive(),
        }
    }
}

impl EngineConfig {
    pub fn as_of(mut self, today: NaiveDate) -> Self {
        self.as_of = today;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fraction = |name: &'static str, value: Decimal| {
            if value < Decimal::ZERO || value > Decimal::ONE {
                Err(ConfigError::OutOfRange { name, value })
            } else {
                Ok(())
            }
        };

        fraction("default_exemption_rate", self.default_exemption_rate)?;
        fraction("penalty_rate", self.penalty_rate)?;
        fraction("monthly_interest_rate", self.monthly_interest_rate)?;

        if self.close_to_threshold_pct <= Decimal::ZERO || self.close_to_threshold_pct > dec!(100) {
            return Err(ConfigError::OutOfRange {
                name: "close_to_threshold_pct",
                value: self.close_to_threshold_pct,
            });
        }
        if self.medium_risk_threshold > self.high_risk_threshold {
            return Err(ConfigError::OutOfRange {
                name: "medium_risk_threshold",
                value: self.medium_risk_threshold,
            });
        }

        Ok(())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidDecimal { key: &'static str, value: String },
    OutOfRange { name: &'static str, value: Decimal },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidDecimal { key, value } => {
                write!(f, "{key} must be a decimal number, got '{value}'")
            }
            ConfigError::OutOfRange { name, value } => {
                write!(f, "{name} is out of range: {value}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.close_to_threshold_pct, dec!(80));
        assert_eq!(config.default_exemption_rate, dec!(0.10));
    }

    #[test]
    fn pinned_evaluation_date_is_independent_of_the_clock() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).expect("valid date");
        let first = EngineConfig::default().as_of(today);
        let second = EngineConfig::default().as_of(today);
        assert_eq!(first, second);
        assert_eq!(first.as_of, today);

        let decoded: EngineConfig =
            serde_json::from_str(r#"{"as_of": "2024-06-15"}"#).expect("config decodes");
        assert_eq!(decoded.as_of, today);
        assert_eq!(decoded.close_to_threshold_pct, dec!(80));
    }

    #[test]
    fn rates_above_one_are_rejected() {
        let config = EngineConfig {
            penalty_rate: dec!(1.5),
            ..EngineConfig::default()
        };
        match config.validate() {
            Err(ConfigError::OutOfRange { name, .. }) => assert_eq!(name, "penalty_rate"),
            other => panic!("expected out of range penalty rate, got {other:?}"),
        }
    }

    #[test]
    fn environment_names_are_normalized() {
        assert_eq!(AppEnvironment::from_str("PROD"), AppEnvironment::Production);
        assert_eq!(AppEnvironment::from_str(" ci "), AppEnvironment::Test);
        assert_eq!(AppEnvironment::from_str("staging"), AppEnvironment::Development);
    }
}
