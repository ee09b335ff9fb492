//! Application configuration management.

use chrono::NaiveDate;
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::AppError;
use crate::types::CurrencyCode;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Ledger and posting configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Exchange rate configuration.
    #[serde(default)]
    pub rates: RatesConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Period granularity used to derive sequence keys from a document date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SequenceGranularity {
    /// One counter per calendar day (`YYYYMMDD`).
    #[default]
    Day,
    /// One counter per calendar month (`YYYYMM`).
    Month,
    /// One counter per calendar year (`YYYY`).
    Year,
}

/// Ledger configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Base (reporting and pivot) currency code.
    #[serde(default = "default_base_currency")]
    pub base_currency: String,
    /// IANA time zone every calendar day is keyed in.
    #[serde(default = "default_reference_timezone")]
    pub reference_timezone: String,
    /// Absolute tolerance for journal balance checks, in base units.
    #[serde(default = "default_balance_tolerance")]
    pub balance_tolerance: Decimal,
    /// Document type code used for journal entry numbers.
    #[serde(default = "default_journal_code")]
    pub journal_code: String,
    /// Period granularity for document sequences.
    #[serde(default)]
    pub sequence_granularity: SequenceGranularity,
    /// Initial global posting lock date, if any.
    #[serde(default)]
    pub lock_date: Option<NaiveDate>,
}

fn default_base_currency() -> String {
    "USD".to_string()
}

fn default_reference_timezone() -> String {
    "UTC".to_string()
}

fn default_balance_tolerance() -> Decimal {
    Decimal::new(5, 3)
}

fn default_journal_code() -> String {
    "JV".to_string()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            base_currency: default_base_currency(),
            reference_timezone: default_reference_timezone(),
            balance_tolerance: default_balance_tolerance(),
            journal_code: default_journal_code(),
            sequence_granularity: SequenceGranularity::default(),
            lock_date: None,
        }
    }
}

impl LedgerConfig {
    /// Parses the configured base currency.
    pub fn base_currency(&self) -> Result<CurrencyCode, AppError> {
        CurrencyCode::new(&self.base_currency).map_err(|e| AppError::Config(e.to_string()))
    }

    /// Parses the configured reference time zone.
    pub fn reference_timezone(&self) -> Result<Tz, AppError> {
        self.reference_timezone.parse::<Tz>().map_err(|_| {
            AppError::Config(format!(
                "Unknown time zone '{}'",
                self.reference_timezone
            ))
        })
    }

    /// Validates the tolerance is a usable absolute amount.
    pub fn balance_tolerance(&self) -> Result<Decimal, AppError> {
        if self.balance_tolerance.is_sign_negative() {
            return Err(AppError::Config(format!(
                "Balance tolerance must not be negative, got {}",
                self.balance_tolerance
            )));
        }
        Ok(self.balance_tolerance)
    }
}

/// Exchange rate configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RatesConfig {
    /// Maximum number of resolved rates kept in memory.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
}

fn default_cache_capacity() -> u64 {
    10_000
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_log_filter() -> String {
    "stockledger=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("STOCKLEDGER").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.ledger.base_currency().unwrap().as_str(), "USD");
        assert_eq!(config.ledger.reference_timezone().unwrap(), Tz::UTC);
        assert_eq!(config.ledger.balance_tolerance().unwrap(), dec!(0.005));
        assert_eq!(config.ledger.journal_code, "JV");
        assert_eq!(config.ledger.sequence_granularity, SequenceGranularity::Day);
        assert_eq!(config.rates.cache_capacity, 10_000);
        assert!(!config.logging.json);
    }

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("STOCKLEDGER__LEDGER__BASE_CURRENCY", Some("TRY")),
                ("STOCKLEDGER__LEDGER__REFERENCE_TIMEZONE", Some("Europe/Istanbul")),
                ("STOCKLEDGER__LEDGER__SEQUENCE_GRANULARITY", Some("month")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.ledger.base_currency().unwrap().as_str(), "TRY");
                assert_eq!(
                    config.ledger.reference_timezone().unwrap(),
                    chrono_tz::Europe::Istanbul
                );
                assert_eq!(
                    config.ledger.sequence_granularity,
                    SequenceGranularity::Month
                );
            },
        );
    }

    #[test]
    fn test_invalid_timezone_is_config_error() {
        let config = LedgerConfig {
            reference_timezone: "Mars/Olympus".to_string(),
            ..LedgerConfig::default()
        };
        assert!(matches!(
            config.reference_timezone(),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let config = LedgerConfig {
            balance_tolerance: dec!(-0.01),
            ..LedgerConfig::default()
        };
        assert!(config.balance_tolerance().is_err());
    }
}
