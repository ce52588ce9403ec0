//! Configuration module
//!
//! Loads server settings and the chart of accounts from environment
//! variables. Unset variables fall back to defaults; only `DATABASE_URL` is
//! required.

use std::env;
use std::str::FromStr;

use crate::domain::ChartOfAccounts;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    pub host: String,
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// System accounts used by the posting rules
    pub chart: ChartOfAccounts,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let lookup = |key: &str| env::var(key).ok();

        Ok(Self {
            database_url: lookup("DATABASE_URL").ok_or(ConfigError::MissingEnv("DATABASE_URL"))?,
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&lookup, "PORT", 3000)?,
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            chart: chart_from_lookup(&lookup)?,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue(key)),
        None => Ok(default),
    }
}

/// Build the chart from `LEDGER_*` overrides on top of the default chart.
///
/// Account ids end up in `account_id` columns and the branch cash prefix is
/// joined with branch ids, so none of them may contain whitespace.
fn chart_from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<ChartOfAccounts, ConfigError> {
    let mut chart = ChartOfAccounts::default();

    let slots: [(&'static str, &mut String); 7] = [
        ("LEDGER_FREIGHT_INCOME_ACCOUNT", &mut chart.freight_income),
        ("LEDGER_REBATE_EXPENSE_ACCOUNT", &mut chart.rebate_expense),
        ("LEDGER_DISCOUNT_EXPENSE_ACCOUNT", &mut chart.discount_expense),
        ("LEDGER_UNKNOWN_INCOME_ACCOUNT", &mut chart.unknown_income_source),
        ("LEDGER_UNKNOWN_EXPENSE_ACCOUNT", &mut chart.unknown_expense_target),
        ("LEDGER_ADJUSTMENT_ACCOUNT", &mut chart.adjustment),
        ("LEDGER_BRANCH_CASH_PREFIX", &mut chart.branch_cash_prefix),
    ];

    for (key, slot) in slots {
        let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) else {
            continue;
        };
        if value.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidValue(key));
        }
        *slot = value;
    }

    Ok(chart)
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
