//! Application settings loading from config.toml
//!
//! Settings cover the database location, the demo values a fresh wallet is
//! seeded with, ride pricing and the simulated dispatch delays. Every key is
//! optional; a missing config file yields the built-in demo configuration.

use crate::core::account::User;
use crate::core::dispatch::DispatchTimings;
use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_CONFIG_PATH: &str = "config.toml";
const DEFAULT_DATABASE_URL: &str = "sqlite://superapp.sqlite?mode=rwc";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// `SeaORM` connection string
    pub database_url: String,
    /// Opening values of a fresh wallet
    pub wallet: WalletSeed,
    /// Ride pricing and dispatch simulation
    pub ride: RideSettings,
    /// Profile signed in on a fresh session
    pub user: Option<User>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            wallet: WalletSeed::default(),
            ride: RideSettings::default(),
            user: None,
        }
    }
}

/// Opening values of a fresh wallet and agent account
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WalletSeed {
    /// Spendable balance
    pub balance: Decimal,
    /// Savings balance
    pub savings: Decimal,
    /// Outstanding loan
    pub loan_due: Decimal,
    /// Reward points
    pub points: u64,
    /// Agent float
    pub agent_balance: Decimal,
    /// Agent commission already earned
    pub agent_commission: Decimal,
}

impl Default for WalletSeed {
    fn default() -> Self {
        Self {
            balance: Decimal::from(2500),
            savings: Decimal::from(500),
            loan_due: Decimal::ZERO,
            points: 120,
            agent_balance: Decimal::from(10_000),
            agent_commission: Decimal::ZERO,
        }
    }
}

/// Ride pricing and simulated dispatch delays
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RideSettings {
    /// Fare of a standard car before multipliers
    pub base_fare: Decimal,
    /// Whether surge pricing is switched on
    pub surge_active: bool,
    /// Milliseconds between driver matching attempts
    pub search_delay_ms: u64,
    /// Milliseconds between driver match and trip start
    pub arrival_delay_ms: u64,
    /// Matching attempts before a request is dropped
    pub max_search_attempts: u32,
}

impl Default for RideSettings {
    fn default() -> Self {
        Self {
            base_fare: Decimal::from(120),
            surge_active: false,
            search_delay_ms: 3000,
            arrival_delay_ms: 5000,
            max_search_attempts: 5,
        }
    }
}

impl RideSettings {
    /// Dispatch delays as durations.
    #[must_use]
    pub const fn timings(&self) -> DispatchTimings {
        DispatchTimings {
            search_delay: Duration::from_millis(self.search_delay_ms),
            arrival_delay: Duration::from_millis(self.arrival_delay_ms),
            max_search_attempts: self.max_search_attempts,
        }
    }
}

impl AppConfig {
    /// Checks that amounts are usable.
    ///
    /// # Errors
    /// Returns `Error::Config` if a seed amount is negative, the base fare
    /// is not positive, or no matching attempt is allowed.
    pub fn validate(&self) -> Result<()> {
        let seeds = [
            ("wallet.balance", self.wallet.balance),
            ("wallet.savings", self.wallet.savings),
            ("wallet.loan_due", self.wallet.loan_due),
            ("wallet.agent_balance", self.wallet.agent_balance),
            ("wallet.agent_commission", self.wallet.agent_commission),
        ];
        for (name, value) in seeds {
            if value < Decimal::ZERO {
                return Err(Error::Config {
                    message: format!("{name} must be a non-negative number, got {value}"),
                });
            }
        }
        if self.ride.base_fare <= Decimal::ZERO {
            return Err(Error::Config {
                message: format!("ride.base_fare must be positive, got {}", self.ride.base_fare),
            });
        }
        if self.ride.max_search_attempts == 0 {
            return Err(Error::Config {
                message: "ride.max_search_attempts must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A value fails validation
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    parse_config(&contents)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    config.validate()?;
    Ok(config)
}

/// Loads the application configuration the way the binary does.
///
/// The file path comes from `SUPERAPP_CONFIG` (default `./config.toml`). A
/// missing file falls back to defaults. `DATABASE_URL` overrides the database
/// location from the file.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = std::env::var("SUPERAPP_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut config = if Path::new(&path).exists() {
        let config = load_config(&path)?;
        info!("Loaded configuration from {}", path);
        config
    } else {
        info!("No configuration file at {}, using defaults", path);
        AppConfig::default()
    };

    if let Ok(url) = std::env::var("DATABASE_URL") {
        debug!("DATABASE_URL overrides configured database location");
        config.database_url = url;
    }
    Ok(config)
}
