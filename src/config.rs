//! Configuration loading and validation.
//!
//! Settings are read from a TOML file:
//!
//! ```toml
//! [logging]
//! level = "info"
//! format = "pretty"
//!
//! [allocation]
//! asset = "BTC"
//! fiat = "EUR"
//! amount_scale = 8
//!
//! [[exchanges]]
//! name = "Kraken"
//! crypto = "5.0"
//! fiat = "150000"
//!
//! [[exchanges.orders]]
//! side = "sell"
//! amount = "2.0"
//! price = "50000"
//! ```
//!
//! Every section is optional. Decimal values may be written as strings to
//! keep them exact.
//!
//! # Example
//!
//! ```
//! use order_allocator::config::Settings;
//!
//! let settings = Settings::parse_toml("[allocation]\nasset = \"ETH\"").unwrap();
//! assert_eq!(settings.allocation.asset, "ETH");
//! assert_eq!(settings.allocation.amount_scale, 8);
//! ```

use std::path::Path;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::ConfigError;
use crate::types::amount::{AMOUNT_SCALE, MAX_SCALE};
use crate::types::{OrderId, OrderKind, Side, StandingOrder};

// ============================================================================
// Logging
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl LoggingConfig {
    /// Initialize the tracing subscriber with this logging configuration.
    ///
    /// `RUST_LOG` takes precedence over the configured level.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        match self.format.as_str() {
            "json" => {
                fmt().json().with_env_filter(filter).init();
            }
            _ => {
                fmt().with_env_filter(filter).init();
            }
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

// ============================================================================
// Allocation
// ============================================================================

/// Parameters of the allocation loop
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AllocationConfig {
    /// Symbol of the traded crypto asset, used in result messages
    pub asset: String,

    /// Symbol of the fiat currency
    pub fiat: String,

    /// Decimal places crypto amounts are floored to when derived from funds
    pub amount_scale: u32,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            asset: "BTC".into(),
            fiat: "EUR".into(),
            amount_scale: AMOUNT_SCALE,
        }
    }
}

// ============================================================================
// Exchange seed
// ============================================================================

/// An exchange to preload into an in-memory store
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeSeed {
    pub name: String,

    /// Crypto held by the exchange
    pub crypto: Decimal,

    /// Fiat held by the exchange
    pub fiat: Decimal,

    #[serde(default)]
    pub orders: Vec<OrderSeed>,
}

/// A standing order to preload on a seeded exchange
#[derive(Debug, Clone, Deserialize)]
pub struct OrderSeed {
    pub side: Side,

    #[serde(default)]
    pub kind: OrderKind,

    pub amount: Decimal,
    pub price: Decimal,

    /// Posting time (RFC 3339); defaults to load time
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
}

impl OrderSeed {
    pub fn to_standing_order(&self) -> StandingOrder {
        StandingOrder::new(
            OrderId::new(),
            self.time.unwrap_or_else(Utc::now),
            self.side,
            self.kind,
            self.amount,
            self.price,
        )
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Top-level configuration.
///
/// Load from a file with [`Settings::load`] or parse directly with
/// [`Settings::parse_toml`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub allocation: AllocationConfig,

    /// Demo seed for the in-memory store
    #[serde(default)]
    pub exchanges: Vec<ExchangeSeed>,
}

impl Settings {
    /// Parse and validate configuration from TOML text.
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.allocation.asset.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "asset",
                reason: "must not be empty".to_string(),
            });
        }
        if self.allocation.amount_scale > MAX_SCALE {
            return Err(ConfigError::InvalidValue {
                field: "amount_scale",
                reason: format!("must be at most {MAX_SCALE}"),
            });
        }

        for exchange in &self.exchanges {
            if exchange.crypto < Decimal::ZERO || exchange.fiat < Decimal::ZERO {
                return Err(ConfigError::InvalidValue {
                    field: "exchanges",
                    reason: format!("balances of {} must not be negative", exchange.name),
                });
            }

            for order in &exchange.orders {
                if order.price <= Decimal::ZERO {
                    return Err(ConfigError::InvalidValue {
                        field: "exchanges.orders.price",
                        reason: format!("order on {} must have a positive price", exchange.name),
                    });
                }
                if order.amount <= Decimal::ZERO {
                    return Err(ConfigError::InvalidValue {
                        field: "exchanges.orders.amount",
                        reason: format!("order on {} must have a positive amount", exchange.name),
                    });
                }
            }
        }

        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
