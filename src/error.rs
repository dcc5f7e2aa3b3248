//! Error types for allocation, persistence and configuration.
//!
//! Insufficient liquidity is reported through [`AllocationError`] inside a
//! normal [`AllocationResult`](crate::types::AllocationResult); it is never
//! raised as a failure of the call itself.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::{ExchangeId, OrderId, Side};

/// Why an allocation did not (fully) succeed
///
/// `side` is the requester's side: `Buy` when crypto is being purchased.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AllocationError {
    #[error("{asset} amount to {side} must be greater than 0")]
    InvalidAmount {
        side: Side,
        asset: String,
        amount: Decimal,
    },

    #[error("Only {filled} {asset} could be {}. Remaining {}: {remaining}", .side.fill_verb(), .side.shortfall_label())]
    InsufficientLiquidity {
        side: Side,
        asset: String,
        filled: Decimal,
        remaining: Decimal,
    },

    #[error("order snapshot unavailable: {0}")]
    Snapshot(#[source] RepositoryError),

    #[error("failed to persist allocation: {0}")]
    Persistence(#[source] RepositoryError),
}

/// Failures of the persistence collaborator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RepositoryError {
    #[error("exchange not found: {0}")]
    UnknownExchange(ExchangeId),

    #[error("order not found: {0}")]
    UnknownOrder(OrderId),

    #[error("order already exists: {0}")]
    DuplicateOrder(OrderId),

    #[error("balance conflict on exchange {exchange_id}: available {available}, required {required}")]
    BalanceConflict {
        exchange_id: ExchangeId,
        available: Decimal,
        required: Decimal,
    },

    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Configuration loading and validation failures
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl Side {
    fn fill_verb(&self) -> &'static str {
        match self {
            Side::Buy => "purchased",
            Side::Sell => "sold",
        }
    }

    fn shortfall_label(&self) -> &'static str {
        match self {
            Side::Buy => "needed",
            Side::Sell => "unsold",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_invalid_amount_message() {
        let err = AllocationError::InvalidAmount {
            side: Side::Buy,
            asset: "BTC".to_string(),
            amount: dec!(-1),
        };
        assert_eq!(err.to_string(), "BTC amount to buy must be greater than 0");
    }

    #[test]
    fn test_shortfall_messages() {
        let buy = AllocationError::InsufficientLiquidity {
            side: Side::Buy,
            asset: "BTC".to_string(),
            filled: dec!(3),
            remaining: dec!(2),
        };
        assert_eq!(buy.to_string(), "Only 3 BTC could be purchased. Remaining needed: 2");

        let sell = AllocationError::InsufficientLiquidity {
            side: Side::Sell,
            asset: "BTC".to_string(),
            filled: dec!(1.5),
            remaining: dec!(0.5),
        };
        assert_eq!(sell.to_string(), "Only 1.5 BTC could be sold. Remaining unsold: 0.5");
    }

    #[test]
    fn test_persistence_wraps_repository_error() {
        let err = AllocationError::Persistence(RepositoryError::Unavailable("db down".into()));
        assert_eq!(err.to_string(), "failed to persist allocation: repository unavailable: db down");
    }

    #[test]
    fn test_config_error_message() {
        let err = ConfigError::InvalidValue {
            field: "amount_scale",
            reason: "must be at most 28".to_string(),
        };
        assert_eq!(err.to_string(), "invalid value for amount_scale: must be at most 28");
    }
}
