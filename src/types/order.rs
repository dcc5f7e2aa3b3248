//! Standing order types.
//!
//! A standing order is a limit order already resting in an exchange's book.
//! Allocation only ever consumes standing orders; it never creates them.
//!
//! ## Sides
//!
//! The side is the standing order's own side:
//! - `Sell` orders are asks, consumed when a requester buys
//! - `Buy` orders are bids, consumed when a requester sells

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::OrderId;

// ============================================================================
// Side enum
// ============================================================================

/// Order side: Buy or Sell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy order (bid) - wants to purchase the asset
    #[default]
    Buy,
    /// Sell order (ask) - wants to sell the asset
    Sell,
}

impl Side {
    /// Stable byte tag used when hashing
    pub fn to_u8(self) -> u8 {
        match self {
            Side::Buy => 0,
            Side::Sell => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => f.write_str("buy"),
            Side::Sell => f.write_str("sell"),
        }
    }
}

impl FromStr for Side {
    type Err = ParseOrderFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" | "bid" => Ok(Side::Buy),
            "sell" | "ask" => Ok(Side::Sell),
            _ => Err(ParseOrderFieldError::Side(s.to_string())),
        }
    }
}

// ============================================================================
// OrderKind enum
// ============================================================================

/// Order kind
///
/// Only limit orders rest in a book, so only limit orders can be standing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    /// Limit order - executes at its stated price
    #[default]
    Limit,
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderKind::Limit => f.write_str("limit"),
        }
    }
}

impl FromStr for OrderKind {
    type Err = ParseOrderFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "limit" => Ok(OrderKind::Limit),
            _ => Err(ParseOrderFieldError::Kind(s.to_string())),
        }
    }
}

/// Failure to parse a textual order side or kind
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseOrderFieldError {
    #[error("unknown order side: {0}")]
    Side(String),

    #[error("unknown order kind: {0}")]
    Kind(String),
}

// ============================================================================
// StandingOrder struct
// ============================================================================

/// A limit order resting on one exchange.
///
/// `amount` is the remaining crypto amount still available on the order.
/// It shrinks as the order is consumed and the order is removed from its
/// exchange once it reaches zero.
///
/// ## Example
///
/// ```
/// use order_allocator::types::{OrderKind, Side, StandingOrder};
/// use rust_decimal::Decimal;
///
/// let ask = StandingOrder::limit(Side::Sell, Decimal::new(15, 1), Decimal::from(50_000));
/// assert_eq!(ask.kind, OrderKind::Limit);
/// assert!(!ask.is_depleted());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingOrder {
    /// Unique order identifier
    pub id: OrderId,

    /// When the order was posted
    pub placed_at: DateTime<Utc>,

    pub side: Side,

    pub kind: OrderKind,

    /// Remaining crypto amount
    pub amount: Decimal,

    /// Limit price in fiat per crypto unit
    pub price: Decimal,
}

impl StandingOrder {
    pub fn new(
        id: OrderId,
        placed_at: DateTime<Utc>,
        side: Side,
        kind: OrderKind,
        amount: Decimal,
        price: Decimal,
    ) -> Self {
        Self {
            id,
            placed_at,
            side,
            kind,
            amount,
            price,
        }
    }

    /// Create a limit order with a fresh id, posted now
    pub fn limit(side: Side, amount: Decimal, price: Decimal) -> Self {
        Self::new(OrderId::new(), Utc::now(), side, OrderKind::Limit, amount, price)
    }

    /// Check if nothing is left on the order
    pub fn is_depleted(&self) -> bool {
        self.amount <= Decimal::ZERO
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
