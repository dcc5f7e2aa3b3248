//! Working orders: standing orders paired with their exchange's liquidity.
//!
//! The repository hands out working orders already sorted by price priority.
//! They are read-only input to the allocator; all mutation during a run
//! happens on the allocator's own index-addressed state.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{ExchangeId, StandingOrder};

/// Read access the allocation loop needs from a working order
pub trait WorkingOrder {
    fn order(&self) -> &StandingOrder;

    fn exchange_id(&self) -> ExchangeId;

    fn exchange_name(&self) -> &str;

    /// Crypto amount still available on the order
    fn remaining(&self) -> Decimal;

    /// Exchange balance that bounds fills: crypto for asks, fiat for bids
    fn liquidity(&self) -> Decimal;
}

/// An ask (standing sell order) as seen by a buyer.
///
/// `exchange_crypto` is the crypto the exchange holds and can deliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingBuyOrder {
    pub order: StandingOrder,
    pub exchange_id: ExchangeId,
    pub exchange_name: String,
    pub remaining: Decimal,
    pub exchange_crypto: Decimal,
}

impl WorkingBuyOrder {
    /// Pair an ask with its exchange; remaining starts at the order amount
    pub fn new(
        order: StandingOrder,
        exchange_id: ExchangeId,
        exchange_name: impl Into<String>,
        exchange_crypto: Decimal,
    ) -> Self {
        Self {
            remaining: order.amount,
            order,
            exchange_id,
            exchange_name: exchange_name.into(),
            exchange_crypto,
        }
    }
}

impl WorkingOrder for WorkingBuyOrder {
    fn order(&self) -> &StandingOrder {
        &self.order
    }

    fn exchange_id(&self) -> ExchangeId {
        self.exchange_id
    }

    fn exchange_name(&self) -> &str {
        &self.exchange_name
    }

    fn remaining(&self) -> Decimal {
        self.remaining
    }

    fn liquidity(&self) -> Decimal {
        self.exchange_crypto
    }
}

/// A bid (standing buy order) as seen by a seller.
///
/// `exchange_funds` is the fiat the exchange holds and can pay out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingSellOrder {
    pub order: StandingOrder,
    pub exchange_id: ExchangeId,
    pub exchange_name: String,
    pub remaining: Decimal,
    pub exchange_funds: Decimal,
}

impl WorkingSellOrder {
    /// Pair a bid with its exchange; remaining starts at the order amount
    pub fn new(
        order: StandingOrder,
        exchange_id: ExchangeId,
        exchange_name: impl Into<String>,
        exchange_funds: Decimal,
    ) -> Self {
        Self {
            remaining: order.amount,
            order,
            exchange_id,
            exchange_name: exchange_name.into(),
            exchange_funds,
        }
    }
}

impl WorkingOrder for WorkingSellOrder {
    fn order(&self) -> &StandingOrder {
        &self.order
    }

    fn exchange_id(&self) -> ExchangeId {
        self.exchange_id
    }

    fn exchange_name(&self) -> &str {
        &self.exchange_name
    }

    fn remaining(&self) -> Decimal {
        self.remaining
    }

    fn liquidity(&self) -> Decimal {
        self.exchange_funds
    }
}
