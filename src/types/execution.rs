//! Execution record for one fill against a standing order.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{ExchangeId, OrderId, StandingOrder};

/// One atomic fill decided by the allocator.
///
/// An execution always happens at the standing order's own price. `value`
/// is the fiat moved: the cost paid for a buy, the proceeds received for
/// a sell.
///
/// ## Example
///
/// ```
/// use order_allocator::types::{Execution, ExchangeId, Side, StandingOrder};
/// use rust_decimal::Decimal;
///
/// let ask = StandingOrder::limit(Side::Sell, Decimal::from(2), Decimal::from(50_000));
/// let fill = Execution::new(&ask, ExchangeId::new(), "Kraken", Decimal::new(15, 1), Decimal::from(75_000));
/// assert_eq!(fill.price, Decimal::from(50_000));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Execution {
    /// Standing order that was consumed
    pub order_id: OrderId,

    /// When the consumed order was posted
    pub placed_at: DateTime<Utc>,

    pub exchange_id: ExchangeId,

    pub exchange_name: String,

    /// Execution price (the standing order's price)
    pub price: Decimal,

    /// Crypto amount transacted
    pub amount: Decimal,

    /// Fiat moved: cost for buys, proceeds for sells
    pub value: Decimal,
}

impl Execution {
    pub fn new(
        order: &StandingOrder,
        exchange_id: ExchangeId,
        exchange_name: impl Into<String>,
        amount: Decimal,
        value: Decimal,
    ) -> Self {
        Self {
            order_id: order.id,
            placed_at: order.placed_at,
            exchange_id,
            exchange_name: exchange_name.into(),
            price: order.price,
            amount,
            value,
        }
    }
}
