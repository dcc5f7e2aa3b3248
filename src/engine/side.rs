//! Buy and sell strategies for the shared allocation loop.
//!
//! The two allocators differ only in what bounds a fill and what a fill
//! costs the exchange:
//!
//! | | Buy (consumes asks) | Sell (consumes bids) |
//! |---|---|---|
//! | Input order | ascending price | descending price |
//! | Liquidity | exchange crypto | exchange fiat funds |
//! | Bound per fill | crypto | funds / price, floored |
//! | Liquidity consumed | amount | amount * price |
//! | Exchange delta | crypto consumed | (crypto gained, fiat spent) |

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::engine::working::{WorkingBuyOrder, WorkingOrder, WorkingSellOrder};
use crate::types::amount::affordable_amount;
use crate::types::Side;

/// Per-exchange balance change produced by a sell allocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundsDelta {
    /// Crypto the exchange received from the seller
    pub crypto_gained: Decimal,

    /// Fiat the exchange paid out
    pub fiat_spent: Decimal,
}

/// Strategy parameterizing [`run_allocation`](crate::engine::run_allocation)
pub trait AllocationSide {
    /// Working order type delivered by the repository for this side
    type Working: WorkingOrder;

    /// Accumulated per-exchange delta
    type Delta: Copy + Default + PartialEq + fmt::Debug;

    /// The requester's side
    const SIDE: Side;

    /// Whether an order can be considered at all
    fn is_eligible(remaining: Decimal, liquidity: Decimal, _price: Decimal) -> bool {
        remaining > Decimal::ZERO && liquidity > Decimal::ZERO
    }

    /// Largest crypto amount the exchange liquidity allows at `price`
    fn liquidity_bound(liquidity: Decimal, price: Decimal, amount_scale: u32) -> Option<Decimal>;

    /// Liquidity used by a fill of `amount` worth `value`
    fn liquidity_consumed(amount: Decimal, value: Decimal) -> Decimal;

    /// Fold a fill into the exchange's delta
    fn accumulate(delta: &mut Self::Delta, amount: Decimal, value: Decimal);
}

/// Buying crypto: cheapest asks first, bounded by exchange crypto
#[derive(Debug, Clone, Copy)]
pub struct BuySide;

impl AllocationSide for BuySide {
    type Working = WorkingBuyOrder;
    type Delta = Decimal;

    const SIDE: Side = Side::Buy;

    fn liquidity_bound(liquidity: Decimal, _price: Decimal, _amount_scale: u32) -> Option<Decimal> {
        Some(liquidity)
    }

    fn liquidity_consumed(amount: Decimal, _value: Decimal) -> Decimal {
        amount
    }

    fn accumulate(delta: &mut Decimal, amount: Decimal, _value: Decimal) {
        *delta += amount;
    }
}

/// Selling crypto: highest bids first, bounded by exchange fiat funds
#[derive(Debug, Clone, Copy)]
pub struct SellSide;

impl AllocationSide for SellSide {
    type Working = WorkingSellOrder;
    type Delta = FundsDelta;

    const SIDE: Side = Side::Sell;

    // A bid without a positive price cannot convert funds into an amount
    fn is_eligible(remaining: Decimal, liquidity: Decimal, price: Decimal) -> bool {
        remaining > Decimal::ZERO && liquidity > Decimal::ZERO && price > Decimal::ZERO
    }

    fn liquidity_bound(liquidity: Decimal, price: Decimal, amount_scale: u32) -> Option<Decimal> {
        affordable_amount(liquidity, price, amount_scale)
    }

    fn liquidity_consumed(_amount: Decimal, value: Decimal) -> Decimal {
        value
    }

    fn accumulate(delta: &mut FundsDelta, amount: Decimal, value: Decimal) {
        delta.crypto_gained += amount;
        delta.fiat_spent += value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_buy_side_bound_is_crypto() {
        assert_eq!(BuySide::liquidity_bound(dec!(1.5), dec!(50000), 8), Some(dec!(1.5)));
        assert_eq!(BuySide::liquidity_consumed(dec!(1.5), dec!(75000)), dec!(1.5));
    }

    #[test]
    fn test_sell_side_bound_is_funds_over_price() {
        assert_eq!(SellSide::liquidity_bound(dec!(75000), dec!(50000), 8), Some(dec!(1.5)));
        assert_eq!(SellSide::liquidity_bound(dec!(100), dec!(3), 2), Some(dec!(33.33)));
        assert_eq!(SellSide::liquidity_consumed(dec!(1.5), dec!(75000)), dec!(75000));
    }

    #[test]
    fn test_eligibility() {
        assert!(BuySide::is_eligible(dec!(1), dec!(1), Decimal::ZERO));
        assert!(!BuySide::is_eligible(Decimal::ZERO, dec!(1), dec!(1)));
        assert!(!BuySide::is_eligible(dec!(1), Decimal::ZERO, dec!(1)));
        assert!(!SellSide::is_eligible(dec!(1), dec!(1), Decimal::ZERO));
        assert!(SellSide::is_eligible(dec!(1), dec!(1), dec!(1)));
    }

    #[test]
    fn test_accumulate() {
        let mut crypto = Decimal::ZERO;
        BuySide::accumulate(&mut crypto, dec!(1.5), dec!(75000));
        BuySide::accumulate(&mut crypto, dec!(0.5), dec!(25500));
        assert_eq!(crypto, dec!(2.0));

        let mut funds = FundsDelta::default();
        SellSide::accumulate(&mut funds, dec!(2.0), dec!(100000));
        assert_eq!(funds.crypto_gained, dec!(2.0));
        assert_eq!(funds.fiat_spent, dec!(100000));
    }
}
