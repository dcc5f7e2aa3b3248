//! Allocation engine for the order allocator.
//!
//! ## Design Principles
//!
//! The engine is designed for:
//!
//! 1. **Determinism**: Same snapshot and target always produce the same result
//! 2. **Exact Math**: Decimal arithmetic only, no floating point
//! 3. **Synchronous Execution**: No I/O and no async in the loop
//! 4. **Price Priority**: Best price first, ties in snapshot order
//!
//! ## Allocation Rules
//!
//! - **Buys** consume asks (lowest price first), bounded by exchange crypto
//! - **Sells** consume bids (highest price first), bounded by exchange funds
//! - **Partial fills** are supported on both orders and requests
//! - **Shortfalls** are reported in the result, never raised
//!
//! ## Example
//!
//! ```
//! use order_allocator::config::AllocationConfig;
//! use order_allocator::engine::{allocate_buy, WorkingBuyOrder};
//! use order_allocator::types::{ExchangeId, Side, StandingOrder};
//! use rust_decimal_macros::dec;
//!
//! let exchange = ExchangeId::new();
//! let ask = StandingOrder::limit(Side::Sell, dec!(2.0), dec!(50000));
//! let asks = vec![WorkingBuyOrder::new(ask, exchange, "Kraken", dec!(5.0))];
//!
//! let allocation = allocate_buy(dec!(1.5), &asks, &AllocationConfig::default());
//!
//! assert!(allocation.result.successful);
//! assert_eq!(allocation.result.total_value, dec!(75000));
//! assert_eq!(allocation.exchange_deltas[&exchange], dec!(1.5));
//! ```

pub mod allocator;
pub mod side;
pub mod working;

pub use allocator::{
    allocate_buy, allocate_sell, run_allocation, Allocation, BuyAllocation, OrderDelta,
    SellAllocation,
};
pub use side::{AllocationSide, BuySide, FundsDelta, SellSide};
pub use working::{WorkingBuyOrder, WorkingOrder, WorkingSellOrder};
