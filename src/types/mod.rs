//! Core data types for order allocation
//!
//! All amounts, prices and balances are exact decimals.
//!
//! ## Types
//!
//! - [`StandingOrder`]: A limit order resting on one exchange
//! - [`Side`]: Buy or Sell
//! - [`OrderKind`]: Kind of order (Limit only)
//! - [`Execution`]: One fill against a standing order
//! - [`AllocationResult`]: Outcome of a buy or sell request
//! - [`ExchangeId`] / [`OrderId`]: UUID identifiers

mod ids;
mod order;
mod execution;
mod result;
pub mod amount;

// Re-export all types at module level
pub use ids::{ExchangeId, OrderId};
pub use order::{OrderKind, ParseOrderFieldError, Side, StandingOrder};
pub use execution::Execution;
pub use result::AllocationResult;
