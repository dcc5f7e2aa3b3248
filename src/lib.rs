//! # Order Allocator
//!
//! Splits a crypto buy or sell request across the standing orders of many
//! exchanges, best price first.
//!
//! ## Architecture
//!
//! The allocator consists of:
//! - **Types**: Core data structures (StandingOrder, Execution, AllocationResult)
//! - **Engine**: Deterministic greedy allocation loop for both sides
//! - **Repository**: Persistence contract plus an in-memory store
//! - **Service**: Outward `buy`/`sell` with a single-writer gate
//!
//! ## Design Principles
//!
//! 1. **Determinism**: The same snapshot and target always produce the same fills
//! 2. **No Floating Point**: All money and amounts are exact decimals
//! 3. **Shared Liquidity**: An exchange's balance bounds all of its orders together
//! 4. **Synchronous Core**: No async inside the allocation loop
//!
//! ## Example
//!
//! ```
//! use order_allocator::{AllocationConfig, InMemoryExchangeStore, OrderAllocator};
//! use order_allocator::types::{Side, StandingOrder};
//! use rust_decimal_macros::dec;
//!
//! # tokio_test_block(async {
//! let store = InMemoryExchangeStore::new();
//! let kraken = store.add_exchange("Kraken", dec!(5.0), dec!(0));
//! store.post_order(kraken, StandingOrder::limit(Side::Sell, dec!(2.0), dec!(50000))).unwrap();
//!
//! let allocator = OrderAllocator::new(store, AllocationConfig::default());
//! let result = allocator.buy(dec!(1.5)).await;
//!
//! assert!(result.successful);
//! assert_eq!(result.total_value, dec!(75000));
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f);
//! # }
//! ```

// ============================================================================
// Module declarations
// ============================================================================

/// Core data types: StandingOrder, Execution, AllocationResult
pub mod types;

/// Allocation engine: shared greedy loop, buy and sell strategies
pub mod engine;

/// Persistence contract and in-memory store
pub mod repository;

/// Outward buy/sell operations
pub mod service;

/// Settings loaded from TOML
pub mod config;

/// Error types
pub mod error;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use types::{AllocationResult, ExchangeId, Execution, OrderId, OrderKind, Side, StandingOrder};
pub use engine::{allocate_buy, allocate_sell, Allocation, FundsDelta, OrderDelta};
pub use repository::{ExchangeRepository, InMemoryExchangeStore};
pub use service::OrderAllocator;
pub use config::{AllocationConfig, Settings};
pub use error::{AllocationError, ConfigError, RepositoryError};
