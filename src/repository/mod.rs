//! Persistence contract for exchanges and their standing orders.
//!
//! The allocator reads a price-sorted snapshot of working orders, decides
//! the fills in memory, then pushes the resulting balance and order changes
//! back through this trait.
//!
//! ## Snapshot Ordering
//!
//! - `fetch_sorted_asks`: standing sell orders, ascending price
//! - `fetch_sorted_bids`: standing buy orders, descending price
//!
//! Ties must come back in a stable order; the allocator keeps that order.
//!
//! ## Commits
//!
//! [`ExchangeRepository::commit_buy`] and [`ExchangeRepository::commit_sell`]
//! push balances first, then orders. The provided versions issue two
//! separate calls; a store with transactions should override them so a
//! failure in the second call cannot leave the first applied.

use std::collections::BTreeMap;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::engine::{FundsDelta, OrderDelta, WorkingBuyOrder, WorkingSellOrder};
use crate::error::RepositoryError;
use crate::types::ExchangeId;

pub mod memory;

pub use memory::{ExchangeSnapshot, InMemoryExchangeStore};

/// Storage of exchanges, balances and standing orders
#[async_trait]
pub trait ExchangeRepository: Send + Sync {
    /// Every standing sell order with its exchange's crypto, cheapest first
    async fn fetch_sorted_asks(&self) -> Result<Vec<WorkingBuyOrder>, RepositoryError>;

    /// Every standing buy order with its exchange's funds, highest first
    async fn fetch_sorted_bids(&self) -> Result<Vec<WorkingSellOrder>, RepositoryError>;

    /// Subtract the crypto each exchange delivered to a buyer
    async fn apply_crypto_deltas(
        &self,
        deltas: &BTreeMap<ExchangeId, Decimal>,
    ) -> Result<(), RepositoryError>;

    /// Add crypto gained and subtract fiat paid out after a sale
    async fn apply_funds_deltas(
        &self,
        deltas: &BTreeMap<ExchangeId, FundsDelta>,
    ) -> Result<(), RepositoryError>;

    /// Set each consumed order's remaining amount; depleted orders are removed
    async fn apply_order_deltas(&self, deltas: &[OrderDelta]) -> Result<(), RepositoryError>;

    /// Persist the outcome of a buy allocation
    async fn commit_buy(
        &self,
        crypto: &BTreeMap<ExchangeId, Decimal>,
        orders: &[OrderDelta],
    ) -> Result<(), RepositoryError> {
        self.apply_crypto_deltas(crypto).await?;
        self.apply_order_deltas(orders).await
    }

    /// Persist the outcome of a sell allocation
    async fn commit_sell(
        &self,
        funds: &BTreeMap<ExchangeId, FundsDelta>,
        orders: &[OrderDelta],
    ) -> Result<(), RepositoryError> {
        self.apply_funds_deltas(funds).await?;
        self.apply_order_deltas(orders).await
    }
}
