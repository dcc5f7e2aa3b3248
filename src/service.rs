//! Outward buy and sell operations.
//!
//! [`OrderAllocator`] ties the pure allocation loop to a repository:
//!
//! ```text
//! validate amount -> lock gate -> fetch snapshot -> allocate -> commit -> result
//! ```
//!
//! The gate is held from the snapshot read until the commit returns, so two
//! requests through the same allocator never decide fills against the same
//! liquidity.

use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::config::AllocationConfig;
use crate::engine::{allocate_buy, allocate_sell, Allocation};
use crate::error::{AllocationError, RepositoryError};
use crate::repository::ExchangeRepository;
use crate::types::{AllocationResult, Side};

/// Buys and sells crypto across the exchanges of one repository
pub struct OrderAllocator<R> {
    repository: R,
    config: AllocationConfig,

    /// Single-writer gate around read-compute-write
    gate: Mutex<()>,
}

impl<R: ExchangeRepository> OrderAllocator<R> {
    pub fn new(repository: R, config: AllocationConfig) -> Self {
        Self {
            repository,
            config,
            gate: Mutex::new(()),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn config(&self) -> &AllocationConfig {
        &self.config
    }

    /// Buy `amount` crypto from the cheapest asks
    ///
    /// Never fails as a call: shortfalls, snapshot failures and persistence
    /// failures are all reported inside the returned result. Once a snapshot
    /// was read, the commit is issued even when nothing was filled.
    pub async fn buy(&self, amount: Decimal) -> AllocationResult {
        if let Some(rejected) = self.reject_invalid(Side::Buy, amount) {
            return rejected;
        }

        let _gate = self.gate.lock().await;

        let asks = match self.repository.fetch_sorted_asks().await {
            Ok(asks) => asks,
            Err(err) => return self.snapshot_failed(Side::Buy, amount, err),
        };
        info!(side = %Side::Buy, %amount, orders = asks.len(), "allocating");

        let Allocation {
            mut result,
            exchange_deltas,
            order_deltas,
        } = allocate_buy(amount, &asks, &self.config);

        if let Err(err) = self.repository.commit_buy(&exchange_deltas, &order_deltas).await {
            self.persistence_failed(&mut result, err);
        }

        self.log_outcome(&result);
        result
    }

    /// Sell `amount` crypto into the highest bids
    pub async fn sell(&self, amount: Decimal) -> AllocationResult {
        if let Some(rejected) = self.reject_invalid(Side::Sell, amount) {
            return rejected;
        }

        let _gate = self.gate.lock().await;

        let bids = match self.repository.fetch_sorted_bids().await {
            Ok(bids) => bids,
            Err(err) => return self.snapshot_failed(Side::Sell, amount, err),
        };
        info!(side = %Side::Sell, %amount, orders = bids.len(), "allocating");

        let Allocation {
            mut result,
            exchange_deltas,
            order_deltas,
        } = allocate_sell(amount, &bids, &self.config);

        if let Err(err) = self.repository.commit_sell(&exchange_deltas, &order_deltas).await {
            self.persistence_failed(&mut result, err);
        }

        self.log_outcome(&result);
        result
    }

    fn reject_invalid(&self, side: Side, amount: Decimal) -> Option<AllocationResult> {
        if amount > Decimal::ZERO {
            return None;
        }

        let err = AllocationError::InvalidAmount {
            side,
            asset: self.config.asset.clone(),
            amount,
        };
        info!(%side, %amount, "{}", err);
        Some(AllocationResult::rejected(side, amount, err))
    }

    fn snapshot_failed(&self, side: Side, amount: Decimal, err: RepositoryError) -> AllocationResult {
        error!(%side, %amount, error = %err, "failed to fetch order snapshot");
        AllocationResult::rejected(side, amount, AllocationError::Snapshot(err))
    }

    fn persistence_failed(&self, result: &mut AllocationResult, err: RepositoryError) {
        error!(
            side = %result.side,
            executions = result.executions.len(),
            error = %err,
            "failed to persist allocation"
        );
        result.persistence_error = Some(AllocationError::Persistence(err));
    }

    fn log_outcome(&self, result: &AllocationResult) {
        if result.successful {
            info!(
                side = %result.side,
                amount = %result.total_amount,
                value = %result.total_value,
                fiat = %self.config.fiat,
                executions = result.executions.len(),
                "allocation complete"
            );
        } else {
            warn!(
                side = %result.side,
                amount = %result.total_amount,
                value = %result.total_value,
                fiat = %self.config.fiat,
                remaining = %result.remaining(),
                "{}",
                result.error_message.as_deref().unwrap_or("allocation incomplete")
            );
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{FundsDelta, OrderDelta, WorkingBuyOrder, WorkingSellOrder};
    use crate::types::{ExchangeId, StandingOrder};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    /// Repository that serves a fixed snapshot and records every call
    #[derive(Default)]
    struct RecordingRepository {
        asks: Vec<WorkingBuyOrder>,
        bids: Vec<WorkingSellOrder>,
        fail_fetch: bool,
        fail_commit: bool,
        calls: parking_lot::Mutex<Vec<&'static str>>,
        crypto: parking_lot::Mutex<BTreeMap<ExchangeId, Decimal>>,
        funds: parking_lot::Mutex<BTreeMap<ExchangeId, FundsDelta>>,
        orders: parking_lot::Mutex<Vec<OrderDelta>>,
    }

    impl RecordingRepository {
        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl ExchangeRepository for RecordingRepository {
        async fn fetch_sorted_asks(&self) -> Result<Vec<WorkingBuyOrder>, RepositoryError> {
            self.calls.lock().push("fetch_asks");
            if self.fail_fetch {
                return Err(RepositoryError::Unavailable("offline".into()));
            }
            Ok(self.asks.clone())
        }

        async fn fetch_sorted_bids(&self) -> Result<Vec<WorkingSellOrder>, RepositoryError> {
            self.calls.lock().push("fetch_bids");
            if self.fail_fetch {
                return Err(RepositoryError::Unavailable("offline".into()));
            }
            Ok(self.bids.clone())
        }

        async fn apply_crypto_deltas(
            &self,
            deltas: &BTreeMap<ExchangeId, Decimal>,
        ) -> Result<(), RepositoryError> {
            self.calls.lock().push("apply_crypto");
            if self.fail_commit {
                return Err(RepositoryError::Unavailable("write failed".into()));
            }
            *self.crypto.lock() = deltas.clone();
            Ok(())
        }

        async fn apply_funds_deltas(
            &self,
            deltas: &BTreeMap<ExchangeId, FundsDelta>,
        ) -> Result<(), RepositoryError> {
            self.calls.lock().push("apply_funds");
            *self.funds.lock() = deltas.clone();
            Ok(())
        }

        async fn apply_order_deltas(&self, deltas: &[OrderDelta]) -> Result<(), RepositoryError> {
            self.calls.lock().push("apply_orders");
            *self.orders.lock() = deltas.to_vec();
            Ok(())
        }
    }

    fn buy_repository() -> (RecordingRepository, ExchangeId) {
        let exchange = ExchangeId::new();
        let repository = RecordingRepository {
            asks: vec![
                WorkingBuyOrder::new(
                    StandingOrder::limit(Side::Sell, dec!(2.0), dec!(50000)),
                    exchange,
                    "Exchange1",
                    dec!(5.0),
                ),
                WorkingBuyOrder::new(
                    StandingOrder::limit(Side::Sell, dec!(1.0), dec!(51000)),
                    ExchangeId::new(),
                    "Exchange2",
                    dec!(3.0),
                ),
            ],
            ..RecordingRepository::default()
        };
        (repository, exchange)
    }

    #[tokio::test]
    async fn test_invalid_amount_skips_repository() {
        let (repository, _) = buy_repository();
        let allocator = OrderAllocator::new(repository, AllocationConfig::default());

        let result = allocator.buy(Decimal::ZERO).await;
        assert!(!result.successful);
        assert_eq!(
            result.error_message.as_deref(),
            Some("BTC amount to buy must be greater than 0")
        );

        let result = allocator.sell(dec!(-2)).await;
        assert!(matches!(result.error, Some(AllocationError::InvalidAmount { side: Side::Sell, .. })));

        assert!(allocator.repository().calls().is_empty());
    }

    #[tokio::test]
    async fn test_buy_commits_balances_then_orders() {
        let (repository, exchange) = buy_repository();
        let allocator = OrderAllocator::new(repository, AllocationConfig::default());

        let result = allocator.buy(dec!(1.5)).await;

        assert!(result.successful);
        assert_eq!(result.total_value, dec!(75000));
        assert!(result.is_persisted());

        let repository = allocator.repository();
        assert_eq!(repository.calls(), vec!["fetch_asks", "apply_crypto", "apply_orders"]);
        assert_eq!(repository.crypto.lock().get(&exchange), Some(&dec!(1.5)));
        assert_eq!(repository.orders.lock()[0].remaining, dec!(0.5));
    }

    #[tokio::test]
    async fn test_sell_commits_funds() {
        let exchange = ExchangeId::new();
        let repository = RecordingRepository {
            bids: vec![WorkingSellOrder::new(
                StandingOrder::limit(Side::Buy, dec!(5.0), dec!(50000)),
                exchange,
                "Exchange1",
                dec!(300000),
            )],
            ..RecordingRepository::default()
        };
        let allocator = OrderAllocator::new(repository, AllocationConfig::default());

        let result = allocator.sell(dec!(2.0)).await;

        assert!(result.successful);
        assert_eq!(
            allocator.repository().funds.lock().get(&exchange),
            Some(&FundsDelta { crypto_gained: dec!(2.0), fiat_spent: dec!(100000) })
        );
        assert_eq!(
            allocator.repository().calls(),
            vec!["fetch_bids", "apply_funds", "apply_orders"]
        );
    }

    #[tokio::test]
    async fn test_nothing_filled_still_commits() {
        let allocator = OrderAllocator::new(RecordingRepository::default(), AllocationConfig::default());

        let result = allocator.buy(dec!(1.0)).await;
        assert!(!result.successful);
        assert!(result.executions.is_empty());
        assert!(result.is_persisted());

        let result = allocator.sell(dec!(1.0)).await;
        assert!(!result.successful);

        assert_eq!(
            allocator.repository().calls(),
            vec![
                "fetch_asks",
                "apply_crypto",
                "apply_orders",
                "fetch_bids",
                "apply_funds",
                "apply_orders"
            ]
        );
        assert!(allocator.repository().orders.lock().is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_failure_is_reported() {
        let repository = RecordingRepository {
            fail_fetch: true,
            ..RecordingRepository::default()
        };
        let allocator = OrderAllocator::new(repository, AllocationConfig::default());

        let result = allocator.sell(dec!(1.0)).await;

        assert!(!result.successful);
        assert_eq!(result.total_amount, Decimal::ZERO);
        assert!(matches!(result.error, Some(AllocationError::Snapshot(_))));
    }

    #[tokio::test]
    async fn test_persistence_failure_keeps_result() {
        let (mut repository, _) = buy_repository();
        repository.fail_commit = true;
        let allocator = OrderAllocator::new(repository, AllocationConfig::default());

        let result = allocator.buy(dec!(1.5)).await;

        assert!(result.successful);
        assert_eq!(result.total_value, dec!(75000));
        assert!(!result.is_persisted());
        assert_eq!(
            result.persistence_error,
            Some(AllocationError::Persistence(RepositoryError::Unavailable(
                "write failed".into()
            )))
        );
        assert_eq!(
            result.persistence_error.as_ref().map(ToString::to_string).as_deref(),
            Some("failed to persist allocation: repository unavailable: write failed")
        );
        // Order push is never attempted after the balance push failed
        assert_eq!(allocator.repository().calls(), vec!["fetch_asks", "apply_crypto"]);
    }
}
