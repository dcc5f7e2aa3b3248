//! In-memory exchange store.
//!
//! ## Architecture
//!
//! - **BTreeMap**: Exchanges keyed by id, iterated in a stable order
//! - **Slab**: Standing order storage with O(1) insert and remove
//! - **HashMap**: Order id to slab key mapping
//!
//! Every order carries a posting sequence number. Snapshots sort by price
//! and then by sequence, so equal prices come back oldest first.
//!
//! ## Commits
//!
//! `commit_buy` and `commit_sell` check every delta against the current
//! state before touching anything, then apply all of them under a single
//! lock. A rejected commit leaves the store exactly as it was.
//!
//! ## Example
//!
//! ```
//! use order_allocator::repository::InMemoryExchangeStore;
//! use order_allocator::types::{Side, StandingOrder};
//! use rust_decimal_macros::dec;
//!
//! let store = InMemoryExchangeStore::new();
//! let kraken = store.add_exchange("Kraken", dec!(5.0), dec!(150000));
//! store.post_order(kraken, StandingOrder::limit(Side::Sell, dec!(2.0), dec!(50000))).unwrap();
//!
//! assert_eq!(store.order_count(), 1);
//! assert_eq!(store.exchanges()[0].crypto, dec!(5.0));
//! ```

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::Serialize;
use sha2::{Digest, Sha256};
use slab::Slab;
use tracing::{debug, warn};

use crate::config::ExchangeSeed;
use crate::engine::{FundsDelta, OrderDelta, WorkingBuyOrder, WorkingSellOrder};
use crate::error::RepositoryError;
use crate::repository::ExchangeRepository;
use crate::types::{ExchangeId, OrderId, Side, StandingOrder};

/// Point-in-time view of one exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExchangeSnapshot {
    pub id: ExchangeId,
    pub name: String,
    pub crypto: Decimal,
    pub fiat: Decimal,
    pub open_orders: usize,
}

#[derive(Debug, Clone)]
struct ExchangeRecord {
    name: String,
    crypto: Decimal,
    fiat: Decimal,
}

#[derive(Debug, Clone)]
struct StoredOrder {
    order: StandingOrder,
    exchange_id: ExchangeId,
    sequence: u64,
}

#[derive(Debug, Default)]
struct StoreState {
    exchanges: BTreeMap<ExchangeId, ExchangeRecord>,
    orders: Slab<StoredOrder>,
    order_index: HashMap<OrderId, usize>,
    next_sequence: u64,
}

/// Thread-safe in-memory implementation of [`ExchangeRepository`]
#[derive(Debug, Default)]
pub struct InMemoryExchangeStore {
    state: Mutex<StoreState>,
}

impl InMemoryExchangeStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with room for `order_capacity` orders
    pub fn with_capacity(order_capacity: usize) -> Self {
        Self {
            state: Mutex::new(StoreState {
                orders: Slab::with_capacity(order_capacity),
                order_index: HashMap::with_capacity(order_capacity),
                ..StoreState::default()
            }),
        }
    }

    /// Build a store from configured exchange seeds
    pub fn from_seeds(seeds: &[ExchangeSeed]) -> Result<Self, RepositoryError> {
        let store = Self::new();
        for seed in seeds {
            let exchange_id = store.add_exchange(seed.name.clone(), seed.crypto, seed.fiat);
            for order in &seed.orders {
                store.post_order(exchange_id, order.to_standing_order())?;
            }
        }
        Ok(store)
    }

    /// Register an exchange with its starting balances
    pub fn add_exchange(&self, name: impl Into<String>, crypto: Decimal, fiat: Decimal) -> ExchangeId {
        let id = ExchangeId::new();
        self.insert_exchange(id, name, crypto, fiat);
        id
    }

    /// Register an exchange under a caller-chosen id, replacing its balances
    /// if it already exists
    pub fn insert_exchange(&self, id: ExchangeId, name: impl Into<String>, crypto: Decimal, fiat: Decimal) {
        let name = name.into();
        debug!(exchange_id = %id, %name, %crypto, %fiat, "exchange added");

        self.state
            .lock()
            .exchanges
            .insert(id, ExchangeRecord { name, crypto, fiat });
    }

    /// Rest a standing order on an exchange
    ///
    /// # Errors
    ///
    /// - `UnknownExchange` if the exchange is not registered
    /// - `DuplicateOrder` if an order with the same id already rests
    pub fn post_order(&self, exchange_id: ExchangeId, order: StandingOrder) -> Result<OrderId, RepositoryError> {
        let mut state = self.state.lock();

        if !state.exchanges.contains_key(&exchange_id) {
            return Err(RepositoryError::UnknownExchange(exchange_id));
        }
        if state.order_index.contains_key(&order.id) {
            return Err(RepositoryError::DuplicateOrder(order.id));
        }

        let id = order.id;
        let sequence = state.next_sequence;
        state.next_sequence += 1;

        let key = state.orders.insert(StoredOrder {
            order,
            exchange_id,
            sequence,
        });
        state.order_index.insert(id, key);

        Ok(id)
    }

    /// All exchanges with their current balances
    pub fn exchanges(&self) -> Vec<ExchangeSnapshot> {
        let state = self.state.lock();

        let mut open: HashMap<ExchangeId, usize> = HashMap::new();
        for (_, stored) in state.orders.iter() {
            *open.entry(stored.exchange_id).or_default() += 1;
        }

        state
            .exchanges
            .iter()
            .map(|(id, record)| ExchangeSnapshot {
                id: *id,
                name: record.name.clone(),
                crypto: record.crypto,
                fiat: record.fiat,
                open_orders: open.get(id).copied().unwrap_or(0),
            })
            .collect()
    }

    /// Look up one exchange
    pub fn exchange(&self, id: ExchangeId) -> Option<ExchangeSnapshot> {
        self.exchanges().into_iter().find(|snapshot| snapshot.id == id)
    }

    /// Look up a resting order by id
    pub fn order(&self, id: OrderId) -> Option<StandingOrder> {
        let state = self.state.lock();
        let key = state.order_index.get(&id)?;
        state.orders.get(*key).map(|stored| stored.order.clone())
    }

    pub fn order_count(&self) -> usize {
        self.state.lock().orders.len()
    }

    /// Drop every exchange and order
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.exchanges.clear();
        state.orders.clear();
        state.order_index.clear();
        state.next_sequence = 0;
    }

    /// SHA-256 over every balance and resting order
    ///
    /// Two stores holding the same exchanges and orders produce the same
    /// root regardless of slab layout.
    pub fn state_root(&self) -> [u8; 32] {
        let state = self.state.lock();
        let mut hasher = Sha256::new();

        hasher.update((state.exchanges.len() as u64).to_le_bytes());
        for (id, record) in &state.exchanges {
            hasher.update(id.as_uuid().as_bytes());
            hasher.update(record.name.as_bytes());
            hasher.update(record.crypto.normalize().serialize());
            hasher.update(record.fiat.normalize().serialize());
        }

        let mut orders: Vec<&StoredOrder> = state.orders.iter().map(|(_, stored)| stored).collect();
        orders.sort_by_key(|stored| stored.sequence);

        hasher.update((orders.len() as u64).to_le_bytes());
        for stored in orders {
            hasher.update(stored.order.id.as_uuid().as_bytes());
            hasher.update(stored.exchange_id.as_uuid().as_bytes());
            hasher.update([stored.order.side.to_u8()]);
            hasher.update(stored.order.price.normalize().serialize());
            hasher.update(stored.order.amount.normalize().serialize());
        }

        let mut root = [0u8; 32];
        root.copy_from_slice(&hasher.finalize());
        root
    }

    /// Get the state root as a hex string
    pub fn state_root_hex(&self) -> String {
        hex::encode(self.state_root())
    }
}

// ============================================================================
// Locked helpers
// ============================================================================

impl StoreState {
    /// Resting orders of `side`, paired with their exchange
    fn resting(&self, side: Side) -> Vec<(&StoredOrder, &ExchangeRecord)> {
        self.orders
            .iter()
            .filter(|(_, stored)| stored.order.side == side)
            .filter_map(|(_, stored)| {
                self.exchanges
                    .get(&stored.exchange_id)
                    .map(|record| (stored, record))
            })
            .collect()
    }

    fn check_crypto(&self, deltas: &BTreeMap<ExchangeId, Decimal>) -> Result<(), RepositoryError> {
        for (id, consumed) in deltas {
            let record = self
                .exchanges
                .get(id)
                .ok_or(RepositoryError::UnknownExchange(*id))?;
            if record.crypto < *consumed {
                return Err(RepositoryError::BalanceConflict {
                    exchange_id: *id,
                    available: record.crypto,
                    required: *consumed,
                });
            }
        }
        Ok(())
    }

    fn check_funds(&self, deltas: &BTreeMap<ExchangeId, FundsDelta>) -> Result<(), RepositoryError> {
        for (id, delta) in deltas {
            let record = self
                .exchanges
                .get(id)
                .ok_or(RepositoryError::UnknownExchange(*id))?;
            if record.fiat < delta.fiat_spent {
                return Err(RepositoryError::BalanceConflict {
                    exchange_id: *id,
                    available: record.fiat,
                    required: delta.fiat_spent,
                });
            }
        }
        Ok(())
    }

    fn check_orders(&self, deltas: &[OrderDelta]) -> Result<(), RepositoryError> {
        for delta in deltas {
            if !self.order_index.contains_key(&delta.order_id) {
                return Err(RepositoryError::UnknownOrder(delta.order_id));
            }
        }
        Ok(())
    }

    fn apply_crypto(&mut self, deltas: &BTreeMap<ExchangeId, Decimal>) {
        for (id, consumed) in deltas {
            match self.exchanges.get_mut(id) {
                Some(record) => record.crypto -= *consumed,
                None => warn!(exchange_id = %id, "crypto delta for unknown exchange skipped"),
            }
        }
    }

    fn apply_funds(&mut self, deltas: &BTreeMap<ExchangeId, FundsDelta>) {
        for (id, delta) in deltas {
            match self.exchanges.get_mut(id) {
                Some(record) => {
                    record.crypto += delta.crypto_gained;
                    record.fiat -= delta.fiat_spent;
                }
                None => warn!(exchange_id = %id, "funds delta for unknown exchange skipped"),
            }
        }
    }

    fn apply_orders(&mut self, deltas: &[OrderDelta]) {
        for delta in deltas {
            let Some(&key) = self.order_index.get(&delta.order_id) else {
                warn!(order_id = %delta.order_id, "order delta for unknown order skipped");
                continue;
            };

            if delta.is_depleted() {
                self.orders.remove(key);
                self.order_index.remove(&delta.order_id);
                debug!(order_id = %delta.order_id, "depleted order removed");
            } else if let Some(stored) = self.orders.get_mut(key) {
                stored.order.amount = delta.remaining;
            }
        }
    }
}

#[async_trait]
impl ExchangeRepository for InMemoryExchangeStore {
    async fn fetch_sorted_asks(&self) -> Result<Vec<WorkingBuyOrder>, RepositoryError> {
        let state = self.state.lock();
        let mut asks = state.resting(Side::Sell);
        asks.sort_by_key(|(stored, _)| (stored.order.price, stored.sequence));

        Ok(asks
            .into_iter()
            .map(|(stored, record)| {
                WorkingBuyOrder::new(
                    stored.order.clone(),
                    stored.exchange_id,
                    record.name.clone(),
                    record.crypto,
                )
            })
            .collect())
    }

    async fn fetch_sorted_bids(&self) -> Result<Vec<WorkingSellOrder>, RepositoryError> {
        let state = self.state.lock();
        let mut bids = state.resting(Side::Buy);
        bids.sort_by_key(|(stored, _)| (Reverse(stored.order.price), stored.sequence));

        Ok(bids
            .into_iter()
            .map(|(stored, record)| {
                WorkingSellOrder::new(
                    stored.order.clone(),
                    stored.exchange_id,
                    record.name.clone(),
                    record.fiat,
                )
            })
            .collect())
    }

    async fn apply_crypto_deltas(
        &self,
        deltas: &BTreeMap<ExchangeId, Decimal>,
    ) -> Result<(), RepositoryError> {
        self.state.lock().apply_crypto(deltas);
        Ok(())
    }

    async fn apply_funds_deltas(
        &self,
        deltas: &BTreeMap<ExchangeId, FundsDelta>,
    ) -> Result<(), RepositoryError> {
        self.state.lock().apply_funds(deltas);
        Ok(())
    }

    async fn apply_order_deltas(&self, deltas: &[OrderDelta]) -> Result<(), RepositoryError> {
        self.state.lock().apply_orders(deltas);
        Ok(())
    }

    async fn commit_buy(
        &self,
        crypto: &BTreeMap<ExchangeId, Decimal>,
        orders: &[OrderDelta],
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock();
        state.check_crypto(crypto)?;
        state.check_orders(orders)?;

        state.apply_crypto(crypto);
        state.apply_orders(orders);
        Ok(())
    }

    async fn commit_sell(
        &self,
        funds: &BTreeMap<ExchangeId, FundsDelta>,
        orders: &[OrderDelta],
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock();
        state.check_funds(funds)?;
        state.check_orders(orders)?;

        state.apply_funds(funds);
        state.apply_orders(orders);
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
