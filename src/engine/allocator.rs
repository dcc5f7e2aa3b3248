//! The shared greedy allocation loop.
//!
//! ## Algorithm
//!
//! ```text
//! remaining = target
//! loop:
//!     scan orders from the first (best price) to the last
//!         skip if order or its exchange has nothing left
//!         take = min(remaining, order remaining, exchange bound)
//!         skip if take <= 0
//!         fill `take`, shrink order + exchange, restart the scan
//!     stop if remaining <= 0 or a full scan found nothing to take
//! ```
//!
//! Price order is fixed by the input and never re-sorted; only eligibility
//! changes between scans. Ties keep their encounter order.
//!
//! ## Exchange Ledger
//!
//! Liquidity lives in one slot per exchange, shared by every order of that
//! exchange. The first working order seen for an exchange fixes its starting
//! balance. Each fill strictly shrinks some order, so the loop terminates.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::config::AllocationConfig;
use crate::engine::side::{AllocationSide, BuySide, FundsDelta, SellSide};
use crate::engine::working::{WorkingBuyOrder, WorkingOrder, WorkingSellOrder};
use crate::error::AllocationError;
use crate::types::amount::{checked_value, display_trimmed};
use crate::types::{AllocationResult, ExchangeId, Execution, OrderId};

/// New remaining amount for a consumed standing order
///
/// A remaining amount of zero means the order is depleted and should be
/// removed by the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OrderDelta {
    pub order_id: OrderId,
    pub remaining: Decimal,
}

impl OrderDelta {
    pub fn is_depleted(&self) -> bool {
        self.remaining <= Decimal::ZERO
    }
}

/// Everything one allocation run decided
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation<D> {
    pub result: AllocationResult,

    /// Accumulated balance change per touched exchange
    pub exchange_deltas: BTreeMap<ExchangeId, D>,

    /// One entry per consumed order, in first-consumption order
    pub order_deltas: Vec<OrderDelta>,
}

impl<D> Allocation<D> {
    fn rejected(result: AllocationResult) -> Self {
        Self {
            result,
            exchange_deltas: BTreeMap::new(),
            order_deltas: Vec::new(),
        }
    }

    /// True if nothing needs to be persisted
    pub fn is_empty(&self) -> bool {
        self.order_deltas.is_empty() && self.exchange_deltas.is_empty()
    }
}

/// Result of a buy allocation: crypto consumed per exchange
pub type BuyAllocation = Allocation<Decimal>;

/// Result of a sell allocation: crypto gained and fiat spent per exchange
pub type SellAllocation = Allocation<FundsDelta>;

/// Allocate a purchase of `target` crypto across asks sorted by ascending price
pub fn allocate_buy(
    target: Decimal,
    sorted_asks: &[WorkingBuyOrder],
    config: &AllocationConfig,
) -> BuyAllocation {
    run_allocation::<BuySide>(target, sorted_asks, config)
}

/// Allocate a sale of `target` crypto across bids sorted by descending price
pub fn allocate_sell(
    target: Decimal,
    sorted_bids: &[WorkingSellOrder],
    config: &AllocationConfig,
) -> SellAllocation {
    run_allocation::<SellSide>(target, sorted_bids, config)
}

// ============================================================================
// Run state
// ============================================================================

/// Mutable view of one working order during a run
#[derive(Debug, Clone)]
struct Slot {
    remaining: Decimal,
    /// Index into the exchange ledger
    exchange: usize,
    consumed: bool,
}

/// A fill decided by one scan, not yet applied
#[derive(Debug, Clone, Copy)]
struct Fill {
    index: usize,
    amount: Decimal,
    value: Decimal,
}

struct RunState<'a, W> {
    orders: &'a [W],
    slots: Vec<Slot>,
    ledger: Vec<Decimal>,
    /// Every slot before this one is ineligible for the rest of the run
    cursor: usize,
}

impl<'a, W: WorkingOrder> RunState<'a, W> {
    fn new(orders: &'a [W]) -> Self {
        let mut ledger = Vec::new();
        let mut ledger_index: HashMap<ExchangeId, usize> = HashMap::new();

        let slots = orders
            .iter()
            .map(|working| {
                let exchange = *ledger_index.entry(working.exchange_id()).or_insert_with(|| {
                    ledger.push(working.liquidity());
                    ledger.len() - 1
                });
                Slot {
                    remaining: working.remaining(),
                    exchange,
                    consumed: false,
                }
            })
            .collect();

        Self {
            orders,
            slots,
            ledger,
            cursor: 0,
        }
    }

    fn is_eligible<S>(&self, index: usize) -> bool
    where
        S: AllocationSide<Working = W>,
    {
        let slot = &self.slots[index];
        S::is_eligible(slot.remaining, self.ledger[slot.exchange], self.orders[index].order().price)
    }

    /// First order in price priority that can take a non-zero amount
    /// without overflowing the running total
    fn next_fill<S>(&mut self, remaining: Decimal, total_value: Decimal, amount_scale: u32) -> Option<Fill>
    where
        S: AllocationSide<Working = W>,
    {
        // Remaining amounts and liquidity only shrink, so ineligibility is final
        while self.cursor < self.slots.len() && !self.is_eligible::<S>(self.cursor) {
            self.cursor += 1;
        }

        for index in self.cursor..self.slots.len() {
            if !self.is_eligible::<S>(index) {
                continue;
            }

            let slot = &self.slots[index];
            let order = self.orders[index].order();
            let liquidity = self.ledger[slot.exchange];

            let Some(bound) = S::liquidity_bound(liquidity, order.price, amount_scale) else {
                continue;
            };

            let amount = remaining.min(slot.remaining).min(bound);
            if amount <= Decimal::ZERO {
                continue;
            }

            let Some(value) = checked_value(amount, order.price) else {
                warn!(order_id = %order.id, price = %order.price, %amount, "fill value overflows, skipping order");
                continue;
            };

            if total_value.checked_add(value).is_none() {
                warn!(order_id = %order.id, %value, %total_value, "total value overflows, skipping order");
                continue;
            }

            return Some(Fill { index, amount, value });
        }

        None
    }

    fn apply<S>(&mut self, fill: Fill) -> bool
    where
        S: AllocationSide<Working = W>,
    {
        let slot = &mut self.slots[fill.index];
        slot.remaining -= fill.amount;
        self.ledger[slot.exchange] -= S::liquidity_consumed(fill.amount, fill.value);

        let first = !slot.consumed;
        slot.consumed = true;
        first
    }
}

// ============================================================================
// Shared loop
// ============================================================================

/// Run the greedy price-priority loop for one side.
///
/// `orders` must already be in price priority for `S`. A non-positive
/// target is rejected before anything else happens.
pub fn run_allocation<S: AllocationSide>(
    target: Decimal,
    orders: &[S::Working],
    config: &AllocationConfig,
) -> Allocation<S::Delta> {
    if target <= Decimal::ZERO {
        let error = AllocationError::InvalidAmount {
            side: S::SIDE,
            asset: config.asset.clone(),
            amount: target,
        };
        return Allocation::rejected(AllocationResult::rejected(S::SIDE, target, error));
    }

    let mut state = RunState::new(orders);
    let mut remaining = target;
    let mut total_value = Decimal::ZERO;
    let mut executions = Vec::new();
    let mut exchange_deltas: BTreeMap<ExchangeId, S::Delta> = BTreeMap::new();
    let mut consumed: Vec<usize> = Vec::new();

    while remaining > Decimal::ZERO {
        let Some(fill) = state.next_fill::<S>(remaining, total_value, config.amount_scale) else {
            break;
        };

        let working = &orders[fill.index];
        debug!(
            side = %S::SIDE,
            exchange = working.exchange_name(),
            order_id = %working.order().id,
            price = %working.order().price,
            amount = %fill.amount,
            "order filled"
        );

        executions.push(Execution::new(
            working.order(),
            working.exchange_id(),
            working.exchange_name(),
            fill.amount,
            fill.value,
        ));
        remaining -= fill.amount;
        total_value += fill.value;
        S::accumulate(
            exchange_deltas.entry(working.exchange_id()).or_default(),
            fill.amount,
            fill.value,
        );

        if state.apply::<S>(fill) {
            consumed.push(fill.index);
        }
    }

    let order_deltas = consumed
        .into_iter()
        .map(|index| OrderDelta {
            order_id: orders[index].order().id,
            remaining: state.slots[index].remaining,
        })
        .collect();

    let total_amount = target - remaining;
    let successful = remaining <= Decimal::ZERO;
    let error = (!successful).then(|| AllocationError::InsufficientLiquidity {
        side: S::SIDE,
        asset: config.asset.clone(),
        filled: total_amount.normalize(),
        remaining: remaining.normalize(),
    });

    if let Some(ref shortfall) = error {
        debug!(side = %S::SIDE, filled = %display_trimmed(total_amount), "{}", shortfall);
    }

    Allocation {
        result: AllocationResult {
            side: S::SIDE,
            requested: target,
            total_amount,
            total_value,
            successful,
            error_message: error.as_ref().map(ToString::to_string),
            executions,
            error,
            persistence_error: None,
        },
        exchange_deltas,
        order_deltas,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
