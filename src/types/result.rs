//! Allocation result returned for every buy or sell request.
//!
//! The result is the primary output of an allocation: the ordered fills plus
//! totals. It carries a SHA-256 digest so that two runs over the same
//! snapshot can be checked for identical outcomes without comparing field by
//! field.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::AllocationError;
use crate::types::{Execution, Side};

/// Outcome of one buy or sell request.
///
/// ## Invariant
///
/// `total_amount` always equals the sum of `executions[i].amount`, and
/// `successful` is true only if `total_amount == requested`.
///
/// ## Example
///
/// ```
/// use order_allocator::error::AllocationError;
/// use order_allocator::types::{AllocationResult, Side};
/// use rust_decimal::Decimal;
///
/// let rejected = AllocationResult::rejected(
///     Side::Buy,
///     Decimal::ZERO,
///     AllocationError::InvalidAmount { side: Side::Buy, asset: "BTC".into(), amount: Decimal::ZERO },
/// );
/// assert!(!rejected.successful);
/// assert!(rejected.executions.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    /// Requester's side: `Buy` consumes asks, `Sell` consumes bids
    pub side: Side,

    /// Crypto amount asked for
    pub requested: Decimal,

    /// Crypto amount actually transacted
    pub total_amount: Decimal,

    /// Fiat moved: total cost for buys, total proceeds for sells
    pub total_value: Decimal,

    /// True only if the full requested amount was transacted
    pub successful: bool,

    /// Human-readable reason when not successful
    pub error_message: Option<String>,

    /// Fills in the order they were decided
    pub executions: Vec<Execution>,

    #[serde(skip)]
    pub error: Option<AllocationError>,

    /// [`AllocationError::Persistence`] when the balance/order push failed
    /// after the allocation was decided
    #[serde(skip)]
    pub persistence_error: Option<AllocationError>,
}

impl AllocationResult {
    /// Zero-valued, unsuccessful result
    pub fn rejected(side: Side, requested: Decimal, error: AllocationError) -> Self {
        Self {
            side,
            requested,
            total_amount: Decimal::ZERO,
            total_value: Decimal::ZERO,
            successful: false,
            error_message: Some(error.to_string()),
            executions: Vec::new(),
            error: Some(error),
            persistence_error: None,
        }
    }

    /// Crypto amount still unmet
    pub fn remaining(&self) -> Decimal {
        (self.requested - self.total_amount).max(Decimal::ZERO)
    }

    /// Volume-weighted average execution price
    ///
    /// Returns None if nothing was transacted.
    pub fn average_price(&self) -> Option<Decimal> {
        if self.total_amount <= Decimal::ZERO {
            None
        } else {
            self.total_value.checked_div(self.total_amount)
        }
    }

    /// Whether the balance/order push succeeded (or was not needed)
    pub fn is_persisted(&self) -> bool {
        self.persistence_error.is_none()
    }

    /// SHA-256 fingerprint of the decided outcome
    ///
    /// Covers side, amounts, success flag and every execution in order.
    /// Decimals are normalized first so `1.5` and `1.50` hash the same.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update([self.side.to_u8(), self.successful as u8]);
        hasher.update(self.requested.normalize().serialize());
        hasher.update(self.total_amount.normalize().serialize());
        hasher.update(self.total_value.normalize().serialize());
        hasher.update((self.executions.len() as u64).to_le_bytes());

        for fill in &self.executions {
            hasher.update(fill.order_id.as_uuid().as_bytes());
            hasher.update(fill.exchange_id.as_uuid().as_bytes());
            hasher.update(fill.price.normalize().serialize());
            hasher.update(fill.amount.normalize().serialize());
            hasher.update(fill.value.normalize().serialize());
        }

        let mut hash = [0u8; 32];
        hash.copy_from_slice(&hasher.finalize());
        hash
    }

    /// Get the digest as a hex string
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
