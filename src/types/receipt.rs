//! Operation receipts summarizing state transitions.
//!
//! Mutating entry points return one of these instead of relying on an event
//! transport: the caller gets the exact amounts the operation settled with,
//! including rounding already applied.

use crate::types::{Amount, AssetId, DepositId, OrderId, Timestamp};

/// Summary of a locker deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositReceipt {
    /// Per-user deposit identifier (1-indexed)
    pub deposit_id: DepositId,

    /// Index of the lockable asset deposited
    pub asset_index: usize,

    /// Principal amount transferred in
    pub principal_amount: Amount,

    /// Principal scaled by the lock-period modifier; the unit credited to
    /// governance weight and reward accrual
    pub weighted_amount: Amount,

    /// When the deposit becomes withdrawable
    pub unlock_timestamp: Timestamp,
}

/// Summary of a reward claim from a staking pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimReceipt {
    /// Asset the reward was paid in
    pub reward_token: AssetId,

    /// Amount paid out (zero when nothing had accrued)
    pub amount: Amount,
}

/// Summary of a single public or private order fill.
///
/// Conservation holds per fill on the offered side:
/// `amount_received + fee` equals the offered portion consumed, and the
/// order creator receives `amount_paid` in full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillReceipt {
    /// Filled public order id; `None` for private orders
    pub order_id: Option<OrderId>,

    /// Wanted-side amount the filler paid to the creator
    pub amount_paid: Amount,

    /// Offered-side amount the filler received (fee already deducted)
    pub amount_received: Amount,

    /// Offered-side fee accrued to the exchange
    pub fee: Amount,
}

/// Summary of a newly started rewards period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodReceipt {
    /// Period length in seconds
    pub duration: u64,

    /// Total reward amount scheduled for the period
    pub reward_amount: Amount,

    /// Floored per-second emission rate
    pub reward_rate_per_second: Amount,

    /// Timestamp at which the period ends
    pub finish_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_receipt_conservation_fields() {
        let receipt = FillReceipt {
            order_id: Some(3),
            amount_paid: 1_000_000,
            amount_received: 997_600,
            fee: 2_400,
        };
        assert_eq!(receipt.amount_received + receipt.fee, 1_000_000);
    }

    #[test]
    fn test_period_receipt_rate() {
        let receipt = PeriodReceipt {
            duration: 86_400,
            reward_amount: 100_000_000,
            reward_rate_per_second: 100_000_000 / 86_400,
            finish_at: 86_400,
        };
        assert_eq!(receipt.reward_rate_per_second, 1157);
    }
}
