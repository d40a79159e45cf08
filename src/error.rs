//! Error types for all engine operations.
//!
//! Every mutating entry point validates its inputs and preconditions before
//! the first state write, so any error below implies that no state changed.
//!
//! Variants are grouped by recovery class:
//! - **Validation**: malformed input; retry with corrected arguments.
//! - **State precondition**: valid input, wrong time or wrong target.
//! - **Authorization**: caller lacks the required capability.
//! - **Resource**: recoverable once the missing balance/liquidity exists.
//! - **Arithmetic**: fixed-point guard rails.

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in staking, locking, and exchange operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // === Validation ===
    /// Offered and wanted token are the same
    #[error("offered and wanted token must differ")]
    InvalidPath,

    /// Order created with a zero offered amount
    #[error("offered amount is zero")]
    OfferedAmountIsZero,

    /// Order created with a zero wanted amount
    #[error("wanted amount is zero")]
    WantedAmountIsZero,

    /// Amount argument is zero where a positive amount is required
    #[error("amount is zero")]
    ZeroAmount,

    /// Lock period index out of range for the asset
    #[error("invalid lock period index {0}")]
    InvalidLockPeriod(usize),

    /// Asset index or token id not registered
    #[error("unknown asset {0}")]
    UnknownAsset(u64),

    /// Asset id registered twice on the token ledger
    #[error("asset {0} already registered")]
    AssetAlreadyRegistered(u64),

    /// Rewards period started with a zero duration
    #[error("rewards duration is zero")]
    ZeroRewardsDuration,

    /// Fee above the 100% ceiling
    #[error("fee {0} bps exceeds maximum")]
    FeeExceedsMaximum(u32),

    /// Recomputed private order digest does not match the supplied one
    #[error("private order hash mismatch")]
    InvalidOrderHash,

    // === State preconditions ===
    /// Deposit lock period has not elapsed yet
    #[error("deposit is still locked until {unlock_at}")]
    DepositIsStillLocked { unlock_at: u64 },

    /// Liquidation attempted on a deposit that never had a lock
    #[error("deposit is not locked")]
    DepositIsNotLocked,

    /// Deposit already withdrawn or liquidated
    #[error("deposit is not ongoing")]
    DepositIsNotOngoing,

    /// Deposit id does not exist for the user
    #[error("unknown deposit {0}")]
    UnknownDeposit(u64),

    /// New rewards period requested before the current one finished
    #[error("rewards duration not finished (ends at {finish_at})")]
    RewardsDurationNotFinished { finish_at: u64 },

    /// Order deadline has passed
    #[error("order expired at {deadline}")]
    OrderExpired { deadline: u64 },

    /// Private order hash already marked executed
    #[error("order has already been executed")]
    OrderAlreadyExecuted,

    /// Order id not present in the active set
    #[error("unknown order {0}")]
    UnknownOrder(u64),

    /// Staking pool index out of range
    #[error("unknown staking pool {0}")]
    UnknownStakingPool(usize),

    /// Deposits for the asset are currently disabled
    #[error("deposits in this asset have been disabled")]
    AssetDepositsDisabled,

    /// Token absent from the exchange whitelist
    #[error("token {0} is not whitelisted")]
    TokenNotWhitelisted(u64),

    // === Authorization ===
    /// Caller lacks the role required for the operation
    #[error("unauthorized caller {0}")]
    Unauthorized(u64),

    /// Caller is not the owner of the targeted object
    #[error("caller {0} is not an owner")]
    NotAnOwner(u64),

    /// Private order filled by someone other than its recipient
    #[error("caller {0} is not the order recipient")]
    NotARecipient(u64),

    /// Private order signature rejected by the verifier
    #[error("invalid order signature")]
    InvalidOrderSignature,

    // === Resources ===
    /// Balance too low for the transfer or withdrawal
    #[error("insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: u128, available: u128 },

    /// Allowance too low for a delegated transfer
    #[error("insufficient allowance: need {needed}, have {available}")]
    InsufficientAllowance { needed: u128, available: u128 },

    /// Reward escrow not yet funded up to the claimed amount
    #[error("insufficient reward balance: need {needed}, have {available}")]
    InsufficientRewardBalance { needed: u128, available: u128 },

    /// Candidate orders cannot cover the requested route amount
    #[error("insufficient liquidity: {shortfall} short of the request")]
    InsufficientLiquidity { shortfall: u128 },

    // === Arithmetic ===
    /// mul_div called with a zero denominator
    #[error("division by zero")]
    DivisionByZero,

    /// Intermediate product exceeded 128 bits
    #[error("arithmetic overflow")]
    ArithmeticOverflow,
}
