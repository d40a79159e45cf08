//! Core identifiers, amount aliases, and operation receipts.
//!
//! The engine is substrate-agnostic: principals, assets, and timestamps are
//! opaque integers supplied by the execution environment. All token amounts
//! are raw base units (see [`crate::math`] for the rounding rules).

/// Decimal-string conversion helpers
pub mod units;

/// Typed operation summaries returned by mutating entry points
pub mod receipt;

pub use receipt::{ClaimReceipt, DepositReceipt, FillReceipt, PeriodReceipt};

/// Raw token amount in asset base units
///
/// An asset with 18 decimals stores `1.0` as `10^18`. `u128` leaves ample
/// headroom for the widened intermediates in [`crate::math::mul_div`].
pub type Amount = u128;

/// Registered token identifier
pub type AssetId = u64;

/// An account able to hold balances and call operations.
///
/// Users and engine components (pools, locker, order book) share the same
/// identifier space, the way addresses do on a chain.
pub type Principal = u64;

/// User account identifier (alias kept for signature readability)
pub type UserId = Principal;

/// Seconds since epoch, supplied by the environment on every call
pub type Timestamp = u64;

/// Monotonic public order identifier, never reused
pub type OrderId = u64;

/// Per-user deposit identifier, 1-indexed (0 is reserved and never assigned)
pub type DepositId = u64;
