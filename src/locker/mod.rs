//! Weighted multi-asset locking with governance-weight issuance.
//!
//! ## Architecture
//!
//! - [`VotingWeight`]: a mint/burn-only balance ledger — governance weight
//!   mirrors locked principal exactly and cannot move independently of
//!   locking and unlocking. There is no transfer operation at the type
//!   level.
//! - [`WeightedLocker`]: the deposit ledger. Each deposit commits principal
//!   for a lock period, earns a basis-point reward modifier, and fans the
//!   weighted amount out to every registered staking pool.
//!
//! Stale deposits (lock elapsed, never withdrawn) can be liquidated by
//! anyone; funds always return to the original depositor.

pub mod voting;
pub mod weighted;

pub use voting::VotingWeight;
pub use weighted::{Deposit, LockPeriod, LockableAsset, PriceOracle, WeightedLocker};
