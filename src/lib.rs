//! # FundSwap Core
//!
//! Token staking and peer-to-peer order exchange engine.
//!
//! ## Architecture
//!
//! Two cooperating subsystems share one fixed-point arithmetic core:
//!
//! - **Staking**: [`staking::RewardAccumulator`] distributes a per-second
//!   reward rate pro-rata over staked principal; [`staking::StakingPool`]
//!   tracks per-user checkpoints. [`locker::WeightedLocker`] sits on top,
//!   locking multi-asset deposits for modifier-weighted periods, minting
//!   non-transferable governance weight, and fanning weighted stake out to
//!   every registered pool.
//! - **Exchange**: [`exchange::OrderBook`] holds public resting orders with
//!   escrowed offers, per-asset fees, and a token whitelist; private signed
//!   orders execute once against a content-hash flag; [`exchange::router`]
//!   builds cheapest-first single-hop fill routes.
//!
//! ## Design Principles
//!
//! 1. **Determinism**: all operations produce identical results for
//!    identical inputs; no floating point anywhere in state transitions
//! 2. **Validate-then-commit**: every mutating entry point performs all
//!    validation before its first state write, so failures never apply
//!    partially
//! 3. **Environment-supplied time**: every time-dependent call takes `now`
//!    as an argument; the engine owns no clock
//! 4. **Pool-favored rounding**: proportional math floors toward the pool,
//!    with the one documented exception of exact-output fill payments

// ============================================================================
// Module declarations
// ============================================================================

/// Crate-wide error enum and Result alias
pub mod error;

/// Fixed-point arithmetic: mul_div, rescaling, bps constants
pub mod math;

/// Identifiers, amount aliases, receipts, unit conversion
pub mod types;

/// Environment collaborators: token ledger and access control
pub mod ledger;

/// Reward accumulator and staking pools
pub mod staking;

/// Weighted multi-asset locker and governance weight
pub mod locker;

/// Order book, private orders, fees, and routing
pub mod exchange;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use error::{Error, Result};
pub use exchange::{
    create_trade_route, ExchangeConfig, FillKind, FillRequest, OrderBook, PrivateOrder,
    PublicOrder, SignatureVerifier, TradeRequest,
};
pub use ledger::{AccessControl, Role, TokenLedger};
pub use locker::{Deposit, LockPeriod, LockableAsset, PriceOracle, VotingWeight, WeightedLocker};
pub use staking::{RewardAccumulator, RewardSource, StakingPool};
pub use types::{Amount, AssetId, DepositId, OrderId, Principal, Timestamp, UserId};
