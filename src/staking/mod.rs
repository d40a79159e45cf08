//! Staking: continuous reward distribution over staked principal.
//!
//! ## Architecture
//!
//! - [`RewardAccumulator`]: the reward-per-token state machine shared by
//!   every pool variant. Pure arithmetic, no custody.
//! - [`StakingPool`]: per-user principal ledger wired to one accumulator and
//!   one reward source (pre-funded escrow or mint-on-claim).
//!
//! Pools are driven either directly (single-asset staking) or by the
//! weighted locker, which forwards weighted amounts to every registered pool
//! so rewards accrue on modified stake, not raw principal.

pub mod accumulator;
pub mod pool;

pub use accumulator::RewardAccumulator;
pub use pool::{RewardSource, StakingPool, UserCheckpoint};
