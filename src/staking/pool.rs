//! Staking pool: per-user principal ledger plus reward accrual.
//!
//! Two variants share the accumulator contract and differ only in where the
//! reward asset comes from at claim time:
//!
//! - **Funded**: rewards are paid from token balance held under the pool's
//!   principal. Funding may happen any time before the claim
//!   (deferred-funding policy) — a claim against an underfunded pool fails
//!   with `InsufficientRewardBalance` and can simply be retried later.
//! - **Minted**: rewards are minted on demand through the ledger's mint
//!   authority; no pre-funding constraint, still rate-limited by the
//!   accumulator.
//!
//! Entry points are operator-gated: the weighted locker drives pools it
//! registered, a standalone single-asset pool is driven by its owner.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::ledger::{AccessControl, Role, TokenLedger};
use crate::staking::RewardAccumulator;
use crate::types::{Amount, AssetId, ClaimReceipt, PeriodReceipt, Principal, Timestamp, UserId};

/// Where claim payouts come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardSource {
    /// Pay from reward-token escrow held under the pool's principal
    Funded {
        /// Asset transferred out on claims
        reward_token: AssetId,
    },
    /// Mint the reward token at claim time (pool must be its minter)
    Minted {
        /// Asset minted on claims
        reward_token: AssetId,
    },
}

impl RewardSource {
    /// The asset claims are paid in
    pub fn reward_token(&self) -> AssetId {
        match self {
            RewardSource::Funded { reward_token } | RewardSource::Minted { reward_token } => {
                *reward_token
            }
        }
    }
}

/// Per-user accrual snapshot.
///
/// Invariant: `earned = (rpt_now - reward_per_token_paid) * principal / WAD
/// + accrued_unclaimed`, always non-negative because the accumulator is
/// monotonic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserCheckpoint {
    /// Staked principal (weighted units when driven by the locker)
    pub principal: Amount,

    /// Accumulator snapshot at the last interaction
    pub reward_per_token_paid: Amount,

    /// Rewards accrued but not yet claimed
    pub accrued_unclaimed: Amount,
}

/// One staking pool: balance ledger, accumulator, reward source.
#[derive(Debug, Clone)]
pub struct StakingPool {
    account: Principal,
    access: AccessControl,
    source: RewardSource,
    accumulator: RewardAccumulator,
    total_staked: Amount,
    checkpoints: HashMap<UserId, UserCheckpoint>,
}

impl StakingPool {
    /// Create a pool.
    ///
    /// `account` is the pool's own ledger principal (reward escrow and mint
    /// identity); `controller` administers roles and implicitly holds them.
    pub fn new(account: Principal, controller: Principal, source: RewardSource) -> Self {
        Self {
            account,
            access: AccessControl::new(controller),
            source,
            accumulator: RewardAccumulator::new(),
            total_staked: 0,
            checkpoints: HashMap::new(),
        }
    }

    /// The controller always passes; everyone else needs the role.
    fn require_role_or_controller(&self, role: Role, caller: Principal) -> Result<()> {
        if self.access.require_controller(caller).is_ok() {
            return Ok(());
        }
        self.access.require_role(role, caller)
    }

    /// Fold global accrual and the user's earned delta into the checkpoint.
    fn checkpoint_user(&mut self, user: UserId, now: Timestamp) -> Result<()> {
        self.accumulator.update_global(now, self.total_staked)?;
        let rpt = self.accumulator.reward_per_token_stored();
        let checkpoint = self.checkpoints.entry(user).or_default();
        let delta = crate::math::mul_div(
            checkpoint.principal,
            rpt - checkpoint.reward_per_token_paid,
            crate::math::WAD,
        )?;
        checkpoint.accrued_unclaimed = checkpoint
            .accrued_unclaimed
            .checked_add(delta)
            .ok_or(Error::ArithmeticOverflow)?;
        checkpoint.reward_per_token_paid = rpt;
        Ok(())
    }

    /// Increase `user`'s principal by `amount`. Operator-only.
    pub fn stake(
        &mut self,
        caller: Principal,
        user: UserId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<()> {
        self.require_role_or_controller(Role::Operator, caller)?;
        if amount == 0 {
            return Err(Error::ZeroAmount);
        }
        let new_total = self
            .total_staked
            .checked_add(amount)
            .ok_or(Error::ArithmeticOverflow)?;

        self.checkpoint_user(user, now)?;
        let checkpoint = self.checkpoints.entry(user).or_default();
        checkpoint.principal += amount;
        self.total_staked = new_total;

        tracing::info!(pool = self.account, user, amount, "stake");
        Ok(())
    }

    /// Decrease `user`'s principal by `amount`. Operator-only.
    ///
    /// Fails with [`Error::InsufficientBalance`] when `amount` exceeds the
    /// user's principal; no state is touched in that case.
    pub fn withdraw(
        &mut self,
        caller: Principal,
        user: UserId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<()> {
        self.require_role_or_controller(Role::Operator, caller)?;
        if amount == 0 {
            return Err(Error::ZeroAmount);
        }
        let principal = self.balance_of(user);
        if amount > principal {
            return Err(Error::InsufficientBalance {
                needed: amount,
                available: principal,
            });
        }

        self.checkpoint_user(user, now)?;
        let checkpoint = self.checkpoints.entry(user).or_default();
        checkpoint.principal -= amount;
        self.total_staked -= amount;

        tracing::info!(pool = self.account, user, amount, "withdraw");
        Ok(())
    }

    /// Pay out `user`'s accrued rewards. Operator-only.
    ///
    /// Funding is verified before any state is written; an underfunded
    /// Funded pool rejects the claim with
    /// [`Error::InsufficientRewardBalance`] and the accrual stays intact for
    /// a retry after funding.
    pub fn collect_reward(
        &mut self,
        caller: Principal,
        ledger: &mut TokenLedger,
        user: UserId,
        now: Timestamp,
    ) -> Result<ClaimReceipt> {
        self.require_role_or_controller(Role::Operator, caller)?;

        let payout = self.earned(user, now)?;
        let reward_token = self.source.reward_token();
        match self.source {
            RewardSource::Funded { reward_token } => {
                let available = ledger.balance_of(reward_token, self.account);
                if available < payout {
                    return Err(Error::InsufficientRewardBalance {
                        needed: payout,
                        available,
                    });
                }
            }
            RewardSource::Minted { reward_token } => {
                if !ledger.can_mint(self.account, reward_token) {
                    return Err(Error::Unauthorized(self.account));
                }
            }
        }

        self.checkpoint_user(user, now)?;
        let checkpoint = self.checkpoints.entry(user).or_default();
        checkpoint.accrued_unclaimed = 0;

        if payout > 0 {
            match self.source {
                RewardSource::Funded { reward_token } => {
                    ledger.transfer(reward_token, self.account, user, payout)?;
                }
                RewardSource::Minted { reward_token } => {
                    ledger.mint(self.account, reward_token, user, payout)?;
                }
            }
        }

        tracing::info!(pool = self.account, user, amount = payout, "rewards collected");
        Ok(ClaimReceipt {
            reward_token,
            amount: payout,
        })
    }

    /// Begin a new distribution period. PeriodStarter-only.
    pub fn start_new_period(
        &mut self,
        caller: Principal,
        duration: u64,
        reward_amount: Amount,
        now: Timestamp,
    ) -> Result<PeriodReceipt> {
        self.require_role_or_controller(Role::PeriodStarter, caller)?;
        self.accumulator
            .start_new_period(duration, reward_amount, now, self.total_staked)
    }

    /// Rewards claimable by `user` at `now` (pure)
    pub fn earned(&self, user: UserId, now: Timestamp) -> Result<Amount> {
        let checkpoint = self.checkpoints.get(&user).copied().unwrap_or_default();
        self.accumulator.earned(
            checkpoint.principal,
            checkpoint.reward_per_token_paid,
            checkpoint.accrued_unclaimed,
            now,
            self.total_staked,
        )
    }

    /// Staked principal of `user`
    pub fn balance_of(&self, user: UserId) -> Amount {
        self.checkpoints
            .get(&user)
            .map(|checkpoint| checkpoint.principal)
            .unwrap_or(0)
    }

    /// Sum of all staked principal
    pub fn total_staked(&self) -> Amount {
        self.total_staked
    }

    /// Timestamp the current rewards period ends at
    pub fn finish_at(&self) -> Timestamp {
        self.accumulator.finish_at()
    }

    /// The pool's own ledger principal
    pub fn account(&self) -> Principal {
        self.account
    }

    /// The asset claims are paid in
    pub fn reward_token(&self) -> AssetId {
        self.source.reward_token()
    }

    /// Role administration passthrough. Controller-only.
    pub fn grant_role(&mut self, caller: Principal, role: Role, who: Principal) -> Result<()> {
        self.access.grant_role(caller, role, who)
    }

    /// Whether `who` may drive stake/withdraw/claim on this pool
    pub fn is_operator(&self, who: Principal) -> bool {
        self.access.controller() == who || self.access.has_role(Role::Operator, who)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::WAD;

    const DAY: u64 = 86_400;
    const USDC: AssetId = 2;
    /// 100 USDC in 6-decimal base units
    const REWARD: Amount = 100_000_000;

    const POOL: Principal = 100;
    const OWNER: Principal = 1;
    const ALICE: UserId = 10;
    const BOB: UserId = 11;

    fn funded_pool() -> (StakingPool, TokenLedger) {
        let mut ledger = TokenLedger::new();
        ledger.register_asset(USDC, 6, Some(OWNER)).unwrap();
        ledger.mint(OWNER, USDC, POOL, REWARD).unwrap();
        let pool = StakingPool::new(POOL, OWNER, RewardSource::Funded { reward_token: USDC });
        (pool, ledger)
    }

    #[test]
    fn test_stake_requires_operator() {
        let (mut pool, _) = funded_pool();
        assert_eq!(pool.stake(ALICE, ALICE, WAD, 0), Err(Error::Unauthorized(ALICE)));
        pool.stake(OWNER, ALICE, WAD, 0).unwrap();
        assert_eq!(pool.balance_of(ALICE), WAD);
    }

    #[test]
    fn test_granted_operator_can_drive() {
        let (mut pool, _) = funded_pool();
        pool.grant_role(OWNER, Role::Operator, ALICE).unwrap();
        pool.stake(ALICE, BOB, WAD, 0).unwrap();
        assert_eq!(pool.balance_of(BOB), WAD);
    }

    #[test]
    fn test_total_staked_tracks_principals() {
        let (mut pool, _) = funded_pool();
        pool.stake(OWNER, ALICE, WAD, 0).unwrap();
        pool.stake(OWNER, BOB, 2 * WAD, 0).unwrap();
        assert_eq!(pool.total_staked(), pool.balance_of(ALICE) + pool.balance_of(BOB));

        pool.withdraw(OWNER, BOB, WAD, 10).unwrap();
        assert_eq!(pool.total_staked(), 2 * WAD);
    }

    #[test]
    fn test_withdraw_more_than_principal() {
        let (mut pool, _) = funded_pool();
        pool.stake(OWNER, ALICE, WAD, 0).unwrap();
        assert_eq!(
            pool.withdraw(OWNER, ALICE, WAD + 1, 0),
            Err(Error::InsufficientBalance {
                needed: WAD + 1,
                available: WAD,
            }),
        );
    }

    #[test]
    fn test_two_stakers_split_rewards_one_to_two() {
        let (mut pool, mut ledger) = funded_pool();
        pool.stake(OWNER, ALICE, WAD, 0).unwrap();
        pool.stake(OWNER, BOB, 2 * WAD, 0).unwrap();
        pool.start_new_period(OWNER, DAY, REWARD, 0).unwrap();

        let half = DAY / 2;
        let alice_earned = pool.earned(ALICE, half).unwrap();
        let bob_earned = pool.earned(BOB, half).unwrap();
        assert_eq!(bob_earned, alice_earned * 2);

        let receipt = pool.collect_reward(OWNER, &mut ledger, ALICE, half).unwrap();
        assert_eq!(receipt.amount, alice_earned);
        assert_eq!(ledger.balance_of(USDC, ALICE), alice_earned);
        // accrual resets after the claim
        assert_eq!(pool.earned(ALICE, half).unwrap(), 0);
    }

    #[test]
    fn test_withdrawn_staker_stops_earning() {
        let (mut pool, _) = funded_pool();
        pool.stake(OWNER, ALICE, WAD, 0).unwrap();
        pool.start_new_period(OWNER, DAY, REWARD, 0).unwrap();

        pool.withdraw(OWNER, ALICE, WAD, DAY / 2).unwrap();
        let frozen = pool.earned(ALICE, DAY / 2).unwrap();
        assert_eq!(pool.earned(ALICE, DAY).unwrap(), frozen);
    }

    #[test]
    fn test_deferred_funding_claim_retry() {
        let mut ledger = TokenLedger::new();
        ledger.register_asset(USDC, 6, Some(OWNER)).unwrap();
        let mut pool = StakingPool::new(POOL, OWNER, RewardSource::Funded { reward_token: USDC });

        pool.stake(OWNER, ALICE, WAD, 0).unwrap();
        // period starts with zero escrow on the pool account
        pool.start_new_period(OWNER, DAY, REWARD, 0).unwrap();

        let err = pool.collect_reward(OWNER, &mut ledger, ALICE, DAY).unwrap_err();
        assert!(matches!(err, Error::InsufficientRewardBalance { .. }));
        // accrual survived the failed claim
        let earned = pool.earned(ALICE, DAY).unwrap();
        assert!(earned > 0);

        ledger.mint(OWNER, USDC, POOL, REWARD).unwrap();
        let receipt = pool.collect_reward(OWNER, &mut ledger, ALICE, DAY).unwrap();
        assert_eq!(receipt.amount, earned);
    }

    #[test]
    fn test_mint_variant_pays_without_funding() {
        const ICE: AssetId = 7;
        let mut ledger = TokenLedger::new();
        ledger.register_asset(ICE, 18, Some(POOL)).unwrap();
        let mut pool = StakingPool::new(POOL, OWNER, RewardSource::Minted { reward_token: ICE });

        pool.stake(OWNER, ALICE, 5 * WAD, 0).unwrap();
        pool.start_new_period(OWNER, DAY, 10 * WAD, 0).unwrap();

        let receipt = pool.collect_reward(OWNER, &mut ledger, ALICE, DAY).unwrap();
        assert!(receipt.amount > 0);
        assert_eq!(ledger.balance_of(ICE, ALICE), receipt.amount);
    }

    #[test]
    fn test_checkpoint_idempotence() {
        let (mut pool, mut ledger) = funded_pool();
        pool.stake(OWNER, ALICE, WAD, 0).unwrap();
        pool.start_new_period(OWNER, DAY, REWARD, 0).unwrap();

        // two claims at the same instant: second pays nothing
        let first = pool.collect_reward(OWNER, &mut ledger, ALICE, DAY / 4).unwrap();
        let second = pool.collect_reward(OWNER, &mut ledger, ALICE, DAY / 4).unwrap();
        assert!(first.amount > 0);
        assert_eq!(second.amount, 0);
    }

    #[test]
    fn test_claim_zero_accrual_is_noop() {
        let (mut pool, mut ledger) = funded_pool();
        let receipt = pool.collect_reward(OWNER, &mut ledger, ALICE, 0).unwrap();
        assert_eq!(receipt.amount, 0);
        assert_eq!(ledger.balance_of(USDC, ALICE), 0);
    }
}
