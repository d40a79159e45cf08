//! Weighted multi-asset deposit ledger.
//!
//! ## Deposit Lifecycle
//!
//! ```text
//! stake -> Deposit { is_ongoing: true }
//!       -> withdraw (owner, after unlock)        -> is_ongoing: false
//!       -> liquidate (anyone, after unlock)      -> is_ongoing: false
//! ```
//!
//! Deposits are append-only and never deleted; ids are monotonic per user,
//! 1-indexed. The weighted amount (`principal * modifier / 10000`) is what
//! gets credited to governance weight and forwarded to every registered
//! staking pool, so rewards accrue on modified stake rather than raw
//! principal.
//!
//! ## Atomicity
//!
//! Fan-out to N pools is one logical transaction: all pool-leg
//! preconditions are validated before the first state write, and the
//! remaining commit steps cannot fail, so a deposit either lands everywhere
//! or nowhere.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::ledger::{AccessControl, TokenLedger};
use crate::locker::VotingWeight;
use crate::math::{mul_div, BPS_DENOMINATOR};
use crate::staking::StakingPool;
use crate::types::{
    Amount, AssetId, ClaimReceipt, DepositId, DepositReceipt, Principal, Timestamp, UserId,
};

/// LP valuation collaborator. The engine only consumes the returned ratio.
pub trait PriceOracle {
    /// Value of `amount_in` of `token`, in the paired dividend token
    fn consult(&self, token: AssetId, amount_in: Amount) -> Result<Amount>;
}

/// A lock duration and its basis-point reward modifier (10000 = 1.0x).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockPeriod {
    /// Commitment length in seconds; 0 means no lock
    pub duration_seconds: u64,

    /// Multiplier applied to principal, in basis points
    pub reward_modifier_bps: u32,
}

/// An asset accepted for locking.
#[derive(Debug, Clone)]
pub struct LockableAsset {
    /// Underlying token transferred in and out
    pub token: AssetId,

    /// Whether deposits of this asset mint governance weight
    pub is_entitled_to_vote: bool,

    /// Whether the token is an LP pair token (valued through the oracle)
    pub is_lp_token: bool,

    /// Dividend token the LP pair is valued in, when `is_lp_token`
    pub dividend_token_from_pair: Option<AssetId>,

    /// Available lock tiers, index 0 conventionally `{0s, 10000 bps}`
    pub lock_periods: Vec<LockPeriod>,

    /// Gate for new deposits; existing deposits are unaffected
    pub deposits_enabled: bool,
}

/// One locked position. Never deleted; `is_ongoing` flips on settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deposit {
    /// Owner of the position
    pub depositor: UserId,

    /// Per-user identifier, 1-indexed
    pub deposit_id: DepositId,

    /// Index into the locker's asset table
    pub asset_index: usize,

    /// Index into the asset's lock-period table
    pub lock_period_index: usize,

    /// Raw amount transferred in
    pub principal_amount: Amount,

    /// Principal scaled by the lock-period modifier
    pub weighted_amount: Amount,

    /// When the position becomes withdrawable
    pub unlock_timestamp: Timestamp,

    /// False once withdrawn or liquidated
    pub is_ongoing: bool,

    /// Number of pools registered when the deposit was made; the weighted
    /// amount sits in exactly pools `0..staked_pools` (pools are
    /// append-only, so later registrations never hold this deposit)
    pub staked_pools: usize,
}

/// Multi-asset weighted locker: deposits, governance weight, pool fan-out.
#[derive(Debug)]
pub struct WeightedLocker {
    account: Principal,
    access: AccessControl,
    voting: VotingWeight,
    assets: Vec<LockableAsset>,
    pools: Vec<StakingPool>,
    deposits: BTreeMap<UserId, Vec<Deposit>>,
}

impl WeightedLocker {
    /// Create a locker with no assets or pools registered.
    ///
    /// `account` is the locker's ledger principal (principal escrow and the
    /// governance-weight mint authority).
    pub fn new(account: Principal, controller: Principal) -> Self {
        Self {
            account,
            access: AccessControl::new(controller),
            voting: VotingWeight::new(account),
            assets: Vec::new(),
            pools: Vec::new(),
            deposits: BTreeMap::new(),
        }
    }

    // ========================================================================
    // Administration (controller-only, append-only registries)
    // ========================================================================

    /// Register a lockable asset. Returns its index.
    pub fn add_lockable_asset(&mut self, caller: Principal, asset: LockableAsset) -> Result<usize> {
        self.access.require_controller(caller)?;
        if asset.lock_periods.is_empty() {
            return Err(Error::InvalidLockPeriod(0));
        }
        self.assets.push(asset);
        Ok(self.assets.len() - 1)
    }

    /// Register a staking pool. Returns its index.
    ///
    /// The pool must already recognize the locker as an operator so that
    /// deposit fan-out can never fail half-way.
    pub fn add_staking_pool(&mut self, caller: Principal, pool: StakingPool) -> Result<usize> {
        self.access.require_controller(caller)?;
        if !pool.is_operator(self.account) {
            return Err(Error::Unauthorized(self.account));
        }
        self.pools.push(pool);
        Ok(self.pools.len() - 1)
    }

    /// Stop accepting new deposits of an asset.
    pub fn disable_deposits_for_asset(&mut self, caller: Principal, asset_index: usize) -> Result<()> {
        self.access.require_controller(caller)?;
        let asset = self
            .assets
            .get_mut(asset_index)
            .ok_or(Error::UnknownAsset(asset_index as u64))?;
        asset.deposits_enabled = false;
        Ok(())
    }

    /// Re-enable deposits of an asset.
    pub fn enable_deposits_for_asset(&mut self, caller: Principal, asset_index: usize) -> Result<()> {
        self.access.require_controller(caller)?;
        let asset = self
            .assets
            .get_mut(asset_index)
            .ok_or(Error::UnknownAsset(asset_index as u64))?;
        asset.deposits_enabled = true;
        Ok(())
    }

    /// Hand control to a new principal (staged decentralization).
    pub fn transfer_controller(&mut self, caller: Principal, new_controller: Principal) -> Result<()> {
        self.access.transfer_controller(caller, new_controller)
    }

    // ========================================================================
    // Deposits
    // ========================================================================

    /// Lock `amount` of an asset for a lock period.
    ///
    /// Transfers the principal in, mints governance weight for voting
    /// assets, and stakes the weighted amount into every registered pool.
    pub fn stake(
        &mut self,
        caller: UserId,
        ledger: &mut TokenLedger,
        asset_index: usize,
        lock_period_index: usize,
        amount: Amount,
        now: Timestamp,
    ) -> Result<DepositReceipt> {
        let asset = self
            .assets
            .get(asset_index)
            .ok_or(Error::UnknownAsset(asset_index as u64))?;
        if !asset.deposits_enabled {
            return Err(Error::AssetDepositsDisabled);
        }
        let period = *asset
            .lock_periods
            .get(lock_period_index)
            .ok_or(Error::InvalidLockPeriod(lock_period_index))?;
        if amount == 0 {
            return Err(Error::ZeroAmount);
        }
        let token = asset.token;
        let entitled_to_vote = asset.is_entitled_to_vote;
        let weighted_amount = mul_div(
            amount,
            Amount::from(period.reward_modifier_bps),
            BPS_DENOMINATOR,
        )?;
        self.require_pool_operatorship()?;

        // commit: principal in, weight out, stake fan-out, record
        ledger.transfer(token, caller, self.account, amount)?;
        if entitled_to_vote {
            self.voting.mint(self.account, caller, weighted_amount)?;
        }
        let account = self.account;
        for pool in &mut self.pools {
            pool.stake(account, caller, weighted_amount, now)?;
        }

        let entries = self.deposits.entry(caller).or_default();
        let deposit_id = entries.len() as DepositId + 1;
        let unlock_timestamp = now + period.duration_seconds;
        entries.push(Deposit {
            depositor: caller,
            deposit_id,
            asset_index,
            lock_period_index,
            principal_amount: amount,
            weighted_amount,
            unlock_timestamp,
            is_ongoing: true,
            staked_pools: self.pools.len(),
        });

        tracing::info!(
            user = caller,
            deposit_id,
            asset_index,
            amount,
            weighted_amount,
            unlock_timestamp,
            "deposit locked"
        );

        Ok(DepositReceipt {
            deposit_id,
            asset_index,
            principal_amount: amount,
            weighted_amount,
            unlock_timestamp,
        })
    }

    /// Withdraw an unlocked deposit. Owner-only (by construction: the
    /// deposit is looked up under the caller's own ledger).
    pub fn withdraw(
        &mut self,
        caller: UserId,
        ledger: &mut TokenLedger,
        deposit_id: DepositId,
        now: Timestamp,
    ) -> Result<()> {
        let deposit = self.deposit_checked(caller, deposit_id)?;
        if !deposit.is_ongoing {
            return Err(Error::DepositIsNotOngoing);
        }
        if now < deposit.unlock_timestamp {
            return Err(Error::DepositIsStillLocked {
                unlock_at: deposit.unlock_timestamp,
            });
        }
        self.settle_close(ledger, caller, deposit_id, now)?;
        tracing::info!(user = caller, deposit_id, "deposit withdrawn");
        Ok(())
    }

    /// Force-unlock a stale deposit. Callable by anyone; the principal
    /// always returns to the original depositor, never the caller.
    pub fn liquidate_stale_deposit(
        &mut self,
        caller: Principal,
        ledger: &mut TokenLedger,
        depositor: UserId,
        deposit_id: DepositId,
        now: Timestamp,
    ) -> Result<()> {
        let deposit = self.deposit_checked(depositor, deposit_id)?;
        let period = self.assets[deposit.asset_index].lock_periods[deposit.lock_period_index];
        if period.duration_seconds == 0 {
            return Err(Error::DepositIsNotLocked);
        }
        if !deposit.is_ongoing {
            return Err(Error::DepositIsNotOngoing);
        }
        if now < deposit.unlock_timestamp {
            return Err(Error::DepositIsStillLocked {
                unlock_at: deposit.unlock_timestamp,
            });
        }
        self.settle_close(ledger, depositor, deposit_id, now)?;
        tracing::info!(
            liquidator = caller,
            depositor,
            deposit_id,
            "stale deposit liquidated"
        );
        Ok(())
    }

    /// Liquidate a batch of stale deposits, failing fast on the first error.
    pub fn liquidate_stale_deposits(
        &mut self,
        caller: Principal,
        ledger: &mut TokenLedger,
        targets: &[(UserId, DepositId)],
        now: Timestamp,
    ) -> Result<()> {
        for &(depositor, deposit_id) in targets {
            self.liquidate_stale_deposit(caller, ledger, depositor, deposit_id, now)?;
        }
        Ok(())
    }

    /// Deposits whose lock has elapsed but which are still ongoing.
    ///
    /// Zero-duration deposits are excluded: they cannot be liquidated, only
    /// withdrawn by their owner.
    pub fn stale_deposits(&self, now: Timestamp) -> Vec<(UserId, DepositId)> {
        let mut stale = Vec::new();
        for (user, entries) in &self.deposits {
            for deposit in entries {
                let period =
                    self.assets[deposit.asset_index].lock_periods[deposit.lock_period_index];
                if deposit.is_ongoing
                    && period.duration_seconds > 0
                    && now >= deposit.unlock_timestamp
                {
                    stale.push((*user, deposit.deposit_id));
                }
            }
        }
        stale
    }

    // ========================================================================
    // Rewards
    // ========================================================================

    /// Claim the caller's accrued reward from one pool, paid directly to the
    /// caller (the reward asset bypasses the locker).
    pub fn collect_rewards(
        &mut self,
        caller: UserId,
        ledger: &mut TokenLedger,
        pool_index: usize,
        now: Timestamp,
    ) -> Result<ClaimReceipt> {
        let account = self.account;
        let pool = self
            .pools
            .get_mut(pool_index)
            .ok_or(Error::UnknownStakingPool(pool_index))?;
        pool.collect_reward(account, ledger, caller, now)
    }

    /// Rewards claimable by `user` from one pool at `now`
    pub fn earned(&self, user: UserId, pool_index: usize, now: Timestamp) -> Result<Amount> {
        let pool = self
            .pools
            .get(pool_index)
            .ok_or(Error::UnknownStakingPool(pool_index))?;
        pool.earned(user, now)
    }

    // ========================================================================
    // Views
    // ========================================================================

    /// Sum of weighted amounts across the user's ongoing deposits
    pub fn balance_of(&self, user: UserId) -> Amount {
        self.deposits
            .get(&user)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|deposit| deposit.is_ongoing)
                    .map(|deposit| deposit.weighted_amount)
                    .sum()
            })
            .unwrap_or(0)
    }

    /// Look up one deposit
    pub fn get_deposit(&self, user: UserId, deposit_id: DepositId) -> Option<&Deposit> {
        let index = deposit_id.checked_sub(1)? as usize;
        self.deposits.get(&user)?.get(index)
    }

    /// Value of a deposit in the asset's dividend token.
    ///
    /// LP deposits are valued through the oracle; plain deposits are worth
    /// their principal.
    pub fn deposit_value(
        &self,
        user: UserId,
        deposit_id: DepositId,
        oracle: &dyn PriceOracle,
    ) -> Result<Amount> {
        let deposit = self.deposit_checked(user, deposit_id)?;
        let asset = &self.assets[deposit.asset_index];
        if asset.is_lp_token && asset.dividend_token_from_pair.is_some() {
            oracle.consult(asset.token, deposit.principal_amount)
        } else {
            Ok(deposit.principal_amount)
        }
    }

    /// Governance weight ledger (read-only)
    pub fn voting(&self) -> &VotingWeight {
        &self.voting
    }

    /// Registered lockable asset at `index`
    pub fn lockable_asset(&self, index: usize) -> Option<&LockableAsset> {
        self.assets.get(index)
    }

    /// Registered staking pool at `index`
    pub fn staking_pool(&self, index: usize) -> Option<&StakingPool> {
        self.pools.get(index)
    }

    /// Registered staking pool at `index`, mutable (pool entry points carry
    /// their own authorization)
    pub fn staking_pool_mut(&mut self, index: usize) -> Option<&mut StakingPool> {
        self.pools.get_mut(index)
    }

    /// Number of registered pools
    pub fn staking_pool_count(&self) -> usize {
        self.pools.len()
    }

    /// The locker's ledger principal
    pub fn account(&self) -> Principal {
        self.account
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn deposit_checked(&self, user: UserId, deposit_id: DepositId) -> Result<Deposit> {
        self.get_deposit(user, deposit_id)
            .copied()
            .ok_or(Error::UnknownDeposit(deposit_id))
    }

    /// Every registered pool must accept the locker as operator before any
    /// state is written (simulate-then-commit for the fan-out legs).
    fn require_pool_operatorship(&self) -> Result<()> {
        for pool in &self.pools {
            if !pool.is_operator(self.account) {
                return Err(Error::Unauthorized(self.account));
            }
        }
        Ok(())
    }

    /// Shared settlement for withdraw and liquidation: burn weight, unstake
    /// from the pools the deposit was staked in, return principal, flip the
    /// flag. Preconditions are the caller's responsibility.
    fn settle_close(
        &mut self,
        ledger: &mut TokenLedger,
        depositor: UserId,
        deposit_id: DepositId,
        now: Timestamp,
    ) -> Result<()> {
        let deposit = self.deposit_checked(depositor, deposit_id)?;
        let asset = &self.assets[deposit.asset_index];
        let token = asset.token;
        let entitled_to_vote = asset.is_entitled_to_vote;
        self.require_pool_operatorship()?;

        let account = self.account;
        if entitled_to_vote {
            self.voting.burn(account, depositor, deposit.weighted_amount)?;
        }
        for pool in &mut self.pools[..deposit.staked_pools] {
            pool.withdraw(account, depositor, deposit.weighted_amount, now)?;
        }
        ledger.transfer(token, account, depositor, deposit.principal_amount)?;

        let entry = self
            .deposits
            .get_mut(&depositor)
            .and_then(|entries| entries.get_mut(deposit_id as usize - 1))
            .ok_or(Error::UnknownDeposit(deposit_id))?;
        entry.is_ongoing = false;
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
