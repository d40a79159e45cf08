//! In-memory token ledger standing in for the transfer substrate.
//!
//! ## Semantics
//!
//! Standard token semantics only: no fee-on-transfer, no rebasing. Every
//! operation either fully succeeds or fails without touching state, matching
//! an atomic single-transaction execution model. Assets
//! carry a decimal count (18 for most, 6 for USDC-style dividend tokens) and
//! an optional minter principal for mint-on-claim reward assets.
//!
//! Engine components (pools, the locker, the order book) hold escrow under
//! their own principals through the same balance map users do.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::types::{Amount, AssetId, Principal};

/// Registered asset metadata.
#[derive(Debug, Clone, Copy)]
pub struct AssetInfo {
    /// Number of decimals in the asset's base-unit representation
    pub decimals: u32,

    /// Principal allowed to mint, if the asset is mintable
    pub minter: Option<Principal>,
}

/// Balances, allowances, and asset registry.
#[derive(Debug, Default, Clone)]
pub struct TokenLedger {
    assets: HashMap<AssetId, AssetInfo>,
    balances: HashMap<(AssetId, Principal), Amount>,
    allowances: HashMap<(AssetId, Principal, Principal), Amount>,
}

impl TokenLedger {
    /// Create an empty ledger with no registered assets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an asset. Fails if the id is already taken.
    pub fn register_asset(
        &mut self,
        asset: AssetId,
        decimals: u32,
        minter: Option<Principal>,
    ) -> Result<()> {
        if self.assets.contains_key(&asset) {
            return Err(Error::AssetAlreadyRegistered(asset));
        }
        self.assets.insert(asset, AssetInfo { decimals, minter });
        Ok(())
    }

    /// Decimal count for a registered asset
    pub fn decimals(&self, asset: AssetId) -> Result<u32> {
        self.assets
            .get(&asset)
            .map(|info| info.decimals)
            .ok_or(Error::UnknownAsset(asset))
    }

    /// Current balance of `who` in `asset` (zero when never credited)
    pub fn balance_of(&self, asset: AssetId, who: Principal) -> Amount {
        self.balances.get(&(asset, who)).copied().unwrap_or(0)
    }

    /// Move `amount` from `from` to `to`.
    ///
    /// # Errors
    ///
    /// * [`Error::UnknownAsset`] - asset not registered
    /// * [`Error::InsufficientBalance`] - `from` holds less than `amount`
    pub fn transfer(
        &mut self,
        asset: AssetId,
        from: Principal,
        to: Principal,
        amount: Amount,
    ) -> Result<()> {
        if !self.assets.contains_key(&asset) {
            return Err(Error::UnknownAsset(asset));
        }
        let from_balance = self.balance_of(asset, from);
        if from_balance < amount {
            return Err(Error::InsufficientBalance {
                needed: amount,
                available: from_balance,
            });
        }
        if from == to {
            return Ok(());
        }
        let to_balance = self.balance_of(asset, to);
        let to_after = to_balance
            .checked_add(amount)
            .ok_or(Error::ArithmeticOverflow)?;
        self.balances.insert((asset, from), from_balance - amount);
        self.balances.insert((asset, to), to_after);
        tracing::debug!(asset, from, to, amount, "transfer");
        Ok(())
    }

    /// Set the amount `spender` may pull from `owner`.
    pub fn approve(
        &mut self,
        asset: AssetId,
        owner: Principal,
        spender: Principal,
        amount: Amount,
    ) -> Result<()> {
        if !self.assets.contains_key(&asset) {
            return Err(Error::UnknownAsset(asset));
        }
        self.allowances.insert((asset, owner, spender), amount);
        Ok(())
    }

    /// Remaining allowance from `owner` to `spender`
    pub fn allowance(&self, asset: AssetId, owner: Principal, spender: Principal) -> Amount {
        self.allowances
            .get(&(asset, owner, spender))
            .copied()
            .unwrap_or(0)
    }

    /// Delegated transfer: `caller` spends its allowance from `from`.
    ///
    /// # Errors
    ///
    /// * [`Error::InsufficientAllowance`] - allowance below `amount`
    /// * plus every [`TokenLedger::transfer`] error
    pub fn transfer_from(
        &mut self,
        caller: Principal,
        asset: AssetId,
        from: Principal,
        to: Principal,
        amount: Amount,
    ) -> Result<()> {
        let allowed = self.allowance(asset, from, caller);
        if allowed < amount {
            return Err(Error::InsufficientAllowance {
                needed: amount,
                available: allowed,
            });
        }
        self.transfer(asset, from, to, amount)?;
        self.allowances
            .insert((asset, from, caller), allowed - amount);
        Ok(())
    }

    /// Whether `caller` is the registered minter for `asset`
    pub fn can_mint(&self, caller: Principal, asset: AssetId) -> bool {
        self.assets
            .get(&asset)
            .map(|info| info.minter == Some(caller))
            .unwrap_or(false)
    }

    /// Mint `amount` of `asset` to `to`. Minter-only.
    pub fn mint(
        &mut self,
        caller: Principal,
        asset: AssetId,
        to: Principal,
        amount: Amount,
    ) -> Result<()> {
        let info = self.assets.get(&asset).ok_or(Error::UnknownAsset(asset))?;
        if info.minter != Some(caller) {
            return Err(Error::Unauthorized(caller));
        }
        let balance = self.balance_of(asset, to);
        let after = balance
            .checked_add(amount)
            .ok_or(Error::ArithmeticOverflow)?;
        self.balances.insert((asset, to), after);
        tracing::debug!(asset, to, amount, "mint");
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
