//! Per-asset fee schedule and accrual.
//!
//! A single default rate applies to every asset without an explicit
//! override. Overrides may be zero (fee disabled for that asset). Collected
//! fees accrue per token and can be withdrawn up to the accrued balance,
//! never more.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::math::{mul_div, BPS_DENOMINATOR, MAX_FEE_BPS};
use crate::types::{Amount, AssetId};

/// Default swap fee in basis points (0.24%)
pub const DEFAULT_FEE_BPS: u32 = 24;

/// Fee rates and accrued balances.
#[derive(Debug, Clone)]
pub struct FeeSchedule {
    default_fee_bps: u32,
    overrides: BTreeMap<AssetId, u32>,
    collected: BTreeMap<AssetId, Amount>,
}

impl FeeSchedule {
    /// Create a schedule with the given default rate.
    pub fn new(default_fee_bps: u32) -> Result<Self> {
        if default_fee_bps > MAX_FEE_BPS {
            return Err(Error::FeeExceedsMaximum(default_fee_bps));
        }
        Ok(Self {
            default_fee_bps,
            overrides: BTreeMap::new(),
            collected: BTreeMap::new(),
        })
    }

    /// Replace the default rate.
    pub fn set_default_fee(&mut self, bps: u32) -> Result<()> {
        if bps > MAX_FEE_BPS {
            return Err(Error::FeeExceedsMaximum(bps));
        }
        self.default_fee_bps = bps;
        Ok(())
    }

    /// Set an explicit per-asset rate (0 disables the fee for the asset).
    pub fn set_fee_for_asset(&mut self, asset: AssetId, bps: u32) -> Result<()> {
        if bps > MAX_FEE_BPS {
            return Err(Error::FeeExceedsMaximum(bps));
        }
        self.overrides.insert(asset, bps);
        Ok(())
    }

    /// Current default rate
    pub fn default_fee_bps(&self) -> u32 {
        self.default_fee_bps
    }

    /// Effective rate for `asset`: the override if set, else the default
    pub fn fee_bps_for(&self, asset: AssetId) -> u32 {
        self.overrides
            .get(&asset)
            .copied()
            .unwrap_or(self.default_fee_bps)
    }

    /// Fee owed on `amount` of `asset`, floored
    pub fn compute_fee(&self, asset: AssetId, amount: Amount) -> Result<Amount> {
        mul_div(amount, Amount::from(self.fee_bps_for(asset)), BPS_DENOMINATOR)
    }

    /// Record `amount` of `asset` as collected.
    pub fn accrue(&mut self, asset: AssetId, amount: Amount) -> Result<()> {
        let entry = self.collected.entry(asset).or_insert(0);
        *entry = entry.checked_add(amount).ok_or(Error::ArithmeticOverflow)?;
        Ok(())
    }

    /// Accrued balance for `asset`
    pub fn collected(&self, asset: AssetId) -> Amount {
        self.collected.get(&asset).copied().unwrap_or(0)
    }

    /// Withdraw up to `requested` of the accrued balance; returns the
    /// amount actually taken (capped at what has accrued).
    pub fn take(&mut self, asset: AssetId, requested: Amount) -> Amount {
        let entry = self.collected.entry(asset).or_insert(0);
        let taken = requested.min(*entry);
        *entry -= taken;
        taken
    }

    /// `(asset, bps)` pairs for assets with an explicit override only
    pub fn fees_for_all_assets(&self) -> Vec<(AssetId, u32)> {
        self.overrides.iter().map(|(&asset, &bps)| (asset, bps)).collect()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
