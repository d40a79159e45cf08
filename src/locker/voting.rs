//! Non-transferable governance weight.
//!
//! Modeled as a capability-restricted balance ledger rather than a general
//! token: the only operations are mint and burn, both reserved to the single
//! authority (the weighted locker). Transfer-style movement is rejected at
//! the type level by simply not existing.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::types::{Amount, Principal, UserId};

/// Mint/burn-only voting weight ledger.
#[derive(Debug, Clone)]
pub struct VotingWeight {
    authority: Principal,
    balances: HashMap<UserId, Amount>,
    total_supply: Amount,
}

impl VotingWeight {
    /// Create a ledger whose only mint/burn authority is `authority`.
    pub fn new(authority: Principal) -> Self {
        Self {
            authority,
            balances: HashMap::new(),
            total_supply: 0,
        }
    }

    /// Credit `amount` of weight to `user`. Authority-only.
    pub fn mint(&mut self, caller: Principal, user: UserId, amount: Amount) -> Result<()> {
        if caller != self.authority {
            return Err(Error::Unauthorized(caller));
        }
        let balance = self.balance_of(user);
        let after = balance
            .checked_add(amount)
            .ok_or(Error::ArithmeticOverflow)?;
        let total = self
            .total_supply
            .checked_add(amount)
            .ok_or(Error::ArithmeticOverflow)?;
        self.balances.insert(user, after);
        self.total_supply = total;
        Ok(())
    }

    /// Remove `amount` of weight from `user`. Authority-only.
    pub fn burn(&mut self, caller: Principal, user: UserId, amount: Amount) -> Result<()> {
        if caller != self.authority {
            return Err(Error::Unauthorized(caller));
        }
        let balance = self.balance_of(user);
        if balance < amount {
            return Err(Error::InsufficientBalance {
                needed: amount,
                available: balance,
            });
        }
        self.balances.insert(user, balance - amount);
        self.total_supply -= amount;
        Ok(())
    }

    /// Voting weight held by `user`
    pub fn balance_of(&self, user: UserId) -> Amount {
        self.balances.get(&user).copied().unwrap_or(0)
    }

    /// Total outstanding weight
    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
