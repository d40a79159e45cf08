//! Controller and role-based authorization.
//!
//! Ownership is a single mutable controller principal; staged
//! decentralization (owner, then governance, then timelock) is just a chain
//! of `transfer_controller` calls performed by the environment. Fine-grained
//! delegation uses a set-valued role table checked per privileged call —
//! grants are never cached by callers.

use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};
use crate::types::Principal;

/// Capability roles delegated by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// May move stake in and out of a pool and trigger claims on behalf of
    /// users (held by the locker, or by the owner for standalone pools)
    Operator,

    /// May start new reward periods
    PeriodStarter,
}

/// Controller principal plus role membership sets.
#[derive(Debug, Clone)]
pub struct AccessControl {
    controller: Principal,
    grants: HashMap<Role, HashSet<Principal>>,
}

impl AccessControl {
    /// Create a table controlled by `controller`, with no role grants.
    pub fn new(controller: Principal) -> Self {
        Self {
            controller,
            grants: HashMap::new(),
        }
    }

    /// Current controller principal
    pub fn controller(&self) -> Principal {
        self.controller
    }

    /// Hand control to a new principal. Controller-only.
    pub fn transfer_controller(&mut self, caller: Principal, new_controller: Principal) -> Result<()> {
        self.require_controller(caller)?;
        tracing::info!(old = self.controller, new = new_controller, "controller transferred");
        self.controller = new_controller;
        Ok(())
    }

    /// Grant `role` to `who`. Controller-only.
    pub fn grant_role(&mut self, caller: Principal, role: Role, who: Principal) -> Result<()> {
        self.require_controller(caller)?;
        self.grants.entry(role).or_default().insert(who);
        Ok(())
    }

    /// Revoke `role` from `who`. Controller-only.
    pub fn revoke_role(&mut self, caller: Principal, role: Role, who: Principal) -> Result<()> {
        self.require_controller(caller)?;
        if let Some(members) = self.grants.get_mut(&role) {
            members.remove(&who);
        }
        Ok(())
    }

    /// Whether `who` currently holds `role`
    pub fn has_role(&self, role: Role, who: Principal) -> bool {
        self.grants
            .get(&role)
            .map(|members| members.contains(&who))
            .unwrap_or(false)
    }

    /// Fail with [`Error::NotAnOwner`] unless `caller` is the controller.
    pub fn require_controller(&self, caller: Principal) -> Result<()> {
        if caller != self.controller {
            return Err(Error::NotAnOwner(caller));
        }
        Ok(())
    }

    /// Fail with [`Error::Unauthorized`] unless `caller` holds `role`.
    pub fn require_role(&self, role: Role, caller: Principal) -> Result<()> {
        if !self.has_role(role, caller) {
            return Err(Error::Unauthorized(caller));
        }
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: Principal = 1;
    const ALICE: Principal = 2;
    const BOB: Principal = 3;

    #[test]
    fn test_controller_checks() {
        let access = AccessControl::new(OWNER);
        assert!(access.require_controller(OWNER).is_ok());
        assert_eq!(access.require_controller(ALICE), Err(Error::NotAnOwner(ALICE)));
    }

    #[test]
    fn test_grant_and_revoke() {
        let mut access = AccessControl::new(OWNER);

        assert_eq!(
            access.grant_role(ALICE, Role::Operator, BOB),
            Err(Error::NotAnOwner(ALICE)),
        );

        access.grant_role(OWNER, Role::Operator, ALICE).unwrap();
        assert!(access.has_role(Role::Operator, ALICE));
        assert!(access.require_role(Role::Operator, ALICE).is_ok());
        assert_eq!(
            access.require_role(Role::PeriodStarter, ALICE),
            Err(Error::Unauthorized(ALICE)),
        );

        access.revoke_role(OWNER, Role::Operator, ALICE).unwrap();
        assert_eq!(
            access.require_role(Role::Operator, ALICE),
            Err(Error::Unauthorized(ALICE)),
        );
    }

    #[test]
    fn test_transfer_controller() {
        let mut access = AccessControl::new(OWNER);
        access.transfer_controller(OWNER, ALICE).unwrap();
        assert_eq!(access.controller(), ALICE);
        // old controller loses its powers immediately
        assert_eq!(access.require_controller(OWNER), Err(Error::NotAnOwner(OWNER)));
    }
}
