//! Private signed orders identified by content hash.
//!
//! ## Identity
//!
//! A private order is never stored as mutable state. Its identity is the
//! SHA-256 digest of the SSZ encoding of `(domain_id, creator, deadline,
//! offered token and amount, wanted token and amount, recipient, creation
//! timestamp)` — the nonce is carried on the order but deliberately outside
//! the digest, so re-signing is never needed. The order book keeps only a
//! set of executed digests: fills are all-or-nothing and happen exactly
//! once.
//!
//! ## Execution
//!
//! The executed flag is checked during validation and set before the
//! transfers run, so a replay against an already-settled digest fails
//! cleanly with no double payout. Signature verification is delegated to
//! the [`SignatureVerifier`] collaborator — the engine consumes only the
//! boolean.

use sha2::{Digest, Sha256};
use ssz_rs::prelude::*;

use crate::error::Error;
use crate::error::Result as FundswapResult;
use crate::exchange::book::OrderBook;
use crate::ledger::TokenLedger;
use crate::types::{Amount, AssetId, FillReceipt, Principal, Timestamp, UserId};

/// A signed, single-recipient, all-or-nothing offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrivateOrder {
    /// Creator-chosen value allowing otherwise-identical orders; not part
    /// of the digest
    pub nonce: u64,

    /// Order creator and signer
    pub creator: UserId,

    /// Expiry timestamp; 0 means no expiry
    pub deadline: Timestamp,

    /// Token the creator gives
    pub offered_token: AssetId,

    /// Full amount the creator gives (no partial fills)
    pub amount_offered: Amount,

    /// Token the creator wants
    pub wanted_token: AssetId,

    /// Full amount the recipient must pay
    pub amount_wanted: Amount,

    /// The only principal allowed to fill
    pub recipient: UserId,

    /// When the order was created; part of the digest so re-issued orders
    /// hash differently
    pub creation_timestamp: Timestamp,
}

/// Digest preimage, SSZ-encoded for deterministic bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
struct DigestPreimage {
    domain_id: u64,
    creator: u64,
    deadline: u64,
    offered_token: u64,
    amount_offered: u128,
    wanted_token: u64,
    amount_wanted: u128,
    recipient: u64,
    creation_timestamp: u64,
}

/// Signature plumbing collaborator. Implementations check that `signer`
/// authorized `digest` with `signature`.
pub trait SignatureVerifier {
    /// Whether the signature binds `signer` to `digest`
    fn verify(&self, signer: Principal, digest: &[u8; 32], signature: &[u8]) -> bool;
}

/// Content hash identifying a private order within one domain.
pub fn hash_private_order(domain_id: u64, order: &PrivateOrder) -> [u8; 32] {
    let preimage = DigestPreimage {
        domain_id,
        creator: order.creator,
        deadline: order.deadline,
        offered_token: order.offered_token,
        amount_offered: order.amount_offered,
        wanted_token: order.wanted_token,
        amount_wanted: order.amount_wanted,
        recipient: order.recipient,
        creation_timestamp: order.creation_timestamp,
    };
    // fixed-size container of uints: serialization cannot fail
    let bytes = ssz_rs::serialize(&preimage).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let result = hasher.finalize();
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&result);
    digest
}

impl OrderBook {
    /// Digest of `order` under this book's domain separator
    pub fn private_order_hash(&self, order: &PrivateOrder) -> [u8; 32] {
        hash_private_order(self.domain_id(), order)
    }

    /// Printable digest, for logs and off-band distribution
    pub fn private_order_hash_hex(&self, order: &PrivateOrder) -> String {
        hex::encode(self.private_order_hash(order))
    }

    /// Whether a digest has been executed (or invalidated)
    pub fn is_private_order_executed(&self, digest: &[u8; 32]) -> bool {
        self.executed_private().contains(digest)
    }

    /// Execute a private order in full.
    ///
    /// Only the named recipient may fill, the supplied digest must match the
    /// recomputed one, and the creator's signature over the digest must
    /// verify. Fees follow the public-order rule: deducted from the
    /// offered-side payout at the offered token's rate.
    #[allow(clippy::too_many_arguments)]
    pub fn fill_private_order(
        &mut self,
        caller: UserId,
        ledger: &mut TokenLedger,
        verifier: &dyn SignatureVerifier,
        order: &PrivateOrder,
        expected_hash: [u8; 32],
        signature: &[u8],
        now: Timestamp,
    ) -> FundswapResult<FillReceipt> {
        let digest = self.private_order_hash(order);
        if digest != expected_hash {
            return Err(Error::InvalidOrderHash);
        }
        if caller != order.recipient {
            return Err(Error::NotARecipient(caller));
        }
        if self.executed_private().contains(&digest) {
            return Err(Error::OrderAlreadyExecuted);
        }
        if order.deadline != 0 && now > order.deadline {
            return Err(Error::OrderExpired {
                deadline: order.deadline,
            });
        }
        if order.offered_token == order.wanted_token {
            return Err(Error::InvalidPath);
        }
        if order.amount_offered == 0 {
            return Err(Error::OfferedAmountIsZero);
        }
        if order.amount_wanted == 0 {
            return Err(Error::WantedAmountIsZero);
        }
        for token in [order.offered_token, order.wanted_token] {
            if !self.is_whitelisted(token) {
                return Err(Error::TokenNotWhitelisted(token));
            }
        }
        if !verifier.verify(order.creator, &digest, signature) {
            return Err(Error::InvalidOrderSignature);
        }

        let fee = self.fees().compute_fee(order.offered_token, order.amount_offered)?;
        let creator_balance = ledger.balance_of(order.offered_token, order.creator);
        if creator_balance < order.amount_offered {
            return Err(Error::InsufficientBalance {
                needed: order.amount_offered,
                available: creator_balance,
            });
        }
        let filler_balance = ledger.balance_of(order.wanted_token, caller);
        if filler_balance < order.amount_wanted {
            return Err(Error::InsufficientBalance {
                needed: order.amount_wanted,
                available: filler_balance,
            });
        }

        // mark executed before moving funds: replays die on the flag
        self.executed_private_mut().insert(digest);

        let account = self.account();
        ledger.transfer(order.wanted_token, caller, order.creator, order.amount_wanted)?;
        ledger.transfer(
            order.offered_token,
            order.creator,
            caller,
            order.amount_offered - fee,
        )?;
        if fee > 0 {
            ledger.transfer(order.offered_token, order.creator, account, fee)?;
        }
        self.fees_mut().accrue(order.offered_token, fee)?;

        tracing::info!(
            digest = %hex::encode(digest),
            creator = order.creator,
            recipient = caller,
            amount_offered = order.amount_offered,
            amount_wanted = order.amount_wanted,
            fee,
            "private order filled"
        );
        Ok(FillReceipt {
            order_id: None,
            amount_paid: order.amount_wanted,
            amount_received: order.amount_offered - fee,
            fee,
        })
    }

    /// Mark an order's digest executed without performing the swap
    /// (cancellation by poisoning). Creator-only.
    pub fn invalidate_private_order(&mut self, caller: UserId, order: &PrivateOrder) -> FundswapResult<()> {
        if caller != order.creator {
            return Err(Error::NotAnOwner(caller));
        }
        let digest = self.private_order_hash(order);
        if self.executed_private().contains(&digest) {
            return Err(Error::OrderAlreadyExecuted);
        }
        self.executed_private_mut().insert(digest);
        tracing::info!(digest = %hex::encode(digest), creator = caller, "private order invalidated");
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
