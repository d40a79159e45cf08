//! Public resting orders: creation, fills, cancellation.
//!
//! ## Storage
//!
//! Orders live in a slab with a `BTreeMap` index from order id to slab key:
//! ids are monotonic and never reused, so index iteration is insertion
//! order — exactly the stable tie-break the router relies on — and lookup
//! by id stays O(log n) with O(1) slab access.
//!
//! ## Fill Arithmetic
//!
//! The filler supplies the *wanted* token and receives the *offered* token:
//!
//! ```text
//! exact input:   amount_out = amount_in * amount_offered / amount_wanted   (floor)
//! exact output:  amount_in  = amount_out * amount_wanted / amount_offered  (ceil)
//! ```
//!
//! The floor on the payout and the ceil on the payment both keep sub-unit
//! remainders on the order's side. The fee comes out of the offered-side
//! payout at the per-asset rate; the creator receives the wanted-side
//! payment in full.
//!
//! ## Batch Atomicity
//!
//! `batch_fill_public_orders` plans every leg against working copies of the
//! order remainders and the filler's balances before committing anything, so
//! a failing leg aborts the whole batch with no partial application.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use slab::Slab;

use crate::error::{Error, Result};
use crate::exchange::fees::FeeSchedule;
use crate::ledger::{AccessControl, TokenLedger};
use crate::types::{Amount, AssetId, FillReceipt, OrderId, Principal, Timestamp, UserId};

/// A resting, anonymously fillable, partially fillable offer.
///
/// Both amounts are the *remaining* amounts and stay above zero while the
/// order is active; the order leaves the active set exactly when either
/// reaches zero or it is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicOrder {
    /// Monotonic identifier, never reused
    pub order_id: OrderId,

    /// Order creator (receives the wanted token, may cancel)
    pub creator: UserId,

    /// Token held in escrow and paid out to fillers
    pub offered_token: AssetId,

    /// Remaining escrowed amount
    pub amount_offered: Amount,

    /// Token the creator wants in exchange
    pub wanted_token: AssetId,

    /// Remaining amount the creator is owed
    pub amount_wanted: Amount,

    /// Expiry timestamp; 0 means no expiry
    pub deadline: Timestamp,
}

/// How a batch-fill leg specifies its size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillKind {
    /// `amount` is the wanted-side amount the filler pays
    ExactInput,
    /// `amount` is the offered-side amount the filler wants to receive
    /// (before the fee deduction)
    ExactOutput,
}

/// One leg of a batch fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillRequest {
    /// Target order
    pub order_id: OrderId,

    /// Exact-input or exact-output sizing
    pub kind: FillKind,

    /// Leg size, interpreted per `kind`
    pub amount: Amount,
}

/// Construction parameters for [`OrderBook`].
#[derive(Debug, Clone, Copy)]
pub struct ExchangeConfig {
    /// Domain separator mixed into private-order digests
    pub domain_id: u64,

    /// Initial default fee in basis points
    pub default_fee_bps: u32,
}

/// Public/private order storage, fee accrual, and settlement.
#[derive(Debug)]
pub struct OrderBook {
    account: Principal,
    access: AccessControl,
    domain_id: u64,
    fees: FeeSchedule,
    whitelist: BTreeSet<AssetId>,
    orders: Slab<PublicOrder>,
    index: BTreeMap<OrderId, usize>,
    executed_private: HashSet<[u8; 32]>,
    next_order_id: OrderId,
}

/// A fully validated fill leg, ready to commit.
struct PlannedFill {
    order_id: OrderId,
    creator: UserId,
    offered_token: AssetId,
    wanted_token: AssetId,
    amount_in: Amount,
    amount_out: Amount,
    fee: Amount,
}

impl OrderBook {
    /// Create an empty book.
    ///
    /// `account` is the book's escrow principal; `controller` administers
    /// the whitelist and fee schedule.
    pub fn new(account: Principal, controller: Principal, config: ExchangeConfig) -> Result<Self> {
        Ok(Self {
            account,
            access: AccessControl::new(controller),
            domain_id: config.domain_id,
            fees: FeeSchedule::new(config.default_fee_bps)?,
            whitelist: BTreeSet::new(),
            orders: Slab::new(),
            index: BTreeMap::new(),
            executed_private: HashSet::new(),
            next_order_id: 0,
        })
    }

    // ========================================================================
    // Whitelist (controller-managed, read by creation and fills)
    // ========================================================================

    /// Allow a token in orders. Controller-only.
    pub fn add_token_to_whitelist(&mut self, caller: Principal, token: AssetId) -> Result<()> {
        self.access.require_controller(caller)?;
        self.whitelist.insert(token);
        Ok(())
    }

    /// Remove a token from the whitelist. Controller-only. Existing orders
    /// become unfillable but stay cancellable.
    pub fn remove_token_from_whitelist(&mut self, caller: Principal, token: AssetId) -> Result<()> {
        self.access.require_controller(caller)?;
        self.whitelist.remove(&token);
        Ok(())
    }

    /// Currently whitelisted tokens
    pub fn whitelisted_tokens(&self) -> Vec<AssetId> {
        self.whitelist.iter().copied().collect()
    }

    /// Whether `token` may appear in new orders and fills
    pub fn is_whitelisted(&self, token: AssetId) -> bool {
        self.whitelist.contains(&token)
    }

    fn require_whitelisted(&self, token: AssetId) -> Result<()> {
        if !self.is_whitelisted(token) {
            return Err(Error::TokenNotWhitelisted(token));
        }
        Ok(())
    }

    // ========================================================================
    // Fees
    // ========================================================================

    /// Replace the default fee. Controller-only.
    pub fn set_default_fee(&mut self, caller: Principal, bps: u32) -> Result<()> {
        self.access.require_controller(caller)?;
        self.fees.set_default_fee(bps)
    }

    /// Set a per-asset fee override. Controller-only.
    pub fn set_fee_for_asset(&mut self, caller: Principal, asset: AssetId, bps: u32) -> Result<()> {
        self.access.require_controller(caller)?;
        self.fees.set_fee_for_asset(asset, bps)
    }

    /// Current default fee in basis points
    pub fn default_fee_bps(&self) -> u32 {
        self.fees.default_fee_bps()
    }

    /// Effective fee rate for `asset`
    pub fn fee_bps_for(&self, asset: AssetId) -> u32 {
        self.fees.fee_bps_for(asset)
    }

    /// `(asset, bps)` pairs for explicitly overridden assets only
    pub fn fees_for_all_assets(&self) -> Vec<(AssetId, u32)> {
        self.fees.fees_for_all_assets()
    }

    /// Fees accrued in `token` and not yet withdrawn
    pub fn collected_fees(&self, token: AssetId) -> Amount {
        self.fees.collected(token)
    }

    /// Withdraw accrued fees, capped at the accrued balance. Controller-only.
    /// Returns the amount paid out.
    pub fn withdraw_fees(
        &mut self,
        caller: Principal,
        ledger: &mut TokenLedger,
        token: AssetId,
        amount: Amount,
    ) -> Result<Amount> {
        self.access.require_controller(caller)?;
        let taken = self.fees.take(token, amount);
        if taken > 0 {
            ledger.transfer(token, self.account, caller, taken)?;
        }
        tracing::info!(token, amount = taken, "fees withdrawn");
        Ok(taken)
    }

    // ========================================================================
    // Public Orders
    // ========================================================================

    /// Create a resting order, escrowing the offered amount.
    #[allow(clippy::too_many_arguments)]
    pub fn create_public_order(
        &mut self,
        caller: UserId,
        ledger: &mut TokenLedger,
        offered_token: AssetId,
        amount_offered: Amount,
        wanted_token: AssetId,
        amount_wanted: Amount,
        deadline: Timestamp,
    ) -> Result<OrderId> {
        if offered_token == wanted_token {
            return Err(Error::InvalidPath);
        }
        if amount_offered == 0 {
            return Err(Error::OfferedAmountIsZero);
        }
        if amount_wanted == 0 {
            return Err(Error::WantedAmountIsZero);
        }
        self.require_whitelisted(offered_token)?;
        self.require_whitelisted(wanted_token)?;

        ledger.transfer(offered_token, caller, self.account, amount_offered)?;

        let order_id = self.next_order_id;
        self.next_order_id += 1;
        let key = self.orders.insert(PublicOrder {
            order_id,
            creator: caller,
            offered_token,
            amount_offered,
            wanted_token,
            amount_wanted,
            deadline,
        });
        self.index.insert(order_id, key);

        tracing::info!(
            order_id,
            creator = caller,
            offered_token,
            amount_offered,
            wanted_token,
            amount_wanted,
            "public order created"
        );
        Ok(order_id)
    }

    /// Look up an active order by id
    pub fn order(&self, order_id: OrderId) -> Option<&PublicOrder> {
        let key = *self.index.get(&order_id)?;
        self.orders.get(key)
    }

    /// Number of active orders
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Active orders offering `offered` for `wanted`, in creation order
    pub fn get_orders_for_pair(&self, offered: AssetId, wanted: AssetId) -> Vec<PublicOrder> {
        self.index
            .values()
            .filter_map(|&key| self.orders.get(key))
            .filter(|order| order.offered_token == offered && order.wanted_token == wanted)
            .copied()
            .collect()
    }

    /// Fill an order completely: pay the whole remaining wanted amount,
    /// receive the whole remaining offered amount minus the fee.
    pub fn fill_public_order(
        &mut self,
        caller: UserId,
        ledger: &mut TokenLedger,
        order_id: OrderId,
        now: Timestamp,
    ) -> Result<FillReceipt> {
        let amount_wanted = self
            .order(order_id)
            .ok_or(Error::UnknownOrder(order_id))?
            .amount_wanted;
        let receipts = self.batch_fill_public_orders(
            caller,
            ledger,
            &[FillRequest {
                order_id,
                kind: FillKind::ExactInput,
                amount: amount_wanted,
            }],
            now,
        )?;
        Ok(receipts[0])
    }

    /// Fill one or more orders, each leg exact-input or exact-output.
    ///
    /// The entire batch is validated before any transfer; on error nothing
    /// has been applied.
    pub fn batch_fill_public_orders(
        &mut self,
        caller: UserId,
        ledger: &mut TokenLedger,
        requests: &[FillRequest],
        now: Timestamp,
    ) -> Result<Vec<FillReceipt>> {
        // --- plan phase: working copies of order remainders ---
        let mut remainders: HashMap<OrderId, (Amount, Amount)> = HashMap::new();
        let mut needed_per_token: HashMap<AssetId, Amount> = HashMap::new();
        let mut plans = Vec::with_capacity(requests.len());

        for request in requests {
            let order = self
                .order(request.order_id)
                .ok_or(Error::UnknownOrder(request.order_id))?;
            if order.deadline != 0 && now > order.deadline {
                return Err(Error::OrderExpired {
                    deadline: order.deadline,
                });
            }
            self.require_whitelisted(order.offered_token)?;
            self.require_whitelisted(order.wanted_token)?;

            let (offered_left, wanted_left) = *remainders
                .entry(order.order_id)
                .or_insert((order.amount_offered, order.amount_wanted));

            let (amount_in, amount_out) = plan_leg(offered_left, wanted_left, request)?;
            let fee = self.fees.compute_fee(order.offered_token, amount_out)?;

            remainders.insert(
                order.order_id,
                (offered_left - amount_out, wanted_left - amount_in),
            );
            let needed = needed_per_token.entry(order.wanted_token).or_insert(0);
            *needed = needed
                .checked_add(amount_in)
                .ok_or(Error::ArithmeticOverflow)?;

            plans.push(PlannedFill {
                order_id: order.order_id,
                creator: order.creator,
                offered_token: order.offered_token,
                wanted_token: order.wanted_token,
                amount_in,
                amount_out,
                fee,
            });
        }

        for (&token, &needed) in &needed_per_token {
            let available = ledger.balance_of(token, caller);
            if available < needed {
                return Err(Error::InsufficientBalance { needed, available });
            }
        }

        // --- commit phase: transfers cannot fail after the checks above ---
        let mut receipts = Vec::with_capacity(plans.len());
        for plan in plans {
            ledger.transfer(plan.wanted_token, caller, plan.creator, plan.amount_in)?;
            ledger.transfer(
                plan.offered_token,
                self.account,
                caller,
                plan.amount_out - plan.fee,
            )?;
            self.fees.accrue(plan.offered_token, plan.fee)?;

            let key = self.index[&plan.order_id];
            let order = &mut self.orders[key];
            order.amount_offered -= plan.amount_out;
            order.amount_wanted -= plan.amount_in;
            let exhausted = order.amount_offered == 0 || order.amount_wanted == 0;
            let residual = if order.amount_wanted == 0 {
                // rounded-up payment settled the whole wanted side; the
                // sub-unit escrow left over goes back to the creator
                order.amount_offered
            } else {
                0
            };
            if exhausted {
                self.remove_order(plan.order_id);
                if residual > 0 {
                    ledger.transfer(plan.offered_token, self.account, plan.creator, residual)?;
                }
            }

            tracing::info!(
                order_id = plan.order_id,
                filler = caller,
                amount_in = plan.amount_in,
                amount_out = plan.amount_out,
                fee = plan.fee,
                exhausted,
                "public order filled"
            );
            receipts.push(FillReceipt {
                order_id: Some(plan.order_id),
                amount_paid: plan.amount_in,
                amount_received: plan.amount_out - plan.fee,
                fee: plan.fee,
            });
        }
        Ok(receipts)
    }

    /// Cancel an order and refund the remaining escrow. Creator-only.
    ///
    /// Always allowed — delisted tokens and expired deadlines never trap the
    /// creator's escrow.
    pub fn cancel_order(
        &mut self,
        caller: UserId,
        ledger: &mut TokenLedger,
        order_id: OrderId,
    ) -> Result<Amount> {
        let order = self.order(order_id).ok_or(Error::UnknownOrder(order_id))?;
        if order.creator != caller {
            return Err(Error::NotAnOwner(caller));
        }
        let (offered_token, refund) = (order.offered_token, order.amount_offered);

        ledger.transfer(offered_token, self.account, caller, refund)?;
        self.remove_order(order_id);

        tracing::info!(order_id, creator = caller, refund, "public order cancelled");
        Ok(refund)
    }

    // ========================================================================
    // Shared internals (also used by the private-order impl)
    // ========================================================================

    /// Domain separator for private-order digests
    pub(crate) fn domain_id(&self) -> u64 {
        self.domain_id
    }

    /// The book's escrow principal
    pub fn account(&self) -> Principal {
        self.account
    }

    pub(crate) fn fees_mut(&mut self) -> &mut FeeSchedule {
        &mut self.fees
    }

    pub(crate) fn fees(&self) -> &FeeSchedule {
        &self.fees
    }

    pub(crate) fn executed_private(&self) -> &HashSet<[u8; 32]> {
        &self.executed_private
    }

    pub(crate) fn executed_private_mut(&mut self) -> &mut HashSet<[u8; 32]> {
        &mut self.executed_private
    }

    fn remove_order(&mut self, order_id: OrderId) -> Option<PublicOrder> {
        let key = self.index.remove(&order_id)?;
        Some(self.orders.remove(key))
    }
}

/// Size one fill leg against the order's remaining amounts.
fn plan_leg(
    offered_left: Amount,
    wanted_left: Amount,
    request: &FillRequest,
) -> Result<(Amount, Amount)> {
    if request.amount == 0 {
        return Err(Error::ZeroAmount);
    }
    if offered_left == 0 || wanted_left == 0 {
        // a prior leg in the same batch exhausted the order
        return Err(Error::UnknownOrder(request.order_id));
    }
    match request.kind {
        FillKind::ExactInput => {
            let amount_in = request.amount;
            if amount_in > wanted_left {
                return Err(Error::InsufficientLiquidity {
                    shortfall: amount_in - wanted_left,
                });
            }
            let amount_out = crate::math::mul_div(amount_in, offered_left, wanted_left)?;
            Ok((amount_in, amount_out))
        }
        FillKind::ExactOutput => {
            let amount_out = request.amount;
            if amount_out > offered_left {
                return Err(Error::InsufficientLiquidity {
                    shortfall: amount_out - offered_left,
                });
            }
            let amount_in = crate::math::mul_div_ceil(amount_out, wanted_left, offered_left)?;
            Ok((amount_in, amount_out))
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
