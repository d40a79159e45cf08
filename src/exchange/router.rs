//! Greedy single-hop trade routing.
//!
//! ## Algorithm
//!
//! 1. Filter candidates to orders offering the destination token for the
//!    source token.
//! 2. Sort ascending by price, `amount_wanted * WAD / amount_offered`
//!    (source cost per destination unit); the sort is stable, so orders at
//!    equal price keep their input order.
//! 3. Accumulate orders until the requested amount is covered — the source
//!    amount for exact-input requests, the destination amount for
//!    exact-output.
//!
//! Routing never silently under-fills: if the candidate set cannot cover
//! the request the whole call fails with `InsufficientLiquidity`. Routes
//! are single-hop only; there is no intermediate-token chaining.

use crate::error::{Error, Result};
use crate::exchange::book::PublicOrder;
use crate::math::{mul_div, WAD};
use crate::types::{Amount, AssetId, OrderId};

/// A routing request over one token pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeRequest {
    /// Spend exactly `source_amount` of the source token
    ExactInput {
        /// Token the trader pays with
        source_token: AssetId,
        /// Token the trader wants to receive
        destination_token: AssetId,
        /// Source amount to spend in full
        source_amount: Amount,
    },
    /// Receive exactly `destination_amount` of the destination token
    ExactOutput {
        /// Token the trader pays with
        source_token: AssetId,
        /// Token the trader wants to receive
        destination_token: AssetId,
        /// Destination amount to acquire in full
        destination_amount: Amount,
    },
}

/// Source cost per destination unit, WAD-scaled
fn price(order: &PublicOrder) -> Result<Amount> {
    mul_div(order.amount_wanted, WAD, order.amount_offered)
}

/// Build the cheapest route covering the request.
///
/// Pure function over the candidate snapshot; the returned ids reference
/// orders in ascending price order. A zero-amount request yields an empty
/// route.
pub fn create_trade_route(
    request: &TradeRequest,
    candidates: &[PublicOrder],
) -> Result<Vec<OrderId>> {
    let (source_token, destination_token, requested, exact_input) = match *request {
        TradeRequest::ExactInput {
            source_token,
            destination_token,
            source_amount,
        } => (source_token, destination_token, source_amount, true),
        TradeRequest::ExactOutput {
            source_token,
            destination_token,
            destination_amount,
        } => (source_token, destination_token, destination_amount, false),
    };
    if requested == 0 {
        return Ok(Vec::new());
    }

    let mut priced: Vec<(Amount, &PublicOrder)> = Vec::new();
    for order in candidates {
        if order.offered_token != destination_token || order.wanted_token != source_token {
            continue;
        }
        if order.amount_offered == 0 || order.amount_wanted == 0 {
            continue;
        }
        priced.push((price(order)?, order));
    }
    // stable: equal-price orders keep candidate order
    priced.sort_by_key(|&(price, _)| price);

    let mut route = Vec::new();
    let mut remaining = requested;
    for (_, order) in priced {
        let capacity = if exact_input {
            order.amount_wanted
        } else {
            order.amount_offered
        };
        route.push(order.order_id);
        if remaining <= capacity {
            remaining = 0;
            break;
        }
        remaining -= capacity;
    }
    if remaining > 0 {
        return Err(Error::InsufficientLiquidity {
            shortfall: remaining,
        });
    }
    Ok(route)
}

// ============================================================================
// Unit Tests
// ============================================================================
