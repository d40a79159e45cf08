//! Peer-to-peer order exchange.
//!
//! ## Architecture
//!
//! - [`OrderBook`]: public resting orders held in slab storage with a
//!   monotonic-id index, a token whitelist, and per-asset fee accrual.
//!   Public orders escrow the offered amount and support partial fills.
//! - Private orders (see [`private`]): signed single-recipient offers
//!   identified by content hash, never stored as mutable state — existence
//!   is a single executed flag per hash.
//! - [`router`]: pure greedy route construction over candidate orders,
//!   cheapest price first, single hop only.
//!
//! Fees are charged on the offered-side payout at the per-asset rate (or
//! the default), and accrue inside the book's escrow account until the
//! controller withdraws them.

pub mod book;
pub mod fees;
pub mod private;
pub mod router;

pub use book::{ExchangeConfig, FillKind, FillRequest, OrderBook, PublicOrder};
pub use fees::{FeeSchedule, DEFAULT_FEE_BPS};
pub use private::{hash_private_order, PrivateOrder, SignatureVerifier};
pub use router::{create_trade_route, TradeRequest};
