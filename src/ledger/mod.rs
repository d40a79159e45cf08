//! Execution-environment collaborators: token balances and access control.
//!
//! The engine treats token custody and authorization as synchronous,
//! atomic collaborators. [`TokenLedger`] stands in
//! for the token-transfer substrate; [`AccessControl`] models the
//! controller-plus-roles capability table that every privileged entry point
//! re-checks on each call.

pub mod access;
pub mod tokens;

pub use access::{AccessControl, Role};
pub use tokens::TokenLedger;
