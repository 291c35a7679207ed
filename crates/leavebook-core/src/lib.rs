//! Core types and trait definitions for the Leavebook leave engine.
//!
//! No HTTP or database dependencies live here.
//! Everything here is either plain data or a pure decision function; the
//! storage backends apply those decisions inside their own transactions.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod authz;
pub mod calendar;
pub mod directory;
pub mod eligibility;
pub mod error;
pub mod escalation;
pub mod ledger;
pub mod lifecycle;
pub mod notify;
pub mod registry;
pub mod request;
pub mod store;

pub use error::{Error, Result};

/// Directory-assigned user identifier.
pub type UserId = i64;
/// Tenant identifier.
pub type CompanyId = i64;
/// Registry-assigned leave type identifier.
pub type LeaveTypeId = i64;
