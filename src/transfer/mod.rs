//! Money Transfers
//!
//! # Architecture
//!
//! - [`TransferEngine`]: one transfer = one storage transaction writing a
//!   transfer record, two entries and two balance updates
//! - [`ordering`]: the lock-ordering rule for the two balance updates
//! - [`TransferService`]: request validation in front of the engine
//!
//! # Safety Invariants
//!
//! 1. **All-or-nothing**: any failing step rolls the whole transaction back
//! 2. **One handle**: all four writes go through the same `LedgerTx`
//! 3. **Lock order**: balance rows are locked in ascending account id
//! 4. **Locked updates only**: balances change via `add_account_balance`,
//!    never read-then-write from application code

pub mod engine;
pub mod ordering;
pub mod service;


pub use engine::TransferEngine;
pub use ordering::{BalanceLeg, LegSide, lock_order};
pub use service::TransferService;
