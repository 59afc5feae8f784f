//! Core types used throughout the ledger
//!
//! Identifiers are plain `i64` to match PostgreSQL `BIGSERIAL` columns.

/// Account ID - primary key of `accounts`.
///
/// # Lock ordering
/// Account IDs are totally ordered; the transfer engine relies on that order
/// to acquire row locks deterministically (see [`crate::transfer::ordering`]).
pub type AccountId = i64;

/// Entry ID - primary key of `entries`
pub type EntryId = i64;

/// Transfer ID - primary key of `transfers`
pub type TransferId = i64;

/// Amount in minor currency units (cents).
///
/// Signed: entries carry negative amounts for debits.
pub type Amount = i64;
