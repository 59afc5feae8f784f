//! bank_ledger - Double-Entry Money Transfers
//!
//! Accounts, entries and transfers kept in PostgreSQL, moved between with
//! all-or-nothing transfers that lock balance rows in a fixed order.
//!
//! # Modules
//!
//! - [`core_types`] - Id and amount aliases
//! - [`models`] - User, Account, Entry and Transfer records
//! - [`store`] - Storage traits with PostgreSQL and in-memory backends
//! - [`db`] - Connection pool, schema and the query set
//! - [`transfer`] - Transfer engine, lock ordering and request service
//! - [`validation`] - Transfer request checks
//! - [`config`] / [`logging`] - YAML config and tracing setup

// Core types - must be first!
pub mod core_types;

pub mod models;
pub mod validation;

pub mod config;
pub mod logging;

pub mod db;
pub mod store;
pub mod transfer;

// Convenient re-exports at crate root
pub use core_types::{AccountId, Amount, EntryId, TransferId};
pub use models::{
    Account, CreateUserParams, Entry, Transfer, TransferParams, TransferResult, User,
};
pub use store::{
    ErrorKind, LedgerError, LedgerQueries, LedgerResult, LedgerStore, LedgerTx, MemoryStore,
    PgStore,
};
pub use transfer::{TransferEngine, TransferService};
pub use validation::{Currency, TransferRequest, ValidationError};
