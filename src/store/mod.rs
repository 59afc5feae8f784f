//! Ledger Storage
//!
//! The transfer engine only talks to storage through these traits:
//!
//! - [`LedgerStore`] hands out transactions
//! - [`LedgerTx`] is the query set bound to one open transaction
//! - [`LedgerQueries`] is the query set on a plain connection, used for
//!   reads and for creating accounts
//!
//! # Storage contract
//!
//! 1. **ACID**: a `LedgerTx` sees no uncommitted writes of other transactions,
//!    and nothing it wrote is visible before `commit`.
//! 2. **Row locks**: `add_account_balance` locks the account row until the
//!    transaction ends, so concurrent adjustments never lose updates.
//! 3. **Drop = rollback**: dropping an open transaction discards its writes
//!    and releases its locks.
//!
//! Backends: [`PgStore`] (PostgreSQL) and [`MemoryStore`] (in-process).

pub mod error;
pub mod memory;
pub mod postgres;

pub use error::{ErrorKind, LedgerError, LedgerResult};
pub use memory::{FailPoints, MemoryStore, MemoryStoreOptions, MemoryTx};
pub use postgres::{PgStore, PgTx};

use async_trait::async_trait;

use crate::core_types::{AccountId, Amount, EntryId, TransferId};
use crate::models::{Account, CreateUserParams, Entry, Transfer, User};

/// Source of storage transactions
#[async_trait]
pub trait LedgerStore: Send + Sync {
    type Tx: LedgerTx;

    /// Open a new transaction
    async fn begin(&self) -> LedgerResult<Self::Tx>;
}

/// Write operations bound to one open transaction
#[async_trait]
pub trait LedgerTx: Send {
    /// Insert a transfer record
    async fn create_transfer(
        &mut self,
        from_account_id: AccountId,
        to_account_id: AccountId,
        amount: Amount,
    ) -> LedgerResult<Transfer>;

    /// Insert a ledger entry
    async fn create_entry(&mut self, account_id: AccountId, amount: Amount) -> LedgerResult<Entry>;

    /// Read an account and hold its row lock until the transaction ends
    ///
    /// For units of work run through `exec_tx` that need to look at a
    /// balance before deciding what to write.
    async fn get_account_for_update(&mut self, account_id: AccountId) -> LedgerResult<Account>;

    /// Locked read-modify-write of an account balance; returns the updated row
    async fn add_account_balance(
        &mut self,
        account_id: AccountId,
        delta: Amount,
    ) -> LedgerResult<Account>;

    async fn commit(self) -> LedgerResult<()>;

    async fn rollback(self) -> LedgerResult<()>;
}

/// Single-row CRUD outside of any explicit transaction
#[async_trait]
pub trait LedgerQueries: Send + Sync {
    async fn create_user(&self, params: &CreateUserParams) -> LedgerResult<User>;

    async fn get_user(&self, username: &str) -> LedgerResult<User>;

    /// Fails with NotFound unless `owner` is an existing username
    async fn create_account(
        &self,
        owner: &str,
        balance: Amount,
        currency: &str,
    ) -> LedgerResult<Account>;

    async fn get_account(&self, id: AccountId) -> LedgerResult<Account>;

    /// Accounts ordered by id, optionally filtered by owner
    async fn list_accounts(
        &self,
        owner: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> LedgerResult<Vec<Account>>;

    /// Overwrite an account balance
    async fn update_account(&self, id: AccountId, balance: Amount) -> LedgerResult<Account>;

    /// Fails with `StillReferenced` while entries or transfers point at the
    /// account, including ones not yet committed
    async fn delete_account(&self, id: AccountId) -> LedgerResult<()>;

    async fn get_entry(&self, id: EntryId) -> LedgerResult<Entry>;

    async fn list_entries(
        &self,
        account_id: AccountId,
        limit: i64,
        offset: i64,
    ) -> LedgerResult<Vec<Entry>>;

    async fn get_transfer(&self, id: TransferId) -> LedgerResult<Transfer>;

    /// Transfers sent by `from_account_id` or received by `to_account_id`,
    /// ordered by id
    async fn list_transfers(
        &self,
        from_account_id: AccountId,
        to_account_id: AccountId,
        limit: i64,
        offset: i64,
    ) -> LedgerResult<Vec<Transfer>>;
}
