//! PostgreSQL ledger store
//!
//! Thin binding of [`crate::db::queries`] to the storage traits. A [`PgTx`]
//! owns one `sqlx::Transaction`; every write goes through `&mut *self.tx`, so
//! nothing a transfer does can leak onto an un-transacted pool connection.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use super::{LedgerError, LedgerQueries, LedgerResult, LedgerStore, LedgerTx};
use crate::core_types::{AccountId, Amount, EntryId, TransferId};
use crate::db::queries;
use crate::models::{Account, CreateUserParams, Entry, Transfer, User};

/// PostgreSQL SQLSTATE: foreign_key_violation
const SQLSTATE_FOREIGN_KEY_VIOLATION: &str = "23503";

/// Ledger store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Open PostgreSQL transaction
///
/// Dropping it without `commit` rolls back (sqlx queues the `ROLLBACK` on the
/// connection before it returns to the pool).
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerStore for PgStore {
    type Tx = PgTx;

    async fn begin(&self) -> LedgerResult<PgTx> {
        let tx = self.pool.begin().await?;
        debug!("PostgreSQL transaction started");
        Ok(PgTx { tx })
    }
}

#[async_trait]
impl LedgerTx for PgTx {
    async fn create_transfer(
        &mut self,
        from_account_id: AccountId,
        to_account_id: AccountId,
        amount: Amount,
    ) -> LedgerResult<Transfer> {
        Ok(queries::create_transfer(&mut *self.tx, from_account_id, to_account_id, amount).await?)
    }

    async fn create_entry(&mut self, account_id: AccountId, amount: Amount) -> LedgerResult<Entry> {
        Ok(queries::create_entry(&mut *self.tx, account_id, amount).await?)
    }

    async fn get_account_for_update(&mut self, account_id: AccountId) -> LedgerResult<Account> {
        Ok(queries::get_account_for_update(&mut *self.tx, account_id).await?)
    }

    async fn add_account_balance(
        &mut self,
        account_id: AccountId,
        delta: Amount,
    ) -> LedgerResult<Account> {
        Ok(queries::add_account_balance(&mut *self.tx, account_id, delta).await?)
    }

    async fn commit(self) -> LedgerResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> LedgerResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl LedgerQueries for PgStore {
    async fn create_user(&self, params: &CreateUserParams) -> LedgerResult<User> {
        Ok(queries::create_user(&self.pool, params).await?)
    }

    async fn get_user(&self, username: &str) -> LedgerResult<User> {
        Ok(queries::get_user(&self.pool, username).await?)
    }

    async fn create_account(
        &self,
        owner: &str,
        balance: Amount,
        currency: &str,
    ) -> LedgerResult<Account> {
        Ok(queries::create_account(&self.pool, owner, balance, currency).await?)
    }

    async fn get_account(&self, id: AccountId) -> LedgerResult<Account> {
        Ok(queries::get_account(&self.pool, id).await?)
    }

    async fn list_accounts(
        &self,
        owner: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> LedgerResult<Vec<Account>> {
        Ok(queries::list_accounts(&self.pool, owner, limit, offset).await?)
    }

    async fn update_account(&self, id: AccountId, balance: Amount) -> LedgerResult<Account> {
        Ok(queries::update_account(&self.pool, id, balance).await?)
    }

    async fn delete_account(&self, id: AccountId) -> LedgerResult<()> {
        match queries::delete_account(&self.pool, id).await {
            Err(sqlx::Error::Database(db_err))
                if db_err.code().as_deref() == Some(SQLSTATE_FOREIGN_KEY_VIOLATION) =>
            {
                debug!(account_id = id, error = %db_err, "Account still referenced");
                Err(LedgerError::StillReferenced {
                    entity: "account",
                    id,
                })
            }
            result => Ok(result?),
        }
    }

    async fn get_entry(&self, id: EntryId) -> LedgerResult<Entry> {
        Ok(queries::get_entry(&self.pool, id).await?)
    }

    async fn list_entries(
        &self,
        account_id: AccountId,
        limit: i64,
        offset: i64,
    ) -> LedgerResult<Vec<Entry>> {
        Ok(queries::list_entries(&self.pool, account_id, limit, offset).await?)
    }

    async fn get_transfer(&self, id: TransferId) -> LedgerResult<Transfer> {
        Ok(queries::get_transfer(&self.pool, id).await?)
    }

    async fn list_transfers(
        &self,
        from_account_id: AccountId,
        to_account_id: AccountId,
        limit: i64,
        offset: i64,
    ) -> LedgerResult<Vec<Transfer>> {
        Ok(queries::list_transfers(&self.pool, from_account_id, to_account_id, limit, offset).await?)
    }
}
