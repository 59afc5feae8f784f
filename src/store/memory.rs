//! In-process ledger store
//!
//! Mirrors the PostgreSQL contract closely enough to exercise the transfer
//! engine without a database:
//!
//! - committed rows live behind one short-held `std::sync::Mutex`
//! - every account has its own `tokio::sync::Mutex` acting as the row lock,
//!   held by a [`MemoryTx`] from first `add_account_balance` until the
//!   transaction ends (read committed + row locks)
//! - a transaction buffers its writes and publishes them on `commit`;
//!   dropping it discards them and releases its row locks
//! - ids come from sequences that are not rolled back, like `BIGSERIAL`
//! - inserting an entry or transfer pins the referenced accounts until the
//!   transaction ends (PostgreSQL's `KEY SHARE` lock); `delete_account` on a
//!   pinned account fails instead of waiting
//!
//! [`FailPoints`] inject failures into entry inserts, commit and rollback.

use std::collections::{BTreeMap, HashMap, hash_map};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex as RowLock, OwnedMutexGuard};
use tracing::debug;

use super::{LedgerError, LedgerQueries, LedgerResult, LedgerStore, LedgerTx};
use crate::core_types::{AccountId, Amount, EntryId, TransferId};
use crate::models::{Account, CreateUserParams, Entry, Transfer, User};

/// Injected failures, for exercising rollback paths
#[derive(Debug, Clone, Default)]
pub struct FailPoints {
    /// Fail the N-th entry insert (1-based, counted over the store's lifetime)
    pub entry_insert: Option<usize>,
    /// Fail every commit; the transaction's writes are discarded
    pub commit: bool,
    /// Fail every explicit rollback; the writes are still discarded
    pub rollback: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStoreOptions {
    /// How long `add_account_balance` waits for a row lock. `None` waits forever.
    pub lock_timeout: Option<Duration>,
    pub fail_points: FailPoints,
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<String, User>,
    accounts: BTreeMap<AccountId, Account>,
    entries: BTreeMap<EntryId, Entry>,
    transfers: BTreeMap<TransferId, Transfer>,
    account_seq: i64,
    entry_seq: i64,
    transfer_seq: i64,
    /// Accounts referenced by uncommitted entries / transfers
    pending_refs: HashMap<AccountId, usize>,
}

impl Tables {
    fn account(&self, id: AccountId) -> LedgerResult<&Account> {
        self.accounts.get(&id).ok_or(LedgerError::NotFound {
            entity: "account",
            id,
        })
    }
}

struct Inner {
    tables: Mutex<Tables>,
    row_locks: Mutex<HashMap<AccountId, Arc<RowLock<()>>>>,
    options: MemoryStoreOptions,
    entry_inserts: AtomicUsize,
}

impl Inner {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn row_lock(&self, id: AccountId) -> Arc<RowLock<()>> {
        let mut locks = self.row_locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(id).or_default())
    }

    async fn lock_row(&self, id: AccountId) -> LedgerResult<OwnedMutexGuard<()>> {
        let lock = self.row_lock(id);
        match self.options.lock_timeout {
            Some(timeout) => tokio::time::timeout(timeout, lock.lock_owned())
                .await
                .map_err(|_| LedgerError::LockTimeout(id)),
            None => Ok(lock.lock_owned().await),
        }
    }
}

/// Ledger store kept in process memory
///
/// Cloning shares the same tables.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_options(MemoryStoreOptions::default())
    }

    pub fn with_options(options: MemoryStoreOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                tables: Mutex::new(Tables::default()),
                row_locks: Mutex::new(HashMap::new()),
                options,
                entry_inserts: AtomicUsize::new(0),
            }),
        }
    }

    /// Number of committed transfers
    pub fn transfer_count(&self) -> usize {
        self.inner.tables().transfers.len()
    }

    /// Number of committed entries
    pub fn entry_count(&self) -> usize {
        self.inner.tables().entries.len()
    }
}

/// Accounts pinned by one transaction's inserts, released on drop
struct KeyRefs {
    inner: Arc<Inner>,
    ids: Vec<AccountId>,
}

impl KeyRefs {
    fn hold(&mut self, tables: &mut Tables, id: AccountId) {
        *tables.pending_refs.entry(id).or_default() += 1;
        self.ids.push(id);
    }
}

impl Drop for KeyRefs {
    fn drop(&mut self) {
        if self.ids.is_empty() {
            return;
        }
        let mut tables = self.inner.tables();
        for id in self.ids.drain(..) {
            if let hash_map::Entry::Occupied(mut slot) = tables.pending_refs.entry(id) {
                *slot.get_mut() -= 1;
                if *slot.get() == 0 {
                    slot.remove();
                }
            }
        }
    }
}

/// Open in-memory transaction
pub struct MemoryTx {
    inner: Arc<Inner>,
    key_refs: KeyRefs,
    row_guards: HashMap<AccountId, OwnedMutexGuard<()>>,
    accounts: HashMap<AccountId, Account>,
    entries: Vec<Entry>,
    transfers: Vec<Transfer>,
}

#[async_trait]
impl LedgerStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> LedgerResult<MemoryTx> {
        Ok(MemoryTx {
            inner: Arc::clone(&self.inner),
            key_refs: KeyRefs {
                inner: Arc::clone(&self.inner),
                ids: Vec::new(),
            },
            row_guards: HashMap::new(),
            accounts: HashMap::new(),
            entries: Vec::new(),
            transfers: Vec::new(),
        })
    }
}

#[async_trait]
impl LedgerTx for MemoryTx {
    async fn create_transfer(
        &mut self,
        from_account_id: AccountId,
        to_account_id: AccountId,
        amount: Amount,
    ) -> LedgerResult<Transfer> {
        if amount <= 0 {
            return Err(LedgerError::Storage(
                "transfers.amount violates check constraint (amount > 0)".to_string(),
            ));
        }

        let mut tables = self.inner.tables();
        tables.account(from_account_id)?;
        tables.account(to_account_id)?;
        self.key_refs.hold(&mut tables, from_account_id);
        self.key_refs.hold(&mut tables, to_account_id);

        tables.transfer_seq += 1;
        let transfer = Transfer {
            id: tables.transfer_seq,
            from_account_id,
            to_account_id,
            amount,
            created_at: Utc::now(),
        };
        self.transfers.push(transfer.clone());
        Ok(transfer)
    }

    async fn create_entry(&mut self, account_id: AccountId, amount: Amount) -> LedgerResult<Entry> {
        let n = self.inner.entry_inserts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.inner.options.fail_points.entry_insert == Some(n) {
            return Err(LedgerError::Storage(format!(
                "injected failure on entry insert #{}",
                n
            )));
        }

        let mut tables = self.inner.tables();
        tables.account(account_id)?;
        self.key_refs.hold(&mut tables, account_id);

        tables.entry_seq += 1;
        let entry = Entry {
            id: tables.entry_seq,
            account_id,
            amount,
            created_at: Utc::now(),
        };
        self.entries.push(entry.clone());
        Ok(entry)
    }

    async fn get_account_for_update(&mut self, account_id: AccountId) -> LedgerResult<Account> {
        self.locked_current(account_id).await
    }

    async fn add_account_balance(
        &mut self,
        account_id: AccountId,
        delta: Amount,
    ) -> LedgerResult<Account> {
        let current = self.locked_current(account_id).await?;

        let balance = current
            .balance
            .checked_add(delta)
            .ok_or_else(|| LedgerError::Storage("bigint out of range".to_string()))?;

        let updated = Account { balance, ..current };
        self.accounts.insert(account_id, updated.clone());
        Ok(updated)
    }

    async fn commit(self) -> LedgerResult<()> {
        let MemoryTx {
            inner,
            key_refs,
            row_guards,
            accounts,
            entries,
            transfers,
        } = self;

        if inner.options.fail_points.commit {
            return Err(LedgerError::Storage("injected commit failure".to_string()));
        }

        {
            let mut tables = inner.tables();
            for (id, account) in accounts {
                if let Some(row) = tables.accounts.get_mut(&id) {
                    row.balance = account.balance;
                }
            }
            for entry in entries {
                tables.entries.insert(entry.id, entry);
            }
            for transfer in transfers {
                tables.transfers.insert(transfer.id, transfer);
            }
        }

        // Published before the row locks are released
        drop(row_guards);
        drop(key_refs);
        debug!("Memory transaction committed");
        Ok(())
    }

    async fn rollback(self) -> LedgerResult<()> {
        if self.inner.options.fail_points.rollback {
            return Err(LedgerError::Storage("injected rollback failure".to_string()));
        }
        Ok(())
    }
}

impl MemoryTx {
    /// Take the row lock (once per transaction) and return this
    /// transaction's view of the account
    async fn locked_current(&mut self, account_id: AccountId) -> LedgerResult<Account> {
        if !self.row_guards.contains_key(&account_id) {
            let guard = self.inner.lock_row(account_id).await?;
            self.row_guards.insert(account_id, guard);
        }

        // Row lock held: the committed balance cannot change under us
        match self.accounts.get(&account_id) {
            Some(staged) => Ok(staged.clone()),
            None => Ok(self.inner.tables().account(account_id)?.clone()),
        }
    }
}

fn to_usize(value: i64, what: &str) -> LedgerResult<usize> {
    usize::try_from(value).map_err(|_| LedgerError::Storage(format!("{} must not be negative", what)))
}

fn page<T>(rows: impl Iterator<Item = T>, limit: i64, offset: i64) -> LedgerResult<Vec<T>> {
    Ok(rows
        .skip(to_usize(offset, "OFFSET")?)
        .take(to_usize(limit, "LIMIT")?)
        .collect())
}

#[async_trait]
impl LedgerQueries for MemoryStore {
    async fn create_user(&self, params: &CreateUserParams) -> LedgerResult<User> {
        let mut tables = self.inner.tables();
        if tables.users.contains_key(&params.username) {
            return Err(LedgerError::Storage(
                "duplicate key value violates unique constraint \"users_pkey\"".to_string(),
            ));
        }
        if tables.users.values().any(|u| u.email == params.email) {
            return Err(LedgerError::Storage(
                "duplicate key value violates unique constraint \"users_email_key\"".to_string(),
            ));
        }

        let user = User {
            username: params.username.clone(),
            hashed_password: params.hashed_password.clone(),
            full_name: params.full_name.clone(),
            email: params.email.clone(),
            password_changed_at: DateTime::<Utc>::UNIX_EPOCH,
            created_at: Utc::now(),
        };
        tables.users.insert(user.username.clone(), user.clone());
        Ok(user)
    }

    async fn get_user(&self, username: &str) -> LedgerResult<User> {
        self.inner
            .tables()
            .users
            .get(username)
            .cloned()
            .ok_or_else(|| LedgerError::UserNotFound(username.to_string()))
    }

    async fn create_account(
        &self,
        owner: &str,
        balance: Amount,
        currency: &str,
    ) -> LedgerResult<Account> {
        let mut tables = self.inner.tables();
        if !tables.users.contains_key(owner) {
            return Err(LedgerError::UserNotFound(owner.to_string()));
        }
        tables.account_seq += 1;
        let account = Account {
            id: tables.account_seq,
            owner: owner.to_string(),
            balance,
            currency: currency.to_string(),
            created_at: Utc::now(),
        };
        tables.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn get_account(&self, id: AccountId) -> LedgerResult<Account> {
        Ok(self.inner.tables().account(id)?.clone())
    }

    async fn list_accounts(
        &self,
        owner: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> LedgerResult<Vec<Account>> {
        let tables = self.inner.tables();
        let rows = tables
            .accounts
            .values()
            .filter(|a| owner.is_none_or(|o| a.owner == o))
            .cloned();
        page(rows, limit, offset)
    }

    async fn update_account(&self, id: AccountId, balance: Amount) -> LedgerResult<Account> {
        let _guard = self.inner.lock_row(id).await?;
        let mut tables = self.inner.tables();
        let row = tables.accounts.get_mut(&id).ok_or(LedgerError::NotFound {
            entity: "account",
            id,
        })?;
        row.balance = balance;
        Ok(row.clone())
    }

    async fn delete_account(&self, id: AccountId) -> LedgerResult<()> {
        let _guard = self.inner.lock_row(id).await?;
        let mut tables = self.inner.tables();
        tables.account(id)?;

        let referenced = tables.pending_refs.contains_key(&id)
            || tables.entries.values().any(|e| e.account_id == id)
            || tables
                .transfers
                .values()
                .any(|t| t.from_account_id == id || t.to_account_id == id);
        if referenced {
            return Err(LedgerError::StillReferenced {
                entity: "account",
                id,
            });
        }

        tables.accounts.remove(&id);
        Ok(())
    }

    async fn get_entry(&self, id: EntryId) -> LedgerResult<Entry> {
        self.inner
            .tables()
            .entries
            .get(&id)
            .cloned()
            .ok_or(LedgerError::NotFound { entity: "entry", id })
    }

    async fn list_entries(
        &self,
        account_id: AccountId,
        limit: i64,
        offset: i64,
    ) -> LedgerResult<Vec<Entry>> {
        let tables = self.inner.tables();
        let rows = tables
            .entries
            .values()
            .filter(|e| e.account_id == account_id)
            .cloned();
        page(rows, limit, offset)
    }

    async fn get_transfer(&self, id: TransferId) -> LedgerResult<Transfer> {
        self.inner
            .tables()
            .transfers
            .get(&id)
            .cloned()
            .ok_or(LedgerError::NotFound {
                entity: "transfer",
                id,
            })
    }

    async fn list_transfers(
        &self,
        from_account_id: AccountId,
        to_account_id: AccountId,
        limit: i64,
        offset: i64,
    ) -> LedgerResult<Vec<Transfer>> {
        let tables = self.inner.tables();
        let rows = tables
            .transfers
            .values()
            .filter(|t| t.from_account_id == from_account_id || t.to_account_id == to_account_id)
            .cloned();
        page(rows, limit, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ErrorKind;

    fn user_params(username: &str) -> CreateUserParams {
        CreateUserParams {
            username: username.to_string(),
            hashed_password: format!("hashed-{}", username),
            full_name: username.to_uppercase(),
            email: format!("{}@example.com", username),
        }
    }

    async fn account_for(store: &MemoryStore, owner: &str, balance: Amount) -> Account {
        if store.get_user(owner).await.is_err() {
            store.create_user(&user_params(owner)).await.unwrap();
        }
        store.create_account(owner, balance, "USD").await.unwrap()
    }

    async fn store_with_accounts() -> (MemoryStore, Account, Account) {
        let store = MemoryStore::new();
        let a = account_for(&store, "alice", 100).await;
        let b = account_for(&store, "bob", 50).await;
        (store, a, b)
    }

    #[tokio::test]
    async fn test_writes_invisible_until_commit() {
        let (store, a, b) = store_with_accounts().await;

        let mut tx = store.begin().await.unwrap();
        tx.create_transfer(a.id, b.id, 10).await.unwrap();
        tx.create_entry(a.id, -10).await.unwrap();
        let updated = tx.add_account_balance(a.id, -10).await.unwrap();
        assert_eq!(updated.balance, 90);

        assert_eq!(store.get_account(a.id).await.unwrap().balance, 100);
        assert_eq!(store.transfer_count(), 0);
        assert_eq!(store.entry_count(), 0);

        tx.commit().await.unwrap();

        assert_eq!(store.get_account(a.id).await.unwrap().balance, 90);
        assert_eq!(store.transfer_count(), 1);
        assert_eq!(store.entry_count(), 1);
    }

    #[tokio::test]
    async fn test_dropped_transaction_discards_writes() {
        let (store, a, b) = store_with_accounts().await;

        {
            let mut tx = store.begin().await.unwrap();
            tx.create_transfer(a.id, b.id, 10).await.unwrap();
            tx.add_account_balance(b.id, 10).await.unwrap();
        }

        assert_eq!(store.get_account(b.id).await.unwrap().balance, 50);
        assert_eq!(store.transfer_count(), 0);

        // Row lock was released with the dropped transaction
        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.add_account_balance(b.id, 1).await.unwrap().balance, 51);
    }

    #[tokio::test]
    async fn test_add_balance_accumulates_within_transaction() {
        let (store, a, _) = store_with_accounts().await;

        let mut tx = store.begin().await.unwrap();
        tx.add_account_balance(a.id, 5).await.unwrap();
        let again = tx.add_account_balance(a.id, 7).await.unwrap();
        assert_eq!(again.balance, 112);
        tx.commit().await.unwrap();

        assert_eq!(store.get_account(a.id).await.unwrap().balance, 112);
    }

    #[tokio::test]
    async fn test_row_lock_blocks_second_writer_until_timeout() {
        let store = MemoryStore::with_options(MemoryStoreOptions {
            lock_timeout: Some(Duration::from_millis(50)),
            ..MemoryStoreOptions::default()
        });
        let a = account_for(&store, "alice", 100).await;

        let mut holder = store.begin().await.unwrap();
        holder.add_account_balance(a.id, 1).await.unwrap();

        let mut waiter = store.begin().await.unwrap();
        let err = waiter.add_account_balance(a.id, 1).await.unwrap_err();
        assert!(matches!(err, LedgerError::LockTimeout(id) if id == a.id));
        assert!(err.is_retryable());

        holder.commit().await.unwrap();
        assert_eq!(waiter.add_account_balance(a.id, 1).await.unwrap().balance, 102);
    }

    #[tokio::test]
    async fn test_foreign_keys_enforced() {
        let (store, a, _) = store_with_accounts().await;
        let mut tx = store.begin().await.unwrap();

        let err = tx.create_transfer(a.id, 999, 10).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { entity: "account", id: 999 }));

        let err = tx.create_entry(999, 10).await.unwrap_err();
        assert!(err.is_not_found());

        let err = tx.add_account_balance(999, 10).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_non_positive_transfer_amount_rejected() {
        let (store, a, b) = store_with_accounts().await;
        let mut tx = store.begin().await.unwrap();

        let err = tx.create_transfer(a.id, b.id, 0).await.unwrap_err();
        assert!(matches!(err, LedgerError::Storage(_)));
    }

    #[tokio::test]
    async fn test_entry_insert_fail_point() {
        let store = MemoryStore::with_options(MemoryStoreOptions {
            fail_points: FailPoints {
                entry_insert: Some(2),
                ..FailPoints::default()
            },
            ..MemoryStoreOptions::default()
        });
        let a = account_for(&store, "alice", 100).await;

        let mut tx = store.begin().await.unwrap();
        assert!(tx.create_entry(a.id, 1).await.is_ok());
        assert!(tx.create_entry(a.id, 1).await.is_err());
        assert!(tx.create_entry(a.id, 1).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_and_paging() {
        let store = MemoryStore::new();
        for i in 0..10 {
            let owner = if i % 2 == 0 { "alice" } else { "bob" };
            account_for(&store, owner, i).await;
        }

        let page = store.list_accounts(None, 5, 5).await.unwrap();
        assert_eq!(page.len(), 5);
        assert_eq!(page[0].id, 6);

        let alice = store.list_accounts(Some("alice"), 10, 0).await.unwrap();
        assert_eq!(alice.len(), 5);
        assert!(alice.iter().all(|a| a.owner == "alice"));

        assert!(store.list_accounts(None, -1, 0).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_account_respects_references() {
        let (store, a, b) = store_with_accounts().await;

        let mut tx = store.begin().await.unwrap();
        tx.create_entry(a.id, 5).await.unwrap();
        tx.commit().await.unwrap();

        let err = store.delete_account(a.id).await.unwrap_err();
        assert!(matches!(err, LedgerError::StillReferenced { entity: "account", id } if id == a.id));
        assert!(!err.is_not_found());

        store.delete_account(b.id).await.unwrap();
        assert!(store.get_account(b.id).await.unwrap_err().is_not_found());
        assert!(store.delete_account(b.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_update_account() {
        let (store, a, _) = store_with_accounts().await;

        let updated = store.update_account(a.id, 42).await.unwrap();
        assert_eq!(updated.balance, 42);
        assert_eq!(updated.owner, a.owner);
        assert_eq!(store.get_account(a.id).await.unwrap().balance, 42);
    }

    #[tokio::test]
    async fn test_delete_account_fails_while_entry_uncommitted() {
        let (store, a, _) = store_with_accounts().await;

        let mut tx = store.begin().await.unwrap();
        let entry = tx.create_entry(a.id, 5).await.unwrap();

        let err = store.delete_account(a.id).await.unwrap_err();
        assert!(matches!(err, LedgerError::StillReferenced { .. }));

        tx.commit().await.unwrap();
        let committed = store.get_entry(entry.id).await.unwrap();
        assert_eq!(store.get_account(committed.account_id).await.unwrap().id, a.id);
    }

    #[tokio::test]
    async fn test_rolled_back_references_release_account() {
        let (store, a, b) = store_with_accounts().await;

        let mut tx = store.begin().await.unwrap();
        tx.create_transfer(a.id, b.id, 10).await.unwrap();
        assert!(store.delete_account(b.id).await.is_err());
        tx.rollback().await.unwrap();

        store.delete_account(b.id).await.unwrap();
        assert!(store.get_account(b.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let store = MemoryStore::new();
        let params = user_params("carol");

        let user = store.create_user(&params).await.unwrap();
        assert_eq!(user.username, params.username);
        assert_eq!(user.hashed_password, params.hashed_password);
        assert_eq!(user.full_name, params.full_name);
        assert_eq!(user.email, params.email);
        assert_eq!(user.password_changed_at, DateTime::<Utc>::UNIX_EPOCH);

        assert_eq!(store.get_user("carol").await.unwrap(), user);
        assert!(store.get_user("dave").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_user_uniqueness() {
        let store = MemoryStore::new();
        store.create_user(&user_params("carol")).await.unwrap();

        let err = store.create_user(&user_params("carol")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StorageFailure);

        let same_email = CreateUserParams {
            username: "carol2".to_string(),
            ..user_params("carol")
        };
        assert!(store.create_user(&same_email).await.is_err());
    }

    #[tokio::test]
    async fn test_account_owner_must_be_user() {
        let store = MemoryStore::new();

        let err = store.create_account("nobody", 10, "USD").await.unwrap_err();
        assert!(matches!(err, LedgerError::UserNotFound(ref name) if name == "nobody"));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_get_account_for_update_holds_row_lock() {
        let store = MemoryStore::with_options(MemoryStoreOptions {
            lock_timeout: Some(Duration::from_millis(50)),
            ..MemoryStoreOptions::default()
        });
        let a = account_for(&store, "alice", 100).await;

        let mut reader = store.begin().await.unwrap();
        assert_eq!(reader.get_account_for_update(a.id).await.unwrap().balance, 100);
        assert_eq!(reader.add_account_balance(a.id, -40).await.unwrap().balance, 60);
        assert_eq!(reader.get_account_for_update(a.id).await.unwrap().balance, 60);

        let mut other = store.begin().await.unwrap();
        assert!(other.get_account_for_update(a.id).await.unwrap_err().is_retryable());

        drop(reader);
        assert_eq!(other.get_account_for_update(a.id).await.unwrap().balance, 100);
    }
}
