//! Query set for the ledger tables
//!
//! Every function takes any `PgExecutor`, so the same statement runs on the
//! pool (`&PgPool`) or bound to an open transaction (`&mut *tx`).

use sqlx::PgExecutor;

use crate::core_types::{AccountId, Amount, EntryId, TransferId};
use crate::models::{Account, CreateUserParams, Entry, Transfer, User};

// ============================================================================
// Users
// ============================================================================

pub async fn create_user<'e, E: PgExecutor<'e>>(
    executor: E,
    params: &CreateUserParams,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, hashed_password, full_name, email)
        VALUES ($1, $2, $3, $4)
        RETURNING username, hashed_password, full_name, email, password_changed_at, created_at
        "#,
    )
    .bind(&params.username)
    .bind(&params.hashed_password)
    .bind(&params.full_name)
    .bind(&params.email)
    .fetch_one(executor)
    .await
}

pub async fn get_user<'e, E: PgExecutor<'e>>(
    executor: E,
    username: &str,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT username, hashed_password, full_name, email, password_changed_at, created_at
        FROM users WHERE username = $1
        "#,
    )
    .bind(username)
    .fetch_one(executor)
    .await
}

// ============================================================================
// Accounts
// ============================================================================

pub async fn create_account<'e, E: PgExecutor<'e>>(
    executor: E,
    owner: &str,
    balance: Amount,
    currency: &str,
) -> Result<Account, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        r#"
        INSERT INTO accounts (owner, balance, currency)
        VALUES ($1, $2, $3)
        RETURNING id, owner, balance, currency, created_at
        "#,
    )
    .bind(owner)
    .bind(balance)
    .bind(currency)
    .fetch_one(executor)
    .await
}

/// Fails with `RowNotFound` if the account does not exist
pub async fn get_account<'e, E: PgExecutor<'e>>(
    executor: E,
    id: AccountId,
) -> Result<Account, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        "SELECT id, owner, balance, currency, created_at FROM accounts WHERE id = $1",
    )
    .bind(id)
    .fetch_one(executor)
    .await
}

/// Read an account and hold its row lock until the transaction ends
///
/// `FOR NO KEY UPDATE` does not conflict with the `KEY SHARE` locks taken by
/// foreign-key checks on `entries` / `transfers` inserts.
pub async fn get_account_for_update<'e, E: PgExecutor<'e>>(
    executor: E,
    id: AccountId,
) -> Result<Account, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        r#"
        SELECT id, owner, balance, currency, created_at FROM accounts
        WHERE id = $1
        FOR NO KEY UPDATE
        "#,
    )
    .bind(id)
    .fetch_one(executor)
    .await
}

pub async fn list_accounts<'e, E: PgExecutor<'e>>(
    executor: E,
    owner: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        r#"
        SELECT id, owner, balance, currency, created_at FROM accounts
        WHERE ($1::VARCHAR IS NULL OR owner = $1)
        ORDER BY id
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(owner)
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await
}

pub async fn update_account<'e, E: PgExecutor<'e>>(
    executor: E,
    id: AccountId,
    balance: Amount,
) -> Result<Account, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        r#"
        UPDATE accounts SET balance = $2
        WHERE id = $1
        RETURNING id, owner, balance, currency, created_at
        "#,
    )
    .bind(id)
    .bind(balance)
    .fetch_one(executor)
    .await
}

/// Locked increment of an account balance
///
/// The `UPDATE` takes the row lock, reads the committed balance, writes the
/// sum and returns the new row in one statement. Fails with `RowNotFound` if
/// the account does not exist.
pub async fn add_account_balance<'e, E: PgExecutor<'e>>(
    executor: E,
    id: AccountId,
    delta: Amount,
) -> Result<Account, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        r#"
        UPDATE accounts SET balance = balance + $2
        WHERE id = $1
        RETURNING id, owner, balance, currency, created_at
        "#,
    )
    .bind(id)
    .bind(delta)
    .fetch_one(executor)
    .await
}

/// Fails with `RowNotFound` if nothing was deleted
pub async fn delete_account<'e, E: PgExecutor<'e>>(
    executor: E,
    id: AccountId,
) -> Result<(), sqlx::Error> {
    let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;

    if result.rows_affected() == 0 {
        return Err(sqlx::Error::RowNotFound);
    }
    Ok(())
}

// ============================================================================
// Entries
// ============================================================================

pub async fn create_entry<'e, E: PgExecutor<'e>>(
    executor: E,
    account_id: AccountId,
    amount: Amount,
) -> Result<Entry, sqlx::Error> {
    sqlx::query_as::<_, Entry>(
        r#"
        INSERT INTO entries (account_id, amount)
        VALUES ($1, $2)
        RETURNING id, account_id, amount, created_at
        "#,
    )
    .bind(account_id)
    .bind(amount)
    .fetch_one(executor)
    .await
}

pub async fn get_entry<'e, E: PgExecutor<'e>>(
    executor: E,
    id: EntryId,
) -> Result<Entry, sqlx::Error> {
    sqlx::query_as::<_, Entry>(
        "SELECT id, account_id, amount, created_at FROM entries WHERE id = $1",
    )
    .bind(id)
    .fetch_one(executor)
    .await
}

pub async fn list_entries<'e, E: PgExecutor<'e>>(
    executor: E,
    account_id: AccountId,
    limit: i64,
    offset: i64,
) -> Result<Vec<Entry>, sqlx::Error> {
    sqlx::query_as::<_, Entry>(
        r#"
        SELECT id, account_id, amount, created_at FROM entries
        WHERE account_id = $1
        ORDER BY id
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(account_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await
}

// ============================================================================
// Transfers
// ============================================================================

pub async fn create_transfer<'e, E: PgExecutor<'e>>(
    executor: E,
    from_account_id: AccountId,
    to_account_id: AccountId,
    amount: Amount,
) -> Result<Transfer, sqlx::Error> {
    sqlx::query_as::<_, Transfer>(
        r#"
        INSERT INTO transfers (from_account_id, to_account_id, amount)
        VALUES ($1, $2, $3)
        RETURNING id, from_account_id, to_account_id, amount, created_at
        "#,
    )
    .bind(from_account_id)
    .bind(to_account_id)
    .bind(amount)
    .fetch_one(executor)
    .await
}

pub async fn get_transfer<'e, E: PgExecutor<'e>>(
    executor: E,
    id: TransferId,
) -> Result<Transfer, sqlx::Error> {
    sqlx::query_as::<_, Transfer>(
        "SELECT id, from_account_id, to_account_id, amount, created_at FROM transfers WHERE id = $1",
    )
    .bind(id)
    .fetch_one(executor)
    .await
}

pub async fn list_transfers<'e, E: PgExecutor<'e>>(
    executor: E,
    from_account_id: AccountId,
    to_account_id: AccountId,
    limit: i64,
    offset: i64,
) -> Result<Vec<Transfer>, sqlx::Error> {
    sqlx::query_as::<_, Transfer>(
        r#"
        SELECT id, from_account_id, to_account_id, amount, created_at FROM transfers
        WHERE from_account_id = $1 OR to_account_id = $2
        ORDER BY id
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(from_account_id)
    .bind(to_account_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await
}
