//! Transfer Engine
//!
//! Runs one money transfer as a single storage transaction:
//!
//! ```text
//! BEGIN
//!   INSERT transfer (from, to, amount)
//!   INSERT entry    (from, -amount)
//!   INSERT entry    (to,   +amount)
//!   UPDATE balance  (smaller account id first)
//!   UPDATE balance  (larger account id second)
//! COMMIT            -- or ROLLBACK on any error
//! ```
//!
//! The engine holds no mutable state; all coordination between concurrent
//! transfers happens through the store's row locks.

use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::{debug, error, info, warn};

use super::ordering::{LegSide, lock_order};
use crate::models::{TransferParams, TransferResult};
use crate::store::{LedgerError, LedgerResult, LedgerStore, LedgerTx};

/// Money transfer orchestrator
///
/// Generic over the store so the same code runs on PostgreSQL and in memory.
pub struct TransferEngine<S> {
    store: S,
}

impl<S: LedgerStore> TransferEngine<S> {
    /// Create an engine on an injected store handle
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Move `amount` from `from_account_id` to `to_account_id`
    ///
    /// No validation happens here: amount sign, self-transfers and currency
    /// checks belong to the caller (see [`super::TransferService`]). Errors
    /// are returned as the store produced them, after rollback. No retries.
    pub async fn transfer(&self, params: TransferParams) -> LedgerResult<TransferResult> {
        debug!(
            from_account_id = params.from_account_id,
            to_account_id = params.to_account_id,
            amount = params.amount,
            "Transfer started"
        );

        let result = self
            .exec_tx(move |tx| transfer_tx(tx, params).boxed())
            .await;

        match &result {
            Ok(r) => info!(
                transfer_id = r.transfer.id,
                from_account_id = params.from_account_id,
                to_account_id = params.to_account_id,
                amount = params.amount,
                "Transfer committed"
            ),
            Err(e) => warn!(
                from_account_id = params.from_account_id,
                to_account_id = params.to_account_id,
                amount = params.amount,
                error = %e,
                "Transfer failed"
            ),
        }
        result
    }

    /// Run `f` inside one transaction: commit on `Ok`, roll back on `Err`
    ///
    /// A failed rollback is reported together with the original error.
    /// If the returned future is dropped midway, the open transaction is
    /// dropped with it and rolls back.
    pub async fn exec_tx<T, F>(&self, f: F) -> LedgerResult<T>
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut S::Tx) -> BoxFuture<'t, LedgerResult<T>> + Send,
    {
        let mut tx = self.store.begin().await?;
        let outcome = f(&mut tx).await;

        match outcome {
            Ok(value) => {
                tx.commit().await?;
                debug!("Transaction committed");
                Ok(value)
            }
            Err(err) => {
                debug!(error = %err, "Rolling back transaction");
                if let Err(rollback_err) = tx.rollback().await {
                    error!(
                        error = %err,
                        rollback_error = %rollback_err,
                        "Rollback failed"
                    );
                    return Err(LedgerError::with_rollback(err, rollback_err));
                }
                Err(err)
            }
        }
    }
}

/// The four writes of a transfer, all on the same transaction handle
async fn transfer_tx<T: LedgerTx>(
    tx: &mut T,
    params: TransferParams,
) -> LedgerResult<TransferResult> {
    let transfer = tx
        .create_transfer(params.from_account_id, params.to_account_id, params.amount)
        .await?;

    let from_entry = tx
        .create_entry(params.from_account_id, -params.amount)
        .await?;

    let to_entry = tx.create_entry(params.to_account_id, params.amount).await?;

    let [first, second] = lock_order(&params);
    let first_account = tx.add_account_balance(first.account_id, first.delta).await?;
    let second_account = tx
        .add_account_balance(second.account_id, second.delta)
        .await?;

    let (from_account, to_account) = match first.side {
        LegSide::Debit => (first_account, second_account),
        LegSide::Credit => (second_account, first_account),
    };

    Ok(TransferResult {
        transfer,
        from_entry,
        to_entry,
        from_account,
        to_account,
    })
}
