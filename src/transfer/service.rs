//! Transfer Service
//!
//! Request validation in front of the engine. Storage is only touched after
//! the request passes its field checks.

use tracing::debug;

use super::engine::TransferEngine;
use crate::core_types::AccountId;
use crate::models::{TransferParams, TransferResult};
use crate::store::{LedgerQueries, LedgerResult, LedgerStore};
use crate::validation::{Currency, TransferRequest, check_account_currency};

pub struct TransferService<S> {
    engine: TransferEngine<S>,
}

impl<S: LedgerStore + LedgerQueries> TransferService<S> {
    pub fn new(store: S) -> Self {
        Self {
            engine: TransferEngine::new(store),
        }
    }

    pub fn engine(&self) -> &TransferEngine<S> {
        &self.engine
    }

    /// Validate `req`, check both accounts exist in the requested currency,
    /// then run the transfer
    ///
    /// Balances are not checked for sufficiency.
    pub async fn execute(&self, req: TransferRequest) -> LedgerResult<TransferResult> {
        let currency = req.validate()?;

        self.check_account(req.from_account_id, currency).await?;
        self.check_account(req.to_account_id, currency).await?;

        self.engine
            .transfer(TransferParams::new(
                req.from_account_id,
                req.to_account_id,
                req.amount,
            ))
            .await
    }

    async fn check_account(&self, account_id: AccountId, currency: Currency) -> LedgerResult<()> {
        let account = self.engine.store().get_account(account_id).await?;
        check_account_currency(&account, currency)?;
        debug!(account_id, currency = %currency, "Account accepted for transfer");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateUserParams;
    use crate::store::{ErrorKind, LedgerError, MemoryStore};
    use crate::validation::ValidationError;

    async fn setup() -> (TransferService<MemoryStore>, i64, i64, i64) {
        let store = MemoryStore::new();
        let mut ids = Vec::new();
        for (owner, balance, currency) in [
            ("alice", 100, "USD"),
            ("bob", 50, "USD"),
            ("carol", 70, "EUR"),
        ] {
            store
                .create_user(&CreateUserParams {
                    username: owner.to_string(),
                    hashed_password: "secret".to_string(),
                    full_name: owner.to_string(),
                    email: format!("{}@example.com", owner),
                })
                .await
                .unwrap();
            ids.push(store.create_account(owner, balance, currency).await.unwrap().id);
        }
        (TransferService::new(store), ids[0], ids[1], ids[2])
    }

    fn request(from: i64, to: i64, amount: i64, currency: &str) -> TransferRequest {
        TransferRequest {
            from_account_id: from,
            to_account_id: to,
            amount,
            currency: currency.to_string(),
        }
    }

    #[tokio::test]
    async fn test_execute_valid_transfer() {
        let (service, a, b, _) = setup().await;

        let result = service.execute(request(a, b, 30, "USD")).await.unwrap();

        assert_eq!(result.from_account.balance, 70);
        assert_eq!(result.to_account.balance, 80);
    }

    #[tokio::test]
    async fn test_currency_mismatch_rejected_without_writes() {
        let (service, a, _, eur) = setup().await;

        let err = service.execute(request(a, eur, 10, "USD")).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert!(matches!(
            err,
            LedgerError::Validation(ValidationError::CurrencyMismatch { account_id, .. }) if account_id == eur
        ));
        assert_eq!(service.engine().store().transfer_count(), 0);
    }

    #[tokio::test]
    async fn test_self_transfer_rejected() {
        let (service, a, _, _) = setup().await;

        let err = service.execute(request(a, a, 10, "USD")).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Validation(ValidationError::SameAccount)
        ));
    }

    #[tokio::test]
    async fn test_unknown_account_is_not_found() {
        let (service, a, _, _) = setup().await;

        let err = service.execute(request(404, a, 10, "USD")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_invalid_amount_rejected() {
        let (service, a, b, _) = setup().await;

        let err = service.execute(request(a, b, -1, "USD")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }
}
