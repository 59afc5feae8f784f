//! Caller-level validation for transfer requests
//!
//! The transfer engine is a mechanism and accepts anything storage accepts.
//! Policy lives here: positive amounts, distinct accounts, supported
//! currencies, and matching account currencies.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core_types::{AccountId, Amount};
use crate::models::Account;

// ============================================================================
// Validation Errors
// ============================================================================

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error("Amount must be greater than zero: got {0}")]
    InvalidAmount(Amount),

    #[error("Source and destination account cannot be the same")]
    SameAccount,

    #[error("Unsupported currency: '{0}'")]
    UnsupportedCurrency(String),

    #[error("Account {account_id} currency mismatch: {got} vs {expected}")]
    CurrencyMismatch {
        account_id: AccountId,
        expected: Currency,
        got: String,
    },
}

// ============================================================================
// Currency
// ============================================================================

/// Supported currencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Cad,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Usd, Currency::Eur, Currency::Cad];

    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Cad => "CAD",
        }
    }
}

impl FromStr for Currency {
    type Err = ValidationError;

    /// Exact, uppercase ISO code
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "CAD" => Ok(Currency::Cad),
            _ => Err(ValidationError::UnsupportedCurrency(s.to_string())),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// TransferRequest
// ============================================================================

/// Transfer as requested by a caller, before any checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub from_account_id: AccountId,
    pub to_account_id: AccountId,
    pub amount: Amount,
    pub currency: String,
}

impl TransferRequest {
    /// Field-level checks that need no storage access
    ///
    /// Returns the parsed currency.
    pub fn validate(&self) -> Result<Currency, ValidationError> {
        if self.amount <= 0 {
            return Err(ValidationError::InvalidAmount(self.amount));
        }
        if self.from_account_id == self.to_account_id {
            return Err(ValidationError::SameAccount);
        }
        self.currency.parse()
    }
}

/// Reject an account whose currency differs from the request's
pub fn check_account_currency(account: &Account, currency: Currency) -> Result<(), ValidationError> {
    if account.currency != currency.as_str() {
        return Err(ValidationError::CurrencyMismatch {
            account_id: account.id,
            expected: currency,
            got: account.currency.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn request(from: AccountId, to: AccountId, amount: Amount, currency: &str) -> TransferRequest {
        TransferRequest {
            from_account_id: from,
            to_account_id: to,
            amount,
            currency: currency.to_string(),
        }
    }

    #[test]
    fn test_valid_request() {
        assert_eq!(request(1, 2, 10, "EUR").validate(), Ok(Currency::Eur));
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        assert_eq!(
            request(1, 2, 0, "USD").validate(),
            Err(ValidationError::InvalidAmount(0))
        );
        assert_eq!(
            request(1, 2, -5, "USD").validate(),
            Err(ValidationError::InvalidAmount(-5))
        );
    }

    #[test]
    fn test_same_account_rejected() {
        assert_eq!(
            request(3, 3, 10, "USD").validate(),
            Err(ValidationError::SameAccount)
        );
    }

    #[test]
    fn test_currency_parsing() {
        for currency in Currency::ALL {
            assert_eq!(currency.as_str().parse::<Currency>(), Ok(currency));
        }
        assert_eq!(
            "usd".parse::<Currency>(),
            Err(ValidationError::UnsupportedCurrency("usd".to_string()))
        );
        assert!(request(1, 2, 10, "XYZ").validate().is_err());
    }

    #[test]
    fn test_currency_serde_uses_iso_code() {
        assert_eq!(serde_json::to_string(&Currency::Cad).unwrap(), "\"CAD\"");
        let parsed: Currency = serde_json::from_str("\"USD\"").unwrap();
        assert_eq!(parsed, Currency::Usd);
    }

    #[test]
    fn test_account_currency_check() {
        let account = Account {
            id: 8,
            owner: "carol".to_string(),
            balance: 0,
            currency: "EUR".to_string(),
            created_at: Utc::now(),
        };

        assert!(check_account_currency(&account, Currency::Eur).is_ok());
        let err = check_account_currency(&account, Currency::Usd).unwrap_err();
        assert_eq!(err.to_string(), "Account 8 currency mismatch: EUR vs USD");
    }
}
