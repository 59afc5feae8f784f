//! Lock ordering for the two balance updates of a transfer
//!
//! Every transfer locks the account with the smaller id first, whichever way
//! the money flows. Concurrent A→B and B→A transfers therefore queue on the
//! same first lock instead of each holding one row and waiting for the other.

use crate::core_types::{AccountId, Amount};
use crate::models::TransferParams;

/// Which side of the transfer a balance update belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegSide {
    /// Source account, balance decreases
    Debit,
    /// Destination account, balance increases
    Credit,
}

/// One locked balance update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceLeg {
    pub side: LegSide,
    pub account_id: AccountId,
    pub delta: Amount,
}

impl BalanceLeg {
    pub fn debit(params: &TransferParams) -> Self {
        Self {
            side: LegSide::Debit,
            account_id: params.from_account_id,
            delta: -params.amount,
        }
    }

    pub fn credit(params: &TransferParams) -> Self {
        Self {
            side: LegSide::Credit,
            account_id: params.to_account_id,
            delta: params.amount,
        }
    }
}

/// The two balance updates of `params`, in the order their rows must be locked
///
/// Ascending account id. With equal ids both legs hit the same row and the
/// credit goes first.
pub fn lock_order(params: &TransferParams) -> [BalanceLeg; 2] {
    let debit = BalanceLeg::debit(params);
    let credit = BalanceLeg::credit(params);

    if params.from_account_id < params.to_account_id {
        [debit, credit]
    } else {
        [credit, debit]
    }
}
