use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::AccountType;

/// Read-time balance of one ledger account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AccountBalance {
    pub account_id: Uuid,
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    /// Positive when the account sits on its normal side
    pub balance: Decimal,
}

impl AccountBalance {
    #[must_use]
    pub fn from_totals(
        account_id: Uuid,
        code: String,
        name: String,
        account_type: AccountType,
        total_debit: Decimal,
        total_credit: Decimal,
    ) -> Self {
        Self {
            account_id,
            code,
            name,
            account_type,
            total_debit,
            total_credit,
            balance: account_type.signed_balance(total_debit, total_credit),
        }
    }
}

/// A posted line touching the account, in date order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerMovement {
    pub voucher_id: Uuid,
    pub voucher_number: String,
    pub voucher_date: NaiveDate,
    pub narration: Option<String>,
    pub debit: Decimal,
    pub credit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatementLine {
    pub voucher_id: Uuid,
    pub voucher_number: String,
    pub voucher_date: NaiveDate,
    pub narration: Option<String>,
    pub debit: Decimal,
    pub credit: Decimal,
    pub running_balance: Decimal,
}

/// Account statement over a date range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AccountStatement {
    pub account_id: Uuid,
    pub account_type: AccountType,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub opening_balance: Decimal,
    pub closing_balance: Decimal,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub lines: Vec<StatementLine>,
}

/// Build a running-balance statement
///
/// `opening_balance` is the normal-side balance before `from`; movements
/// must already be ordered by date and entry.
#[must_use]
pub fn build_statement(
    account_id: Uuid,
    account_type: AccountType,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    opening_balance: Decimal,
    movements: Vec<LedgerMovement>,
) -> AccountStatement {
    let mut running = opening_balance;
    let mut total_debit = Decimal::ZERO;
    let mut total_credit = Decimal::ZERO;

    let lines = movements
        .into_iter()
        .map(|m| {
            running += account_type.signed_balance(m.debit, m.credit);
            total_debit += m.debit;
            total_credit += m.credit;
            StatementLine {
                voucher_id: m.voucher_id,
                voucher_number: m.voucher_number,
                voucher_date: m.voucher_date,
                narration: m.narration,
                debit: m.debit,
                credit: m.credit,
                running_balance: running,
            }
        })
        .collect();

    AccountStatement {
        account_id,
        account_type,
        from,
        to,
        opening_balance,
        closing_balance: running,
        total_debit,
        total_credit,
        lines,
    }
}
