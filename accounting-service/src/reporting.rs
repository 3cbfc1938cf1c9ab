use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::ledger::AccountBalance;
use crate::models::AccountType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TrialBalanceRow {
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub debit: Decimal,
    pub credit: Decimal,
}

/// Trial balance as of a date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TrialBalance {
    pub as_of: NaiveDate,
    pub rows: Vec<TrialBalanceRow>,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub is_balanced: bool,
}

/// Net each account's totals into a debit or credit column
///
/// Accounts with no net movement are left out.
#[must_use]
pub fn trial_balance(as_of: NaiveDate, balances: &[AccountBalance]) -> TrialBalance {
    let rows: Vec<TrialBalanceRow> = balances
        .iter()
        .filter_map(|b| {
            let net = b.total_debit - b.total_credit;
            if net.is_zero() {
                return None;
            }
            let (debit, credit) = if net > Decimal::ZERO {
                (net, Decimal::ZERO)
            } else {
                (Decimal::ZERO, -net)
            };
            Some(TrialBalanceRow {
                code: b.code.clone(),
                name: b.name.clone(),
                account_type: b.account_type,
                debit,
                credit,
            })
        })
        .collect();

    let total_debit: Decimal = rows.iter().map(|r| r.debit).sum();
    let total_credit: Decimal = rows.iter().map(|r| r.credit).sum();

    TrialBalance {
        as_of,
        rows,
        total_debit,
        total_credit,
        is_balanced: total_debit == total_credit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn balance(code: &str, t: AccountType, dr: Decimal, cr: Decimal) -> AccountBalance {
        AccountBalance::from_totals(Uuid::new_v4(), code.into(), code.into(), t, dr, cr)
    }

    #[test]
    fn balanced_books() {
        let as_of = NaiveDate::from_ymd_opt(2027, 3, 31).unwrap();
        let tb = trial_balance(
            as_of,
            &[
                balance("1000", AccountType::Asset, dec!(1180), dec!(0)),
                balance("1100", AccountType::Asset, dec!(1180), dec!(1180)),
                balance("4100", AccountType::Income, dec!(0), dec!(1000)),
                balance("2100", AccountType::Liability, dec!(0), dec!(180)),
            ],
        );
        assert_eq!(tb.rows.len(), 3);
        assert_eq!(tb.total_debit, dec!(1180));
        assert_eq!(tb.total_credit, dec!(1180));
        assert!(tb.is_balanced);
    }

    #[test]
    fn single_sided_entries_show_as_unbalanced() {
        let as_of = NaiveDate::from_ymd_opt(2027, 3, 31).unwrap();
        let tb = trial_balance(
            as_of,
            &[balance("5100", AccountType::Expense, dec!(120), dec!(0))],
        );
        assert!(!tb.is_balanced);
    }
}
