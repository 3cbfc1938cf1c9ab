//! Automatic postings against the system chart of accounts
//!
//! Account codes here match the chart seeded by the accounting migration.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{EntryType, VoucherType};

pub const CASH_IN_HAND: &str = "1000";
pub const BANK_ACCOUNT: &str = "1010";
pub const SUNDRY_DEBTORS: &str = "1100";
pub const GST_PAYABLE: &str = "2100";
pub const SERVICE_INCOME: &str = "4000";
pub const TICKET_SALES: &str = "4100";
pub const DISCOUNT_ALLOWED: &str = "5200";

/// A posting line addressed by account code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodedLine {
    pub account_code: &'static str,
    pub debit: Decimal,
    pub credit: Decimal,
}

impl CodedLine {
    fn new(account_code: &'static str, side: EntryType, amount: Decimal) -> Self {
        let (debit, credit) = match side {
            EntryType::Debit => (amount, Decimal::ZERO),
            EntryType::Credit => (Decimal::ZERO, amount),
        };
        Self {
            account_code,
            debit,
            credit,
        }
    }
}

/// An automatic voucher ready to be resolved and inserted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutoVoucher {
    pub voucher_type: VoucherType,
    pub amount: Decimal,
    pub narration: String,
    pub lines: Vec<CodedLine>,
}

/// Amounts of a billing that hit the books
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingAmounts {
    pub ticket_value: Decimal,
    pub service_charge: Decimal,
    pub gst_amount: Decimal,
    pub discount: Decimal,
    pub total_amount: Decimal,
}

/// Journal raised when a bill is generated
///
/// Debtors are debited with the bill total. Fare, service charge and GST
/// are credited to their accounts and any discount is debited as an
/// expense. Zero lines are dropped.
#[must_use]
pub fn billing_journal(bill_number: &str, amounts: &BillingAmounts) -> AutoVoucher {
    let lines = [
        CodedLine::new(SUNDRY_DEBTORS, EntryType::Debit, amounts.total_amount),
        CodedLine::new(DISCOUNT_ALLOWED, EntryType::Debit, amounts.discount),
        CodedLine::new(TICKET_SALES, EntryType::Credit, amounts.ticket_value),
        CodedLine::new(SERVICE_INCOME, EntryType::Credit, amounts.service_charge),
        CodedLine::new(GST_PAYABLE, EntryType::Credit, amounts.gst_amount),
    ]
    .into_iter()
    .filter(|l| !(l.debit.is_zero() && l.credit.is_zero()))
    .collect();

    AutoVoucher {
        voucher_type: VoucherType::Journal,
        amount: amounts.total_amount + amounts.discount,
        narration: format!("Billing {bill_number}"),
        lines,
    }
}

/// Reversal of a billing journal when the bill is cancelled
#[must_use]
pub fn billing_reversal(bill_number: &str, amounts: &BillingAmounts) -> AutoVoucher {
    let original = billing_journal(bill_number, amounts);
    AutoVoucher {
        narration: format!("Cancellation of billing {bill_number}"),
        lines: original
            .lines
            .into_iter()
            .map(|l| CodedLine {
                account_code: l.account_code,
                debit: l.credit,
                credit: l.debit,
            })
            .collect(),
        ..original
    }
}

/// Receipt voucher for money collected from a customer
#[must_use]
pub fn customer_receipt(payment_number: &str, amount: Decimal, is_cash: bool) -> AutoVoucher {
    let into = if is_cash { CASH_IN_HAND } else { BANK_ACCOUNT };
    AutoVoucher {
        voucher_type: VoucherType::Receipt,
        amount,
        narration: format!("Payment {payment_number}"),
        lines: vec![
            CodedLine::new(into, EntryType::Debit, amount),
            CodedLine::new(SUNDRY_DEBTORS, EntryType::Credit, amount),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn totals(v: &AutoVoucher) -> (Decimal, Decimal) {
        (
            v.lines.iter().map(|l| l.debit).sum(),
            v.lines.iter().map(|l| l.credit).sum(),
        )
    }

    fn amounts() -> BillingAmounts {
        BillingAmounts {
            ticket_value: dec!(2470),
            service_charge: dec!(150),
            gst_amount: dec!(27),
            discount: dec!(50),
            total_amount: dec!(2597),
        }
    }

    #[test]
    fn billing_journal_balances() {
        let v = billing_journal("BL/2026-27/000001", &amounts());
        let (dr, cr) = totals(&v);
        assert_eq!(dr, cr);
        assert_eq!(dr, v.amount);
        assert_eq!(v.lines.len(), 5);
    }

    #[test]
    fn zero_lines_are_dropped() {
        let v = billing_journal(
            "BL/2026-27/000002",
            &BillingAmounts {
                discount: Decimal::ZERO,
                total_amount: dec!(2647),
                ..amounts()
            },
        );
        assert!(v.lines.iter().all(|l| l.account_code != DISCOUNT_ALLOWED));
        let (dr, cr) = totals(&v);
        assert_eq!(dr, cr);
    }

    #[test]
    fn reversal_swaps_sides() {
        let original = billing_journal("BL/2026-27/000001", &amounts());
        let reversal = billing_reversal("BL/2026-27/000001", &amounts());
        for (o, r) in original.lines.iter().zip(&reversal.lines) {
            assert_eq!(o.debit, r.credit);
            assert_eq!(o.credit, r.debit);
        }
    }

    #[test]
    fn receipt_goes_to_cash_or_bank() {
        let cash = customer_receipt("PT/2026-27/000001", dec!(100), true);
        assert_eq!(cash.lines[0].account_code, CASH_IN_HAND);
        let bank = customer_receipt("PT/2026-27/000002", dec!(100), false);
        assert_eq!(bank.lines[0].account_code, BANK_ACCOUNT);
        let (dr, cr) = totals(&bank);
        assert_eq!(dr, cr);
    }
}
