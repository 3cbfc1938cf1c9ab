use database_layer::DocumentSeries;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AccountingError;

/// Account classification in the chart of accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Income,
    Expense,
}

impl AccountType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "ASSET",
            Self::Liability => "LIABILITY",
            Self::Equity => "EQUITY",
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
        }
    }

    /// Assets and expenses grow on the debit side
    #[must_use]
    pub fn is_debit_normal(self) -> bool {
        matches!(self, Self::Asset | Self::Expense)
    }

    /// Balance expressed on the account's normal side
    #[must_use]
    pub fn signed_balance(self, debit: Decimal, credit: Decimal) -> Decimal {
        if self.is_debit_normal() {
            debit - credit
        } else {
            credit - debit
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = AccountingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASSET" => Ok(Self::Asset),
            "LIABILITY" => Ok(Self::Liability),
            "EQUITY" => Ok(Self::Equity),
            "INCOME" | "REVENUE" => Ok(Self::Income),
            "EXPENSE" => Ok(Self::Expense),
            _ => Err(AccountingError::UnknownValue(format!("account type {s}"))),
        }
    }
}

impl TryFrom<String> for AccountType {
    type Error = AccountingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Voucher kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoucherType {
    /// Cash/bank to cash/bank transfer
    Contra,
    Payment,
    Receipt,
    Journal,
}

impl VoucherType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Contra => "CONTRA",
            Self::Payment => "PAYMENT",
            Self::Receipt => "RECEIPT",
            Self::Journal => "JOURNAL",
        }
    }

    /// Numbering series for vouchers of this kind
    #[must_use]
    pub fn series(self) -> DocumentSeries {
        match self {
            Self::Contra => DocumentSeries::ContraVoucher,
            Self::Payment => DocumentSeries::PaymentVoucher,
            Self::Receipt => DocumentSeries::ReceiptVoucher,
            Self::Journal => DocumentSeries::JournalVoucher,
        }
    }
}

impl fmt::Display for VoucherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoucherType {
    type Err = AccountingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CONTRA" => Ok(Self::Contra),
            "PAYMENT" => Ok(Self::Payment),
            "RECEIPT" => Ok(Self::Receipt),
            "JOURNAL" => Ok(Self::Journal),
            _ => Err(AccountingError::UnknownValue(format!("voucher type {s}"))),
        }
    }
}

impl TryFrom<String> for VoucherType {
    type Error = AccountingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Debit/credit indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum EntryType {
    #[serde(rename = "DR")]
    Debit,
    #[serde(rename = "CR")]
    Credit,
}

impl EntryType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debit => "DR",
            Self::Credit => "CR",
        }
    }

    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Debit => Self::Credit,
            Self::Credit => Self::Debit,
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = AccountingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DR" | "DEBIT" => Ok(Self::Debit),
            "CR" | "CREDIT" => Ok(Self::Credit),
            _ => Err(AccountingError::UnknownValue(format!("entry type {s}"))),
        }
    }
}

impl TryFrom<String> for EntryType {
    type Error = AccountingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The parts of a ledger account posting rules look at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRef {
    pub id: Uuid,
    pub code: String,
    pub account_type: AccountType,
    pub is_active: bool,
}

/// Explicit posting line supplied with a voucher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VoucherLineInput {
    pub ledger_account_id: Uuid,
    #[serde(default)]
    pub debit: Decimal,
    #[serde(default)]
    pub credit: Decimal,
    pub memo: Option<String>,
}

/// Voucher as entered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VoucherInput {
    pub voucher_type: VoucherType,
    /// Defaults to the total debit of `ledger_entries` when those are given
    pub amount: Option<Decimal>,
    pub entry_type: EntryType,
    pub ledger_account_id: Option<Uuid>,
    pub counter_account_id: Option<Uuid>,
    #[serde(default)]
    pub ledger_entries: Vec<VoucherLineInput>,
}

/// A line ready to insert into `voucher_entries`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PostingLine {
    pub ledger_account_id: Uuid,
    pub debit: Decimal,
    pub credit: Decimal,
    pub memo: Option<String>,
}

impl PostingLine {
    #[must_use]
    pub fn new(ledger_account_id: Uuid, side: EntryType, amount: Decimal) -> Self {
        let (debit, credit) = match side {
            EntryType::Debit => (amount, Decimal::ZERO),
            EntryType::Credit => (Decimal::ZERO, amount),
        };
        Self {
            ledger_account_id,
            debit,
            credit,
            memo: None,
        }
    }
}

/// Voucher amount and lines after posting rules have run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedVoucher {
    pub amount: Decimal,
    pub lines: Vec<PostingLine>,
}

impl PostedVoucher {
    #[must_use]
    pub fn total_debit(&self) -> Decimal {
        self.lines.iter().map(|l| l.debit).sum()
    }

    #[must_use]
    pub fn total_credit(&self) -> Decimal {
        self.lines.iter().map(|l| l.credit).sum()
    }

    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.total_debit() == self.total_credit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn normal_side_balances() {
        assert_eq!(AccountType::Asset.signed_balance(dec!(100), dec!(30)), dec!(70));
        assert_eq!(AccountType::Income.signed_balance(dec!(10), dec!(250)), dec!(240));
        assert_eq!(AccountType::Expense.signed_balance(dec!(0), dec!(5)), dec!(-5));
    }

    #[test]
    fn entry_type_uses_dr_cr_codes() {
        assert_eq!(serde_json::to_string(&EntryType::Debit).unwrap(), "\"DR\"");
        assert_eq!("credit".parse::<EntryType>(), Ok(EntryType::Credit));
        assert_eq!(EntryType::Debit.opposite(), EntryType::Credit);
    }

    #[test]
    fn voucher_types_map_to_series() {
        assert_eq!(VoucherType::Contra.series().prefix(), "CV");
        assert_eq!(VoucherType::Payment.series().prefix(), "PV");
        assert_eq!(VoucherType::Receipt.series().prefix(), "RV");
        assert_eq!(VoucherType::Journal.series().prefix(), "JE");
    }
}
