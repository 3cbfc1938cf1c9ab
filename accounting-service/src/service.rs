use rust_decimal::Decimal;
use tracing::debug;
use uuid::Uuid;

use crate::error::{AccountingError, AccountingResult};
use crate::models::{
    AccountRef, AccountType, PostedVoucher, PostingLine, VoucherInput, VoucherLineInput,
    VoucherType,
};

/// Accounting service
pub struct AccountingService;

impl AccountingService {
    /// Create a new accounting service
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Turn a voucher as entered into its amount and posting lines
    ///
    /// `resolve` looks up ledger accounts by id.
    ///
    /// # Errors
    /// `InvalidAccount` for unknown, inactive or misused accounts,
    /// `Unbalanced` for explicit lines or journals that do not balance and
    /// `Validation` for malformed amounts.
    pub fn post_voucher<F>(&self, input: &VoucherInput, resolve: F) -> AccountingResult<PostedVoucher>
    where
        F: Fn(Uuid) -> Option<AccountRef>,
    {
        let posted = if input.ledger_entries.is_empty() {
            post_simple(input, &resolve)?
        } else {
            post_explicit(input, &resolve)?
        };

        debug!(
            voucher_type = %input.voucher_type,
            amount = %posted.amount,
            lines = posted.lines.len(),
            "Voucher posted"
        );
        Ok(posted)
    }
}

impl Default for AccountingService {
    fn default() -> Self {
        Self::new()
    }
}

fn check_amount(amount: Decimal) -> AccountingResult<()> {
    if amount <= Decimal::ZERO {
        return Err(AccountingError::Validation(
            "voucher amount must be greater than zero".to_string(),
        ));
    }
    if amount.round_dp(2) != amount {
        return Err(AccountingError::Validation(
            "voucher amount cannot have more than two decimals".to_string(),
        ));
    }
    Ok(())
}

fn lookup<F>(resolve: &F, id: Uuid) -> AccountingResult<AccountRef>
where
    F: Fn(Uuid) -> Option<AccountRef>,
{
    let account = resolve(id)
        .ok_or_else(|| AccountingError::InvalidAccount(format!("ledger account {id} not found")))?;
    if !account.is_active {
        return Err(AccountingError::InvalidAccount(format!(
            "ledger account {} is inactive",
            account.code
        )));
    }
    Ok(account)
}

fn require_cash_or_bank(account: &AccountRef) -> AccountingResult<()> {
    if account.account_type != AccountType::Asset {
        return Err(AccountingError::InvalidAccount(format!(
            "contra vouchers move money between cash and bank accounts; {} is {}",
            account.code, account.account_type
        )));
    }
    Ok(())
}

fn post_simple<F>(input: &VoucherInput, resolve: &F) -> AccountingResult<PostedVoucher>
where
    F: Fn(Uuid) -> Option<AccountRef>,
{
    let amount = input
        .amount
        .ok_or_else(|| AccountingError::Validation("amount is required".to_string()))?;
    check_amount(amount)?;

    let needs_pair = matches!(input.voucher_type, VoucherType::Contra | VoucherType::Journal);

    let (ledger_id, counter_id) = match (input.ledger_account_id, input.counter_account_id) {
        (None, Some(_)) => {
            return Err(AccountingError::Validation(
                "counter_account_id requires ledger_account_id".to_string(),
            ))
        }
        (Some(a), Some(b)) if a == b => {
            return Err(AccountingError::InvalidAccount(
                "ledger and counter account must differ".to_string(),
            ))
        }
        (_, None) if needs_pair => {
            return Err(AccountingError::Unbalanced {
                debit: amount,
                credit: Decimal::ZERO,
            });
        }
        pair => pair,
    };

    let mut lines = Vec::with_capacity(2);
    if let Some(id) = ledger_id {
        let account = lookup(resolve, id)?;
        if input.voucher_type == VoucherType::Contra {
            require_cash_or_bank(&account)?;
        }
        lines.push(PostingLine::new(account.id, input.entry_type, amount));
    }
    if let Some(id) = counter_id {
        let account = lookup(resolve, id)?;
        if input.voucher_type == VoucherType::Contra {
            require_cash_or_bank(&account)?;
        }
        lines.push(PostingLine::new(account.id, input.entry_type.opposite(), amount));
    }

    Ok(PostedVoucher { amount, lines })
}

fn post_explicit<F>(input: &VoucherInput, resolve: &F) -> AccountingResult<PostedVoucher>
where
    F: Fn(Uuid) -> Option<AccountRef>,
{
    let mut lines = Vec::with_capacity(input.ledger_entries.len());
    for (idx, entry) in input.ledger_entries.iter().enumerate() {
        lines.push(explicit_line(idx, entry, input.voucher_type, resolve)?);
    }

    let posted = PostedVoucher {
        amount: Decimal::ZERO,
        lines,
    };
    let debit = posted.total_debit();
    let credit = posted.total_credit();
    if debit != credit {
        return Err(AccountingError::Unbalanced { debit, credit });
    }

    let amount = match input.amount {
        Some(a) if a != debit => {
            return Err(AccountingError::Validation(format!(
                "amount {a} does not match line total {debit}"
            )))
        }
        _ => debit,
    };
    check_amount(amount)?;

    Ok(PostedVoucher { amount, ..posted })
}

fn explicit_line<F>(
    idx: usize,
    entry: &VoucherLineInput,
    voucher_type: VoucherType,
    resolve: &F,
) -> AccountingResult<PostingLine>
where
    F: Fn(Uuid) -> Option<AccountRef>,
{
    let line_no = idx + 1;
    if entry.debit < Decimal::ZERO || entry.credit < Decimal::ZERO {
        return Err(AccountingError::Validation(format!(
            "line {line_no}: amounts cannot be negative"
        )));
    }
    let one_sided = (entry.debit > Decimal::ZERO) != (entry.credit > Decimal::ZERO);
    if !one_sided {
        return Err(AccountingError::Validation(format!(
            "line {line_no}: exactly one of debit or credit must be non-zero"
        )));
    }

    let account = lookup(resolve, entry.ledger_account_id)?;
    if voucher_type == VoucherType::Contra {
        require_cash_or_bank(&account)?;
    }

    Ok(PostingLine {
        ledger_account_id: account.id,
        debit: entry.debit,
        credit: entry.credit,
        memo: entry.memo.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntryType;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    struct Chart {
        accounts: HashMap<Uuid, AccountRef>,
    }

    impl Chart {
        fn new() -> Self {
            Self {
                accounts: HashMap::new(),
            }
        }

        fn add(&mut self, code: &str, account_type: AccountType, is_active: bool) -> Uuid {
            let id = Uuid::new_v4();
            self.accounts.insert(
                id,
                AccountRef {
                    id,
                    code: code.to_string(),
                    account_type,
                    is_active,
                },
            );
            id
        }

        fn resolver(&self) -> impl Fn(Uuid) -> Option<AccountRef> + '_ {
            |id| self.accounts.get(&id).cloned()
        }
    }

    fn simple(
        voucher_type: VoucherType,
        amount: Decimal,
        ledger: Option<Uuid>,
        counter: Option<Uuid>,
    ) -> VoucherInput {
        VoucherInput {
            voucher_type,
            amount: Some(amount),
            entry_type: EntryType::Debit,
            ledger_account_id: ledger,
            counter_account_id: counter,
            ledger_entries: vec![],
        }
    }

    #[test]
    fn counter_account_balances_voucher() {
        let mut chart = Chart::new();
        let cash = chart.add("1000", AccountType::Asset, true);
        let debtors = chart.add("1100", AccountType::Asset, true);

        let input = simple(VoucherType::Receipt, dec!(500), Some(cash), Some(debtors));
        let posted = AccountingService::new()
            .post_voucher(&input, chart.resolver())
            .unwrap();

        assert!(posted.is_balanced());
        assert_eq!(posted.lines.len(), 2);
        assert_eq!(posted.lines[0].debit, dec!(500));
        assert_eq!(posted.lines[1].credit, dec!(500));
    }

    #[test]
    fn single_sided_payment_is_allowed() {
        let mut chart = Chart::new();
        let office = chart.add("5100", AccountType::Expense, true);

        let input = simple(VoucherType::Payment, dec!(120), Some(office), None);
        let posted = AccountingService::new()
            .post_voucher(&input, chart.resolver())
            .unwrap();
        assert_eq!(posted.lines.len(), 1);
        assert!(!posted.is_balanced());

        let memo_only = simple(VoucherType::Payment, dec!(120), None, None);
        let posted = AccountingService::new()
            .post_voucher(&memo_only, chart.resolver())
            .unwrap();
        assert!(posted.lines.is_empty());
    }

    #[test]
    fn journal_needs_both_sides() {
        let mut chart = Chart::new();
        let office = chart.add("5100", AccountType::Expense, true);

        let input = simple(VoucherType::Journal, dec!(120), Some(office), None);
        assert!(matches!(
            AccountingService::new().post_voucher(&input, chart.resolver()),
            Err(AccountingError::Unbalanced { .. })
        ));
    }

    #[test]
    fn contra_only_between_assets() {
        let mut chart = Chart::new();
        let cash = chart.add("1000", AccountType::Asset, true);
        let bank = chart.add("1010", AccountType::Asset, true);
        let income = chart.add("4000", AccountType::Income, true);
        let svc = AccountingService::new();

        let ok = simple(VoucherType::Contra, dec!(1000), Some(bank), Some(cash));
        assert!(svc.post_voucher(&ok, chart.resolver()).is_ok());

        let bad = simple(VoucherType::Contra, dec!(1000), Some(cash), Some(income));
        assert!(matches!(
            svc.post_voucher(&bad, chart.resolver()),
            Err(AccountingError::InvalidAccount(_))
        ));
    }

    #[test]
    fn rejects_unknown_inactive_and_same_accounts() {
        let mut chart = Chart::new();
        let cash = chart.add("1000", AccountType::Asset, true);
        let closed = chart.add("1999", AccountType::Asset, false);
        let svc = AccountingService::new();

        let unknown = simple(VoucherType::Receipt, dec!(1), Some(Uuid::new_v4()), None);
        assert!(svc.post_voucher(&unknown, chart.resolver()).is_err());

        let inactive = simple(VoucherType::Receipt, dec!(1), Some(closed), None);
        assert!(svc.post_voucher(&inactive, chart.resolver()).is_err());

        let same = simple(VoucherType::Receipt, dec!(1), Some(cash), Some(cash));
        assert!(svc.post_voucher(&same, chart.resolver()).is_err());

        let orphan_counter = simple(VoucherType::Receipt, dec!(1), None, Some(cash));
        assert!(svc.post_voucher(&orphan_counter, chart.resolver()).is_err());
    }

    #[test]
    fn explicit_lines_must_balance() {
        let mut chart = Chart::new();
        let debtors = chart.add("1100", AccountType::Asset, true);
        let sales = chart.add("4100", AccountType::Income, true);
        let gst = chart.add("2100", AccountType::Liability, true);
        let svc = AccountingService::new();

        let line = |id, debit, credit| VoucherLineInput {
            ledger_account_id: id,
            debit,
            credit,
            memo: None,
        };

        let mut input = VoucherInput {
            voucher_type: VoucherType::Journal,
            amount: None,
            entry_type: EntryType::Debit,
            ledger_account_id: None,
            counter_account_id: None,
            ledger_entries: vec![
                line(debtors, dec!(1180), dec!(0)),
                line(sales, dec!(0), dec!(1000)),
                line(gst, dec!(0), dec!(180)),
            ],
        };
        let posted = svc.post_voucher(&input, chart.resolver()).unwrap();
        assert_eq!(posted.amount, dec!(1180));
        assert!(posted.is_balanced());

        input.amount = Some(dec!(1000));
        assert!(svc.post_voucher(&input, chart.resolver()).is_err());

        input.amount = None;
        input.ledger_entries.pop();
        assert_eq!(
            svc.post_voucher(&input, chart.resolver()),
            Err(AccountingError::Unbalanced {
                debit: dec!(1180),
                credit: dec!(1000),
            })
        );
    }

    #[test]
    fn explicit_line_must_be_one_sided() {
        let mut chart = Chart::new();
        let a = chart.add("1000", AccountType::Asset, true);
        let input = VoucherInput {
            voucher_type: VoucherType::Journal,
            amount: None,
            entry_type: EntryType::Debit,
            ledger_account_id: None,
            counter_account_id: None,
            ledger_entries: vec![VoucherLineInput {
                ledger_account_id: a,
                debit: dec!(10),
                credit: dec!(10),
                memo: None,
            }],
        };
        assert!(matches!(
            AccountingService::new().post_voucher(&input, chart.resolver()),
            Err(AccountingError::Validation(_))
        ));
    }

    #[test]
    fn amount_must_be_positive_money() {
        let mut chart = Chart::new();
        let cash = chart.add("1000", AccountType::Asset, true);
        let svc = AccountingService::new();
        for bad in [dec!(0), dec!(-5), dec!(1.001)] {
            let input = simple(VoucherType::Payment, bad, Some(cash), None);
            assert!(svc.post_voucher(&input, chart.resolver()).is_err());
        }
    }
}
