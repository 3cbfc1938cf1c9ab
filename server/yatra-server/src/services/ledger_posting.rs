//! Writes vouchers and their entries
//!
//! Both manual vouchers and the automatic postings raised by billing and
//! payments end up in `insert_voucher`. Callers pass the connection of
//! their open transaction so the voucher commits with the business change.

use crate::error::ApiError;
use accounting_service::{
    AccountRef, AccountType, AutoVoucher, EntryType, PostingLine, VoucherType,
};
use chrono::NaiveDate;
use database_layer::next_document_number;
use rust_decimal::Decimal;
use sqlx::PgConnection;
use std::collections::HashMap;
use uuid::Uuid;

/// A voucher ready to be inserted
#[derive(Debug, Clone)]
pub struct NewVoucher {
    pub voucher_type: VoucherType,
    /// Client-supplied number; allocated from the series when absent
    pub voucher_number: Option<String>,
    pub voucher_date: NaiveDate,
    pub amount: Decimal,
    pub entry_type: EntryType,
    pub ledger_account_id: Option<Uuid>,
    pub counter_account_id: Option<Uuid>,
    pub narration: Option<String>,
    pub reference_type: Option<&'static str>,
    pub reference_id: Option<Uuid>,
    pub lines: Vec<PostingLine>,
}

/// Identity of an inserted voucher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertedVoucher {
    pub id: Uuid,
    pub voucher_number: String,
}

/// Load accounts by id for voucher validation
///
/// # Errors
/// Database failures.
pub async fn load_account_refs(
    conn: &mut PgConnection,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, AccountRef>, ApiError> {
    let rows: Vec<(Uuid, String, String, bool)> = sqlx::query_as(
        "SELECT id, code, account_type, is_active FROM ledger_accounts WHERE id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter()
        .map(|(id, code, account_type, is_active)| -> Result<_, ApiError> {
            let account_type: AccountType = account_type.parse()?;
            Ok((
                id,
                AccountRef {
                    id,
                    code,
                    account_type,
                    is_active,
                },
            ))
        })
        .collect()
}

/// Insert a voucher header and its numbered entries
///
/// # Errors
/// Duplicate voucher numbers surface as conflicts; other database
/// failures propagate.
pub async fn insert_voucher(
    conn: &mut PgConnection,
    voucher: &NewVoucher,
    entered_by: Option<Uuid>,
) -> Result<InsertedVoucher, ApiError> {
    let voucher_number = match voucher.voucher_number.as_deref().map(str::trim) {
        Some(number) if !number.is_empty() => number.to_string(),
        _ => {
            next_document_number(
                &mut *conn,
                voucher.voucher_type.series(),
                voucher.voucher_date,
            )
            .await?
        }
    };

    let id: Uuid = sqlx::query_scalar(
        r"
        INSERT INTO vouchers (
            voucher_type, voucher_number, voucher_date, amount, entry_type,
            ledger_account_id, counter_account_id, narration,
            reference_type, reference_id, entered_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING id
        ",
    )
    .bind(voucher.voucher_type.as_str())
    .bind(&voucher_number)
    .bind(voucher.voucher_date)
    .bind(voucher.amount)
    .bind(voucher.entry_type.as_str())
    .bind(voucher.ledger_account_id)
    .bind(voucher.counter_account_id)
    .bind(&voucher.narration)
    .bind(voucher.reference_type)
    .bind(voucher.reference_id)
    .bind(entered_by)
    .fetch_one(&mut *conn)
    .await?;

    for (line_no, line) in (1_i32..).zip(&voucher.lines) {
        sqlx::query(
            r"
            INSERT INTO voucher_entries (voucher_id, line_no, ledger_account_id, debit, credit, memo)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(id)
        .bind(line_no)
        .bind(line.ledger_account_id)
        .bind(line.debit)
        .bind(line.credit)
        .bind(&line.memo)
        .execute(&mut *conn)
        .await?;
    }

    tracing::info!(
        voucher_id = %id,
        voucher_number = %voucher_number,
        voucher_type = %voucher.voucher_type,
        amount = %voucher.amount,
        "Voucher posted"
    );

    Ok(InsertedVoucher { id, voucher_number })
}

/// Resolve an automatic voucher's account codes and insert it
///
/// # Errors
/// `Internal` when the chart of accounts lacks a system account.
pub async fn post_auto_voucher(
    conn: &mut PgConnection,
    auto: &AutoVoucher,
    voucher_date: NaiveDate,
    reference: (&'static str, Uuid),
    entered_by: Option<Uuid>,
) -> Result<InsertedVoucher, ApiError> {
    let codes: Vec<String> = auto
        .lines
        .iter()
        .map(|l| l.account_code.to_string())
        .collect();

    let accounts: HashMap<String, Uuid> =
        sqlx::query_as::<_, (Uuid, String)>("SELECT id, code FROM ledger_accounts WHERE code = ANY($1)")
            .bind(&codes)
            .fetch_all(&mut *conn)
            .await?
            .into_iter()
            .map(|(id, code)| (code, id))
            .collect();

    let lines = auto
        .lines
        .iter()
        .map(|l| {
            let ledger_account_id = accounts.get(l.account_code).copied().ok_or_else(|| {
                ApiError::internal(format!(
                    "System ledger account {} is missing from the chart of accounts",
                    l.account_code
                ))
            })?;
            Ok(PostingLine {
                ledger_account_id,
                debit: l.debit,
                credit: l.credit,
                memo: None,
            })
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    let header_account = lines.first().map(|l| l.ledger_account_id);

    let voucher = NewVoucher {
        voucher_type: auto.voucher_type,
        voucher_number: None,
        voucher_date,
        amount: auto.amount,
        entry_type: EntryType::Debit,
        ledger_account_id: header_account,
        counter_account_id: None,
        narration: Some(auto.narration.clone()),
        reference_type: Some(reference.0),
        reference_id: Some(reference.1),
        lines,
    };

    insert_voucher(conn, &voucher, entered_by).await
}
