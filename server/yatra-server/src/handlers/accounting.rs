use accounting_service::{
    build_statement, trial_balance, AccountBalance, AccountStatement, AccountType,
    AccountingService, EntryType, LedgerMovement, TrialBalance, VoucherInput, VoucherType,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use database_layer::{AuditFields, DocumentSeries, TransactionManager};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{FromRow, PgConnection, PgExecutor};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::permissions;
use crate::error::{api_success, ApiError, ApiResponse};
use crate::handlers::common::{today, ResourceTable};
use crate::middleware::AuthContext;
use crate::server::YatraServer;
use crate::services::ledger_posting::{insert_voucher, load_account_refs, NewVoucher};
use crate::services::AuditService;
use crate::types::pagination::PaginationParams;
use crate::utils::query_builder::PaginatedQuery;
use crate::validation::RequestValidation;
use crate::{validate_length, validate_required};

/// Chart of accounts entry
#[derive(Debug, Serialize, Deserialize, ToSchema, FromRow, Clone)]
pub struct LedgerAccount {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub account_type: AccountType,
    pub parent_id: Option<Uuid>,
    pub is_active: bool,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: AuditFields,
}

impl ResourceTable for LedgerAccount {
    const TABLE: &'static str = "ledger_accounts";
    const RESOURCE: &'static str = "ledger account";
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAccountRequest {
    #[schema(example = "1020")]
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub parent_id: Option<Uuid>,
}

impl RequestValidation for CreateAccountRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.code, "Account code is required");
        validate_length!(self.code, 1, 20, "Account code must be between 1 and 20 characters");
        validate_required!(self.name, "Account name is required");
        validate_length!(self.name, 1, 200, "Account name must be between 1 and 200 characters");
        Ok(())
    }
}

/// List Accounts Query Parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListAccountsParams {
    pub account_type: Option<AccountType>,
    pub is_active: Option<bool>,
    /// Matches the account name
    pub search: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl ListAccountsParams {
    fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            page_size: self.page_size,
        }
    }

    fn apply(&self, query: &mut PaginatedQuery<'_>) {
        query
            .filter_eq("account_type", self.account_type.map(AccountType::as_str))
            .filter_eq("is_active", self.is_active)
            .filter_ilike("name", self.search.as_deref());
    }
}

/// Voucher header
#[derive(Debug, Serialize, Deserialize, ToSchema, FromRow, Clone)]
pub struct Voucher {
    pub id: Uuid,
    #[sqlx(try_from = "String")]
    pub voucher_type: VoucherType,
    pub voucher_number: String,
    pub voucher_date: NaiveDate,
    pub amount: Decimal,
    #[sqlx(try_from = "String")]
    pub entry_type: EntryType,
    pub ledger_account_id: Option<Uuid>,
    pub counter_account_id: Option<Uuid>,
    pub narration: Option<String>,
    /// Source document of an automatic posting (`billing`, `payment`)
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: AuditFields,
}

impl ResourceTable for Voucher {
    const TABLE: &'static str = "vouchers";
    const RESOURCE: &'static str = "voucher";
}

#[derive(Debug, Serialize, ToSchema, FromRow, Clone)]
pub struct VoucherEntry {
    pub line_no: i32,
    pub ledger_account_id: Uuid,
    pub account_code: String,
    pub account_name: String,
    pub debit: Decimal,
    pub credit: Decimal,
    pub memo: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VoucherDetail {
    #[serde(flatten)]
    pub voucher: Voucher,
    pub entries: Vec<VoucherEntry>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateVoucherRequest {
    /// Allocated from the voucher type's series when omitted
    pub voucher_number: Option<String>,
    /// Defaults to today
    pub voucher_date: Option<NaiveDate>,
    pub narration: Option<String>,
    #[serde(flatten)]
    pub voucher: VoucherInput,
}

impl RequestValidation for CreateVoucherRequest {
    /// Manual numbers must stay out of the `PREFIX/FY/` series namespaces
    fn validate(&self) -> Result<(), ApiError> {
        let Some(number) = self.voucher_number.as_deref() else {
            return Ok(());
        };
        if let Some(series) = DocumentSeries::reserving(number) {
            return Err(ApiError::validation(format!(
                "voucher number '{}' uses the reserved {series}/ series; choose another prefix or omit it",
                number.trim()
            )));
        }
        Ok(())
    }
}

/// List Vouchers Query Parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListVouchersParams {
    pub voucher_type: Option<VoucherType>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    /// Vouchers with a line on this account
    pub account_id: Option<Uuid>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl ListVouchersParams {
    fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            page_size: self.page_size,
        }
    }

    fn apply(&self, query: &mut PaginatedQuery<'_>) {
        query
            .filter_eq("voucher_type", self.voucher_type.map(VoucherType::as_str))
            .filter_gte("voucher_date", self.from_date)
            .filter_lte("voucher_date", self.to_date);

        if let Some(account_id) = self.account_id {
            let builder = query.query_builder();
            builder.push(" AND id IN (SELECT voucher_id FROM voucher_entries WHERE ledger_account_id = ");
            builder.push_bind(account_id);
            builder.push(")");
        }
    }
}

/// Statement Query Parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct StatementParams {
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

/// As-Of Query Parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct AsOfParams {
    /// Defaults to today
    pub as_of: Option<NaiveDate>,
}

/// Totals of every ledger account up to and including `as_of`
///
/// # Errors
/// Database failures.
pub(crate) async fn load_balances<'e, E>(
    executor: E,
    as_of: NaiveDate,
) -> Result<Vec<AccountBalance>, ApiError>
where
    E: PgExecutor<'e>,
{
    let rows: Vec<(Uuid, String, String, String, Decimal, Decimal)> = sqlx::query_as(
        r"
        SELECT a.id, a.code, a.name, a.account_type,
               COALESCE(SUM(e.debit), 0) AS total_debit,
               COALESCE(SUM(e.credit), 0) AS total_credit
        FROM ledger_accounts a
        LEFT JOIN (
            voucher_entries e JOIN vouchers v ON v.id = e.voucher_id AND v.voucher_date <= $1
        ) ON e.ledger_account_id = a.id
        GROUP BY a.id, a.code, a.name, a.account_type
        ORDER BY a.code
        ",
    )
    .bind(as_of)
    .fetch_all(executor)
    .await?;

    rows.into_iter()
        .map(|(id, code, name, account_type, debit, credit)| -> Result<_, ApiError> {
            Ok(AccountBalance::from_totals(
                id,
                code,
                name,
                account_type.parse()?,
                debit,
                credit,
            ))
        })
        .collect()
}

/// Trial balance as of a date
///
/// # Errors
/// Database failures.
pub(crate) async fn compute_trial_balance<'e, E>(
    executor: E,
    as_of: NaiveDate,
) -> Result<TrialBalance, ApiError>
where
    E: PgExecutor<'e>,
{
    let balances = load_balances(executor, as_of).await?;
    Ok(trial_balance(as_of, &balances))
}

/// Journal and contra vouchers whose lines do not balance
///
/// # Errors
/// Database failures.
pub(crate) async fn count_unbalanced_vouchers<'e, E>(executor: E) -> Result<i64, ApiError>
where
    E: PgExecutor<'e>,
{
    Ok(sqlx::query_scalar(
        r"
        SELECT COUNT(*) FROM (
            SELECT v.id
            FROM vouchers v
            JOIN voucher_entries e ON e.voucher_id = v.id
            WHERE v.voucher_type IN ('JOURNAL', 'CONTRA')
            GROUP BY v.id
            HAVING SUM(e.debit) <> SUM(e.credit)
        ) unbalanced
        ",
    )
    .fetch_one(executor)
    .await?)
}

async fn account_totals(
    conn: &mut PgConnection,
    account_id: Uuid,
    before: Option<NaiveDate>,
    up_to: Option<NaiveDate>,
) -> Result<(Decimal, Decimal), ApiError> {
    Ok(sqlx::query_as(
        r"
        SELECT COALESCE(SUM(e.debit), 0), COALESCE(SUM(e.credit), 0)
        FROM voucher_entries e
        JOIN vouchers v ON v.id = e.voucher_id
        WHERE e.ledger_account_id = $1
          AND ($2::date IS NULL OR v.voucher_date < $2)
          AND ($3::date IS NULL OR v.voucher_date <= $3)
        ",
    )
    .bind(account_id)
    .bind(before)
    .bind(up_to)
    .fetch_one(&mut *conn)
    .await?)
}

async fn load_voucher_detail(conn: &mut PgConnection, id: Uuid) -> Result<VoucherDetail, ApiError> {
    let voucher = Voucher::fetch_by_id(&mut *conn, id).await?;
    let entries: Vec<VoucherEntry> = sqlx::query_as(
        r"
        SELECT e.line_no, e.ledger_account_id, a.code AS account_code, a.name AS account_name,
               e.debit, e.credit, e.memo
        FROM voucher_entries e
        JOIN ledger_accounts a ON a.id = e.ledger_account_id
        WHERE e.voucher_id = $1
        ORDER BY e.line_no
        ",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(VoucherDetail { voucher, entries })
}

/// List ledger accounts
#[utoipa::path(
    get,
    path = "/api/v1/accounting/accounts",
    responses(
        (status = 200, description = "Ledger accounts retrieved successfully", body = Vec<LedgerAccount>),
        (status = 403, description = "Forbidden")
    ),
    params(ListAccountsParams),
    tag = "accounting",
    security(("bearer_auth" = []))
)]
pub async fn list_accounts(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Query(params): Query<ListAccountsParams>,
) -> Result<Json<ApiResponse<Vec<LedgerAccount>>>, ApiError> {
    auth.require_permission(permissions::ACCOUNTING_READ)?;
    let pagination = params.pagination();

    let mut count_query = PaginatedQuery::new("SELECT COUNT(*) FROM ledger_accounts WHERE 1=1");
    params.apply(&mut count_query);
    let total: i64 = count_query
        .build_query_scalar()
        .fetch_one(&server.db_pool)
        .await?;

    let mut query = PaginatedQuery::new("SELECT * FROM ledger_accounts WHERE 1=1");
    params.apply(&mut query);
    query.order_by("code", "ASC").paginate(&pagination);
    let accounts: Vec<LedgerAccount> = query.build_query_as().fetch_all(&server.db_pool).await?;

    Ok(Json(pagination.wrap_response(accounts, total)))
}

/// Create a ledger account
#[utoipa::path(
    post,
    path = "/api/v1/accounting/accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Ledger account created", body = LedgerAccount),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Account code already exists")
    ),
    tag = "accounting",
    security(("bearer_auth" = []))
)]
pub async fn create_account(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Json(req): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<ApiResponse<LedgerAccount>>), ApiError> {
    auth.require_permission(permissions::ACCOUNTING_WRITE)?;
    req.validate()?;

    if let Some(parent_id) = req.parent_id {
        let parent = match LedgerAccount::fetch_by_id(&server.db_pool, parent_id).await {
            Err(ApiError::NotFound { .. }) => {
                return Err(ApiError::validation("parent_id does not name a ledger account"))
            }
            other => other?,
        };
        if parent.account_type != req.account_type {
            return Err(ApiError::validation(format!(
                "a {} account cannot sit under {} account {}",
                req.account_type, parent.account_type, parent.code
            )));
        }
    }

    let account = sqlx::query_as::<_, LedgerAccount>(
        r"
        INSERT INTO ledger_accounts (code, name, account_type, parent_id, entered_by)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        ",
    )
    .bind(req.code.trim())
    .bind(req.name.trim())
    .bind(req.account_type.as_str())
    .bind(req.parent_id)
    .bind(auth.user_id)
    .fetch_one(&server.db_pool)
    .await?;

    AuditService::log_quietly(
        &server.db_pool,
        &auth,
        "ledger_account",
        account.id,
        "created",
        Some(json!({ "code": account.code, "account_type": account.account_type })),
    )
    .await;

    tracing::info!(account_id = %account.id, code = %account.code, "Ledger account created");
    Ok((StatusCode::CREATED, Json(api_success(account))))
}

/// Balance of one account, summed from posted lines
#[utoipa::path(
    get,
    path = "/api/v1/accounting/accounts/{id}/balance",
    responses(
        (status = 200, description = "Account balance", body = AccountBalance),
        (status = 404, description = "Ledger account not found")
    ),
    params(("id" = Uuid, Path, description = "Ledger account ID"), AsOfParams),
    tag = "accounting",
    security(("bearer_auth" = []))
)]
pub async fn account_balance(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Query(params): Query<AsOfParams>,
) -> Result<Json<ApiResponse<AccountBalance>>, ApiError> {
    auth.require_permission(permissions::ACCOUNTING_READ)?;
    let mut conn = server.db_pool.acquire().await?;

    let account = LedgerAccount::fetch_by_id(&mut *conn, id).await?;
    let (debit, credit) = account_totals(&mut conn, id, None, params.as_of).await?;

    Ok(Json(api_success(AccountBalance::from_totals(
        account.id,
        account.code,
        account.name,
        account.account_type,
        debit,
        credit,
    ))))
}

/// Running-balance statement of one account
#[utoipa::path(
    get,
    path = "/api/v1/accounting/accounts/{id}/statement",
    responses(
        (status = 200, description = "Account statement", body = AccountStatement),
        (status = 400, description = "Invalid date range"),
        (status = 404, description = "Ledger account not found")
    ),
    params(("id" = Uuid, Path, description = "Ledger account ID"), StatementParams),
    tag = "accounting",
    security(("bearer_auth" = []))
)]
pub async fn account_statement(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Query(params): Query<StatementParams>,
) -> Result<Json<ApiResponse<AccountStatement>>, ApiError> {
    auth.require_permission(permissions::ACCOUNTING_READ)?;
    Ok(Json(api_success(
        statement_for(&server, id, params.from_date, params.to_date).await?,
    )))
}

/// Build an account statement for a date range
///
/// # Errors
/// `Validation` when `from` is after `to`, `NotFound` for unknown accounts.
pub(crate) async fn statement_for(
    server: &YatraServer,
    id: Uuid,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<AccountStatement, ApiError> {
    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err(ApiError::validation("from_date must not be after to_date"));
        }
    }

    let mut conn = server.db_pool.acquire().await?;
    let account = LedgerAccount::fetch_by_id(&mut *conn, id).await?;

    let opening = match from {
        Some(from) => {
            let (debit, credit) = account_totals(&mut conn, id, Some(from), None).await?;
            account.account_type.signed_balance(debit, credit)
        }
        None => Decimal::ZERO,
    };

    let rows: Vec<(Uuid, String, NaiveDate, Option<String>, Decimal, Decimal)> = sqlx::query_as(
        r"
        SELECT v.id, v.voucher_number, v.voucher_date, COALESCE(e.memo, v.narration), e.debit, e.credit
        FROM voucher_entries e
        JOIN vouchers v ON v.id = e.voucher_id
        WHERE e.ledger_account_id = $1
          AND ($2::date IS NULL OR v.voucher_date >= $2)
          AND ($3::date IS NULL OR v.voucher_date <= $3)
        ORDER BY v.voucher_date, v.entered_on, v.voucher_number, e.line_no
        ",
    )
    .bind(id)
    .bind(from)
    .bind(to)
    .fetch_all(&mut *conn)
    .await?;

    let movements = rows
        .into_iter()
        .map(
            |(voucher_id, voucher_number, voucher_date, narration, debit, credit)| LedgerMovement {
                voucher_id,
                voucher_number,
                voucher_date,
                narration,
                debit,
                credit,
            },
        )
        .collect();

    Ok(build_statement(
        account.id,
        account.account_type,
        from,
        to,
        opening,
        movements,
    ))
}

/// List vouchers
#[utoipa::path(
    get,
    path = "/api/v1/accounting/vouchers",
    responses(
        (status = 200, description = "Vouchers retrieved successfully", body = Vec<Voucher>),
        (status = 403, description = "Forbidden")
    ),
    params(ListVouchersParams),
    tag = "accounting",
    security(("bearer_auth" = []))
)]
pub async fn list_vouchers(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Query(params): Query<ListVouchersParams>,
) -> Result<Json<ApiResponse<Vec<Voucher>>>, ApiError> {
    auth.require_permission(permissions::ACCOUNTING_READ)?;
    let pagination = params.pagination();

    let mut count_query = PaginatedQuery::new("SELECT COUNT(*) FROM vouchers WHERE 1=1");
    params.apply(&mut count_query);
    let total: i64 = count_query
        .build_query_scalar()
        .fetch_one(&server.db_pool)
        .await?;

    let mut query = PaginatedQuery::new("SELECT * FROM vouchers WHERE 1=1");
    params.apply(&mut query);
    query
        .order_by("voucher_date DESC, voucher_number", "DESC")
        .paginate(&pagination);
    let vouchers: Vec<Voucher> = query.build_query_as().fetch_all(&server.db_pool).await?;

    Ok(Json(pagination.wrap_response(vouchers, total)))
}

/// Get a voucher with its lines
#[utoipa::path(
    get,
    path = "/api/v1/accounting/vouchers/{id}",
    responses(
        (status = 200, description = "Voucher retrieved successfully", body = VoucherDetail),
        (status = 404, description = "Voucher not found")
    ),
    params(("id" = Uuid, Path, description = "Voucher ID")),
    tag = "accounting",
    security(("bearer_auth" = []))
)]
pub async fn get_voucher(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<VoucherDetail>>, ApiError> {
    auth.require_permission(permissions::ACCOUNTING_READ)?;
    let mut conn = server.db_pool.acquire().await?;
    Ok(Json(api_success(load_voucher_detail(&mut conn, id).await?)))
}

/// Enter a contra, payment, receipt or journal voucher
#[utoipa::path(
    post,
    path = "/api/v1/accounting/vouchers",
    request_body = CreateVoucherRequest,
    responses(
        (status = 201, description = "Voucher posted", body = VoucherDetail),
        (status = 400, description = "Invalid or unbalanced voucher"),
        (status = 409, description = "Voucher number already in use")
    ),
    tag = "accounting",
    security(("bearer_auth" = []))
)]
pub async fn create_voucher(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Json(req): Json<CreateVoucherRequest>,
) -> Result<(StatusCode, Json<ApiResponse<VoucherDetail>>), ApiError> {
    auth.require_permission(permissions::ACCOUNTING_WRITE)?;
    req.validate()?;
    let input = &req.voucher;

    let account_ids: Vec<Uuid> = input
        .ledger_account_id
        .into_iter()
        .chain(input.counter_account_id)
        .chain(input.ledger_entries.iter().map(|l| l.ledger_account_id))
        .collect();

    let mut tx = TransactionManager::new(&server.db_pool)
        .labelled("create_voucher")
        .begin()
        .await?;

    let accounts = load_account_refs(&mut tx, &account_ids).await?;
    let posted = AccountingService::new().post_voucher(input, |id| accounts.get(&id).cloned())?;

    let voucher = NewVoucher {
        voucher_type: input.voucher_type,
        voucher_number: req.voucher_number.clone(),
        voucher_date: req.voucher_date.unwrap_or_else(today),
        amount: posted.amount,
        entry_type: input.entry_type,
        ledger_account_id: input.ledger_account_id,
        counter_account_id: input.counter_account_id,
        narration: req.narration.clone(),
        reference_type: None,
        reference_id: None,
        lines: posted.lines,
    };
    let inserted = insert_voucher(&mut tx, &voucher, Some(auth.user_id)).await?;

    AuditService::log_action(
        &mut *tx,
        &auth,
        "voucher",
        inserted.id,
        "created",
        Some(json!({
            "voucher_number": inserted.voucher_number,
            "voucher_type": input.voucher_type,
            "amount": voucher.amount,
        })),
    )
    .await?;

    let detail = load_voucher_detail(&mut tx, inserted.id).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(api_success(detail))))
}

/// Delete a manually entered voucher
///
/// Automatic postings are reversed through their source document instead.
#[utoipa::path(
    delete,
    path = "/api/v1/accounting/vouchers/{id}",
    responses(
        (status = 204, description = "Voucher deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Voucher not found"),
        (status = 409, description = "Voucher was posted by a billing or payment")
    ),
    params(("id" = Uuid, Path, description = "Voucher ID")),
    tag = "accounting",
    security(("bearer_auth" = []))
)]
pub async fn delete_voucher(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    auth.require_permission(permissions::ACCOUNTING_DELETE)?;

    let mut tx = TransactionManager::new(&server.db_pool)
        .labelled("delete_voucher")
        .begin()
        .await?;

    let voucher = Voucher::fetch_for_update(&mut *tx, id).await?;
    if let Some(source) = &voucher.reference_type {
        return Err(ApiError::conflict(format!(
            "Voucher {} was posted automatically for a {source}; cancel or adjust the {source} instead",
            voucher.voucher_number
        )));
    }

    sqlx::query("DELETE FROM vouchers WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    AuditService::log_action(
        &mut *tx,
        &auth,
        "voucher",
        id,
        "deleted",
        Some(json!({
            "voucher_number": voucher.voucher_number,
            "amount": voucher.amount,
        })),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(voucher_id = %id, voucher_number = %voucher.voucher_number, "Voucher deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Trial balance
#[utoipa::path(
    get,
    path = "/api/v1/accounting/trial-balance",
    responses(
        (status = 200, description = "Trial balance", body = TrialBalance),
        (status = 403, description = "Forbidden")
    ),
    params(AsOfParams),
    tag = "accounting",
    security(("bearer_auth" = []))
)]
pub async fn get_trial_balance(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Query(params): Query<AsOfParams>,
) -> Result<Json<ApiResponse<TrialBalance>>, ApiError> {
    auth.require_permission(permissions::ACCOUNTING_READ)?;
    let as_of = params.as_of.unwrap_or_else(today);
    let report = compute_trial_balance(&server.db_pool, as_of).await?;

    if !report.is_balanced {
        tracing::warn!(
            %as_of,
            total_debit = %report.total_debit,
            total_credit = %report.total_credit,
            "Trial balance does not balance"
        );
    }
    Ok(Json(api_success(report)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voucher_request_flattens_the_entry() {
        let req: CreateVoucherRequest = serde_json::from_value(serde_json::json!({
            "voucher_type": "CONTRA",
            "amount": "2500.00",
            "entry_type": "DR",
            "ledger_account_id": Uuid::nil(),
            "counter_account_id": Uuid::nil(),
            "narration": "Cash deposited"
        }))
        .unwrap();
        assert_eq!(req.voucher.voucher_type, VoucherType::Contra);
        assert_eq!(req.voucher.entry_type, EntryType::Debit);
        assert!(req.voucher.ledger_entries.is_empty());
        assert_eq!(req.narration.as_deref(), Some("Cash deposited"));
    }

    #[test]
    fn manual_numbers_cannot_take_series_numbers() {
        let with_number = |number: &str| -> CreateVoucherRequest {
            serde_json::from_value(serde_json::json!({
                "voucher_number": number,
                "voucher_type": "JOURNAL",
                "entry_type": "DR",
                "ledger_entries": []
            }))
            .unwrap()
        };
        assert!(with_number("JE/2026-27/000007").validate().is_err());
        assert!(with_number("RV/2026-27/000001").validate().is_err());
        assert!(with_number("ADJ-2026-07").validate().is_ok());

        let without: CreateVoucherRequest = serde_json::from_value(serde_json::json!({
            "voucher_type": "JOURNAL",
            "entry_type": "DR",
            "ledger_entries": []
        }))
        .unwrap();
        assert!(without.validate().is_ok());
    }

    #[test]
    fn account_filter_uses_a_subquery() {
        let params = ListVouchersParams {
            voucher_type: Some(VoucherType::Journal),
            from_date: None,
            to_date: None,
            account_id: Some(Uuid::new_v4()),
            page: None,
            page_size: None,
        };
        let mut query = PaginatedQuery::new("SELECT * FROM vouchers WHERE 1=1");
        params.apply(&mut query);
        assert!(query.sql().contains("voucher_type = $1"));
        assert!(query
            .sql()
            .contains("SELECT voucher_id FROM voucher_entries WHERE ledger_account_id = $2"));
    }

    #[test]
    fn account_request_requires_code_and_name() {
        let req = CreateAccountRequest {
            code: String::new(),
            name: "Petty Cash".to_string(),
            account_type: AccountType::Asset,
            parent_id: None,
        };
        assert!(req.validate().is_err());

        let ok = CreateAccountRequest {
            code: "1020".to_string(),
            ..req
        };
        assert!(ok.validate().is_ok());
    }
}
