use accounting_service::customer_receipt;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use billing_service::{
    calculate_payment_allocation, plan_allocation, validate_payment, AllocationLine, OpenBill,
    PaymentMode, MAX_ALLOCATION_SHARES,
};
use chrono::NaiveDate;
use database_layer::{next_document_number, AuditFields, DocumentSeries, TransactionManager};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{FromRow, PgConnection};
use std::collections::{HashMap, HashSet};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::permissions;
use crate::error::{api_success, ApiError, ApiResponse};
use crate::handlers::billing::Billing;
use crate::handlers::bookings::Booking;
use crate::handlers::common::{today, ResourceTable};
use crate::handlers::customers::notify_customer;
use crate::handlers::receipts::Receipt;
use crate::middleware::AuthContext;
use crate::server::YatraServer;
use crate::services::ledger_posting::post_auto_voucher;
use crate::services::{AuditService, NotificationTemplate};
use crate::types::pagination::PaginationParams;
use crate::utils::query_builder::PaginatedQuery;

pub const PAYMENT_RECEIVED: &str = "RECEIVED";

/// Money received from a customer
#[derive(Debug, Serialize, Deserialize, ToSchema, FromRow, Clone)]
pub struct Payment {
    pub id: Uuid,
    pub payment_number: String,
    pub customer_id: Uuid,
    pub booking_id: Option<Uuid>,
    pub amount: Decimal,
    #[sqlx(try_from = "String")]
    pub mode: PaymentMode,
    pub reference_no: Option<String>,
    pub payment_date: NaiveDate,
    /// `RECEIVED` or `CANCELLED`
    pub status: String,
    pub remarks: Option<String>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: AuditFields,
}

impl ResourceTable for Payment {
    const TABLE: &'static str = "payments";
    const RESOURCE: &'static str = "payment";
}

/// Share of a payment applied to one billing
#[derive(Debug, Serialize, ToSchema, FromRow, Clone)]
pub struct PaymentAllocation {
    pub billing_id: Uuid,
    pub bill_number: String,
    pub amount: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentDetail {
    #[serde(flatten)]
    pub payment: Payment,
    pub allocations: Vec<PaymentAllocation>,
    pub receipt: Option<Receipt>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordPaymentRequest {
    pub customer_id: Uuid,
    pub booking_id: Option<Uuid>,
    pub amount: Decimal,
    pub mode: PaymentMode,
    /// Cheque number or bank transaction reference
    pub reference_no: Option<String>,
    /// Defaults to today
    pub payment_date: Option<NaiveDate>,
    /// Bills to settle, in order; the amount is split equally across them.
    /// When empty, the open billing of `booking_id` is settled.
    #[serde(default)]
    pub billing_ids: Vec<Uuid>,
    pub remarks: Option<String>,
}

impl RecordPaymentRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_payment(self.amount, self.mode, self.reference_no.as_deref())?;
        check_share_count(self.billing_ids.len())?;
        let mut seen = HashSet::new();
        if let Some(dup) = self.billing_ids.iter().find(|id| !seen.insert(**id)) {
            return Err(ApiError::validation(format!(
                "billing {dup} is listed more than once"
            )));
        }
        Ok(())
    }
}

/// List Payments Query Parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListPaymentsParams {
    pub customer_id: Option<Uuid>,
    pub booking_id: Option<Uuid>,
    pub mode: Option<PaymentMode>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl ListPaymentsParams {
    fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            page_size: self.page_size,
        }
    }

    fn apply(&self, query: &mut PaginatedQuery<'_>, own_customer: Option<Uuid>) {
        query
            .filter_eq("customer_id", own_customer.or(self.customer_id))
            .filter_eq("booking_id", self.booking_id)
            .filter_eq("mode", self.mode.map(PaymentMode::as_str))
            .filter_gte("payment_date", self.from_date)
            .filter_lte("payment_date", self.to_date);
    }
}

/// Allocation Preview Query Parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct AllocationPreviewParams {
    pub amount: Decimal,
    /// Number of equal shares when no bills are given
    pub count: Option<u32>,
    /// Comma-separated billing ids to check against outstanding amounts
    pub billing_ids: Option<String>,
}

fn check_share_count(count: usize) -> Result<(), ApiError> {
    if count > MAX_ALLOCATION_SHARES {
        return Err(ApiError::validation(format!(
            "an allocation can have at most {MAX_ALLOCATION_SHARES} shares, got {count}"
        )));
    }
    Ok(())
}

impl AllocationPreviewParams {
    fn billing_ids(&self) -> Result<Vec<Uuid>, ApiError> {
        let ids = self
            .billing_ids
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                Uuid::parse_str(s)
                    .map_err(|_| ApiError::validation(format!("'{s}' is not a valid billing id")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        check_share_count(ids.len())?;
        Ok(ids)
    }

    fn share_count(&self) -> Result<usize, ApiError> {
        let count = usize::try_from(self.count.unwrap_or(1)).unwrap_or(usize::MAX);
        check_share_count(count)?;
        Ok(count)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AllocationPreview {
    pub amount: Decimal,
    pub shares: Vec<Decimal>,
    /// Present when billing ids were given
    pub allocations: Vec<AllocationLine>,
}

/// Distinct billing ids in ascending order, the order their rows are locked in
fn lock_order(billing_ids: &[Uuid]) -> Vec<Uuid> {
    let mut ordered = billing_ids.to_vec();
    ordered.sort_unstable();
    ordered.dedup();
    ordered
}

async fn load_allocations(
    conn: &mut PgConnection,
    payment_id: Uuid,
) -> Result<Vec<PaymentAllocation>, ApiError> {
    Ok(sqlx::query_as(
        r"
        SELECT a.billing_id, b.bill_number, a.amount
        FROM payment_allocations a
        JOIN billings b ON b.id = a.billing_id
        WHERE a.payment_id = $1
        ORDER BY a.created_at, b.bill_number
        ",
    )
    .bind(payment_id)
    .fetch_all(&mut *conn)
    .await?)
}

async fn load_receipt(conn: &mut PgConnection, payment_id: Uuid) -> Result<Option<Receipt>, ApiError> {
    Ok(sqlx::query_as("SELECT * FROM receipts WHERE payment_id = $1")
        .bind(payment_id)
        .fetch_optional(&mut *conn)
        .await?)
}

/// List payments
#[utoipa::path(
    get,
    path = "/api/v1/payments",
    responses(
        (status = 200, description = "Payments retrieved successfully", body = Vec<Payment>),
        (status = 401, description = "Unauthorized")
    ),
    params(ListPaymentsParams),
    tag = "payments",
    security(("bearer_auth" = []))
)]
pub async fn list_payments(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Query(params): Query<ListPaymentsParams>,
) -> Result<Json<ApiResponse<Vec<Payment>>>, ApiError> {
    let own_customer = auth.payment_scope()?.customer_filter();
    let pagination = params.pagination();

    let mut count_query = PaginatedQuery::new("SELECT COUNT(*) FROM payments WHERE 1=1");
    params.apply(&mut count_query, own_customer);
    let total: i64 = count_query
        .build_query_scalar()
        .fetch_one(&server.db_pool)
        .await?;

    let mut query = PaginatedQuery::new("SELECT * FROM payments WHERE 1=1");
    params.apply(&mut query, own_customer);
    query.order_by("payment_date DESC, payment_number", "DESC").paginate(&pagination);
    let payments: Vec<Payment> = query.build_query_as().fetch_all(&server.db_pool).await?;

    Ok(Json(pagination.wrap_response(payments, total)))
}

/// Get a payment with its allocations and receipt
#[utoipa::path(
    get,
    path = "/api/v1/payments/{id}",
    responses(
        (status = 200, description = "Payment retrieved successfully", body = PaymentDetail),
        (status = 404, description = "Payment not found")
    ),
    params(("id" = Uuid, Path, description = "Payment ID")),
    tag = "payments",
    security(("bearer_auth" = []))
)]
pub async fn get_payment(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<PaymentDetail>>, ApiError> {
    let scope = auth.payment_scope()?;
    let mut conn = server.db_pool.acquire().await?;

    let payment = Payment::fetch_by_id(&mut *conn, id).await?;
    if !scope.allows(payment.customer_id) {
        return Err(ApiError::not_found("payment"));
    }
    let allocations = load_allocations(&mut conn, id).await?;
    let receipt = load_receipt(&mut conn, id).await?;

    Ok(Json(api_success(PaymentDetail {
        payment,
        allocations,
        receipt,
    })))
}

/// Record a payment, apply it to bills and issue its receipt
///
/// Allocations, bill balances, the receipt and the receipt voucher commit
/// together with the payment.
#[utoipa::path(
    post,
    path = "/api/v1/payments",
    request_body = RecordPaymentRequest,
    responses(
        (status = 201, description = "Payment recorded", body = PaymentDetail),
        (status = 400, description = "Invalid payment or over-allocation"),
        (status = 404, description = "Customer, booking or billing not found"),
        (status = 409, description = "A billing is closed")
    ),
    tag = "payments",
    security(("bearer_auth" = []))
)]
pub async fn record_payment(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Json(req): Json<RecordPaymentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PaymentDetail>>), ApiError> {
    auth.require_permission(permissions::PAYMENTS_CREATE)?;
    req.validate()?;

    let mut tx = TransactionManager::new(&server.db_pool)
        .labelled("record_payment")
        .begin()
        .await?;

    let customer_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM customers WHERE id = $1)")
            .bind(req.customer_id)
            .fetch_one(&mut *tx)
            .await?;
    if !customer_exists {
        return Err(ApiError::not_found("customer"));
    }

    let mut billing_ids = req.billing_ids.clone();
    if let Some(booking_id) = req.booking_id {
        let booking = Booking::fetch_by_id(&mut *tx, booking_id).await?;
        if booking.customer_id != req.customer_id {
            return Err(ApiError::validation("booking belongs to another customer"));
        }
        if billing_ids.is_empty() {
            let open: Option<Uuid> = sqlx::query_scalar(
                "SELECT id FROM billings WHERE booking_id = $1 AND status IN ('UNPAID', 'PARTIALLY_PAID')",
            )
            .bind(booking_id)
            .fetch_optional(&mut *tx)
            .await?;
            billing_ids.extend(open);
        }
    }

    // Row locks are taken in id order so concurrent payments over the same
    // bills cannot deadlock; the allocation plan keeps the request order.
    let mut bills: HashMap<Uuid, Billing> = HashMap::with_capacity(billing_ids.len());
    for billing_id in lock_order(&billing_ids) {
        let bill = Billing::fetch_for_update(&mut *tx, billing_id).await?;
        bills.insert(bill.id, bill);
    }

    let mut open_bills = Vec::with_capacity(billing_ids.len());
    for billing_id in &billing_ids {
        let bill = bills
            .get(billing_id)
            .ok_or_else(|| ApiError::not_found("billing"))?;
        if bill.customer_id != req.customer_id {
            return Err(ApiError::validation(format!(
                "billing {} belongs to another customer",
                bill.bill_number
            )));
        }
        if !bill.status.is_open() {
            return Err(ApiError::conflict(format!(
                "billing {} is {} and cannot take payments",
                bill.bill_number, bill.status
            )));
        }
        open_bills.push(OpenBill {
            billing_id: bill.id,
            outstanding: bill.outstanding(),
        });
    }

    let plan = plan_allocation(req.amount, &open_bills)?;

    let payment_date = req.payment_date.unwrap_or_else(today);
    let payment_number = next_document_number(&mut tx, DocumentSeries::Payment, payment_date).await?;

    let payment = sqlx::query_as::<_, Payment>(
        r"
        INSERT INTO payments (
            payment_number, customer_id, booking_id, amount, mode, reference_no,
            payment_date, status, remarks, entered_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        ",
    )
    .bind(&payment_number)
    .bind(req.customer_id)
    .bind(req.booking_id)
    .bind(req.amount)
    .bind(req.mode.as_str())
    .bind(req.reference_no.as_deref().map(str::trim))
    .bind(payment_date)
    .bind(PAYMENT_RECEIVED)
    .bind(&req.remarks)
    .bind(auth.user_id)
    .fetch_one(&mut *tx)
    .await?;

    for line in &plan {
        let Some(bill) = bills.get(&line.billing_id) else {
            continue;
        };
        sqlx::query(
            "INSERT INTO payment_allocations (payment_id, billing_id, amount) VALUES ($1, $2, $3)",
        )
        .bind(payment.id)
        .bind(line.billing_id)
        .bind(line.amount)
        .execute(&mut *tx)
        .await?;

        let paid = bill.paid_amount + line.amount;
        sqlx::query(
            r"
            UPDATE billings SET paid_amount = $2, status = $3, modified_by = $4, modified_on = NOW()
            WHERE id = $1
            ",
        )
        .bind(line.billing_id)
        .bind(paid)
        .bind(server.billing.derive_status(bill.total_amount, paid).as_str())
        .bind(auth.user_id)
        .execute(&mut *tx)
        .await?;
    }

    let receipt_number = next_document_number(&mut tx, DocumentSeries::Receipt, payment_date).await?;
    let receipt = sqlx::query_as::<_, Receipt>(
        r"
        INSERT INTO receipts (receipt_number, payment_id, customer_id, amount, receipt_date, entered_by)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        ",
    )
    .bind(&receipt_number)
    .bind(payment.id)
    .bind(payment.customer_id)
    .bind(payment.amount)
    .bind(payment_date)
    .bind(auth.user_id)
    .fetch_one(&mut *tx)
    .await?;

    let voucher = customer_receipt(&payment_number, payment.amount, payment.mode.is_cash());
    post_auto_voucher(&mut tx, &voucher, payment_date, ("payment", payment.id), Some(auth.user_id))
        .await?;

    AuditService::log_action(
        &mut *tx,
        &auth,
        "payment",
        payment.id,
        "recorded",
        Some(json!({
            "payment_number": payment.payment_number,
            "receipt_number": receipt.receipt_number,
            "amount": payment.amount,
            "mode": payment.mode,
            "allocations": plan,
        })),
    )
    .await?;

    let allocations = load_allocations(&mut tx, payment.id).await?;
    tx.commit().await?;

    tracing::info!(
        payment_id = %payment.id,
        payment_number = %payment.payment_number,
        receipt_number = %receipt.receipt_number,
        amount = %payment.amount,
        mode = %payment.mode,
        bills = allocations.len(),
        "Payment recorded"
    );

    notify_customer(
        &server,
        payment.customer_id,
        NotificationTemplate::PaymentReceived,
        format!("Payment received, receipt {}", receipt.receipt_number),
        json!({
            "payment_number": payment.payment_number,
            "receipt_number": receipt.receipt_number,
            "amount": payment.amount,
            "mode": payment.mode,
        }),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(api_success(PaymentDetail {
            payment,
            allocations,
            receipt: Some(receipt),
        })),
    ))
}

/// Preview how an amount would be split
#[utoipa::path(
    get,
    path = "/api/v1/payments/allocation-preview",
    responses(
        (status = 200, description = "Allocation preview", body = AllocationPreview),
        (status = 400, description = "Invalid amount or over-allocation")
    ),
    params(AllocationPreviewParams),
    tag = "payments",
    security(("bearer_auth" = []))
)]
pub async fn allocation_preview(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Query(params): Query<AllocationPreviewParams>,
) -> Result<Json<ApiResponse<AllocationPreview>>, ApiError> {
    auth.require_permission(permissions::PAYMENTS_CREATE)?;
    let billing_ids = params.billing_ids()?;

    if billing_ids.is_empty() {
        let shares = calculate_payment_allocation(params.amount, params.share_count()?)?;
        return Ok(Json(api_success(AllocationPreview {
            amount: params.amount,
            shares,
            allocations: Vec::new(),
        })));
    }

    let mut open_bills = Vec::with_capacity(billing_ids.len());
    for billing_id in billing_ids {
        let bill = Billing::fetch_by_id(&server.db_pool, billing_id).await?;
        open_bills.push(OpenBill {
            billing_id: bill.id,
            outstanding: if bill.status.is_open() {
                bill.outstanding()
            } else {
                Decimal::ZERO
            },
        });
    }

    let shares = calculate_payment_allocation(params.amount, open_bills.len())?;
    let allocations = plan_allocation(params.amount, &open_bills)?;

    Ok(Json(api_success(AllocationPreview {
        amount: params.amount,
        shares,
        allocations,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request(mode: PaymentMode, reference: Option<&str>, bills: Vec<Uuid>) -> RecordPaymentRequest {
        RecordPaymentRequest {
            customer_id: Uuid::new_v4(),
            booking_id: None,
            amount: dec!(1000),
            mode,
            reference_no: reference.map(str::to_string),
            payment_date: None,
            billing_ids: bills,
            remarks: None,
        }
    }

    #[test]
    fn cheque_needs_a_reference() {
        assert!(request(PaymentMode::Cheque, None, vec![]).validate().is_err());
        assert!(request(PaymentMode::Cheque, Some("004512"), vec![]).validate().is_ok());
        assert!(request(PaymentMode::Upi, None, vec![]).validate().is_ok());
    }

    #[test]
    fn bills_are_locked_in_id_order() {
        let mut ids: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        let forward = lock_order(&ids);
        ids.reverse();
        assert_eq!(lock_order(&ids), forward);
        assert!(forward.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn oversized_share_counts_are_rejected() {
        let params = |count| AllocationPreviewParams {
            amount: dec!(100),
            count: Some(count),
            billing_ids: None,
        };
        assert_eq!(params(3).share_count().unwrap(), 3);
        assert!(params(4_000_000_000).share_count().is_err());

        let bills = (0..=MAX_ALLOCATION_SHARES).map(|_| Uuid::new_v4()).collect();
        assert!(request(PaymentMode::Cash, None, bills).validate().is_err());
    }

    #[test]
    fn repeated_bills_are_rejected() {
        let bill = Uuid::new_v4();
        let err = request(PaymentMode::Cash, None, vec![bill, bill])
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn preview_parses_comma_separated_ids() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let params = AllocationPreviewParams {
            amount: dec!(100),
            count: None,
            billing_ids: Some(format!("{a}, {b},")),
        };
        assert_eq!(params.billing_ids().unwrap(), vec![a, b]);

        let bad = AllocationPreviewParams {
            amount: dec!(100),
            count: None,
            billing_ids: Some("not-a-uuid".to_string()),
        };
        assert!(bad.billing_ids().is_err());
    }

    #[test]
    fn list_filters_use_mode_text() {
        let params = ListPaymentsParams {
            customer_id: None,
            booking_id: None,
            mode: Some(PaymentMode::BankTransfer),
            from_date: None,
            to_date: None,
            page: None,
            page_size: None,
        };
        let mut query = PaginatedQuery::new("SELECT * FROM payments WHERE 1=1");
        params.apply(&mut query, None);
        assert!(query.sql().contains("mode = $1"));
    }
}
