use accounting_service::{billing_journal, billing_reversal, BillingAmounts};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use billing_service::{calculate_payment_allocation, BillingStatus, ChargeInput, InvoiceAmounts};
use booking_service::BookingStatus;
use chrono::NaiveDate;
use database_layer::{next_document_number, AuditFields, DocumentSeries, TransactionManager};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{FromRow, PgConnection};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::permissions;
use crate::error::{api_success, ApiError, ApiResponse};
use crate::handlers::bookings::Booking;
use crate::handlers::common::{today, ResourceTable};
use crate::handlers::customers::notify_customer;
use crate::middleware::AuthContext;
use crate::server::YatraServer;
use crate::services::ledger_posting::post_auto_voucher;
use crate::services::{AuditService, NotificationTemplate};
use crate::types::pagination::PaginationParams;
use crate::utils::query_builder::PaginatedQuery;

/// Invoice raised against a confirmed booking
#[derive(Debug, Serialize, Deserialize, ToSchema, FromRow, Clone)]
pub struct Billing {
    pub id: Uuid,
    pub bill_number: String,
    pub booking_id: Uuid,
    pub customer_id: Uuid,
    pub bill_date: NaiveDate,
    pub base_fare: Decimal,
    pub service_charge: Decimal,
    pub gst_rate: Decimal,
    pub gst_amount: Decimal,
    pub other_charges: Decimal,
    pub discount: Decimal,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    #[sqlx(try_from = "String")]
    pub status: BillingStatus,
    pub remarks: Option<String>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: AuditFields,
}

impl ResourceTable for Billing {
    const TABLE: &'static str = "billings";
    const RESOURCE: &'static str = "billing";
}

impl Billing {
    #[must_use]
    pub fn outstanding(&self) -> Decimal {
        (self.total_amount - self.paid_amount).max(Decimal::ZERO)
    }

    /// Amounts as the ledger postings see them
    #[must_use]
    pub fn posting_amounts(&self) -> BillingAmounts {
        BillingAmounts {
            ticket_value: self.base_fare + self.other_charges,
            service_charge: self.service_charge,
            gst_amount: self.gst_amount,
            discount: self.discount,
            total_amount: self.total_amount,
        }
    }

    fn charges(&self) -> ChargeInput {
        ChargeInput {
            base_fare: self.base_fare,
            service_charge: self.service_charge,
            gst_rate: Some(self.gst_rate),
            other_charges: self.other_charges,
            discount: self.discount,
        }
    }
}

fn invoice_postings(amounts: &InvoiceAmounts) -> BillingAmounts {
    BillingAmounts {
        ticket_value: amounts.ticket_value(),
        service_charge: amounts.service_charge,
        gst_amount: amounts.gst_amount,
        discount: amounts.discount,
        total_amount: amounts.total_amount,
    }
}

/// Lock and load the billing of a booking, if any
///
/// # Errors
/// Database failures.
pub(crate) async fn billing_for_booking_for_update(
    conn: &mut PgConnection,
    booking_id: Uuid,
) -> Result<Option<Billing>, ApiError> {
    Ok(
        sqlx::query_as::<_, Billing>("SELECT * FROM billings WHERE booking_id = $1 FOR UPDATE")
            .bind(booking_id)
            .fetch_optional(&mut *conn)
            .await?,
    )
}

/// Billing with what has been applied to it
#[derive(Debug, Serialize, ToSchema)]
pub struct BillingDetail {
    #[serde(flatten)]
    pub billing: Billing,
    pub outstanding: Decimal,
    pub allocations: Vec<AppliedPayment>,
}

/// A payment share applied to a billing
#[derive(Debug, Serialize, ToSchema, FromRow)]
pub struct AppliedPayment {
    pub payment_id: Uuid,
    pub payment_number: String,
    pub payment_date: NaiveDate,
    pub amount: Decimal,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateBillingRequest {
    pub booking_id: Uuid,
    /// Defaults to the booking's estimated fare
    pub base_fare: Option<Decimal>,
    /// Defaults to the configured service charge
    pub service_charge: Option<Decimal>,
    /// Defaults to the configured GST rate
    pub gst_rate: Option<Decimal>,
    pub other_charges: Option<Decimal>,
    pub discount: Option<Decimal>,
    /// Defaults to today
    pub bill_date: Option<NaiveDate>,
    pub remarks: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdjustBillingRequest {
    pub base_fare: Option<Decimal>,
    pub service_charge: Option<Decimal>,
    pub gst_rate: Option<Decimal>,
    pub other_charges: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub remarks: Option<String>,
}

/// List Billings Query Parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListBillingsParams {
    pub status: Option<BillingStatus>,
    pub customer_id: Option<Uuid>,
    pub booking_id: Option<Uuid>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl ListBillingsParams {
    fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            page_size: self.page_size,
        }
    }

    fn apply(&self, query: &mut PaginatedQuery<'_>, own_customer: Option<Uuid>) {
        query
            .filter_eq("customer_id", own_customer.or(self.customer_id))
            .filter_eq("status", self.status.map(BillingStatus::as_str))
            .filter_eq("booking_id", self.booking_id)
            .filter_gte("bill_date", self.from_date)
            .filter_lte("bill_date", self.to_date);
    }
}

/// Per-passenger share of a bill
#[derive(Debug, Serialize, ToSchema)]
pub struct PassengerShare {
    pub passenger_name: Option<String>,
    pub amount: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FareSplit {
    pub billing_id: Uuid,
    pub bill_number: String,
    pub total_amount: Decimal,
    pub passenger_count: i32,
    pub shares: Vec<PassengerShare>,
}

async fn load_visible(server: &YatraServer, auth: &AuthContext, id: Uuid) -> Result<Billing, ApiError> {
    let scope = auth.billing_scope()?;
    let billing = Billing::fetch_by_id(&server.db_pool, id).await?;
    if !scope.allows(billing.customer_id) {
        return Err(ApiError::not_found("billing"));
    }
    Ok(billing)
}

/// List billings
#[utoipa::path(
    get,
    path = "/api/v1/billing",
    responses(
        (status = 200, description = "Billings retrieved successfully", body = Vec<Billing>),
        (status = 401, description = "Unauthorized")
    ),
    params(ListBillingsParams),
    tag = "billing",
    security(("bearer_auth" = []))
)]
pub async fn list_billings(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Query(params): Query<ListBillingsParams>,
) -> Result<Json<ApiResponse<Vec<Billing>>>, ApiError> {
    let own_customer = auth.billing_scope()?.customer_filter();
    let pagination = params.pagination();

    let mut count_query = PaginatedQuery::new("SELECT COUNT(*) FROM billings WHERE 1=1");
    params.apply(&mut count_query, own_customer);
    let total: i64 = count_query
        .build_query_scalar()
        .fetch_one(&server.db_pool)
        .await?;

    let mut query = PaginatedQuery::new("SELECT * FROM billings WHERE 1=1");
    params.apply(&mut query, own_customer);
    query.order_by("bill_date DESC, bill_number", "DESC").paginate(&pagination);
    let billings: Vec<Billing> = query.build_query_as().fetch_all(&server.db_pool).await?;

    Ok(Json(pagination.wrap_response(billings, total)))
}

/// Get a billing with its applied payments
#[utoipa::path(
    get,
    path = "/api/v1/billing/{id}",
    responses(
        (status = 200, description = "Billing retrieved successfully", body = BillingDetail),
        (status = 404, description = "Billing not found")
    ),
    params(("id" = Uuid, Path, description = "Billing ID")),
    tag = "billing",
    security(("bearer_auth" = []))
)]
pub async fn get_billing(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<BillingDetail>>, ApiError> {
    let billing = load_visible(&server, &auth, id).await?;

    let allocations: Vec<AppliedPayment> = sqlx::query_as(
        r"
        SELECT p.id AS payment_id, p.payment_number, p.payment_date, a.amount
        FROM payment_allocations a
        JOIN payments p ON p.id = a.payment_id
        WHERE a.billing_id = $1 AND p.status = 'RECEIVED'
        ORDER BY p.payment_date, p.payment_number
        ",
    )
    .bind(id)
    .fetch_all(&server.db_pool)
    .await?;

    Ok(Json(api_success(BillingDetail {
        outstanding: billing.outstanding(),
        billing,
        allocations,
    })))
}

/// Generate the billing for a confirmed booking
///
/// Posts the sales journal in the same transaction.
#[utoipa::path(
    post,
    path = "/api/v1/billing",
    request_body = GenerateBillingRequest,
    responses(
        (status = 201, description = "Billing generated", body = Billing),
        (status = 400, description = "Invalid charges"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Booking is not confirmed or already billed")
    ),
    tag = "billing",
    security(("bearer_auth" = []))
)]
pub async fn generate_billing(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Json(req): Json<GenerateBillingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Billing>>), ApiError> {
    auth.require_permission(permissions::BILLING_WRITE)?;

    let mut tx = TransactionManager::new(&server.db_pool)
        .labelled("generate_billing")
        .begin()
        .await?;

    let booking = Booking::fetch_for_update(&mut *tx, req.booking_id).await?;
    if !booking.status.can_be_billed() {
        return Err(ApiError::conflict(format!(
            "Billing can only be generated for {} bookings; booking {} is {}",
            BookingStatus::Confirmed,
            booking.booking_number,
            booking.status
        )));
    }
    if billing_for_booking_for_update(&mut tx, booking.id).await?.is_some() {
        return Err(ApiError::duplicate("A billing already exists for this booking"));
    }

    let amounts = server.billing.compute_invoice(&ChargeInput {
        base_fare: req.base_fare.unwrap_or(booking.estimated_fare),
        service_charge: req
            .service_charge
            .unwrap_or(server.config.billing.default_service_charge),
        gst_rate: req.gst_rate,
        other_charges: req.other_charges.unwrap_or(Decimal::ZERO),
        discount: req.discount.unwrap_or(Decimal::ZERO),
    })?;

    let bill_date = req.bill_date.unwrap_or_else(today);
    let bill_number = next_document_number(&mut tx, DocumentSeries::Billing, bill_date).await?;

    let billing = sqlx::query_as::<_, Billing>(
        r"
        INSERT INTO billings (
            bill_number, booking_id, customer_id, bill_date, base_fare, service_charge,
            gst_rate, gst_amount, other_charges, discount, total_amount, status, remarks, entered_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        RETURNING *
        ",
    )
    .bind(&bill_number)
    .bind(booking.id)
    .bind(booking.customer_id)
    .bind(bill_date)
    .bind(amounts.base_fare)
    .bind(amounts.service_charge)
    .bind(amounts.gst_rate)
    .bind(amounts.gst_amount)
    .bind(amounts.other_charges)
    .bind(amounts.discount)
    .bind(amounts.total_amount)
    .bind(server.billing.derive_status(amounts.total_amount, Decimal::ZERO).as_str())
    .bind(&req.remarks)
    .bind(auth.user_id)
    .fetch_one(&mut *tx)
    .await?;

    let journal = billing_journal(&bill_number, &invoice_postings(&amounts));
    post_auto_voucher(&mut tx, &journal, bill_date, ("billing", billing.id), Some(auth.user_id))
        .await?;

    AuditService::log_action(
        &mut *tx,
        &auth,
        "billing",
        billing.id,
        "generated",
        Some(json!({
            "bill_number": billing.bill_number,
            "booking_id": booking.id,
            "total_amount": billing.total_amount,
        })),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        billing_id = %billing.id,
        bill_number = %billing.bill_number,
        booking_number = %booking.booking_number,
        total = %billing.total_amount,
        "Billing generated"
    );

    notify_customer(
        &server,
        billing.customer_id,
        NotificationTemplate::BillingGenerated,
        format!("Invoice {} for booking {}", billing.bill_number, booking.booking_number),
        json!({
            "bill_number": billing.bill_number,
            "booking_number": booking.booking_number,
            "total_amount": billing.total_amount,
        }),
    )
    .await;

    Ok((StatusCode::CREATED, Json(api_success(billing))))
}

/// Adjust the charges of a billing that has not received money
#[utoipa::path(
    put,
    path = "/api/v1/billing/{id}",
    request_body = AdjustBillingRequest,
    responses(
        (status = 200, description = "Billing adjusted", body = Billing),
        (status = 404, description = "Billing not found"),
        (status = 409, description = "Billing is paid, part-paid or cancelled")
    ),
    params(("id" = Uuid, Path, description = "Billing ID")),
    tag = "billing",
    security(("bearer_auth" = []))
)]
pub async fn update_billing(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<AdjustBillingRequest>,
) -> Result<Json<ApiResponse<Billing>>, ApiError> {
    auth.require_permission(permissions::BILLING_WRITE)?;

    let mut tx = TransactionManager::new(&server.db_pool)
        .labelled("adjust_billing")
        .begin()
        .await?;

    let current = Billing::fetch_for_update(&mut *tx, id).await?;
    server
        .billing
        .ensure_adjustable(current.status, current.paid_amount)?;

    let previous = current.charges();
    let amounts = server.billing.compute_invoice(&ChargeInput {
        base_fare: req.base_fare.unwrap_or(previous.base_fare),
        service_charge: req.service_charge.unwrap_or(previous.service_charge),
        gst_rate: req.gst_rate.or(previous.gst_rate),
        other_charges: req.other_charges.unwrap_or(previous.other_charges),
        discount: req.discount.unwrap_or(previous.discount),
    })?;

    let new_postings = invoice_postings(&amounts);
    let old_postings = current.posting_amounts();
    if new_postings != old_postings {
        let date = today();
        let reversal = billing_reversal(&current.bill_number, &old_postings);
        post_auto_voucher(&mut tx, &reversal, date, ("billing", id), Some(auth.user_id)).await?;
        let journal = billing_journal(&current.bill_number, &new_postings);
        post_auto_voucher(&mut tx, &journal, date, ("billing", id), Some(auth.user_id)).await?;
    }

    let billing = sqlx::query_as::<_, Billing>(
        r"
        UPDATE billings SET
            base_fare = $2, service_charge = $3, gst_rate = $4, gst_amount = $5,
            other_charges = $6, discount = $7, total_amount = $8,
            status = $9, remarks = COALESCE($10, remarks),
            modified_by = $11, modified_on = NOW()
        WHERE id = $1
        RETURNING *
        ",
    )
    .bind(id)
    .bind(amounts.base_fare)
    .bind(amounts.service_charge)
    .bind(amounts.gst_rate)
    .bind(amounts.gst_amount)
    .bind(amounts.other_charges)
    .bind(amounts.discount)
    .bind(amounts.total_amount)
    .bind(server.billing.derive_status(amounts.total_amount, current.paid_amount).as_str())
    .bind(&req.remarks)
    .bind(auth.user_id)
    .fetch_one(&mut *tx)
    .await?;

    AuditService::log_action(
        &mut *tx,
        &auth,
        "billing",
        id,
        "adjusted",
        Some(json!({
            "previous_total": current.total_amount,
            "total_amount": billing.total_amount,
        })),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        billing_id = %id,
        previous_total = %current.total_amount,
        total = %billing.total_amount,
        "Billing adjusted"
    );
    Ok(Json(api_success(billing)))
}

/// Per-passenger fare shares for printing on the invoice
#[utoipa::path(
    get,
    path = "/api/v1/billing/{id}/fare-split",
    responses(
        (status = 200, description = "Fare split", body = FareSplit),
        (status = 404, description = "Billing not found")
    ),
    params(("id" = Uuid, Path, description = "Billing ID")),
    tag = "billing",
    security(("bearer_auth" = []))
)]
pub async fn fare_split(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<FareSplit>>, ApiError> {
    let billing = load_visible(&server, &auth, id).await?;

    let passenger_count: i32 =
        sqlx::query_scalar("SELECT passenger_count FROM bookings WHERE id = $1")
            .bind(billing.booking_id)
            .fetch_one(&server.db_pool)
            .await?;
    let names: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM passengers WHERE booking_id = $1 ORDER BY entered_on, id",
    )
    .bind(billing.booking_id)
    .fetch_all(&server.db_pool)
    .await?;

    let count = usize::try_from(passenger_count).unwrap_or_default();
    let shares = calculate_payment_allocation(billing.total_amount, count)?;
    let mut names = names.into_iter();

    Ok(Json(api_success(FareSplit {
        billing_id: billing.id,
        bill_number: billing.bill_number,
        total_amount: billing.total_amount,
        passenger_count,
        shares: shares
            .into_iter()
            .map(|amount| PassengerShare {
                passenger_name: names.next(),
                amount,
            })
            .collect(),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn billing(status: BillingStatus, paid: Decimal) -> Billing {
        Billing {
            id: Uuid::new_v4(),
            bill_number: "BL/2026-27/000001".to_string(),
            booking_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            bill_date: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            base_fare: dec!(1500),
            service_charge: dec!(100),
            gst_rate: dec!(18),
            gst_amount: dec!(18),
            other_charges: dec!(40),
            discount: dec!(8),
            total_amount: dec!(1650),
            paid_amount: paid,
            status,
            remarks: None,
            audit: AuditFields::entered(None),
        }
    }

    #[test]
    fn posting_amounts_fold_other_charges_into_ticket_value() {
        let amounts = billing(BillingStatus::Unpaid, Decimal::ZERO).posting_amounts();
        assert_eq!(amounts.ticket_value, dec!(1540));
        assert_eq!(amounts.service_charge, dec!(100));
        assert_eq!(amounts.total_amount, dec!(1650));
    }

    #[test]
    fn outstanding_never_negative() {
        assert_eq!(billing(BillingStatus::PartiallyPaid, dec!(650)).outstanding(), dec!(1000));
        assert_eq!(billing(BillingStatus::Paid, dec!(1650)).outstanding(), Decimal::ZERO);
    }

    #[test]
    fn recomputed_invoice_matches_stored_postings() {
        let stored = billing(BillingStatus::Unpaid, Decimal::ZERO);
        let amounts = billing_service::BillingService::new()
            .compute_invoice(&stored.charges())
            .unwrap();
        assert_eq!(invoice_postings(&amounts), stored.posting_amounts());
    }

    #[test]
    fn billings_serialize_status_in_upper_case() {
        let value = serde_json::to_value(billing(BillingStatus::PartiallyPaid, dec!(1))).unwrap();
        assert_eq!(value["status"], "PARTIALLY_PAID");
        assert!(value.get("entered_on").is_some());
    }
}
