use accounting_service::billing_reversal;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use billing_service::BillingStatus;
use booking_service::{
    apply_action, BookingAction, BookingChanges, BookingDraft, BookingError, BookingService,
    BookingStatus, Gender, PassengerInput, TransitionGuards,
};
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
use crate::handlers::billing::billing_for_booking_for_update;
use crate::handlers::common::{today, ResourceTable};
use crate::handlers::customers::notify_customer;
use crate::middleware::{AccessScope, AuthContext};
use crate::server::YatraServer;
use crate::services::ledger_posting::post_auto_voucher;
use crate::services::{AuditService, NotificationTemplate};
use crate::types::pagination::PaginationParams;
use crate::utils::query_builder::PaginatedQuery;

/// Travel booking
#[derive(Debug, Serialize, Deserialize, ToSchema, FromRow, Clone)]
pub struct Booking {
    pub id: Uuid,
    pub booking_number: String,
    pub customer_id: Uuid,
    pub origin: String,
    pub destination: String,
    pub travel_date: NaiveDate,
    pub travel_class: String,
    pub quota: String,
    pub passenger_count: i32,
    pub estimated_fare: Decimal,
    #[sqlx(try_from = "String")]
    pub status: BookingStatus,
    pub remarks: Option<String>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: AuditFields,
}

impl ResourceTable for Booking {
    const TABLE: &'static str = "bookings";
    const RESOURCE: &'static str = "booking";
}

#[derive(Debug, Serialize, Deserialize, ToSchema, FromRow, Clone)]
pub struct Passenger {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub name: String,
    pub age: i32,
    #[sqlx(try_from = "String")]
    pub gender: Gender,
    pub berth_preference: Option<String>,
}

/// Booking with its passenger manifest
#[derive(Debug, Serialize, ToSchema)]
pub struct BookingDetail {
    #[serde(flatten)]
    pub booking: Booking,
    pub passengers: Vec<Passenger>,
    /// Billing raised for this booking, if any
    pub billing_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBookingRequest {
    /// Required for staff; customers book for themselves
    pub customer_id: Option<Uuid>,
    #[serde(flatten)]
    pub booking: BookingDraft,
}

/// List Bookings Query Parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListBookingsParams {
    pub status: Option<BookingStatus>,
    pub customer_id: Option<Uuid>,
    /// Travel date lower bound
    pub from_date: Option<NaiveDate>,
    /// Travel date upper bound
    pub to_date: Option<NaiveDate>,
    /// Matches booking number, origin or destination
    pub search: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl ListBookingsParams {
    fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            page_size: self.page_size,
        }
    }

    fn apply(&self, query: &mut PaginatedQuery<'_>, own_customer: Option<Uuid>) {
        query
            .filter_eq("customer_id", own_customer.or(self.customer_id))
            .filter_eq("status", self.status.map(BookingStatus::as_str))
            .filter_gte("travel_date", self.from_date)
            .filter_lte("travel_date", self.to_date);

        if let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = format!("%{term}%");
            let builder = query.query_builder();
            builder.push(" AND (booking_number ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR origin ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR destination ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }
    }
}

/// Who may write bookings, and for which customers
fn write_scope(auth: &AuthContext) -> Result<AccessScope, ApiError> {
    auth.scope(permissions::BOOKINGS_WRITE, permissions::BOOKINGS_CREATE_OWN)
}

async fn insert_passengers(
    conn: &mut PgConnection,
    booking_id: Uuid,
    passengers: &[PassengerInput],
    entered_by: Uuid,
) -> Result<(), ApiError> {
    for passenger in passengers {
        sqlx::query(
            r"
            INSERT INTO passengers (booking_id, name, age, gender, berth_preference, entered_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(booking_id)
        .bind(passenger.name.trim())
        .bind(passenger.age)
        .bind(passenger.gender.as_str())
        .bind(&passenger.berth_preference)
        .bind(entered_by)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn load_detail(conn: &mut PgConnection, booking: Booking) -> Result<BookingDetail, ApiError> {
    let passengers: Vec<Passenger> = sqlx::query_as(
        r"
        SELECT id, booking_id, name, age, gender, berth_preference
        FROM passengers WHERE booking_id = $1
        ORDER BY entered_on, id
        ",
    )
    .bind(booking.id)
    .fetch_all(&mut *conn)
    .await?;

    let billing_id: Option<Uuid> = sqlx::query_scalar("SELECT id FROM billings WHERE booking_id = $1")
        .bind(booking.id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(BookingDetail {
        booking,
        passengers,
        billing_id,
    })
}

/// List bookings
///
/// Customers only see their own bookings.
#[utoipa::path(
    get,
    path = "/api/v1/bookings",
    responses(
        (status = 200, description = "Bookings retrieved successfully", body = Vec<Booking>),
        (status = 401, description = "Unauthorized")
    ),
    params(ListBookingsParams),
    tag = "bookings",
    security(("bearer_auth" = []))
)]
pub async fn list_bookings(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Query(params): Query<ListBookingsParams>,
) -> Result<Json<ApiResponse<Vec<Booking>>>, ApiError> {
    let own_customer = auth.booking_scope()?.customer_filter();
    let pagination = params.pagination();

    let mut count_query = PaginatedQuery::new("SELECT COUNT(*) FROM bookings WHERE 1=1");
    params.apply(&mut count_query, own_customer);
    let total: i64 = count_query
        .build_query_scalar()
        .fetch_one(&server.db_pool)
        .await?;

    let mut query = PaginatedQuery::new("SELECT * FROM bookings WHERE 1=1");
    params.apply(&mut query, own_customer);
    query.order_by_entered_desc().paginate(&pagination);
    let bookings: Vec<Booking> = query.build_query_as().fetch_all(&server.db_pool).await?;

    Ok(Json(pagination.wrap_response(bookings, total)))
}

/// Get a booking with passengers
#[utoipa::path(
    get,
    path = "/api/v1/bookings/{id}",
    responses(
        (status = 200, description = "Booking retrieved successfully", body = BookingDetail),
        (status = 404, description = "Booking not found")
    ),
    params(("id" = Uuid, Path, description = "Booking ID")),
    tag = "bookings",
    security(("bearer_auth" = []))
)]
pub async fn get_booking(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<BookingDetail>>, ApiError> {
    let scope = auth.booking_scope()?;
    let mut conn = server.db_pool.acquire().await?;

    let booking = Booking::fetch_by_id(&mut *conn, id).await?;
    if !scope.allows(booking.customer_id) {
        return Err(ApiError::not_found("booking"));
    }

    Ok(Json(api_success(load_detail(&mut conn, booking).await?)))
}

/// Create a booking in DRAFT
#[utoipa::path(
    post,
    path = "/api/v1/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created successfully", body = BookingDetail),
        (status = 400, description = "Invalid booking details"),
        (status = 403, description = "Not allowed to book for this customer")
    ),
    tag = "bookings",
    security(("bearer_auth" = []))
)]
pub async fn create_booking(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BookingDetail>>), ApiError> {
    let customer_id = match write_scope(&auth)? {
        AccessScope::All => req
            .customer_id
            .ok_or_else(|| ApiError::validation("customer_id is required"))?,
        AccessScope::Customer(own) => {
            if req.customer_id.is_some_and(|requested| requested != own) {
                return Err(ApiError::authorization(
                    "Customers can only create bookings for themselves",
                ));
            }
            own
        }
    };

    let draft = &req.booking;
    let passenger_count = BookingService::new().validate_draft(draft, today())?;

    let mut tx = TransactionManager::new(&server.db_pool)
        .labelled("create_booking")
        .begin()
        .await?;

    let customer_active: Option<bool> =
        sqlx::query_scalar("SELECT is_active FROM customers WHERE id = $1")
            .bind(customer_id)
            .fetch_optional(&mut *tx)
            .await?;
    match customer_active {
        None => return Err(ApiError::not_found("customer")),
        Some(false) => return Err(ApiError::bad_request("Customer account is inactive")),
        Some(true) => {}
    }

    let booking_number = next_document_number(&mut tx, DocumentSeries::Booking, today()).await?;
    let quota = draft
        .quota
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map_or_else(|| "GENERAL".to_string(), str::to_uppercase);

    let booking = sqlx::query_as::<_, Booking>(
        r"
        INSERT INTO bookings (
            booking_number, customer_id, origin, destination, travel_date, travel_class,
            quota, passenger_count, estimated_fare, status, remarks, entered_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING *
        ",
    )
    .bind(&booking_number)
    .bind(customer_id)
    .bind(draft.origin.trim())
    .bind(draft.destination.trim())
    .bind(draft.travel_date)
    .bind(draft.travel_class.trim())
    .bind(quota)
    .bind(passenger_count)
    .bind(draft.estimated_fare.unwrap_or(Decimal::ZERO))
    .bind(BookingStatus::Draft.as_str())
    .bind(&draft.remarks)
    .bind(auth.user_id)
    .fetch_one(&mut *tx)
    .await?;

    insert_passengers(&mut tx, booking.id, &draft.passengers, auth.user_id).await?;

    AuditService::log_action(
        &mut *tx,
        &auth,
        "booking",
        booking.id,
        "created",
        Some(json!({
            "booking_number": booking.booking_number,
            "customer_id": customer_id,
            "passenger_count": passenger_count,
        })),
    )
    .await?;

    let detail = load_detail(&mut tx, booking).await?;
    tx.commit().await?;

    tracing::info!(
        booking_id = %detail.booking.id,
        booking_number = %detail.booking.booking_number,
        customer_id = %customer_id,
        "Booking created"
    );
    Ok((StatusCode::CREATED, Json(api_success(detail))))
}

/// Edit a DRAFT booking
///
/// A supplied passenger list replaces the manifest.
#[utoipa::path(
    put,
    path = "/api/v1/bookings/{id}",
    request_body = BookingChanges,
    responses(
        (status = 200, description = "Booking updated successfully", body = BookingDetail),
        (status = 400, description = "Invalid booking details"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Booking is no longer editable")
    ),
    params(("id" = Uuid, Path, description = "Booking ID")),
    tag = "bookings",
    security(("bearer_auth" = []))
)]
pub async fn update_booking(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(changes): Json<BookingChanges>,
) -> Result<Json<ApiResponse<BookingDetail>>, ApiError> {
    let scope = write_scope(&auth)?;

    let mut tx = TransactionManager::new(&server.db_pool)
        .labelled("update_booking")
        .begin()
        .await?;

    let current = Booking::fetch_for_update(&mut *tx, id).await?;
    if !scope.allows(current.customer_id) {
        return Err(ApiError::not_found("booking"));
    }
    if !current.status.is_editable() {
        return Err(BookingError::NotEditable(current.status).into());
    }

    let new_count = BookingService::new().validate_changes(
        &changes,
        &current.origin,
        &current.destination,
        today(),
    )?;

    let booking = sqlx::query_as::<_, Booking>(
        r"
        UPDATE bookings SET
            origin = COALESCE($2, origin),
            destination = COALESCE($3, destination),
            travel_date = COALESCE($4, travel_date),
            travel_class = COALESCE($5, travel_class),
            quota = COALESCE($6, quota),
            estimated_fare = COALESCE($7, estimated_fare),
            remarks = COALESCE($8, remarks),
            passenger_count = COALESCE($9, passenger_count),
            modified_by = $10,
            modified_on = NOW()
        WHERE id = $1
        RETURNING *
        ",
    )
    .bind(id)
    .bind(changes.origin.as_deref().map(str::trim))
    .bind(changes.destination.as_deref().map(str::trim))
    .bind(changes.travel_date)
    .bind(changes.travel_class.as_deref().map(str::trim))
    .bind(changes.quota.as_deref().map(|q| q.trim().to_uppercase()))
    .bind(changes.estimated_fare)
    .bind(&changes.remarks)
    .bind(new_count)
    .bind(auth.user_id)
    .fetch_one(&mut *tx)
    .await?;

    if let Some(passengers) = &changes.passengers {
        sqlx::query("DELETE FROM passengers WHERE booking_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_passengers(&mut tx, id, passengers, auth.user_id).await?;
    }

    AuditService::log_action(
        &mut *tx,
        &auth,
        "booking",
        id,
        "updated",
        Some(json!({ "manifest_replaced": changes.passengers.is_some() })),
    )
    .await?;

    let detail = load_detail(&mut tx, booking).await?;
    tx.commit().await?;

    Ok(Json(api_success(detail)))
}

/// Delete a booking and its passengers
///
/// Refused with 409 while a billing or payments reference the booking.
#[utoipa::path(
    delete,
    path = "/api/v1/bookings/{id}",
    responses(
        (status = 204, description = "Booking deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Billing or payments reference this booking")
    ),
    params(("id" = Uuid, Path, description = "Booking ID")),
    tag = "bookings",
    security(("bearer_auth" = []))
)]
pub async fn delete_booking(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    auth.require_permission(permissions::BOOKINGS_DELETE)?;

    let mut tx = TransactionManager::new(&server.db_pool)
        .labelled("delete_booking")
        .begin()
        .await?;

    let booking = Booking::fetch_for_update(&mut *tx, id).await?;

    let passengers = sqlx::query("DELETE FROM passengers WHERE booking_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    sqlx::query("DELETE FROM bookings WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    AuditService::log_action(
        &mut *tx,
        &auth,
        "booking",
        id,
        "deleted",
        Some(json!({
            "booking_number": booking.booking_number,
            "passengers_removed": passengers,
        })),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        booking_id = %id,
        booking_number = %booking.booking_number,
        passengers_removed = passengers,
        "Booking deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}

/// Run a workflow action under row locks on the booking and its billing
async fn transition(
    server: &YatraServer,
    auth: &AuthContext,
    id: Uuid,
    action: BookingAction,
) -> Result<BookingDetail, ApiError> {
    auth.require_permission(permissions::BOOKINGS_WRITE)?;

    let mut tx = TransactionManager::new(&server.db_pool)
        .labelled("booking_transition")
        .begin()
        .await?;

    let booking = Booking::fetch_for_update(&mut *tx, id).await?;
    let open_billing = billing_for_booking_for_update(&mut tx, id)
        .await?
        .filter(|b| b.status != BillingStatus::Cancelled);

    let payments_received: Decimal = sqlx::query_scalar(
        "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE booking_id = $1 AND status = 'RECEIVED'",
    )
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    let guards = TransitionGuards {
        has_billing: open_billing.is_some(),
        amount_received: open_billing
            .as_ref()
            .map_or(Decimal::ZERO, |b| b.paid_amount)
            .max(payments_received),
    };
    let next = apply_action(booking.status, action, guards)?;

    let updated = sqlx::query_as::<_, Booking>(
        r"
        UPDATE bookings SET
            status = $2,
            modified_by = $3,
            modified_on = NOW(),
            closed_by = CASE WHEN $4 THEN $3 ELSE closed_by END,
            closed_on = CASE WHEN $4 THEN NOW() ELSE closed_on END
        WHERE id = $1
        RETURNING *
        ",
    )
    .bind(id)
    .bind(next.as_str())
    .bind(auth.user_id)
    .bind(next.is_terminal())
    .fetch_one(&mut *tx)
    .await?;

    if action == BookingAction::Cancel {
        if let Some(bill) = &open_billing {
            sqlx::query(
                r"
                UPDATE billings SET status = $2, modified_by = $3, modified_on = NOW(),
                    closed_by = $3, closed_on = NOW()
                WHERE id = $1
                ",
            )
            .bind(bill.id)
            .bind(BillingStatus::Cancelled.as_str())
            .bind(auth.user_id)
            .execute(&mut *tx)
            .await?;

            let reversal = billing_reversal(&bill.bill_number, &bill.posting_amounts());
            post_auto_voucher(&mut tx, &reversal, today(), ("billing", bill.id), Some(auth.user_id))
                .await?;
            tracing::info!(billing_id = %bill.id, bill_number = %bill.bill_number, "Billing cancelled with booking");
        }
    }

    AuditService::log_action(
        &mut *tx,
        auth,
        "booking",
        id,
        next.as_str(),
        Some(json!({ "from": booking.status, "to": next })),
    )
    .await?;

    let detail = load_detail(&mut tx, updated).await?;
    tx.commit().await?;

    tracing::info!(
        booking_id = %id,
        booking_number = %detail.booking.booking_number,
        from = %booking.status,
        to = %next,
        "Booking status changed"
    );
    Ok(detail)
}

/// Confirm a DRAFT booking
#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/confirm",
    responses(
        (status = 200, description = "Booking confirmed", body = BookingDetail),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Booking is not in DRAFT")
    ),
    params(("id" = Uuid, Path, description = "Booking ID")),
    tag = "bookings",
    security(("bearer_auth" = []))
)]
pub async fn confirm_booking(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<BookingDetail>>, ApiError> {
    let detail = transition(&server, &auth, id, BookingAction::Confirm).await?;

    let booking = &detail.booking;
    notify_customer(
        &server,
        booking.customer_id,
        NotificationTemplate::BookingConfirmed,
        format!("Booking {} confirmed", booking.booking_number),
        json!({
            "booking_number": booking.booking_number,
            "origin": booking.origin,
            "destination": booking.destination,
            "travel_date": booking.travel_date,
            "passenger_count": booking.passenger_count,
        }),
    )
    .await;

    Ok(Json(api_success(detail).with_message("Booking confirmed")))
}

/// Cancel a booking; an unpaid billing is cancelled and reversed with it
#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/cancel",
    responses(
        (status = 200, description = "Booking cancelled", body = BookingDetail),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Already closed or money has been received")
    ),
    params(("id" = Uuid, Path, description = "Booking ID")),
    tag = "bookings",
    security(("bearer_auth" = []))
)]
pub async fn cancel_booking(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<BookingDetail>>, ApiError> {
    let detail = transition(&server, &auth, id, BookingAction::Cancel).await?;
    Ok(Json(api_success(detail).with_message("Booking cancelled")))
}

/// Complete a billed, CONFIRMED booking
#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/complete",
    responses(
        (status = 200, description = "Booking completed", body = BookingDetail),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Booking is not confirmed or has no billing")
    ),
    params(("id" = Uuid, Path, description = "Booking ID")),
    tag = "bookings",
    security(("bearer_auth" = []))
)]
pub async fn complete_booking(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<BookingDetail>>, ApiError> {
    let detail = transition(&server, &auth, id, BookingAction::Complete).await?;
    Ok(Json(api_success(detail).with_message("Booking completed")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::RoleCode;
    use crate::middleware::RequestContext;

    fn ctx(role: RoleCode, customer_id: Option<Uuid>) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            role,
            user_type: role.user_type(),
            email: "someone@yatrasathi.in".to_string(),
            customer_id,
            request: RequestContext::new(),
        }
    }

    #[test]
    fn staff_write_any_customer() {
        assert_eq!(write_scope(&ctx(RoleCode::Agt, None)).unwrap(), AccessScope::All);
        assert_eq!(write_scope(&ctx(RoleCode::Adm, None)).unwrap(), AccessScope::All);
    }

    #[test]
    fn customers_write_only_their_own() {
        let own = Uuid::new_v4();
        assert_eq!(
            write_scope(&ctx(RoleCode::Cus, Some(own))).unwrap(),
            AccessScope::Customer(own)
        );
        assert!(write_scope(&ctx(RoleCode::Cus, None)).is_err());
    }

    #[test]
    fn accountants_cannot_write_bookings() {
        assert!(write_scope(&ctx(RoleCode::Acc, None)).is_err());
    }

    #[test]
    fn create_request_flattens_the_draft() {
        let req: CreateBookingRequest = serde_json::from_value(serde_json::json!({
            "origin": "NDLS",
            "destination": "BCT",
            "travel_date": "2026-12-01",
            "travel_class": "3A",
            "passengers": [{ "name": "Asha", "age": 34, "gender": "FEMALE" }]
        }))
        .unwrap();
        assert!(req.customer_id.is_none());
        assert_eq!(req.booking.origin, "NDLS");
        assert_eq!(req.booking.passengers.len(), 1);
    }

    #[test]
    fn search_filter_spans_number_and_route() {
        let params = ListBookingsParams {
            status: Some(BookingStatus::Confirmed),
            customer_id: None,
            from_date: None,
            to_date: None,
            search: Some("BCT".to_string()),
            page: None,
            page_size: None,
        };
        let mut query = PaginatedQuery::new("SELECT * FROM bookings WHERE 1=1");
        params.apply(&mut query, None);
        let sql = query.sql();
        assert!(sql.contains("status = $1"));
        assert!(sql.contains("booking_number ILIKE $2"));
        assert!(sql.contains("destination ILIKE $4"));
    }

    #[test]
    fn customer_scope_overrides_requested_customer() {
        let params = ListBookingsParams {
            status: None,
            customer_id: Some(Uuid::new_v4()),
            from_date: None,
            to_date: None,
            search: None,
            page: None,
            page_size: None,
        };
        let mut query = PaginatedQuery::new("SELECT COUNT(*) FROM bookings WHERE 1=1");
        params.apply(&mut query, Some(Uuid::new_v4()));
        assert_eq!(query.sql().matches("customer_id").count(), 1);
    }
}
