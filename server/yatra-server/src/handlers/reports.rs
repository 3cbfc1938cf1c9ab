//! Read-time reports
//!
//! Every report builds a `ReportTable` and is returned in the envelope as
//! JSON or downloaded as CSV, XLSX or PDF depending on `?format=`.

use axum::{
    extract::{Query, State},
    response::Response,
};
use billing_service::{
    aging_report, summarize_collections, BillingStatus, OutstandingItem, PaymentMode,
};
use booking_service::BookingStatus;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::FromRow;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::auth::permissions;
use crate::error::ApiError;
use crate::handlers::accounting::{compute_trial_balance, statement_for};
use crate::handlers::common::today;
use crate::handlers::payments::PAYMENT_RECEIVED;
use crate::middleware::AuthContext;
use crate::server::YatraServer;
use crate::services::{export_response, Cell, ReportFormat, ReportTable};
use crate::utils::query_builder::PaginatedQuery;

fn check_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<(), ApiError> {
    match (from, to) {
        (Some(from), Some(to)) if from > to => {
            Err(ApiError::validation("from_date must not be after to_date"))
        }
        _ => Ok(()),
    }
}

/// Bookings Report Query Parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct BookingsReportParams {
    /// Travel date range start
    pub from_date: Option<NaiveDate>,
    /// Travel date range end
    pub to_date: Option<NaiveDate>,
    pub status: Option<BookingStatus>,
    pub customer_id: Option<Uuid>,
    #[serde(default)]
    pub format: ReportFormat,
}

#[derive(Debug, FromRow)]
struct BookingReportRow {
    booking_number: String,
    customer_name: String,
    origin: String,
    destination: String,
    travel_date: NaiveDate,
    travel_class: String,
    passenger_count: i32,
    status: String,
    estimated_fare: Decimal,
}

fn bookings_table(rows: &[BookingReportRow]) -> ReportTable {
    let mut table = ReportTable::new(
        "Bookings",
        vec![
            "Booking", "Customer", "Route", "Travel Date", "Class", "Pax", "Status", "Est. Fare",
        ],
    );
    for row in rows {
        table.push_row(vec![
            Cell::text(&row.booking_number),
            Cell::text(&row.customer_name),
            Cell::text(format!("{} - {}", row.origin, row.destination)),
            Cell::Date(row.travel_date),
            Cell::text(&row.travel_class),
            Cell::Count(i64::from(row.passenger_count)),
            Cell::text(&row.status),
            Cell::Amount(row.estimated_fare),
        ]);
    }
    table
}

/// Bookings by travel date
#[utoipa::path(
    get,
    path = "/api/v1/reports/bookings",
    responses(
        (status = 200, description = "Report as JSON or a file download"),
        (status = 400, description = "Invalid date range"),
        (status = 403, description = "Forbidden")
    ),
    params(BookingsReportParams),
    tag = "reports",
    security(("bearer_auth" = []))
)]
pub async fn bookings_report(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Query(params): Query<BookingsReportParams>,
) -> Result<Response, ApiError> {
    auth.require_permission(permissions::REPORTS_READ)?;
    check_range(params.from_date, params.to_date)?;

    let mut query = PaginatedQuery::new(
        r"SELECT b.booking_number, c.name AS customer_name, b.origin, b.destination,
                 b.travel_date, b.travel_class, b.passenger_count, b.status, b.estimated_fare
          FROM bookings b JOIN customers c ON c.id = b.customer_id
          WHERE 1=1",
    );
    query
        .filter_gte("b.travel_date", params.from_date)
        .filter_lte("b.travel_date", params.to_date)
        .filter_eq("b.status", params.status.map(BookingStatus::as_str))
        .filter_eq("b.customer_id", params.customer_id)
        .order_by("b.travel_date, b.booking_number", "ASC");
    let rows: Vec<BookingReportRow> = query.build_query_as().fetch_all(&server.db_pool).await?;

    export_response(&bookings_table(&rows), params.format, "bookings")
}

/// Outstanding Report Query Parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct OutstandingReportParams {
    pub customer_id: Option<Uuid>,
    /// Defaults to every open status
    pub status: Option<BillingStatus>,
    #[serde(default)]
    pub format: ReportFormat,
}

#[derive(Debug, FromRow)]
struct OutstandingRow {
    bill_number: String,
    bill_date: NaiveDate,
    customer_name: String,
    total_amount: Decimal,
    paid_amount: Decimal,
    status: String,
}

fn outstanding_table(rows: &[OutstandingRow]) -> ReportTable {
    let mut table = ReportTable::new(
        "Outstanding Bills",
        vec!["Bill", "Date", "Customer", "Total", "Paid", "Outstanding", "Status"],
    );
    let mut totals = (Decimal::ZERO, Decimal::ZERO);
    for row in rows {
        let due = (row.total_amount - row.paid_amount).max(Decimal::ZERO);
        totals.0 += row.total_amount;
        totals.1 += row.paid_amount;
        table.push_row(vec![
            Cell::text(&row.bill_number),
            Cell::Date(row.bill_date),
            Cell::text(&row.customer_name),
            Cell::Amount(row.total_amount),
            Cell::Amount(row.paid_amount),
            Cell::Amount(due),
            Cell::text(&row.status),
        ]);
    }
    table.push_row(vec![
        Cell::text("Total"),
        Cell::Empty,
        Cell::Empty,
        Cell::Amount(totals.0),
        Cell::Amount(totals.1),
        Cell::Amount(totals.0 - totals.1),
        Cell::Empty,
    ]);
    table
}

/// Billing and outstanding balances
#[utoipa::path(
    get,
    path = "/api/v1/reports/outstanding",
    responses(
        (status = 200, description = "Report as JSON or a file download"),
        (status = 403, description = "Forbidden")
    ),
    params(OutstandingReportParams),
    tag = "reports",
    security(("bearer_auth" = []))
)]
pub async fn outstanding_report(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Query(params): Query<OutstandingReportParams>,
) -> Result<Response, ApiError> {
    auth.require_permission(permissions::REPORTS_READ)?;

    let mut query = PaginatedQuery::new(
        r"SELECT b.bill_number, b.bill_date, c.name AS customer_name,
                 b.total_amount, b.paid_amount, b.status
          FROM billings b JOIN customers c ON c.id = b.customer_id
          WHERE 1=1",
    );
    match params.status {
        Some(status) => {
            query.filter_eq("b.status", Some(status.as_str()));
        }
        None => {
            query
                .query_builder()
                .push(" AND b.status IN ('UNPAID', 'PARTIALLY_PAID')");
        }
    }
    query
        .filter_eq("b.customer_id", params.customer_id)
        .order_by("b.bill_date, b.bill_number", "ASC");
    let rows: Vec<OutstandingRow> = query.build_query_as().fetch_all(&server.db_pool).await?;

    export_response(&outstanding_table(&rows), params.format, "outstanding")
}

/// Collections Report Query Parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct CollectionsReportParams {
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub mode: Option<PaymentMode>,
    #[serde(default)]
    pub format: ReportFormat,
}

#[derive(Debug, FromRow)]
struct CollectionRow {
    payment_number: String,
    payment_date: NaiveDate,
    customer_name: String,
    #[sqlx(try_from = "String")]
    mode: PaymentMode,
    reference_no: Option<String>,
    amount: Decimal,
}

fn collections_table(rows: &[CollectionRow]) -> ReportTable {
    let mut table = ReportTable::new(
        "Collections",
        vec!["Payment", "Date", "Customer", "Mode", "Reference", "Amount"],
    );
    for row in rows {
        table.push_row(vec![
            Cell::text(&row.payment_number),
            Cell::Date(row.payment_date),
            Cell::text(&row.customer_name),
            Cell::text(row.mode.as_str()),
            Cell::opt_text(row.reference_no.as_deref()),
            Cell::Amount(row.amount),
        ]);
    }

    let by_mode: Vec<(PaymentMode, Decimal)> = rows.iter().map(|r| (r.mode, r.amount)).collect();
    let summary = summarize_collections(&by_mode);
    for mode in &summary.by_mode {
        table.push_row(vec![
            Cell::text(format!("Total {}", mode.mode)),
            Cell::Empty,
            Cell::Empty,
            Cell::text(mode.mode.as_str()),
            Cell::text(format!("{} payments", mode.count)),
            Cell::Amount(mode.amount),
        ]);
    }
    table.push_row(vec![
        Cell::text("Grand Total"),
        Cell::Empty,
        Cell::Empty,
        Cell::Empty,
        Cell::text(format!("{} payments", summary.count)),
        Cell::Amount(summary.total),
    ]);
    table
}

/// Payments received over a period
#[utoipa::path(
    get,
    path = "/api/v1/reports/collections",
    responses(
        (status = 200, description = "Report as JSON or a file download"),
        (status = 400, description = "Invalid date range"),
        (status = 403, description = "Forbidden")
    ),
    params(CollectionsReportParams),
    tag = "reports",
    security(("bearer_auth" = []))
)]
pub async fn collections_report(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Query(params): Query<CollectionsReportParams>,
) -> Result<Response, ApiError> {
    auth.require_permission(permissions::REPORTS_READ)?;
    check_range(params.from_date, params.to_date)?;

    let mut query = PaginatedQuery::new(
        r"SELECT p.payment_number, p.payment_date, c.name AS customer_name,
                 p.mode, p.reference_no, p.amount
          FROM payments p JOIN customers c ON c.id = p.customer_id
          WHERE 1=1",
    );
    query
        .add_base_filter("p.status", PAYMENT_RECEIVED)
        .filter_gte("p.payment_date", params.from_date)
        .filter_lte("p.payment_date", params.to_date)
        .filter_eq("p.mode", params.mode.map(PaymentMode::as_str))
        .order_by("p.payment_date, p.payment_number", "ASC");
    let rows: Vec<CollectionRow> = query.build_query_as().fetch_all(&server.db_pool).await?;

    export_response(&collections_table(&rows), params.format, "collections")
}

/// As-Of Report Query Parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct AsOfReportParams {
    /// Defaults to today
    pub as_of: Option<NaiveDate>,
    #[serde(default)]
    pub format: ReportFormat,
}

#[derive(Debug, FromRow)]
struct OutstandingAsOfRow {
    customer_id: Uuid,
    customer_name: String,
    bill_date: NaiveDate,
    outstanding: Decimal,
}

/// Receivables by customer in 0-30, 31-60, 61-90 and 90+ day buckets
#[utoipa::path(
    get,
    path = "/api/v1/reports/customer-aging",
    responses(
        (status = 200, description = "Report as JSON or a file download"),
        (status = 403, description = "Forbidden")
    ),
    params(AsOfReportParams),
    tag = "reports",
    security(("bearer_auth" = []))
)]
pub async fn customer_aging_report(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Query(params): Query<AsOfReportParams>,
) -> Result<Response, ApiError> {
    auth.require_permission(permissions::REPORTS_READ)?;
    let as_of = params.as_of.unwrap_or_else(today);

    // Payments dated after `as_of` do not reduce what was due on that day
    let rows: Vec<OutstandingAsOfRow> = sqlx::query_as(
        r"
        SELECT b.customer_id, c.name AS customer_name, b.bill_date,
               b.total_amount - COALESCE((
                   SELECT SUM(pa.amount)
                   FROM payment_allocations pa
                   JOIN payments p ON p.id = pa.payment_id
                   WHERE pa.billing_id = b.id AND p.status = $2 AND p.payment_date <= $1
               ), 0) AS outstanding
        FROM billings b
        JOIN customers c ON c.id = b.customer_id
        WHERE b.status <> 'CANCELLED' AND b.bill_date <= $1
        ",
    )
    .bind(as_of)
    .bind(PAYMENT_RECEIVED)
    .fetch_all(&server.db_pool)
    .await?;

    let items: Vec<OutstandingItem> = rows
        .into_iter()
        .map(|r| OutstandingItem {
            customer_id: r.customer_id,
            customer_name: r.customer_name,
            bill_date: r.bill_date,
            outstanding: r.outstanding,
        })
        .collect();

    let mut table = ReportTable::new(
        format!("Customer Aging as of {as_of}"),
        vec!["Customer", "0-30", "31-60", "61-90", "90+", "Total Due"],
    );
    for row in aging_report(as_of, &items) {
        table.push_row(vec![
            Cell::text(row.customer_name),
            Cell::Amount(row.age_0_30),
            Cell::Amount(row.age_31_60),
            Cell::Amount(row.age_61_90),
            Cell::Amount(row.age_91_plus),
            Cell::Amount(row.total_due),
        ]);
    }

    export_response(&table, params.format, &format!("customer-aging-{as_of}"))
}

/// Trial balance as a report
#[utoipa::path(
    get,
    path = "/api/v1/reports/trial-balance",
    responses(
        (status = 200, description = "Report as JSON or a file download"),
        (status = 403, description = "Forbidden")
    ),
    params(AsOfReportParams),
    tag = "reports",
    security(("bearer_auth" = []))
)]
pub async fn trial_balance_report(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Query(params): Query<AsOfReportParams>,
) -> Result<Response, ApiError> {
    auth.require_permission(permissions::REPORTS_READ)?;
    let as_of = params.as_of.unwrap_or_else(today);
    let report = compute_trial_balance(&server.db_pool, as_of).await?;

    let mut table = ReportTable::new(
        format!("Trial Balance as of {as_of}"),
        vec!["Code", "Account", "Type", "Debit", "Credit"],
    );
    for row in &report.rows {
        table.push_row(vec![
            Cell::text(&row.code),
            Cell::text(&row.name),
            Cell::text(row.account_type.as_str()),
            Cell::Amount(row.debit),
            Cell::Amount(row.credit),
        ]);
    }
    table.push_row(vec![
        Cell::text("Total"),
        Cell::text(if report.is_balanced { "Balanced" } else { "NOT BALANCED" }),
        Cell::Empty,
        Cell::Amount(report.total_debit),
        Cell::Amount(report.total_credit),
    ]);

    export_response(&table, params.format, &format!("trial-balance-{as_of}"))
}

/// Account Statement Report Query Parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct StatementReportParams {
    pub account_id: Uuid,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    #[serde(default)]
    pub format: ReportFormat,
}

/// Ledger account statement as a report
#[utoipa::path(
    get,
    path = "/api/v1/reports/account-statement",
    responses(
        (status = 200, description = "Report as JSON or a file download"),
        (status = 400, description = "Invalid date range"),
        (status = 404, description = "Ledger account not found")
    ),
    params(StatementReportParams),
    tag = "reports",
    security(("bearer_auth" = []))
)]
pub async fn account_statement_report(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Query(params): Query<StatementReportParams>,
) -> Result<Response, ApiError> {
    auth.require_permission(permissions::REPORTS_READ)?;
    let statement =
        statement_for(&server, params.account_id, params.from_date, params.to_date).await?;

    let mut table = ReportTable::new(
        "Account Statement",
        vec!["Date", "Voucher", "Narration", "Debit", "Credit", "Balance"],
    );
    table.push_row(vec![
        statement.from.map_or(Cell::Empty, Cell::Date),
        Cell::text("Opening balance"),
        Cell::Empty,
        Cell::Empty,
        Cell::Empty,
        Cell::Amount(statement.opening_balance),
    ]);
    for line in &statement.lines {
        table.push_row(vec![
            Cell::Date(line.voucher_date),
            Cell::text(&line.voucher_number),
            Cell::opt_text(line.narration.as_deref()),
            Cell::Amount(line.debit),
            Cell::Amount(line.credit),
            Cell::Amount(line.running_balance),
        ]);
    }
    table.push_row(vec![
        statement.to.map_or(Cell::Empty, Cell::Date),
        Cell::text("Closing balance"),
        Cell::Empty,
        Cell::Amount(statement.total_debit),
        Cell::Amount(statement.total_credit),
        Cell::Amount(statement.closing_balance),
    ]);

    export_response(&table, params.format, "account-statement")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    #[test]
    fn outstanding_table_ends_with_totals() {
        let rows = vec![
            OutstandingRow {
                bill_number: "BL/2026-27/000001".into(),
                bill_date: date(1),
                customer_name: "Asha Rao".into(),
                total_amount: dec!(1180.00),
                paid_amount: dec!(500.00),
                status: "PARTIALLY_PAID".into(),
            },
            OutstandingRow {
                bill_number: "BL/2026-27/000002".into(),
                bill_date: date(2),
                customer_name: "Vikram Shah".into(),
                total_amount: dec!(590.00),
                paid_amount: dec!(0),
                status: "UNPAID".into(),
            },
        ];
        let table = outstanding_table(&rows);
        assert_eq!(table.rows.len(), 3);
        let total = table.rows.last().unwrap();
        assert_eq!(total[5], Cell::Amount(dec!(1270.00)));
    }

    #[test]
    fn collections_table_adds_mode_and_grand_totals() {
        let rows = vec![
            CollectionRow {
                payment_number: "PT/2026-27/000001".into(),
                payment_date: date(5),
                customer_name: "Asha Rao".into(),
                mode: PaymentMode::Cash,
                reference_no: None,
                amount: dec!(500),
            },
            CollectionRow {
                payment_number: "PT/2026-27/000002".into(),
                payment_date: date(6),
                customer_name: "Vikram Shah".into(),
                mode: PaymentMode::Upi,
                reference_no: Some("UPI123".into()),
                amount: dec!(250.50),
            },
        ];
        let table = collections_table(&rows);
        // two payments, two mode totals, one grand total
        assert_eq!(table.rows.len(), 5);
        assert_eq!(table.rows.last().unwrap()[5], Cell::Amount(dec!(750.50)));
    }

    #[test]
    fn reversed_range_is_rejected() {
        assert!(check_range(Some(date(10)), Some(date(1))).is_err());
        assert!(check_range(Some(date(1)), None).is_ok());
    }

    #[test]
    fn format_defaults_to_json() {
        let params: AsOfReportParams = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(params.format, ReportFormat::Json);

        let params: AsOfReportParams =
            serde_json::from_value(serde_json::json!({ "format": "xlsx" })).unwrap();
        assert_eq!(params.format, ReportFormat::Xlsx);
    }
}
