use axum::{extract::State, Json};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{permissions, RoleCode};
use crate::error::{api_success, ApiError, ApiResponse};
use crate::handlers::accounting::count_unbalanced_vouchers;
use crate::handlers::bookings::Booking;
use crate::handlers::common::today;
use crate::handlers::payments::PAYMENT_RECEIVED;
use crate::middleware::AuthContext;
use crate::server::YatraServer;
use crate::utils::query_builder::PaginatedQuery;

const RECENT_BOOKINGS: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema, FromRow)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

/// Billed, collected and still due
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Receivables {
    pub total_billed: Decimal,
    pub total_collected: Decimal,
    pub outstanding: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ManagementDashboard {
    pub bookings_by_status: Vec<StatusCount>,
    #[serde(flatten)]
    pub receivables: Receivables,
    pub recent_bookings: Vec<Booking>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AgentDashboard {
    pub my_bookings_by_status: Vec<StatusCount>,
    pub travelling_today: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccountsDashboard {
    #[serde(flatten)]
    pub receivables: Receivables,
    pub collected_today: Decimal,
    pub payments_today: i64,
    /// Journal and contra vouchers whose lines do not balance; expected zero
    pub unbalanced_vouchers: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerDashboard {
    pub bookings_by_status: Vec<StatusCount>,
    pub outstanding: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum DashboardView {
    Management(ManagementDashboard),
    Agent(AgentDashboard),
    Accounts(AccountsDashboard),
    Customer(CustomerDashboard),
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Dashboard {
    pub role: RoleCode,
    pub as_of: NaiveDate,
    #[serde(flatten)]
    pub view: DashboardView,
}

async fn bookings_by_status(
    pool: &PgPool,
    customer_id: Option<Uuid>,
    entered_by: Option<Uuid>,
) -> Result<Vec<StatusCount>, ApiError> {
    let mut query = PaginatedQuery::new("SELECT status, COUNT(*) AS count FROM bookings WHERE 1=1");
    query
        .filter_eq("customer_id", customer_id)
        .filter_eq("entered_by", entered_by)
        .query_builder()
        .push(" GROUP BY status ORDER BY status");
    Ok(query.build_query_as().fetch_all(pool).await?)
}

async fn receivables(pool: &PgPool, customer_id: Option<Uuid>) -> Result<Receivables, ApiError> {
    let (total_billed, outstanding): (Decimal, Decimal) = sqlx::query_as(
        r"
        SELECT COALESCE(SUM(total_amount), 0),
               COALESCE(SUM(GREATEST(total_amount - paid_amount, 0)), 0)
        FROM billings
        WHERE status <> 'CANCELLED' AND ($1::uuid IS NULL OR customer_id = $1)
        ",
    )
    .bind(customer_id)
    .fetch_one(pool)
    .await?;

    let total_collected: Decimal = sqlx::query_scalar(
        r"
        SELECT COALESCE(SUM(amount), 0)
        FROM payments
        WHERE status = $1 AND ($2::uuid IS NULL OR customer_id = $2)
        ",
    )
    .bind(PAYMENT_RECEIVED)
    .bind(customer_id)
    .fetch_one(pool)
    .await?;

    Ok(Receivables {
        total_billed,
        total_collected,
        outstanding,
    })
}

async fn management_view(pool: &PgPool) -> Result<DashboardView, ApiError> {
    let recent_bookings: Vec<Booking> =
        sqlx::query_as("SELECT * FROM bookings ORDER BY entered_on DESC LIMIT $1")
            .bind(RECENT_BOOKINGS)
            .fetch_all(pool)
            .await?;

    Ok(DashboardView::Management(ManagementDashboard {
        bookings_by_status: bookings_by_status(pool, None, None).await?,
        receivables: receivables(pool, None).await?,
        recent_bookings,
    }))
}

async fn agent_view(pool: &PgPool, agent_id: Uuid, today: NaiveDate) -> Result<DashboardView, ApiError> {
    let travelling_today: i64 = sqlx::query_scalar(
        r"
        SELECT COUNT(*) FROM bookings
        WHERE entered_by = $1 AND travel_date = $2 AND status <> 'CANCELLED'
        ",
    )
    .bind(agent_id)
    .bind(today)
    .fetch_one(pool)
    .await?;

    Ok(DashboardView::Agent(AgentDashboard {
        my_bookings_by_status: bookings_by_status(pool, None, Some(agent_id)).await?,
        travelling_today,
    }))
}

async fn accounts_view(pool: &PgPool, today: NaiveDate) -> Result<DashboardView, ApiError> {
    let (payments_today, collected_today): (i64, Decimal) = sqlx::query_as(
        r"
        SELECT COUNT(*), COALESCE(SUM(amount), 0)
        FROM payments
        WHERE status = $1 AND payment_date = $2
        ",
    )
    .bind(PAYMENT_RECEIVED)
    .bind(today)
    .fetch_one(pool)
    .await?;

    let unbalanced_vouchers = count_unbalanced_vouchers(pool).await?;
    if unbalanced_vouchers > 0 {
        tracing::warn!(unbalanced_vouchers, "Unbalanced vouchers in the ledger");
    }

    Ok(DashboardView::Accounts(AccountsDashboard {
        receivables: receivables(pool, None).await?,
        collected_today,
        payments_today,
        unbalanced_vouchers,
    }))
}

async fn customer_view(pool: &PgPool, customer_id: Uuid) -> Result<DashboardView, ApiError> {
    Ok(DashboardView::Customer(CustomerDashboard {
        bookings_by_status: bookings_by_status(pool, Some(customer_id), None).await?,
        outstanding: receivables(pool, Some(customer_id)).await?.outstanding,
    }))
}

/// Summary for the caller's role
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    responses(
        (status = 200, description = "Role dashboard", body = Dashboard),
        (status = 401, description = "Unauthorized")
    ),
    tag = "dashboard",
    security(("bearer_auth" = []))
)]
pub async fn get_dashboard(
    State(server): State<YatraServer>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<Dashboard>>, ApiError> {
    auth.require_permission(permissions::DASHBOARD_READ)?;
    let pool = &server.db_pool;
    let as_of = today();

    let view = match auth.role {
        RoleCode::Adm | RoleCode::Mgt => management_view(pool).await?,
        RoleCode::Agt => agent_view(pool, auth.user_id, as_of).await?,
        RoleCode::Acc => accounts_view(pool, as_of).await?,
        RoleCode::Cus => {
            let customer_id = auth
                .customer_id
                .ok_or_else(|| ApiError::authorization("No customer profile is linked to this account"))?;
            customer_view(pool, customer_id).await?
        }
    };

    Ok(Json(api_success(Dashboard {
        role: auth.role,
        as_of,
        view,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn views_flatten_into_one_object() {
        let dashboard = Dashboard {
            role: RoleCode::Cus,
            as_of: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            view: DashboardView::Customer(CustomerDashboard {
                bookings_by_status: vec![StatusCount {
                    status: "CONFIRMED".into(),
                    count: 2,
                }],
                outstanding: dec!(590.00),
            }),
        };
        let value = serde_json::to_value(&dashboard).unwrap();
        assert_eq!(value["role"], "CUS");
        assert_eq!(value["outstanding"], "590.00");
        assert_eq!(value["bookings_by_status"][0]["count"], 2);
    }

    #[test]
    fn receivables_flatten_into_accounts_view() {
        let view = DashboardView::Accounts(AccountsDashboard {
            receivables: Receivables {
                total_billed: dec!(1000),
                total_collected: dec!(400),
                outstanding: dec!(600),
            },
            collected_today: dec!(100),
            payments_today: 1,
            unbalanced_vouchers: 0,
        });
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["outstanding"], "600");
        assert_eq!(value["unbalanced_vouchers"], 0);
    }

    #[test]
    fn status_counts_group_by_status() {
        let mut query =
            PaginatedQuery::new("SELECT status, COUNT(*) AS count FROM bookings WHERE 1=1");
        query
            .filter_eq("entered_by", Some(Uuid::nil()))
            .query_builder()
            .push(" GROUP BY status ORDER BY status");
        assert!(query.sql().ends_with("entered_by = $1 GROUP BY status ORDER BY status"));
    }
}
