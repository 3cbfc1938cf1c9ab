use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use database_layer::AuditFields;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{api_success, ApiError, ApiResponse};
use crate::handlers::common::ResourceTable;
use crate::handlers::payments::Payment;
use crate::middleware::AuthContext;
use crate::server::YatraServer;
use crate::types::pagination::PaginationParams;
use crate::utils::query_builder::PaginatedQuery;

/// Receipt issued for a recorded payment
#[derive(Debug, Serialize, Deserialize, ToSchema, FromRow, Clone)]
pub struct Receipt {
    pub id: Uuid,
    pub receipt_number: String,
    pub payment_id: Uuid,
    pub customer_id: Uuid,
    pub amount: Decimal,
    pub receipt_date: NaiveDate,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: AuditFields,
}

impl ResourceTable for Receipt {
    const TABLE: &'static str = "receipts";
    const RESOURCE: &'static str = "receipt";
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReceiptDetail {
    #[serde(flatten)]
    pub receipt: Receipt,
    pub payment: Payment,
}

/// List Receipts Query Parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListReceiptsParams {
    pub customer_id: Option<Uuid>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl ListReceiptsParams {
    fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            page_size: self.page_size,
        }
    }

    fn apply(&self, query: &mut PaginatedQuery<'_>, own_customer: Option<Uuid>) {
        query
            .filter_eq("customer_id", own_customer.or(self.customer_id))
            .filter_gte("receipt_date", self.from_date)
            .filter_lte("receipt_date", self.to_date);
    }
}

/// List receipts
#[utoipa::path(
    get,
    path = "/api/v1/receipts",
    responses(
        (status = 200, description = "Receipts retrieved successfully", body = Vec<Receipt>),
        (status = 401, description = "Unauthorized")
    ),
    params(ListReceiptsParams),
    tag = "payments",
    security(("bearer_auth" = []))
)]
pub async fn list_receipts(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Query(params): Query<ListReceiptsParams>,
) -> Result<Json<ApiResponse<Vec<Receipt>>>, ApiError> {
    let own_customer = auth.payment_scope()?.customer_filter();
    let pagination = params.pagination();

    let mut count_query = PaginatedQuery::new("SELECT COUNT(*) FROM receipts WHERE 1=1");
    params.apply(&mut count_query, own_customer);
    let total: i64 = count_query
        .build_query_scalar()
        .fetch_one(&server.db_pool)
        .await?;

    let mut query = PaginatedQuery::new("SELECT * FROM receipts WHERE 1=1");
    params.apply(&mut query, own_customer);
    query.order_by("receipt_date DESC, receipt_number", "DESC").paginate(&pagination);
    let receipts: Vec<Receipt> = query.build_query_as().fetch_all(&server.db_pool).await?;

    Ok(Json(pagination.wrap_response(receipts, total)))
}

/// Get a receipt with the payment it acknowledges
#[utoipa::path(
    get,
    path = "/api/v1/receipts/{id}",
    responses(
        (status = 200, description = "Receipt retrieved successfully", body = ReceiptDetail),
        (status = 404, description = "Receipt not found")
    ),
    params(("id" = Uuid, Path, description = "Receipt ID")),
    tag = "payments",
    security(("bearer_auth" = []))
)]
pub async fn get_receipt(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ReceiptDetail>>, ApiError> {
    let scope = auth.payment_scope()?;
    let receipt = Receipt::fetch_by_id(&server.db_pool, id).await?;
    if !scope.allows(receipt.customer_id) {
        return Err(ApiError::not_found("receipt"));
    }
    let payment = Payment::fetch_by_id(&server.db_pool, receipt.payment_id).await?;

    Ok(Json(api_success(ReceiptDetail { receipt, payment })))
}
