use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use database_layer::{next_document_number, AuditFields, DocumentSeries, TransactionManager};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::permissions;
use crate::error::{api_success, ApiError, ApiResponse};
use crate::handlers::common::{today, ResourceTable};
use crate::middleware::AuthContext;
use crate::server::YatraServer;
use crate::services::{notify_quietly, AuditService, Notification, NotificationTemplate};
use crate::types::pagination::PaginationParams;
use crate::utils::query_builder::PaginatedQuery;
use crate::validation::RequestValidation;
use crate::{validate_email, validate_length, validate_required};

/// Customer profile
#[derive(Debug, Serialize, Deserialize, ToSchema, FromRow, Clone)]
pub struct Customer {
    pub id: Uuid,
    pub customer_code: String,
    /// Login account for self-service customers
    pub user_id: Option<Uuid>,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub gstin: Option<String>,
    pub is_active: bool,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: AuditFields,
}

impl ResourceTable for Customer {
    const TABLE: &'static str = "customers";
    const RESOURCE: &'static str = "customer";
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCustomerRequest {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub gstin: Option<String>,
}

impl RequestValidation for CreateCustomerRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.name, "Customer name is required");
        validate_length!(self.name, 1, 200, "Name must be between 1 and 200 characters");
        if let Some(ref email) = self.email {
            validate_email!(email, "Invalid email format");
        }
        if let Some(ref gstin) = self.gstin {
            validate_length!(gstin, 15, 15, "GSTIN must be 15 characters");
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCustomerRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub gstin: Option<String>,
    pub is_active: Option<bool>,
}

impl RequestValidation for UpdateCustomerRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if let Some(ref name) = self.name {
            validate_required!(name, "Customer name cannot be empty");
            validate_length!(name, 1, 200, "Name must be between 1 and 200 characters");
        }
        if let Some(ref email) = self.email {
            validate_email!(email, "Invalid email format");
        }
        if let Some(ref gstin) = self.gstin {
            validate_length!(gstin, 15, 15, "GSTIN must be 15 characters");
        }
        Ok(())
    }
}

/// List Customers Query Parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListCustomersParams {
    /// Matches name, code, email or phone
    pub search: Option<String>,
    pub is_active: Option<bool>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl ListCustomersParams {
    fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            page_size: self.page_size,
        }
    }

    fn apply(&self, query: &mut PaginatedQuery<'_>) {
        query.filter_eq("is_active", self.is_active);
        if let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = format!("%{term}%");
            let builder = query.query_builder();
            builder.push(" AND (name ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR customer_code ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR email ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR phone ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }
    }
}

/// Insert a customer with a freshly allocated customer code
///
/// # Errors
/// Database failures.
pub(crate) async fn insert_customer(
    conn: &mut PgConnection,
    user_id: Option<Uuid>,
    req: &CreateCustomerRequest,
    entered_by: Option<Uuid>,
) -> Result<Customer, ApiError> {
    let customer_code = next_document_number(&mut *conn, DocumentSeries::Customer, today()).await?;

    let customer = sqlx::query_as::<_, Customer>(
        r"
        INSERT INTO customers (customer_code, user_id, name, email, phone, address, gstin, entered_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        ",
    )
    .bind(&customer_code)
    .bind(user_id)
    .bind(req.name.trim())
    .bind(req.email.as_deref().map(str::to_lowercase))
    .bind(&req.phone)
    .bind(&req.address)
    .bind(req.gstin.as_deref().map(str::to_uppercase))
    .bind(entered_by)
    .fetch_one(&mut *conn)
    .await?;

    Ok(customer)
}

/// Send a notification to a customer's email, if one is on file
///
/// Lookup and delivery failures are logged and never fail the request.
pub(crate) async fn notify_customer(
    server: &YatraServer,
    customer_id: Uuid,
    template: NotificationTemplate,
    subject: String,
    context: serde_json::Value,
) {
    let email: Option<Option<String>> =
        match sqlx::query_scalar("SELECT email FROM customers WHERE id = $1")
            .bind(customer_id)
            .fetch_optional(&server.db_pool)
            .await
        {
            Ok(email) => email,
            Err(e) => {
                tracing::warn!(customer_id = %customer_id, error = %e, "Could not look up customer email");
                return;
            }
        };

    let Some(recipient) = email.flatten() else {
        tracing::debug!(customer_id = %customer_id, template = %template, "No email on file; notification skipped");
        return;
    };

    notify_quietly(
        server.notifier.as_ref(),
        Notification::new(recipient, template, subject, context),
    )
    .await;
}

/// List customers
#[utoipa::path(
    get,
    path = "/api/v1/customers",
    responses(
        (status = 200, description = "Customers retrieved successfully", body = Vec<Customer>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    params(ListCustomersParams),
    tag = "customers",
    security(("bearer_auth" = []))
)]
pub async fn list_customers(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Query(params): Query<ListCustomersParams>,
) -> Result<Json<ApiResponse<Vec<Customer>>>, ApiError> {
    auth.require_permission(permissions::CUSTOMERS_READ)?;
    let pagination = params.pagination();

    let mut count_query = PaginatedQuery::new("SELECT COUNT(*) FROM customers WHERE 1=1");
    params.apply(&mut count_query);
    let total: i64 = count_query
        .build_query_scalar()
        .fetch_one(&server.db_pool)
        .await?;

    let mut query = PaginatedQuery::new("SELECT * FROM customers WHERE 1=1");
    params.apply(&mut query);
    query.order_by("name", "ASC").paginate(&pagination);

    let customers: Vec<Customer> = query.build_query_as().fetch_all(&server.db_pool).await?;

    Ok(Json(pagination.wrap_response(customers, total)))
}

/// Get a customer
///
/// Customers may read their own profile.
#[utoipa::path(
    get,
    path = "/api/v1/customers/{id}",
    responses(
        (status = 200, description = "Customer retrieved successfully", body = Customer),
        (status = 404, description = "Customer not found")
    ),
    params(("id" = Uuid, Path, description = "Customer ID")),
    tag = "customers",
    security(("bearer_auth" = []))
)]
pub async fn get_customer(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Customer>>, ApiError> {
    if auth.customer_id != Some(id) {
        auth.require_permission(permissions::CUSTOMERS_READ)?;
    }
    let customer = Customer::fetch_by_id(&server.db_pool, id).await?;
    Ok(Json(api_success(customer)))
}

/// Create a customer
#[utoipa::path(
    post,
    path = "/api/v1/customers",
    request_body = CreateCustomerRequest,
    responses(
        (status = 201, description = "Customer created successfully", body = Customer),
        (status = 400, description = "Invalid request")
    ),
    tag = "customers",
    security(("bearer_auth" = []))
)]
pub async fn create_customer(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Json(req): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Customer>>), ApiError> {
    auth.require_permission(permissions::CUSTOMERS_WRITE)?;
    req.validate()?;

    let mut tx = TransactionManager::new(&server.db_pool)
        .labelled("create_customer")
        .begin()
        .await?;
    let customer = insert_customer(&mut tx, None, &req, Some(auth.user_id)).await?;
    AuditService::log_action(
        &mut *tx,
        &auth,
        "customer",
        customer.id,
        "created",
        Some(serde_json::json!({ "customer_code": customer.customer_code })),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(customer_id = %customer.id, code = %customer.customer_code, "Customer created");
    Ok((StatusCode::CREATED, Json(api_success(customer))))
}

/// Update a customer
#[utoipa::path(
    put,
    path = "/api/v1/customers/{id}",
    request_body = UpdateCustomerRequest,
    responses(
        (status = 200, description = "Customer updated successfully", body = Customer),
        (status = 404, description = "Customer not found")
    ),
    params(("id" = Uuid, Path, description = "Customer ID")),
    tag = "customers",
    security(("bearer_auth" = []))
)]
pub async fn update_customer(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCustomerRequest>,
) -> Result<Json<ApiResponse<Customer>>, ApiError> {
    auth.require_permission(permissions::CUSTOMERS_WRITE)?;
    req.validate()?;

    let customer = sqlx::query_as::<_, Customer>(
        r"
        UPDATE customers SET
            name = COALESCE($2, name),
            email = COALESCE($3, email),
            phone = COALESCE($4, phone),
            address = COALESCE($5, address),
            gstin = COALESCE($6, gstin),
            is_active = COALESCE($7, is_active),
            modified_by = $8,
            modified_on = NOW()
        WHERE id = $1
        RETURNING *
        ",
    )
    .bind(id)
    .bind(req.name.as_deref().map(str::trim))
    .bind(req.email.as_deref().map(str::to_lowercase))
    .bind(&req.phone)
    .bind(&req.address)
    .bind(req.gstin.as_deref().map(str::to_uppercase))
    .bind(req.is_active)
    .bind(auth.user_id)
    .fetch_optional(&server.db_pool)
    .await?
    .ok_or_else(|| ApiError::not_found("customer"))?;

    AuditService::log_quietly(&server.db_pool, &auth, "customer", id, "updated", None).await;
    Ok(Json(api_success(customer)))
}

/// Delete a customer
///
/// Refused with 409 while bookings, bills or payments reference the customer.
#[utoipa::path(
    delete,
    path = "/api/v1/customers/{id}",
    responses(
        (status = 204, description = "Customer deleted"),
        (status = 404, description = "Customer not found"),
        (status = 409, description = "Customer is still referenced")
    ),
    params(("id" = Uuid, Path, description = "Customer ID")),
    tag = "customers",
    security(("bearer_auth" = []))
)]
pub async fn delete_customer(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    auth.require_permission(permissions::CUSTOMERS_WRITE)?;

    let rows = sqlx::query("DELETE FROM customers WHERE id = $1")
        .bind(id)
        .execute(&server.db_pool)
        .await?
        .rows_affected();

    if rows == 0 {
        return Err(ApiError::not_found("customer"));
    }

    AuditService::log_quietly(&server.db_pool, &auth, "customer", id, "deleted", None).await;
    Ok(StatusCode::NO_CONTENT)
}
