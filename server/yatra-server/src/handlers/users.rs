use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use database_layer::{AuditFields, TransactionManager};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::{password, permissions, RoleCode, UserType};
use crate::error::{api_success, ApiError, ApiResponse};
use crate::handlers::common::ResourceTable;
use crate::handlers::customers::{insert_customer, CreateCustomerRequest};
use crate::middleware::AuthContext;
use crate::server::YatraServer;
use crate::services::AuditService;
use crate::types::pagination::PaginationParams;
use crate::utils::query_builder::PaginatedQuery;
use crate::validation::RequestValidation;
use crate::{validate_email, validate_length, validate_required};

/// User account (the password hash is never selected into this type)
#[derive(Debug, Serialize, Deserialize, ToSchema, FromRow, Clone)]
pub struct UserAccount {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    #[sqlx(try_from = "String")]
    pub user_type: UserType,
    #[sqlx(try_from = "String")]
    pub role_code: RoleCode,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: AuditFields,
}

impl ResourceTable for UserAccount {
    const TABLE: &'static str = "users";
    const RESOURCE: &'static str = "user";
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role_code: RoleCode,
}

impl RequestValidation for CreateUserRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.email, "Email is required");
        validate_email!(self.email, "Invalid email format");
        validate_required!(self.full_name, "Full name is required");
        validate_length!(self.full_name, 1, 200, "Full name must be between 1 and 200 characters");
        password::validate_password_strength(&self.password)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role_code: Option<RoleCode>,
    pub is_active: Option<bool>,
}

impl RequestValidation for UpdateUserRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if let Some(ref name) = self.full_name {
            validate_required!(name, "Full name cannot be empty");
            validate_length!(name, 1, 200, "Full name must be between 1 and 200 characters");
        }
        Ok(())
    }
}

/// List Users Query Parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListUsersParams {
    pub role_code: Option<RoleCode>,
    pub is_active: Option<bool>,
    /// Matches the full name
    pub search: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl ListUsersParams {
    fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            page_size: self.page_size,
        }
    }

    fn apply(&self, query: &mut PaginatedQuery<'_>) {
        query
            .filter_eq("role_code", self.role_code.map(RoleCode::as_str))
            .filter_eq("is_active", self.is_active)
            .filter_ilike("full_name", self.search.as_deref());
    }
}

const USER_COLUMNS: &str = "SELECT id, email, full_name, phone, user_type, role_code, is_active, \
     last_login_at, entered_by, entered_on, modified_by, modified_on, closed_by, closed_on \
     FROM users WHERE 1=1";

/// Insert a user row and return it without the hash
///
/// # Errors
/// Duplicate emails surface as 409.
pub(crate) async fn insert_user(
    conn: &mut PgConnection,
    email: &str,
    password_hash: &str,
    full_name: &str,
    phone: Option<&str>,
    role: RoleCode,
    entered_by: Option<Uuid>,
) -> Result<UserAccount, ApiError> {
    let user = sqlx::query_as::<_, UserAccount>(
        r"
        INSERT INTO users (email, password_hash, full_name, phone, user_type, role_code, entered_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, email, full_name, phone, user_type, role_code, is_active, last_login_at,
                  entered_by, entered_on, modified_by, modified_on, closed_by, closed_on
        ",
    )
    .bind(email.trim().to_lowercase())
    .bind(password_hash)
    .bind(full_name.trim())
    .bind(phone)
    .bind(role.user_type().as_str())
    .bind(role.as_str())
    .bind(entered_by)
    .fetch_one(&mut *conn)
    .await?;

    Ok(user)
}

async fn fetch_user(server: &YatraServer, id: Uuid) -> Result<UserAccount, ApiError> {
    let mut query = PaginatedQuery::new(USER_COLUMNS);
    query.add_base_filter("id", id);
    query
        .build_query_as::<UserAccount>()
        .fetch_optional(&server.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("user"))
}

/// List users
#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses(
        (status = 200, description = "Users retrieved successfully", body = Vec<UserAccount>),
        (status = 403, description = "Admin only")
    ),
    params(ListUsersParams),
    tag = "users",
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Query(params): Query<ListUsersParams>,
) -> Result<Json<ApiResponse<Vec<UserAccount>>>, ApiError> {
    auth.require_permission(permissions::USERS_MANAGE)?;
    let pagination = params.pagination();

    let mut count_query = PaginatedQuery::new("SELECT COUNT(*) FROM users WHERE 1=1");
    params.apply(&mut count_query);
    let total: i64 = count_query
        .build_query_scalar()
        .fetch_one(&server.db_pool)
        .await?;

    let mut query = PaginatedQuery::new(USER_COLUMNS);
    params.apply(&mut query);
    query.order_by_entered_desc().paginate(&pagination);
    let users: Vec<UserAccount> = query.build_query_as().fetch_all(&server.db_pool).await?;

    Ok(Json(pagination.wrap_response(users, total)))
}

/// Get a user
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    responses(
        (status = 200, description = "User retrieved successfully", body = UserAccount),
        (status = 404, description = "User not found")
    ),
    params(("id" = Uuid, Path, description = "User ID")),
    tag = "users",
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserAccount>>, ApiError> {
    auth.require_permission(permissions::USERS_MANAGE)?;
    Ok(Json(api_success(fetch_user(&server, id).await?)))
}

/// Create a user
///
/// A `CUS` user also gets a linked customer profile.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created successfully", body = UserAccount),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Email already registered")
    ),
    tag = "users",
    security(("bearer_auth" = []))
)]
pub async fn create_user(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserAccount>>), ApiError> {
    auth.require_permission(permissions::USERS_MANAGE)?;
    req.validate()?;

    let hash = password::hash_password(&req.password).await?;

    let mut tx = TransactionManager::new(&server.db_pool)
        .labelled("create_user")
        .begin()
        .await?;

    let user = insert_user(
        &mut tx,
        &req.email,
        &hash,
        &req.full_name,
        req.phone.as_deref(),
        req.role_code,
        Some(auth.user_id),
    )
    .await?;

    if req.role_code == RoleCode::Cus {
        let profile = CreateCustomerRequest {
            name: user.full_name.clone(),
            email: Some(user.email.clone()),
            phone: user.phone.clone(),
            address: None,
            gstin: None,
        };
        insert_customer(&mut tx, Some(user.id), &profile, Some(auth.user_id)).await?;
    }

    AuditService::log_action(
        &mut *tx,
        &auth,
        "user",
        user.id,
        "created",
        Some(serde_json::json!({ "email": user.email, "role_code": user.role_code })),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(user_id = %user.id, role = %user.role_code, "User created");
    Ok((StatusCode::CREATED, Json(api_success(user))))
}

/// Update a user
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated successfully", body = UserAccount),
        (status = 404, description = "User not found")
    ),
    params(("id" = Uuid, Path, description = "User ID")),
    tag = "users",
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserAccount>>, ApiError> {
    auth.require_permission(permissions::USERS_MANAGE)?;
    req.validate()?;

    if id == auth.user_id && (req.is_active == Some(false) || req.role_code.is_some()) {
        return Err(ApiError::bad_request(
            "Administrators cannot change their own role or deactivate themselves",
        ));
    }

    let rows = sqlx::query(
        r"
        UPDATE users SET
            full_name = COALESCE($2, full_name),
            phone = COALESCE($3, phone),
            role_code = COALESCE($4, role_code),
            user_type = COALESCE($5, user_type),
            is_active = COALESCE($6, is_active),
            modified_by = $7,
            modified_on = NOW()
        WHERE id = $1
        ",
    )
    .bind(id)
    .bind(req.full_name.as_deref().map(str::trim))
    .bind(&req.phone)
    .bind(req.role_code.map(RoleCode::as_str))
    .bind(req.role_code.map(|r| r.user_type().as_str()))
    .bind(req.is_active)
    .bind(auth.user_id)
    .execute(&server.db_pool)
    .await?
    .rows_affected();

    if rows == 0 {
        return Err(ApiError::not_found("user"));
    }

    AuditService::log_quietly(
        &server.db_pool,
        &auth,
        "user",
        id,
        "updated",
        Some(serde_json::json!({ "role_code": req.role_code, "is_active": req.is_active })),
    )
    .await;

    Ok(Json(api_success(fetch_user(&server, id).await?)))
}

/// Deactivate a user
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    responses(
        (status = 204, description = "User deactivated"),
        (status = 404, description = "User not found or already inactive")
    ),
    params(("id" = Uuid, Path, description = "User ID")),
    tag = "users",
    security(("bearer_auth" = []))
)]
pub async fn deactivate_user(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    auth.require_permission(permissions::USERS_MANAGE)?;
    if id == auth.user_id {
        return Err(ApiError::bad_request("You cannot deactivate your own account"));
    }

    UserAccount::deactivate(&server.db_pool, id, auth.user_id).await?;
    AuditService::log_quietly(&server.db_pool, &auth, "user", id, "deactivated", None).await;

    tracing::info!(user_id = %id, by = %auth.user_id, "User deactivated");
    Ok(StatusCode::NO_CONTENT)
}
