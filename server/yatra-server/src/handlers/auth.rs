use axum::{extract::State, http::StatusCode, Json};
use database_layer::TransactionManager;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{password, IssuedToken, RoleCode, TokenSubject};
use crate::error::{api_success, ApiError, ApiResponse};
use crate::handlers::customers::{insert_customer, CreateCustomerRequest};
use crate::handlers::users::{insert_user, UserAccount};
use crate::middleware::AuthContext;
use crate::server::YatraServer;
use crate::services::AuditService;
use crate::validation::RequestValidation;
use crate::{validate_email, validate_length, validate_required};

/// Customer self-registration
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "asha@example.com")]
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl RequestValidation for RegisterRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.email, "Email is required");
        validate_email!(self.email, "Invalid email format");
        validate_required!(self.full_name, "Full name is required");
        validate_length!(self.full_name, 1, 200, "Full name must be between 1 and 200 characters");
        password::validate_password_strength(&self.password)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "agent@yatrasathi.in")]
    pub email: String,
    pub password: String,
}

impl RequestValidation for LoginRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.email, "Email is required");
        validate_required!(self.password, "Password is required");
        Ok(())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

impl RequestValidation for ChangePasswordRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.current_password, "Current password is required");
        password::validate_password_strength(&self.new_password)?;
        if self.current_password == self.new_password {
            return Err(ApiError::validation(
                "New password must differ from the current password",
            ));
        }
        Ok(())
    }
}

/// Token plus the profile it was issued for
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: IssuedToken,
    pub user: UserProfile,
}

/// The signed-in user with their effective permissions
#[derive(Debug, Serialize, ToSchema)]
pub struct UserProfile {
    #[serde(flatten)]
    pub account: UserAccount,
    pub customer_id: Option<Uuid>,
    pub permissions: Vec<String>,
}

impl UserProfile {
    fn new(account: UserAccount, customer_id: Option<Uuid>) -> Self {
        let permissions = account
            .role_code
            .permissions()
            .iter()
            .map(ToString::to_string)
            .collect();
        Self {
            account,
            customer_id,
            permissions,
        }
    }
}

const ACCOUNT_SELECT: &str = r"
    SELECT u.id, u.email, u.full_name, u.phone, u.user_type, u.role_code, u.is_active,
           u.last_login_at, u.entered_by, u.entered_on, u.modified_by, u.modified_on,
           u.closed_by, u.closed_on
    FROM users u
";

fn issue_for(server: &YatraServer, profile: &UserProfile) -> Result<IssuedToken, ApiError> {
    server.tokens.issue(&TokenSubject {
        user_id: profile.account.id,
        role: profile.account.role_code,
        email: profile.account.email.clone(),
        customer_id: profile.customer_id,
    })
}

async fn load_customer_id(server: &YatraServer, user_id: Uuid) -> Result<Option<Uuid>, ApiError> {
    Ok(
        sqlx::query_scalar("SELECT id FROM customers WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&server.db_pool)
            .await?,
    )
}

/// Register a customer account
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Email already registered")
    ),
    tag = "authentication"
)]
pub async fn register(
    State(server): State<YatraServer>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), ApiError> {
    req.validate()?;
    let hash = password::hash_password(&req.password).await?;

    let mut tx = TransactionManager::new(&server.db_pool)
        .labelled("register")
        .begin()
        .await?;

    let account = insert_user(
        &mut tx,
        &req.email,
        &hash,
        &req.full_name,
        req.phone.as_deref(),
        RoleCode::Cus,
        None,
    )
    .await?;

    let customer = insert_customer(
        &mut tx,
        Some(account.id),
        &CreateCustomerRequest {
            name: account.full_name.clone(),
            email: Some(account.email.clone()),
            phone: account.phone.clone(),
            address: req.address.clone(),
            gstin: None,
        },
        Some(account.id),
    )
    .await?;

    tx.commit().await?;

    let user = UserProfile::new(account, Some(customer.id));
    let token = issue_for(&server, &user)?;

    tracing::info!(
        user_id = %user.account.id,
        customer_code = %customer.customer_code,
        "Customer registered"
    );

    Ok((
        StatusCode::CREATED,
        Json(api_success(AuthResponse { token, user }).with_message("Registration successful")),
    ))
}

/// Exchange email and password for a bearer token
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "authentication"
)]
pub async fn login(
    State(server): State<YatraServer>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    req.validate()?;
    let email = req.email.trim().to_lowercase();

    let credentials: Option<(Uuid, String, bool)> =
        sqlx::query_as("SELECT id, password_hash, is_active FROM users WHERE email = $1")
            .bind(&email)
            .fetch_optional(&server.db_pool)
            .await?;

    let invalid = || ApiError::authentication("Invalid email or password");
    let (user_id, hash, is_active) = credentials.ok_or_else(|| {
        tracing::warn!(email = %email, "Login attempt for unknown email");
        invalid()
    })?;

    if !password::verify_password(&req.password, &hash).await? {
        tracing::warn!(user_id = %user_id, "Login failed: wrong password");
        return Err(invalid());
    }
    if !is_active {
        tracing::warn!(user_id = %user_id, "Login refused: account inactive");
        return Err(ApiError::authentication("Account is inactive"));
    }

    sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
        .bind(user_id)
        .execute(&server.db_pool)
        .await?;

    let account: UserAccount = sqlx::query_as(&format!("{ACCOUNT_SELECT} WHERE u.id = $1"))
        .bind(user_id)
        .fetch_one(&server.db_pool)
        .await?;
    let customer_id = load_customer_id(&server, user_id).await?;

    let user = UserProfile::new(account, customer_id);
    let token = issue_for(&server, &user)?;

    tracing::info!(user_id = %user_id, role = %user.account.role_code, "User logged in");
    Ok(Json(api_success(AuthResponse { token, user })))
}

/// Current user profile
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserProfile),
        (status = 401, description = "Unauthorized")
    ),
    tag = "authentication",
    security(("bearer_auth" = []))
)]
pub async fn me(
    State(server): State<YatraServer>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<UserProfile>>, ApiError> {
    let account: UserAccount = sqlx::query_as(&format!("{ACCOUNT_SELECT} WHERE u.id = $1"))
        .bind(auth.user_id)
        .fetch_optional(&server.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("user"))?;

    Ok(Json(api_success(UserProfile::new(account, auth.customer_id))))
}

/// Change the caller's password
#[utoipa::path(
    post,
    path = "/api/v1/auth/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Weak password"),
        (status = 401, description = "Current password is wrong")
    ),
    tag = "authentication",
    security(("bearer_auth" = []))
)]
pub async fn change_password(
    State(server): State<YatraServer>,
    auth: AuthContext,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    req.validate()?;

    let hash: String = sqlx::query_scalar("SELECT password_hash FROM users WHERE id = $1")
        .bind(auth.user_id)
        .fetch_optional(&server.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("user"))?;

    if !password::verify_password(&req.current_password, &hash).await? {
        return Err(ApiError::authentication("Current password is incorrect"));
    }

    let new_hash = password::hash_password(&req.new_password).await?;
    sqlx::query(
        "UPDATE users SET password_hash = $2, modified_by = $1, modified_on = NOW() WHERE id = $1",
    )
    .bind(auth.user_id)
    .bind(new_hash)
    .execute(&server.db_pool)
    .await?;

    AuditService::log_quietly(&server.db_pool, &auth, "user", auth.user_id, "password_changed", None)
        .await;

    Ok(Json(api_success(()).with_message("Password changed")))
}
