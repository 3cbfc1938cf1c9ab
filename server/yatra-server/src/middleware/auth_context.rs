//! Authentication context extraction
//!
//! Handlers take `AuthContext` as an argument; extraction validates the
//! bearer token and rejects the request with 401 before the handler runs.

use crate::auth::{permissions, RoleCode, TokenClaims, UserType};
use crate::error::ApiError;
use crate::middleware::RequestContext;
use crate::server::YatraServer;
use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header::AUTHORIZATION, request::Parts};
use uuid::Uuid;

/// Authenticated caller
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub role: RoleCode,
    pub user_type: UserType,
    pub email: String,
    /// Customer profile for `CUS` users
    pub customer_id: Option<Uuid>,
    pub request: RequestContext,
}

/// Which rows a caller may see for a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessScope {
    All,
    Customer(Uuid),
}

impl AccessScope {
    /// Customer filter to apply to queries, if any
    #[must_use]
    pub fn customer_filter(self) -> Option<Uuid> {
        match self {
            AccessScope::All => None,
            AccessScope::Customer(id) => Some(id),
        }
    }

    /// Whether a record owned by `customer_id` is visible
    #[must_use]
    pub fn allows(self, customer_id: Uuid) -> bool {
        match self {
            AccessScope::All => true,
            AccessScope::Customer(own) => own == customer_id,
        }
    }
}

impl AuthContext {
    #[must_use]
    pub fn from_claims(claims: TokenClaims, request: RequestContext) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
            user_type: claims.user_type,
            email: claims.email,
            customer_id: claims.customer_id,
            request,
        }
    }

    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request.request_id
    }

    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.role.has_permission(permission)
    }

    /// Require permission - returns error if permission is not granted
    ///
    /// # Errors
    /// `Authorization` when the role lacks the permission.
    pub fn require_permission(&self, permission: &str) -> Result<(), ApiError> {
        if self.has_permission(permission) {
            return Ok(());
        }
        tracing::warn!(
            user_id = %self.user_id,
            role = %self.role,
            permission,
            request_id = %self.request.request_id,
            "Permission denied"
        );
        Err(ApiError::authorization(format!(
            "Permission denied: {permission} is not granted to role {}",
            self.role
        )))
    }

    /// Resolve row visibility from an "all" and an "own" permission
    ///
    /// # Errors
    /// `Authorization` when neither permission is held, or the caller holds
    /// only the "own" permission without a customer profile.
    pub fn scope(&self, read_all: &str, read_own: &str) -> Result<AccessScope, ApiError> {
        if self.has_permission(read_all) {
            return Ok(AccessScope::All);
        }
        if self.has_permission(read_own) {
            return self
                .customer_id
                .map(AccessScope::Customer)
                .ok_or_else(|| ApiError::authorization("No customer profile is linked to this account"));
        }
        self.require_permission(read_all).map(|()| AccessScope::All)
    }

    /// Booking visibility for the caller
    ///
    /// # Errors
    /// See [`AuthContext::scope`].
    pub fn booking_scope(&self) -> Result<AccessScope, ApiError> {
        self.scope(permissions::BOOKINGS_READ, permissions::BOOKINGS_READ_OWN)
    }

    /// Billing visibility for the caller
    ///
    /// # Errors
    /// See [`AuthContext::scope`].
    pub fn billing_scope(&self) -> Result<AccessScope, ApiError> {
        self.scope(permissions::BILLING_READ, permissions::BILLING_READ_OWN)
    }

    /// Payment and receipt visibility for the caller
    ///
    /// # Errors
    /// See [`AuthContext::scope`].
    pub fn payment_scope(&self) -> Result<AccessScope, ApiError> {
        self.scope(permissions::PAYMENTS_READ, permissions::PAYMENTS_READ_OWN)
    }
}

/// Pull the bearer token out of the Authorization header
fn extract_token(parts: &Parts) -> Result<&str, ApiError> {
    let auth_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::authentication("Missing Authorization header"))?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            ApiError::authentication("Invalid Authorization header format. Expected: Bearer <token>")
        })
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
    YatraServer: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let server = YatraServer::from_ref(state);
        let token = extract_token(parts)?;
        let claims = server.tokens.verify(token)?;
        let request = RequestContext::from_headers(&parts.headers);

        tracing::debug!(
            user_id = %claims.sub,
            role = %claims.role,
            request_id = %request.request_id,
            "Authenticated request"
        );

        Ok(AuthContext::from_claims(claims, request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(role: RoleCode, customer_id: Option<Uuid>) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            role,
            user_type: role.user_type(),
            email: "user@yatrasathi.in".to_string(),
            customer_id,
            request: RequestContext::new(),
        }
    }

    #[test]
    fn staff_see_everything() {
        let agent = ctx(RoleCode::Agt, None);
        assert_eq!(agent.booking_scope().unwrap(), AccessScope::All);
        assert_eq!(agent.billing_scope().unwrap(), AccessScope::All);
    }

    #[test]
    fn customers_are_scoped_to_their_profile() {
        let customer_id = Uuid::new_v4();
        let customer = ctx(RoleCode::Cus, Some(customer_id));
        let scope = customer.booking_scope().unwrap();
        assert_eq!(scope, AccessScope::Customer(customer_id));
        assert!(scope.allows(customer_id));
        assert!(!scope.allows(Uuid::new_v4()));
        assert_eq!(scope.customer_filter(), Some(customer_id));
    }

    #[test]
    fn customer_without_profile_is_forbidden() {
        let err = ctx(RoleCode::Cus, None).booking_scope().unwrap_err();
        assert!(matches!(err, ApiError::Authorization { .. }));
    }

    #[test]
    fn missing_permission_is_forbidden() {
        let accountant = ctx(RoleCode::Acc, None);
        assert!(accountant.require_permission(permissions::USERS_MANAGE).is_err());
        assert!(accountant.require_permission(permissions::ACCOUNTING_WRITE).is_ok());
    }

    #[test]
    fn bearer_token_is_extracted() {
        let (mut parts, ()) = axum::http::Request::builder()
            .header(AUTHORIZATION, "Bearer abc.def.ghi")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(extract_token(&parts).unwrap(), "abc.def.ghi");

        parts.headers.insert(AUTHORIZATION, "Basic Zm9vOmJhcg==".parse().unwrap());
        assert!(extract_token(&parts).is_err());
    }
}
