//! JWT access tokens (HS256)

use crate::auth::rbac::{RoleCode, UserType};
use crate::config::AuthSection;
use crate::error::ApiError;
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// JWT token claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: Uuid,
    pub role: RoleCode,
    pub user_type: UserType,
    /// Customer profile for `CUS` users
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<Uuid>,
    pub email: String,
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expiration (seconds since epoch)
    pub exp: i64,
    pub iss: String,
}

/// Who a token is being issued for
#[derive(Debug, Clone)]
pub struct TokenSubject {
    pub user_id: Uuid,
    pub role: RoleCode,
    pub email: String,
    pub customer_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: String,
    /// Lifetime in seconds
    pub expires_in: i64,
}

/// Signs and verifies access tokens with a shared secret
#[derive(Clone)]
pub struct TokenService {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
    ttl: Duration,
    issuer: String,
}

impl TokenService {
    #[must_use]
    pub fn new(secret: &str, ttl_minutes: i64, issuer: impl Into<String>) -> Self {
        Self {
            encoding: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
            ttl: Duration::minutes(ttl_minutes.max(1)),
            issuer: issuer.into(),
        }
    }

    #[must_use]
    pub fn from_config(auth: &AuthSection) -> Self {
        Self::new(&auth.jwt_secret, auth.token_ttl_minutes, auth.issuer.clone())
    }

    /// Issue a bearer token
    ///
    /// # Errors
    /// `Internal` if signing fails.
    pub fn issue(&self, subject: &TokenSubject) -> Result<IssuedToken, ApiError> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: subject.user_id,
            role: subject.role,
            user_type: subject.role.user_type(),
            customer_id: subject.customer_id,
            email: subject.email.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            iss: self.issuer.clone(),
        };

        let access_token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ApiError::internal(format!("Failed to sign token: {e}")))?;

        Ok(IssuedToken {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.ttl.num_seconds(),
        })
    }

    /// Verify signature, expiry and issuer
    ///
    /// # Errors
    /// `Authentication` for expired, malformed or foreign tokens.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, ApiError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.leeway = 0;

        decode::<TokenClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => ApiError::authentication("Token has expired"),
                ErrorKind::InvalidIssuer => ApiError::authentication("Token issuer is not trusted"),
                _ => ApiError::authentication("Invalid token"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject(role: RoleCode) -> TokenSubject {
        TokenSubject {
            user_id: Uuid::new_v4(),
            role,
            email: "agent@yatrasathi.in".to_string(),
            customer_id: None,
        }
    }

    #[test]
    fn issued_token_verifies() {
        let tokens = TokenService::new("test-secret", 60, "yatrasathi");
        let sub = subject(RoleCode::Agt);
        let issued = tokens.issue(&sub).unwrap();
        assert_eq!(issued.token_type, "Bearer");
        assert_eq!(issued.expires_in, 3600);

        let claims = tokens.verify(&issued.access_token).unwrap();
        assert_eq!(claims.sub, sub.user_id);
        assert_eq!(claims.role, RoleCode::Agt);
        assert_eq!(claims.user_type, UserType::Employee);
        assert_eq!(claims.iss, "yatrasathi");
    }

    #[test]
    fn customer_claims_carry_customer_id() {
        let tokens = TokenService::new("test-secret", 60, "yatrasathi");
        let customer_id = Uuid::new_v4();
        let issued = tokens
            .issue(&TokenSubject {
                customer_id: Some(customer_id),
                ..subject(RoleCode::Cus)
            })
            .unwrap();
        let claims = tokens.verify(&issued.access_token).unwrap();
        assert_eq!(claims.customer_id, Some(customer_id));
        assert_eq!(claims.user_type, UserType::Customer);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let issued = TokenService::new("secret-a", 60, "yatrasathi")
            .issue(&subject(RoleCode::Adm))
            .unwrap();
        let err = TokenService::new("secret-b", 60, "yatrasathi")
            .verify(&issued.access_token)
            .unwrap_err();
        assert!(matches!(err, ApiError::Authentication { .. }));
    }

    #[test]
    fn foreign_issuer_is_rejected() {
        let issued = TokenService::new("secret", 60, "someone-else")
            .issue(&subject(RoleCode::Adm))
            .unwrap();
        assert!(TokenService::new("secret", 60, "yatrasathi")
            .verify(&issued.access_token)
            .is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = TokenService::new("secret", 60, "yatrasathi");
        let now = Utc::now().timestamp();
        let claims = TokenClaims {
            sub: Uuid::new_v4(),
            role: RoleCode::Acc,
            user_type: UserType::Employee,
            customer_id: None,
            email: "acc@yatrasathi.in".to_string(),
            iat: now - 7200,
            exp: now - 3600,
            iss: "yatrasathi".to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        let err = tokens.verify(&token).unwrap_err();
        assert!(err.to_string().contains("expired"));
    }

    #[test]
    fn garbage_is_rejected() {
        let tokens = TokenService::new("secret", 60, "yatrasathi");
        assert!(tokens.verify("not-a-jwt").is_err());
    }
}
