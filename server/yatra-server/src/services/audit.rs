//! Centralized audit logging service
//!
//! Writes one `audit_logs` row per business action. Inside a transaction
//! pass the transaction connection so the audit row commits with the
//! change it describes.

use crate::error::ApiError;
use crate::middleware::AuthContext;
use serde_json::Value as JsonValue;
use sqlx::PgExecutor;
use uuid::Uuid;

pub struct AuditService;

impl AuditService {
    /// Record an action performed by the authenticated caller
    ///
    /// # Errors
    /// Propagates the insert failure.
    pub async fn log_action<'e, E>(
        executor: E,
        auth: &AuthContext,
        entity_type: &str,
        entity_id: Uuid,
        action: &str,
        details: Option<JsonValue>,
    ) -> Result<(), ApiError>
    where
        E: PgExecutor<'e>,
    {
        let mut details = details.unwrap_or_else(|| serde_json::json!({}));
        if let Some(map) = details.as_object_mut() {
            map.insert(
                "request_id".to_string(),
                JsonValue::String(auth.request.request_id.clone()),
            );
            if let Some(addr) = &auth.request.remote_addr {
                map.insert("remote_addr".to_string(), JsonValue::String(addr.clone()));
            }
        }

        sqlx::query(
            r"
            INSERT INTO audit_logs (entity_type, entity_id, user_id, action, details)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(entity_type)
        .bind(entity_id)
        .bind(auth.user_id)
        .bind(action)
        .bind(details)
        .execute(executor)
        .await?;

        tracing::debug!(
            entity_type,
            entity_id = %entity_id,
            action,
            user_id = %auth.user_id,
            "Audit event recorded"
        );
        Ok(())
    }

    /// Like `log_action`, but a failure is only logged
    pub async fn log_quietly<'e, E>(
        executor: E,
        auth: &AuthContext,
        entity_type: &str,
        entity_id: Uuid,
        action: &str,
        details: Option<JsonValue>,
    ) where
        E: PgExecutor<'e>,
    {
        if let Err(e) =
            Self::log_action(executor, auth, entity_type, entity_id, action, details).await
        {
            tracing::warn!(entity_type, entity_id = %entity_id, action, error = %e, "Failed to log audit event");
        }
    }
}
