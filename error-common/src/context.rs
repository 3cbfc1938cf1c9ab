use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Error context information attached to log lines
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorContext {
    pub request_id: Option<String>,
    pub user_id: Option<String>,
    pub entity: Option<String>,
    pub additional: HashMap<String, String>,
}

impl ErrorContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Entity the failing operation touched, e.g. `booking` or `voucher`
    #[must_use]
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    #[must_use]
    pub fn add_context<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.additional.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_fields() {
        let ctx = ErrorContext::new()
            .with_request_id("req-1")
            .with_user_id("u-1")
            .with_entity("booking")
            .add_context("booking_number", "BK/2026-27/000001");

        assert_eq!(ctx.request_id.as_deref(), Some("req-1"));
        assert_eq!(ctx.user_id.as_deref(), Some("u-1"));
        assert_eq!(ctx.entity.as_deref(), Some("booking"));
        assert_eq!(
            ctx.additional.get("booking_number").map(String::as_str),
            Some("BK/2026-27/000001")
        );
    }
}
