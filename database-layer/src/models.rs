// Shared row fragments
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Who created, last modified and closed a record, and when
///
/// Every business table carries these six columns; row types embed them
/// with `#[sqlx(flatten)]`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema, PartialEq)]
pub struct AuditFields {
    pub entered_by: Option<Uuid>,
    pub entered_on: DateTime<Utc>,
    pub modified_by: Option<Uuid>,
    pub modified_on: Option<DateTime<Utc>>,
    pub closed_by: Option<Uuid>,
    pub closed_on: Option<DateTime<Utc>>,
}

impl AuditFields {
    #[must_use]
    pub fn entered(by: Option<Uuid>) -> Self {
        Self {
            entered_by: by,
            entered_on: Utc::now(),
            modified_by: None,
            modified_on: None,
            closed_by: None,
            closed_on: None,
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed_on.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entered_starts_open() {
        let user = Uuid::new_v4();
        let audit = AuditFields::entered(Some(user));
        assert_eq!(audit.entered_by, Some(user));
        assert!(audit.modified_on.is_none());
        assert!(!audit.is_closed());
    }
}
