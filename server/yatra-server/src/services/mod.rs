//! Cross-cutting services used by the HTTP handlers

pub mod audit;
pub mod export;
pub mod ledger_posting;
pub mod notifications;

pub use audit::AuditService;
pub use export::{export_response, Cell, ReportFormat, ReportTable};
pub use notifications::{notify_quietly, LogNotifier, Notification, NotificationTemplate, Notifier};
