// Document numbering per series and financial year
use crate::error::DatabaseResult;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use std::fmt;
use tracing::debug;

/// Numbered document series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentSeries {
    Booking,
    Billing,
    Payment,
    Receipt,
    ContraVoucher,
    PaymentVoucher,
    ReceiptVoucher,
    JournalVoucher,
    Customer,
}

impl DocumentSeries {
    pub const ALL: [Self; 9] = [
        Self::Booking,
        Self::Billing,
        Self::Payment,
        Self::Receipt,
        Self::ContraVoucher,
        Self::PaymentVoucher,
        Self::ReceiptVoucher,
        Self::JournalVoucher,
        Self::Customer,
    ];

    /// The series whose `PREFIX/` namespace a free-form number falls into
    ///
    /// Numbers in a system namespace would collide with values the
    /// sequence hands out later, so callers accepting user-chosen numbers
    /// reject them.
    #[must_use]
    pub fn reserving(number: &str) -> Option<Self> {
        let (head, _) = number.trim().split_once('/')?;
        Self::ALL
            .into_iter()
            .find(|series| head.trim().eq_ignore_ascii_case(series.prefix()))
    }

    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Booking => "BK",
            Self::Billing => "BL",
            Self::Payment => "PT",
            Self::Receipt => "RC",
            Self::ContraVoucher => "CV",
            Self::PaymentVoucher => "PV",
            Self::ReceiptVoucher => "RV",
            Self::JournalVoucher => "JE",
            Self::Customer => "CU",
        }
    }
}

impl fmt::Display for DocumentSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Indian financial year label (April to March) for a date, e.g. `2026-27`
#[must_use]
pub fn financial_year(date: NaiveDate) -> String {
    let start = if date.month() >= 4 {
        date.year()
    } else {
        date.year() - 1
    };
    format!("{start}-{:02}", (start + 1).rem_euclid(100))
}

/// Render a document number as `PREFIX/FY/NNNNNN`
#[must_use]
pub fn format_document_number(series: DocumentSeries, fy: &str, value: i64) -> String {
    format!("{}/{fy}/{value:06}", series.prefix())
}

/// Allocate the next number in a series
///
/// Runs a single upsert so concurrent callers never receive the same value.
/// Call it inside the transaction that inserts the document so an aborted
/// insert also releases the number.
///
/// # Errors
/// Propagates driver errors from the upsert.
pub async fn next_document_number(
    conn: &mut PgConnection,
    series: DocumentSeries,
    date: NaiveDate,
) -> DatabaseResult<String> {
    let fy = financial_year(date);

    let value: i64 = sqlx::query_scalar(
        r"
        INSERT INTO document_sequences (series, financial_year, last_value)
        VALUES ($1, $2, 1)
        ON CONFLICT (series, financial_year)
        DO UPDATE SET last_value = document_sequences.last_value + 1
        RETURNING last_value
        ",
    )
    .bind(series.prefix())
    .bind(&fy)
    .fetch_one(&mut *conn)
    .await?;

    let number = format_document_number(series, &fy, value);
    debug!(series = %series, number = %number, "Allocated document number");
    Ok(number)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn financial_year_starts_in_april() {
        assert_eq!(financial_year(date(2026, 4, 1)), "2026-27");
        assert_eq!(financial_year(date(2027, 3, 31)), "2026-27");
        assert_eq!(financial_year(date(2026, 3, 31)), "2025-26");
    }

    #[test]
    fn financial_year_wraps_century() {
        assert_eq!(financial_year(date(2099, 12, 1)), "2099-00");
    }

    #[test]
    fn document_number_is_zero_padded() {
        assert_eq!(
            format_document_number(DocumentSeries::Booking, "2026-27", 42),
            "BK/2026-27/000042"
        );
        assert_eq!(
            format_document_number(DocumentSeries::JournalVoucher, "2026-27", 1_234_567),
            "JE/2026-27/1234567"
        );
    }

    #[test]
    fn every_series_has_distinct_prefix() {
        let all = DocumentSeries::ALL;
        let prefixes: std::collections::HashSet<_> = all.iter().map(|s| s.prefix()).collect();
        assert_eq!(prefixes.len(), all.len());
    }

    #[test]
    fn system_namespaces_are_reserved() {
        assert_eq!(
            DocumentSeries::reserving("JE/2026-27/000007"),
            Some(DocumentSeries::JournalVoucher)
        );
        assert_eq!(
            DocumentSeries::reserving(" rv/2031-32/1"),
            Some(DocumentSeries::ReceiptVoucher)
        );
        assert_eq!(DocumentSeries::reserving("JE-MANUAL-7"), None);
        assert_eq!(DocumentSeries::reserving("ADJ/2026/01"), None);
        assert_eq!(DocumentSeries::reserving("JE"), None);
    }
}
