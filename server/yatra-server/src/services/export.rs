//! Report rendering to CSV, XLSX and PDF
//!
//! Report handlers build a `ReportTable` and hand it to `export_response`
//! together with the requested format.

use crate::error::{api_success, ApiError};
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Json, Response};
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Output format of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Json,
    Csv,
    Xlsx,
    Pdf,
}

impl ReportFormat {
    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            ReportFormat::Json => "application/json",
            ReportFormat::Csv => "text/csv; charset=utf-8",
            ReportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ReportFormat::Pdf => "application/pdf",
        }
    }

    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Csv => "csv",
            ReportFormat::Xlsx => "xlsx",
            ReportFormat::Pdf => "pdf",
        }
    }
}

/// A single report value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Amount(Decimal),
    Count(i64),
    Date(NaiveDate),
    Empty,
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    #[must_use]
    pub fn opt_text(value: Option<&str>) -> Self {
        value.map_or(Cell::Empty, Cell::text)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Amount(d) => write!(f, "{d:.2}"),
            Cell::Count(n) => write!(f, "{n}"),
            Cell::Date(d) => write!(f, "{}", d.format("%d-%m-%Y")),
            Cell::Empty => Ok(()),
        }
    }
}

/// Tabular report, rendered identically in every format
#[derive(Debug, Clone, Serialize)]
pub struct ReportTable {
    pub title: String,
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<Cell>>,
}

impl ReportTable {
    pub fn new(title: impl Into<String>, columns: Vec<&'static str>) -> Self {
        Self {
            title: title.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }
}

/// Render as CSV with a header row
///
/// # Errors
/// Writer failures.
pub fn to_csv(table: &ReportTable) -> Result<Vec<u8>, ApiError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(&table.columns)
        .map_err(|e| ApiError::internal(format!("CSV export failed: {e}")))?;
    for row in &table.rows {
        writer
            .write_record(row.iter().map(ToString::to_string))
            .map_err(|e| ApiError::internal(format!("CSV export failed: {e}")))?;
    }
    writer
        .into_inner()
        .map_err(|e| ApiError::internal(format!("CSV export failed: {e}")))
}

/// Render as a single-sheet workbook
///
/// # Errors
/// Workbook failures.
pub fn to_xlsx(table: &ReportTable) -> Result<Vec<u8>, ApiError> {
    use rust_xlsxwriter::{Format, Workbook, XlsxError};

    fn build(table: &ReportTable) -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let bold = Format::new().set_bold();
        let money = Format::new().set_num_format("#,##0.00");
        let date = Format::new().set_num_format("dd-mm-yyyy");

        let sheet = workbook.add_worksheet();
        let name: String = table
            .title
            .chars()
            .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
            .take(31)
            .collect();
        if !name.trim().is_empty() {
            sheet.set_name(name.trim())?;
        }

        for (col, heading) in (0_u16..).zip(&table.columns) {
            sheet.write_string_with_format(0, col, *heading, &bold)?;
            sheet.set_column_width(col, 18)?;
        }

        for (row_idx, row) in (1_u32..).zip(&table.rows) {
            for (col, cell) in (0_u16..).zip(row) {
                match cell {
                    Cell::Text(s) => {
                        sheet.write_string(row_idx, col, s)?;
                    }
                    Cell::Amount(d) => {
                        sheet.write_number_with_format(
                            row_idx,
                            col,
                            d.to_f64().unwrap_or_default(),
                            &money,
                        )?;
                    }
                    Cell::Count(n) => {
                        sheet.write_number(row_idx, col, n.to_f64().unwrap_or_default())?;
                    }
                    Cell::Date(d) => {
                        let value = rust_xlsxwriter::ExcelDateTime::from_ymd(
                            u16::try_from(chrono::Datelike::year(d)).unwrap_or(1900),
                            u8::try_from(chrono::Datelike::month(d)).unwrap_or(1),
                            u8::try_from(chrono::Datelike::day(d)).unwrap_or(1),
                        )?;
                        sheet.write_datetime_with_format(row_idx, col, &value, &date)?;
                    }
                    Cell::Empty => {}
                }
            }
        }

        workbook.save_to_buffer()
    }

    build(table).map_err(|e| ApiError::internal(format!("XLSX export failed: {e}")))
}

const PAGE_WIDTH_MM: f32 = 297.0;
const PAGE_HEIGHT_MM: f32 = 210.0;
const MARGIN_MM: f32 = 10.0;
const LINE_HEIGHT_MM: f32 = 6.0;
const BODY_FONT_SIZE: f32 = 8.0;

fn pdf_err(e: impl fmt::Display) -> ApiError {
    ApiError::internal(format!("PDF export failed: {e}"))
}

/// Render as a landscape A4 document, one line per row
///
/// # Errors
/// Font or serialization failures.
pub fn to_pdf(table: &ReportTable) -> Result<Vec<u8>, ApiError> {
    use printpdf::{BuiltinFont, Mm, PdfDocument};

    let (doc, first_page, first_layer) = PdfDocument::new(
        table.title.as_str(),
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Report",
    );
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_err)?;

    let columns = table.columns.len().max(1);
    #[allow(clippy::cast_precision_loss)]
    let col_width = (PAGE_WIDTH_MM - 2.0 * MARGIN_MM) / columns as f32;
    // Helvetica at 8pt averages about 1.6mm per character
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let max_chars = ((col_width / 1.6) as usize).max(4);
    let fit = |s: String| -> String {
        if s.chars().count() <= max_chars {
            s
        } else {
            s.chars().take(max_chars - 1).chain(std::iter::once('~')).collect()
        }
    };

    let mut layer = doc.get_page(first_page).get_layer(first_layer);
    let mut y = PAGE_HEIGHT_MM - MARGIN_MM;

    layer.use_text(table.title.as_str(), 14.0, Mm(MARGIN_MM), Mm(y), &bold);
    y -= LINE_HEIGHT_MM * 2.0;

    let write_header = |layer: &printpdf::PdfLayerReference, y: f32| {
        let mut x = MARGIN_MM;
        for heading in &table.columns {
            layer.use_text(fit((*heading).to_string()), BODY_FONT_SIZE, Mm(x), Mm(y), &bold);
            x += col_width;
        }
    };

    write_header(&layer, y);
    y -= LINE_HEIGHT_MM;

    for row in &table.rows {
        if y < MARGIN_MM {
            let (page, page_layer) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Report");
            layer = doc.get_page(page).get_layer(page_layer);
            y = PAGE_HEIGHT_MM - MARGIN_MM;
            write_header(&layer, y);
            y -= LINE_HEIGHT_MM;
        }
        let mut x = MARGIN_MM;
        for cell in row {
            layer.use_text(fit(cell.to_string()), BODY_FONT_SIZE, Mm(x), Mm(y), &regular);
            x += col_width;
        }
        y -= LINE_HEIGHT_MM;
    }

    doc.save_to_bytes().map_err(pdf_err)
}

/// Render a table in the requested format as a downloadable response
///
/// `Json` returns the table inside the usual success envelope.
///
/// # Errors
/// Rendering failures.
pub fn export_response(
    table: &ReportTable,
    format: ReportFormat,
    file_stem: &str,
) -> Result<Response, ApiError> {
    let body = match format {
        ReportFormat::Json => return Ok(Json(api_success(table)).into_response()),
        ReportFormat::Csv => to_csv(table)?,
        ReportFormat::Xlsx => to_xlsx(table)?,
        ReportFormat::Pdf => to_pdf(table)?,
    };

    tracing::debug!(
        report = %table.title,
        format = format.extension(),
        rows = table.rows.len(),
        bytes = body.len(),
        "Report rendered"
    );

    let disposition = format!(
        "attachment; filename=\"{}.{}\"",
        file_stem.replace(['"', '\\', '/'], "_"),
        format.extension()
    );

    let mut response = body.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(format.content_type()),
    );
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> ReportTable {
        let mut table = ReportTable::new("Collections", vec!["Receipt", "Date", "Mode", "Amount"]);
        table.push_row(vec![
            Cell::text("RC/2026-27/000001"),
            Cell::Date(NaiveDate::from_ymd_opt(2026, 10, 5).unwrap()),
            Cell::text("UPI"),
            Cell::Amount(dec!(1500)),
        ]);
        table.push_row(vec![
            Cell::text("RC/2026-27/000002, cash"),
            Cell::Date(NaiveDate::from_ymd_opt(2026, 10, 6).unwrap()),
            Cell::text("CASH"),
            Cell::Amount(dec!(99.5)),
        ]);
        table
    }

    #[test]
    fn cells_render_for_humans() {
        assert_eq!(Cell::Amount(dec!(99.5)).to_string(), "99.50");
        assert_eq!(
            Cell::Date(NaiveDate::from_ymd_opt(2026, 4, 1).unwrap()).to_string(),
            "01-04-2026"
        );
        assert_eq!(Cell::opt_text(None).to_string(), "");
    }

    #[test]
    fn csv_has_header_and_quotes_commas() {
        let text = String::from_utf8(to_csv(&sample()).unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Receipt,Date,Mode,Amount");
        assert_eq!(lines[1], "RC/2026-27/000001,05-10-2026,UPI,1500.00");
        assert_eq!(lines[2], "\"RC/2026-27/000002, cash\",06-10-2026,CASH,99.50");
    }

    #[test]
    fn xlsx_is_a_zip_container() {
        let bytes = to_xlsx(&sample()).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn pdf_has_pdf_magic_and_paginates() {
        let mut table = sample();
        for i in 0..80 {
            table.push_row(vec![
                Cell::text(format!("RC/2026-27/{i:06}")),
                Cell::Empty,
                Cell::text("CARD"),
                Cell::Amount(dec!(10)),
            ]);
        }
        let bytes = to_pdf(&table).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn download_sets_headers() {
        let response = export_response(&sample(), ReportFormat::Csv, "collections").unwrap();
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/csv; charset=utf-8"
        );
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"collections.csv\""
        );
    }

    #[test]
    fn format_parses_lowercase() {
        let f: ReportFormat = serde_json::from_str("\"xlsx\"").unwrap();
        assert_eq!(f, ReportFormat::Xlsx);
        assert_eq!(ReportFormat::default(), ReportFormat::Json);
    }
}
