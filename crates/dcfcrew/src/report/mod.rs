//! Report rendering: Word narrative, Excel forecast, and the ZIP bundle.
//!
//! Both documents are minimal OOXML packages written directly with `zip`
//! and `quick-xml`.

pub mod archive;
pub mod docx;
pub mod format;
pub mod xlsx;
mod xml;

use chrono::NaiveDate;
use thiserror::Error;

use crate::extraction::ValuationData;

pub use archive::{bundle_archive, write_zip, FORECAST_ENTRY, REPORT_ENTRY};
pub use docx::render_docx;
pub use xlsx::render_xlsx;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write report XML: {0}")]
    Xml(String),

    #[error("Failed to write archive: {0}")]
    Zip(String),
}

/// Renders both documents and returns the download archive bytes.
pub fn render_bundle(
    data: &ValuationData,
    company_name: &str,
    today: NaiveDate,
) -> Result<Vec<u8>, ReportError> {
    let report = render_docx(data, company_name, today)?;
    let forecast = render_xlsx(data)?;
    bundle_archive(&report, &forecast)
}
